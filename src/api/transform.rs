//! Batch transformation endpoint.

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::AppState;
use crate::transform::{TransformationRequest, TransformationResponse};

/// POST /transform
///
/// Any batch-level failure is returned as a server error so the delivery
/// pipeline retries the whole batch.
#[tracing::instrument(
    name = "api.transform",
    skip_all,
    fields(invocation_id = tracing::field::Empty, records = tracing::field::Empty)
)]
pub async fn transform(
    State(state): State<AppState>,
    Json(request): Json<TransformationRequest>,
) -> Result<Json<TransformationResponse>> {
    let span = tracing::Span::current();
    span.record("records", request.records.len());
    if let Some(invocation_id) = &request.invocation_id {
        span.record("invocation_id", invocation_id.as_str());
    }

    let records = state.processor.process(&request.records).await?;

    Ok(Json(TransformationResponse { records }))
}
