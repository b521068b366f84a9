//! Delivery-stream record types.

use serde::{Deserialize, Serialize};

/// One record in an incoming batch.
///
/// Delivery metadata such as `approximateArrivalTimestamp` is accepted and
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub record_id: String,

    /// Base64-encoded UTF-8 JSON document
    pub data: String,
}

/// Per-record processing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordResult {
    Ok,
    ProcessingFailed,
}

/// One record in the response, paired with its input by `record_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub record_id: String,
    pub result: RecordResult,

    /// Base64-encoded rendered output; empty on failure
    pub data: String,
}

impl OutputRecord {
    pub fn ok(record_id: impl Into<String>, data: String) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordResult::Ok,
            data,
        }
    }

    pub fn failed(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            result: RecordResult::ProcessingFailed,
            data: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == RecordResult::Ok
    }
}

/// Batch submitted by the delivery pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_stream_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    pub records: Vec<InputRecord>,
}

/// Transformed batch, one output per input in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationResponse {
    pub records: Vec<OutputRecord>,
}
