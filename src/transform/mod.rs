//! Record decoding, rendering and re-encoding.

mod transformer;
mod types;

pub use transformer::{normalize_output, FailureState, RecordError, RecordTransformer};
pub use types::{
    InputRecord, OutputRecord, RecordResult, TransformationRequest, TransformationResponse,
};
