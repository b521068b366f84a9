//! Single-record transformation.
//!
//! A record moves through decode, parse, render and encode. Any failure is
//! contained to the record: it is logged, counted and reported as
//! `ProcessingFailed` with empty data.
//!
//! Record data is accepted with or without trailing `=` padding.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    Engine as _,
};
use serde_json::Value;
use thiserror::Error;

use crate::metrics::RecordMetrics;
use crate::store::StoreError;
use crate::template::{RenderSession, TemplateChoice, TemplateError, TemplateResolver};

use super::types::{InputRecord, OutputRecord};

/// Where a failed record stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureState {
    /// Payload could not be decoded or parsed
    ParseFailed,
    /// Template lookup or rendering failed
    RenderFailed,
}

/// Errors that fail a single record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid base64 data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Override template lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl RecordError {
    pub fn state(&self) -> FailureState {
        match self {
            RecordError::Decode(_) | RecordError::Utf8(_) | RecordError::Parse(_) => {
                FailureState::ParseFailed
            }
            RecordError::Store(_) | RecordError::Template(_) => FailureState::RenderFailed,
        }
    }

    /// Metric label for the failing stage
    pub fn stage(&self) -> &'static str {
        match self {
            RecordError::Decode(_) | RecordError::Utf8(_) => "decode",
            RecordError::Parse(_) => "parse",
            RecordError::Store(_) => "override_lookup",
            RecordError::Template(_) => "render",
        }
    }
}

/// Standard alphabet, padding optional on decode.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Whitespace as matched by an ECMAScript `\s` class.
///
/// Differs from [`char::is_whitespace`]: U+FEFF counts, U+0085 does not.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'..='\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Strip every whitespace character and terminate with a single newline.
pub fn normalize_output(rendered: &str) -> String {
    let mut output: String = rendered.chars().filter(|c| !is_js_whitespace(*c)).collect();
    output.push('\n');
    output
}

/// Transforms records for one batch.
pub struct RecordTransformer<'a> {
    resolver: &'a TemplateResolver,
    session: &'a RenderSession,
}

impl<'a> RecordTransformer<'a> {
    pub fn new(resolver: &'a TemplateResolver, session: &'a RenderSession) -> Self {
        Self { resolver, session }
    }

    /// Transform a record, converting any failure into `ProcessingFailed`.
    pub async fn transform(&self, record: &InputRecord) -> OutputRecord {
        match self.try_transform(record).await {
            Ok(data) => {
                RecordMetrics::record_ok();
                OutputRecord::ok(record.record_id.clone(), data)
            }
            Err(e) => {
                RecordMetrics::record_failed(e.stage());
                tracing::error!(
                    record_id = %record.record_id,
                    state = ?e.state(),
                    error = %e,
                    "Record processing failed"
                );
                OutputRecord::failed(record.record_id.clone())
            }
        }
    }

    /// Transform a record, returning the base64-encoded output.
    pub async fn try_transform(&self, record: &InputRecord) -> Result<String, RecordError> {
        let decoded = PAYLOAD_ENGINE.decode(record.data.trim())?;
        let text = String::from_utf8(decoded)?;
        let payload: Value = serde_json::from_str(&text)?;

        let rendered = match self.resolver.resolve(&payload).await? {
            TemplateChoice::Override { key, content } => {
                RecordMetrics::record_override();
                tracing::debug!(record_id = %record.record_id, key = %key, "Rendering with override template");
                self.session.render_override(&content, &payload)?
            }
            TemplateChoice::Default => self.session.render_default(&payload)?,
        };

        Ok(STANDARD.encode(normalize_output(&rendered)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionRegistry;
    use crate::store::MemoryObjectStore;
    use crate::template::{TemplateCache, TemplateEngine};
    use crate::transform::RecordResult;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn encode(payload: &str) -> String {
        STANDARD.encode(payload)
    }

    fn decode(data: &str) -> String {
        String::from_utf8(STANDARD.decode(data).unwrap()).unwrap()
    }

    fn record(id: &str, payload: &str) -> InputRecord {
        InputRecord {
            record_id: id.to_string(),
            data: encode(payload),
        }
    }

    fn fixture(default_body: &str) -> (Arc<MemoryObjectStore>, TemplateResolver, RenderSession) {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("bucket", "overrides/p1/login.vm", "X");
        let cache = Arc::new(TemplateCache::new(store.clone(), Duration::from_secs(300)));
        let resolver = TemplateResolver::new(cache, "bucket", "ocsf_to_ecs.vm", "overrides", "vm");
        let session = TemplateEngine::new(&FunctionRegistry::default())
            .session(default_body)
            .unwrap();
        (store, resolver, session)
    }

    #[test]
    fn test_normalize_output_strips_all_whitespace() {
        assert_eq!(normalize_output("a  b\n  c"), "abc\n");
        assert_eq!(normalize_output("{ \"k\":\t\"v w\" }\r\n"), "{\"k\":\"vw\"}\n");
        assert_eq!(normalize_output(""), "\n");
    }

    #[test]
    fn test_normalize_output_uses_ecmascript_whitespace() {
        assert_eq!(normalize_output("a\u{FEFF}b\u{0085}c"), "ab\u{0085}c\n");
        assert_eq!(normalize_output("x\u{00A0}y\u{3000}z\u{2028}"), "xyz\n");
    }

    #[tokio::test]
    async fn test_default_render() {
        let (_, resolver, session) = fixture(r#"{ "msg": "{{message}}" }"#);
        let transformer = RecordTransformer::new(&resolver, &session);

        let output = transformer
            .transform(&record("r1", r#"{"message": "hello"}"#))
            .await;

        assert_eq!(output.result, RecordResult::Ok);
        assert_eq!(decode(&output.data), "{\"msg\":\"hello\"}\n");
    }

    #[tokio::test]
    async fn test_payload_key_order_survives_render() {
        let (_, resolver, session) = fixture("{{toEscapedJson obj}}");
        let transformer = RecordTransformer::new(&resolver, &session);

        let data = transformer
            .try_transform(&record("r1", r#"{"obj": {"zeta": 1, "alpha": 2}}"#))
            .await
            .unwrap();
        assert_eq!(decode(&data), "{\"zeta\":1,\"alpha\":2}\n");
    }

    #[tokio::test]
    async fn test_override_takes_precedence() {
        let (_, resolver, session) = fixture("default");
        let transformer = RecordTransformer::new(&resolver, &session);

        let payload = json!({"metadata": {"event_code": "LOGIN", "product": {"uid": "p1"}}});
        let output = transformer
            .transform(&record("r1", &payload.to_string()))
            .await;

        assert!(output.is_ok());
        assert_eq!(decode(&output.data), "X\n");
    }

    #[tokio::test]
    async fn test_malformed_json_skips_override_lookup() {
        let (store, resolver, session) = fixture("default");
        let transformer = RecordTransformer::new(&resolver, &session);

        let err = transformer
            .try_transform(&record("r1", "not-json"))
            .await
            .unwrap_err();
        assert_eq!(err.state(), FailureState::ParseFailed);
        assert_eq!(store.fetch_count(), 0);

        let output = transformer.transform(&record("r1", "not-json")).await;
        assert_eq!(output, OutputRecord::failed("r1"));
        assert_eq!(output.data, "");
    }

    #[tokio::test]
    async fn test_undecodable_data_is_parse_failure() {
        let (_, resolver, session) = fixture("default");
        let transformer = RecordTransformer::new(&resolver, &session);

        let bad_base64 = InputRecord {
            record_id: "r1".to_string(),
            data: "%%%".to_string(),
        };
        let err = transformer.try_transform(&bad_base64).await.unwrap_err();
        assert!(matches!(err, RecordError::Decode(_)));
        assert_eq!(err.state(), FailureState::ParseFailed);

        let bad_utf8 = InputRecord {
            record_id: "r2".to_string(),
            data: STANDARD.encode([0xff, 0xfe]),
        };
        let err = transformer.try_transform(&bad_utf8).await.unwrap_err();
        assert!(matches!(err, RecordError::Utf8(_)));
    }

    #[tokio::test]
    async fn test_unpadded_base64_is_accepted() {
        let (_, resolver, session) = fixture("{{v}}");
        let transformer = RecordTransformer::new(&resolver, &session);

        // {"v":1} without its trailing '='
        let unpadded = InputRecord {
            record_id: "r1".to_string(),
            data: "eyJ2IjoxfQ".to_string(),
        };
        let data = transformer.try_transform(&unpadded).await.unwrap();
        assert_eq!(decode(&data), "1\n");
    }

    #[tokio::test]
    async fn test_function_failure_is_render_failure() {
        let (_, resolver, session) = fixture("{{convertTime time}}");
        let transformer = RecordTransformer::new(&resolver, &session);

        let err = transformer
            .try_transform(&record("r1", r#"{"time": "soon"}"#))
            .await
            .unwrap_err();
        assert_eq!(err.state(), FailureState::RenderFailed);
        assert_eq!(err.stage(), "render");
    }
}
