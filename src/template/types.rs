//! Template error and selection types.

use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template body could not be parsed
    #[error("Template syntax error: {0}")]
    Syntax(String),

    /// Rendering failed, including extension function failures
    #[error("Template render failed: {0}")]
    Render(String),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

impl From<handlebars::TemplateError> for TemplateError {
    fn from(err: handlebars::TemplateError) -> Self {
        TemplateError::Syntax(err.to_string())
    }
}

impl From<handlebars::RenderError> for TemplateError {
    fn from(err: handlebars::RenderError) -> Self {
        match err.reason() {
            handlebars::RenderErrorReason::TemplateError(inner) => {
                TemplateError::Syntax(inner.to_string())
            }
            _ => TemplateError::Render(err.to_string()),
        }
    }
}

/// Template chosen for a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateChoice {
    /// The batch's default template
    Default,

    /// A record-specific override found at `key`
    Override { key: String, content: String },
}
