//! Template loading, selection and rendering.
//!
//! This module provides:
//! - A process-scoped TTL cache over the template store
//! - Per-record selection between the default template and overrides
//! - A Handlebars engine with the custom functions installed as helpers

mod cache;
mod engine;
mod resolver;
mod types;

pub use cache::TemplateCache;
pub use engine::{RenderSession, TemplateEngine};
pub use resolver::{RecordMetadata, ResolveError, TemplateResolver};
pub use types::{TemplateChoice, TemplateError, TemplateResult};
