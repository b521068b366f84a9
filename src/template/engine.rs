//! Handlebars rendering with the custom functions exposed as helpers.
//!
//! Extension functions can be called directly (`{{convertTime time}}`) or as
//! subexpressions (`{{toEscapedJson (retrieveItemFromRaw raw "user")}}`).
//! String results are written as-is, `null` writes nothing and any other
//! value is written as compact JSON. Output is never HTML-escaped.

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use std::sync::Arc;

use serde_json::Value;

use crate::functions::FunctionRegistry;

use super::types::TemplateResult;

const DEFAULT_TEMPLATE_NAME: &str = "default";

/// Handlebars helper that dispatches calls through the function registry.
///
/// One instance is installed under every registered uid; the called name
/// selects the function.
#[derive(Clone)]
struct FunctionHelper {
    registry: Arc<FunctionRegistry>,
}

impl HelperDef for FunctionHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let name = h.name();
        let params: Vec<Value> = h.params().iter().map(|p| p.value().clone()).collect();

        match self.registry.call(name, &params) {
            Some(Ok(value)) => Ok(ScopedJson::Derived(value)),
            Some(Err(e)) => {
                tracing::error!(function = %name, error = %e, "Custom function failed");
                Err(RenderErrorReason::Other(e.to_string()).into())
            }
            None => Err(RenderErrorReason::HelperNotFound(name.to_string()).into()),
        }
    }

    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let result = self.call_inner(h, r, ctx, rc)?;

        match result.as_json() {
            Value::Null => {}
            Value::String(text) => out.write(text)?,
            other => out.write(&other.to_string())?,
        }
        Ok(())
    }
}

/// Template renderer shared by all batches.
///
/// Holds a Handlebars registry with every registered custom function
/// installed as a helper.
#[derive(Clone)]
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new(functions: &FunctionRegistry) -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);

        let helper = FunctionHelper {
            registry: Arc::new(functions.clone()),
        };
        for function in functions.iter() {
            registry.register_helper(function.uid(), Box::new(helper.clone()));
        }

        tracing::debug!(helpers = functions.len(), "Template engine initialized");

        Self { registry }
    }

    /// Start a render session with `default_content` compiled once.
    ///
    /// Fails when the default template does not parse.
    pub fn session(&self, default_content: &str) -> TemplateResult<RenderSession> {
        let mut registry = self.registry.clone();
        registry.register_template_string(DEFAULT_TEMPLATE_NAME, default_content)?;

        Ok(RenderSession { registry })
    }
}

/// Per-batch renderer holding the compiled default template.
pub struct RenderSession {
    registry: Handlebars<'static>,
}

impl RenderSession {
    pub fn render_default(&self, context: &Value) -> TemplateResult<String> {
        Ok(self.registry.render(DEFAULT_TEMPLATE_NAME, context)?)
    }

    /// Compile and render an override body.
    pub fn render_override(&self, content: &str, context: &Value) -> TemplateResult<String> {
        Ok(self.registry.render_template(content, context)?)
    }
}
