//! Custom extension functions callable from templates.
//!
//! The registry is an ordered, fixed list of [`CustomFunction`]s built once at
//! startup. A template call is dispatched to the first function whose uid
//! matches the called name. Registration rejects duplicate uids.
//!
//! | uid | behavior |
//! |-----|----------|
//! | `populateEventIdIfNotExist` | fresh `fabric-<uuid>` identifier |
//! | `toEscapedJson` | JSON text of its first parameter |
//! | `retrieveItemFromRaw` | property of a JSON document passed as a string |
//! | `convertTime` | ISO-8601 UTC rendering of a date/time |

mod handlers;

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

pub use handlers::EVENT_ID_PREFIX;

/// Errors raised by extension functions or registry construction.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// Input to `retrieveItemFromRaw` is not a parseable JSON string
    #[error("retrieveItemFromRaw: invalid JSON input: {0}")]
    Parse(String),

    /// Input to `convertTime` is not a recognizable date/time
    #[error("convertTime: cannot parse {0} as a date/time")]
    DateParse(String),

    /// Two functions claim the same uid
    #[error("Custom function registered more than once: {0}")]
    DuplicateFunction(String),
}

/// A built-in extension function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomFunction {
    PopulateEventIdIfNotExist,
    ToEscapedJson,
    RetrieveItemFromRaw,
    ConvertTime,
}

impl CustomFunction {
    /// Every built-in, in registration order.
    pub const ALL: [CustomFunction; 4] = [
        CustomFunction::PopulateEventIdIfNotExist,
        CustomFunction::ToEscapedJson,
        CustomFunction::RetrieveItemFromRaw,
        CustomFunction::ConvertTime,
    ];

    /// Name templates use to call this function.
    pub fn uid(&self) -> &'static str {
        match self {
            CustomFunction::PopulateEventIdIfNotExist => "populateEventIdIfNotExist",
            CustomFunction::ToEscapedJson => "toEscapedJson",
            CustomFunction::RetrieveItemFromRaw => "retrieveItemFromRaw",
            CustomFunction::ConvertTime => "convertTime",
        }
    }

    pub fn matches(&self, property: &str) -> bool {
        self.uid() == property
    }

    /// Evaluate the function against the call's parameters.
    pub fn resolve(&self, params: &[Value]) -> Result<Value, FunctionError> {
        match self {
            CustomFunction::PopulateEventIdIfNotExist => Ok(handlers::populate_event_id()),
            CustomFunction::ToEscapedJson => Ok(handlers::to_escaped_json(params)),
            CustomFunction::RetrieveItemFromRaw => handlers::retrieve_item_from_raw(params),
            CustomFunction::ConvertTime => handlers::convert_time(params),
        }
    }
}

/// Ordered set of extension functions available to templates.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<CustomFunction>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self {
            functions: CustomFunction::ALL.to_vec(),
        }
    }
}

impl FunctionRegistry {
    /// Build a registry, rejecting duplicate uids.
    pub fn new(functions: Vec<CustomFunction>) -> Result<Self, FunctionError> {
        let mut seen = HashSet::new();
        for function in &functions {
            if !seen.insert(function.uid()) {
                return Err(FunctionError::DuplicateFunction(function.uid().to_string()));
            }
        }

        Ok(Self { functions })
    }

    /// First function accepting `property`.
    pub fn find(&self, property: &str) -> Option<CustomFunction> {
        self.functions
            .iter()
            .copied()
            .find(|function| function.matches(property))
    }

    /// Dispatch a call by name; `None` when no function matches.
    pub fn call(&self, property: &str, params: &[Value]) -> Option<Result<Value, FunctionError>> {
        self.find(property).map(|function| function.resolve(params))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomFunction> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_registry_has_all_builtins() {
        let registry = FunctionRegistry::default();
        assert_eq!(registry.len(), 4);

        for function in CustomFunction::ALL {
            assert_eq!(registry.find(function.uid()), Some(function));
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = FunctionRegistry::new(vec![
            CustomFunction::ConvertTime,
            CustomFunction::ToEscapedJson,
            CustomFunction::ConvertTime,
        ]);

        assert!(matches!(
            result,
            Err(FunctionError::DuplicateFunction(ref uid)) if uid == "convertTime"
        ));
    }

    #[test]
    fn test_unknown_property_does_not_match() {
        let registry = FunctionRegistry::default();
        assert!(registry.find("toescapedjson").is_none());
        assert!(registry.call("noSuchFunction", &[]).is_none());
    }

    #[test]
    fn test_call_dispatches_by_name() {
        let registry = FunctionRegistry::new(vec![CustomFunction::ToEscapedJson]).unwrap();

        let result = registry
            .call("toEscapedJson", &[json!({"a": [1, 2]})])
            .unwrap()
            .unwrap();
        assert_eq!(result, json!(r#"{"a":[1,2]}"#));
        assert!(registry.call("convertTime", &[json!("2024-01-01")]).is_none());
    }
}
