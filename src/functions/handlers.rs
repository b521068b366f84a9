//! Built-in extension function implementations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::FunctionError;

/// Prefix of generated event identifiers
pub const EVENT_ID_PREFIX: &str = "fabric-";

/// Naive date-time layouts accepted by `convertTime`, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub(super) fn populate_event_id() -> Value {
    Value::String(format!("{}{}", EVENT_ID_PREFIX, Uuid::new_v4()))
}

pub(super) fn to_escaped_json(params: &[Value]) -> Value {
    let value = params.first().unwrap_or(&Value::Null);
    Value::String(value.to_string())
}

pub(super) fn retrieve_item_from_raw(params: &[Value]) -> Result<Value, FunctionError> {
    let raw = match params.first() {
        Some(Value::String(raw)) => raw,
        Some(other) => {
            return Err(FunctionError::Parse(format!(
                "expected a JSON string, got {}",
                json_kind(other)
            )))
        }
        None => return Err(FunctionError::Parse("missing raw JSON parameter".to_string())),
    };

    let parsed: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::error!(error = %e, "retrieveItemFromRaw: error parsing JSON data");
        FunctionError::Parse(e.to_string())
    })?;

    let property = match params.get(1) {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let item = match &parsed {
        Value::Object(map) => map.get(&property).cloned(),
        Value::Array(items) => property
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index).cloned()),
        _ => None,
    };

    Ok(item.unwrap_or_else(|| {
        tracing::warn!(
            property = %property,
            "retrieveItemFromRaw: property not found in JSON data"
        );
        Value::String(String::new())
    }))
}

pub(super) fn convert_time(params: &[Value]) -> Result<Value, FunctionError> {
    let input = params.first().unwrap_or(&Value::Null);

    let parsed = match input {
        Value::String(text) => parse_timestamp(text),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    parsed
        .map(|timestamp| Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)))
        .ok_or_else(|| FunctionError::DateParse(input.to_string()))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc));
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc2822(text) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
