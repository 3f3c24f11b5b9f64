//! Pull the metric out of a raw search response.

use serde_json::Value;

use esscale_core::ScalerError;

use crate::path::JsonPath;

/// Name used in errors for each JSON type.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Locate `path` in `body` and coerce what is there to an integer.
///
/// - number: truncated toward zero (saturating at the `i64` bounds)
/// - string: parsed as an integer, otherwise the literal is reported
/// - anything else, including a path that does not resolve: error
///
/// A missing value is never read as zero.
pub fn value_from_search(body: &[u8], path: &JsonPath) -> Result<i64, ScalerError> {
    let doc: Value = serde_json::from_slice(body)
        .map_err(|_| ScalerError::InvalidValueType("invalid JSON".to_string()))?;

    let located = path
        .select(&doc)
        .ok_or_else(|| ScalerError::InvalidValueType("absent".to_string()))?;

    match located.as_ref() {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => Ok(n.as_f64().map(|f| f.trunc() as i64).unwrap_or_default()),
        },
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| ScalerError::InvalidValueType(s.clone())),
        other => Err(ScalerError::InvalidValueType(type_name(other).to_string())),
    }
}
