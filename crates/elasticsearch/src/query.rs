//! Request body for a templated search.

use serde_json::{Map, Value};

use esscale_core::ScalerError;

/// Split a `key:value` parameter token. The token must hold exactly one
/// colon and a non-empty key; both sides are trimmed.
pub fn parse_parameter(token: &str) -> Result<(String, String), ScalerError> {
    let parts: Vec<&str> = token.split(':').map(str::trim).collect();
    match parts.as_slice() {
        [key, value] if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ScalerError::config(
            "parameters",
            format!("'{token}' is not a key:value pair"),
        )),
    }
}

/// Build `{"id": template, "params": {...}}`.
///
/// Empty tokens are skipped. A later duplicate key overwrites an earlier
/// one. `params` is left out entirely when there are no parameters, since
/// the templated-search API treats absent and empty differently.
/// Keys are emitted in sorted order, so equal inputs give byte-equal output.
pub fn build_query(template_name: &str, parameters: &[String]) -> Result<Value, ScalerError> {
    let mut params = Map::new();
    for token in parameters.iter().filter(|t| !t.is_empty()) {
        let (key, value) = parse_parameter(token)?;
        params.insert(key, Value::String(value));
    }

    let mut query = Map::new();
    query.insert("id".to_string(), Value::String(template_name.to_string()));
    if !params.is_empty() {
        query.insert("params".to_string(), Value::Object(params));
    }
    Ok(Value::Object(query))
}
