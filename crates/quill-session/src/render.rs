use serde_json::Value;

/// Text form of a structured output.
///
/// Strings render as their raw text, everything else as two-space indented
/// JSON.
pub fn render_output(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Text that replaces an agent's buffer in snapshot policy.
///
/// Renders `output[field]` when that field exists, else the whole output.
pub fn render_snapshot(output: &Value, field: Option<&str>) -> String {
    match field.and_then(|field| output.get(field)) {
        Some(value) => render_output(value),
        None => render_output(output),
    }
}
