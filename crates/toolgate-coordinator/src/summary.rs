use serde_json::Value;
use std::collections::HashMap;

use crate::events::ParamPreview;

/// Project tool-call parameters into a bounded preview for the approver.
/// Field count and value length are both capped; nested structures are
/// rendered to a string rather than forwarded.
pub fn summarize_params(
    params: &HashMap<String, Value>,
    max_fields: usize,
    max_value_len: usize,
) -> Vec<ParamPreview> {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    keys.into_iter()
        .take(max_fields)
        .map(|key| {
            let rendered = match &params[key] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ParamPreview {
                key: key.clone(),
                truncated_value: truncate(&rendered, max_value_len),
            }
        })
        .collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_len).collect();
        out.push_str("...");
        out
    }
}
