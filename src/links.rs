use serde_json::Value;

/// Find the first `url` string inside an attachment object.
///
/// Object fields are searched depth-first in payload order. When descending
/// into an array only its last element is inspected, which for size lists
/// (photos, video previews) is the largest variant.
#[must_use]
pub fn get_links(value: &Value) -> Option<String> {
    match value {
        Value::Object(fields) => fields.iter().find_map(|(key, field)| match field {
            Value::String(url) if key == "url" => Some(url.clone()),
            Value::Object(_) | Value::Array(_) => get_links(field),
            _ => None,
        }),
        Value::Array(items) => items.last().and_then(get_links),
        _ => None,
    }
}

/// Extract one optional link per attachment, keeping attachment order.
#[must_use]
pub fn extract_links(attachments: &[Value]) -> Vec<Option<String>> {
    attachments.iter().map(get_links).collect()
}
