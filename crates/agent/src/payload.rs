//! Decoding of tool-call envelopes into plain JSON values.
//!
//! A tool server can answer in several shapes: an MCP tool result carrying
//! content blocks, a bare list of content blocks, an object wrapping the value
//! under a conventional key, or a bare value. [`classify`] picks the shape once,
//! [`extract`] pulls the payload out of it, and [`normalize`] strips root-model
//! wrappers from the top of the payload. Values nested inside a payload are data
//! and are never rewritten.

use serde_json::{Map, Value};

/// Placeholder some servers emit for an empty root model.
const ROOT_PLACEHOLDER: &str = "Root()";

/// Keys a serialized root model puts its value under.
const ROOT_MODEL_KEYS: &[&str] = &["root", "__root__"];

/// Fallback fields searched on a wrapper object, in priority order.
const RESULT_KEYS: &[&str] = &["result", "structuredContent", "value", "data", "message"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Envelope<'a> {
    /// An MCP `CallToolResult`: `{content: [blocks], isError?}`.
    ToolResult { fields: &'a Map<String, Value>, blocks: &'a [Value], is_error: bool },
    /// A bare array of content blocks.
    Blocks(&'a [Value]),
    /// Any other object.
    Wrapper(&'a Map<String, Value>),
    Bare(&'a Value),
}

pub fn classify(envelope: &Value) -> Envelope<'_> {
    match envelope {
        Value::Object(fields) => match fields.get("content") {
            Some(Value::Array(blocks)) if blocks.first().is_some_and(is_content_block) => {
                Envelope::ToolResult {
                    fields,
                    blocks,
                    is_error: fields.get("isError").and_then(Value::as_bool).unwrap_or(false),
                }
            }
            _ => Envelope::Wrapper(fields),
        },
        Value::Array(items) if items.first().is_some_and(is_content_block) => {
            Envelope::Blocks(items)
        }
        other => Envelope::Bare(other),
    }
}

/// Returns the raw payload carried by an envelope, or `Null` when nothing usable
/// is present.
pub fn extract(envelope: Envelope<'_>) -> Value {
    match envelope {
        Envelope::ToolResult { fields, blocks, .. } => {
            first_block_payload(blocks).unwrap_or_else(|| wrapped_payload(fields))
        }
        Envelope::Blocks(blocks) => first_block_payload(blocks).unwrap_or(Value::Null),
        Envelope::Wrapper(fields) => wrapped_payload(fields),
        Envelope::Bare(value) => value.clone(),
    }
}

/// Unwraps `{"root": v}` / `{"__root__": v}` at the top of an extracted
/// payload until a plain value remains. Never fails, and an already plain value
/// comes back unchanged.
pub fn normalize(value: Value) -> Value {
    let mut current = value;
    loop {
        match current {
            Value::Object(mut fields) if is_root_model(&fields) => {
                let key = ROOT_MODEL_KEYS.iter().find(|key| fields.contains_key(**key));
                current = key.and_then(|key| fields.remove(*key)).unwrap_or(Value::Null);
            }
            plain => return plain,
        }
    }
}

fn is_root_model(fields: &Map<String, Value>) -> bool {
    fields.len() == 1 && ROOT_MODEL_KEYS.iter().any(|key| fields.contains_key(*key))
}

/// Full decode of one tool response: extraction, normalization, a second parse
/// for double-encoded strings, and error wrapping for failed calls.
pub fn decode(envelope: &Value) -> Value {
    let shape = classify(envelope);
    let is_error = matches!(shape, Envelope::ToolResult { is_error: true, .. });

    let mut payload = normalize(extract(shape));
    if let Value::String(text) = &payload {
        if let Ok(parsed) = serde_json::from_str::<Value>(text) {
            payload = parsed;
        }
    }

    if is_error && payload.get("error").is_none() {
        let mut error = Map::new();
        error.insert("error".to_string(), Value::String(display_value(&payload)));
        return Value::Object(error);
    }
    payload
}

/// Text form of a value: strings verbatim, everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::String(text) => text != ROOT_PLACEHOLDER,
        _ => true,
    }
}

/// Any object carrying `text` or `json`; the `type` tag is optional.
fn is_content_block(value: &Value) -> bool {
    value.as_object().is_some_and(|block| block.contains_key("text") || block.contains_key("json"))
}

fn first_block_payload(blocks: &[Value]) -> Option<Value> {
    let block = blocks.first()?.as_object()?;

    if let Some(text) = block.get("text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return Some(
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
            );
        }
    }
    block.get("json").cloned()
}

fn wrapped_payload(fields: &Map<String, Value>) -> Value {
    if let Some(content) = fields.get("content").filter(|content| is_non_empty(content)) {
        return content.clone();
    }
    RESULT_KEYS
        .iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| is_non_empty(value))
        .cloned()
        .unwrap_or(Value::Null)
}
