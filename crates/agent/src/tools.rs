use std::time::Duration;

use serde_json::{json, Map, Value};

use crate::format::unwrap_list;
use crate::payload::{decode, display_value};
use crate::rpc::{JsonObject, ToolTransport, TransportError};

/// Typed calls to the product tools over one open session. Every call is
/// bounded by `call_timeout` and returns an already coerced value.
pub struct ProductToolClient<'a> {
    transport: &'a dyn ToolTransport,
    call_timeout: Duration,
}

impl<'a> ProductToolClient<'a> {
    pub fn new(transport: &'a dyn ToolTransport, call_timeout: Duration) -> Self {
        Self { transport, call_timeout }
    }

    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Value>, TransportError> {
        let payload = self.call("list_products", arguments(json!({"category": category}))).await?;
        Ok(coerce_list(payload))
    }

    pub async fn get_product(&self, id: i64) -> Result<Value, TransportError> {
        let payload = self.call("get_product", arguments(json!({"id": id}))).await?;
        Ok(coerce_mapping(payload))
    }

    pub async fn add_product(
        &self,
        name: &str,
        price: f64,
        category: &str,
        in_stock: bool,
    ) -> Result<Value, TransportError> {
        let payload = self
            .call(
                "add_product",
                arguments(json!({
                    "name": name,
                    "price": price,
                    "category": category,
                    "in_stock": in_stock,
                })),
            )
            .await?;
        Ok(coerce_mapping(payload))
    }

    pub async fn get_statistics(&self) -> Result<Value, TransportError> {
        let payload = self.call("get_statistics", JsonObject::new()).await?;
        Ok(coerce_mapping(payload))
    }

    async fn call(&self, tool: &str, args: JsonObject) -> Result<Value, TransportError> {
        tracing::debug!(event_name = "agent.tool.call", tool, "calling tool");
        let envelope = tokio::time::timeout(self.call_timeout, self.transport.call_tool(tool, args))
            .await
            .map_err(|_| TransportError::Timeout {
                tool: tool.to_string(),
                seconds: self.call_timeout.as_secs(),
            })??;
        Ok(decode(&envelope))
    }
}

fn arguments(value: Value) -> JsonObject {
    match value {
        Value::Object(fields) => fields,
        _ => JsonObject::new(),
    }
}

/// Lists pass through; an object yields its first wrapped list or becomes a
/// single element; `null` is empty.
pub fn coerce_list(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(fields) => match unwrap_list(&fields) {
            Some(items) => items.to_vec(),
            None => vec![Value::Object(fields)],
        },
        scalar => vec![scalar],
    }
}

pub fn coerce_mapping(payload: Value) -> Value {
    match payload {
        Value::Object(fields) => Value::Object(fields),
        other => {
            let mut error = Map::new();
            error.insert("error".to_string(), Value::String("Invalid tool payload".to_string()));
            error.insert("raw".to_string(), Value::String(display_value(&other)));
            Value::Object(error)
        }
    }
}
