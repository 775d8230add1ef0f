//! An in-process [`ToolConnector`] answering from a script, for tests of the
//! runtime and of the surfaces built on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::rpc::{JsonObject, ToolConnector, ToolTransport, TransportError};

#[derive(Clone)]
enum Reply {
    Envelope(Value),
    Stall,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Reply>,
    connect_failure: Option<String>,
    calls: Mutex<Vec<(String, Value)>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Script>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies to `tool` with a text content block carrying `payload` as JSON,
    /// the shape the real tool server produces.
    pub fn respond_json(self, tool: &str, payload: Value) -> Self {
        let envelope = json!({
            "content": [{"type": "text", "text": payload.to_string()}],
            "isError": false,
        });
        self.respond_envelope(tool, envelope)
    }

    pub fn respond_envelope(self, tool: &str, envelope: Value) -> Self {
        self.with_reply(tool, Reply::Envelope(envelope))
    }

    /// Calls to `tool` never complete.
    pub fn stall(self, tool: &str) -> Self {
        self.with_reply(tool, Reply::Stall)
    }

    /// Every `connect` fails as if the tool server could not be launched.
    pub fn unavailable(message: &str) -> Self {
        Self {
            script: Arc::new(Script {
                connect_failure: Some(message.to_string()),
                ..Script::default()
            }),
        }
    }

    /// Tool names and arguments of every call so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.script.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.script.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.script.closed.load(Ordering::SeqCst)
    }

    fn with_reply(self, tool: &str, reply: Reply) -> Self {
        let mut replies = self.script.replies.clone();
        replies.insert(tool.to_string(), reply);
        Self {
            script: Arc::new(Script {
                replies,
                connect_failure: self.script.connect_failure.clone(),
                ..Script::default()
            }),
        }
    }
}

#[async_trait]
impl ToolConnector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn ToolTransport>, TransportError> {
        if let Some(message) = &self.script.connect_failure {
            return Err(TransportError::Spawn {
                command: "scripted".to_string(),
                message: message.clone(),
            });
        }
        self.script.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession { script: Arc::clone(&self.script), open: true }))
    }
}

struct ScriptedSession {
    script: Arc<Script>,
    open: bool,
}

#[async_trait]
impl ToolTransport for ScriptedSession {
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<Value, TransportError> {
        self.script
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), Value::Object(arguments)));

        match self.script.replies.get(name) {
            Some(Reply::Envelope(envelope)) => Ok(envelope.clone()),
            Some(Reply::Stall) => std::future::pending().await,
            None => Ok(json!({
                "content": [{"type": "text", "text": format!("tool `{name}` not found")}],
                "isError": true,
            })),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if std::mem::replace(&mut self.open, false) {
            self.script.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
