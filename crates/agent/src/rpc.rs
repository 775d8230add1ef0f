use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::CallToolRequestParam;
use rmcp::service::{RoleClient, RunningService, ServiceError};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::process::Command;

use storeagent_core::config::{AppConfig, DATABASE_URL_ENV};
use storeagent_core::errors::ApplicationError;

pub type JsonObject = Map<String, Value>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to launch tool server `{command}`: {message}")]
    Spawn { command: String, message: String },
    #[error("tool server handshake failed: {0}")]
    Handshake(String),
    #[error("tool call `{tool}` failed: {message}")]
    Call { tool: String, message: String },
    #[error("tool call `{tool}` timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },
    #[error("failed to close tool server session: {0}")]
    Close(String),
}

impl From<TransportError> for ApplicationError {
    fn from(error: TransportError) -> Self {
        Self::Integration(error.to_string())
    }
}

/// One open session with a tool server. Returns the raw result envelope of each
/// call; tool-level failures are envelopes too, only channel faults are errors.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<Value, TransportError>;
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens a fresh session per request.
#[async_trait]
pub trait ToolConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn ToolTransport>, TransportError>;
}

/// Launches the tool server as a child process and speaks MCP over its stdio.
#[derive(Clone, Debug)]
pub struct McpLauncher {
    command: String,
    args: Vec<String>,
    working_dir: PathBuf,
    database_url: String,
    handshake_timeout: Duration,
}

impl McpLauncher {
    pub fn new(command: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            database_url: database_url.into(),
            handshake_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.tools.command.clone(), config.database.url.clone())
            .with_args(config.tools.args.clone())
            .with_working_dir(config.tools.working_dir.clone())
            .with_handshake_timeout(Duration::from_secs(config.tools.call_timeout_secs))
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn program(&self) -> PathBuf {
        resolve_program(&self.command)
    }
}

#[async_trait]
impl ToolConnector for McpLauncher {
    async fn connect(&self) -> Result<Box<dyn ToolTransport>, TransportError> {
        let program = self.program();
        let mut command = Command::new(&program);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env(DATABASE_URL_ENV, &self.database_url)
            .kill_on_drop(true);

        let transport = TokioChildProcess::new(command).map_err(|error| TransportError::Spawn {
            command: program.display().to_string(),
            message: error.to_string(),
        })?;

        let service = tokio::time::timeout(self.handshake_timeout, ().serve(transport))
            .await
            .map_err(|_| TransportError::Timeout {
                tool: "initialize".to_string(),
                seconds: self.handshake_timeout.as_secs(),
            })?
            .map_err(|error| TransportError::Handshake(error.to_string()))?;

        tracing::debug!(
            event_name = "agent.tools.session_opened",
            program = %program.display(),
            "tool server session opened"
        );
        Ok(Box::new(McpSession { service: Some(service) }))
    }
}

struct McpSession {
    service: Option<RunningService<RoleClient, ()>>,
}

#[async_trait]
impl ToolTransport for McpSession {
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<Value, TransportError> {
        let service = self.service.as_ref().ok_or_else(|| TransportError::Call {
            tool: name.to_string(),
            message: "session already closed".to_string(),
        })?;

        let request = CallToolRequestParam { name: name.to_string().into(), arguments: Some(arguments) };
        match service.call_tool(request).await {
            Ok(result) => serde_json::to_value(&result).map_err(|error| TransportError::Call {
                tool: name.to_string(),
                message: format!("malformed tool result: {error}"),
            }),
            // Protocol-level rejections (unknown tool, bad arguments) are tool errors.
            Err(ServiceError::McpError(error)) => Ok(json!({
                "content": [{"type": "text", "text": error.message}],
                "isError": true,
            })),
            Err(error) => {
                Err(TransportError::Call { tool: name.to_string(), message: error.to_string() })
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let Some(service) = self.service.take() else {
            return Ok(());
        };
        service.cancel().await.map_err(|error| TransportError::Close(error.to_string()))?;
        tracing::debug!(event_name = "agent.tools.session_closed", "tool server session closed");
        Ok(())
    }
}

/// Bare command names are looked up on `PATH`, then next to the running
/// executable, so workspace binaries find each other without installation.
pub fn resolve_program(command: &str) -> PathBuf {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    if let Ok(found) = which::which(command) {
        return found;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(command)))
        .filter(|sibling| sibling.is_file())
        .unwrap_or_else(|| candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use storeagent_core::config::AppConfig;
    use storeagent_core::errors::ApplicationError;

    use super::{resolve_program, McpLauncher, ToolConnector, TransportError};

    #[test]
    fn explicit_paths_are_not_resolved() {
        assert_eq!(resolve_program("./bin/tool"), PathBuf::from("./bin/tool"));
        assert_eq!(resolve_program("/opt/tool"), PathBuf::from("/opt/tool"));
    }

    #[test]
    fn unknown_bare_command_is_left_as_is() {
        assert_eq!(
            resolve_program("storeagent-mcp-does-not-exist"),
            PathBuf::from("storeagent-mcp-does-not-exist")
        );
    }

    #[test]
    fn transport_errors_map_to_integration_failures() {
        let error = TransportError::Timeout { tool: "list_products".to_string(), seconds: 5 };
        assert_eq!(
            ApplicationError::from(error),
            ApplicationError::Integration("tool call `list_products` timed out after 5s".to_string())
        );
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let launcher = McpLauncher::from_config(&AppConfig::default())
            .with_args(Vec::new())
            .with_working_dir(std::env::temp_dir());
        let launcher = McpLauncher { command: "/nonexistent/storeagent-mcp".to_string(), ..launcher };

        let error = match launcher.connect().await {
            Ok(_) => panic!("spawning a missing binary must fail"),
            Err(error) => error,
        };
        assert!(matches!(error, TransportError::Spawn { .. }));
    }
}
