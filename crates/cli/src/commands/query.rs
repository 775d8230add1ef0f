use std::sync::Arc;
use std::time::Duration;

use crate::commands::{prepare, CommandResult};
use storeagent_agent::{AgentRuntime, McpLauncher};

/// Runs one query end to end. The tool server is launched from the `tools`
/// config section and torn down before the outcome is printed.
pub fn run(query: &str) -> CommandResult {
    let (config, runtime) = match prepare("query") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let agent = AgentRuntime::new(
        Arc::new(McpLauncher::from_config(&config)),
        Duration::from_secs(config.tools.call_timeout_secs),
    );

    match runtime.block_on(agent.run(query)) {
        Ok(state) => {
            let data = serde_json::to_value(&state).unwrap_or_default();
            CommandResult::success_with_data("query", state.answer, data)
        }
        Err(error) => CommandResult::failure("query", "tool_transport", error.to_string(), 7),
    }
}
