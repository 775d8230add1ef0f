//! Query agent for the product catalog.
//!
//! A request flows through [`planner::IntentPlanner`] to a typed [`plan::Plan`],
//! then [`runtime::AgentRuntime`] executes the plan against a tool server
//! session opened through [`rpc::ToolConnector`]. Tool responses are decoded by
//! [`payload`] and rendered by [`format`].
//!
//! Planning is a fixed pattern matcher. Prices and discounts are never decided
//! from free text; they come from the tool server and from
//! [`storeagent_core::pricing`].

pub mod format;
pub mod payload;
pub mod plan;
pub mod planner;
pub mod rpc;
pub mod runtime;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tools;

pub use plan::Plan;
pub use planner::IntentPlanner;
pub use rpc::{McpLauncher, ToolConnector, ToolTransport, TransportError};
pub use runtime::{AgentRuntime, AgentState, Execution};
