use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use storeagent_core::pricing::calc_discount;

use crate::format::{
    format_added_product, format_discount, format_products, format_statistics, HELP_TEXT,
};
use crate::plan::Plan;
use crate::planner::IntentPlanner;
use crate::rpc::{ToolConnector, ToolTransport, TransportError};
use crate::tools::ProductToolClient;

/// Answer and trace produced by executing one plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Execution {
    pub answer: String,
    pub trace: Vec<String>,
}

/// Everything known about one request once it has been answered.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentState {
    pub query: String,
    pub plan: Plan,
    pub trace: Vec<String>,
    pub answer: String,
}

pub struct AgentRuntime {
    planner: IntentPlanner,
    connector: Arc<dyn ToolConnector>,
    call_timeout: Duration,
}

impl AgentRuntime {
    pub fn new(connector: Arc<dyn ToolConnector>, call_timeout: Duration) -> Self {
        Self { planner: IntentPlanner::new(), connector, call_timeout }
    }

    pub fn plan(&self, query: &str) -> Plan {
        let plan = self.planner.plan(query);
        info!(event_name = "agent.plan.resolved", intent = plan.intent(), "plan resolved");
        plan
    }

    /// Runs a plan against a fresh tool session. The session is opened only
    /// when the plan calls a tool and is closed before returning, whether the
    /// calls succeeded or not.
    pub async fn execute(&self, plan: &Plan) -> Result<Execution, TransportError> {
        if !plan.needs_tools() {
            return Ok(Execution {
                answer: HELP_TEXT.to_string(),
                trace: vec!["intent:unknown".to_string()],
            });
        }

        let mut session = self.connector.connect().await?;
        let outcome = self.dispatch(session.as_ref(), plan).await;
        let closed = session.close().await;

        let execution = outcome?;
        if let Err(error) = closed {
            warn!(
                event_name = "agent.tools.close_failed",
                error = %error,
                "tool session did not close cleanly"
            );
        }
        Ok(execution)
    }

    pub async fn run(&self, query: &str) -> Result<AgentState, TransportError> {
        let plan = self.plan(query);
        let mut trace = vec![format!("plan={}", plan_json(&plan))];

        let execution = self.execute(&plan).await?;
        trace.extend(execution.trace);
        info!(
            event_name = "agent.query.answered",
            intent = plan.intent(),
            trace_len = trace.len(),
            "query answered"
        );

        Ok(AgentState { query: query.to_string(), plan, trace, answer: execution.answer })
    }

    async fn dispatch(
        &self,
        transport: &dyn ToolTransport,
        plan: &Plan,
    ) -> Result<Execution, TransportError> {
        let tools = ProductToolClient::new(transport, self.call_timeout);

        let (answer, step) = match plan {
            Plan::ListByCategory { category } => {
                let products = tools.list_products(category.as_deref()).await?;
                (format_products(&Value::Array(products)), "called:list_products")
            }
            Plan::Stats => {
                let stats = tools.get_statistics().await?;
                (format_statistics(&stats), "called:get_statistics")
            }
            Plan::AddProduct { name, price, category, in_stock } => {
                let product = tools.add_product(name, *price, category, *in_stock).await?;
                (format_added_product(&product), "called:add_product")
            }
            Plan::Discount { product_id, discount_percent } => {
                let product = tools.get_product(*product_id).await?;
                let quote = product
                    .get("price")
                    .and_then(Value::as_f64)
                    .filter(|_| product.get("error").is_none())
                    .map(|price| calc_discount(price, *discount_percent));
                (format_discount(&product, quote.as_ref()), "called:get_product+calc_discount")
            }
            Plan::Unknown => (HELP_TEXT.to_string(), "intent:unknown"),
        };

        Ok(Execution { answer, trace: vec![step.to_string()] })
    }
}

fn plan_json(plan: &Plan) -> String {
    serde_json::to_string(plan).unwrap_or_else(|_| format!("{{\"intent\":\"{}\"}}", plan.intent()))
}
