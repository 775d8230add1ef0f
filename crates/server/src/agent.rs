//! Natural-language query endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use storeagent_agent::{AgentRuntime, Plan};
use storeagent_core::errors::ApplicationError;

#[derive(Clone)]
pub struct AgentApiState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub trace: Vec<String>,
    pub plan: Plan,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/api/v1/agent/query", post(query))
        .with_state(AgentApiState { runtime })
}

async fn query(
    State(state): State<AgentApiState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("agent_query", correlation_id = %correlation_id);

    async move {
        info!(event_name = "api.agent.query.received", "agent query received");

        match state.runtime.run(&request.query).await {
            Ok(agent_state) => {
                info!(
                    event_name = "api.agent.query.answered",
                    intent = agent_state.plan.intent(),
                    "agent query answered"
                );
                Ok(Json(QueryResponse {
                    answer: agent_state.answer,
                    trace: agent_state.trace,
                    plan: agent_state.plan,
                }))
            }
            Err(transport) => {
                error!(
                    event_name = "api.agent.query.transport_failed",
                    error = %transport,
                    "tool server unavailable"
                );
                let interface = ApplicationError::from(transport).into_interface(&correlation_id);
                Err((
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiError {
                        error: interface.user_message().to_string(),
                        correlation_id: interface.correlation_id().to_string(),
                    }),
                ))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use storeagent_agent::testing::ScriptedConnector;
    use storeagent_agent::AgentRuntime;
    use tower::ServiceExt;

    use super::router;

    fn app(connector: ScriptedConnector) -> axum::Router {
        router(Arc::new(AgentRuntime::new(Arc::new(connector), Duration::from_secs(2))))
    }

    fn post_query(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/agent/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn query_returns_answer_trace_and_plan() {
        let connector = ScriptedConnector::new().respond_json(
            "get_statistics",
            json!({"count": 2, "avg_price": 25600.0, "min_price": 1200.0, "max_price": 50000.0}),
        );
        let response = app(connector)
            .oneshot(post_query(r#"{"query": "Какая средняя цена продуктов?"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["plan"], json!({"intent": "stats"}));
        assert_eq!(body["trace"], json!([r#"plan={"intent":"stats"}"#, "called:get_statistics"]));
        assert!(body["answer"].as_str().expect("answer").contains("25600"));
    }

    #[tokio::test]
    async fn tool_errors_still_return_ok() {
        let connector = ScriptedConnector::new()
            .respond_json("get_product", json!({"error": "Product with id=3 not found"}));
        let response = app(connector)
            .oneshot(post_query(r#"{"query": "Посчитай скидку 5% на товар с ID 3"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["answer"], json!("Ошибка MCP: Product with id=3 not found"));
    }

    #[tokio::test]
    async fn transport_failure_is_service_unavailable() {
        let response = app(ScriptedConnector::unavailable("spawn failed"))
            .oneshot(post_query(r#"{"query": "Какая средняя цена продуктов?"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(
            body["error"],
            json!("The product tool service is temporarily unavailable. Please retry shortly.")
        );
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let response = app(ScriptedConnector::new())
            .oneshot(post_query(r#"{"question": 1}"#))
            .await
            .expect("response");

        assert!(response.status().is_client_error());
    }
}
