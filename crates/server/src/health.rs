use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_path: String,
}

pub fn router(db_path: impl Into<String>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_path: db_path.into() })
}

pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", db_path: state.db_path })
}
