pub mod plan;
pub mod shipments;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(shipments::router())
        .merge(plan::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    shipments: usize,
    archived: usize,
    has_plan: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let archived = state
        .shipments
        .iter()
        .filter(|entry| entry.value().is_archived())
        .count();

    Json(HealthResponse {
        status: "ok",
        shipments: state.shipments.len(),
        archived,
        has_plan: state.current_plan.read().await.is_some(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
