use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;

use crate::engine::planner::plan_route;
use crate::error::AppError;
use crate::models::plan::RoutePlan;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/plan", post(compute_plan).get(current_plan))
}

/// Synchronous planning run. An empty candidate set returns an empty plan,
/// not an error; a provider matrix failure surfaces as 502 and leaves the
/// previously published plan untouched.
async fn compute_plan(State(state): State<Arc<AppState>>) -> Result<Json<RoutePlan>, AppError> {
    let plan = plan_route(&state).await?;
    Ok(Json(plan))
}

/// The most recently completed run's result, if any.
async fn current_plan(State(state): State<Arc<AppState>>) -> Json<Option<RoutePlan>> {
    Json(state.current_plan.read().await.clone())
}
