mod api;
mod config;
mod engine;
mod error;
mod models;
mod observability;
mod routing;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::routing::http::HttpRoutingProvider;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let routing = Arc::new(HttpRoutingProvider::new(
        config.routing_url.clone(),
        config.routing_api_key.clone(),
    ));

    let (app_state, plan_rx) = state::AppState::new(&config, routing);
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::planner::run_planner(shared_state.clone(), plan_rx));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, base_address = %config.base_address, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
