//! Intake Server Entry Point
//!
//! Loads configuration, opens the database, starts the pending sweep and
//! serves the Axum router until Ctrl-C.

use axum::Router;
use intake_api::telemetry::{init_tracing, TelemetryConfig};
use intake_api::{
    create_api_router, pending_sweep_task, ApiError, ApiResult, AppState, IntakeConfig,
    PendingSweepConfig,
};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&TelemetryConfig::from_env())?;

    let config = IntakeConfig::from_env()?;
    config.validate_for_production()?;
    tracing::debug!(?config, "Loaded configuration");

    let state = AppState::bootstrap(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = tokio::spawn(pending_sweep_task(
        state.pending.clone(),
        state.files.clone(),
        PendingSweepConfig::from_env(),
        shutdown_rx,
    ));

    let repo = state.repo.clone();
    let app: Router = create_api_router(state, &config);

    let addr = config.bind_addr()?;
    tracing::info!(%addr, environment = config.environment.as_str(), "Starting intake server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweep.await {
        tracing::warn!(error = %e, "Pending sweep task did not stop cleanly");
    }
    repo.close().await;

    Ok(())
}
