//! Taleturn session server entry point.

use std::error::Error;
use std::sync::Arc;

use taleturn_api::config::ServerConfig;
use taleturn_api::routes;
use taleturn_api::state::AppState;
use taleturn_core::clock::SystemClock;
use taleturn_generation::ChatCompletionsBackend;
use taleturn_narrative::application::controller::TurnController;
use taleturn_narrative::application::driver::SessionDriver;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Taleturn session server");

    let config = ServerConfig::from_env()?;
    let backend = ChatCompletionsBackend::new(config.backend.clone())?;
    tracing::info!(
        endpoint = %config.backend.endpoint(),
        model = %config.backend.model,
        "generation backend configured"
    );

    let controller = TurnController::new(Arc::new(backend), Arc::new(SystemClock));
    let driver = Arc::new(SessionDriver::new(Arc::new(controller)));

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(AppState::new(Arc::clone(&driver)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    routes::session::spawn_start(Arc::clone(&driver));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(driver))
        .await?;

    Ok(())
}

async fn shutdown_signal(driver: Arc<SessionDriver>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
    driver.teardown();
}
