// Start of file: src/main.rs

use axum::{Router, serve};
use tokio::net::TcpListener;

use property_dashboard_api::core::{logging, server};
use property_dashboard_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // set up logging
    logging::init_tracing();

    let state: AppState = AppState::from_environment()?;
    state.initialize().await;

    let app: Router = server::create_app(state.clone());
    let listener: TcpListener = server::setup_listener(&state.environment).await?;

    tracing::info!("Server listening on: {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    // Gracefully close database connections
    state.shutdown().await;

    Ok(())
}

// End of file: src/main.rs
