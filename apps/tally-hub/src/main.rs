use std::net::SocketAddr;
use std::path::Path;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_hub::config::Config;
use tally_hub::hub::heartbeat;
use tally_hub::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file; env vars may also be set externally.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    tracing::info!(
        heartbeat_ms = config.heartbeat_interval.as_millis() as u64,
        write_timeout_ms = config.write_timeout.as_millis() as u64,
        intake_capacity = config.intake_capacity,
        "tally-hub configured"
    );

    let heartbeat_interval = config.heartbeat_interval;
    let state = AppState::new(config);
    heartbeat::spawn(state.hub.clone(), heartbeat_interval);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = tally_hub::routes::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "tally-hub listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
