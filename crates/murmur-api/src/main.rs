//! Murmur notification API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use murmur_api::auth::HmacSessionVerifier;
use murmur_api::error::AppError;
use murmur_api::routes;
use murmur_api::state::AppState;
use murmur_bus::EventBus;
use murmur_core::clock::SystemClock;
use murmur_notify::{AccountingService, Notifier};
use murmur_relay::{ChannelAuthorizer, NoopRelayClient, RelayClient, RelayPublisher};
use murmur_store::PgNotificationReadStore;

fn require_env(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::Config(format!("{name} must be set")))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Murmur notification API server");

    // Read configuration from environment.
    let database_url = require_env("DATABASE_URL")?;
    let relay_secret = require_env("RELAY_SECRET")?;
    let session_secret = require_env("SESSION_SECRET")?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    // Wire the delivery subsystem. The relay client is the vendor seam;
    // the noop client stands in until one is configured.
    let bus = Arc::new(EventBus::new());
    let relay: Arc<dyn RelayClient> = Arc::new(NoopRelayClient);
    let publisher = Arc::new(RelayPublisher::new(Arc::clone(&relay)));
    let notifier = Arc::new(Notifier::new(Arc::clone(&bus), publisher));
    let authorizer = Arc::new(ChannelAuthorizer::new(
        relay_secret,
        Arc::new(SystemClock),
    ));
    let store = Arc::new(PgNotificationReadStore::new(pool));
    let accounting = Arc::new(AccountingService::new(relay, store));
    let identity = Arc::new(HmacSessionVerifier::new(session_secret));
    let app_state = AppState::new(notifier, authorizer, accounting, identity);

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/notifications", routes::notifications::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // On ctrl-c, close the bus so open streams drain and end before the
    // server stops accepting connections.
    let shutdown_bus = Arc::clone(&bus);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            shutdown_bus.close();
        })
        .await?;

    Ok(())
}
