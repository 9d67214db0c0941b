//! Rawmate server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use rawmate_api::{AppState, ChatHub, app_router};
use rawmate_common::Config;
use rawmate_common::config::CorsConfig;
use rawmate_core::{ChatService, GroupService, MarketPriceService, OrderRequestService, UserService};
use rawmate_db::repositories::{
    ChatMessageRepository, GroupRepository, OrderRequestRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the CORS layer. An empty origin list allows any origin.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rawmate=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting rawmate server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database; the server does not start without it
    let db = Arc::new(rawmate_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    rawmate_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let order_request_repo = OrderRequestRepository::new(Arc::clone(&db));
    let chat_message_repo = ChatMessageRepository::new(Arc::clone(&db));

    // Chat rooms live in this process
    let chat = ChatHub::new(&config.chat);

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let group_service = GroupService::new(group_repo);
    let order_request_service = OrderRequestService::new(order_request_repo, user_repo);
    let chat_service = ChatService::new(
        chat_message_repo,
        Arc::new(chat.clone()),
        config.chat.history_limit,
    );
    let market_price_service = MarketPriceService::new(config.market_prices.clone())?;
    if config.market_prices.api_key.is_none() {
        warn!("Market price API key is not set; price lookups will fail");
    }

    let state = AppState {
        user_service,
        group_service,
        order_request_service,
        chat_service,
        market_price_service,
        chat,
    };

    let app = app_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors))
        .with_state(state);

    // Start server with graceful shutdown
    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((ip, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
