//! API endpoints.

mod groups;
mod join_requests;
mod market_prices;
mod order_requests;
mod users;

use axum::{Router, routing::get};

use crate::middleware::AppState;
use crate::streaming::chat_handler;

/// Create the API router, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(order_requests::router())
        .nest("/groups", groups::router())
        .nest("/join-requests", join_requests::router())
        .nest("/market-prices", market_prices::router())
}

/// Create the full application router: the API plus the chat socket.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/chat", get(chat_handler))
        .nest("/api", router())
}
