//! HTTP API layer for rawmate.
//!
//! This crate provides the REST API and the real-time group chat:
//!
//! - **Endpoints**: identity, groups and admission, order requests, market prices
//! - **Extractors**: JSON bodies with validation-style rejections
//! - **Streaming**: WebSocket fan-out for group chat rooms
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::{app_router, router};
pub use middleware::AppState;
pub use streaming::{ChatHub, chat_handler};
