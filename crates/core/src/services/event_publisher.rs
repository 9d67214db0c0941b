//! Event publisher service.
//!
//! Lets the chat service announce new messages without depending on the
//! transport that delivers them. The WebSocket hub in the API crate is the
//! production implementation.

use async_trait::async_trait;
use rawmate_common::AppResult;
use rawmate_db::entities::chat_message;
use std::sync::Arc;

/// Trait for publishing real-time events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver a stored chat message to every subscriber of its group.
    async fn publish_group_chat_message(&self, message: &chat_message::Model) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for tests or when fan-out is disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_group_chat_message(&self, _message: &chat_message::Model) -> AppResult<()> {
        Ok(())
    }
}

/// Type alias for a shared event publisher.
pub type EventPublisherService = Arc<dyn EventPublisher>;
