//! Group chat service.
//!
//! Messages are appended to the store and then handed to the event publisher
//! for fan-out. Posting into one room is serialized so subscribers receive
//! messages in the order they were stored.

use chrono::Utc;
use rawmate_common::{AppError, AppResult, IdGenerator, KeyedLocks};
use rawmate_db::{entities::chat_message, repositories::ChatMessageRepository};
use sea_orm::Set;
use serde::Deserialize;

use super::event_publisher::EventPublisherService;

const ANONYMOUS_SENDER_ID: &str = "anonymous";
const ANONYMOUS_SENDER_NAME: &str = "Anonymous";

/// Input for posting a chat message.
///
/// Sender fields are taken on trust.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChatMessageInput {
    pub group_id: Option<String>,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub message: Option<String>,
}

/// Service for group chat rooms.
#[derive(Clone)]
pub struct ChatService {
    chat_repo: ChatMessageRepository,
    event_publisher: EventPublisherService,
    room_locks: KeyedLocks,
    history_limit: u64,
    id_gen: IdGenerator,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ChatService {
    /// Create a new chat service.
    #[must_use]
    pub fn new(
        chat_repo: ChatMessageRepository,
        event_publisher: EventPublisherService,
        history_limit: u64,
    ) -> Self {
        Self {
            chat_repo,
            event_publisher,
            room_locks: KeyedLocks::new(),
            history_limit,
            id_gen: IdGenerator::new(),
        }
    }

    /// The most recent messages of a room, oldest first.
    pub async fn history(&self, group_id: &str) -> AppResult<Vec<chat_message::Model>> {
        self.chat_repo
            .find_recent(group_id, self.history_limit)
            .await
    }

    /// Store a message and broadcast it to the room.
    pub async fn post(&self, input: PostChatMessageInput) -> AppResult<chat_message::Model> {
        let group_id = present(input.group_id)
            .ok_or_else(|| AppError::Validation("Group ID is required.".to_string()))?;
        let message = input
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("Message must not be empty.".to_string()))?;

        // Id and timestamp are assigned under the room lock so stored order
        // matches broadcast order.
        let _guard = self.room_locks.lock(&group_id).await;

        let model = chat_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.clone()),
            sender_id: Set(
                present(input.sender_id).unwrap_or_else(|| ANONYMOUS_SENDER_ID.to_string())
            ),
            sender_name: Set(
                present(input.sender_name).unwrap_or_else(|| ANONYMOUS_SENDER_NAME.to_string())
            ),
            message: Set(message),
            timestamp: Set(Utc::now().into()),
        };

        let saved = self.chat_repo.create(model).await?;

        if let Err(e) = self
            .event_publisher
            .publish_group_chat_message(&saved)
            .await
        {
            tracing::warn!(error = %e, group_id = %saved.group_id, "Failed to publish chat message");
        }

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event_publisher::EventPublisher;
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<chat_message::Model>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish_group_chat_message(
            &self,
            message: &chat_message::Model,
        ) -> AppResult<()> {
            self.published.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn stored(id: &str, sender_id: &str, sender_name: &str) -> chat_message::Model {
        chat_message::Model {
            id: id.to_string(),
            group_id: "g1".to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            message: "Is the truck leaving at 6?".to_string(),
            timestamp: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_post_persists_then_publishes() {
        let saved = stored("m1", "anonymous", "Anonymous");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[saved.clone()]])
                .into_connection(),
        );
        let publisher = Arc::new(RecordingPublisher::default());
        let service = ChatService::new(ChatMessageRepository::new(db), publisher.clone(), 50);

        let input = PostChatMessageInput {
            group_id: Some("g1".to_string()),
            sender_id: None,
            sender_name: Some("  ".to_string()),
            message: Some("Is the truck leaving at 6?".to_string()),
        };
        let result = service.post(input).await.unwrap();

        assert_eq!(result, saved);
        assert_eq!(*publisher.published.lock().unwrap(), vec![saved]);
    }

    #[tokio::test]
    async fn test_post_stamps_message_under_room_lock() {
        let conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored("m1", "u1", "Asha")]])
                .into_connection(),
        );
        let service = ChatService::new(
            ChatMessageRepository::new(Arc::clone(&conn)),
            Arc::new(RecordingPublisher::default()),
            50,
        );

        // Another post into the same room is in flight
        let guard = service.room_locks.lock("g1").await;
        let poster = service.clone();
        let pending = tokio::spawn(async move {
            poster
                .post(PostChatMessageInput {
                    group_id: Some("g1".to_string()),
                    message: Some("Truck leaves at 6".to_string()),
                    ..Default::default()
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let released_at = Utc::now();
        drop(guard);

        pending.await.unwrap().unwrap();
        drop(service);

        let log = Arc::try_unwrap(conn).ok().unwrap().into_transaction_log();
        let stamped = log
            .iter()
            .flat_map(|txn| txn.statements())
            .filter_map(|stmt| stmt.values.as_ref())
            .flat_map(|values| values.0.iter())
            .find_map(|value| match value {
                Value::ChronoDateTimeWithTimeZone(Some(ts)) => Some(**ts),
                _ => None,
            })
            .unwrap();
        assert!(stamped >= released_at);
    }

    #[tokio::test]
    async fn test_post_rejects_blank_message() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let publisher = Arc::new(RecordingPublisher::default());
        let service = ChatService::new(ChatMessageRepository::new(db), publisher.clone(), 50);

        let input = PostChatMessageInput {
            group_id: Some("g1".to_string()),
            message: Some("   ".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.post(input).await,
            Err(AppError::Validation(_))
        ));
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_requires_group() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ChatService::new(
            ChatMessageRepository::new(db),
            Arc::new(crate::services::event_publisher::NoOpEventPublisher),
            50,
        );

        let input = PostChatMessageInput {
            message: Some("hello".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.post(input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_published() {
        // No query result queued: the insert fails
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let publisher = Arc::new(RecordingPublisher::default());
        let service = ChatService::new(ChatMessageRepository::new(db), publisher.clone(), 50);

        let input = PostChatMessageInput {
            group_id: Some("g1".to_string()),
            message: Some("hello".to_string()),
            ..Default::default()
        };

        assert!(service.post(input).await.is_err());
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let newer = stored("m2", "u1", "Asha");
        let older = stored("m1", "u2", "Ravi");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[newer, older]])
                .into_connection(),
        );
        let service = ChatService::new(
            ChatMessageRepository::new(db),
            Arc::new(crate::services::event_publisher::NoOpEventPublisher),
            50,
        );

        let history = service.history("g1").await.unwrap();
        let ids: Vec<_> = history.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }
}
