//! Chat message repository.

use std::sync::Arc;

use rawmate_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::db_err;
use crate::entities::{ChatMessage, chat_message};

/// Repository for group chat messages.
#[derive(Clone)]
pub struct ChatMessageRepository {
    db: Arc<DatabaseConnection>,
}

impl ChatMessageRepository {
    /// Create a new chat message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a message.
    pub async fn create(&self, model: chat_message::ActiveModel) -> AppResult<chat_message::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// The latest `limit` messages of a group, oldest first.
    pub async fn find_recent(
        &self,
        group_id: &str,
        limit: u64,
    ) -> AppResult<Vec<chat_message::Model>> {
        let mut messages = ChatMessage::find()
            .filter(chat_message::Column::GroupId.eq(group_id))
            .order_by(chat_message::Column::Timestamp, Order::Desc)
            .order_by(chat_message::Column::Id, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        messages.reverse();
        Ok(messages)
    }
}
