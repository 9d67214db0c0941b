//! Repositories over the entity store.

mod chat_message;
mod group;
mod order_request;
mod user;

pub use chat_message::ChatMessageRepository;
pub use group::GroupRepository;
pub use order_request::OrderRequestRepository;
pub use user::UserRepository;

use rawmate_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Wrap a store error.
pub(crate) fn db_err(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}

/// Whether the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Wrap a failed insert, reporting a dangling user reference as not found.
pub(crate) fn insert_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("User not found. Identify before continuing.".to_string())
        }
        _ => db_err(err),
    }
}
