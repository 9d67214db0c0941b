//! Caller context.
//!
//! There is no authentication; clients state who they are in every request
//! body. Services receive that claim as an [`Actor`] instead of reading any
//! ambient session state.

use rawmate_common::{AppError, AppResult};
use rawmate_db::entities::user::UserRole;
use serde::Deserialize;

/// The self-declared identity attached to a request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Client-supplied user ID.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Client-supplied role name.
    #[serde(default)]
    pub user_role: Option<String>,
}

impl Actor {
    /// Build an actor from explicit parts.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: Some(user_id.into()),
            user_role: Some(role.as_str().to_string()),
        }
    }

    /// The declared role, if it names a known one.
    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.user_role.as_deref().and_then(UserRole::parse)
    }

    /// The declared user ID, if present and not blank.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Fail with a role error unless the actor declared `role`.
    pub fn require_role(&self, role: UserRole, message: &str) -> AppResult<()> {
        if self.role() == Some(role) {
            Ok(())
        } else {
            Err(AppError::Role(message.to_string()))
        }
    }
}
