//! User service.

use chrono::Utc;
use rawmate_common::{AppError, AppResult};
use rawmate_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::{Validate, ValidateEmail};

/// Location stored when a new user gives none.
const DEFAULT_LOCATION: &str = "Unknown";

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

/// Input for identifying a user.
///
/// Length limits match the `user` table columns.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyInput {
    /// Client-generated ID.
    #[serde(rename = "_id")]
    #[validate(length(max = 128, message = "User ID must be at most 128 characters."))]
    pub id: Option<String>,
    #[validate(length(max = 256, message = "Name must be at most 256 characters."))]
    pub name: Option<String>,
    #[validate(length(max = 320, message = "Email must be at most 320 characters."))]
    pub email: Option<String>,
    pub role: Option<String>,
    #[validate(length(max = 256, message = "Location must be at most 256 characters."))]
    pub location: Option<String>,
}

/// Outcome of an identify call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identified {
    /// No user had this ID before.
    Created(user::Model),
    /// An existing user was overwritten.
    Updated(user::Model),
}

impl Identified {
    /// The stored user.
    #[must_use]
    pub fn into_user(self) -> user::Model {
        match self {
            Self::Created(user) | Self::Updated(user) => user,
        }
    }
}

/// Validated identify input.
struct Profile {
    id: String,
    name: String,
    email: String,
    role: UserRole,
    location: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Profile {
    fn parse(input: &IdentifyInput) -> AppResult<Self> {
        let (Some(id), Some(name), Some(email), Some(role)) = (
            non_blank(input.id.as_ref()),
            non_blank(input.name.as_ref()),
            non_blank(input.email.as_ref()),
            non_blank(input.role.as_ref()),
        ) else {
            return Err(AppError::Validation(
                "User ID, name, email, and role are required.".to_string(),
            ));
        };

        input.validate()?;

        let role = UserRole::parse(&role).ok_or_else(|| {
            AppError::Validation("Role must be \"vendor\" or \"supplier\".".to_string())
        })?;

        let email = email.to_lowercase();
        if !email.validate_email() {
            return Err(AppError::Validation(
                "Email must be a valid address.".to_string(),
            ));
        }

        Ok(Self {
            id,
            name,
            email,
            role,
            location: non_blank(input.location.as_ref()),
        })
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_id(id).await
    }

    /// Create or overwrite the user with the client-supplied ID.
    ///
    /// Role changes are accepted; there is no role lock.
    pub async fn identify(&self, input: IdentifyInput) -> AppResult<Identified> {
        let profile = Profile::parse(&input)?;

        if let Some(existing) = self.user_repo.find_by_id(&profile.id).await? {
            return self.overwrite(existing, profile).await.map(Identified::Updated);
        }

        let model = user::ActiveModel {
            id: Set(profile.id.clone()),
            name: Set(profile.name.clone()),
            email: Set(profile.email.clone()),
            role: Set(profile.role),
            location: Set(profile
                .location
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string())),
            created_at: Set(Utc::now().into()),
        };

        if let Some(created) = self.user_repo.create(model).await? {
            tracing::info!(user_id = %created.id, role = created.role.as_str(), "User created");
            return Ok(Identified::Created(created));
        }

        // Lost a race against a concurrent create of the same ID
        let existing = self
            .user_repo
            .find_by_id(&profile.id)
            .await?
            .ok_or_else(|| AppError::Internal("User vanished during identify".to_string()))?;
        self.overwrite(existing, profile).await.map(Identified::Updated)
    }

    async fn overwrite(&self, existing: user::Model, profile: Profile) -> AppResult<user::Model> {
        let mut active = existing.into_active_model();
        active.name = Set(profile.name);
        active.email = Set(profile.email);
        active.role = Set(profile.role);
        if let Some(location) = profile.location {
            active.location = Set(location);
        }

        let updated = self.user_repo.update(active).await?;
        tracing::debug!(user_id = %updated.id, role = updated.role.as_str(), "User updated");
        Ok(updated)
    }

    /// List all suppliers.
    pub async fn list_suppliers(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_suppliers().await
    }
}
