//! User repository.

use std::sync::Arc;

use rawmate_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder,
};

use super::{db_err, is_unique_violation};
use crate::entities::user::UserRole;
use crate::entities::{User, user};

/// Repository for user operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find users by IDs. Missing IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// List all suppliers by name.
    pub async fn find_suppliers(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Role.eq(UserRole::Supplier))
            .order_by(user::Column::Name, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new user.
    ///
    /// Returns `None` when a user with the same ID already exists.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<Option<user::Model>> {
        match model.insert(self.db.as_ref()).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role,
            location: "Pune".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let user = create_test_user("u1", UserRole::Vendor);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("u1").await.unwrap();

        assert_eq!(result, Some(user));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        // No results appended: any query would fail
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_suppliers() {
        let s1 = create_test_user("s1", UserRole::Supplier);
        let s2 = create_test_user("s2", UserRole::Supplier);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[s1, s2]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_suppliers().await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|u| u.role == UserRole::Supplier));
    }

    #[tokio::test]
    async fn test_create() {
        let user = create_test_user("u1", UserRole::Vendor);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let active = user::ActiveModel {
            id: Set("u1".to_string()),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            role: Set(UserRole::Vendor),
            location: Set(user.location.clone()),
            created_at: Set(user.created_at),
        };

        let created = repo.create(active).await.unwrap();
        assert_eq!(created, Some(user));
    }
}
