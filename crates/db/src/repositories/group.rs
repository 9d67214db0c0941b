//! Group repository.

use std::sync::Arc;

use rawmate_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, TransactionTrait, sea_query::Expr,
};

use super::{db_err, insert_err, is_unique_violation};
use crate::entities::request_status::RequestStatus;
use crate::entities::{Group, JoinRequest, group, join_request};

/// Repository for group operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<group::Model>> {
        Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get a group by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found.".to_string()))
    }

    /// List all groups, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<group::Model>> {
        Group::find()
            .order_by(group::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// List groups created by a user, newest first.
    pub async fn find_by_creator(&self, creator_id: &str) -> AppResult<Vec<group::Model>> {
        Group::find()
            .filter(group::Column::CreatorId.eq(creator_id))
            .order_by(group::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new group.
    pub async fn create(&self, model: group::ActiveModel) -> AppResult<group::Model> {
        model.insert(self.db.as_ref()).await.map_err(insert_err)
    }

    // ==================== Join Request Operations ====================

    /// Find the active (pending or accepted) join request of a user for a group.
    pub async fn find_active_join_request(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<Option<join_request::Model>> {
        JoinRequest::find()
            .filter(join_request::Column::GroupId.eq(group_id))
            .filter(join_request::Column::UserId.eq(user_id))
            .filter(
                join_request::Column::Status
                    .is_in([RequestStatus::Pending, RequestStatus::Accepted]),
            )
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Reserve `quantity` of a group's capacity and record the join request.
    ///
    /// Both writes happen in one transaction. The capacity increment only
    /// applies while `joined_quantity + quantity <= total_quantity` holds at
    /// write time, so concurrent admissions can never overfill a group.
    /// Returns the stored request and the group as updated.
    pub async fn admit(
        &self,
        group_id: &str,
        quantity: i32,
        request: join_request::ActiveModel,
    ) -> AppResult<(join_request::Model, group::Model)> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let reserved = Group::update_many()
            .col_expr(
                group::Column::JoinedQuantity,
                Expr::col(group::Column::JoinedQuantity).add(quantity),
            )
            .filter(group::Column::Id.eq(group_id))
            .filter(
                Expr::col(group::Column::JoinedQuantity)
                    .lte(Expr::col(group::Column::TotalQuantity).sub(quantity)),
            )
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if reserved.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Err(AppError::CapacityExceeded(format!(
                "Joining {quantity} kg would exceed the group's remaining capacity."
            )));
        }

        let join_request = match request.insert(&txn).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await.map_err(db_err)?;
                return Err(AppError::DuplicateRequest(
                    "You already have an active join request for this group.".to_string(),
                ));
            }
            Err(e) => return Err(insert_err(e)),
        };

        let group = Group::find_by_id(group_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound("Group not found.".to_string()))?;

        txn.commit().await.map_err(db_err)?;

        Ok((join_request, group))
    }
}
