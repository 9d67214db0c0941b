//! Order request repository.

use std::sync::Arc;

use rawmate_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, prelude::DateTimeWithTimeZone, sea_query::Expr,
};

use super::db_err;
use crate::entities::request_status::RequestStatus;
use crate::entities::{OrderRequest, order_request};

/// Repository for order request operations.
#[derive(Clone)]
pub struct OrderRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRequestRepository {
    /// Create a new order request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new order request.
    pub async fn create(
        &self,
        model: order_request::ActiveModel,
    ) -> AppResult<order_request::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Find an order request addressed to a given supplier.
    pub async fn find_by_id_for_supplier(
        &self,
        id: &str,
        supplier_id: &str,
    ) -> AppResult<Option<order_request::Model>> {
        OrderRequest::find_by_id(id)
            .filter(order_request::Column::SupplierId.eq(supplier_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Requests received by a supplier, newest first.
    pub async fn find_by_supplier(
        &self,
        supplier_id: &str,
    ) -> AppResult<Vec<order_request::Model>> {
        OrderRequest::find()
            .filter(order_request::Column::SupplierId.eq(supplier_id))
            .order_by(order_request::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Requests sent by a vendor, newest first.
    pub async fn find_by_vendor(&self, vendor_id: &str) -> AppResult<Vec<order_request::Model>> {
        OrderRequest::find()
            .filter(order_request::Column::VendorId.eq(vendor_id))
            .order_by(order_request::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Move a pending request to `status`, stamping `updated_at`.
    ///
    /// The update only matches while the row is still pending. Returns
    /// `false` when another decision got there first.
    pub async fn transition(
        &self,
        id: &str,
        supplier_id: &str,
        status: RequestStatus,
        updated_at: DateTimeWithTimeZone,
    ) -> AppResult<bool> {
        let result = OrderRequest::update_many()
            .col_expr(order_request::Column::Status, Expr::value(status))
            .col_expr(
                order_request::Column::UpdatedAt,
                Expr::value(updated_at),
            )
            .filter(order_request::Column::Id.eq(id))
            .filter(order_request::Column::SupplierId.eq(supplier_id))
            .filter(order_request::Column::Status.eq(RequestStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_order(id: &str, status: RequestStatus) -> order_request::Model {
        let now = Utc::now().fixed_offset();
        order_request::Model {
            id: id.to_string(),
            vendor_id: "v1".to_string(),
            supplier_id: "s1".to_string(),
            product_id: "Tomatoes".to_string(),
            quantity: 40,
            notes: String::new(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_for_supplier() {
        let order = create_test_order("o1", RequestStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order.clone()]])
                .into_connection(),
        );

        let repo = OrderRequestRepository::new(db);
        let result = repo.find_by_id_for_supplier("o1", "s1").await.unwrap();

        assert_eq!(result, Some(order));
    }

    #[tokio::test]
    async fn test_find_by_vendor() {
        let o1 = create_test_order("o1", RequestStatus::Pending);
        let o2 = create_test_order("o2", RequestStatus::Declined);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[o1, o2]])
                .into_connection(),
        );

        let repo = OrderRequestRepository::new(db);
        let result = repo.find_by_vendor("v1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_transition_applies_once() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = OrderRequestRepository::new(db);
        let now = Utc::now().fixed_offset();

        assert!(
            repo.transition("o1", "s1", RequestStatus::Accepted, now)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .transition("o1", "s1", RequestStatus::Declined, now)
                .await
                .unwrap()
        );
    }
}
