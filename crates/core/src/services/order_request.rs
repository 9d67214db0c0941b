//! Order request workflow.

use std::collections::HashMap;

use chrono::Utc;
use rawmate_common::{AppError, AppResult, IdGenerator};
use rawmate_db::entities::request_status::RequestStatus;
use rawmate_db::entities::user::{self, UserRole};
use rawmate_db::entities::order_request;
use rawmate_db::repositories::{OrderRequestRepository, UserRepository};
use sea_orm::Set;
use serde::Deserialize;

use super::actor::Actor;

/// Input for creating an order request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequestInput {
    pub supplier_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

/// Input for deciding on an order request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusInput {
    pub status: Option<String>,
}

/// An order request together with the user on the other side of it.
#[derive(Debug, Clone)]
pub struct OrderRequestWithParty {
    pub request: order_request::Model,
    /// Vendor for supplier listings, supplier for vendor listings.
    /// `None` when that user record no longer exists.
    pub counterpart: Option<user::Model>,
}

fn vendor_of(request: &order_request::Model) -> &str {
    &request.vendor_id
}

fn supplier_of(request: &order_request::Model) -> &str {
    &request.supplier_id
}

/// Service for vendor-to-supplier order requests.
#[derive(Clone)]
pub struct OrderRequestService {
    order_repo: OrderRequestRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl OrderRequestService {
    /// Create a new order request service.
    #[must_use]
    pub const fn new(order_repo: OrderRequestRepository, user_repo: UserRepository) -> Self {
        Self {
            order_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send an order request from a vendor to a supplier.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateOrderRequestInput,
    ) -> AppResult<order_request::Model> {
        actor.require_role(UserRole::Vendor, "Only vendors can create order requests.")?;

        let supplier_id = input.supplier_id.as_deref().map(str::trim);
        let product_id = input.product_id.as_deref().map(str::trim);
        let (Some(vendor_id), Some(supplier_id), Some(product_id), Some(quantity)) =
            (actor.user_id(), supplier_id, product_id, input.quantity)
        else {
            return Err(AppError::Validation(
                "Missing required fields for order request.".to_string(),
            ));
        };
        if supplier_id.is_empty() || product_id.is_empty() || quantity == 0 {
            return Err(AppError::Validation(
                "Missing required fields for order request.".to_string(),
            ));
        }
        if quantity < 0 {
            return Err(AppError::Validation(
                "Quantity must be at least 1.".to_string(),
            ));
        }

        let supplier = self.user_repo.find_by_id(supplier_id).await?;
        if !supplier.is_some_and(|s| s.role == UserRole::Supplier) {
            return Err(AppError::NotFound(
                "Target supplier not found or is not a valid supplier.".to_string(),
            ));
        }

        let now = Utc::now().fixed_offset();
        let model = order_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            vendor_id: Set(vendor_id.to_string()),
            supplier_id: Set(supplier_id.to_string()),
            product_id: Set(product_id.to_string()),
            quantity: Set(quantity),
            notes: Set(input.notes.unwrap_or_default()),
            status: Set(RequestStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let request = self.order_repo.create(model).await?;
        tracing::info!(
            request_id = %request.id,
            vendor_id = %request.vendor_id,
            supplier_id = %request.supplier_id,
            "Order request created"
        );

        Ok(request)
    }

    /// Accept or decline a pending order request addressed to the acting supplier.
    ///
    /// A request is decided at most once.
    pub async fn update_status(
        &self,
        actor: &Actor,
        request_id: &str,
        input: UpdateOrderStatusInput,
    ) -> AppResult<order_request::Model> {
        actor.require_role(
            UserRole::Supplier,
            "Only suppliers can update order request status.",
        )?;

        let status = input
            .status
            .as_deref()
            .and_then(RequestStatus::parse_decision)
            .ok_or_else(|| {
                AppError::Validation(
                    "Invalid status provided. Must be \"Accepted\" or \"Declined\".".to_string(),
                )
            })?;

        let not_found = || {
            AppError::NotFound(
                "Order request not found or you are not authorized to modify it.".to_string(),
            )
        };
        let supplier_id = actor.user_id().ok_or_else(not_found)?;

        let mut request = self
            .order_repo
            .find_by_id_for_supplier(request_id, supplier_id)
            .await?
            .ok_or_else(not_found)?;

        if request.status.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "Order request already {}. Cannot change a non-pending request.",
                request.status
            )));
        }

        let now = Utc::now().fixed_offset();
        if !self
            .order_repo
            .transition(request_id, supplier_id, status, now)
            .await?
        {
            return Err(AppError::InvalidTransition(
                "Order request was decided concurrently. Cannot change a non-pending request."
                    .to_string(),
            ));
        }

        tracing::info!(request_id = %request_id, status = %status, "Order request decided");

        request.status = status;
        request.updated_at = now;
        Ok(request)
    }

    /// Requests received by a supplier, newest first, with vendor details.
    pub async fn list_for_supplier(
        &self,
        supplier_id: &str,
    ) -> AppResult<Vec<OrderRequestWithParty>> {
        let requests = self.order_repo.find_by_supplier(supplier_id).await?;
        self.attach_counterparts(requests, vendor_of).await
    }

    /// Requests sent by a vendor, newest first, with supplier details.
    pub async fn list_for_vendor(&self, vendor_id: &str) -> AppResult<Vec<OrderRequestWithParty>> {
        let requests = self.order_repo.find_by_vendor(vendor_id).await?;
        self.attach_counterparts(requests, supplier_of).await
    }

    async fn attach_counterparts(
        &self,
        requests: Vec<order_request::Model>,
        counterpart_id: fn(&order_request::Model) -> &str,
    ) -> AppResult<Vec<OrderRequestWithParty>> {
        let mut ids: Vec<String> = requests
            .iter()
            .map(|r| counterpart_id(r).to_string())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(requests
            .into_iter()
            .map(|request| {
                let counterpart = users.get(counterpart_id(&request)).cloned();
                OrderRequestWithParty {
                    request,
                    counterpart,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role,
            location: "Nashik".to_string(),
            created_at: Utc::now().into(),
        }
    }

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

    fn service(order_db: MockDatabase, user_db: MockDatabase) -> OrderRequestService {
        OrderRequestService::new(
            OrderRequestRepository::new(Arc::new(order_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
        )
    }

    fn empty_db() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn order_input(supplier_id: &str) -> CreateOrderRequestInput {
        CreateOrderRequestInput {
            supplier_id: Some(supplier_id.to_string()),
            product_id: Some("Tomatoes".to_string()),
            quantity: Some(40),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_requires_vendor() {
        let service = service(empty_db(), empty_db());
        let supplier = Actor::new("s1", UserRole::Supplier);

        let result = service.create(&supplier, order_input("s1")).await;
        assert!(matches!(result, Err(AppError::Role(_))));
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let service = service(empty_db(), empty_db());
        let vendor = Actor::new("v1", UserRole::Vendor);

        let mut input = order_input("s1");
        input.product_id = None;

        let result = service.create(&vendor, input).await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ref m)) if m == "Missing required fields for order request."
        ));
    }

    #[tokio::test]
    async fn test_create_to_missing_supplier_stores_nothing() {
        // The order store has no results queued: an insert would fail
        let service = service(
            empty_db(),
            empty_db().append_query_results([Vec::<user::Model>::new()]),
        );
        let vendor = Actor::new("v1", UserRole::Vendor);

        let result = service.create(&vendor, order_input("ghost")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_to_vendor_is_not_a_supplier() {
        let service = service(
            empty_db(),
            empty_db().append_query_results([[create_test_user("v9", UserRole::Vendor)]]),
        );
        let vendor = Actor::new("v1", UserRole::Vendor);

        let result = service.create(&vendor, order_input("v9")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_success() {
        let stored = create_test_order("o1", RequestStatus::Pending);
        let service = service(
            empty_db().append_query_results([[stored.clone()]]),
            empty_db().append_query_results([[create_test_user("s1", UserRole::Supplier)]]),
        );
        let vendor = Actor::new("v1", UserRole::Vendor);

        let request = service.create(&vendor, order_input("s1")).await.unwrap();
        assert_eq!(request, stored);
    }

    #[tokio::test]
    async fn test_update_status_rejects_pending_as_decision() {
        let service = service(empty_db(), empty_db());
        let supplier = Actor::new("s1", UserRole::Supplier);

        let input = UpdateOrderStatusInput {
            status: Some("Pending".to_string()),
        };
        let result = service.update_status(&supplier, "o1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_status_requires_supplier() {
        let service = service(empty_db(), empty_db());
        let vendor = Actor::new("v1", UserRole::Vendor);

        let input = UpdateOrderStatusInput {
            status: Some("Accepted".to_string()),
        };
        let result = service.update_status(&vendor, "o1", input).await;
        assert!(matches!(result, Err(AppError::Role(_))));
    }

    #[tokio::test]
    async fn test_update_status_once() {
        let service = service(
            empty_db()
                .append_query_results([[create_test_order("o1", RequestStatus::Pending)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[create_test_order("o1", RequestStatus::Accepted)]]),
            empty_db(),
        );
        let supplier = Actor::new("s1", UserRole::Supplier);

        let accepted = service
            .update_status(
                &supplier,
                "o1",
                UpdateOrderStatusInput {
                    status: Some("Accepted".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(accepted.updated_at >= accepted.created_at);

        let second = service
            .update_status(
                &supplier,
                "o1",
                UpdateOrderStatusInput {
                    status: Some("Declined".to_string()),
                },
            )
            .await;
        assert!(matches!(
            second,
            Err(AppError::InvalidTransition(ref m))
                if m == "Order request already Accepted. Cannot change a non-pending request."
        ));
    }

    #[tokio::test]
    async fn test_update_status_not_owned() {
        let service = service(
            empty_db().append_query_results([Vec::<order_request::Model>::new()]),
            empty_db(),
        );
        let supplier = Actor::new("s2", UserRole::Supplier);

        let input = UpdateOrderStatusInput {
            status: Some("Declined".to_string()),
        };
        let result = service.update_status(&supplier, "o1", input).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_supplier_attaches_vendor() {
        let service = service(
            empty_db().append_query_results([[
                create_test_order("o2", RequestStatus::Pending),
                create_test_order("o1", RequestStatus::Declined),
            ]]),
            empty_db().append_query_results([[create_test_user("v1", UserRole::Vendor)]]),
        );

        let listed = service.list_for_supplier("s1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(
            listed
                .iter()
                .all(|r| r.counterpart.as_ref().is_some_and(|u| u.id == "v1"))
        );
    }

    #[tokio::test]
    async fn test_list_for_vendor_with_deleted_supplier() {
        let service = service(
            empty_db().append_query_results([[create_test_order("o1", RequestStatus::Pending)]]),
            empty_db().append_query_results([Vec::<user::Model>::new()]),
        );

        let listed = service.list_for_vendor("v1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].counterpart.is_none());
    }
}
