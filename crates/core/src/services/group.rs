//! Group service, including join admission.

use chrono::Utc;
use rawmate_common::{AppError, AppResult, IdGenerator, KeyedLocks};
use rawmate_db::entities::group::GroupStatus;
use rawmate_db::entities::request_status::RequestStatus;
use rawmate_db::entities::user::UserRole;
use rawmate_db::entities::{group, join_request};
use rawmate_db::repositories::GroupRepository;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::actor::Actor;

/// Input for creating a group.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 256, message = "Product must not be empty."))]
    pub product: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0."))]
    pub price: Option<f64>,
    #[validate(range(min = 1, message = "Total quantity must be at least 1 kg."))]
    pub total_quantity: Option<i32>,
    #[validate(range(min = 1, message = "Minimum join quantity must be at least 1 kg."))]
    pub min_join_quantity: Option<i32>,
    #[validate(length(min = 1, max = 256, message = "Pickup point must not be empty."))]
    pub pickup_point: Option<String>,
}

/// Input for joining a group.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupInput {
    pub quantity: Option<i32>,
}

/// Result of a successful admission.
#[derive(Debug, Clone)]
pub struct Admission {
    /// The stored join request.
    pub request: join_request::Model,
    /// The group after the increment.
    pub group: group::Model,
}

/// Service for managing groups.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    admission_locks: KeyedLocks,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub fn new(group_repo: GroupRepository) -> Self {
        Self {
            group_repo,
            admission_locks: KeyedLocks::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a group by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Option<group::Model>> {
        self.group_repo.find_by_id(id).await
    }

    /// List every group, newest first.
    pub async fn list_all(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_all().await
    }

    /// List groups created by a user, newest first.
    pub async fn list_by_creator(&self, creator_id: &str) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_by_creator(creator_id).await
    }

    /// Create a group on behalf of a vendor.
    pub async fn create(&self, actor: &Actor, input: CreateGroupInput) -> AppResult<group::Model> {
        actor.require_role(UserRole::Vendor, "Only vendors can create groups.")?;

        let creator_id = actor
            .user_id()
            .ok_or_else(|| AppError::Validation("User ID is required.".to_string()))?;

        let product = input.product.as_deref().map(str::trim);
        let pickup_point = input.pickup_point.as_deref().map(str::trim);
        let (Some(product), Some(price), Some(total), Some(min_join), Some(pickup_point)) = (
            product,
            input.price,
            input.total_quantity,
            input.min_join_quantity,
            pickup_point,
        ) else {
            return Err(AppError::Validation(
                "Product, price, total quantity, minimum join quantity and pickup point are required."
                    .to_string(),
            ));
        };

        input.validate()?;
        if product.is_empty() || pickup_point.is_empty() {
            return Err(AppError::Validation(
                "Product and pickup point must not be blank.".to_string(),
            ));
        }
        if min_join > total {
            return Err(AppError::Validation(
                "Minimum join quantity cannot exceed the total quantity.".to_string(),
            ));
        }

        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            creator_id: Set(creator_id.to_string()),
            product: Set(product.to_string()),
            price: Set(price),
            total_quantity: Set(total),
            min_join_quantity: Set(min_join),
            joined_quantity: Set(0),
            pickup_point: Set(pickup_point.to_string()),
            status: Set(GroupStatus::Open),
            created_at: Set(Utc::now().into()),
        };

        let group = self.group_repo.create(model).await?;
        tracing::info!(group_id = %group.id, creator_id = %group.creator_id, "Group created");

        Ok(group)
    }

    /// Admit a vendor into a group.
    ///
    /// Checks run in a fixed order: role, group existence, minimum quantity,
    /// capacity, self-join, duplicate. Joins into the same group are
    /// serialized in-process, and the store applies the increment only while
    /// capacity remains, so the group can never be overfilled.
    pub async fn join(
        &self,
        actor: &Actor,
        group_id: &str,
        input: JoinGroupInput,
    ) -> AppResult<Admission> {
        actor.require_role(UserRole::Vendor, "Only vendors can join groups.")?;

        let user_id = actor
            .user_id()
            .ok_or_else(|| AppError::Validation("User ID is required.".to_string()))?;
        let quantity = input
            .quantity
            .ok_or_else(|| AppError::Validation("Quantity is required.".to_string()))?;

        let _guard = self.admission_locks.lock(group_id).await;

        let group = self.group_repo.get_by_id(group_id).await?;

        if quantity < group.min_join_quantity {
            return Err(AppError::Validation(format!(
                "Quantity must be at least {} kg.",
                group.min_join_quantity
            )));
        }

        // Compared against what is left so a huge quantity cannot overflow
        if quantity > group.remaining_quantity() {
            return Err(AppError::CapacityExceeded(format!(
                "Joining {quantity} kg would exceed the group's total quantity of {} kg.",
                group.total_quantity
            )));
        }

        if group.creator_id == user_id {
            return Err(AppError::SelfJoin(
                "You cannot join a group you created.".to_string(),
            ));
        }

        if self
            .group_repo
            .find_active_join_request(group_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateRequest(
                "You already have an active join request for this group.".to_string(),
            ));
        }

        let request = join_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            quantity: Set(quantity),
            status: Set(RequestStatus::Pending),
            created_at: Set(Utc::now().into()),
        };

        let (request, group) = self.group_repo.admit(group_id, quantity, request).await?;
        tracing::info!(
            group_id = %group.id,
            user_id = %request.user_id,
            quantity,
            joined_quantity = group.joined_quantity,
            "Join request admitted"
        );

        Ok(Admission { request, group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_group(joined: i32) -> group::Model {
        group::Model {
            id: "g1".to_string(),
            creator_id: "creator".to_string(),
            product: "Onions".to_string(),
            price: 24.0,
            total_quantity: 100,
            min_join_quantity: 5,
            joined_quantity: joined,
            pickup_point: "Market Yard".to_string(),
            status: GroupStatus::Open,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_request(quantity: i32) -> join_request::Model {
        join_request::Model {
            id: "jr1".to_string(),
            group_id: "g1".to_string(),
            user_id: "v2".to_string(),
            quantity,
            status: RequestStatus::Pending,
            created_at: Utc::now().into(),
        }
    }

    fn join_input(quantity: i32) -> JoinGroupInput {
        JoinGroupInput {
            quantity: Some(quantity),
        }
    }

    fn service_with(db: MockDatabase) -> GroupService {
        GroupService::new(GroupRepository::new(Arc::new(db.into_connection())))
    }

    fn empty_db() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    #[tokio::test]
    async fn test_join_requires_vendor() {
        let service = service_with(empty_db());
        let supplier = Actor::new("s1", UserRole::Supplier);

        let result = service.join(&supplier, "g1", join_input(10)).await;
        assert!(matches!(
            result,
            Err(AppError::Role(ref m)) if m == "Only vendors can join groups."
        ));
    }

    #[tokio::test]
    async fn test_join_missing_group() {
        let service =
            service_with(empty_db().append_query_results([Vec::<group::Model>::new()]));
        let vendor = Actor::new("v2", UserRole::Vendor);

        let result = service.join(&vendor, "g1", join_input(10)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_join_below_minimum_never_writes() {
        // Only the lookup is answered; any write would fail the mock
        let service = service_with(empty_db().append_query_results([[create_test_group(90)]]));
        let vendor = Actor::new("v2", UserRole::Vendor);

        let result = service.join(&vendor, "g1", join_input(4)).await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ref m)) if m == "Quantity must be at least 5 kg."
        ));
    }

    #[tokio::test]
    async fn test_join_over_capacity() {
        let service = service_with(empty_db().append_query_results([[create_test_group(90)]]));
        let vendor = Actor::new("v2", UserRole::Vendor);

        let result = service.join(&vendor, "g1", join_input(15)).await;
        assert!(matches!(
            result,
            Err(AppError::CapacityExceeded(ref m))
                if m == "Joining 15 kg would exceed the group's total quantity of 100 kg."
        ));
    }

    #[tokio::test]
    async fn test_join_with_huge_quantity() {
        let service = service_with(empty_db().append_query_results([[create_test_group(90)]]));
        let vendor = Actor::new("v2", UserRole::Vendor);

        let result = service.join(&vendor, "g1", join_input(i32::MAX)).await;
        assert!(matches!(result, Err(AppError::CapacityExceeded(_))));
    }

    #[tokio::test]
    async fn test_concurrent_joins_are_serialized() {
        // Answers in the order one serialized admission after another consumes them:
        // the winner reads 90, finds no active request, reserves, inserts and
        // re-reads 100; the loser then reads 100.
        let service = service_with(
            empty_db()
                .append_query_results([[create_test_group(90)]])
                .append_query_results([Vec::<join_request::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[create_test_request(10)]])
                .append_query_results([[create_test_group(100)]])
                .append_query_results([[create_test_group(100)]]),
        );
        let first_vendor = Actor::new("v2", UserRole::Vendor);
        let second_vendor = Actor::new("v3", UserRole::Vendor);

        let (first, second) = tokio::join!(
            service.join(&first_vendor, "g1", join_input(10)),
            service.join(&second_vendor, "g1", join_input(10)),
        );

        let results = [first, second];
        let admitted: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].group.joined_quantity, 100);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::CapacityExceeded(_))))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_join_own_group() {
        let service = service_with(empty_db().append_query_results([[create_test_group(0)]]));
        let creator = Actor::new("creator", UserRole::Vendor);

        let result = service.join(&creator, "g1", join_input(10)).await;
        assert!(matches!(result, Err(AppError::SelfJoin(_))));
    }

    #[tokio::test]
    async fn test_join_with_active_request() {
        let service = service_with(
            empty_db()
                .append_query_results([[create_test_group(10)]])
                .append_query_results([[create_test_request(10)]]),
        );
        let vendor = Actor::new("v2", UserRole::Vendor);

        let result = service.join(&vendor, "g1", join_input(10)).await;
        assert!(matches!(result, Err(AppError::DuplicateRequest(_))));
    }

    #[tokio::test]
    async fn test_join_fills_group_exactly() {
        let service = service_with(
            empty_db()
                .append_query_results([[create_test_group(90)]])
                .append_query_results([Vec::<join_request::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[create_test_request(10)]])
                .append_query_results([[create_test_group(100)]]),
        );
        let vendor = Actor::new("v2", UserRole::Vendor);

        let admission = service.join(&vendor, "g1", join_input(10)).await.unwrap();
        assert_eq!(admission.group.joined_quantity, 100);
        assert_eq!(admission.group.product, "Onions");
        assert_eq!(admission.request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_requires_vendor() {
        let service = service_with(empty_db());
        let supplier = Actor::new("s1", UserRole::Supplier);

        let result = service.create(&supplier, CreateGroupInput::default()).await;
        assert!(matches!(
            result,
            Err(AppError::Role(ref m)) if m == "Only vendors can create groups."
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_min_above_total() {
        let service = service_with(empty_db());
        let vendor = Actor::new("v1", UserRole::Vendor);

        let input = CreateGroupInput {
            product: Some("Onions".to_string()),
            price: Some(24.0),
            total_quantity: Some(10),
            min_join_quantity: Some(20),
            pickup_point: Some("Market Yard".to_string()),
        };

        assert!(matches!(
            service.create(&vendor, input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_price() {
        let service = service_with(empty_db());
        let vendor = Actor::new("v1", UserRole::Vendor);

        let input = CreateGroupInput {
            product: Some("Onions".to_string()),
            price: Some(0.0),
            total_quantity: Some(100),
            min_join_quantity: Some(5),
            pickup_point: Some("Market Yard".to_string()),
        };

        assert!(matches!(
            service.create(&vendor, input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_starts_open_and_empty() {
        let stored = create_test_group(0);
        let service = service_with(empty_db().append_query_results([[stored]]));
        let vendor = Actor::new("creator", UserRole::Vendor);

        let input = CreateGroupInput {
            product: Some(" Onions ".to_string()),
            price: Some(24.0),
            total_quantity: Some(100),
            min_join_quantity: Some(5),
            pickup_point: Some("Market Yard".to_string()),
        };

        let group = service.create(&vendor, input).await.unwrap();
        assert_eq!(group.joined_quantity, 0);
        assert_eq!(group.status, GroupStatus::Open);
    }
}
