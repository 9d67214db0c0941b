//! Group entity for pooled purchases.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum GroupStatus {
    /// Accepting join requests.
    #[sea_orm(string_value = "open")]
    Open,
    /// No longer accepting join requests.
    #[sea_orm(string_value = "closed")]
    Closed,
    /// Purchase fulfilled.
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl Default for GroupStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// Group entity - a vendor-initiated bulk-purchase pool with a quantity ceiling.
///
/// `0 <= joined_quantity <= total_quantity` is enforced by a table CHECK
/// constraint as well as by the admission update.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Vendor who created the group.
    #[sea_orm(indexed)]
    pub creator_id: String,

    pub product: String,

    /// Unit price, strictly positive.
    pub price: f64,

    pub total_quantity: i32,

    /// Smallest quantity a single join may claim.
    pub min_join_quantity: i32,

    /// Sum of admitted join quantities. Mutated only by admission.
    #[sea_orm(default_value = 0)]
    pub joined_quantity: i32,

    pub pickup_point: String,

    pub status: GroupStatus,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Quantity still available to join.
    #[must_use]
    pub const fn remaining_quantity(&self) -> i32 {
        self.total_quantity - self.joined_quantity
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
    #[sea_orm(has_many = "super::join_request::Entity")]
    JoinRequests,
    #[sea_orm(has_many = "super::chat_message::Entity")]
    ChatMessages,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::join_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JoinRequests.def()
    }
}

impl Related<super::chat_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
