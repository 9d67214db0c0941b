//! Order request entity for direct vendor-to-supplier purchases.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::request_status::RequestStatus;

/// A direct purchase proposal, independent of groups.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub vendor_id: String,

    #[sea_orm(indexed)]
    pub supplier_id: String,

    /// Product name or a supplier catalog reference.
    pub product_id: String,

    pub quantity: i32,

    #[sea_orm(column_type = "Text")]
    pub notes: String,

    /// Moves from pending to accepted/declined exactly once.
    pub status: RequestStatus,

    pub created_at: DateTimeWithTimeZone,

    /// Refreshed on every mutation.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VendorId",
        to = "super::user::Column::Id"
    )]
    Vendor,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SupplierId",
        to = "super::user::Column::Id"
    )]
    Supplier,
}

impl ActiveModelBehavior for ActiveModel {}
