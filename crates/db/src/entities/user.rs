//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Marketplace role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Creates and joins groups, places order requests.
    #[sea_orm(string_value = "vendor")]
    Vendor,
    /// Receives and decides order requests.
    #[sea_orm(string_value = "supplier")]
    Supplier,
}

impl UserRole {
    /// Parse a role as sent by clients (`"vendor"` / `"supplier"`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vendor" => Some(Self::Vendor),
            "supplier" => Some(Self::Supplier),
            _ => None,
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Supplier => "supplier",
        }
    }
}

/// User record keyed by a client-supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// Client-generated identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Stored trimmed and lower-cased.
    pub email: String,

    #[sea_orm(indexed)]
    pub role: UserRole,

    pub location: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group::Entity")]
    Groups,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("vendor"), Some(UserRole::Vendor));
        assert_eq!(UserRole::parse("supplier"), Some(UserRole::Supplier));
        assert_eq!(UserRole::parse("Vendor"), None);
        assert_eq!(UserRole::parse("admin"), None);
    }
}
