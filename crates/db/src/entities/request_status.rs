//! Status shared by join requests and order requests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a join request or an order request.
///
/// `Pending` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RequestStatus {
    /// Awaiting a decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the counterpart.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Declined by the counterpart.
    #[sea_orm(string_value = "declined")]
    Declined,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl RequestStatus {
    /// Pending and accepted requests count as active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Parse a decision submitted by a supplier.
    ///
    /// Only `Accepted` and `Declined` are decisions; `Pending` is not.
    #[must_use]
    pub fn parse_decision(value: &str) -> Option<Self> {
        match value {
            "Accepted" => Some(Self::Accepted),
            "Declined" => Some(Self::Declined),
            _ => None,
        }
    }

    /// Display name used in API payloads and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Declined => "Declined",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses() {
        assert!(RequestStatus::Pending.is_active());
        assert!(RequestStatus::Accepted.is_active());
        assert!(!RequestStatus::Declined.is_active());
    }

    #[test]
    fn test_parse_decision_rejects_pending_and_unknown() {
        assert_eq!(
            RequestStatus::parse_decision("Accepted"),
            Some(RequestStatus::Accepted)
        );
        assert_eq!(
            RequestStatus::parse_decision("Declined"),
            Some(RequestStatus::Declined)
        );
        assert_eq!(RequestStatus::parse_decision("Pending"), None);
        assert_eq!(RequestStatus::parse_decision("accepted"), None);
    }

    #[test]
    fn test_serializes_with_display_names() {
        let json = serde_json::to_string(&RequestStatus::Declined).unwrap();
        assert_eq!(json, "\"Declined\"");
    }
}
