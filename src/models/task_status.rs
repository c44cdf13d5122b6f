//! Tenant-scoped task status rows.
//!
//! Statuses are display data owned by each tenant. The engine needs three of
//! them: the initial status for generated instances, the in-progress status
//! for activation and resumption, and the canceled status. Rows may carry an
//! explicit [`StatusRole`]; rows created before roles existed are matched with
//! the legacy name/rank convention.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRole {
    Initial,
    InProgress,
    Canceled,
}

impl fmt::Display for StatusRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for StatusRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "in_progress" => Ok(Self::InProgress),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Invalid status role: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusRecord {
    pub id: i64,
    pub tenant_id: TenantId,
    pub name: String,
    /// 1 = initial ("New").
    pub rank: i32,
    pub role: Option<StatusRole>,
}

impl TaskStatusRecord {
    /// Whether this row fills `role`, either explicitly or by legacy convention.
    pub fn fills(&self, role: StatusRole) -> bool {
        if let Some(explicit) = self.role {
            return explicit == role;
        }
        let name = self.name.to_lowercase();
        match role {
            StatusRole::Initial => self.rank == 1,
            StatusRole::InProgress => name.contains("progress") || self.rank == 2,
            StatusRole::Canceled => name.contains("cancel") || name.contains("archived"),
        }
    }
}

/// Pick the status for `role` from a tenant's rank-ordered status list.
///
/// Explicitly tagged rows win over convention matches.
pub fn resolve_status(statuses: &[TaskStatusRecord], role: StatusRole) -> Option<&TaskStatusRecord> {
    statuses
        .iter()
        .find(|s| s.role == Some(role))
        .or_else(|| {
            statuses
                .iter()
                .filter(|s| s.role.is_none())
                .find(|s| s.fills(role))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: i64, name: &str, rank: i32, role: Option<StatusRole>) -> TaskStatusRecord {
        TaskStatusRecord {
            id,
            tenant_id: 1,
            name: name.to_string(),
            rank,
            role,
        }
    }

    #[test]
    fn test_legacy_convention() {
        let statuses = vec![
            status(1, "New", 1, None),
            status(2, "Working", 2, None),
            status(3, "Archived", 5, None),
        ];
        assert_eq!(resolve_status(&statuses, StatusRole::Initial).unwrap().id, 1);
        assert_eq!(resolve_status(&statuses, StatusRole::InProgress).unwrap().id, 2);
        assert_eq!(resolve_status(&statuses, StatusRole::Canceled).unwrap().id, 3);
    }

    #[test]
    fn test_explicit_role_wins() {
        let statuses = vec![
            status(1, "New", 1, None),
            status(2, "In Progress", 2, None),
            status(7, "Doing", 3, Some(StatusRole::InProgress)),
        ];
        assert_eq!(resolve_status(&statuses, StatusRole::InProgress).unwrap().id, 7);
        assert!(resolve_status(&statuses, StatusRole::Canceled).is_none());
    }

    #[test]
    fn test_role_string_conversion() {
        assert_eq!(StatusRole::InProgress.to_string(), "in_progress");
        assert_eq!("canceled".parse::<StatusRole>().unwrap(), StatusRole::Canceled);
        assert!("done".parse::<StatusRole>().is_err());
    }
}
