use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Task;

/// Lifecycle state of an auto-generated task, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Generated and not yet worked on
    New,
    /// Activated or resumed; status is the tenant's in-progress status
    Active,
    /// Canceled; may be resumed
    Canceled,
    /// Hard-deleted by a reject or delete
    Removed,
}

impl LifecycleState {
    pub fn of(task: &Task) -> Self {
        if task.is_canceled {
            Self::Canceled
        } else if task.activated_at.is_some() {
            Self::Active
        } else {
            Self::New
        }
    }

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Active => write!(f, "active"),
            Self::Canceled => write!(f, "canceled"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

impl std::str::FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "active" => Ok(Self::Active),
            "canceled" => Ok(Self::Canceled),
            "removed" => Ok(Self::Removed),
            _ => Err(format!("Invalid lifecycle state: {s}")),
        }
    }
}
