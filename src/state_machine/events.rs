use serde::{Deserialize, Serialize};

use crate::constants::events;

/// Events that can trigger lifecycle transitions on a generated task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Activate,
    Cancel,
    Resume,
    /// Decline a pending instance; the task is removed
    Reject,
    Delete,
}

impl LifecycleEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Cancel => "cancel",
            Self::Resume => "resume",
            Self::Reject => "reject",
            Self::Delete => "delete",
        }
    }

    /// Name of the domain event published after the transition.
    pub fn published_event(&self) -> &'static str {
        match self {
            Self::Activate => events::TASK_ACTIVATED,
            Self::Cancel => events::TASK_CANCELED,
            Self::Resume => events::TASK_RESUMED,
            Self::Reject => events::TASK_REJECTED,
            Self::Delete => events::TASK_DELETED,
        }
    }

    /// Reject and delete hard-delete the task.
    pub fn is_removal(&self) -> bool {
        matches!(self, Self::Reject | Self::Delete)
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_type())
    }
}
