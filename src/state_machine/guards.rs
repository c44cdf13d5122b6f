use crate::error::{ComplianceError, ComplianceResult};
use crate::models::Task;

use super::events::LifecycleEvent;

/// Precondition on the task itself, checked before a transition is applied.
pub trait LifecycleGuard {
    fn check(&self, task: &Task) -> ComplianceResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Lifecycle operations only apply to scheduler-generated tasks.
pub struct AutoGeneratedGuard;

impl LifecycleGuard for AutoGeneratedGuard {
    fn check(&self, task: &Task) -> ComplianceResult<()> {
        if task.is_auto_generated {
            Ok(())
        } else {
            Err(ComplianceError::not_eligible(
                task.id,
                "task is not auto-generated",
            ))
        }
    }

    fn description(&self) -> &'static str {
        "Task must be auto-generated"
    }
}

/// Reject and delete only remove instances nobody has approved yet.
pub struct AwaitingApprovalGuard;

impl LifecycleGuard for AwaitingApprovalGuard {
    fn check(&self, task: &Task) -> ComplianceResult<()> {
        if task.needs_approval {
            Ok(())
        } else {
            Err(ComplianceError::not_eligible(
                task.id,
                "task has already been approved",
            ))
        }
    }

    fn description(&self) -> &'static str {
        "Task must still need approval"
    }
}

/// Guards that apply to `event`, in check order.
pub fn guards_for(event: LifecycleEvent) -> Vec<Box<dyn LifecycleGuard + Send + Sync>> {
    let mut guards: Vec<Box<dyn LifecycleGuard + Send + Sync>> = vec![Box::new(AutoGeneratedGuard)];
    if event.is_removal() {
        guards.push(Box::new(AwaitingApprovalGuard));
    }
    guards
}
