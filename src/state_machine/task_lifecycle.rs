//! # Task Lifecycle
//!
//! Secondary transitions on scheduler-generated tasks: activate, cancel,
//! resume, reject and delete.
//!
//! ```text
//!            activate             cancel
//!   New ──────────────▶ Active ◀──────────▶ Canceled
//!    │                          resume
//!    └─────── cancel ──────────────────────▶ Canceled
//!
//!   reject / delete (pending instances only) ──▶ Removed
//! ```
//!
//! Target status rows are looked up per tenant through
//! [`resolve_status`], which prefers an explicit [`StatusRole`] and falls back
//! to the legacy name/rank convention.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::events::LifecycleEvent;
use super::guards::guards_for;
use super::states::LifecycleState;
use crate::clock::Clock;
use crate::error::{ComplianceError, ComplianceResult};
use crate::events::EventPublisher;
use crate::logging::log_task_operation;
use crate::models::{resolve_status, StatusRole, Task, TaskId, TaskPatch, TenantId};
use crate::store::TaskStore;

/// What a transition left behind.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Updated(Task),
    Removed(TaskId),
}

impl TransitionOutcome {
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::Updated(task) => Some(task),
            Self::Removed(_) => None,
        }
    }
}

pub struct TaskLifecycle {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    publisher: EventPublisher,
}

impl TaskLifecycle {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>, publisher: EventPublisher) -> Self {
        Self {
            store,
            clock,
            publisher,
        }
    }

    /// Move a generated task to the tenant's in-progress status.
    pub async fn activate_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<Task> {
        self.transition_to_task(task_id, tenant_id, LifecycleEvent::Activate)
            .await
    }

    pub async fn cancel_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<Task> {
        self.transition_to_task(task_id, tenant_id, LifecycleEvent::Cancel)
            .await
    }

    /// Return a canceled task to the in-progress status.
    pub async fn resume_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<Task> {
        self.transition_to_task(task_id, tenant_id, LifecycleEvent::Resume)
            .await
    }

    /// Decline a pending instance. The task is deleted.
    pub async fn reject_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<()> {
        self.transition(task_id, tenant_id, LifecycleEvent::Reject)
            .await
            .map(|_| ())
    }

    pub async fn delete_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<()> {
        self.transition(task_id, tenant_id, LifecycleEvent::Delete)
            .await
            .map(|_| ())
    }

    /// Apply `event` to a task, validating the transition and guards first.
    pub async fn transition(
        &self,
        task_id: TaskId,
        tenant_id: TenantId,
        event: LifecycleEvent,
    ) -> ComplianceResult<TransitionOutcome> {
        let task = self
            .store
            .get_task(task_id, tenant_id)
            .await?
            .ok_or(ComplianceError::NotFound { task_id, tenant_id })?;

        for guard in guards_for(event) {
            if let Err(e) = guard.check(&task) {
                debug!(task_id, guard = guard.description(), "Lifecycle guard rejected transition");
                return Err(e);
            }
        }

        let current_state = LifecycleState::of(&task);
        let target_state = Self::determine_target_state(current_state, event)?;

        let outcome = if target_state == LifecycleState::Removed {
            self.remove(&task).await?
        } else {
            self.apply_status_change(&task, event).await?
        };

        info!(
            task_id,
            tenant_id,
            event = %event,
            from = %current_state,
            to = %target_state,
            "Lifecycle transition applied"
        );
        log_task_operation(
            event.event_type(),
            tenant_id,
            Some(task_id),
            task.compliance_period.as_deref(),
            "success",
            None,
        );

        let context = json!({
            "task_id": task_id,
            "from_state": current_state.to_string(),
            "to_state": target_state.to_string(),
            "compliance_period": task.compliance_period,
        });
        if let Err(e) = self
            .publisher
            .publish(event.published_event(), tenant_id, context)
            .await
        {
            warn!(task_id, error = %e, "Failed to publish lifecycle event");
        }

        Ok(outcome)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        current_state: LifecycleState,
        event: LifecycleEvent,
    ) -> ComplianceResult<LifecycleState> {
        let target = match (current_state, event) {
            (LifecycleState::New, LifecycleEvent::Activate) => LifecycleState::Active,

            (LifecycleState::New, LifecycleEvent::Cancel) => LifecycleState::Canceled,
            (LifecycleState::Active, LifecycleEvent::Cancel) => LifecycleState::Canceled,

            (LifecycleState::Canceled, LifecycleEvent::Resume) => LifecycleState::Active,

            (from, LifecycleEvent::Reject | LifecycleEvent::Delete) if !from.is_terminal() => {
                LifecycleState::Removed
            }

            (from_state, _) => {
                return Err(ComplianceError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.to_string(),
                })
            }
        };

        Ok(target)
    }

    async fn remove(&self, task: &Task) -> ComplianceResult<TransitionOutcome> {
        let deleted = self.store.delete_task(task.id, task.tenant_id).await?;
        if !deleted {
            return Err(ComplianceError::NotFound {
                task_id: task.id,
                tenant_id: task.tenant_id,
            });
        }
        Ok(TransitionOutcome::Removed(task.id))
    }

    async fn apply_status_change(
        &self,
        task: &Task,
        event: LifecycleEvent,
    ) -> ComplianceResult<TransitionOutcome> {
        let now = self.clock.now();
        let role = match event {
            LifecycleEvent::Cancel => StatusRole::Canceled,
            _ => StatusRole::InProgress,
        };
        let status_id = self.status_for(task.tenant_id, role).await?;

        let patch = match event {
            LifecycleEvent::Activate => TaskPatch::new().status(status_id).activated(Some(now)),
            LifecycleEvent::Cancel => TaskPatch::new().status(status_id).canceled(Some(now)),
            _ => {
                let patch = TaskPatch::new().status(status_id).canceled(None);
                if task.activated_at.is_none() {
                    patch.activated(Some(now))
                } else {
                    patch
                }
            }
        };

        let updated = self
            .store
            .update_task(task.id, task.tenant_id, &patch)
            .await?
            .ok_or(ComplianceError::NotFound {
                task_id: task.id,
                tenant_id: task.tenant_id,
            })?;
        Ok(TransitionOutcome::Updated(updated))
    }

    async fn status_for(&self, tenant_id: TenantId, role: StatusRole) -> ComplianceResult<i64> {
        let statuses = self.store.get_task_statuses(tenant_id).await?;
        resolve_status(&statuses, role).map(|s| s.id).ok_or_else(|| {
            ComplianceError::Configuration(format!(
                "Tenant {tenant_id} has no {role} status"
            ))
        })
    }

    async fn transition_to_task(
        &self,
        task_id: TaskId,
        tenant_id: TenantId,
        event: LifecycleEvent,
    ) -> ComplianceResult<Task> {
        match self.transition(task_id, tenant_id, event).await? {
            TransitionOutcome::Updated(task) => Ok(task),
            TransitionOutcome::Removed(_) => Err(ComplianceError::InvalidTransition {
                from: LifecycleState::Removed.to_string(),
                event: event.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert_eq!(
            TaskLifecycle::determine_target_state(LifecycleState::New, LifecycleEvent::Activate)
                .unwrap(),
            LifecycleState::Active
        );
        assert_eq!(
            TaskLifecycle::determine_target_state(LifecycleState::Active, LifecycleEvent::Cancel)
                .unwrap(),
            LifecycleState::Canceled
        );
        assert_eq!(
            TaskLifecycle::determine_target_state(LifecycleState::Canceled, LifecycleEvent::Resume)
                .unwrap(),
            LifecycleState::Active
        );
        assert_eq!(
            TaskLifecycle::determine_target_state(LifecycleState::Canceled, LifecycleEvent::Reject)
                .unwrap(),
            LifecycleState::Removed
        );
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot resume a task that was never canceled
        assert!(matches!(
            TaskLifecycle::determine_target_state(LifecycleState::Active, LifecycleEvent::Resume),
            Err(ComplianceError::InvalidTransition { .. })
        ));

        assert!(
            TaskLifecycle::determine_target_state(LifecycleState::Active, LifecycleEvent::Activate)
                .is_err()
        );
        assert!(
            TaskLifecycle::determine_target_state(LifecycleState::Canceled, LifecycleEvent::Cancel)
                .is_err()
        );
        assert!(
            TaskLifecycle::determine_target_state(LifecycleState::Removed, LifecycleEvent::Delete)
                .is_err()
        );
    }
}
