//! # Approval Workflow
//!
//! Converts one auto-generated instance into the durable regular task for its
//! compliance period and hands recurrence ownership to that task.
//!
//! ## Steps
//!
//! 1. Load the instance; it must be auto-generated and carry an assignee, a
//!    due date and a status.
//! 2. Claim it with a single conditional update (`needs_approval: true ->
//!    false`).
//! 3. If a regular task was already approved from it, stop: the call is an
//!    idempotent success.
//! 4. Decide whether the instance covers the latest period among its
//!    siblings.
//! 5. Recompute the authoritative period from the instance's own start date.
//! 6. Insert the regular task through the store's conditional insert, so
//!    racing callers cannot create two.
//! 7. When the instance is the latest, clear `is_recurring` on its template.
//!
//! An instance whose claim already happened but that has no regular task
//! (a previous approval failed after claiming) is approved again rather than
//! rejected.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::events;
use crate::error::{ComplianceError, ComplianceResult};
use crate::events::EventPublisher;
use crate::logging::log_task_operation;
use crate::models::{NewTask, Task, TaskId, TaskLineage, TaskPatch, TenantId};
use crate::period::{end_of_day, period_containing, period_label, DurationQualifier};
use crate::store::{TaskQuery, TaskStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved {
        task: Box<Task>,
        is_latest_period: bool,
        recurrence_transferred: bool,
    },
    /// A regular task already exists for this instance.
    AlreadyProcessed {
        task_id: TaskId,
        approved_task_id: Option<TaskId>,
    },
}

impl ApprovalOutcome {
    /// Both outcomes count as a successful approval for the caller.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Approved { .. } | Self::AlreadyProcessed { .. })
    }

    /// The regular task created by this call, if it created one.
    pub fn approved_task(&self) -> Option<&Task> {
        match self {
            Self::Approved { task, .. } => Some(task),
            Self::AlreadyProcessed { .. } => None,
        }
    }
}

/// Context of the `compliance.task_approved` event.
#[derive(Debug, Serialize)]
struct ApprovalEvent<'a> {
    task_id: TaskId,
    approved_task_id: TaskId,
    compliance_period: Option<&'a str>,
    is_latest_period: bool,
    recurrence_transferred: bool,
}

pub struct ApprovalWorkflow {
    store: Arc<dyn TaskStore>,
    publisher: EventPublisher,
}

impl ApprovalWorkflow {
    pub fn new(store: Arc<dyn TaskStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    pub async fn approve_task(
        &self,
        task_id: TaskId,
        tenant_id: TenantId,
    ) -> ComplianceResult<ApprovalOutcome> {
        let task = self
            .store
            .get_task(task_id, tenant_id)
            .await?
            .ok_or(ComplianceError::NotFound { task_id, tenant_id })?;

        if !task.is_auto_generated {
            return Err(ComplianceError::not_eligible(task_id, "task is not auto-generated"));
        }
        validate_required_fields(&task)?;

        if task.needs_approval {
            let claimed = self.store.claim_approval(task_id, tenant_id).await?;
            if !claimed {
                debug!(task_id, "Approval already claimed by a concurrent call");
            }
        } else {
            debug!(task_id, "Instance already claimed, checking for an approved task");
        }

        let lineage =
            TaskLineage::from_tasks(self.store.get_tasks(&TaskQuery::for_tenant(tenant_id)).await?);

        if let Some(existing) = lineage.approved_child(task_id) {
            info!(task_id, approved_task_id = existing.id, "Instance already approved");
            if existing.is_recurring {
                self.transfer_recurrence(&task, &lineage).await?;
            }
            return Ok(ApprovalOutcome::AlreadyProcessed {
                task_id,
                approved_task_id: Some(existing.id),
            });
        }

        let is_one_time = task.is_one_time();
        let is_latest_period = if !is_one_time && task.parent_task_id.is_some() {
            lineage.is_latest_period(task_id)
        } else {
            true
        };

        let mut approved = authoritative_copy(&task);
        approved.is_recurring = is_latest_period && !is_one_time;

        let Some(created) = self.store.create_approved_task(approved).await? else {
            info!(task_id, "Concurrent approval created the regular task first");
            return Ok(ApprovalOutcome::AlreadyProcessed {
                task_id,
                approved_task_id: None,
            });
        };

        let recurrence_transferred = if is_latest_period {
            self.transfer_recurrence(&task, &lineage).await?
        } else {
            false
        };

        info!(
            task_id,
            tenant_id,
            approved_task_id = created.id,
            is_latest_period,
            recurrence_transferred,
            period = ?created.compliance_period,
            "Instance approved"
        );
        log_task_operation(
            "approve",
            tenant_id,
            Some(created.id),
            created.compliance_period.as_deref(),
            "approved",
            None,
        );
        let event = ApprovalEvent {
            task_id,
            approved_task_id: created.id,
            compliance_period: created.compliance_period.as_deref(),
            is_latest_period,
            recurrence_transferred,
        };
        if let Err(e) = self
            .publisher
            .publish_serialized(events::TASK_APPROVED, tenant_id, &event)
            .await
        {
            warn!(task_id, error = %e, "Failed to publish approval event");
        }

        Ok(ApprovalOutcome::Approved {
            task: Box::new(created),
            is_latest_period,
            recurrence_transferred,
        })
    }

    /// Clear `is_recurring` on the template `instance` came from.
    ///
    /// Returns whether the template was flipped by this call.
    async fn transfer_recurrence(
        &self,
        instance: &Task,
        lineage: &TaskLineage,
    ) -> ComplianceResult<bool> {
        let Some(template_id) = instance.parent_task_id else {
            return Ok(false);
        };
        if lineage.get(template_id).is_some_and(|t| !t.is_recurring) {
            return Ok(false);
        }

        let updated = self
            .store
            .update_task(template_id, instance.tenant_id, &TaskPatch::new().recurring(false))
            .await?;
        if updated.is_none() {
            warn!(template_id, task_id = instance.id, "Template not found for recurrence transfer");
            return Ok(false);
        }

        if let Err(e) = self
            .publisher
            .publish(
                events::RECURRENCE_TRANSFERRED,
                instance.tenant_id,
                json!({ "template_id": template_id, "task_id": instance.id }),
            )
            .await
        {
            warn!(template_id, error = %e, "Failed to publish recurrence transfer event");
        }
        Ok(true)
    }
}

fn validate_required_fields(task: &Task) -> ComplianceResult<()> {
    let missing = if task.assignee_id.is_none() {
        Some("assignee_id")
    } else if task.due_date.is_none() {
        Some("due_date")
    } else if task.status_id.is_none() {
        Some("status_id")
    } else {
        None
    };
    match missing {
        Some(field) => Err(ComplianceError::MissingField {
            task_id: task.id,
            field,
        }),
        None => Ok(()),
    }
}

/// The regular task for `instance`, with its period recomputed from the
/// instance's own start date and frequency.
fn authoritative_copy(instance: &Task) -> NewTask {
    let new = NewTask::derived_from(instance);
    let recomputed = instance.frequency().zip(instance.compliance_start_date).and_then(
        |(frequency, start)| {
            let qualifier = DurationQualifier::parse(instance.compliance_duration.as_deref());
            period_containing(frequency, qualifier, start.date())
                .map(|period| (period, period_label(&period, frequency)))
        },
    );

    match recomputed {
        Some((period, label)) => new.with_period(&period, label),
        None => NewTask {
            compliance_end_date: instance.compliance_end_date.map(|end| end_of_day(end.date())),
            ..new
        },
    }
}
