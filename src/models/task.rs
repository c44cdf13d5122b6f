//! # Task Model
//!
//! The single entity driving the recurring compliance subsystem.
//!
//! ## Overview
//!
//! A `Task` plays one of three roles, derived from its flags and parent link:
//!
//! - **Template**: `is_recurring = true`. Source definition for future period
//!   instances. `parent_task_id` is either null or points at the instance the
//!   template was itself approved from.
//! - **Instance**: `is_auto_generated = true`, `parent_task_id` = template id.
//!   Materialized by the scheduler for exactly one compliance period.
//! - **Regular**: `is_auto_generated = false`, `parent_task_id` = the instance
//!   it was approved from. The durable, user-visible result of an approval.
//!
//! Every query and mutation is scoped by `tenant_id`.
//!
//! ## Date handling
//!
//! Dates are naive local date-times. `compliance_end_date` always carries the
//! `23:59:59.999` time component; compare periods through
//! [`Task::compliance_window`], which applies that normalization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::period::{end_of_day, CompliancePeriod, Frequency};

pub type TaskId = i64;
pub type TenantId = i64;

/// Persisted task row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Task {
    pub id: TaskId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,

    // Scope and identifying attributes used for duplicate detection
    pub client_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub is_admin: bool,
    pub task_category_id: Option<i64>,
    pub service_type_id: Option<i64>,

    // Assignment and scheduling
    pub assignee_id: Option<i64>,
    pub status_id: Option<i64>,
    pub due_date: Option<NaiveDateTime>,

    // Lineage
    pub parent_task_id: Option<TaskId>,

    // Recurrence descriptors
    pub compliance_frequency: Option<String>,
    pub compliance_duration: Option<String>,
    pub compliance_start_date: Option<NaiveDateTime>,
    pub compliance_end_date: Option<NaiveDateTime>,
    pub compliance_period: Option<String>,
    pub compliance_year: Option<i32>,

    // Workflow flags
    pub is_recurring: bool,
    pub is_auto_generated: bool,
    pub needs_approval: bool,
    pub is_canceled: bool,
    pub canceled_at: Option<NaiveDateTime>,
    pub activated_at: Option<NaiveDateTime>,

    // Financial
    pub is_billable: bool,
    pub budgeted_hours: Option<f64>,
    pub billing_rate: Option<f64>,
    pub fixed_fee: Option<f64>,

    pub custom_fields: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The role a task plays in a template -> instance -> regular chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRole {
    Template,
    Instance,
    Regular,
}

impl Task {
    pub fn role(&self) -> TaskRole {
        if self.is_auto_generated {
            TaskRole::Instance
        } else if self.is_recurring {
            TaskRole::Template
        } else {
            TaskRole::Regular
        }
    }

    /// Parsed `compliance_frequency`, `None` when absent or unrecognized.
    pub fn frequency(&self) -> Option<Frequency> {
        self.compliance_frequency
            .as_deref()
            .and_then(|raw| raw.parse().ok())
    }

    pub fn is_one_time(&self) -> bool {
        self.frequency() == Some(Frequency::OneTime)
    }

    /// The compliance period with the end normalized to `23:59:59.999`.
    pub fn compliance_window(&self) -> Option<CompliancePeriod> {
        let start = self.compliance_start_date?;
        let end = self.compliance_end_date?;
        Some(CompliancePeriod::new(start, end_of_day(end.date())))
    }

    /// True when this task covers exactly `period`.
    pub fn covers_period(&self, period: &CompliancePeriod) -> bool {
        self.compliance_window().as_ref() == Some(period)
    }

    /// An instance still waiting on a user decision.
    pub fn is_pending_instance(&self) -> bool {
        self.is_auto_generated && self.needs_approval
    }
}

/// Insertable task, without store-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub client_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub is_admin: bool,
    pub task_category_id: Option<i64>,
    pub service_type_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub status_id: Option<i64>,
    pub due_date: Option<NaiveDateTime>,
    pub parent_task_id: Option<TaskId>,
    pub compliance_frequency: Option<String>,
    pub compliance_duration: Option<String>,
    pub compliance_start_date: Option<NaiveDateTime>,
    pub compliance_end_date: Option<NaiveDateTime>,
    pub compliance_period: Option<String>,
    pub compliance_year: Option<i32>,
    pub is_recurring: bool,
    pub is_auto_generated: bool,
    pub needs_approval: bool,
    pub is_billable: bool,
    pub budgeted_hours: Option<f64>,
    pub billing_rate: Option<f64>,
    pub fixed_fee: Option<f64>,
    pub custom_fields: Option<serde_json::Value>,
}

impl NewTask {
    /// Copy identity, assignment, detail and financial fields from `source`.
    ///
    /// Lineage, recurrence and workflow fields are left for the caller.
    pub fn derived_from(source: &Task) -> Self {
        Self {
            tenant_id: source.tenant_id,
            title: source.title.clone(),
            description: source.description.clone(),
            client_id: source.client_id,
            entity_id: source.entity_id,
            is_admin: source.is_admin,
            task_category_id: source.task_category_id,
            service_type_id: source.service_type_id,
            assignee_id: source.assignee_id,
            status_id: source.status_id,
            due_date: source.due_date,
            parent_task_id: Some(source.id),
            compliance_frequency: source.compliance_frequency.clone(),
            compliance_duration: source.compliance_duration.clone(),
            compliance_start_date: source.compliance_start_date,
            compliance_end_date: source.compliance_end_date,
            compliance_period: source.compliance_period.clone(),
            compliance_year: source.compliance_year,
            is_recurring: false,
            is_auto_generated: false,
            needs_approval: false,
            is_billable: source.is_billable,
            budgeted_hours: source.budgeted_hours,
            billing_rate: source.billing_rate,
            fixed_fee: source.fixed_fee,
            custom_fields: source.custom_fields.clone(),
        }
    }

    /// Materialize as a stored row. Workflow timestamps start empty.
    pub fn into_task(self, id: TaskId, now: NaiveDateTime) -> Task {
        Task {
            id,
            tenant_id: self.tenant_id,
            title: self.title,
            description: self.description,
            client_id: self.client_id,
            entity_id: self.entity_id,
            is_admin: self.is_admin,
            task_category_id: self.task_category_id,
            service_type_id: self.service_type_id,
            assignee_id: self.assignee_id,
            status_id: self.status_id,
            due_date: self.due_date,
            parent_task_id: self.parent_task_id,
            compliance_frequency: self.compliance_frequency,
            compliance_duration: self.compliance_duration,
            compliance_start_date: self.compliance_start_date,
            compliance_end_date: self.compliance_end_date,
            compliance_period: self.compliance_period,
            compliance_year: self.compliance_year,
            is_recurring: self.is_recurring,
            is_auto_generated: self.is_auto_generated,
            needs_approval: self.needs_approval,
            is_canceled: false,
            canceled_at: None,
            activated_at: None,
            is_billable: self.is_billable,
            budgeted_hours: self.budgeted_hours,
            billing_rate: self.billing_rate,
            fixed_fee: self.fixed_fee,
            custom_fields: self.custom_fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamp a compliance period and its derived label and year.
    pub fn with_period(mut self, period: &CompliancePeriod, label: String) -> Self {
        self.compliance_start_date = Some(period.start);
        self.compliance_end_date = Some(period.end);
        self.compliance_period = Some(label);
        self.compliance_year = Some(period.year());
        self
    }
}

/// Partial update. `None` leaves a column untouched.
///
/// Nullable columns use a nested option so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub status_id: Option<i64>,
    pub is_recurring: Option<bool>,
    pub needs_approval: Option<bool>,
    pub is_canceled: Option<bool>,
    pub canceled_at: Option<Option<NaiveDateTime>>,
    pub activated_at: Option<Option<NaiveDateTime>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status_id: i64) -> Self {
        self.status_id = Some(status_id);
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = Some(is_recurring);
        self
    }

    pub fn needs_approval(mut self, needs_approval: bool) -> Self {
        self.needs_approval = Some(needs_approval);
        self
    }

    pub fn canceled(mut self, at: Option<NaiveDateTime>) -> Self {
        self.is_canceled = Some(at.is_some());
        self.canceled_at = Some(at);
        self
    }

    pub fn activated(mut self, at: Option<NaiveDateTime>) -> Self {
        self.activated_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to an in-memory row.
    pub fn apply(&self, task: &mut Task) {
        if let Some(status_id) = self.status_id {
            task.status_id = Some(status_id);
        }
        if let Some(is_recurring) = self.is_recurring {
            task.is_recurring = is_recurring;
        }
        if let Some(needs_approval) = self.needs_approval {
            task.needs_approval = needs_approval;
        }
        if let Some(is_canceled) = self.is_canceled {
            task.is_canceled = is_canceled;
        }
        if let Some(canceled_at) = self.canceled_at {
            task.canceled_at = canceled_at;
        }
        if let Some(activated_at) = self.activated_at {
            task.activated_at = activated_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn task() -> Task {
        let now = at(2025, 5, 1, 9, 0, 0);
        Task {
            id: 10,
            tenant_id: 1,
            title: "VAT return".into(),
            description: None,
            client_id: Some(5),
            entity_id: None,
            is_admin: false,
            task_category_id: Some(2),
            service_type_id: Some(3),
            assignee_id: Some(9),
            status_id: Some(1),
            due_date: None,
            parent_task_id: None,
            compliance_frequency: Some("Monthly".into()),
            compliance_duration: None,
            compliance_start_date: Some(at(2025, 6, 1, 0, 0, 0)),
            compliance_end_date: Some(at(2025, 6, 30, 0, 0, 0)),
            compliance_period: None,
            compliance_year: None,
            is_recurring: true,
            is_auto_generated: false,
            needs_approval: false,
            is_canceled: false,
            canceled_at: None,
            activated_at: None,
            is_billable: true,
            budgeted_hours: Some(2.5),
            billing_rate: None,
            fixed_fee: Some(150.0),
            custom_fields: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_derivation() {
        let mut t = task();
        assert_eq!(t.role(), TaskRole::Template);
        t.is_auto_generated = true;
        assert_eq!(t.role(), TaskRole::Instance);
        t.is_auto_generated = false;
        t.is_recurring = false;
        assert_eq!(t.role(), TaskRole::Regular);
    }

    #[test]
    fn test_compliance_window_normalizes_end() {
        let t = task();
        let window = t.compliance_window().unwrap();
        assert_eq!(window.end.to_string(), "2025-06-30 23:59:59.999");
        assert!(t.covers_period(&window));
        assert_eq!(t.frequency(), Some(Frequency::Monthly));
    }

    #[test]
    fn test_derived_from_copies_fields() {
        let t = task();
        let new = NewTask::derived_from(&t);
        assert_eq!(new.parent_task_id, Some(10));
        assert_eq!(new.client_id, Some(5));
        assert_eq!(new.fixed_fee, Some(150.0));
        assert!(!new.is_recurring);
        assert!(!new.is_auto_generated);
    }

    #[test]
    fn test_patch_apply() {
        let mut t = task();
        let when = at(2025, 5, 2, 8, 0, 0);
        TaskPatch::new().canceled(Some(when)).status(4).apply(&mut t);
        assert!(t.is_canceled);
        assert_eq!(t.canceled_at, Some(when));
        assert_eq!(t.status_id, Some(4));

        TaskPatch::new().canceled(None).apply(&mut t);
        assert!(!t.is_canceled);
        assert_eq!(t.canceled_at, None);
        assert!(TaskPatch::new().is_empty());
    }
}
