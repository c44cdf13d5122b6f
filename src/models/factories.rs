//! # Task Factories
//!
//! Builders for templates, instances and regular tasks with sensible
//! defaults, so tests and seed scripts only spell out the fields they care
//! about.
//!
//! ```
//! use compliance_core::models::factories::TaskFactory;
//!
//! let template = TaskFactory::template(1).frequency("quarterly").client(42).build();
//! assert!(template.is_recurring);
//! assert_eq!(template.client_id, Some(42));
//! ```

use chrono::{NaiveDate, NaiveDateTime};

use super::{NewTask, Task, TaskId, TenantId};
use crate::error::StoreResult;
use crate::period::{period_label_for, CompliancePeriod};
use crate::store::TaskStore;

#[derive(Debug, Clone)]
pub struct TaskFactory {
    task: NewTask,
}

impl TaskFactory {
    fn base(tenant_id: TenantId) -> NewTask {
        NewTask {
            tenant_id,
            title: "Monthly VAT return".to_string(),
            description: None,
            client_id: Some(100),
            entity_id: None,
            is_admin: false,
            task_category_id: Some(10),
            service_type_id: Some(20),
            assignee_id: Some(7),
            status_id: Some(1),
            due_date: None,
            parent_task_id: None,
            compliance_frequency: Some("monthly".to_string()),
            compliance_duration: None,
            compliance_start_date: None,
            compliance_end_date: None,
            compliance_period: None,
            compliance_year: None,
            is_recurring: false,
            is_auto_generated: false,
            needs_approval: false,
            is_billable: true,
            budgeted_hours: Some(1.5),
            billing_rate: Some(120.0),
            fixed_fee: None,
            custom_fields: None,
        }
    }

    /// A recurring template with no period of its own.
    pub fn template(tenant_id: TenantId) -> Self {
        let mut task = Self::base(tenant_id);
        task.is_recurring = true;
        Self { task }
    }

    /// A pending instance of `template_id` covering May 2025.
    pub fn instance(tenant_id: TenantId, template_id: TaskId) -> Self {
        let mut task = Self::base(tenant_id);
        task.is_auto_generated = true;
        task.needs_approval = true;
        task.parent_task_id = Some(template_id);
        Self { task }.month(2025, 5)
    }

    pub fn regular(tenant_id: TenantId) -> Self {
        Self {
            task: Self::base(tenant_id),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn frequency(mut self, frequency: &str) -> Self {
        self.task.compliance_frequency = Some(frequency.to_string());
        self
    }

    pub fn duration(mut self, duration: &str) -> Self {
        self.task.compliance_duration = Some(duration.to_string());
        self
    }

    /// Set the period, its label and a due date five days before the end.
    pub fn period(mut self, period: CompliancePeriod) -> Self {
        let label = self
            .task
            .compliance_frequency
            .as_deref()
            .map(|f| period_label_for(&period, f));
        self.task.compliance_start_date = Some(period.start);
        self.task.compliance_end_date = Some(period.end);
        self.task.compliance_period = label;
        self.task.compliance_year = Some(period.year());
        self.task.due_date = period.due_date(crate::constants::DUE_DATE_OFFSET_DAYS);
        self
    }

    /// Calendar-month period shorthand. Panics on an invalid month.
    pub fn month(self, year: i32, month: u32) -> Self {
        let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
        let (next_year, next_month) = crate::period::calculator::shift_month(year, month, 1);
        let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .expect("valid month");
        self.period(CompliancePeriod::from_dates(first, last))
    }

    pub fn parent(mut self, parent_task_id: TaskId) -> Self {
        self.task.parent_task_id = Some(parent_task_id);
        self
    }

    pub fn client(mut self, client_id: i64) -> Self {
        self.task.client_id = Some(client_id);
        self
    }

    pub fn entity(mut self, entity_id: i64) -> Self {
        self.task.entity_id = Some(entity_id);
        self
    }

    pub fn admin(mut self, is_admin: bool) -> Self {
        self.task.is_admin = is_admin;
        self
    }

    pub fn category(mut self, task_category_id: i64) -> Self {
        self.task.task_category_id = Some(task_category_id);
        self
    }

    pub fn service(mut self, service_type_id: i64) -> Self {
        self.task.service_type_id = Some(service_type_id);
        self
    }

    pub fn assignee(mut self, assignee_id: Option<i64>) -> Self {
        self.task.assignee_id = assignee_id;
        self
    }

    pub fn status(mut self, status_id: Option<i64>) -> Self {
        self.task.status_id = status_id;
        self
    }

    pub fn due(mut self, due_date: Option<NaiveDateTime>) -> Self {
        self.task.due_date = due_date;
        self
    }

    pub fn needs_approval(mut self, needs_approval: bool) -> Self {
        self.task.needs_approval = needs_approval;
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.task.is_recurring = is_recurring;
        self
    }

    pub fn build(self) -> NewTask {
        self.task
    }

    /// Materialize with `id` without a store, stamped at the period start.
    pub fn persisted(self, id: TaskId) -> Task {
        let stamp = self.task.compliance_start_date.unwrap_or_default();
        self.task.into_task(id, stamp)
    }

    pub async fn create(self, store: &dyn TaskStore) -> StoreResult<Task> {
        store.create_task(self.task).await
    }
}
