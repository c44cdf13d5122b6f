//! # Recurrence Scheduler
//!
//! Materializes period-bound task instances from recurring templates.
//!
//! ## Overview
//!
//! For every template (`is_recurring = true`) of a tenant the scheduler:
//!
//! 1. Resolves lead days: an explicit override wins, otherwise the tenant's
//!    lead-days setting, otherwise the configured default. Values are bounded
//!    by [`MAX_LEAD_DAYS`]; an out-of-range setting falls back to the default.
//! 2. Computes the next compliance period from the template's frequency and
//!    duration qualifier, using "now" as the reference.
//! 3. Skips the template when a matching task for that period already exists.
//! 4. Gates on lead time: generation proceeds when the override is 0, when a
//!    monthly template is past the cutoff day, or once
//!    `now >= due_date - lead_days`.
//! 5. Creates one auto-generated instance with the tenant's initial status
//!    and the tenant's auto-approval choice. The insert goes through
//!    [`TaskStore::create_instance`], so an overlapping run that already
//!    created the instance turns this one into a duplicate.
//!
//! ## Failure policy
//!
//! Errors are isolated per template: a failing template is logged and
//! counted, and the run moves on. Tenant-level failures (settings or task
//! listing) fail that tenant only; [`RecurrenceScheduler::generate_for_all_tenants`]
//! continues with the next one.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use compliance_core::clock::FixedClock;
//! use compliance_core::config::EngineConfig;
//! use compliance_core::events::EventPublisher;
//! use compliance_core::models::factories::TaskFactory;
//! use compliance_core::orchestration::RecurrenceScheduler;
//! use compliance_core::store::InMemoryTaskStore;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemoryTaskStore::new());
//! store.seed_default_statuses(1);
//! TaskFactory::template(1).create(store.as_ref()).await.unwrap();
//!
//! let now = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let scheduler = RecurrenceScheduler::new(
//!     store.clone(),
//!     Arc::new(FixedClock(now)),
//!     EventPublisher::default(),
//!     EngineConfig::default(),
//! );
//!
//! let report = scheduler.generate_for_tenant(1, Some(0)).await.unwrap();
//! assert_eq!(report.created.len(), 1);
//! # });
//! ```

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::constants::{events, setting_flag, MAX_LEAD_DAYS, MONTHLY_CUTOFF_DAY};
use crate::error::{ComplianceError, ComplianceResult};
use crate::events::EventPublisher;
use crate::logging::{log_error, log_task_operation};
use crate::models::{
    resolve_status, NewTask, StatusRole, Task, TaskId, TaskLineage, TenantId,
};
use crate::period::{next_period, period_label, CompliancePeriod, DurationQualifier, Frequency};
use crate::store::{TaskQuery, TaskStore};

/// Per-tenant summary of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub tenant_id: TenantId,
    pub lead_days: i64,
    pub templates_seen: usize,
    /// Ids of the instances created, in template order.
    pub created: Vec<TaskId>,
    pub skipped_duplicates: usize,
    /// Not yet inside the lead-time window.
    pub deferred: usize,
    /// Missing or unrecognized frequency.
    pub unsupported: usize,
    pub failed: usize,
}

/// Summary of a run over every tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub tenants: Vec<GenerationReport>,
    pub failed_tenants: Vec<TenantId>,
}

impl BatchReport {
    pub fn total_created(&self) -> usize {
        self.tenants.iter().map(|r| r.created.len()).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.tenants.iter().map(|r| r.failed).sum::<usize>() + self.failed_tenants.len()
    }
}

#[derive(Debug)]
enum TemplateOutcome {
    Created(Task),
    Duplicate,
    Deferred,
    Unsupported,
}

/// Tenant-wide inputs resolved once per run.
#[derive(Debug, Clone, Copy)]
struct RunContext {
    tenant_id: TenantId,
    lead_days: i64,
    forced: bool,
    now: NaiveDateTime,
}

pub struct RecurrenceScheduler {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    publisher: EventPublisher,
    config: EngineConfig,
}

impl RecurrenceScheduler {
    pub fn new(
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
        publisher: EventPublisher,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            publisher,
            config,
        }
    }

    /// Generate due instances for every template of one tenant.
    ///
    /// `lead_days_override` replaces the tenant setting; manual runs pass
    /// `Some(0)` to generate immediately.
    pub async fn generate_for_tenant(
        &self,
        tenant_id: TenantId,
        lead_days_override: Option<i64>,
    ) -> ComplianceResult<GenerationReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("generate_for_tenant", %run_id, tenant_id);
        self.run_tenant(tenant_id, lead_days_override)
            .instrument(span)
            .await
    }

    /// Run [`generate_for_tenant`](Self::generate_for_tenant) for every
    /// tenant the store lists. A failing tenant does not stop the batch.
    pub async fn generate_for_all_tenants(&self) -> ComplianceResult<BatchReport> {
        let tenants = self.store.list_tenants().await?;
        info!(tenant_count = tenants.len(), "Starting recurring task generation batch");

        let mut batch = BatchReport::default();
        for tenant_id in tenants {
            match self.generate_for_tenant(tenant_id, None).await {
                Ok(report) => batch.tenants.push(report),
                Err(e) => {
                    log_error(
                        "recurrence_scheduler",
                        "generate_for_tenant",
                        &e.to_string(),
                        Some(tenant_id),
                        None,
                    );
                    batch.failed_tenants.push(tenant_id);
                }
            }
        }

        info!(
            tenants = batch.tenants.len(),
            created = batch.total_created(),
            failed = batch.total_failed(),
            "Recurring task generation batch completed"
        );
        Ok(batch)
    }

    async fn run_tenant(
        &self,
        tenant_id: TenantId,
        lead_days_override: Option<i64>,
    ) -> ComplianceResult<GenerationReport> {
        let lead_days = self.resolve_lead_days(tenant_id, lead_days_override).await?;
        let ctx = RunContext {
            tenant_id,
            lead_days,
            forced: lead_days_override == Some(0),
            now: self.clock.now(),
        };

        let templates: Vec<Task> = self
            .store
            .get_tasks(&TaskQuery::for_tenant(tenant_id))
            .await?
            .into_iter()
            .filter(|t| t.is_recurring)
            .collect();

        let mut report = GenerationReport {
            tenant_id,
            lead_days,
            templates_seen: templates.len(),
            ..GenerationReport::default()
        };

        for template in &templates {
            match self.process_template(template, &ctx).await {
                Ok(TemplateOutcome::Created(task)) => report.created.push(task.id),
                Ok(TemplateOutcome::Duplicate) => report.skipped_duplicates += 1,
                Ok(TemplateOutcome::Deferred) => report.deferred += 1,
                Ok(TemplateOutcome::Unsupported) => report.unsupported += 1,
                Err(e) => {
                    report.failed += 1;
                    log_error(
                        "recurrence_scheduler",
                        "process_template",
                        &e.to_string(),
                        Some(tenant_id),
                        Some(template.id),
                    );
                }
            }
        }

        info!(
            templates = report.templates_seen,
            created = report.created.len(),
            duplicates = report.skipped_duplicates,
            deferred = report.deferred,
            failed = report.failed,
            "Tenant generation completed"
        );
        Ok(report)
    }

    async fn process_template(
        &self,
        template: &Task,
        ctx: &RunContext,
    ) -> ComplianceResult<TemplateOutcome> {
        let Some(frequency) = template.frequency() else {
            warn!(
                template_id = template.id,
                frequency = ?template.compliance_frequency,
                "Template has no recognized frequency"
            );
            return Ok(TemplateOutcome::Unsupported);
        };
        let qualifier = DurationQualifier::parse(template.compliance_duration.as_deref());

        let Some(period) = next_period(frequency, qualifier, ctx.now, ctx.now.date()) else {
            warn!(template_id = template.id, %frequency, "Could not compute next period");
            return Ok(TemplateOutcome::Unsupported);
        };

        let scoped = self.store.get_tasks(&TaskQuery::scoped_to(template)).await?;
        let lineage = TaskLineage::from_tasks(scoped);
        if is_duplicate(template, &period, &lineage) {
            debug!(
                template_id = template.id,
                period_start = %period.start,
                "Instance already exists for period"
            );
            return Ok(TemplateOutcome::Duplicate);
        }

        let due_date = period.due_date(self.config.due_date_offset_days).ok_or_else(|| {
            ComplianceError::Configuration(format!(
                "due_date_offset_days {} is out of range for period starting {}",
                self.config.due_date_offset_days, period.start
            ))
        })?;
        if !self.should_generate(frequency, due_date, ctx) {
            debug!(
                template_id = template.id,
                %due_date,
                lead_days = ctx.lead_days,
                "Outside lead-time window"
            );
            return Ok(TemplateOutcome::Deferred);
        }

        let status_id = self.initial_status(ctx.tenant_id).await?;
        let needs_approval = !self.auto_approve(ctx.tenant_id).await?;
        let label = period_label(&period, frequency);

        let mut instance = NewTask::derived_from(template).with_period(&period, label.clone());
        instance.parent_task_id = Some(template.id);
        instance.is_auto_generated = true;
        instance.is_recurring = false;
        instance.needs_approval = needs_approval;
        instance.status_id = Some(status_id);
        instance.due_date = Some(due_date);

        let Some(created) = self.store.create_instance(instance).await? else {
            debug!(
                template_id = template.id,
                period = %label,
                "Concurrent run created the instance first"
            );
            return Ok(TemplateOutcome::Duplicate);
        };

        log_task_operation(
            "generate_instance",
            ctx.tenant_id,
            Some(created.id),
            Some(&label),
            "created",
            None,
        );
        if let Err(e) = self
            .publisher
            .publish(
                events::INSTANCE_GENERATED,
                ctx.tenant_id,
                json!({
                    "task_id": created.id,
                    "template_id": template.id,
                    "compliance_period": label,
                    "needs_approval": needs_approval,
                }),
            )
            .await
        {
            warn!(task_id = created.id, error = %e, "Failed to publish generation event");
        }

        Ok(TemplateOutcome::Created(created))
    }

    fn should_generate(&self, frequency: Frequency, due_date: NaiveDateTime, ctx: &RunContext) -> bool {
        if ctx.forced {
            return true;
        }
        if frequency == Frequency::Monthly && ctx.now.day() > MONTHLY_CUTOFF_DAY {
            return true;
        }
        // Unrepresentable window start means the window is already open
        match TimeDelta::try_days(ctx.lead_days).and_then(|lead| due_date.checked_sub_signed(lead)) {
            Some(window_opens) => ctx.now >= window_opens,
            None => true,
        }
    }

    async fn resolve_lead_days(
        &self,
        tenant_id: TenantId,
        lead_days_override: Option<i64>,
    ) -> ComplianceResult<i64> {
        if let Some(days) = lead_days_override {
            return Ok(days.clamp(0, MAX_LEAD_DAYS));
        }

        let raw = self
            .store
            .get_tenant_setting(tenant_id, &self.config.lead_days_setting_key)
            .await?;
        let Some(raw) = raw else {
            return Ok(self.config.default_lead_days);
        };

        match raw.trim().parse::<i64>() {
            Ok(days) if days > MAX_LEAD_DAYS => {
                warn!(
                    tenant_id,
                    value = days,
                    max = MAX_LEAD_DAYS,
                    default = self.config.default_lead_days,
                    "Lead-days setting out of range, using default"
                );
                Ok(self.config.default_lead_days)
            }
            Ok(days) => Ok(days.max(0)),
            Err(e) => {
                warn!(
                    tenant_id,
                    value = %raw,
                    error = %e,
                    default = self.config.default_lead_days,
                    "Unparseable lead-days setting, using default"
                );
                Ok(self.config.default_lead_days)
            }
        }
    }

    async fn initial_status(&self, tenant_id: TenantId) -> ComplianceResult<i64> {
        let statuses = self.store.get_task_statuses(tenant_id).await?;
        resolve_status(&statuses, StatusRole::Initial)
            .map(|s| s.id)
            .ok_or_else(|| {
                ComplianceError::Configuration(format!("Tenant {tenant_id} has no initial status"))
            })
    }

    async fn auto_approve(&self, tenant_id: TenantId) -> ComplianceResult<bool> {
        let raw = self
            .store
            .get_tenant_setting(tenant_id, &self.config.auto_approve_setting_key)
            .await?;
        Ok(setting_flag(raw.as_deref()).unwrap_or(false))
    }
}

/// Whether `template` already has a task for `period`.
///
/// A task matches on category, service and normalized period, and must be a
/// pending instance or a currently recurring regular task. Any instance of
/// this template for the period also counts, approved or not.
fn is_duplicate(template: &Task, period: &CompliancePeriod, lineage: &TaskLineage) -> bool {
    if lineage.instance_for_period(template.id, period).is_some() {
        return true;
    }
    lineage.tasks().any(|t| {
        t.task_category_id == template.task_category_id
            && t.service_type_id == template.service_type_id
            && t.covers_period(period)
            && (t.is_pending_instance() || (!t.is_auto_generated && t.is_recurring))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::factories::TaskFactory;

    #[test]
    fn test_pending_instance_is_duplicate() {
        let template = TaskFactory::template(1).persisted(1);
        let june = TaskFactory::instance(1, 99).month(2025, 6).persisted(2);
        let period = june.compliance_window().unwrap();

        // Different template, same category/service/period, still pending
        let lineage = TaskLineage::from_tasks(vec![template.clone(), june]);
        assert!(is_duplicate(&template, &period, &lineage));
    }

    #[test]
    fn test_approved_instance_of_same_template_is_duplicate() {
        let template = TaskFactory::template(1).persisted(1);
        let june = TaskFactory::instance(1, 1)
            .month(2025, 6)
            .needs_approval(false)
            .persisted(2);
        let period = june.compliance_window().unwrap();

        let lineage = TaskLineage::from_tasks(vec![template.clone(), june]);
        assert!(is_duplicate(&template, &period, &lineage));
    }

    #[test]
    fn test_other_service_is_not_duplicate() {
        let template = TaskFactory::template(1).persisted(1);
        let june = TaskFactory::instance(1, 99)
            .month(2025, 6)
            .service(21)
            .persisted(2);
        let period = june.compliance_window().unwrap();

        let lineage = TaskLineage::from_tasks(vec![template.clone(), june]);
        assert!(!is_duplicate(&template, &period, &lineage));
    }

    #[test]
    fn test_non_recurring_regular_task_is_not_duplicate() {
        let template = TaskFactory::template(1).persisted(1);
        let approved = TaskFactory::regular(1).month(2025, 6).parent(50).persisted(2);
        let period = approved.compliance_window().unwrap();

        let lineage = TaskLineage::from_tasks(vec![template.clone(), approved.clone()]);
        assert!(!is_duplicate(&template, &period, &lineage));

        let recurring = TaskFactory::regular(1)
            .month(2025, 6)
            .parent(50)
            .recurring(true)
            .persisted(3);
        let lineage = TaskLineage::from_tasks(vec![template.clone(), recurring]);
        assert!(is_duplicate(&template, &period, &lineage));
    }
}
