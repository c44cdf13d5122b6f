//! # Compliance Engine
//!
//! Facade wiring the scheduler, the approval workflow and the lifecycle
//! state machine to one store, clock, event publisher and configuration.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use compliance_core::config::EngineConfig;
//! use compliance_core::orchestration::ComplianceEngine;
//! use compliance_core::store::InMemoryTaskStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::from_env()?;
//! let interval = config.generation_interval();
//! let engine = Arc::new(ComplianceEngine::new(Arc::new(InMemoryTaskStore::new()), config));
//!
//! let handle = engine.spawn_periodic_generation(interval);
//! // ... later
//! handle.abort();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use super::approval_workflow::{ApprovalOutcome, ApprovalWorkflow};
use super::recurrence_scheduler::{BatchReport, GenerationReport, RecurrenceScheduler};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::ComplianceResult;
use crate::events::{EventPublisher, PublishedEvent};
use crate::models::{Task, TaskId, TenantId};
use crate::state_machine::TaskLifecycle;
use crate::store::TaskStore;

pub struct ComplianceEngine {
    store: Arc<dyn TaskStore>,
    config: EngineConfig,
    publisher: EventPublisher,
    scheduler: RecurrenceScheduler,
    approvals: ApprovalWorkflow,
    lifecycle: TaskLifecycle,
}

impl std::fmt::Debug for ComplianceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ComplianceEngine {
    pub fn new(store: Arc<dyn TaskStore>, config: EngineConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    pub fn with_clock(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let publisher = EventPublisher::new(config.event_channel_capacity);
        Self {
            scheduler: RecurrenceScheduler::new(
                store.clone(),
                clock.clone(),
                publisher.clone(),
                config.clone(),
            ),
            approvals: ApprovalWorkflow::new(store.clone(), publisher.clone()),
            lifecycle: TaskLifecycle::new(store.clone(), clock, publisher.clone()),
            store,
            config,
            publisher,
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Receive every domain event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.publisher.subscribe()
    }

    pub fn scheduler(&self) -> &RecurrenceScheduler {
        &self.scheduler
    }

    pub fn approvals(&self) -> &ApprovalWorkflow {
        &self.approvals
    }

    pub fn lifecycle(&self) -> &TaskLifecycle {
        &self.lifecycle
    }

    pub async fn generate_for_tenant(
        &self,
        tenant_id: TenantId,
        lead_days_override: Option<i64>,
    ) -> ComplianceResult<GenerationReport> {
        self.scheduler
            .generate_for_tenant(tenant_id, lead_days_override)
            .await
    }

    pub async fn generate_for_all_tenants(&self) -> ComplianceResult<BatchReport> {
        self.scheduler.generate_for_all_tenants().await
    }

    pub async fn approve_task(
        &self,
        task_id: TaskId,
        tenant_id: TenantId,
    ) -> ComplianceResult<ApprovalOutcome> {
        self.approvals.approve_task(task_id, tenant_id).await
    }

    pub async fn activate_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<Task> {
        self.lifecycle.activate_task(task_id, tenant_id).await
    }

    pub async fn cancel_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<Task> {
        self.lifecycle.cancel_task(task_id, tenant_id).await
    }

    pub async fn resume_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<Task> {
        self.lifecycle.resume_task(task_id, tenant_id).await
    }

    pub async fn reject_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<()> {
        self.lifecycle.reject_task(task_id, tenant_id).await
    }

    pub async fn delete_task(&self, task_id: TaskId, tenant_id: TenantId) -> ComplianceResult<()> {
        self.lifecycle.delete_task(task_id, tenant_id).await
    }

    /// Run [`generate_for_all_tenants`](Self::generate_for_all_tenants) on a
    /// fixed interval in a background task.
    ///
    /// The first run starts immediately. A failed run is logged and the loop
    /// keeps going; abort the returned handle to stop it. A zero `every`
    /// falls back to the configured interval.
    pub fn spawn_periodic_generation(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let every = if every.is_zero() {
            engine.config.generation_interval()
        } else {
            every
        };

        tokio::spawn(async move {
            let mut timer = interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_ms = every.as_millis() as u64, "Starting periodic recurring task generation");

            loop {
                timer.tick().await;

                match engine.generate_for_all_tenants().await {
                    Ok(report) => info!(
                        tenants = report.tenants.len(),
                        created = report.total_created(),
                        failed = report.total_failed(),
                        "Periodic generation run completed"
                    ),
                    Err(e) => {
                        // Don't stop the loop on error - just log and continue
                        error!(error = %e, "Periodic generation run failed");
                    }
                }
            }
        })
    }
}
