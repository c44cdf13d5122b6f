#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Compliance Core
//!
//! Recurring compliance task engine for multi-tenant practice management.
//!
//! ## Overview
//!
//! Practices track filings (VAT returns, payroll, annual accounts) as tasks
//! that repeat on a calendar. A *template* task describes the recurrence; the
//! engine materializes one *instance* per compliance period ahead of its due
//! date, and an approval turns that instance into the durable *regular* task
//! that carries the recurrence forward.
//!
//! ## Key Features
//!
//! - **Period arithmetic**: daily through multi-year and fiscal-year periods,
//!   with labels such as `May 2025`, `Q2 2025` or `FY 2025-2026`
//! - **Idempotent generation**: at most one instance per template and period,
//!   gated by per-tenant lead time
//! - **Race-free approval**: a compare-and-swap claim plus a conditional
//!   insert guarantee one regular task per instance
//! - **Lifecycle state machine**: activate, cancel, resume, reject and delete
//!   with explicit status roles
//!
//! ## Module Organization
//!
//! - [`period`] - Pure period calculation and labels
//! - [`models`] - Task, status and lineage types
//! - [`store`] - The storage port, with in-memory and PostgreSQL adapters
//! - [`orchestration`] - Scheduler, approval workflow and engine facade
//! - [`state_machine`] - Lifecycle transitions
//! - [`events`] - Domain event broadcasting
//! - [`config`] - Engine configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use compliance_core::clock::FixedClock;
//! use compliance_core::config::EngineConfig;
//! use compliance_core::models::factories::TaskFactory;
//! use compliance_core::orchestration::ComplianceEngine;
//! use compliance_core::store::InMemoryTaskStore;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemoryTaskStore::new());
//! store.seed_default_statuses(1);
//! TaskFactory::template(1).create(store.as_ref()).await.unwrap();
//!
//! let now = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let engine = ComplianceEngine::with_clock(store, Arc::new(FixedClock(now)), EngineConfig::default());
//!
//! let report = engine.generate_for_tenant(1, Some(0)).await.unwrap();
//! let outcome = engine.approve_task(report.created[0], 1).await.unwrap();
//! assert_eq!(
//!     outcome.approved_task().and_then(|t| t.compliance_period.as_deref()),
//!     Some("June 2025")
//! );
//! # });
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod period;
pub mod state_machine;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigLoader, EngineConfig};
pub use error::{ComplianceError, ComplianceResult, StoreError, StoreResult};
pub use events::{EventPublisher, PublishedEvent};
pub use models::{NewTask, StatusRole, Task, TaskId, TaskPatch, TaskRole, TaskStatusRecord, TenantId};
pub use orchestration::{
    ApprovalOutcome, ApprovalWorkflow, BatchReport, ComplianceEngine, GenerationReport,
    RecurrenceScheduler,
};
pub use period::{next_period, period_label, CompliancePeriod, DurationQualifier, Frequency};
pub use state_machine::{LifecycleEvent, LifecycleState, TaskLifecycle};
pub use store::{InMemoryTaskStore, TaskQuery, TaskStore};
#[cfg(feature = "postgres")]
pub use store::PgTaskStore;
