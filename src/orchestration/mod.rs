//! # Orchestration
//!
//! The engine's active parts: the [`RecurrenceScheduler`] that materializes
//! instances, the [`ApprovalWorkflow`] that converts them into regular tasks,
//! and the [`ComplianceEngine`] facade that also exposes the lifecycle
//! operations.

pub mod approval_workflow;
pub mod engine;
pub mod recurrence_scheduler;

pub use approval_workflow::{ApprovalOutcome, ApprovalWorkflow};
pub use engine::ComplianceEngine;
pub use recurrence_scheduler::{BatchReport, GenerationReport, RecurrenceScheduler};
