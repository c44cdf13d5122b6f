//! Error types for the compliance engine.
//!

use thiserror::Error;

use crate::models::{TaskId, TenantId};

/// Errors raised by a [`TaskStore`](crate::store::TaskStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Task {task_id} not found for tenant {tenant_id}")]
    NotFound { task_id: TaskId, tenant_id: TenantId },
    #[error("Task {task_id} is not eligible: {reason}")]
    NotEligible { task_id: TaskId, reason: String },
    #[error("Task {task_id} is missing required field '{field}'")]
    MissingField { task_id: TaskId, field: &'static str },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid lifecycle transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ComplianceError {
    pub fn not_eligible(task_id: TaskId, reason: impl Into<String>) -> Self {
        ComplianceError::NotEligible {
            task_id,
            reason: reason.into(),
        }
    }

    /// Eligibility failures are caller mistakes; everything else is operational.
    pub fn is_eligibility(&self) -> bool {
        matches!(
            self,
            ComplianceError::NotFound { .. }
                | ComplianceError::NotEligible { .. }
                | ComplianceError::InvalidTransition { .. }
        )
    }
}

pub type ComplianceResult<T> = std::result::Result<T, ComplianceError>;
