//! # System Constants
//!
//! Business-rule constants, tenant setting keys and event names shared by the
//! scheduler, the approval workflow and the lifecycle state machine.

/// Day of month after which monthly templates target the following month and
/// bypass lead-time gating.
pub const MONTHLY_CUTOFF_DAY: u32 = 15;

/// Lead time used when a tenant has no lead-days setting.
pub const DEFAULT_LEAD_DAYS: i64 = 14;

/// Upper bound for any lead time. Larger tenant settings fall back to the default.
pub const MAX_LEAD_DAYS: i64 = 3660;

/// A generated task is due this many days before its period ends.
pub const DUE_DATE_OFFSET_DAYS: i64 = 5;

/// Upper bound for the due-date offset; no period is longer than five years.
pub const MAX_DUE_DATE_OFFSET_DAYS: i64 = 1830;

/// Rank of the initial ("New") status in legacy status tables.
pub const INITIAL_STATUS_RANK: i32 = 1;

/// Tenant setting keys read by the engine.
pub mod settings {
    /// Integer days before the due date that generation may start.
    pub const LEAD_DAYS: &str = "recurring_task_lead_days";
    /// `"true"` skips the approval step for generated instances.
    pub const AUTO_APPROVE: &str = "auto_approve_recurring_tasks";
}

/// Domain events published by the engine.
pub mod events {
    pub const INSTANCE_GENERATED: &str = "compliance.instance_generated";
    pub const TASK_APPROVED: &str = "compliance.task_approved";
    pub const RECURRENCE_TRANSFERRED: &str = "compliance.recurrence_transferred";
    pub const TASK_ACTIVATED: &str = "compliance.task_activated";
    pub const TASK_CANCELED: &str = "compliance.task_canceled";
    pub const TASK_RESUMED: &str = "compliance.task_resumed";
    pub const TASK_REJECTED: &str = "compliance.task_rejected";
    pub const TASK_DELETED: &str = "compliance.task_deleted";
}

/// Parse a boolean tenant setting stored as text.
pub fn setting_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
