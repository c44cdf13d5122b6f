//! Compliance period arithmetic.
//!
//! Everything here is pure: identical inputs always give identical outputs,
//! and no function reads the clock. Callers pass "today" explicitly.

pub mod calculator;
pub mod frequency;
pub mod label;

pub use calculator::{
    end_of_day, next_period, next_period_for, period_containing, start_of_day, CompliancePeriod,
};
pub use frequency::{DurationQualifier, Frequency};
pub use label::{period_label, period_label_for};
