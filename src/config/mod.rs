//! # Engine Configuration
//!
//! Process-wide settings for the compliance engine. Tenant-specific values
//! (lead days, auto-approval) live in tenant settings and are read through the
//! store on every run; the keys used for those lookups are configured here.
//!
//! ## Sources
//!
//! - [`EngineConfig::default`]: built-in business defaults.
//! - [`EngineConfig::from_env`]: defaults overridden by `COMPLIANCE_*`
//!   variables.
//! - [`ConfigLoader`]: an optional TOML file layered under `COMPLIANCE__*`
//!   variables, via the `config` crate.
//!
//! ```rust
//! use compliance_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.default_lead_days, 14);
//! assert!(config.validate().is_ok());
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    settings, DEFAULT_LEAD_DAYS, DUE_DATE_OFFSET_DAYS, MAX_DUE_DATE_OFFSET_DAYS, MAX_LEAD_DAYS,
};
use crate::error::{ComplianceError, ComplianceResult};

pub use loader::ConfigLoader;

/// Broadcast channel size for domain events.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Seconds between batch generation runs.
pub const DEFAULT_GENERATION_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lead time used when a tenant has no (or an unparseable) setting.
    pub default_lead_days: i64,
    /// Generated tasks are due this many days before their period ends.
    pub due_date_offset_days: i64,
    pub lead_days_setting_key: String,
    pub auto_approve_setting_key: String,
    pub generation_interval_secs: u64,
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_lead_days: DEFAULT_LEAD_DAYS,
            due_date_offset_days: DUE_DATE_OFFSET_DAYS,
            lead_days_setting_key: settings::LEAD_DAYS.to_string(),
            auto_approve_setting_key: settings::AUTO_APPROVE.to_string(),
            generation_interval_secs: DEFAULT_GENERATION_INTERVAL_SECS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `COMPLIANCE_*` environment variables.
    pub fn from_env() -> ComplianceResult<Self> {
        let mut config = Self::default();

        if let Ok(days) = std::env::var("COMPLIANCE_DEFAULT_LEAD_DAYS") {
            config.default_lead_days = days.parse().map_err(|e| {
                ComplianceError::Configuration(format!("Invalid default_lead_days: {e}"))
            })?;
        }

        if let Ok(days) = std::env::var("COMPLIANCE_DUE_DATE_OFFSET_DAYS") {
            config.due_date_offset_days = days.parse().map_err(|e| {
                ComplianceError::Configuration(format!("Invalid due_date_offset_days: {e}"))
            })?;
        }

        if let Ok(key) = std::env::var("COMPLIANCE_LEAD_DAYS_SETTING_KEY") {
            config.lead_days_setting_key = key;
        }

        if let Ok(key) = std::env::var("COMPLIANCE_AUTO_APPROVE_SETTING_KEY") {
            config.auto_approve_setting_key = key;
        }

        if let Ok(secs) = std::env::var("COMPLIANCE_GENERATION_INTERVAL_SECS") {
            config.generation_interval_secs = secs.parse().map_err(|e| {
                ComplianceError::Configuration(format!("Invalid generation_interval_secs: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("COMPLIANCE_EVENT_CHANNEL_CAPACITY") {
            config.event_channel_capacity = capacity.parse().map_err(|e| {
                ComplianceError::Configuration(format!("Invalid event_channel_capacity: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ComplianceResult<()> {
        if !(0..=MAX_LEAD_DAYS).contains(&self.default_lead_days) {
            return Err(ComplianceError::Configuration(format!(
                "default_lead_days must be between 0 and {MAX_LEAD_DAYS}, got {}",
                self.default_lead_days
            )));
        }

        if !(0..=MAX_DUE_DATE_OFFSET_DAYS).contains(&self.due_date_offset_days) {
            return Err(ComplianceError::Configuration(format!(
                "due_date_offset_days must be between 0 and {MAX_DUE_DATE_OFFSET_DAYS}, got {}",
                self.due_date_offset_days
            )));
        }

        if self.lead_days_setting_key.trim().is_empty() {
            return Err(ComplianceError::Configuration(
                "lead_days_setting_key must not be empty".to_string(),
            ));
        }

        if self.auto_approve_setting_key.trim().is_empty() {
            return Err(ComplianceError::Configuration(
                "auto_approve_setting_key must not be empty".to_string(),
            ));
        }

        if self.generation_interval_secs == 0 {
            return Err(ComplianceError::Configuration(
                "generation_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(ComplianceError::Configuration(
                "event_channel_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn generation_interval(&self) -> Duration {
        Duration::from_secs(self.generation_interval_secs)
    }
}
