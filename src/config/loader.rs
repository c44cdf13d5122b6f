//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`EngineConfig::default`]).
//! 2. A TOML file, when present.
//! 3. `COMPLIANCE__<FIELD>` environment variables, e.g.
//!    `COMPLIANCE__DEFAULT_LEAD_DAYS=21`.

use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::EngineConfig;
use crate::error::{ComplianceError, ComplianceResult};

/// File consulted when no explicit path is given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "config/compliance.toml";

const ENV_PREFIX: &str = "COMPLIANCE";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    with_env: bool,
}

impl ConfigLoader {
    /// Loader reading [`DEFAULT_CONFIG_FILE`] (optional) and the environment.
    pub fn new() -> Self {
        Self {
            path: None,
            with_env: true,
        }
    }

    /// Read `path`, which must exist, instead of the default file.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skip environment overrides. Tests use this to stay hermetic.
    pub fn without_env(mut self) -> Self {
        self.with_env = false;
        self
    }

    pub fn load(&self) -> ComplianceResult<EngineConfig> {
        let mut builder = Config::builder();

        builder = match &self.path {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        if self.with_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        }

        let config: EngineConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ComplianceError::Configuration(format!("Failed to load configuration: {e}")))?;

        config.validate()?;

        debug!(
            path = ?self.path,
            default_lead_days = config.default_lead_days,
            generation_interval_secs = config.generation_interval_secs,
            "Engine configuration loaded"
        );

        Ok(config)
    }
}
