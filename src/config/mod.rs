//! # Recorder Workflow Configuration
//!
//! Layered configuration for the workflow library and its operator binary.
//!
//! ## Sources
//!
//! Loaded in order, later sources overriding earlier ones:
//!
//! 1. Built-in defaults (`RecorderConfig::default()`)
//! 2. `config/recorder.yaml`
//! 3. `config/recorder.<environment>.yaml`
//! 4. `RECORDER__SECTION__KEY` environment variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use recorder_workflow::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let max_batch = manager.config().workflow.max_batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure mirroring `config/recorder.yaml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Workflow use-case limits
    pub workflow: WorkflowSettings,

    /// Logging output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/recorder_workflow_development".to_string(),
            max_connections: 10,
            connect_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Open a connection pool with the configured limits
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout())
            .connect(&self.url)
            .await
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Largest selection accepted by batch queries and commands
    pub max_batch_size: usize,
    /// Check the task chain of every loaded transaction
    pub validate_history_on_load: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_batch_size: 200,
            validate_history_on_load: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Overrides the environment default level when set
    pub level: Option<String>,
    /// Emit JSON records instead of human readable lines
    pub json: bool,
}

impl RecorderConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "database.url",
                &self.database.url,
                "database url must not be empty",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                self.database.max_connections,
                "pool needs at least one connection",
            ));
        }

        if self.workflow.max_batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "workflow.max_batch_size",
                self.workflow.max_batch_size,
                "batch size must be positive",
            ));
        }

        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "logging.level",
                    level,
                    format!("expected one of {LOG_LEVELS:?}"),
                ));
            }
        }

        Ok(())
    }

    /// Configuration with the database password masked, for logging
    pub fn sanitized(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(url) = value.pointer_mut("/database/url") {
            *url = serde_json::Value::String(mask_password(&self.database.url));
        }
        value
    }
}

fn mask_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
