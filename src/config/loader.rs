//! Configuration Loader
//!
//! Environment-aware loading: YAML base file, per-environment overlay and
//! environment variable overrides, merged by the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::RecorderConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_FILE: &str = "recorder.yaml";
const ENV_PREFIX: &str = "RECORDER";

pub struct ConfigManager {
    config: RecorderConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful in tests that must not touch global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        if !config_directory.is_dir() {
            return Err(ConfigurationError::DirectoryNotFound {
                path: config_directory,
            });
        }

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = environment,
            config = %config.sanitized(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn load_and_merge_config(directory: &Path, environment: &str) -> ConfigResult<RecorderConfig> {
        let defaults = Config::try_from(&RecorderConfig::default())
            .map_err(|e| ConfigurationError::load_failed(environment, e))?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(directory.join(BASE_FILE)).required(false))
            .add_source(File::from(Self::environment_file(directory, environment)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|merged| merged.try_deserialize::<RecorderConfig>())
            .map_err(|e| ConfigurationError::load_failed(environment, e))
    }

    fn environment_file(directory: &Path, environment: &str) -> PathBuf {
        directory.join(format!("recorder.{environment}.yaml"))
    }

    /// Current environment from `RECORDER_ENV`, then `APP_ENV`, else development
    pub fn detect_environment() -> String {
        env::var("RECORDER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("RECORDER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
