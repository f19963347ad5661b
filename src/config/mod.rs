// src/config/mod.rs
mod schema;

use std::path::{Path, PathBuf};
use config::{Config as ConfigLoader, FileFormat};
use tracing::{info, warn};

pub use schema::{Settings, WorkflowSettings, LoggingSettings};

use crate::error::{ErysaResult, ErysaError};

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Centralized configuration handling
impl Settings {
    /// Load and validate configuration: built-in defaults, then a user file,
    /// then `ERYSA_*` variables
    pub fn load(config_path: Option<&Path>) -> ErysaResult<Self> {
        let settings = Self::read(config_path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge the configuration layers without validating or logging.
    ///
    /// Used before a log subscriber exists; call [`Settings::validate`] once
    /// logging is up.
    pub fn read(config_path: Option<&Path>) -> ErysaResult<Self> {
        let mut config_builder = ConfigLoader::builder();

        // Default configuration
        config_builder = config_builder.add_source(
            config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml)
        );

        // User-provided configuration
        if let Some(path) = Self::resolve_path(config_path)? {
            config_builder = config_builder.add_source(config::File::from(path.as_path()));
        }

        // Environment variables
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("ERYSA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
        );

        config_builder
            .build()
            .map_err(|e| ErysaError::ConfigError(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ErysaError::ConfigError(format!("Failed to parse configuration: {}", e)))
    }

    /// Configuration file layered over the built-in defaults, if any.
    ///
    /// An explicit path must exist; otherwise the default location is used
    /// when present.
    pub fn resolve_path(config_path: Option<&Path>) -> ErysaResult<Option<PathBuf>> {
        match config_path {
            Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
            Some(path) => Err(ErysaError::ConfigError(
                format!("Specified configuration file not found: {}", path.display())
            )),
            None => {
                let default_path = Self::get_default_config_path();
                Ok(default_path.exists().then_some(default_path))
            }
        }
    }

    /// Reject settings no workflow can run with
    pub fn validate(&self) -> ErysaResult<()> {
        if self.workflow.batch_size == 0 {
            return Err(ErysaError::ConfigError("workflow.batch_size must be at least 1".to_string()));
        }

        if self.workers.is_empty() {
            warn!("No workers configured; every dispatch will return an empty result");
        }

        let mut names: Vec<&str> = self.workers.iter().map(|w| w.name()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            warn!("Worker name {} is used more than once; log lines will be ambiguous", pair[0]);
        }

        Ok(())
    }

    /// Get the default configuration path
    pub fn get_default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".erysa/config.toml")
    }

    /// Write the default configuration to the default location
    pub fn init(force: bool) -> ErysaResult<PathBuf> {
        let config_path = Self::get_default_config_path();
        Self::init_at(&config_path, force)?;
        Ok(config_path)
    }

    /// Write the default configuration to `config_path`
    pub fn init_at(config_path: &Path, force: bool) -> ErysaResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ErysaError::FileError {
                    path: parent.to_path_buf(),
                    message: format!("Failed to create directory: {}", e),
                })?;
        }

        if config_path.exists() && !force {
            return Err(ErysaError::ConfigError(
                format!("Configuration already exists at {}. Use --force to overwrite.", config_path.display())
            ));
        }

        Settings::default().save(config_path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> ErysaResult<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| ErysaError::SerializationError(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, config_str)
            .map_err(|e| ErysaError::FileError {
                path: path.to_path_buf(),
                message: format!("Failed to write configuration: {}", e),
            })?;

        info!("Configuration saved to {}", path.display());

        Ok(())
    }
}
