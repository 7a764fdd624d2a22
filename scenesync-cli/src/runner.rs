//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization and
//! orchestrator creation to reduce duplication across command handlers.

use tracing::info;

use scenesync::config::ConfigFile;
use scenesync::logging::{init_logging, LoggingGuard, LoggingOptions};
use scenesync::service::SyncOrchestrator;
use scenesync::sync::SyncConfig;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new(options: LoggingOptions) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, options)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("scenesync v{}", scenesync::VERSION);
        info!("scenesync CLI: {} command", command);
        info!("Log file: {}", self.config.logging.file.display());
    }

    /// Runtime sync configuration derived from the config file.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::from_config_file(&self.config)
    }

    /// Create an orchestrator that logs each refreshed tile.
    pub fn create_orchestrator(&self, config: SyncConfig, bootstrap: bool) -> SyncOrchestrator {
        let orchestrator = SyncOrchestrator::new(config)
            .with_refresher(|index: i64| info!(tile = index, "Scenery tile refreshed"));
        if bootstrap {
            orchestrator
        } else {
            orchestrator.without_bootstrap()
        }
    }
}
