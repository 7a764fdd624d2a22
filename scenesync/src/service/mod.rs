//! High-level orchestration for a host application.
//!
//! # Example
//!
//! ```ignore
//! use scenesync::config::ConfigFile;
//! use scenesync::service::SyncOrchestrator;
//! use scenesync::sync::SyncConfig;
//!
//! let config = SyncConfig::from_config_file(&ConfigFile::load()?);
//! let mut orchestrator = SyncOrchestrator::new(config)
//!     .with_refresher(|index: i64| println!("reload tile {index}"));
//! orchestrator.init()?;
//!
//! // Every frame
//! orchestrator.schedule_location(53.6, 8.4);
//! orchestrator.update();
//! ```

mod error;
mod orchestrator;
mod refresh;

pub use error::ServiceError;
pub use orchestrator::{bootstrap_requests, SyncOrchestrator, UpdateReport, WorkerNotice, MODELS_DIR};
pub use refresh::{refresh_scenery, tile_index, tile_indices, TileRefresher, TILE_FILE_EXTENSION};
