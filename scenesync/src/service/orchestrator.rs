//! Foreground driver for scenery synchronization.
//!
//! [`SyncOrchestrator`] is owned by the host's main loop. It starts and
//! restarts the worker from configuration, turns positions into requests,
//! and is polled through [`update`](SyncOrchestrator::update) to refresh
//! newly arrived tiles and report when the worker has stopped. None of its
//! methods block except `stop()` and `reinit()`, which wait for an in-flight
//! transfer to finish.

use tracing::{debug, error, info, warn};

use super::error::ServiceError;
use super::refresh::{refresh_scenery, TileRefresher};
use crate::prefetch::PositionScheduler;
use crate::sync::{RequestSink, StatusSnapshot, SyncConfig, SyncRequest, SyncWorker};
use crate::transport::SyncTransport;

/// Shared directory with 3D models.
pub const MODELS_DIR: &str = "Models";

/// Why the worker went inactive, reported once per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerNotice {
    /// Halted after too many consecutive errors.
    Stalled,
    /// Exited normally.
    Stopped,
}

/// Result of one [`SyncOrchestrator::update`] poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Set once when the worker has gone inactive.
    pub notice: Option<WorkerNotice>,
    /// Fresh directories handed to the refresher.
    pub refreshed_dirs: usize,
    /// Tiles refreshed across those directories.
    pub refreshed_tiles: usize,
}

/// Requests that prime shared content after a start.
///
/// Airports `K`..`Z`, then `A`..`J`, then [`MODELS_DIR`]; none refresh the
/// display. Submitted in this order, the queue serves `Models` first.
pub fn bootstrap_requests() -> Vec<SyncRequest> {
    ('K'..='Z')
        .chain('A'..='J')
        .map(|letter| SyncRequest::background(format!("Airports/{letter}")))
        .chain(std::iter::once(SyncRequest::background(MODELS_DIR)))
        .collect()
}

/// Owns the worker, the position scheduler and the display refresher.
pub struct SyncOrchestrator {
    config: SyncConfig,
    worker: SyncWorker,
    scheduler: PositionScheduler,
    refresher: Option<Box<dyn TileRefresher>>,
    bootstrap: bool,
    stalled: bool,
}

impl SyncOrchestrator {
    /// Create an idle orchestrator. Nothing starts until [`init`](Self::init).
    pub fn new(config: SyncConfig) -> Self {
        let worker = SyncWorker::new()
            .with_freshness_window(config.freshness_window)
            .with_stall_threshold(config.stall_threshold);
        Self {
            config,
            worker,
            scheduler: PositionScheduler::new(),
            refresher: None,
            bootstrap: true,
            stalled: false,
        }
    }

    /// Install the display refresher for fresh tiles.
    pub fn with_refresher(mut self, refresher: impl TileRefresher + 'static) -> Self {
        self.refresher = Some(Box::new(refresher));
        self
    }

    /// Skip airport and model priming after starts.
    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = false;
        self
    }

    /// Start from the configuration given at construction.
    pub fn init(&mut self) -> Result<(), ServiceError> {
        self.reinit(self.config.clone())
    }

    /// Apply a new configuration.
    ///
    /// An enabled, running worker is left alone. Otherwise the worker is
    /// stopped and, if enabled, started again and primed; the last position
    /// is then forgotten so the next update requests the full neighborhood.
    pub fn reinit(&mut self, config: SyncConfig) -> Result<(), ServiceError> {
        self.config = config;
        if self.config.enabled && self.worker.is_running() {
            return Ok(());
        }

        self.worker.stop();

        let result = if self.config.enabled {
            self.worker.start(&self.config).map_err(ServiceError::from)
        } else {
            debug!("Scenery synchronization disabled");
            Ok(())
        };
        if result.is_ok() && self.config.enabled {
            self.prime();
        }

        self.stalled = self.worker.status().is_stalled();
        self.scheduler.reset();
        result
    }

    /// Restart the worker with a caller-supplied transport.
    ///
    /// Uses the configured scenery directory; the `enabled` flag is not
    /// consulted.
    pub fn start_with_transport(
        &mut self,
        transport: Box<dyn SyncTransport>,
    ) -> Result<(), ServiceError> {
        self.worker.stop();

        let root = self.config.scenery_dir.clone().unwrap_or_default();
        let result = self.worker.start_with_transport(&root, transport);
        if result.is_ok() {
            self.prime();
        }

        self.stalled = self.worker.status().is_stalled();
        self.scheduler.reset();
        result.map_err(ServiceError::from)
    }

    fn prime(&self) {
        if !self.bootstrap {
            return;
        }
        for request in bootstrap_requests() {
            self.worker.request(request);
        }
    }

    /// Poll from the host's main loop.
    ///
    /// Cheap when nothing changed. When the worker has gone inactive since
    /// the last poll, logs it once and reports a [`WorkerNotice`]. When
    /// display refresh is enabled, refreshes every fresh tile directory.
    pub fn update(&mut self) -> UpdateReport {
        let mut report = UpdateReport::default();
        let status = self.worker.status();
        if !status.take_dirty() {
            return report;
        }

        if !status.is_active() {
            self.stalled = status.is_stalled();
            if self.stalled {
                error!("Automatic scenery synchronization stalled. Too many errors.");
                report.notice = Some(WorkerNotice::Stalled);
            } else {
                info!("Automatic scenery synchronization has stopped.");
                report.notice = Some(WorkerNotice::Stopped);
            }
        }

        if !self.config.refresh_display {
            return report;
        }

        let (Some(root), Some(refresher)) = (self.worker.local_root(), self.refresher.as_deref())
        else {
            return report;
        };
        for tile in self.worker.fresh_tiles().drain() {
            match refresh_scenery(root, tile.dir(), refresher) {
                Ok(count) => {
                    report.refreshed_dirs += 1;
                    report.refreshed_tiles += count;
                }
                Err(e) => warn!(dir = tile.dir(), error = %e, "Cannot refresh scenery"),
            }
        }
        report
    }

    /// Request areas around an integer position. Returns `false` when the
    /// position did not change.
    pub fn schedule_position(&mut self, lat: i32, lon: i32) -> bool {
        self.scheduler.schedule_position(lat, lon, &self.worker)
    }

    /// Request areas around a floating point position.
    pub fn schedule_location(&mut self, lat: f64, lon: f64) -> bool {
        self.scheduler.schedule_location(lat, lon, &self.worker)
    }

    /// Stop the worker. Queued requests are discarded.
    pub fn stop(&mut self) {
        self.worker.stop();
    }

    /// True when no requests are waiting.
    pub fn is_idle(&self) -> bool {
        self.worker.is_idle()
    }

    /// Stalled flag as last published by `reinit()` or `update()`.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Copy of the worker's counters and flags.
    pub fn status(&self) -> StatusSnapshot {
        self.worker.snapshot()
    }

    /// Current configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The underlying worker.
    pub fn worker(&self) -> &SyncWorker {
        &self.worker
    }
}

impl RequestSink for SyncOrchestrator {
    fn request(&self, request: SyncRequest) {
        self.worker.request(request);
    }
}

impl Drop for SyncOrchestrator {
    fn drop(&mut self) {
        self.worker.stop();
    }
}
