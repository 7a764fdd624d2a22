//! Background sync worker.
//!
//! One dedicated thread pops requests from a LIFO queue and hands them to a
//! transport, one at a time. The most recent request is always served first,
//! so tiles near the current position win over stale backlog.
//!
//! # Lifecycle
//!
//! ```text
//!  Stopped ──start()──► Starting ──validated──► Running ──stop()──► Stopped
//!     ▲                    │                      │
//!     └── invalid config ──┘                      │ N consecutive failures
//!        (stalled flag set)                       ▼
//!                                              Stalled
//! ```
//!
//! Stalled is terminal for a run: queued requests are no longer served until
//! the worker is started again.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use super::completion::{CompletionCache, DEFAULT_FRESHNESS_WINDOW};
use super::config::{SyncConfig, DEFAULT_STALL_THRESHOLD};
use super::error::SyncError;
use super::queue::{FreshTileChannel, QueueEntry, RequestQueue};
use super::request::{RequestSink, SyncRequest};
use super::status::{StatusSnapshot, WorkerState, WorkerStatus};
use crate::transport::{self, local_path, SyncOutcome, SyncTransport, TransportError};

/// File whose presence marks the main scenery installation.
pub const BASE_PACKAGE_MARKER: &str = "version";

const WORKER_THREAD_NAME: &str = "scenesync-worker";

/// State shared between the worker handle and its thread.
#[derive(Debug, Default)]
struct Shared {
    queue: RequestQueue,
    fresh: FreshTileChannel,
    status: WorkerStatus,
    stop: AtomicBool,
}

/// Cloneable producer handle for feeding the worker from other threads.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    shared: Arc<Shared>,
}

impl RequestSink for RequestHandle {
    fn request(&self, request: SyncRequest) {
        self.shared.queue.push(request);
    }
}

/// Owns the worker thread and everything it publishes.
pub struct SyncWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<CompletionCache>>,
    /// Completion records while no thread owns them.
    cache: Option<CompletionCache>,
    local_root: Option<PathBuf>,
    freshness_window: Duration,
    stall_threshold: u32,
}

impl Default for SyncWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncWorker {
    /// Create a stopped worker.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            handle: None,
            cache: Some(CompletionCache::new(DEFAULT_FRESHNESS_WINDOW)),
            local_root: None,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }

    /// Set the freshness window used by later starts.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Set the stall threshold used by later starts.
    pub fn with_stall_threshold(mut self, threshold: u32) -> Self {
        self.stall_threshold = threshold.max(1);
        self
    }

    /// Validate `config`, build its transport and launch the thread.
    ///
    /// Every validation failure increments the fail count and leaves the
    /// worker stalled.
    pub fn start(&mut self, config: &SyncConfig) -> Result<(), SyncError> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }
        self.freshness_window = config.freshness_window;
        self.stall_threshold = config.stall_threshold.max(1);
        self.shared.status.set_state(WorkerState::Starting);

        let prepared = validate_local_dir(config.scenery_dir.as_deref())
            .and_then(|root| transport::from_config(config).map(|t| (root, t)));

        match prepared {
            Ok((root, transport)) => self.launch(root, transport),
            Err(e) => Err(self.fail_start(e)),
        }
    }

    /// Launch the thread with an already constructed transport.
    ///
    /// The local directory is validated the same way as in [`start`](Self::start).
    pub fn start_with_transport(
        &mut self,
        local_root: &Path,
        transport: Box<dyn SyncTransport>,
    ) -> Result<(), SyncError> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }
        self.shared.status.set_state(WorkerState::Starting);

        match validate_local_dir(Some(local_root)) {
            Ok(root) => self.launch(root, transport),
            Err(e) => Err(self.fail_start(e)),
        }
    }

    fn fail_start(&self, err: SyncError) -> SyncError {
        error!(error = %err, "Cannot start scenery synchronization");
        self.shared.status.record_start_failure();
        self.shared.status.set_state(WorkerState::Stopped);
        err
    }

    fn launch(
        &mut self,
        local_root: PathBuf,
        transport: Box<dyn SyncTransport>,
    ) -> Result<(), SyncError> {
        self.reap();

        let status = &self.shared.status;
        status.reset();
        self.shared.stop.store(false, Ordering::Release);

        let mut cache = self
            .cache
            .take()
            .unwrap_or_else(|| CompletionCache::new(self.freshness_window));
        cache.set_window(self.freshness_window);

        info!(
            transport = transport.name(),
            dir = %local_root.display(),
            "Starting automatic scenery synchronization"
        );

        let worker_loop = WorkerLoop {
            shared: Arc::clone(&self.shared),
            transport,
            local_root: local_root.clone(),
            cache,
            stall_threshold: self.stall_threshold,
        };

        status.set_state(WorkerState::Running);
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker_loop.run());

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                self.local_root = Some(local_root);
                Ok(())
            }
            Err(e) => Err(self.fail_start(SyncError::Spawn(e))),
        }
    }

    /// Stop the worker, discarding queued requests.
    ///
    /// Returns once the in-flight request (if any) has finished. Safe to
    /// call repeatedly and on a worker that never started.
    pub fn stop(&mut self) {
        self.shared.queue.clear();

        let Some(handle) = self.handle.take() else {
            return;
        };

        debug!("Stopping sync worker");
        self.shared.stop.store(true, Ordering::Release);
        self.shared.queue.push_stop();
        self.join(handle);
        // The thread may have exited on its own before seeing the sentinel.
        self.shared.queue.clear();

        let status = &self.shared.status;
        status.set_busy(false);
        if !status.is_stalled() {
            status.set_state(WorkerState::Stopped);
        }
    }

    /// Collect a thread that already exited (stalled) so its cache survives.
    fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.stop.store(true, Ordering::Release);
            self.shared.queue.push_stop();
            self.join(handle);
            self.shared.queue.clear();
        }
    }

    fn join(&mut self, handle: JoinHandle<CompletionCache>) {
        match handle.join() {
            Ok(cache) => self.cache = Some(cache),
            Err(_) => error!("Sync worker thread panicked"),
        }
    }

    /// Enqueue a request. Never blocks.
    pub fn request(&self, request: SyncRequest) {
        self.shared.queue.push(request);
    }

    /// Producer handle usable from other threads.
    pub fn request_handle(&self) -> RequestHandle {
        RequestHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// True when no requests are waiting.
    pub fn is_idle(&self) -> bool {
        self.shared.queue.is_empty()
    }

    /// Number of requests waiting.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// True while the thread is serving requests.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
            && matches!(
                self.shared.status.state(),
                WorkerState::Starting | WorkerState::Running
            )
    }

    /// Live status counters and flags.
    pub fn status(&self) -> &WorkerStatus {
        &self.shared.status
    }

    /// Copy of the current status.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.shared.status.snapshot()
    }

    /// Directories newly materialized by refresh-flagged syncs.
    pub fn fresh_tiles(&self) -> &FreshTileChannel {
        &self.shared.fresh
    }

    /// Local root of the current or last run.
    pub fn local_root(&self) -> Option<&Path> {
        self.local_root.as_deref()
    }
}

impl RequestSink for SyncWorker {
    fn request(&self, request: SyncRequest) {
        SyncWorker::request(self, request);
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn validate_local_dir(dir: Option<&Path>) -> Result<PathBuf, SyncError> {
    let dir = match dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Err(SyncError::LocalDirUndefined),
    };
    if !dir.is_dir() {
        return Err(SyncError::LocalDirMissing(dir.to_path_buf()));
    }
    if dir.join(BASE_PACKAGE_MARKER).exists() {
        return Err(SyncError::BasePackageDir(dir.to_path_buf()));
    }
    Ok(dir.to_path_buf())
}

/// Everything owned by the worker thread.
struct WorkerLoop {
    shared: Arc<Shared>,
    transport: Box<dyn SyncTransport>,
    local_root: PathBuf,
    cache: CompletionCache,
    stall_threshold: u32,
}

impl WorkerLoop {
    fn run(mut self) -> CompletionCache {
        let shared = Arc::clone(&self.shared);
        let status = &shared.status;
        status.set_active(true);

        while !shared.stop.load(Ordering::Acquire) {
            let request = match shared.queue.pop() {
                QueueEntry::Stop => break,
                QueueEntry::Request(request) => request,
            };
            if shared.stop.load(Ordering::Acquire) {
                break;
            }

            self.process(&request);

            if status.consecutive_errors() >= self.stall_threshold {
                error!(
                    consecutive_errors = status.consecutive_errors(),
                    "Too many errors, scenery synchronization stalled"
                );
                status.set_stalled(true);
                status.set_state(WorkerState::Stalled);
                break;
            }
        }

        status.set_busy(false);
        status.set_active(false);
        if !status.is_stalled() {
            status.set_state(WorkerState::Stopped);
        }
        status.mark_dirty();
        debug!("Sync worker exited");
        self.cache
    }

    fn process(&mut self, request: &SyncRequest) {
        let now = Instant::now();
        if !self.cache.should_sync(request.dir(), now) {
            trace!(dir = request.dir(), "Directory synced recently, skipping");
            return;
        }

        let status = &self.shared.status;
        status.set_busy(true);
        debug!(dir = request.dir(), "Synchronizing directory");

        match self.sync_dir(request.dir()) {
            Ok((outcome, is_new)) => {
                match outcome {
                    SyncOutcome::Updated => {
                        info!(dir = request.dir(), "Synchronized directory")
                    }
                    SyncOutcome::RemoteAbsent => {
                        debug!(dir = request.dir(), "Directory not present on server")
                    }
                }
                // Publish the fresh tile before the success count moves.
                if request.refresh() {
                    status.record_updated_tile();
                    if is_new {
                        self.shared.fresh.push(request.clone());
                        status.mark_dirty();
                    }
                }
                status.record_success();
            }
            Err(e) => {
                let consecutive = status.record_failure();
                warn!(
                    dir = request.dir(),
                    error = %e,
                    consecutive_errors = consecutive,
                    "Failed to synchronize directory"
                );
            }
        }

        status.set_busy(false);
        self.cache.record_attempt(request.dir(), now);
    }

    /// Sync one directory, reporting whether it had to be created locally.
    fn sync_dir(&self, dir: &str) -> Result<(SyncOutcome, bool), TransportError> {
        let path = local_path(&self.local_root, dir);
        let is_new = !path.exists();
        if is_new {
            fs::create_dir_all(&path).map_err(|e| TransportError::io(&path, e))?;
        }

        let transport = &self.transport;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| transport.sync(dir)))
            .unwrap_or_else(|payload| Err(TransportError::Panicked(panic_message(payload))));

        outcome.map(|outcome| (outcome, is_new))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    #[derive(Clone, Copy)]
    enum Step {
        Ok,
        Absent,
        Fail,
        Panic,
    }

    /// Transport that replays scripted results and records every call.
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn new(steps: &[Step]) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let transport = Self {
                steps: Mutex::new(steps.iter().copied().collect()),
                calls: Arc::clone(&calls),
            };
            (transport, calls)
        }
    }

    impl SyncTransport for ScriptedTransport {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn sync(&self, dir: &str) -> Result<SyncOutcome, TransportError> {
            self.calls.lock().push(dir.to_string());
            match self.steps.lock().pop_front().unwrap_or(Step::Ok) {
                Step::Ok => Ok(SyncOutcome::Updated),
                Step::Absent => Ok(SyncOutcome::RemoteAbsent),
                Step::Fail => Err(TransportError::Http {
                    url: dir.to_string(),
                    reason: "scripted failure".to_string(),
                }),
                Step::Panic => panic!("scripted panic"),
            }
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_start_requires_local_dir() {
        let mut worker = SyncWorker::new();
        let err = worker.start(&SyncConfig::default()).unwrap_err();

        assert!(matches!(err, SyncError::LocalDirUndefined));
        assert_eq!(worker.status().fail_count(), 1);
        assert!(worker.status().is_stalled());
        assert_eq!(worker.status().state(), WorkerState::Stopped);
    }

    #[test]
    fn test_start_rejects_missing_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let config = SyncConfig::default().with_scenery_dir(&missing);

        let mut worker = SyncWorker::new();
        let err = worker.start(&config).unwrap_err();
        assert!(matches!(err, SyncError::LocalDirMissing(p) if p == missing));
    }

    #[test]
    fn test_start_rejects_base_package_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(BASE_PACKAGE_MARKER), "2020.3.0").unwrap();

        let (transport, _) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        let err = worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap_err();
        assert!(matches!(err, SyncError::BasePackageDir(_)));
        assert!(!worker.is_running());
    }

    #[test]
    fn test_start_rejects_missing_endpoint() {
        let temp = TempDir::new().unwrap();
        let config = SyncConfig::default().with_scenery_dir(temp.path());

        let mut worker = SyncWorker::new();
        let err = worker.start(&config).unwrap_err();
        assert!(matches!(err, SyncError::EndpointUndefined("svn_server")));
        assert_eq!(worker.status().fail_count(), 1);
    }

    #[test]
    fn test_serves_requests_and_reports_new_tiles() {
        let temp = TempDir::new().unwrap();
        let (transport, calls) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        worker.request(SyncRequest::new("Terrain/e000n50/e008n53", true));
        assert!(wait_until(|| worker.status().success_count() == 1));

        assert_eq!(*calls.lock(), vec!["Terrain/e000n50/e008n53".to_string()]);
        assert!(temp.path().join("Terrain/e000n50/e008n53").is_dir());
        assert_eq!(worker.status().updated_tile_count(), 1);
        let fresh = worker.fresh_tiles().drain();
        assert_eq!(fresh, vec![SyncRequest::new("Terrain/e000n50/e008n53", true)]);
        assert!(worker.status().take_dirty());

        worker.stop();
        assert_eq!(worker.status().state(), WorkerState::Stopped);
    }

    #[test]
    fn test_existing_dir_is_not_reported_fresh() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Terrain/e000n50/e008n53")).unwrap();

        let (transport, _) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        worker.request(SyncRequest::new("Terrain/e000n50/e008n53", true));
        assert!(wait_until(|| worker.status().success_count() == 1));

        assert_eq!(worker.status().updated_tile_count(), 1);
        assert!(worker.fresh_tiles().is_empty());
    }

    #[test]
    fn test_recent_directory_is_skipped() {
        let temp = TempDir::new().unwrap();
        let (transport, calls) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        worker.request(SyncRequest::background("Objects/e000n50/e008n53"));
        assert!(wait_until(|| worker.status().success_count() == 1));
        worker.request(SyncRequest::background("Objects/e000n50/e008n53"));
        worker.request(SyncRequest::background("Models"));
        assert!(wait_until(|| worker.status().success_count() == 2));

        worker.stop();
        assert_eq!(
            *calls.lock(),
            vec!["Objects/e000n50/e008n53".to_string(), "Models".to_string()]
        );
    }

    #[test]
    fn test_stalls_after_consecutive_failures() {
        let temp = TempDir::new().unwrap();
        let (transport, _) = ScriptedTransport::new(&[Step::Fail, Step::Fail, Step::Fail]);
        let mut worker = SyncWorker::new().with_stall_threshold(3);
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        for i in 0..5 {
            worker.request(SyncRequest::background(format!("Airports/{i}")));
        }
        assert!(wait_until(|| worker.status().is_stalled()));

        assert_eq!(worker.status().state(), WorkerState::Stalled);
        assert_eq!(worker.status().fail_count(), 3);
        assert!(!worker.status().is_active());
        assert!(!worker.is_running());

        worker.stop();
        assert_eq!(worker.status().state(), WorkerState::Stalled);
    }

    #[test]
    fn test_success_resets_consecutive_errors() {
        let temp = TempDir::new().unwrap();
        let (transport, _) =
            ScriptedTransport::new(&[Step::Fail, Step::Fail, Step::Absent, Step::Fail, Step::Fail]);
        let mut worker = SyncWorker::new().with_stall_threshold(3);
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        for i in 0..5 {
            worker.request(SyncRequest::background(format!("Models/{i}")));
        }
        assert!(wait_until(|| {
            let s = worker.snapshot();
            s.fail_count + s.success_count == 5
        }));

        assert!(!worker.status().is_stalled());
        assert_eq!(worker.status().consecutive_errors(), 2);
        assert_eq!(worker.status().success_count(), 1);
    }

    #[test]
    fn test_transport_panic_counts_as_failure() {
        let temp = TempDir::new().unwrap();
        let (transport, _) = ScriptedTransport::new(&[Step::Panic]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        worker.request(SyncRequest::background("Models"));
        worker.request(SyncRequest::background("Airports/K"));
        assert!(wait_until(|| worker.status().success_count() == 1));

        assert_eq!(worker.status().fail_count(), 1);
        assert!(worker.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut worker = SyncWorker::new();
        worker.stop();

        let (transport, _) = ScriptedTransport::new(&[]);
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();
        assert!(worker.is_running());

        let started = Instant::now();
        worker.stop();
        worker.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!worker.is_running());
        assert!(worker.is_idle());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let temp = TempDir::new().unwrap();
        let (first, _) = ScriptedTransport::new(&[]);
        let (second, _) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(first))
            .unwrap();

        let err = worker
            .start_with_transport(temp.path(), Box::new(second))
            .unwrap_err();
        assert!(matches!(err, SyncError::AlreadyRunning));
    }

    #[test]
    fn test_completion_records_survive_restart() {
        let temp = TempDir::new().unwrap();
        let (first, _) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(first))
            .unwrap();
        worker.request(SyncRequest::background("Models"));
        assert!(wait_until(|| worker.status().success_count() == 1));
        worker.stop();

        let (second, calls) = ScriptedTransport::new(&[]);
        worker
            .start_with_transport(temp.path(), Box::new(second))
            .unwrap();
        assert_eq!(worker.status().success_count(), 0);
        worker.request(SyncRequest::background("Models"));
        worker.request(SyncRequest::background("Airports/A"));
        assert!(wait_until(|| worker.status().success_count() == 1));
        worker.stop();

        assert_eq!(*calls.lock(), vec!["Airports/A".to_string()]);
    }

    #[test]
    fn test_request_handle_feeds_worker() {
        let temp = TempDir::new().unwrap();
        let (transport, _) = ScriptedTransport::new(&[]);
        let mut worker = SyncWorker::new();
        worker
            .start_with_transport(temp.path(), Box::new(transport))
            .unwrap();

        let handle = worker.request_handle();
        let producer = thread::spawn(move || {
            for i in 0..10 {
                handle.request(SyncRequest::background(format!("Objects/{i}")));
            }
        });
        producer.join().unwrap();

        assert!(wait_until(|| worker.status().success_count() == 10));
    }
}
