//! Lock-free worker status shared between the worker thread and the foreground.
//!
//! Every field is an atomic so the foreground can poll it every frame without
//! blocking. The dirty flag is a one-shot notification: the worker sets it,
//! the foreground reads and clears it in one swap.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Lifecycle of a sync worker.
///
/// ```text
/// Stopped --start()--> Starting --validated--> Running --stop()--> Stopped
///                                                 |
///                                                 +--too many errors--> Stalled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No worker thread.
    Stopped,
    /// Configuration is being validated.
    Starting,
    /// The worker thread is servicing requests.
    Running,
    /// The worker halted after a run of consecutive failures.
    Stalled,
}

impl WorkerState {
    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Stopped => 0,
            WorkerState::Starting => 1,
            WorkerState::Running => 2,
            WorkerState::Stalled => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Starting,
            2 => WorkerState::Running,
            3 => WorkerState::Stalled,
            _ => WorkerState::Stopped,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Starting => "starting",
            WorkerState::Running => "running",
            WorkerState::Stalled => "stalled",
        };
        f.write_str(label)
    }
}

/// Counters and flags published by the worker.
#[derive(Debug, Default)]
pub struct WorkerStatus {
    state: AtomicU8,
    busy: AtomicBool,
    active: AtomicBool,
    stalled: AtomicBool,
    dirty: AtomicBool,
    consecutive_errors: AtomicU32,
    fail_count: AtomicU32,
    success_count: AtomicU32,
    updated_tile_count: AtomicU32,
}

impl WorkerStatus {
    /// Create a status block in the `Stopped` state with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// True while a transport call is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    /// True while the worker loop is executing.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// True once the worker stalled or failed validation; cleared by a
    /// successful start.
    pub fn is_stalled(&self) -> bool {
        self.stalled.load(Ordering::Acquire)
    }

    pub(crate) fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::Release);
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Failures since the last success.
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::Acquire)
    }

    /// Total failures in this run (including start validation failures).
    pub fn fail_count(&self) -> u32 {
        self.fail_count.load(Ordering::Acquire)
    }

    /// Total successful syncs in this run.
    pub fn success_count(&self) -> u32 {
        self.success_count.load(Ordering::Acquire)
    }

    /// Successful syncs of refresh-flagged directories in this run.
    pub fn updated_tile_count(&self) -> u32 {
        self.updated_tile_count.load(Ordering::Acquire)
    }

    /// Record a failed sync; returns the new consecutive error count.
    pub(crate) fn record_failure(&self) -> u32 {
        self.fail_count.fetch_add(1, Ordering::AcqRel);
        self.consecutive_errors.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record a failed start validation.
    pub(crate) fn record_start_failure(&self) {
        self.fail_count.fetch_add(1, Ordering::AcqRel);
        self.stalled.store(true, Ordering::Release);
    }

    /// Record a successful sync, resetting the consecutive error run.
    pub(crate) fn record_success(&self) {
        self.consecutive_errors.store(0, Ordering::Release);
        self.success_count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_updated_tile(&self) {
        self.updated_tile_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Zero every counter and clear stalled for a fresh run.
    pub(crate) fn reset(&self) {
        self.consecutive_errors.store(0, Ordering::Release);
        self.fail_count.store(0, Ordering::Release);
        self.success_count.store(0, Ordering::Release);
        self.updated_tile_count.store(0, Ordering::Release);
        self.stalled.store(false, Ordering::Release);
        self.busy.store(false, Ordering::Release);
    }

    /// Consistent-enough copy of every field for display.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state(),
            busy: self.is_busy(),
            active: self.is_active(),
            stalled: self.is_stalled(),
            consecutive_errors: self.consecutive_errors(),
            fail_count: self.fail_count(),
            success_count: self.success_count(),
            updated_tile_count: self.updated_tile_count(),
        }
    }
}

/// Read-only copy of [`WorkerStatus`] for a UI or telemetry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: WorkerState,
    pub busy: bool,
    pub active: bool,
    pub stalled: bool,
    pub consecutive_errors: u32,
    pub fail_count: u32,
    pub success_count: u32,
    pub updated_tile_count: u32,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} synced, {} failed, {} tiles updated{}",
            self.state,
            self.success_count,
            self.fail_count,
            self.updated_tile_count,
            if self.busy { " (busy)" } else { "" }
        )
    }
}
