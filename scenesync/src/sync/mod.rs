//! Directory synchronization engine.
//!
//! Requests flow from producers (the position scheduler and startup
//! priming) through a LIFO [`RequestQueue`] into a single background
//! [`SyncWorker`], which delegates each directory to a
//! [`SyncTransport`](crate::transport::SyncTransport). Newly materialized
//! refresh-flagged directories come back out through a
//! [`FreshTileChannel`].

mod completion;
mod config;
mod error;
mod queue;
mod request;
mod status;
mod worker;

pub use completion::{CompletionCache, DEFAULT_FRESHNESS_WINDOW};
pub use config::{SyncConfig, DEFAULT_EXT_SVN_UTILITY, DEFAULT_STALL_THRESHOLD};
pub use error::SyncError;
pub use queue::{BlockingDeque, FreshTileChannel, QueueEntry, RequestQueue};
pub use request::{RequestSink, SyncRequest};
pub use status::{StatusSnapshot, WorkerState, WorkerStatus};
pub use worker::{RequestHandle, SyncWorker, BASE_PACKAGE_MARKER};
