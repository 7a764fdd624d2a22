//! Process-wide client context for the built-in transport.
//!
//! The context is created at most once per process, shared by every worker
//! run, and survives worker restarts. It is torn down only through the
//! explicit [`shutdown_client_context`] hook at process exit.

use parking_lot::Mutex;
use std::io::Read;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use super::builtin::RemoteSource;
use super::TransportError;

/// Global slot holding the shared context once initialized.
static CLIENT_CONTEXT: OnceLock<Mutex<Option<Arc<ClientContext>>>> = OnceLock::new();

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("scenesync/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for listings and files.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared HTTP client used by the built-in transport.
#[derive(Debug)]
pub struct ClientContext {
    client: reqwest::blocking::Client,
}

impl ClientContext {
    fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Http {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl RemoteSource for ClientContext {
    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, TransportError> {
        let http_error = |reason: String| TransportError::Http {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| http_error(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(http_error(format!("HTTP {}", response.status())));
        }

        let mut body = Vec::new();
        response
            .read_to_end(&mut body)
            .map_err(|e| http_error(format!("failed to read body: {}", e)))?;
        Ok(Some(body))
    }
}

/// Get the shared context, creating it on first use.
pub fn client_context() -> Result<Arc<ClientContext>, TransportError> {
    let slot = CLIENT_CONTEXT.get_or_init(|| Mutex::new(None));
    let mut guard = slot.lock();

    if let Some(context) = guard.as_ref() {
        return Ok(Arc::clone(context));
    }

    let context = Arc::new(ClientContext::new()?);
    info!("Initialized built-in sync client");
    *guard = Some(Arc::clone(&context));
    Ok(context)
}

/// Release the shared context. Returns true if one existed.
///
/// Transports still holding a reference keep working until dropped.
pub fn shutdown_client_context() -> bool {
    let released = CLIENT_CONTEXT
        .get()
        .and_then(|slot| slot.lock().take())
        .is_some();
    if released {
        debug!("Released built-in sync client");
    }
    released
}

/// True if the built-in client can be initialized in this process.
pub fn builtin_transport_available() -> bool {
    client_context().is_ok()
}
