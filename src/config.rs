//! Client configuration.
//!
//! Holds the backend base URL and the request timeout applied to every
//! call, including the bootstrap and refresh calls. Bounding those two is
//! what keeps a hung refresh from wedging the session state machine: the
//! timeout surfaces as a network error and the refresh settles as failed.

use std::time::Duration;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API, e.g. `https://admin.example.com/api`.
    pub base_url: String,
    /// Timeout applied to every request through the HTTP transport.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
