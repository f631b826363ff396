//! HTTP reachability checks for the instances of a group.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Per-request timeout used by [`HttpProber::new`].
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a single HTTP request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ProbeStatus {
    /// The service answered with this status code.
    Code(u16),
    /// The request failed before a response arrived.
    Unreachable,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Unreachable => f.write_str("ERR"),
        }
    }
}

/// Outcome of probing one instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProbeResult {
    /// Public address that was probed.
    pub ip: String,
    /// HTTP status or [`ProbeStatus::Unreachable`].
    pub status: ProbeStatus,
    /// Value of the instance's `owner` label.
    pub owner: String,
}

/// Builds `http://<ip>/<suffix>`.
#[must_use]
pub fn probe_url(ip: &str, suffix: &str) -> String {
    format!("http://{ip}/{}", suffix.trim_start_matches('/'))
}

/// Issues plain `GET` requests.
#[derive(Clone, Debug)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl HttpProber {
    /// Creates a prober whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Requests `url` and reports the status code. Transport failures map to
    /// [`ProbeStatus::Unreachable`].
    pub async fn check(&self, url: &str) -> ProbeStatus {
        match self.client.get(url).send().await {
            Ok(response) => ProbeStatus::Code(response.status().as_u16()),
            Err(_) => ProbeStatus::Unreachable,
        }
    }
}
