//! HEAD-based reachability probe.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use grayscout_shared::{GrayscoutError, Result};

/// Maximum number of redirects to follow while probing.
const MAX_REDIRECTS: usize = 10;

/// User-Agent string for probe requests.
const USER_AGENT: &str = concat!("grayscout/", env!("CARGO_PKG_VERSION"));

/// Checks whether a URL answers a HEAD request with 200.
pub struct Prober {
    client: Client,
}

impl Prober {
    /// Create a prober whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| GrayscoutError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// `true` iff the HEAD request completes and the final status is exactly 200.
    pub async fn is_accessible(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(url, %status, "probe answered");
                status == reqwest::StatusCode::OK
            }
            Err(e) => {
                debug!(url, error = %e, "probe failed");
                false
            }
        }
    }
}
