//! Image download: GET a URL and stream its body to a local file.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use grayscout_shared::{GrayscoutError, Result};

/// User-Agent string for download requests.
const USER_AGENT: &str = concat!("grayscout/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per download.
const MAX_REDIRECTS: usize = 10;

/// Downloads images one at a time.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Create a downloader. `timeout` of `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GrayscoutError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// A transport error or non-success status creates no file. If the body
    /// fails mid-stream the partial file is removed.
    #[instrument(skip_all, fields(url = %url, dest = %dest.display()))]
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!("downloading");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GrayscoutError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GrayscoutError::Transport(format!("{url}: HTTP {status}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| GrayscoutError::io(dest, e))?;

        let written = match stream_body(&mut response, &mut file, dest).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!(error = %rm, "failed to remove partial download");
                }
                return Err(e);
            }
        };

        info!(bytes = written, "downloaded");
        Ok(written)
    }
}

/// Copy the response body into `file` chunk by chunk.
async fn stream_body(
    response: &mut reqwest::Response,
    file: &mut tokio::fs::File,
    dest: &Path,
) -> Result<u64> {
    let mut written: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| GrayscoutError::Transport(format!("body read failed: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| GrayscoutError::io(dest, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| GrayscoutError::io(dest, e))?;
    Ok(written)
}
