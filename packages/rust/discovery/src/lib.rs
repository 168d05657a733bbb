//! Image URL discovery through a generative text model.
//!
//! Each discovery round makes two generation calls: one asking the model to
//! propose image URLs, and one asking it to restate only the URLs from its own
//! answer. Lines that pass the [`CandidateFilter`] are probed with HEAD, and
//! reachable ones are accepted until the target count is met.

mod filter;
mod probe;
mod prompts;

use std::time::Duration;

use grayscout_gemini::GeminiClient;
use grayscout_shared::{AppConfig, GrayscoutError, Result};
use tracing::{debug, info, instrument, warn};

pub use filter::{CandidateFilter, ContainsHttp, extract_candidates};
pub use probe::Prober;
pub use prompts::{extraction_prompt, generation_prompt};

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery loop.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Rounds to attempt before [`GrayscoutError::DiscoveryExhausted`]. `0` never gives up.
    pub max_rounds: u32,
    /// Timeout for each reachability probe.
    pub probe_timeout: Duration,
    /// Repository named as excluded in the generation prompt.
    pub excluded_source: String,
    /// Size ceiling named in the generation prompt.
    pub max_file_size_kb: u32,
    /// Refuse to accept the same URL twice.
    pub deduplicate: bool,
}

impl From<&AppConfig> for DiscoveryOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_rounds: config.discovery.max_rounds,
            probe_timeout: Duration::from_secs(config.discovery.probe_timeout_secs),
            excluded_source: config.discovery.excluded_source.clone(),
            max_file_size_kb: config.discovery.max_file_size_kb,
            deduplicate: config.discovery.deduplicate,
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Main entry points
// ---------------------------------------------------------------------------

/// Discover exactly `target_count` reachable image URLs using [`ContainsHttp`].
pub async fn discover_urls(
    client: &GeminiClient,
    target_count: usize,
    opts: &DiscoveryOptions,
) -> Result<Vec<String>> {
    discover_urls_with(client, target_count, opts, &ContainsHttp).await
}

/// Discover exactly `target_count` reachable image URLs.
///
/// Rounds repeat until enough URLs are accepted. A generation error or empty
/// answer ends the current round early. Returns
/// [`GrayscoutError::DiscoveryExhausted`] once `opts.max_rounds` rounds have
/// run without reaching the target.
#[instrument(skip_all, fields(target = target_count, max_rounds = opts.max_rounds))]
pub async fn discover_urls_with(
    client: &GeminiClient,
    target_count: usize,
    opts: &DiscoveryOptions,
    filter: &dyn CandidateFilter,
) -> Result<Vec<String>> {
    let mut accepted: Vec<String> = Vec::with_capacity(target_count);
    if target_count == 0 {
        return Ok(accepted);
    }

    let prober = Prober::new(opts.probe_timeout)?;
    let mut round: u32 = 0;

    while accepted.len() < target_count {
        if opts.max_rounds > 0 && round >= opts.max_rounds {
            return Err(GrayscoutError::DiscoveryExhausted {
                found: accepted.len(),
                wanted: target_count,
                rounds: round,
            });
        }
        round += 1;

        let candidates = propose_candidates(client, target_count, opts, filter).await;
        info!(round, candidates = candidates.len(), "discovery round proposed candidates");

        for url in candidates {
            if opts.deduplicate && accepted.contains(&url) {
                debug!(%url, "already accepted, skipping");
                continue;
            }

            if prober.is_accessible(&url).await {
                info!(%url, "accepted");
                accepted.push(url);
                if accepted.len() == target_count {
                    break;
                }
            } else {
                debug!(%url, "not reachable");
            }
        }
    }

    info!(rounds = round, accepted = accepted.len(), "discovery complete");
    Ok(accepted)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run the generate → extract pair and return filtered candidate lines.
///
/// Any failure yields an empty list so the caller simply starts a new round.
async fn propose_candidates(
    client: &GeminiClient,
    target_count: usize,
    opts: &DiscoveryOptions,
    filter: &dyn CandidateFilter,
) -> Vec<String> {
    let prompt = generation_prompt(target_count, &opts.excluded_source, opts.max_file_size_kb);
    let raw_text = match client.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("generation returned empty text");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "generation call failed");
            return Vec::new();
        }
    };

    let url_text = match client.generate(&extraction_prompt(&raw_text)).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("extraction returned empty text");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "extraction call failed");
            return Vec::new();
        }
    };

    extract_candidates(&url_text, filter)
}
