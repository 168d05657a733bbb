//! Text-generation client for the Gemini `generateContent` endpoint.
//!
//! Sends a prompt as a single user-role message and returns the text of the
//! first candidate. There is no retry or back-off here; callers decide what
//! an error means for them.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use grayscout_shared::{AppConfig, GrayscoutError, Result};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("grayscout/", env!("CARGO_PKG_VERSION"));

/// How much of an error body ends up in a [`GrayscoutError`] message.
const ERROR_BODY_PREVIEW: usize = 200;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Runtime options for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    /// Scheme + host of the API, e.g. `https://generativelanguage.googleapis.com`.
    pub base_url: String,
    /// Model identifier, e.g. `gemini-2.5-flash-lite`.
    pub model: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl From<&AppConfig> for GeminiOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.gemini.base_url.clone(),
            model: config.gemini.model.clone(),
            timeout: config.gemini.timeout_secs.map(Duration::from_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client bound to one model and one API key.
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiClient {
    /// Build a client for `opts.model` authenticated with `api_key`.
    pub fn new(opts: &GeminiOptions, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint_url(&opts.base_url, &opts.model)?;

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GrayscoutError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// The `generateContent` URL, without the key.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `prompt` and return the first candidate's text.
    ///
    /// Connection failures and non-success statuses are
    /// [`GrayscoutError::Transport`]; a body without
    /// `candidates[0].content.parts[0].text` is [`GrayscoutError::ResponseFormat`].
    #[instrument(skip_all, fields(endpoint = %self.endpoint, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        // `without_url` keeps the key out of error messages and logs.
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GrayscoutError::Transport(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            GrayscoutError::Transport(format!("failed to read body: {}", e.without_url()))
        })?;

        if !status.is_success() {
            return Err(GrayscoutError::Transport(format!(
                "HTTP {status}: {}",
                preview(&text)
            )));
        }

        let generated = extract_text(&text)?;
        debug!(len = generated.len(), "generation response received");
        Ok(generated)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build `<base>/v1beta/models/<model>:generateContent`.
fn endpoint_url(base_url: &str, model: &str) -> Result<Url> {
    let raw = format!(
        "{}/v1beta/models/{model}:generateContent",
        base_url.trim_end_matches('/')
    );
    Url::parse(&raw).map_err(|e| GrayscoutError::config(format!("invalid endpoint '{raw}': {e}")))
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
fn extract_text(body: &str) -> Result<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        GrayscoutError::ResponseFormat(format!("invalid JSON: {e} (got: {})", preview(body)))
    })?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            GrayscoutError::ResponseFormat(format!(
                "missing candidates[0].content.parts[0].text (got: {})",
                preview(body)
            ))
        })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
