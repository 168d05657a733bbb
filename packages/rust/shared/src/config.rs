//! Application configuration for grayscout.
//!
//! Config is read from `./grayscout.toml`, then `~/.grayscout/grayscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GrayscoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "grayscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".grayscout";

/// Extension used by [`ExtensionPolicy::Fixed`].
const FIXED_EXTENSION: &str = "jpg";

// ---------------------------------------------------------------------------
// Config structs (matching grayscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation endpoint settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// URL discovery loop settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Output directories and file naming.
    #[serde(default)]
    pub output: OutputConfig,

    /// Image download settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Scheme + host of the generation API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier used in the `generateContent` path.
    #[serde(default = "default_model")]
    pub model: String,

    /// Credential file holding the API key on its first line.
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Request timeout. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            key_file: default_key_file(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_model() -> String {
    "gemini-2.5-flash-lite".into()
}
fn default_key_file() -> String {
    "googleai.key".into()
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum discovery rounds before giving up. `0` retries forever.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Timeout for each HEAD reachability probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Image repository the model is told to avoid.
    #[serde(default = "default_excluded_source")]
    pub excluded_source: String,

    /// Size ceiling stated in the generation prompt.
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u32,

    /// Skip URLs that were already accepted.
    #[serde(default)]
    pub deduplicate: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            probe_timeout_secs: default_probe_timeout(),
            excluded_source: default_excluded_source(),
            max_file_size_kb: default_max_file_size_kb(),
            deduplicate: false,
        }
    }
}

fn default_max_rounds() -> u32 {
    10
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_excluded_source() -> String {
    "Wikimedia Commons".into()
}
fn default_max_file_size_kb() -> u32 {
    200
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for downloaded originals.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Directory for grayscale derivatives.
    #[serde(default = "default_grayscale_dir")]
    pub grayscale_dir: String,

    /// How output file extensions are chosen.
    #[serde(default)]
    pub extension: ExtensionPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            grayscale_dir: default_grayscale_dir(),
            extension: ExtensionPolicy::default(),
        }
    }
}

fn default_images_dir() -> String {
    "images".into()
}
fn default_grayscale_dir() -> String {
    "gs-images".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Download timeout. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Output file extension policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionPolicy {
    /// Every file is `<index>.jpg`, whatever the source format.
    #[default]
    Fixed,
    /// Keep the extension of the source URL (`jpg`, `jpeg` or `png`).
    Source,
}

impl ExtensionPolicy {
    /// File extension (without the dot) for an image downloaded from `url`.
    pub fn extension_for(&self, url: &str) -> String {
        match self {
            Self::Fixed => FIXED_EXTENSION.to_string(),
            Self::Source => Url::parse(url.trim())
                .ok()
                .and_then(|u| {
                    let path = u.path().to_ascii_lowercase();
                    ["jpg", "jpeg", "png"]
                        .into_iter()
                        .find(|ext| path.ends_with(&format!(".{ext}")))
                        .map(String::from)
                })
                .unwrap_or_else(|| FIXED_EXTENSION.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.grayscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GrayscoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Load the application config. Returns defaults if no config file exists.
///
/// `./grayscout.toml` takes precedence over `~/.grayscout/grayscout.toml`.
pub fn load_config() -> Result<AppConfig> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    if let Ok(dir) = config_dir() {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            return load_config_from(&path);
        }
    }

    tracing::debug!("config file not found, using defaults");
    Ok(AppConfig::default())
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GrayscoutError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GrayscoutError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Read the API key from the first line of the credential file.
pub fn read_api_key(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GrayscoutError::config(format!(
            "API key file {} is missing or unreadable: {e}",
            path.display()
        ))
    })?;

    let key = content.lines().next().unwrap_or("").trim();
    if key.is_empty() {
        return Err(GrayscoutError::config(format!(
            "API key file {} is empty",
            path.display()
        )));
    }

    Ok(key.to_string())
}
