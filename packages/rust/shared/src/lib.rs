//! Shared types, error model, and configuration for grayscout.
//!
//! This crate is the foundation depended on by all other grayscout crates.
//! It provides:
//! - [`GrayscoutError`] — the unified error type
//! - Domain types ([`ImageSlot`], [`ImageOutcome`], [`RunReport`])
//! - Configuration ([`AppConfig`], config loading, the credential file)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DiscoveryConfig, ExtensionPolicy, FetchConfig, GeminiConfig, OutputConfig,
    config_dir, load_config, load_config_from, read_api_key,
};
pub use error::{GrayscoutError, Result};
pub use types::{ImageOutcome, ImageSlot, RunReport};
