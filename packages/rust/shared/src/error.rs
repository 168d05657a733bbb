//! Error types for grayscout.
//!
//! Library crates use [`GrayscoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all grayscout operations.
#[derive(Debug, thiserror::Error)]
pub enum GrayscoutError {
    /// Configuration, credential file, or argument error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error on a generation call, probe, or download.
    #[error("transport error: {0}")]
    Transport(String),

    /// The generation endpoint answered with an unexpected body shape.
    #[error("response format error: {0}")]
    ResponseFormat(String),

    /// An image file could not be decoded.
    #[error("decode error at {path:?}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A grayscale image could not be encoded.
    #[error("encode error at {path:?}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// URL discovery gave up before collecting enough reachable URLs.
    #[error("discovery exhausted after {rounds} rounds: found {found} of {wanted} reachable URLs")]
    DiscoveryExhausted {
        found: usize,
        wanted: usize,
        rounds: u32,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GrayscoutError>;

impl GrayscoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a decode error for the image at `path`.
    pub fn decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an encode error for the image at `path`.
    pub fn encode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
