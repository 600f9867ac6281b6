//! Error types for vibesync.
//!
//! Errors are grouped by the step that produced them so callers can decide
//! what is fatal. Cover generation and cover upload never surface here; they
//! degrade to "no cover" inside their clients.

use thiserror::Error;

/// Main error type for vibesync.
#[derive(Error, Debug)]
pub enum Error {
    /// A required credential or setting is missing. Raised before any
    /// network call is attempted.
    #[error("Configuration missing: {0}")]
    Configuration(String),

    /// The model call failed or returned something that does not match the
    /// requested schema.
    #[error("Track generation failed: {0}")]
    Generation(String),

    #[error("Spotify authentication failed: {0}")]
    Auth(String),

    #[error("Spotify export failed: {0}")]
    Export(String),

    #[error("No tracks found on Spotify.")]
    NoTracksFound,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// Returns true for failures the user can fix by editing `.env`.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
