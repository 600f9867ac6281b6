//! vibesync library
//!
//! This library turns a handful of taste sliders into a curated playlist. It
//! asks Gemini for a track list and a cover image, keeps a short history of
//! results, and exports a result to Spotify through an OAuth PKCE login.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error type shared by every module
//! - `gemini` - Recommendation and cover-art clients
//! - `management` - Key-value store, token and history persistence
//! - `server` - Local HTTP server for OAuth callbacks
//! - `session` - Orchestration of generation and export
//! - `spotify` - Spotify Web API client, PKCE auth and playlist export
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers, URL helpers and small calculations
//!
//! # Example
//!
//! ```
//! use vibesync::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> vibesync::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod management;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

/// Result type used across the crate.
///
/// Every fallible operation returns this alias with [`Error`] so callers can
/// match on the failing step instead of inspecting strings.
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Asking Gemini for tracks...");
/// info!("Found {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// This macro terminates the process with exit code 1. Library code never
/// calls it; only the CLI layer does, once an error is known to be fatal.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems such as a skipped cover image.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
