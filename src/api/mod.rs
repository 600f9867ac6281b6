//! # API Module
//!
//! HTTP endpoints of the local server that vibesync runs while a Spotify
//! login is in progress.
//!
//! ## Endpoints
//!
//! - [`callback`] - OAuth redirect target. Completes the PKCE exchange and
//!   then redirects to the same location without the `code` parameter.
//!   Mounted on the path of the configured redirect URI.
//! - [`health`] - status, version and login state, used to check the server
//!   is up.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use vibesync::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health))
//!     .layer(Extension(auth));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use callback::callback_location;
pub use health::health;
