//! # CLI Module
//!
//! The command-line layer of vibesync. Each command wires the real clients
//! (Gemini, Spotify, file store) into a [`Session`] and presents progress and
//! results in the terminal.
//!
//! ## Commands
//!
//! - [`generate`] - curate tracks and a cover from taste sliders
//! - [`history`] - list past generations or show one of them
//! - [`export`] - export a generation to Spotify, logging in first if needed
//! - [`auth`] - run the Spotify PKCE login through the local callback server
//! - [`logout`] - forget the Spotify token
//! - [`whoami`] - show the connected Spotify account
//!
//! ## Layers
//!
//! ```text
//! CLI Layer (User Interface)
//!     ↓
//! Session (orchestration)
//!     ↓
//! Gemini / Spotify clients, management (persistence)
//!     ↓
//! Network Layer (HTTP Requests)
//! ```
//!
//! Library code reports recoverable trouble with `warning!`. Fatal errors
//! bubble up here and end the process through `error!`.

mod auth;
mod export;
mod generate;
mod history;

use std::sync::Arc;

pub use auth::auth;
pub use auth::logout;
pub use auth::whoami;
pub use export::export;
pub use generate::generate;
pub use history::history;

use crate::{
    Res,
    gemini::GeminiClient,
    management::{FileStore, KeyValueStore},
    session::Session,
    spotify::{SpotifyClient, auth::SpotifyAuth},
};

/// Opens a session backed by the on-disk store and the configured services.
pub(crate) async fn open_session() -> Res<Session> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::default_location());
    let api = Arc::new(SpotifyClient::from_env());
    let auth = Arc::new(SpotifyAuth::from_env(Arc::clone(&store), api.clone()));
    let curator = Arc::new(GeminiClient::from_env());

    Session::open(store, curator, api, auth).await
}
