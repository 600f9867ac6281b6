//! Configuration management for vibesync.
//!
//! This module handles loading and accessing configuration values from
//! environment variables and `.env` files. Credentials have no defaults and are
//! returned as `Option` so callers can fail with a configuration error before
//! touching the network. Endpoints and model names fall back to the public
//! service defaults.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::{Error, Res, utils};

pub const APP_DIR: &str = "vibesync";

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SPOTIFY_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// Scopes requested at login: playlist write, profile read and image upload.
pub const SPOTIFY_SCOPE: &str = "playlist-modify-public playlist-modify-private user-read-private user-read-email ugc-image-upload";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the `vibesync` data directory if it does not exist. A missing
/// `.env` file is not an error: every value can also come from the process
/// environment.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/vibesync/.env`
/// - macOS: `~/Library/Application Support/vibesync/.env`
/// - Windows: `%LOCALAPPDATA%/vibesync/.env`
///
/// # Errors
///
/// Returns an IO error if the data directory cannot be created.
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Configuration(format!("cannot parse {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Returns the platform data directory used for the `.env` file and the store.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the Gemini API key, if one is configured.
pub fn gemini_api_key() -> Option<String> {
    non_empty("GEMINI_API_KEY")
}

/// Returns the Gemini REST base URL.
pub fn gemini_api_url() -> String {
    non_empty("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string())
}

pub fn gemini_text_model() -> String {
    non_empty("GEMINI_TEXT_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_TEXT_MODEL.to_string())
}

pub fn gemini_image_model() -> String {
    non_empty("GEMINI_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_IMAGE_MODEL.to_string())
}

/// Returns the Spotify client id, if one is configured.
///
/// The client id is obtained when registering the application with
/// Spotify's developer platform. PKCE needs no client secret.
pub fn spotify_client_id() -> Option<String> {
    non_empty("SPOTIFY_CLIENT_ID")
}

/// Returns the OAuth redirect URI in the form Spotify accepts.
///
/// The configured value goes through [`utils::redirect_uri`], so
/// `http://localhost:8888/callback/` becomes `http://127.0.0.1:8888/callback`.
/// The same value must be registered in the Spotify application settings.
pub fn spotify_redirect_uri() -> String {
    let raw = non_empty("SPOTIFY_REDIRECT_URI")
        .unwrap_or_else(|| DEFAULT_SPOTIFY_REDIRECT_URI.to_string());
    utils::redirect_uri(&raw)
}

pub fn spotify_api_url() -> String {
    non_empty("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string())
}

pub fn spotify_auth_url() -> String {
    non_empty("SPOTIFY_AUTH_URL").unwrap_or_else(|| DEFAULT_SPOTIFY_AUTH_URL.to_string())
}

pub fn spotify_token_url() -> String {
    non_empty("SPOTIFY_TOKEN_URL").unwrap_or_else(|| DEFAULT_SPOTIFY_TOKEN_URL.to_string())
}
