//! # Spotify Integration Module
//!
//! This module is the integration layer between vibesync and the Spotify Web
//! API. It covers the OAuth 2.0 PKCE login and the handful of REST calls the
//! playlist export needs.
//!
//! ## Architecture
//!
//! ```text
//! Session (orchestration)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (OAuth 2.0 PKCE)    auth::SpotifyAuth
//!     └── Playlist Export (search, create)   playlist::export
//!          ↓
//! SpotifyApi trait ── SpotifyClient (reqwest, JSON)
//!          ↓
//! Spotify Accounts service / Web API
//! ```
//!
//! ## PKCE Flow
//! 1. **Code Verifier Generation**: 128 random alphanumeric characters
//! 2. **Challenge Creation**: base64url(SHA-256(verifier)) without padding
//! 3. **Authorization Request**: the user's browser is sent to Spotify
//! 4. **Local Callback**: the redirect lands on the local callback server
//! 5. **Token Exchange**: code + verifier are exchanged for an access token
//! 6. **Token Storage**: the token is persisted; the verifier is discarded
//!
//! There is no refresh token handling. When the token is rejected the user
//! logs in again.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - authorization-code exchange
//! - `GET /me` - profile of the authenticated user
//! - `GET /search` - one track lookup per recommendation
//! - `POST /users/{user_id}/playlists` - create the playlist
//! - `POST /playlists/{playlist_id}/tracks` - add matched tracks
//! - `PUT /playlists/{playlist_id}/images` - upload the cover
//!
//! ## Error Types
//!
//! Every call returns [`crate::Res`]. Non-success statuses become
//! [`crate::Error::Export`] with the status and Spotify's message. A rejected
//! token on `/me` is [`crate::Error::Auth`]. The token exchange returns its
//! error body to the caller as data.

pub mod auth;
pub mod playlist;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header::CONTENT_TYPE};

use crate::{
    Error, Res, config,
    types::{
        AddTrackToPlaylistRequest, CreatePlaylistRequest, CreatePlaylistResponse, SearchResponse,
        SpotifyUser, TokenRequest, TokenResponse,
    },
};

/// Tracks per "add items" call; Spotify's documented maximum.
pub const ADD_TRACKS_BATCH: usize = 100;

/// REST surface used by the auth client and the exporter.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Exchanges an authorization code. A logical token-endpoint error comes
    /// back as `Ok` with `error` set; only transport failures are `Err`.
    async fn exchange_code(&self, request: &TokenRequest) -> Res<TokenResponse>;

    async fn fetch_profile(&self, token: &str) -> Res<SpotifyUser>;

    /// URI of the first match for `track:<title> artist:<artist>`, if any.
    async fn search_track(&self, token: &str, title: &str, artist: &str) -> Res<Option<String>>;

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<CreatePlaylistResponse>;

    async fn add_tracks(&self, token: &str, playlist_id: &str, uris: &[String]) -> Res<()>;

    /// Uploads a base64-encoded JPEG as the playlist cover.
    async fn upload_cover(&self, token: &str, playlist_id: &str, jpeg_base64: &str) -> Res<()>;
}

#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_url: String,
}

impl SpotifyClient {
    pub fn new(api_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::spotify_api_url(), config::spotify_token_url())
    }
}

/// Turns non-success statuses into [`Error::Export`] with Spotify's message.
async fn check_status(response: Response, action: &str) -> Res<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    Err(Error::Export(format!("{action} failed with {status}: {message}")))
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn exchange_code(&self, request: &TokenRequest) -> Res<TokenResponse> {
        let res = self.http.post(&self.token_url).form(request).send().await?;
        let body = res.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| TokenResponse {
            error: Some("invalid_response".to_string()),
            error_description: Some(body),
            ..TokenResponse::default()
        }))
    }

    async fn fetch_profile(&self, token: &str) -> Res<SpotifyUser> {
        let api_url = format!("{uri}/me", uri = self.api_url);
        let response = self.http.get(&api_url).bearer_auth(token).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth("access token rejected".into()));
        }
        let response = check_status(response, "Profile fetch").await?;
        Ok(response.json::<SpotifyUser>().await?)
    }

    async fn search_track(&self, token: &str, title: &str, artist: &str) -> Res<Option<String>> {
        let api_url = format!("{uri}/search", uri = self.api_url);
        let query = format!("track:{title} artist:{artist}");
        let response = self
            .http
            .get(&api_url)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response, "Track search").await?;
        let json = response.json::<SearchResponse>().await?;

        Ok(json
            .tracks
            .and_then(|t| t.items.into_iter().next())
            .map(|t| t.uri))
    }

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<CreatePlaylistResponse> {
        let api_url = format!(
            "{uri}/users/{user_id}/playlists",
            uri = self.api_url,
            user_id = user_id
        );
        let response = self
            .http
            .post(&api_url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        let response = check_status(response, "Playlist creation").await?;
        Ok(response.json::<CreatePlaylistResponse>().await?)
    }

    async fn add_tracks(&self, token: &str, playlist_id: &str, uris: &[String]) -> Res<()> {
        let api_url = format!(
            "{uri}/playlists/{playlist_id}/tracks",
            uri = self.api_url,
            playlist_id = playlist_id
        );
        let body = AddTrackToPlaylistRequest {
            uris: uris.to_vec(),
        };
        let response = self
            .http
            .post(&api_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response, "Adding tracks").await?;
        Ok(())
    }

    async fn upload_cover(&self, token: &str, playlist_id: &str, jpeg_base64: &str) -> Res<()> {
        let api_url = format!(
            "{uri}/playlists/{playlist_id}/images",
            uri = self.api_url,
            playlist_id = playlist_id
        );
        let response = self
            .http
            .put(&api_url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "image/jpeg")
            .body(jpeg_base64.to_string())
            .send()
            .await?;
        check_status(response, "Cover upload").await?;
        Ok(())
    }
}
