use std::{sync::Arc, time::Duration};

use tokio::time::Instant;
use url::Url;

use crate::{
    Error, Res, config,
    management::{KeyValueStore, TokenManager},
    spotify::SpotifyApi,
    types::TokenRequest,
    utils, warning,
};

/// Client id value shipped in templates; treated as "not configured".
pub const PLACEHOLDER_CLIENT_ID: &str = "YOUR_SPOTIFY_CLIENT_ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// A verifier is stored and the browser was sent to Spotify.
    Pending,
    Authenticated,
}

/// OAuth 2.0 Authorization-Code-with-PKCE client.
///
/// All state lives in the [`KeyValueStore`]: the verifier between `login` and
/// the callback, and the access token afterwards. Cloning the `Arc` around
/// this struct is how the callback server and the CLI share it.
pub struct SpotifyAuth {
    client_id: Option<String>,
    redirect_uri: String,
    authorize_url: String,
    scope: String,
    tokens: TokenManager,
    api: Arc<dyn SpotifyApi>,
}

impl SpotifyAuth {
    pub fn new(
        client_id: Option<String>,
        redirect_uri: &str,
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn SpotifyApi>,
    ) -> Self {
        Self {
            client_id,
            redirect_uri: utils::redirect_uri(redirect_uri),
            authorize_url: config::DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            scope: config::SPOTIFY_SCOPE.to_string(),
            tokens: TokenManager::new(store),
            api,
        }
    }

    pub fn from_env(store: Arc<dyn KeyValueStore>, api: Arc<dyn SpotifyApi>) -> Self {
        let mut auth = Self::new(
            config::spotify_client_id(),
            &config::spotify_redirect_uri(),
            store,
            api,
        );
        auth.authorize_url = config::spotify_auth_url();
        auth
    }

    pub fn with_authorize_url(mut self, authorize_url: impl Into<String>) -> Self {
        self.authorize_url = authorize_url.into();
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn client_id(&self) -> Res<&str> {
        match self.client_id.as_deref() {
            Some(id) if !id.trim().is_empty() && id != PLACEHOLDER_CLIENT_ID => Ok(id),
            _ => Err(Error::Configuration(
                "Please set your Spotify client id (SPOTIFY_CLIENT_ID).".into(),
            )),
        }
    }

    /// Starts a login attempt and returns the URL the browser must open.
    ///
    /// A fresh verifier is generated and stored on every call, replacing any
    /// verifier left by an earlier attempt.
    pub async fn login(&self) -> Res<Url> {
        let client_id = self.client_id()?;

        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);

        self.tokens.persist_verifier(&code_verifier).await?;

        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", client_id),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge.as_str()),
                ("scope", self.scope.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Completes the exchange for a callback `location` carrying `?code=`.
    ///
    /// Returns `None` without any network call when the code or the stored
    /// verifier is missing. The verifier is discarded after every exchange
    /// attempt, whatever its outcome, so a code can never be retried with it.
    pub async fn handle_callback(&self, location: &Url) -> Option<String> {
        let code = location
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .filter(|c| !c.is_empty())?;

        let code_verifier = match self.tokens.code_verifier().await {
            Ok(Some(v)) => v,
            Ok(None) => return None,
            Err(e) => {
                warning!("Cannot read PKCE verifier: {}", e);
                return None;
            }
        };

        let client_id = match self.client_id() {
            Ok(id) => id.to_string(),
            Err(e) => {
                warning!("{}", e);
                return None;
            }
        };

        let request = TokenRequest {
            client_id,
            grant_type: "authorization_code".to_string(),
            code,
            redirect_uri: self.redirect_uri.clone(),
            code_verifier,
        };

        let exchange = self.api.exchange_code(&request).await;

        if let Err(e) = self.tokens.discard_verifier().await {
            warning!("Cannot discard PKCE verifier: {}", e);
        }

        match exchange {
            Ok(response) => match response.access_token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    if let Err(e) = self.tokens.persist_token(&token).await {
                        warning!("Failed to save token: {}", e);
                        return None;
                    }
                    Some(token)
                }
                None => {
                    warning!(
                        "Spotify token error: {} {}",
                        response.error.unwrap_or_default(),
                        response.error_description.unwrap_or_default()
                    );
                    None
                }
            },
            Err(e) => {
                warning!("Token exchange failed: {}", e);
                None
            }
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        match self.tokens.access_token().await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warning!("Cannot read access token: {}", e);
                None
            }
        }
    }

    pub async fn state(&self) -> Res<AuthState> {
        if self.tokens.access_token().await?.is_some() {
            return Ok(AuthState::Authenticated);
        }
        if self.tokens.code_verifier().await?.is_some() {
            return Ok(AuthState::Pending);
        }
        Ok(AuthState::Unauthenticated)
    }

    /// Forgets an access token Spotify no longer accepts.
    pub async fn discard_token(&self) -> Res<()> {
        self.tokens.discard_token().await
    }

    /// Polls the store until a pending login settles or `timeout` passes.
    ///
    /// Returns [`AuthState::Authenticated`] once a token appears and
    /// [`AuthState::Unauthenticated`] as soon as the verifier is gone without a
    /// token, which is what a failed exchange leaves behind. A login still in
    /// flight at the deadline returns [`AuthState::Pending`].
    pub async fn wait_for_login(&self, timeout: Duration, interval: Duration) -> AuthState {
        let start = Instant::now();

        loop {
            match self.state().await {
                Ok(AuthState::Pending) => {}
                Ok(settled) => return settled,
                Err(e) => warning!("Cannot read login state: {}", e),
            }
            if start.elapsed() >= timeout {
                return AuthState::Pending;
            }
            tokio::time::sleep(interval).await;
        }
    }

    pub async fn logout(&self) -> Res<()> {
        self.tokens.clear().await
    }
}
