use std::sync::Arc;

use crate::{Res, management::KeyValueStore};

pub const ACCESS_TOKEN_KEY: &str = "spotify_access_token";
pub const CODE_VERIFIER_KEY: &str = "spotify_code_verifier";

/// Persisted OAuth session: the access token and the pending PKCE verifier.
///
/// There is no refresh token and no expiry tracking. A token stays until
/// logout; a rejected token surfaces as an API error and the user logs in
/// again.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn KeyValueStore>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        TokenManager { store }
    }

    pub async fn access_token(&self) -> Res<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn persist_token(&self, token: &str) -> Res<()> {
        self.store.set(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn discard_token(&self) -> Res<()> {
        self.store.remove(ACCESS_TOKEN_KEY).await
    }

    pub async fn code_verifier(&self) -> Res<Option<String>> {
        self.store.get(CODE_VERIFIER_KEY).await
    }

    pub async fn persist_verifier(&self, verifier: &str) -> Res<()> {
        self.store.set(CODE_VERIFIER_KEY, verifier).await
    }

    pub async fn discard_verifier(&self) -> Res<()> {
        self.store.remove(CODE_VERIFIER_KEY).await
    }

    /// Clears both the token and any leftover verifier.
    pub async fn clear(&self) -> Res<()> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(CODE_VERIFIER_KEY).await
    }
}
