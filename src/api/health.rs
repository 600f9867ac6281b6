use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::spotify::auth::{AuthState, SpotifyAuth};

/// Liveness probe for the callback server, with the current login state.
pub async fn health(Extension(auth): Extension<Arc<SpotifyAuth>>) -> Json<Value> {
    let login = match auth.state().await {
        Ok(AuthState::Authenticated) => "authenticated",
        Ok(AuthState::Pending) => "pending",
        Ok(AuthState::Unauthenticated) => "unauthenticated",
        Err(_) => "unknown",
    };

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "login": login,
    }))
}
