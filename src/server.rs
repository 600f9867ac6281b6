use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::net::TcpListener;
use url::Url;

use crate::{Error, Res, api, spotify::auth::SpotifyAuth};

/// Router with the callback mounted on the redirect URI's path.
pub fn router(auth: Arc<SpotifyAuth>) -> Res<Router> {
    let redirect = Url::parse(auth.redirect_uri())?;
    let callback_path = match redirect.path() {
        "" => "/".to_string(),
        path => path.to_string(),
    };

    Ok(Router::new()
        .route("/health", get(api::health))
        .route(&callback_path, get(api::callback))
        .layer(Extension(auth)))
}

/// Socket address the redirect URI points at.
pub fn callback_addr(redirect_uri: &str) -> Res<SocketAddr> {
    let url = Url::parse(redirect_uri)?;
    url.socket_addrs(|| Some(80))?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Configuration(format!("cannot resolve {redirect_uri}")))
}

/// Serves the callback router until the task is dropped.
pub async fn start_api_server(auth: Arc<SpotifyAuth>) -> Res<()> {
    let addr = callback_addr(auth.redirect_uri())?;
    let app = router(auth)?;

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
