use std::{sync::Arc, time::Duration};

use url::Url;

use crate::{
    cli::open_session,
    error, info,
    server::start_api_server,
    spotify::auth::{AuthState, SpotifyAuth},
    success, warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);
const LOGIN_POLL: Duration = Duration::from_secs(1);
const PAGE_GRACE: Duration = Duration::from_millis(500);

pub async fn auth() {
    let session = match open_session().await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session. Err: {}", e),
    };
    let auth = Arc::clone(session.auth());

    // a stale token would satisfy the wait below immediately
    if let Err(e) = auth.logout().await {
        warning!("Cannot clear previous Spotify session: {}", e);
    }

    let auth_url = match auth.login().await {
        Ok(url) => url,
        Err(e) => error!("{}", e),
    };

    if login_in_browser(auth, auth_url).await {
        success!("Authentication successful!");
    } else {
        error!("Authentication failed or timed out.");
    }
}

/// Serves the callback, sends the browser to `auth_url` and waits until the
/// login succeeds, fails or times out.
pub(crate) async fn login_in_browser(auth: Arc<SpotifyAuth>, auth_url: Url) -> bool {
    let server_auth = Arc::clone(&auth);
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_auth).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    info!("Waiting for Spotify on {}", auth.redirect_uri());
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let state = auth.wait_for_login(LOGIN_TIMEOUT, LOGIN_POLL).await;
    // the store settles before the callback response is written
    tokio::time::sleep(PAGE_GRACE).await;
    server.abort();
    state == AuthState::Authenticated
}

pub async fn logout() {
    let mut session = match open_session().await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session. Err: {}", e),
    };

    match session.logout().await {
        Ok(()) => success!("Disconnected from Spotify."),
        Err(e) => error!("Failed to clear Spotify session. Err: {}", e),
    }
}

pub async fn whoami() {
    let mut session = match open_session().await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session. Err: {}", e),
    };

    match session.refresh_user().await {
        Ok(Some(user)) => {
            success!("Connected as {} ({})", user.name(), user.id);
            if let Some(avatar) = user.images.first() {
                info!("Avatar: {}", avatar.url);
            }
        }
        Ok(None) => warning!("Not connected to Spotify. Run vibesync auth."),
        Err(e) => error!("Cannot fetch Spotify profile. Err: {}", e),
    }
}
