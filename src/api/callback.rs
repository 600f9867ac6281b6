use std::sync::Arc;

use axum::{
    Extension,
    extract::RawQuery,
    response::{Html, IntoResponse, Redirect, Response},
};
use url::Url;

use crate::{Res, spotify::auth::SpotifyAuth, utils};

/// Rebuilds the browser's location from the redirect URI and the raw query.
pub fn callback_location(redirect_uri: &str, query: Option<&str>) -> Res<Url> {
    let mut location = Url::parse(redirect_uri)?;
    location.set_query(query.filter(|q| !q.is_empty()));
    Ok(location)
}

/// OAuth redirect target.
///
/// A request carrying `code` runs the exchange once. On success the browser is
/// redirected to the same location without `code`, so a reload shows the
/// result page instead of exchanging again.
pub async fn callback(
    RawQuery(query): RawQuery,
    Extension(auth): Extension<Arc<SpotifyAuth>>,
) -> Response {
    let Ok(location) = callback_location(auth.redirect_uri(), query.as_deref()) else {
        return Html("<h4>Invalid callback URL.</h4>").into_response();
    };

    let param = |name: &str| {
        location
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if param("code").is_some() {
        return match auth.handle_callback(&location).await {
            Some(_) => {
                let clean = utils::strip_authorization_code(&location);
                Redirect::to(clean.as_str()).into_response()
            }
            None => Html("<h4>Login failed.</h4><p>Run vibesync auth again.</p>").into_response(),
        };
    }

    if param("error").is_some() {
        return Html("<h4>Spotify authorization was denied.</h4>").into_response();
    }

    if auth.access_token().await.is_some() {
        Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>").into_response()
    } else {
        Html("<h4>Missing authorization code.</h4>").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_location() {
        let loc = callback_location("http://127.0.0.1:8888/callback", Some("code=abc&x=1")).unwrap();
        assert_eq!(loc.as_str(), "http://127.0.0.1:8888/callback?code=abc&x=1");

        let loc = callback_location("http://127.0.0.1:8888/callback", Some("")).unwrap();
        assert_eq!(loc.query(), None);
    }
}
