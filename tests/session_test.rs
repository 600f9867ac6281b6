use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use url::Url;
use vibesync::{
    Error, Res,
    gemini::Curator,
    management::{CODE_VERIFIER_KEY, HISTORY_KEY, HISTORY_LIMIT, KeyValueStore, MemoryStore},
    session::{Session, SyncOutcome},
    spotify::{
        SpotifyApi,
        auth::{AuthState, SpotifyAuth},
    },
    types::{
        AppStatus, CreatePlaylistRequest, CreatePlaylistResponse, ExternalUrls, GenerationResult,
        PlaylistPreferences, SpotifyUser, TokenRequest, TokenResponse, Track,
    },
    utils,
};

const REDIRECT: &str = "http://localhost:8888/callback/";

fn track(title: &str, artist: &str) -> Track {
    Track {
        id: title.to_lowercase(),
        title: title.to_string(),
        artist: artist.to_string(),
        album: None,
        popularity_score: 50.0,
        reason: "because".to_string(),
        genre: "Synthwave".to_string(),
        duration: None,
        spotify_uri: None,
    }
}

fn generation(name: &str, tracks: Vec<Track>) -> GenerationResult {
    GenerationResult {
        tracks,
        playlist_name: name.to_string(),
        playlist_description: format!("{name} description"),
        cover_image: None,
        timestamp: 0,
    }
}

struct FakeCurator {
    result: Mutex<Option<GenerationResult>>,
    cover: String,
    calls: Mutex<usize>,
}

impl FakeCurator {
    fn new(result: Option<GenerationResult>, cover: &str) -> Self {
        Self {
            result: Mutex::new(result),
            cover: cover.to_string(),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Curator for FakeCurator {
    async fn generate_recommendations(&self, _: &PlaylistPreferences) -> Res<GenerationResult> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        match self.result.lock().unwrap().clone() {
            Some(mut result) => {
                result.timestamp = *calls as i64;
                Ok(result)
            }
            None => Err(Error::Generation("model returned an empty response".into())),
        }
    }

    async fn generate_cover_image(&self, _: &str, _: &str) -> String {
        self.cover.clone()
    }
}

#[derive(Default)]
struct FakeSpotify {
    calls: Mutex<Vec<String>>,
    matches: HashMap<String, String>,
    token_response: Option<TokenResponse>,
    exchange_requests: Mutex<Vec<TokenRequest>>,
    uploaded_cover: Mutex<Option<String>>,
    added: Mutex<Vec<String>>,
    fail_cover: bool,
}

impl FakeSpotify {
    fn with_matches(pairs: &[(&str, &str)]) -> Self {
        Self {
            matches: pairs
                .iter()
                .map(|(title, uri)| (title.to_string(), uri.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    async fn exchange_code(&self, request: &TokenRequest) -> Res<TokenResponse> {
        self.record("exchange");
        self.exchange_requests.lock().unwrap().push(request.clone());
        self.token_response
            .clone()
            .ok_or_else(|| Error::Auth("connection refused".into()))
    }

    async fn fetch_profile(&self, token: &str) -> Res<SpotifyUser> {
        self.record("profile");
        match token {
            "good-token" => {}
            "flaky-token" => return Err(Error::Export("connection reset by peer".into())),
            _ => return Err(Error::Auth("access token rejected".into())),
        }
        Ok(SpotifyUser {
            id: "user-1".to_string(),
            display_name: Some("Test User".to_string()),
            images: Vec::new(),
        })
    }

    async fn search_track(&self, _: &str, title: &str, _: &str) -> Res<Option<String>> {
        self.record("search");
        Ok(self.matches.get(title).cloned())
    }

    async fn create_playlist(
        &self,
        _: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<CreatePlaylistResponse> {
        self.record("create");
        assert_eq!(user_id, "user-1");
        assert!(!request.public);
        Ok(CreatePlaylistResponse {
            id: "pl-1".to_string(),
            name: request.name.clone(),
            external_urls: ExternalUrls {
                spotify: Some("https://open.spotify.com/playlist/pl-1".to_string()),
            },
        })
    }

    async fn add_tracks(&self, _: &str, playlist_id: &str, uris: &[String]) -> Res<()> {
        self.record("add");
        assert_eq!(playlist_id, "pl-1");
        self.added.lock().unwrap().extend(uris.iter().cloned());
        Ok(())
    }

    async fn upload_cover(&self, _: &str, _: &str, jpeg_base64: &str) -> Res<()> {
        self.record("cover");
        if self.fail_cover {
            return Err(Error::Export("Cover upload failed with 413".into()));
        }
        *self.uploaded_cover.lock().unwrap() = Some(jpeg_base64.to_string());
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    spotify: Arc<FakeSpotify>,
    session: Session,
}

async fn harness(curator: FakeCurator, spotify: FakeSpotify, client_id: Option<&str>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let spotify = Arc::new(spotify);
    let auth = Arc::new(SpotifyAuth::new(
        client_id.map(str::to_string),
        REDIRECT,
        store.clone(),
        spotify.clone(),
    ));
    let session = Session::open(store.clone(), Arc::new(curator), spotify.clone(), auth)
        .await
        .unwrap();
    Harness {
        store,
        spotify,
        session,
    }
}

fn four_tracks() -> Vec<Track> {
    vec![
        track("Nightcall", "Kavinsky"),
        track("Unknown One", "Nobody"),
        track("Resonance", "HOME"),
        track("Unknown Two", "Nobody"),
    ]
}

#[tokio::test]
async fn test_generate_merges_cover_and_records_history() {
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "AAAA");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;

    let result = h.session.generate(&PlaylistPreferences::default()).await.unwrap();
    assert_eq!(result.cover_image.as_deref(), Some("AAAA"));
    assert_eq!(h.session.status(), AppStatus::Success);
    assert_eq!(h.session.history().len(), 1);
    assert_eq!(h.session.current().unwrap().playlist_name, "Neon Rain");
}

#[tokio::test]
async fn test_generate_without_cover_is_still_success() {
    let curator = FakeCurator::new(Some(generation("Dust", four_tracks())), "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;

    let result = h.session.generate(&PlaylistPreferences::default()).await.unwrap();
    assert!(result.cover_image.is_none());
    assert!(!result.has_cover());
    assert_eq!(h.session.status(), AppStatus::Success);
    assert!(h.session.error_message().is_none());
}

#[tokio::test]
async fn test_generate_failure_is_reported_and_retryable() {
    let curator = FakeCurator::new(None, "AAAA");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;

    let err = h
        .session
        .generate(&PlaylistPreferences::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
    assert_eq!(h.session.status(), AppStatus::Error);
    assert!(h.session.error_message().unwrap().contains("empty response"));
    assert!(h.session.history().is_empty());
    assert!(h.session.current().is_none());
}

#[tokio::test]
async fn test_history_keeps_ten_most_recent() {
    let curator = FakeCurator::new(Some(generation("Loop", four_tracks())), "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;

    for _ in 0..12 {
        h.session.generate(&PlaylistPreferences::default()).await.unwrap();
    }

    let stamps: Vec<i64> = h.session.history().iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps.len(), HISTORY_LIMIT);
    assert_eq!(stamps, (3..=12).rev().collect::<Vec<i64>>());

    let replayed = h.session.load_from_history(9).unwrap();
    assert_eq!(replayed.timestamp, 3);
    assert!(h.session.load_from_history(10).is_none());
}

#[tokio::test]
async fn test_sync_without_token_starts_login() {
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;
    h.session.generate(&PlaylistPreferences::default()).await.unwrap();

    let outcome = h.session.sync_to_spotify(|_| {}).await.unwrap();
    let SyncOutcome::LoginRequired(url) = outcome else {
        panic!("expected a login redirect");
    };

    assert_eq!(url.host_str(), Some("accounts.spotify.com"));
    assert_eq!(
        h.session.auth().state().await.unwrap(),
        AuthState::Pending
    );
    assert!(h.spotify.calls().is_empty());
}

#[tokio::test]
async fn test_sync_reports_progress_and_skips_misses() {
    let spotify = FakeSpotify::with_matches(&[
        ("Nightcall", "spotify:track:1"),
        ("Resonance", "spotify:track:3"),
    ]);
    let curator = FakeCurator::new(
        Some(generation("Neon Rain", four_tracks())),
        "data:image/jpeg;base64,QUJD",
    );
    let mut h = harness(curator, spotify, Some("client")).await;
    h.store.set("spotify_access_token", "good-token").await.unwrap();
    h.session.generate(&PlaylistPreferences::default()).await.unwrap();

    let mut progress = Vec::new();
    let outcome = h
        .session
        .sync_to_spotify(|p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(progress, vec![25, 50, 75, 100]);
    let SyncOutcome::Exported(report) = outcome else {
        panic!("expected an export");
    };
    assert_eq!(report.playlist_url, "https://open.spotify.com/playlist/pl-1");
    assert_eq!(report.matched, 2);
    assert_eq!(report.total, 4);

    assert_eq!(
        h.spotify.calls(),
        vec!["profile", "search", "search", "search", "search", "create", "add", "cover"]
    );
    assert_eq!(
        *h.spotify.added.lock().unwrap(),
        vec!["spotify:track:1", "spotify:track:3"]
    );
    assert_eq!(h.spotify.uploaded_cover.lock().unwrap().as_deref(), Some("QUJD"));

    let current = h.session.current().unwrap();
    assert_eq!(current.tracks[0].spotify_uri.as_deref(), Some("spotify:track:1"));
    assert_eq!(current.tracks[1].spotify_uri, None);
    assert_eq!(h.session.status(), AppStatus::Success);
}

#[tokio::test]
async fn test_sync_with_no_matches_creates_nothing() {
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;
    h.store.set("spotify_access_token", "good-token").await.unwrap();
    h.session.generate(&PlaylistPreferences::default()).await.unwrap();

    let mut progress = Vec::new();
    let err = h
        .session
        .sync_to_spotify(|p| progress.push(p))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoTracksFound));
    assert_eq!(progress, vec![25, 50, 75, 100]);
    assert!(!h.spotify.calls().contains(&"create".to_string()));
    assert_eq!(h.session.status(), AppStatus::Error);
}

#[tokio::test]
async fn test_cover_upload_failure_is_swallowed() {
    let spotify = FakeSpotify {
        fail_cover: true,
        ..FakeSpotify::with_matches(&[("Nightcall", "spotify:track:1")])
    };
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "QUJD");
    let mut h = harness(curator, spotify, Some("client")).await;
    h.store.set("spotify_access_token", "good-token").await.unwrap();
    h.session.generate(&PlaylistPreferences::default()).await.unwrap();

    let outcome = h.session.sync_to_spotify(|_| {}).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Exported(_)));
    assert!(h.spotify.calls().contains(&"cover".to_string()));
}

#[tokio::test]
async fn test_sync_without_result_is_rejected() {
    let curator = FakeCurator::new(None, "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;
    h.store.set("spotify_access_token", "good-token").await.unwrap();

    let err = h.session.sync_to_spotify(|_| {}).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(h.spotify.calls(), vec!["profile"]);
}

#[tokio::test]
async fn test_login_requires_client_id() {
    for client_id in [None, Some(""), Some("YOUR_SPOTIFY_CLIENT_ID")] {
        let h = harness(FakeCurator::new(None, ""), FakeSpotify::default(), client_id).await;

        let err = h.session.auth().login().await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(h.store.get(CODE_VERIFIER_KEY).await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_login_builds_authorize_url() {
    let h = harness(FakeCurator::new(None, ""), FakeSpotify::default(), Some("client-abc")).await;

    let url = h.session.auth().login().await.unwrap();
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    let verifier = h.store.get(CODE_VERIFIER_KEY).await.unwrap().unwrap();

    assert_eq!(url.path(), "/authorize");
    assert_eq!(params["client_id"], "client-abc");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8888/callback");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["code_challenge"], utils::generate_code_challenge(&verifier));
    assert!(params["scope"].contains("playlist-modify-private"));
    assert!(params["scope"].contains("ugc-image-upload"));
    assert!(params["scope"].contains("user-read-private"));

    // every attempt gets a fresh verifier
    h.session.auth().login().await.unwrap();
    let second = h.store.get(CODE_VERIFIER_KEY).await.unwrap().unwrap();
    assert_ne!(verifier, second);
}

#[tokio::test]
async fn test_callback_without_code_or_verifier_skips_network() {
    let spotify = FakeSpotify {
        token_response: Some(TokenResponse {
            access_token: Some("good-token".into()),
            ..TokenResponse::default()
        }),
        ..FakeSpotify::default()
    };
    let h = harness(FakeCurator::new(None, ""), spotify, Some("client")).await;
    let auth = h.session.auth();

    // verifier stored but no code
    auth.login().await.unwrap();
    let no_code = Url::parse("http://127.0.0.1:8888/callback?state=x").unwrap();
    assert_eq!(auth.handle_callback(&no_code).await, None);

    // code present but no verifier
    auth.logout().await.unwrap();
    let with_code = Url::parse("http://127.0.0.1:8888/callback?code=abc").unwrap();
    assert_eq!(auth.handle_callback(&with_code).await, None);

    assert!(h.spotify.calls().is_empty());
}

#[tokio::test]
async fn test_callback_exchanges_code_once() {
    let spotify = FakeSpotify {
        token_response: Some(TokenResponse {
            access_token: Some("good-token".into()),
            ..TokenResponse::default()
        }),
        ..FakeSpotify::default()
    };
    let h = harness(FakeCurator::new(None, ""), spotify, Some("client")).await;
    let auth = h.session.auth();

    auth.login().await.unwrap();
    let verifier = h.store.get(CODE_VERIFIER_KEY).await.unwrap().unwrap();

    let location = Url::parse("http://127.0.0.1:8888/callback?code=abc").unwrap();
    assert_eq!(auth.handle_callback(&location).await.as_deref(), Some("good-token"));
    assert_eq!(auth.access_token().await.as_deref(), Some("good-token"));
    assert_eq!(auth.state().await.unwrap(), AuthState::Authenticated);
    assert_eq!(h.store.get(CODE_VERIFIER_KEY).await.unwrap(), None);

    let requests = h.spotify.exchange_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].grant_type, "authorization_code");
    assert_eq!(requests[0].code, "abc");
    assert_eq!(requests[0].client_id, "client");
    assert_eq!(requests[0].code_verifier, verifier);
    assert_eq!(requests[0].redirect_uri, "http://127.0.0.1:8888/callback");

    // replaying the same location cannot exchange again
    assert_eq!(auth.handle_callback(&location).await, None);
    assert_eq!(h.spotify.calls(), vec!["exchange"]);
}

#[tokio::test]
async fn test_callback_failures_discard_verifier() {
    let logical_error = FakeSpotify {
        token_response: Some(TokenResponse {
            error: Some("invalid_grant".into()),
            ..TokenResponse::default()
        }),
        ..FakeSpotify::default()
    };
    // no token_response means the exchange itself fails
    let transport_error = FakeSpotify::default();

    for spotify in [logical_error, transport_error] {
        let h = harness(FakeCurator::new(None, ""), spotify, Some("client")).await;
        let auth = h.session.auth();
        auth.login().await.unwrap();

        let location = Url::parse("http://127.0.0.1:8888/callback?code=abc").unwrap();
        assert_eq!(auth.handle_callback(&location).await, None);
        assert_eq!(h.store.get(CODE_VERIFIER_KEY).await.unwrap(), None);
        assert_eq!(auth.state().await.unwrap(), AuthState::Unauthenticated);
    }
}

#[tokio::test]
async fn test_logout_clears_session() {
    let h = harness(FakeCurator::new(None, ""), FakeSpotify::default(), Some("client")).await;
    let mut session = h.session;
    h.store.set("spotify_access_token", "good-token").await.unwrap();
    session.auth().login().await.unwrap();

    assert_eq!(
        session.refresh_user().await.unwrap().unwrap().name(),
        "Test User"
    );
    session.logout().await.unwrap();

    assert!(session.user().is_none());
    assert_eq!(
        session.auth().state().await.unwrap(),
        AuthState::Unauthenticated
    );
}

#[tokio::test]
async fn test_rejected_token_means_no_user() {
    let mut h = harness(FakeCurator::new(None, ""), FakeSpotify::default(), Some("client")).await;
    h.store.set("spotify_access_token", "expired").await.unwrap();

    assert!(h.session.refresh_user().await.unwrap().is_none());
    assert_eq!(h.session.auth().access_token().await, None);
}

#[tokio::test]
async fn test_sync_with_expired_token_drops_it_and_starts_login() {
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;
    h.store.set("spotify_access_token", "expired").await.unwrap();
    h.session.generate(&PlaylistPreferences::default()).await.unwrap();

    let outcome = h.session.sync_to_spotify(|_| {}).await.unwrap();

    assert!(matches!(outcome, SyncOutcome::LoginRequired(_)));
    assert_eq!(h.session.auth().access_token().await, None);
    assert_eq!(
        h.session.auth().state().await.unwrap(),
        AuthState::Pending
    );
    assert_eq!(h.spotify.calls(), vec!["profile"]);
}

#[tokio::test]
async fn test_sync_with_unreachable_profile_keeps_token() {
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "");
    let mut h = harness(curator, FakeSpotify::default(), Some("client")).await;
    h.store.set("spotify_access_token", "flaky-token").await.unwrap();
    h.session.generate(&PlaylistPreferences::default()).await.unwrap();

    let err = h.session.sync_to_spotify(|_| {}).await.unwrap_err();

    assert!(matches!(err, Error::Export(_)));
    assert_eq!(
        h.session.auth().access_token().await.as_deref(),
        Some("flaky-token")
    );
    assert_eq!(h.store.get(CODE_VERIFIER_KEY).await.unwrap(), None);
}

/// Store that accepts everything except history writes.
struct NoHistoryStore(MemoryStore);

#[async_trait]
impl KeyValueStore for NoHistoryStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        if key == HISTORY_KEY {
            return Err(Error::Store("disk full".into()));
        }
        self.0.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Res<()> {
        self.0.remove(key).await
    }
}

#[tokio::test]
async fn test_generate_reports_unsaved_history() {
    let store: Arc<dyn KeyValueStore> = Arc::new(NoHistoryStore(MemoryStore::new()));
    let spotify = Arc::new(FakeSpotify::default());
    let auth = Arc::new(SpotifyAuth::new(
        Some("client".into()),
        REDIRECT,
        Arc::clone(&store),
        spotify.clone(),
    ));
    let curator = FakeCurator::new(Some(generation("Neon Rain", four_tracks())), "");
    let mut session = Session::open(store, Arc::new(curator), spotify, auth)
        .await
        .unwrap();

    let err = session
        .generate(&PlaylistPreferences::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(_)));
    assert_eq!(session.status(), AppStatus::Error);
    assert!(session.error_message().unwrap().contains("disk full"));
    assert!(session.history().is_empty());
    assert_eq!(session.current().unwrap().playlist_name, "Neon Rain");
}

#[tokio::test]
async fn test_wait_for_login_settles() {
    let short = Duration::from_millis(200);
    let tick = Duration::from_millis(10);

    // a failed exchange ends the wait without a token
    let h = harness(FakeCurator::new(None, ""), FakeSpotify::default(), Some("client")).await;
    let auth = h.session.auth();
    auth.login().await.unwrap();
    let location = Url::parse("http://127.0.0.1:8888/callback?code=abc").unwrap();
    assert_eq!(auth.handle_callback(&location).await, None);

    let started = Instant::now();
    let waited = auth.wait_for_login(Duration::from_secs(30), tick).await;
    assert_eq!(waited, AuthState::Unauthenticated);
    assert!(started.elapsed() < Duration::from_secs(5));

    // nobody answers the browser
    auth.login().await.unwrap();
    assert_eq!(auth.wait_for_login(short, tick).await, AuthState::Pending);

    // a successful exchange
    let spotify = FakeSpotify {
        token_response: Some(TokenResponse {
            access_token: Some("good-token".into()),
            ..TokenResponse::default()
        }),
        ..FakeSpotify::default()
    };
    let h = harness(FakeCurator::new(None, ""), spotify, Some("client")).await;
    let auth = h.session.auth();
    auth.login().await.unwrap();
    auth.handle_callback(&location).await.unwrap();
    assert_eq!(
        auth.wait_for_login(short, tick).await,
        AuthState::Authenticated
    );
}
