//! Orchestration of one user's generation and export flow.
//!
//! [`Session`] owns the history and the current result and talks to the
//! outside world only through the [`Curator`], [`SpotifyApi`] and
//! [`KeyValueStore`] seams.

use std::sync::Arc;

use url::Url;

use crate::{
    Error, Res,
    gemini::Curator,
    management::{HistoryManager, KeyValueStore},
    spotify::{SpotifyApi, auth::SpotifyAuth, playlist},
    types::{AppStatus, ExportReport, GenerationResult, PlaylistPreferences, SpotifyUser},
    warning,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// No authenticated user; the browser must open this URL first.
    LoginRequired(Url),
    Exported(ExportReport),
}

pub struct Session {
    curator: Arc<dyn Curator>,
    api: Arc<dyn SpotifyApi>,
    auth: Arc<SpotifyAuth>,
    history: HistoryManager,
    current: Option<GenerationResult>,
    user: Option<SpotifyUser>,
    status: AppStatus,
    error_message: Option<String>,
}

impl Session {
    /// Builds a session and loads the persisted history.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        curator: Arc<dyn Curator>,
        api: Arc<dyn SpotifyApi>,
        auth: Arc<SpotifyAuth>,
    ) -> Res<Self> {
        let history = HistoryManager::load(store).await?;
        Ok(Self {
            curator,
            api,
            auth,
            history,
            current: None,
            user: None,
            status: AppStatus::Idle,
            error_message: None,
        })
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn current(&self) -> Option<&GenerationResult> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[GenerationResult] {
        self.history.entries()
    }

    pub fn user(&self) -> Option<&SpotifyUser> {
        self.user.as_ref()
    }

    pub fn auth(&self) -> &Arc<SpotifyAuth> {
        &self.auth
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = AppStatus::Error;
        self.error_message = Some(err.to_string());
        err
    }

    /// Generates tracks, then a best-effort cover, and records the result.
    ///
    /// Track generation errors are returned and leave the session in
    /// [`AppStatus::Error`], ready for another attempt. A missing cover is not
    /// an error. A history write failure is returned too, with the result
    /// already set as current.
    pub async fn generate(&mut self, prefs: &PlaylistPreferences) -> Res<&GenerationResult> {
        self.status = AppStatus::Generating;
        self.error_message = None;

        let mut result = match self.curator.generate_recommendations(prefs).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail(e)),
        };

        self.status = AppStatus::GeneratingImage;
        let cover = self
            .curator
            .generate_cover_image(&result.playlist_name, &result.playlist_description)
            .await;
        result.cover_image = (!cover.is_empty()).then_some(cover);

        if let Err(e) = self.history.push(result.clone()).await {
            // still shown and exportable in this run, just not saved
            self.current = Some(result);
            return Err(self.fail(e));
        }

        self.status = AppStatus::Success;
        Ok(&*self.current.insert(result))
    }

    /// Makes a history entry the current result.
    pub fn load_from_history(&mut self, index: usize) -> Option<&GenerationResult> {
        let entry = self.history.get(index)?.clone();
        self.status = AppStatus::Success;
        self.error_message = None;
        Some(&*self.current.insert(entry))
    }

    /// Fetches the Spotify profile once a token exists.
    ///
    /// A token Spotify rejects is dropped from the store and yields `None`, so
    /// the next login starts clean. Other failures are returned unchanged.
    pub async fn refresh_user(&mut self) -> Res<Option<&SpotifyUser>> {
        if self.user.is_none() {
            let Some(token) = self.auth.access_token().await else {
                return Ok(None);
            };
            match self.api.fetch_profile(&token).await {
                Ok(user) => self.user = Some(user),
                Err(Error::Auth(reason)) => {
                    warning!("Spotify rejected the stored token: {}", reason);
                    self.auth.discard_token().await?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.user.as_ref())
    }

    /// Exports the current result to Spotify.
    ///
    /// Without an authenticated user this starts a login and stops, returning
    /// the authorize URL. A profile fetch that fails for any reason other than
    /// a rejected token is returned as an error and starts no login. Otherwise
    /// the export runs to completion and the current tracks are annotated with
    /// their Spotify URIs.
    pub async fn sync_to_spotify<F>(&mut self, on_progress: F) -> Res<SyncOutcome>
    where
        F: FnMut(u8),
    {
        if self.refresh_user().await?.is_none() {
            return Ok(SyncOutcome::LoginRequired(self.auth.login().await?));
        }

        let (Some(user), Some(current)) = (self.user.clone(), self.current.clone()) else {
            return Err(Error::InvalidArgument(
                "Nothing to export yet. Generate a playlist first.".into(),
            ));
        };
        let Some(token) = self.auth.access_token().await else {
            return Ok(SyncOutcome::LoginRequired(self.auth.login().await?));
        };

        self.status = AppStatus::SyncingSpotify;
        self.error_message = None;

        match playlist::export(self.api.as_ref(), &token, &user.id, &current, on_progress).await {
            Ok(report) => {
                if let Some(current) = self.current.as_mut() {
                    current.tracks = report.tracks.clone();
                }
                self.status = AppStatus::Success;
                Ok(SyncOutcome::Exported(report))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn logout(&mut self) -> Res<()> {
        self.user = None;
        self.auth.logout().await
    }
}
