use crate::{
    Error, Res,
    spotify::{ADD_TRACKS_BATCH, SpotifyApi},
    types::{CreatePlaylistRequest, ExportReport, GenerationResult},
    utils, warning,
};

/// Exports `result` as a private playlist owned by `user_id`.
///
/// Tracks are searched one at a time, in order, and `on_progress` receives the
/// rounded completion percentage after each search. Tracks without a match are
/// skipped. If nothing matched, no playlist is created. A failure after the
/// playlist exists leaves it on Spotify as is.
pub async fn export<F>(
    api: &dyn SpotifyApi,
    token: &str,
    user_id: &str,
    result: &GenerationResult,
    mut on_progress: F,
) -> Res<ExportReport>
where
    F: FnMut(u8),
{
    let total = result.tracks.len();
    let mut tracks = result.tracks.clone();
    let mut uris: Vec<String> = Vec::new();

    for (i, track) in tracks.iter_mut().enumerate() {
        if let Some(uri) = api.search_track(token, &track.title, &track.artist).await? {
            track.spotify_uri = Some(uri.clone());
            uris.push(uri);
        }
        on_progress(utils::progress_percent(i + 1, total));
    }

    if uris.is_empty() {
        return Err(Error::NoTracksFound);
    }

    let request = CreatePlaylistRequest {
        name: result.playlist_name.clone(),
        description: result.playlist_description.clone(),
        public: false,
    };
    let playlist = api.create_playlist(token, user_id, &request).await?;

    for chunk in uris.chunks(ADD_TRACKS_BATCH) {
        api.add_tracks(token, &playlist.id, chunk).await?;
    }

    if let Some(cover) = result.cover_image.as_deref().filter(|c| !c.is_empty()) {
        let payload = utils::strip_data_uri_prefix(cover);
        if let Err(e) = api.upload_cover(token, &playlist.id, payload).await {
            warning!("Cover upload failed: {}", e);
        }
    }

    let playlist_url = playlist
        .external_urls
        .spotify
        .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", playlist.id));

    Ok(ExportReport {
        playlist_url,
        matched: uris.len(),
        total,
        tracks,
    })
}
