use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Local};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use url::Url;

use crate::types::{GenerationResult, HistoryTableRow, Track, TrackTableRow};

pub const CODE_VERIFIER_LEN: usize = 128;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_VERIFIER_LEN)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Normalises a redirect URI the way Spotify accepts it.
///
/// Spotify rejects `localhost` redirect URIs, so the host is rewritten to
/// `127.0.0.1`. A trailing slash is dropped so login and exchange always send
/// the same string.
pub fn redirect_uri(raw: &str) -> String {
    let uri = raw.trim().replacen("localhost", "127.0.0.1", 1);
    match uri.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => uri,
    }
}

/// Returns `location` without the one-shot OAuth parameters.
///
/// `code` and `state` are removed; every other query parameter is kept in
/// order. An empty query is dropped entirely.
pub fn strip_authorization_code(location: &Url) -> Url {
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| k != "code" && k != "state")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut clean = location.clone();
    clean.set_fragment(None);
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(kept);
    }
    clean
}

/// Removes a `data:image/<kind>;base64,` prefix if present.
pub fn strip_data_uri_prefix(image: &str) -> &str {
    if let Some(rest) = image.strip_prefix("data:image/") {
        if let Some(idx) = rest.find(";base64,") {
            let kind = &rest[..idx];
            if !kind.is_empty() && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return &rest[idx + ";base64,".len()..];
            }
        }
    }
    image
}

/// Integer percentage of `done` out of `total`, rounded half up.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn build_track_rows(tracks: &[Track]) -> Vec<TrackTableRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            title: t.title.clone(),
            artist: t.artist.clone(),
            genre: t.genre.clone(),
            popularity: format!("{:.0}%", t.popularity_score),
            reason: t.reason.clone(),
        })
        .collect()
}

pub fn build_history_rows(history: &[GenerationResult]) -> Vec<HistoryTableRow> {
    history
        .iter()
        .enumerate()
        .map(|(index, r)| HistoryTableRow {
            index,
            created: format_timestamp(r.timestamp),
            name: r.playlist_name.clone(),
            tracks: r.tracks.len(),
            cover: if r.has_cover() { "yes" } else { "no" }.to_string(),
        })
        .collect()
}

pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
