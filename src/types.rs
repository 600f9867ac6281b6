use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{Error, Res};

/// Genre presets offered by the CLI. Any other label is accepted as well.
pub const GENRES: [&str; 9] = [
    "Synthwave",
    "Dark Techno",
    "Ambient",
    "Jazz Fusion",
    "Hyperpop",
    "K-Pop",
    "Metal",
    "Lo-fi",
    "Indie Sleaze",
];

/// User-tunable taste vector. Every slider is a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPreferences {
    pub mood: u8,
    pub energy: u8,
    pub popularity: u8,
    pub danceability: u8,
    pub acousticness: u8,
    pub instrumentalness: u8,
    pub genre: String,
    pub prompt: String,
}

impl Default for PlaylistPreferences {
    fn default() -> Self {
        Self {
            mood: 65,
            energy: 40,
            popularity: 75,
            danceability: 30,
            acousticness: 20,
            instrumentalness: 10,
            genre: GENRES[0].to_string(),
            prompt: String::new(),
        }
    }
}

impl PlaylistPreferences {
    /// Slider labels and values in display order.
    pub fn sliders(&self) -> [(&'static str, u8); 6] {
        [
            ("Mood", self.mood),
            ("Energy", self.energy),
            ("Popularity", self.popularity),
            ("Danceability", self.danceability),
            ("Acousticness", self.acousticness),
            ("Instrumentalness", self.instrumentalness),
        ]
    }

    pub fn validate(&self) -> Res<()> {
        if let Some((name, value)) = self.sliders().into_iter().find(|(_, v)| *v > 100) {
            return Err(Error::InvalidArgument(format!(
                "{name} must be between 0 and 100, got {value}"
            )));
        }
        Ok(())
    }
}

/// One recommended song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub popularity_score: f64,
    pub reason: String,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_uri: Option<String>,
}

impl Track {
    /// Clamps model-supplied numbers into their declared ranges.
    pub fn sanitized(mut self) -> Self {
        self.popularity_score = crate::utils::clamp_percentage(self.popularity_score);
        self
    }
}

/// One completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub tracks: Vec<Track>,
    pub playlist_name: String,
    pub playlist_description: String,
    /// Base64 image payload. A `data:image/...;base64,` prefix is tolerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

impl GenerationResult {
    pub fn has_cover(&self) -> bool {
        self.cover_image.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// What the recommendation model returns, before a timestamp is attached.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationPayload {
    pub playlist_name: String,
    pub playlist_description: String,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Generating,
    GeneratingImage,
    Success,
    Error,
    SyncingSpotify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

impl SpotifyUser {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Form body of the authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub grant_type: String,
    pub code: String,
    pub redirect_uri: String,
    pub code_verifier: String,
}

/// Token endpoint reply. Spotify answers with either `access_token` or
/// `error`, so both sides are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<SearchTracks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTracks {
    pub items: Vec<SearchTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTrack {
    pub uri: String,
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub playlist_url: String,
    pub matched: usize,
    pub total: usize,
    /// The exported tracks, annotated with the URI each search matched.
    pub tracks: Vec<Track>,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub title: String,
    pub artist: String,
    pub genre: String,
    #[tabled(rename = "popularity")]
    pub popularity: String,
    pub reason: String,
}

#[derive(Tabled)]
pub struct HistoryTableRow {
    #[tabled(rename = "#")]
    pub index: usize,
    pub created: String,
    pub name: String,
    pub tracks: usize,
    pub cover: String,
}
