use chrono::Utc;
use serde_json::{Value, json};

use crate::{
    Error, Res,
    gemini::GeminiClient,
    types::{GenerationResult, PlaylistPreferences, RecommendationPayload},
};

/// Number of tracks the model is asked for. Not enforced on the reply.
pub const TRACK_COUNT: usize = 25;

pub const USER_PROMPT: &str = "Generate my personalized sonic journey.";

pub fn build_system_prompt(prefs: &PlaylistPreferences) -> String {
    let sliders = prefs
        .sliders()
        .iter()
        .map(|(name, value)| format!("{name}: {value}/100"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an expert music curator. Curate exactly {count} tracks matching these criteria:\n\
         {sliders}, Genre: {genre}, Context: {prompt}.\n\
         Generate a creative playlist name and thematic description.",
        count = TRACK_COUNT,
        sliders = sliders,
        genre = prefs.genre,
        prompt = prefs.prompt,
    )
}

/// Output schema in the Gemini `responseSchema` dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "playlistName": { "type": "STRING" },
            "playlistDescription": { "type": "STRING" },
            "tracks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "artist": { "type": "STRING" },
                        "album": { "type": "STRING" },
                        "popularityScore": { "type": "NUMBER" },
                        "reason": { "type": "STRING" },
                        "genre": { "type": "STRING" }
                    },
                    "required": ["id", "title", "artist", "reason", "genre", "popularityScore"]
                }
            }
        },
        "required": ["playlistName", "playlistDescription", "tracks"]
    })
}

pub fn build_request(prefs: &PlaylistPreferences) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": build_system_prompt(prefs) }] },
        "contents": [{ "role": "user", "parts": [{ "text": USER_PROMPT }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

/// Parses the model's JSON text into a result stamped with `timestamp`.
///
/// Popularity scores are clamped to [0, 100]. An empty reply or an empty
/// track list is a generation failure.
pub fn parse_response(text: &str, timestamp: i64) -> Res<GenerationResult> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Generation("model returned an empty response".into()));
    }

    let payload: RecommendationPayload = serde_json::from_str(text)
        .map_err(|e| Error::Generation(format!("malformed model response: {e}")))?;

    if payload.tracks.is_empty() {
        return Err(Error::Generation("model returned no tracks".into()));
    }

    Ok(GenerationResult {
        tracks: payload.tracks.into_iter().map(|t| t.sanitized()).collect(),
        playlist_name: payload.playlist_name,
        playlist_description: payload.playlist_description,
        cover_image: None,
        timestamp,
    })
}

pub(crate) async fn generate(
    client: &GeminiClient,
    prefs: &PlaylistPreferences,
) -> Res<GenerationResult> {
    prefs.validate()?;
    let body = build_request(prefs);
    let response = client.generate_content(&client.text_model, &body).await?;
    parse_response(&response.text(), Utc::now().timestamp_millis())
}
