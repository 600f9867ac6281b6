//! # Gemini Integration Module
//!
//! Clients for the two generative calls vibesync makes:
//!
//! - [`recommendations`] - structured-output request that turns taste
//!   sliders into a playlist name, a description and 25 tracks. Failures
//!   are fatal for the generation attempt.
//! - [`cover`] - image request for a square abstract cover. Best-effort:
//!   every failure collapses to an empty string.
//!
//! Both go through [`GeminiClient`], a thin wrapper over the
//! `models/{model}:generateContent` REST endpoint. The [`Curator`] trait is
//! the seam the session talks to, so tests can swap the model out.

pub mod cover;
pub mod recommendations;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error, Res, config,
    types::{GenerationResult, PlaylistPreferences},
};

/// Source of curated playlists and cover art.
#[async_trait]
pub trait Curator: Send + Sync {
    /// Asks the model for a playlist. Errors are fatal for this attempt.
    async fn generate_recommendations(&self, prefs: &PlaylistPreferences)
    -> Res<GenerationResult>;

    /// Returns a base64 image without scheme prefix, or an empty string when
    /// no image could be produced.
    async fn generate_cover_image(&self, name: &str, description: &str) -> String;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, api_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            text_model: config::DEFAULT_GEMINI_TEXT_MODEL.to_string(),
            image_model: config::DEFAULT_GEMINI_IMAGE_MODEL.to_string(),
        }
    }

    /// Client configured from `GEMINI_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(config::gemini_api_key(), config::gemini_api_url())
            .with_models(config::gemini_text_model(), config::gemini_image_model())
    }

    pub fn with_models(mut self, text_model: String, image_model: String) -> Self {
        self.text_model = text_model;
        self.image_model = image_model;
        self
    }

    fn api_key(&self) -> Res<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Configuration("Missing Gemini API key (GEMINI_API_KEY).".into()))
    }

    /// Posts a `generateContent` body to `model` and decodes the reply.
    ///
    /// Non-success statuses are turned into [`Error::Generation`] carrying the
    /// provider's message, so quota and validation errors read well.
    async fn generate_content(&self, model: &str, body: &Value) -> Res<GenerateContentResponse> {
        let api_key = self.api_key()?;
        let api_url = format!(
            "{url}/models/{model}:generateContent",
            url = self.api_url,
            model = model
        );

        let response = self
            .http
            .post(&api_url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::Generation(format!("{status}: {message}")));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| Error::Generation(e.to_string()))
    }
}

#[async_trait]
impl Curator for GeminiClient {
    async fn generate_recommendations(
        &self,
        prefs: &PlaylistPreferences,
    ) -> Res<GenerationResult> {
        recommendations::generate(self, prefs).await
    }

    async fn generate_cover_image(&self, name: &str, description: &str) -> String {
        cover::generate(self, name, description).await
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, or nothing.
    pub fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate.
    pub fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
