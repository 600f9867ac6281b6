use serde_json::{Value, json};

use crate::{gemini::GeminiClient, warning};

pub fn build_prompt(name: &str, description: &str) -> String {
    format!(
        "Create a high-quality abstract minimalist music playlist cover titled \"{name}\". \
         Description: {description}. Geometric shapes, cinematic gradients, no text."
    )
}

pub fn build_request(name: &str, description: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": build_prompt(name, description) }] }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": { "aspectRatio": "1:1" }
        }
    })
}

/// Asks for a square cover and returns its base64 payload.
///
/// Quota exhaustion, invalid requests and empty candidate lists all end in an
/// empty string. A missing cover never fails a generation.
pub(crate) async fn generate(client: &GeminiClient, name: &str, description: &str) -> String {
    let body = build_request(name, description);
    match client.generate_content(&client.image_model, &body).await {
        Ok(response) => response
            .first_parts()
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.clone())
            .unwrap_or_default(),
        Err(e) => {
            warning!("Cover image generation skipped: {}", e);
            String::new()
        }
    }
}
