//! Gemini `generateContent` REST client

use async_trait::async_trait;
use base64::Engine;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::article::article_prompt;
use super::social::{social_prompt, SocialBrief};
use super::{backoff_delay, ContentGenerator, GeneratedImage};
use crate::config::{parse_duration_field, GeneratorConfig};
use crate::error::{GenerationError, Result};

pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    text_model: String,
    image_model: String,
    tone: String,
    word_count: u32,
    max_attempts: u32,
    retry_base_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// All text parts concatenated
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty())
    }
}

impl GeminiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::MissingApiKey(
                    "set generator.api_key or GEMINI_API_KEY".to_string(),
                )
            })?;

        let timeout = parse_duration_field("generator.request_timeout", &config.request_timeout)?;
        let retry_base_delay =
            parse_duration_field("generator.retry_base_delay", &config.retry_base_delay)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: SecretString::from(api_key),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            tone: config.tone.clone(),
            word_count: config.word_count,
            max_attempts: config.max_attempts.max(1),
            retry_base_delay,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// POST a request, retrying on HTTP 429 with backoff and jitter
    async fn generate(&self, model: &str, body: &Value) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model);

        for attempt in 1..=self.max_attempts {
            let response = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.expose_secret())])
                .json(body)
                .send()
                .await
                .map_err(|e| GenerationError::Network(e.without_url().to_string()))?;

            let status = response.status();
            if status.as_u16() == 429 {
                if attempt < self.max_attempts {
                    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
                    let delay = backoff_delay(self.retry_base_delay, attempt, jitter);
                    warn!(
                        "Gemini rate limited on {} (attempt {}/{}), retrying in {:.1}s",
                        model,
                        attempt,
                        self.max_attempts,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    continue;
                }
                return Err(GenerationError::RateLimit(format!(
                    "{} still rate limited after {} attempts",
                    model, self.max_attempts
                ))
                .into());
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Http {
                    status: status.as_u16(),
                    body: truncate_body(&body),
                }
                .into());
            }

            let parsed: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| GenerationError::Malformed(e.without_url().to_string()))?;
            return Ok(parsed);
        }

        Err(GenerationError::RateLimit(format!("{} gave no response", model)).into())
    }

    async fn generate_text(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let body = text_request(prompt, temperature, max_tokens);
        let response = self.generate(&self.text_model, &body).await?;
        response.text().ok_or_else(|| {
            GenerationError::EmptyResponse(format!("{} returned no text", self.text_model)).into()
        })
    }
}

fn text_request(prompt: &str, temperature: f32, max_tokens: u32) -> Value {
    json!({
        "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        "generationConfig": {
            "temperature": temperature,
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": max_tokens
        }
    })
}

fn image_request(prompt: &str) -> Value {
    let text = format!(
        "Generate a professional, high-quality 16:9 image for a blog article. {}. \
         Modern, sharp focus, no text overlays.",
        prompt
    );
    json!({
        "contents": [{"role": "user", "parts": [{"text": text}]}],
        "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
    })
}

fn truncate_body(body: &str) -> String {
    body.chars().take(300).collect()
}

fn decode_image(response: &GenerateContentResponse, model: &str) -> Result<GeneratedImage> {
    let inline = response.first_image().ok_or_else(|| {
        GenerationError::EmptyResponse(format!("{} returned no image data", model))
    })?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| GenerationError::Malformed(format!("image data is not base64: {}", e)))?;

    Ok(GeneratedImage {
        bytes,
        mime_type: inline.mime_type.clone(),
    })
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate_article(&self, seed: &str, seo_focus: &str) -> Result<String> {
        debug!("Requesting article for '{}'", seed);
        let prompt = article_prompt(seed, seo_focus, &self.tone, self.word_count);
        self.generate_text(&prompt, 0.8, 8192).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let response = self
            .generate(&self.image_model, &image_request(prompt))
            .await?;
        let image = decode_image(&response, &self.image_model)?;
        info!(
            "Generated image ({} bytes, {})",
            image.bytes.len(),
            image.mime_type
        );
        Ok(image)
    }

    async fn generate_social(&self, brief: &SocialBrief) -> Result<String> {
        self.generate_text(&social_prompt(brief), 0.9, 2048).await
    }
}
