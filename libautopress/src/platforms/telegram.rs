//! Telegram channel via the Bot API
//!
//! With an image URL the summary goes out as a photo caption; captions are
//! capped at 1024 characters, so longer summaries fall back to a plain
//! message with a link preview.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::info;

use super::{id_at, network_error, not_configured, read_json, SocialPlatform, SocialPost};
use crate::config::TelegramConfig;
use crate::error::{PlatformError, Result};

const CAPTION_LIMIT: usize = 1024;
const MESSAGE_LIMIT: usize = 4096;

struct Credentials {
    bot_token: SecretString,
    channel_id: String,
}

pub struct TelegramPlatform {
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl TelegramPlatform {
    pub fn new(config: Option<TelegramConfig>, client: reqwest::Client) -> Self {
        Self {
            credentials: config.map(|c| Credentials {
                bot_token: SecretString::from(c.bot_token),
                channel_id: c.channel_id,
            }),
            client,
        }
    }
}

/// Method name and JSON body for a post
fn build_request(chat_id: &str, post: &SocialPost) -> (&'static str, Value) {
    match post.image_url.as_deref() {
        Some(photo) if post.text.chars().count() <= CAPTION_LIMIT => (
            "sendPhoto",
            json!({ "chat_id": chat_id, "photo": photo, "caption": post.text }),
        ),
        _ => (
            "sendMessage",
            json!({ "chat_id": chat_id, "text": post.text }),
        ),
    }
}

fn message_id(value: &Value) -> Result<String> {
    if value.get("ok").and_then(Value::as_bool) != Some(true) {
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("request was not ok");
        return Err(PlatformError::Posting(format!("telegram: {}", description)).into());
    }

    id_at(value, "/result/message_id").ok_or_else(|| {
        PlatformError::Posting("telegram: response has no message_id".to_string()).into()
    })
}

#[async_trait]
impl SocialPlatform for TelegramPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| not_configured(self.name()))?;

        let (method, body) = build_request(&creds.channel_id, post);
        let url = format!(
            "https://api.telegram.org/bot{}/{}",
            creds.bot_token.expose_secret(),
            method
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        let id = message_id(&value)?;

        info!("Published to telegram via {}: {}", method, id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "telegram"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(MESSAGE_LIMIT)
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_when_image_and_short_caption() {
        let post = SocialPost {
            text: "Caption".to_string(),
            link: None,
            image_url: Some("https://blog.example.com/img.png".to_string()),
        };
        let (method, body) = build_request("@news", &post);
        assert_eq!(method, "sendPhoto");
        assert_eq!(body["photo"], "https://blog.example.com/img.png");
        assert_eq!(body["caption"], "Caption");
    }

    #[test]
    fn test_message_when_no_image_or_long_caption() {
        let (method, body) = build_request("@news", &SocialPost::new("Text"));
        assert_eq!(method, "sendMessage");
        assert_eq!(body["text"], "Text");

        let long = SocialPost {
            text: "x".repeat(CAPTION_LIMIT + 1),
            link: None,
            image_url: Some("https://blog.example.com/img.png".to_string()),
        };
        assert_eq!(build_request("@news", &long).0, "sendMessage");
    }

    #[test]
    fn test_message_id_parsing() {
        let ok = json!({"ok": true, "result": {"message_id": 77}});
        assert_eq!(message_id(&ok).unwrap(), "77");

        let failed = json!({"ok": false, "description": "Forbidden: bot is not a member"});
        let err = message_id(&failed).unwrap_err();
        assert!(err.to_string().contains("bot is not a member"));
    }
}
