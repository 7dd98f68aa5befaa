//! VK community wall via `wall.post`

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::info;

use super::{id_at, network_error, not_configured, read_json, SocialPlatform, SocialPost};
use crate::config::VkConfig;
use crate::error::{PlatformError, Result};

const WALL_POST_URL: &str = "https://api.vk.com/method/wall.post";

struct Credentials {
    group_id: String,
    access_token: SecretString,
    api_version: String,
}

pub struct VkPlatform {
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl VkPlatform {
    pub fn new(config: Option<VkConfig>, client: reqwest::Client) -> Self {
        Self {
            credentials: config.map(|c| Credentials {
                group_id: c.group_id.trim_start_matches('-').to_string(),
                access_token: SecretString::from(c.access_token),
                api_version: c.api_version,
            }),
            client,
        }
    }
}

/// VK answers 200 even on failure; the error lives in the body
fn wall_post_id(value: &Value) -> Result<String> {
    if let Some(error) = value.get("error") {
        let code = error.get("error_code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("error_msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(match code {
            5 | 15 | 27 => PlatformError::Authentication(format!("vk: {}", message)),
            6 | 9 | 29 => PlatformError::RateLimit(format!("vk: {}", message)),
            _ => PlatformError::Posting(format!("vk error {}: {}", code, message)),
        }
        .into());
    }

    id_at(value, "/response/post_id")
        .ok_or_else(|| PlatformError::Posting("vk: response has no post_id".to_string()).into())
}

#[async_trait]
impl SocialPlatform for VkPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| not_configured(self.name()))?;

        let owner_id = format!("-{}", creds.group_id);
        let mut params = vec![
            ("owner_id", owner_id.as_str()),
            ("from_group", "1"),
            ("message", post.text.as_str()),
            ("access_token", creds.access_token.expose_secret()),
            ("v", creds.api_version.as_str()),
        ];
        if let Some(link) = post.link.as_deref() {
            params.push(("attachments", link));
        }

        let response = self
            .client
            .post(WALL_POST_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        let id = wall_post_id(&value)?;

        info!("Published to vk: {}", id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "vk"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(16_384)
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}
