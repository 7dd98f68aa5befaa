//! X / Twitter API v2 with an OAuth 2.0 user-context token

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

use super::{id_at, network_error, not_configured, read_json, SocialPlatform, SocialPost};
use crate::config::TwitterConfig;
use crate::error::{PlatformError, Result};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

pub struct TwitterPlatform {
    access_token: Option<SecretString>,
    client: reqwest::Client,
}

impl TwitterPlatform {
    pub fn new(config: Option<TwitterConfig>, client: reqwest::Client) -> Self {
        Self {
            access_token: config.map(|c| SecretString::from(c.access_token)),
            client,
        }
    }
}

#[async_trait]
impl SocialPlatform for TwitterPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let token = self
            .access_token
            .as_ref()
            .ok_or_else(|| not_configured(self.name()))?;

        let response = self
            .client
            .post(TWEETS_URL)
            .bearer_auth(token.expose_secret())
            .json(&json!({ "text": post.text }))
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        let id = id_at(&value, "/data/id").ok_or_else(|| {
            PlatformError::Posting("twitter: response has no tweet id".to_string())
        })?;

        info!("Published to twitter: {}", id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "twitter"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(280)
    }

    fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }
}
