//! Instagram business account via the Graph API
//!
//! Instagram only accepts media posts, so the article illustration (its
//! public CMS URL) is required. The caption is the formatted summary.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::{id_at, network_error, not_configured, read_json, SocialPlatform, SocialPost};
use crate::config::InstagramConfig;
use crate::error::{PlatformError, Result};

const GRAPH_BASE: &str = "https://graph.facebook.com";

struct Credentials {
    user_id: String,
    access_token: SecretString,
    api_version: String,
}

pub struct InstagramPlatform {
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl InstagramPlatform {
    pub fn new(config: Option<InstagramConfig>, client: reqwest::Client) -> Self {
        Self {
            credentials: config.map(|c| Credentials {
                user_id: c.user_id,
                access_token: SecretString::from(c.access_token),
                api_version: c.api_version,
            }),
            client,
        }
    }
}

#[async_trait]
impl SocialPlatform for InstagramPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| not_configured(self.name()))?;
        let image_url = post.image_url.as_deref().ok_or_else(|| {
            PlatformError::Validation("instagram: posts need an image URL".to_string())
        })?;
        let token = creds.access_token.expose_secret();
        let base = format!("{}/{}/{}", GRAPH_BASE, creds.api_version, creds.user_id);

        let response = self
            .client
            .post(format!("{}/media", base))
            .query(&[
                ("image_url", image_url),
                ("caption", post.text.as_str()),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;
        let container = read_json(self.name(), response).await?;
        let creation_id = id_at(&container, "/id").ok_or_else(|| {
            PlatformError::Posting("instagram: no media container id".to_string())
        })?;
        debug!("Instagram container {} created", creation_id);

        let response = self
            .client
            .post(format!("{}/media_publish", base))
            .query(&[
                ("creation_id", creation_id.as_str()),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;
        let published = read_json(self.name(), response).await?;
        let id = id_at(&published, "/id").ok_or_else(|| {
            PlatformError::Posting("instagram: publish returned no id".to_string())
        })?;

        info!("Published to instagram: {}", id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "instagram"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(2200)
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}
