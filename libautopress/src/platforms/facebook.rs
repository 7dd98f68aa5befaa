//! Facebook Page feed via the Graph API

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::info;

use super::{id_at, network_error, not_configured, read_json, SocialPlatform, SocialPost};
use crate::config::FacebookConfig;
use crate::error::{PlatformError, Result};

const GRAPH_BASE: &str = "https://graph.facebook.com";
const CHARACTER_LIMIT: usize = 63_206;

struct Credentials {
    page_id: String,
    access_token: SecretString,
    api_version: String,
}

pub struct FacebookPlatform {
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl FacebookPlatform {
    pub fn new(config: Option<FacebookConfig>, client: reqwest::Client) -> Self {
        let credentials = config.map(|c| Credentials {
            page_id: c.page_id,
            access_token: SecretString::from(c.access_token),
            api_version: c.api_version,
        });
        Self {
            credentials,
            client,
        }
    }
}

fn feed_body(post: &SocialPost) -> Value {
    let mut body = json!({ "message": post.text });
    if let Some(link) = &post.link {
        body["link"] = json!(link);
    }
    body
}

#[async_trait]
impl SocialPlatform for FacebookPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| not_configured(self.name()))?;

        let url = format!(
            "{}/{}/{}/feed",
            GRAPH_BASE, creds.api_version, creds.page_id
        );
        let response = self
            .client
            .post(url)
            .query(&[("access_token", creds.access_token.expose_secret())])
            .json(&feed_body(post))
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        let id = id_at(&value, "/id").ok_or_else(|| {
            PlatformError::Posting("facebook: response has no post id".to_string())
        })?;

        info!("Published to facebook: {}", id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "facebook"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CHARACTER_LIMIT)
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}
