//! Threads: create a text container, then publish it

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::{id_at, network_error, not_configured, read_json, SocialPlatform, SocialPost};
use crate::config::ThreadsConfig;
use crate::error::{PlatformError, Result};

const THREADS_BASE: &str = "https://graph.threads.net/v1.0";

struct Credentials {
    user_id: String,
    access_token: SecretString,
}

pub struct ThreadsPlatform {
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl ThreadsPlatform {
    pub fn new(config: Option<ThreadsConfig>, client: reqwest::Client) -> Self {
        Self {
            credentials: config.map(|c| Credentials {
                user_id: c.user_id,
                access_token: SecretString::from(c.access_token),
            }),
            client,
        }
    }

    async fn call(&self, url: String, params: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .post(url)
            .query(params)
            .send()
            .await
            .map_err(|e| network_error(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        id_at(&value, "/id").ok_or_else(|| {
            PlatformError::Posting("threads: response has no id".to_string()).into()
        })
    }
}

#[async_trait]
impl SocialPlatform for ThreadsPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| not_configured(self.name()))?;
        let token = creds.access_token.expose_secret();

        let container_id = self
            .call(
                format!("{}/{}/threads", THREADS_BASE, creds.user_id),
                &[
                    ("media_type", "TEXT"),
                    ("text", post.text.as_str()),
                    ("access_token", token),
                ],
            )
            .await?;
        debug!("Threads container {} created", container_id);

        let id = self
            .call(
                format!("{}/{}/threads_publish", THREADS_BASE, creds.user_id),
                &[("creation_id", container_id.as_str()), ("access_token", token)],
            )
            .await?;

        info!("Published to threads: {}", id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "threads"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(500)
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}
