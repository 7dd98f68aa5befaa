//! Social network clients
//!
//! Every network implements [`SocialPlatform`]. A client is created for
//! each supported network whether or not it has credentials, so callers
//! can report unconfigured networks instead of silently skipping them.
//!
//! # Examples
//!
//! ```no_run
//! use libautopress::config::SocialConfig;
//! use libautopress::platforms::{create_platforms, SocialPost};
//!
//! # async fn example() -> libautopress::error::Result<()> {
//! let platforms = create_platforms(&SocialConfig::default())?;
//! let post = SocialPost::new("New article is live\n\nhttps://blog.example.com/new");
//!
//! for platform in platforms.iter().filter(|p| p.is_configured()) {
//!     platform.validate_content(&post.text)?;
//!     let id = platform.post(&post).await?;
//!     println!("{}: {}", platform.name(), id);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::SocialConfig;
use crate::error::{AutopressError, PlatformError, Result};

pub mod facebook;
pub mod format;
pub mod instagram;
pub mod telegram;
pub mod threads;
pub mod twitter;
pub mod vk;

// Always compiled so integration tests can exercise mirroring offline
pub mod mock;

/// A fully formatted post ready to send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialPost {
    pub text: String,
    /// Article URL, for networks that attach link previews separately
    pub link: Option<String>,
    /// Public URL of the article illustration
    pub image_url: Option<String>,
}

impl SocialPost {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Publish and return the network's id for the new post
    async fn post(&self, post: &SocialPost) -> Result<String>;

    /// Check content against the network's rules before posting
    fn validate_content(&self, content: &str) -> Result<()> {
        validate_length(self.name(), content, self.character_limit())
    }

    /// Lowercase network identifier ("facebook", "vk", ...)
    fn name(&self) -> &str;

    fn character_limit(&self) -> Option<usize>;

    /// Whether credentials for this network are present
    fn is_configured(&self) -> bool;
}

/// Non-empty and within `limit` characters
pub fn validate_length(name: &str, content: &str, limit: Option<usize>) -> Result<()> {
    if content.trim().is_empty() {
        return Err(PlatformError::Validation(format!("{}: content cannot be empty", name)).into());
    }

    if let Some(limit) = limit {
        let count = content.chars().count();
        if count > limit {
            return Err(PlatformError::Validation(format!(
                "{}: content exceeds {} character limit (got {} characters)",
                name, limit, count
            ))
            .into());
        }
    }

    Ok(())
}

/// One client per supported network, in posting order
pub fn create_platforms(config: &SocialConfig) -> Result<Vec<Box<dyn SocialPlatform>>> {
    let client = http_client()?;

    Ok(vec![
        Box::new(facebook::FacebookPlatform::new(
            config.facebook.clone(),
            client.clone(),
        )),
        Box::new(twitter::TwitterPlatform::new(
            config.twitter.clone(),
            client.clone(),
        )),
        Box::new(threads::ThreadsPlatform::new(
            config.threads.clone(),
            client.clone(),
        )),
        Box::new(vk::VkPlatform::new(config.vk.clone(), client.clone())),
        Box::new(instagram::InstagramPlatform::new(
            config.instagram.clone(),
            client.clone(),
        )),
        Box::new(telegram::TelegramPlatform::new(
            config.telegram.clone(),
            client,
        )),
    ])
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PlatformError::Network(format!("failed to build HTTP client: {}", e)).into())
}

pub(crate) fn not_configured(name: &str) -> AutopressError {
    PlatformError::Authentication(format!("{} credentials are not configured", name)).into()
}

pub(crate) fn network_error(name: &str, error: reqwest::Error) -> AutopressError {
    // Tokens travel in query strings, keep them out of the message
    PlatformError::Network(format!("{}: {}", name, error.without_url())).into()
}

/// Map the HTTP status and decode the JSON body
pub(crate) async fn read_json(name: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.map_err(|e| network_error(name, e))?;
    let value: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    if status.is_success() {
        if value.is_null() {
            return Err(PlatformError::Posting(format!(
                "{}: response was not JSON",
                name
            ))
            .into());
        }
        return Ok(value);
    }

    let message = api_error_message(&value).unwrap_or_else(|| body.chars().take(200).collect());
    Err(match status.as_u16() {
        401 | 403 => PlatformError::Authentication(format!("{}: {}", name, message)),
        429 => PlatformError::RateLimit(format!("{}: {}", name, message)),
        code => PlatformError::Posting(format!("{} returned {}: {}", name, code, message)),
    }
    .into())
}

/// Error text from the Graph, VK, X and Telegram error shapes
fn api_error_message(value: &Value) -> Option<String> {
    let text = match value.get("error") {
        Some(error) => error
            .get("message")
            .or_else(|| error.get("error_msg"))
            .unwrap_or(error),
        None => value.get("detail").or_else(|| value.get("description"))?,
    };
    text.as_str().map(str::to_string)
}

/// Read a string or numeric id at `pointer`
pub(crate) fn id_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
