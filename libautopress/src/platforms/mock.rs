//! Mock social platform for tests
//!
//! Can succeed, fail, or pretend to be unconfigured, and records what was
//! posted so mirroring can be verified without network access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::{validate_length, SocialPlatform, SocialPost};

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: String,
    pub post_succeeds: bool,
    pub post_error: Option<String>,
    pub character_limit: Option<usize>,
    pub is_configured: bool,
    pub post_call_count: Arc<AtomicUsize>,
    pub posted: Arc<Mutex<Vec<SocialPost>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            post_succeeds: true,
            post_error: None,
            character_limit: None,
            is_configured: true,
            post_call_count: Arc::new(AtomicUsize::new(0)),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub struct MockPlatform {
    config: MockConfig,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    pub fn with_limit(name: &str, limit: usize) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            character_limit: Some(limit),
            ..Default::default()
        })
    }

    pub fn not_configured(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            is_configured: false,
            ..Default::default()
        })
    }

    /// Shared handle to the config, for inspecting calls after the platform is boxed
    pub fn config(&self) -> MockConfig {
        self.config.clone()
    }

    pub fn post_call_count(&self) -> usize {
        self.config.post_call_count.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> Vec<SocialPost> {
        self.config
            .posted
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SocialPlatform for MockPlatform {
    async fn post(&self, post: &SocialPost) -> Result<String> {
        let call = self.config.post_call_count.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.config.post_succeeds {
            let message = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failed".to_string());
            return Err(PlatformError::Posting(message).into());
        }

        if let Ok(mut posted) = self.config.posted.lock() {
            posted.push(post.clone());
        }
        Ok(format!("{}:mock-{}", self.config.name, call))
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        validate_length(&self.config.name, content, self.config.character_limit)
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn character_limit(&self) -> Option<usize> {
        self.config.character_limit
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success_records_post() {
        let platform = MockPlatform::success("test");
        let id = platform.post(&SocialPost::new("Hello")).await.unwrap();

        assert_eq!(id, "test:mock-1");
        assert_eq!(platform.post_call_count(), 1);
        assert_eq!(platform.posted()[0].text, "Hello");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let platform = MockPlatform::post_failure("test", "Server exploded");
        let err = platform.post(&SocialPost::new("Hello")).await.unwrap_err();

        assert!(err.to_string().contains("Server exploded"));
        assert_eq!(platform.post_call_count(), 1);
        assert!(platform.posted().is_empty());
    }

    #[test]
    fn test_mock_limit_validation() {
        let platform = MockPlatform::with_limit("test", 5);
        assert!(platform.validate_content("12345").is_ok());
        assert!(platform.validate_content("123456").is_err());
        assert!(!MockPlatform::not_configured("x").is_configured());
    }
}
