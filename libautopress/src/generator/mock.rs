//! Scriptable content generator for tests

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use super::social::SocialBrief;
use super::{ContentGenerator, GeneratedImage};
use crate::error::{GenerationError, Result};

/// Behaviour of a [`MockGenerator`]
#[derive(Debug, Clone)]
pub struct MockGeneratorConfig {
    /// Raw reply for article requests; `None` makes the call fail
    pub article_reply: Option<String>,
    pub image: Option<GeneratedImage>,
    /// Raw reply for social requests; `None` makes the call fail
    pub social_reply: Option<String>,
    pub article_calls: Arc<Mutex<Vec<String>>>,
    pub image_calls: Arc<Mutex<usize>>,
    pub social_calls: Arc<Mutex<usize>>,
}

impl Default for MockGeneratorConfig {
    fn default() -> Self {
        Self {
            article_reply: Some(sample_article_json("A Practical Guide to Autonomous Publishing")),
            image: Some(GeneratedImage {
                bytes: vec![0x89, b'P', b'N', b'G'],
                mime_type: "image/png".to_string(),
            }),
            social_reply: None,
            article_calls: Arc::new(Mutex::new(Vec::new())),
            image_calls: Arc::new(Mutex::new(0)),
            social_calls: Arc::new(Mutex::new(0)),
        }
    }
}

pub struct MockGenerator {
    config: MockGeneratorConfig,
}

impl MockGenerator {
    pub fn new(config: MockGeneratorConfig) -> Self {
        Self { config }
    }

    /// Valid article and image every time
    pub fn success() -> Self {
        Self::new(MockGeneratorConfig::default())
    }

    /// Article replies with the given raw text
    pub fn with_article_reply(reply: &str) -> Self {
        Self::new(MockGeneratorConfig {
            article_reply: Some(reply.to_string()),
            ..Default::default()
        })
    }

    /// Article generation fails with a rate limit error
    pub fn article_failure() -> Self {
        Self::new(MockGeneratorConfig {
            article_reply: None,
            ..Default::default()
        })
    }

    /// Image generation fails
    pub fn image_failure() -> Self {
        Self::new(MockGeneratorConfig {
            image: None,
            ..Default::default()
        })
    }

    /// Seeds passed to `generate_article`, in call order
    pub fn article_calls(&self) -> Vec<String> {
        self.config
            .article_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn image_call_count(&self) -> usize {
        self.config.image_calls.lock().map(|c| *c).unwrap_or(0)
    }

    pub fn social_call_count(&self) -> usize {
        self.config.social_calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate_article(&self, seed: &str, _seo_focus: &str) -> Result<String> {
        if let Ok(mut calls) = self.config.article_calls.lock() {
            calls.push(seed.to_string());
        }
        self.config
            .article_reply
            .clone()
            .ok_or_else(|| GenerationError::RateLimit("mock article failure".to_string()).into())
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage> {
        if let Ok(mut calls) = self.config.image_calls.lock() {
            *calls += 1;
        }
        self.config.image.clone().ok_or_else(|| {
            GenerationError::EmptyResponse("mock image failure".to_string()).into()
        })
    }

    async fn generate_social(&self, _brief: &SocialBrief) -> Result<String> {
        if let Ok(mut calls) = self.config.social_calls.lock() {
            *calls += 1;
        }
        self.config
            .social_reply
            .clone()
            .ok_or_else(|| GenerationError::Network("mock social failure".to_string()).into())
    }
}

/// A reply that passes article validation
pub fn sample_article_json(title: &str) -> String {
    let paragraph = "<p>Automated publishing works best when every step is observable \
                     and every failure leaves the queue untouched.</p>";
    json!({
        "title": title,
        "slug": title,
        "meta_description": format!("{} explained.", title),
        "keywords": ["automation", "publishing", "AI"],
        "content_html": format!("<h2>{}</h2>{}", title, paragraph.repeat(8)),
        "image_prompt": "An editorial desk run by robots"
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::parse_article;

    #[test]
    fn test_sample_article_is_valid() {
        let article = parse_article(&sample_article_json("Queue Driven Content Pipelines")).unwrap();
        assert_eq!(article.slug, "queue-driven-content-pipelines");
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let generator = MockGenerator::success();
        generator.generate_article("seed one", "").await.unwrap();
        generator.generate_image("prompt").await.unwrap();

        assert_eq!(generator.article_calls(), vec!["seed one"]);
        assert_eq!(generator.image_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        assert!(MockGenerator::article_failure()
            .generate_article("s", "")
            .await
            .is_err());
        assert!(MockGenerator::image_failure()
            .generate_image("p")
            .await
            .is_err());
        assert!(MockGenerator::success()
            .generate_social(&SocialBrief {
                title: "t".to_string(),
                url: "u".to_string(),
                excerpt: String::new(),
                keywords: vec![],
            })
            .await
            .is_err());
    }
}
