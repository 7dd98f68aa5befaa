//! In-memory CMS for tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use super::{Cms, CreatedPost, NewPost, PostDetails, TaxonomyKind};
use crate::error::{CmsError, Result};
use crate::types::MediaAsset;

#[derive(Debug, Clone)]
pub struct MockCmsConfig {
    pub upload_succeeds: bool,
    pub create_succeeds: bool,
    pub terms_succeed: bool,
    pub base_link: String,
}

impl Default for MockCmsConfig {
    fn default() -> Self {
        Self {
            upload_succeeds: true,
            create_succeeds: true,
            terms_succeed: true,
            base_link: "https://blog.example.com".to_string(),
        }
    }
}

/// Records every call; ids are handed out sequentially from 100
///
/// Clones share their recorded state, so a clone kept by the test can
/// inspect calls made through the boxed original.
#[derive(Clone)]
pub struct MockCms {
    config: MockCmsConfig,
    next_id: Arc<AtomicI64>,
    uploads: Arc<Mutex<Vec<String>>>,
    terms: Arc<Mutex<HashMap<(TaxonomyKind, String), i64>>>,
    posts: Arc<Mutex<Vec<(i64, NewPost)>>>,
}

impl MockCms {
    pub fn new(config: MockCmsConfig) -> Self {
        Self {
            config,
            next_id: Arc::new(AtomicI64::new(100)),
            uploads: Arc::new(Mutex::new(Vec::new())),
            terms: Arc::new(Mutex::new(HashMap::new())),
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn success() -> Self {
        Self::new(MockCmsConfig::default())
    }

    pub fn upload_failure() -> Self {
        Self::new(MockCmsConfig {
            upload_succeeds: false,
            ..Default::default()
        })
    }

    pub fn create_failure() -> Self {
        Self::new(MockCmsConfig {
            create_succeeds: false,
            ..Default::default()
        })
    }

    pub fn term_failure() -> Self {
        Self::new(MockCmsConfig {
            terms_succeed: false,
            ..Default::default()
        })
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// File names passed to `upload_media`
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Posts created so far with the ids they were given
    pub fn created_posts(&self) -> Vec<(i64, NewPost)> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn term_count(&self) -> usize {
        self.terms.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Cms for MockCms {
    async fn upload_media(
        &self,
        _bytes: &[u8],
        file_name: &str,
        _mime_type: &str,
    ) -> Result<MediaAsset> {
        if !self.config.upload_succeeds {
            return Err(CmsError::Rejected {
                status: 413,
                body: "mock upload rejected".to_string(),
            }
            .into());
        }

        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(file_name.to_string());
        }
        let id = self.next_id();
        Ok(MediaAsset {
            id,
            source_url: Some(format!(
                "{}/wp-content/uploads/{}",
                self.config.base_link, file_name
            )),
        })
    }

    async fn resolve_term(&self, kind: TaxonomyKind, name: &str) -> Result<i64> {
        if !self.config.terms_succeed {
            return Err(CmsError::Network("mock term lookup failed".to_string()).into());
        }

        let key = (kind, name.to_lowercase());
        let existing = self.terms.lock().ok().and_then(|t| t.get(&key).copied());
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = self.next_id();
        if let Ok(mut terms) = self.terms.lock() {
            terms.insert(key, id);
        }
        Ok(id)
    }

    async fn create_post(&self, post: &NewPost) -> Result<CreatedPost> {
        if !self.config.create_succeeds {
            return Err(CmsError::Rejected {
                status: 500,
                body: "mock create failed".to_string(),
            }
            .into());
        }

        let id = self.next_id();
        if let Ok(mut posts) = self.posts.lock() {
            posts.push((id, post.clone()));
        }
        Ok(CreatedPost {
            id,
            link: Some(format!("{}/{}", self.config.base_link, post.slug)),
        })
    }

    async fn get_post(&self, id: i64) -> Result<PostDetails> {
        let post = self
            .posts
            .lock()
            .ok()
            .and_then(|posts| posts.iter().find(|(pid, _)| *pid == id).cloned());

        let (id, post) = post.ok_or(CmsError::Rejected {
            status: 404,
            body: "rest_post_invalid_id".to_string(),
        })?;

        Ok(PostDetails {
            id,
            title: post.title,
            link: Some(format!("{}/{}", self.config.base_link, post.slug)),
            slug: post.slug,
            status: post.status,
            date: None,
            modified: None,
            excerpt: post.excerpt.unwrap_or_default(),
            content_text: super::html_to_text(&post.content),
            featured_media: post.featured_media,
            categories: post.categories,
            tags: post.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_terms_are_reused() {
        let cms = MockCms::success();
        let a = cms.resolve_term(TaxonomyKind::Tag, "Rust").await.unwrap();
        let b = cms.resolve_term(TaxonomyKind::Tag, "rust").await.unwrap();
        let c = cms
            .resolve_term(TaxonomyKind::Category, "Rust")
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cms.term_count(), 2);
    }

    #[tokio::test]
    async fn test_created_post_can_be_read_back() {
        let cms = MockCms::success();
        let created = cms
            .create_post(&NewPost {
                title: "Hello".to_string(),
                content: "<p>Body</p>".to_string(),
                slug: "hello".to_string(),
                status: "publish".to_string(),
                excerpt: Some("Short".to_string()),
                featured_media: None,
                tags: vec![],
                categories: vec![],
            })
            .await
            .unwrap();

        let details = cms.get_post(created.id).await.unwrap();
        assert_eq!(details.title, "Hello");
        assert_eq!(details.content_text, "Body");
        assert!(cms.get_post(9999).await.is_err());
    }
}
