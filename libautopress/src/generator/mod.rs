//! Content generation: article text, illustrations and social summaries
//!
//! The [`ContentGenerator`] trait hides the generative API so the pipeline
//! can run against [`mock::MockGenerator`] in tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

pub mod article;
pub mod gemini;
pub mod social;

// Always compiled so integration tests can drive the pipeline offline
pub mod mock;

pub use article::{parse_article, Article};
pub use social::{SocialBrief, SocialDraft};

/// Raw image bytes returned by the image model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn extension(&self) -> &'static str {
        match self.mime_type.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    /// Upload file name derived from the article slug
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension())
    }
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Ask for a structured article; returns the model's raw reply
    async fn generate_article(&self, seed: &str, seo_focus: &str) -> Result<String>;

    /// Produce an illustration for the given prompt
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;

    /// Ask for per-network summaries; returns the model's raw reply
    async fn generate_social(&self, brief: &SocialBrief) -> Result<String>;
}

/// Exponential backoff: `base * 2^(attempt-1) + jitter`
pub fn backoff_delay(base: Duration, attempt: u32, jitter: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).saturating_add(jitter)
}

/// Hex SHA-256 of the plan seed, used to name local image copies
pub fn seed_digest(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Write a copy of the image to `dir`, named after the seed digest
pub fn save_image_copy(dir: &Path, seed: &str, image: &GeneratedImage) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(image.file_name(&seed_digest(seed)));
    std::fs::write(&path, &image.bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_doubles() {
        let base = Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 1, Duration::ZERO), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2, Duration::ZERO), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3, Duration::ZERO), Duration::from_secs(8));
        assert_eq!(
            backoff_delay(base, 2, Duration::from_millis(250)),
            Duration::from_millis(4250)
        );
    }

    #[test]
    fn test_image_extension() {
        let image = |mime: &str| GeneratedImage {
            bytes: vec![],
            mime_type: mime.to_string(),
        };
        assert_eq!(image("image/jpeg").extension(), "jpg");
        assert_eq!(image("image/PNG").extension(), "png");
        assert_eq!(image("application/octet-stream").extension(), "png");
        assert_eq!(image("image/webp").file_name("my-post"), "my-post.webp");
    }

    #[test]
    fn test_seed_digest_is_stable_hex() {
        let digest = seed_digest("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_save_image_copy() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let image = GeneratedImage {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        };

        let path = save_image_copy(&temp_dir.path().join("images"), "abc", &image).unwrap();
        assert!(path.to_string_lossy().ends_with("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.png"));
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_save_image_copy_failure_is_file_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("images");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let image = GeneratedImage {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        };

        let err = save_image_copy(&blocker, "abc", &image).unwrap_err();
        assert!(matches!(err, crate::AutopressError::Io(_)), "got {:?}", err);
    }
}
