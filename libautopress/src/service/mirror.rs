//! Cross-posting article summaries to social networks
//!
//! Networks are posted one after another with a pause in between. A failure
//! on one network never stops the others and never propagates: every
//! network gets a [`MirrorResult`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{parse_duration_field, SocialConfig};
use crate::error::Result;
use crate::generator::SocialDraft;
use crate::platforms::format::fit_post;
use crate::platforms::{create_platforms, SocialPlatform, SocialPost};

pub const NOT_CONFIGURED: &str = "not_configured";
pub const NO_DATA: &str = "no_data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorResult {
    pub platform: String,
    pub success: bool,
    pub post_id: Option<String>,
    pub error: Option<String>,
}

impl MirrorResult {
    fn ok(platform: &str, post_id: String) -> Self {
        Self {
            platform: platform.to_string(),
            success: true,
            post_id: Some(post_id),
            error: None,
        }
    }

    fn failed(platform: &str, error: impl Into<String>) -> Self {
        Self {
            platform: platform.to_string(),
            success: false,
            post_id: None,
            error: Some(error.into()),
        }
    }
}

pub struct MirrorCoordinator {
    platforms: Vec<Box<dyn SocialPlatform>>,
    delay: Duration,
}

impl MirrorCoordinator {
    pub fn new(platforms: Vec<Box<dyn SocialPlatform>>, delay: Duration) -> Self {
        Self { platforms, delay }
    }

    pub fn from_config(config: &SocialConfig) -> Result<Self> {
        let delay = parse_duration_field("social.post_delay", &config.post_delay)?;
        Ok(Self::new(create_platforms(config)?, delay))
    }

    pub fn configured_count(&self) -> usize {
        self.platforms.iter().filter(|p| p.is_configured()).count()
    }

    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.iter().map(|p| p.name()).collect()
    }

    /// Post a summary to every network and report per-network outcomes
    pub async fn mirror(
        &self,
        drafts: &BTreeMap<String, SocialDraft>,
        url: &str,
        image_url: Option<&str>,
    ) -> Vec<MirrorResult> {
        let mut results = Vec::with_capacity(self.platforms.len());
        let mut posted_any = false;

        for platform in &self.platforms {
            let name = platform.name();

            if !platform.is_configured() {
                results.push(MirrorResult::failed(name, NOT_CONFIGURED));
                continue;
            }

            let Some(draft) = drafts.get(name) else {
                warn!("No summary for {}, skipping", name);
                results.push(MirrorResult::failed(name, NO_DATA));
                continue;
            };

            let text = fit_post(name, draft, Some(url), platform.character_limit());
            if let Err(e) = platform.validate_content(&text) {
                warn!("Skipping {}: {}", name, e);
                results.push(MirrorResult::failed(name, e.to_string()));
                continue;
            }

            if posted_any && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            posted_any = true;

            let post = SocialPost {
                text,
                link: Some(url.to_string()),
                image_url: image_url.map(str::to_string),
            };
            match platform.post(&post).await {
                Ok(id) => results.push(MirrorResult::ok(name, id)),
                Err(e) => {
                    warn!("Posting to {} failed: {}", name, e);
                    results.push(MirrorResult::failed(name, e.to_string()));
                }
            }
        }

        let successful = results.iter().filter(|r| r.success).count();
        info!(
            "Social mirroring finished: {}/{} networks succeeded",
            successful,
            results.len()
        );
        results
    }
}
