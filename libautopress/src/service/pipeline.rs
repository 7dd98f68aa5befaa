//! One publish attempt: plan → article → image → CMS post → queue update
//!
//! Steps up to and including the post-create call abort the attempt on
//! failure and leave the plan pending. Taxonomy lookups are best-effort.
//! Social mirroring runs only after the publication is recorded and its
//! failures are logged, never returned.

use chrono::Utc;
use std::path::PathBuf;
use tracing::{error, info, warn};

use super::mirror::{MirrorCoordinator, MirrorResult};
use crate::cms::{wordpress::WordPressClient, Cms, NewPost, TaxonomyKind};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::generator::gemini::GeminiGenerator;
use crate::generator::social::{drafts_from_response, SocialBrief};
use crate::generator::{parse_article, save_image_copy, Article, ContentGenerator};
use crate::types::{PlanItem, PostRecord};

/// What a successful attempt produced
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub plan_id: i64,
    pub record_id: i64,
    pub cms_post_id: i64,
    pub title: String,
    pub slug: String,
    pub link: Option<String>,
    pub keywords: Vec<String>,
    pub mirror: Vec<MirrorResult>,
}

pub struct Publisher {
    db: Database,
    generator: Box<dyn ContentGenerator>,
    cms: Box<dyn Cms>,
    mirror: Option<MirrorCoordinator>,
    post_status: String,
    image_dir: Option<PathBuf>,
}

impl Publisher {
    pub fn new(db: Database, generator: Box<dyn ContentGenerator>, cms: Box<dyn Cms>) -> Self {
        Self {
            db,
            generator,
            cms,
            mirror: None,
            post_status: "publish".to_string(),
            image_dir: None,
        }
    }

    /// Wire the real Gemini and WordPress clients from configuration
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let generator = GeminiGenerator::new(&config.generator)?;
        let cms = WordPressClient::new(&config.cms)?;

        let mut publisher = Self::new(db, Box::new(generator), Box::new(cms))
            .with_post_status(&config.cms.post_status);

        if let Some(dir) = &config.generator.image_dir {
            publisher = publisher.with_image_dir(PathBuf::from(shellexpand::tilde(dir).to_string()));
        }

        if config.social.enabled {
            let mirror = MirrorCoordinator::from_config(&config.social)?;
            info!(
                "Social mirroring enabled for {}/{} networks",
                mirror.configured_count(),
                mirror.platform_names().len()
            );
            publisher = publisher.with_mirror(mirror);
        }

        Ok(publisher)
    }

    pub fn with_mirror(mut self, mirror: MirrorCoordinator) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_post_status(mut self, status: &str) -> Self {
        self.post_status = status.to_string();
        self
    }

    pub fn with_image_dir(mut self, dir: PathBuf) -> Self {
        self.image_dir = Some(dir);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Publish the oldest pending plan
    ///
    /// Returns `Ok(None)` when the queue is empty.
    pub async fn publish_next(&self) -> Result<Option<PublishOutcome>> {
        let Some(plan) = self.db.next_pending_plan().await? else {
            info!("Queue is empty, nothing to publish");
            return Ok(None);
        };

        self.publish_plan(&plan).await.map(Some)
    }

    pub async fn publish_plan(&self, plan: &PlanItem) -> Result<PublishOutcome> {
        info!("Publishing plan {}: {}", plan.id, plan.seed);

        let raw = self
            .generator
            .generate_article(&plan.seed, &plan.seo_focus)
            .await?;
        let article = parse_article(&raw)?;
        info!("Article ready: {}", article.title);

        let image = self.generator.generate_image(&article.image_prompt).await?;
        if let Some(dir) = &self.image_dir {
            match save_image_copy(dir, &plan.seed, &image) {
                Ok(path) => info!("Saved image copy to {}", path.display()),
                Err(e) => warn!("Could not save image copy: {}", e),
            }
        }

        let media = self
            .cms
            .upload_media(&image.bytes, &image.file_name(&article.slug), &image.mime_type)
            .await?;

        let (tags, categories) = self.resolve_taxonomy(&article, plan).await;

        let created = self
            .cms
            .create_post(&NewPost {
                title: article.title.clone(),
                content: article.content_html.clone(),
                slug: article.slug.clone(),
                status: self.post_status.clone(),
                excerpt: article.meta_description.clone(),
                featured_media: Some(media.id),
                tags,
                categories,
            })
            .await?;

        let record = PostRecord {
            id: None,
            plan_id: Some(plan.id),
            title: article.title.clone(),
            slug: article.slug.clone(),
            cms_post_id: created.id,
            link: created.link.clone(),
            published_at: Utc::now().timestamp(),
            keywords: article.keywords.clone(),
        };
        let record_id = match self.db.record_publication(plan.id, &record).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "CMS post {} was created but plan {} could not be marked published: {}",
                    created.id, plan.id, e
                );
                return Err(e);
            }
        };
        info!(
            "Published plan {} as CMS post {} ({})",
            plan.id,
            created.id,
            created.link.as_deref().unwrap_or("no link")
        );

        let mirror = match &self.mirror {
            Some(mirror) => {
                self.mirror_article(mirror, &article, created.link.as_deref(), media.source_url.as_deref())
                    .await
            }
            None => Vec::new(),
        };

        Ok(PublishOutcome {
            plan_id: plan.id,
            record_id,
            cms_post_id: created.id,
            title: article.title,
            slug: article.slug,
            link: created.link,
            keywords: article.keywords,
            mirror,
        })
    }

    /// Tag ids for the keywords and a category id for the plan, skipping lookups that fail
    async fn resolve_taxonomy(&self, article: &Article, plan: &PlanItem) -> (Vec<i64>, Vec<i64>) {
        let mut tags = Vec::new();
        for keyword in &article.keywords {
            match self.cms.resolve_term(TaxonomyKind::Tag, keyword).await {
                Ok(id) => tags.push(id),
                Err(e) => warn!("Skipping tag '{}': {}", keyword, e),
            }
        }

        let mut categories = Vec::new();
        if let Some(category) = plan.category.as_deref() {
            match self.cms.resolve_term(TaxonomyKind::Category, category).await {
                Ok(id) => categories.push(id),
                Err(e) => warn!("Skipping category '{}': {}", category, e),
            }
        }

        (tags, categories)
    }

    async fn mirror_article(
        &self,
        mirror: &MirrorCoordinator,
        article: &Article,
        link: Option<&str>,
        image_url: Option<&str>,
    ) -> Vec<MirrorResult> {
        if mirror.configured_count() == 0 {
            info!("No social networks configured, skipping mirroring");
            return Vec::new();
        }
        let Some(url) = link else {
            warn!("CMS returned no link, skipping social mirroring");
            return Vec::new();
        };

        let brief = SocialBrief {
            title: article.title.clone(),
            url: url.to_string(),
            excerpt: article
                .meta_description
                .clone()
                .unwrap_or_else(|| crate::cms::html_to_text(&article.content_html)),
            keywords: article.keywords.clone(),
        };

        let raw = match self.generator.generate_social(&brief).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("Social summary generation failed, using templates: {}", e);
                None
            }
        };
        let drafts = drafts_from_response(raw.as_deref(), &brief);

        mirror.mirror(&drafts, url, image_url).await
    }
}
