//! Core types for Autopress

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a queued plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Pending,
    Published,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PlanStatus::Pending),
            "published" => Ok(PlanStatus::Published),
            other => Err(format!("Unknown plan status: '{}'", other)),
        }
    }
}

/// An article plan waiting in the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: i64,
    pub seed: String,
    pub seo_focus: String,
    pub created_at: i64,
    pub last_published_at: Option<i64>,
    pub status: PlanStatus,
    pub category: Option<String>,
}

/// Input for inserting a new plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlan {
    pub seed: String,
    pub seo_focus: String,
    pub category: Option<String>,
}

impl NewPlan {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            seo_focus: String::new(),
            category: None,
        }
    }

    pub fn with_seo_focus(mut self, seo_focus: impl Into<String>) -> Self {
        self.seo_focus = seo_focus.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A published article, recorded once the CMS accepted it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Option<i64>,
    pub plan_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub cms_post_id: i64,
    pub link: Option<String>,
    pub published_at: i64,
    pub keywords: Vec<String>,
}

/// Snapshot of the queue used by the scheduler and `--status`
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct QueueStatus {
    pub pending: i64,
    pub published: i64,
    /// Plans in any status
    pub total: i64,
    /// Rows in the publication log
    pub posts: i64,
    pub last_publish: Option<DateTime<Utc>>,
}

/// An image stored in the CMS media library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    pub id: i64,
    pub source_url: Option<String>,
}

/// Convert stored unix seconds into a UTC timestamp
pub fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}
