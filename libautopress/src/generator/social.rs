//! Per-network summaries of a published article
//!
//! The model is asked for one `{text, hashtags}` entry per network. Any
//! network missing from the reply, or whose entry is malformed, gets a
//! fixed template built from the title and keywords instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::article::extract_json;

/// Networks a summary is generated for, in posting order
pub const NETWORKS: [&str; 6] = ["facebook", "twitter", "threads", "vk", "instagram", "telegram"];

const DEFAULT_HASHTAGS: [&str; 3] = ["AI", "Technology", "Innovation"];

/// What the summary generator needs to know about the article
#[derive(Debug, Clone)]
pub struct SocialBrief {
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialDraft {
    pub text: String,
    pub hashtags: Vec<String>,
}

pub fn social_prompt(brief: &SocialBrief) -> String {
    let keywords = if brief.keywords.is_empty() {
        "AI, technology".to_string()
    } else {
        brief.keywords.join(", ")
    };
    let preview: String = brief.excerpt.chars().take(500).collect();

    format!(
        r#"You are a social media marketing expert. Create posts promoting an article.

ARTICLE:
Title: {title}
URL: {url}
Keywords: {keywords}
Preview: {preview}

PLATFORMS:
- facebook: 200-250 characters, 3-5 hashtags, call to action
- twitter: at most 270 characters, 2-3 hashtags, strong hook
- threads: 300-400 characters, 3-4 hashtags, invite discussion
- vk: 200-300 characters in Russian, 4-6 hashtags
- instagram: 150-200 characters, 5-8 hashtags
- telegram: 300-500 characters, 3-5 hashtags

Hashtags have no spaces and use CamelCase (e.g. ArtificialIntelligence).

Return ONLY JSON of this shape:
{{
    "facebook": {{"text": "...", "hashtags": ["..."]}},
    "twitter": {{"text": "...", "hashtags": ["..."]}},
    "threads": {{"text": "...", "hashtags": ["..."]}},
    "vk": {{"text": "...", "hashtags": ["..."]}},
    "instagram": {{"text": "...", "hashtags": ["..."]}},
    "telegram": {{"text": "...", "hashtags": ["..."]}}
}}"#,
        title = brief.title,
        url = brief.url,
    )
}

/// Template used when the model gave nothing usable for a network
pub fn fallback_draft(network: &str, title: &str, keywords: &[String]) -> SocialDraft {
    let mut base: Vec<String> = if keywords.is_empty() {
        DEFAULT_HASHTAGS.iter().map(|s| s.to_string()).collect()
    } else {
        keywords.iter().take(3).cloned().collect()
    };

    let (text, extra): (String, &[&str]) = match network {
        "facebook" => (
            format!(
                "Check out our latest article: {}! Learn more about AI and technology trends.",
                title
            ),
            &["ArtificialIntelligence", "TechNews"][..],
        ),
        "twitter" => {
            base.truncate(2);
            (format!("New article: {}", title), &["AI"][..])
        }
        "threads" => (
            format!(
                "Just published: {}. What are your thoughts on this topic?",
                title
            ),
            &["Discussion"][..],
        ),
        "vk" => (
            format!("Новая статья: {}. Читайте на нашем сайте!", title),
            &["ИИ", "Технологии"][..],
        ),
        "instagram" => (
            format!("New: {}", title),
            &["AI", "Tech", "Innovation", "Future"][..],
        ),
        "telegram" => (
            format!("📰 {}\n\nЧитайте полный анализ на нашем сайте!", title),
            &["Tech", "AI"][..],
        ),
        _ => (title.to_string(), &[][..]),
    };

    base.extend(extra.iter().map(|s| s.to_string()));
    SocialDraft {
        text,
        hashtags: base,
    }
}

/// Drafts for every network in [`NETWORKS`]
///
/// `raw` is the model reply, or `None` when generation failed outright.
pub fn drafts_from_response(
    raw: Option<&str>,
    brief: &SocialBrief,
) -> BTreeMap<String, SocialDraft> {
    let parsed: Option<Value> = raw
        .and_then(extract_json)
        .and_then(|json| serde_json::from_str(json).ok());

    if raw.is_some() && parsed.is_none() {
        tracing::warn!("Social summary response was not JSON, using templates");
    }

    NETWORKS
        .iter()
        .map(|network| {
            let draft = parsed
                .as_ref()
                .and_then(|value| value.get(*network))
                .and_then(draft_from_value)
                .unwrap_or_else(|| {
                    tracing::debug!("Using template summary for {}", network);
                    fallback_draft(network, &brief.title, &brief.keywords)
                });
            (network.to_string(), draft)
        })
        .collect()
}

fn draft_from_value(value: &Value) -> Option<SocialDraft> {
    let text = value.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let hashtags = value
        .get("hashtags")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    Some(SocialDraft {
        text: text.to_string(),
        hashtags,
    })
}
