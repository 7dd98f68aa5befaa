//! Publishing articles to a CMS
//!
//! [`Cms`] covers the few REST calls the pipeline needs: upload the
//! illustration, resolve taxonomy terms and create the post.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::types::MediaAsset;

pub mod wordpress;

// Always compiled so integration tests can drive the pipeline offline
pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Tag,
    Category,
}

impl TaxonomyKind {
    /// REST collection name
    pub fn collection(&self) -> &'static str {
        match self {
            TaxonomyKind::Tag => "tags",
            TaxonomyKind::Category => "categories",
        }
    }
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxonomyKind::Tag => f.write_str("tag"),
            TaxonomyKind::Category => f.write_str("category"),
        }
    }
}

/// Body of a post-create request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: i64,
    pub link: Option<String>,
}

/// A post as read back from the CMS, with HTML reduced to text
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostDetails {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub link: Option<String>,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub excerpt: String,
    pub content_text: String,
    pub featured_media: Option<i64>,
    pub categories: Vec<i64>,
    pub tags: Vec<i64>,
}

#[async_trait]
pub trait Cms: Send + Sync {
    async fn upload_media(&self, bytes: &[u8], file_name: &str, mime_type: &str)
        -> Result<MediaAsset>;

    /// Id of the term named `name`, creating it when no exact match exists
    async fn resolve_term(&self, kind: TaxonomyKind, name: &str) -> Result<i64>;

    async fn create_post(&self, post: &NewPost) -> Result<CreatedPost>;

    async fn get_post(&self, id: i64) -> Result<PostDetails>;
}

/// Tags that end a run of text; inline tags like `<em>` join their neighbours
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote",
    "tr", "td", "th", "hr", "figure", "figcaption", "section", "article",
];

/// Drop tags, decode the handful of entities WordPress emits and collapse whitespace
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag: Option<String> = None;
    for c in html.chars() {
        match tag.as_mut() {
            None if c == '<' => tag = Some(String::new()),
            None => text.push(c),
            Some(name) if c == '>' => {
                if is_block_tag(name) {
                    text.push(' ');
                }
                tag = None;
            }
            Some(name) => name.push(c),
        }
    }
    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

pub fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&#038;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#8217;", "\u{2019}")
        .replace("&#8216;", "\u{2018}")
        .replace("&#8220;", "\u{201c}")
        .replace("&#8221;", "\u{201d}")
        .replace("&#8211;", "\u{2013}")
        .replace("&#8230;", "\u{2026}")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_serialization_skips_empty() {
        let post = NewPost {
            title: "Title".to_string(),
            content: "<p>Body</p>".to_string(),
            slug: "title".to_string(),
            status: "publish".to_string(),
            excerpt: None,
            featured_media: Some(12),
            tags: vec![],
            categories: vec![3],
        };

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["featured_media"], 12);
        assert_eq!(json["categories"], serde_json::json!([3]));
        assert!(json.get("excerpt").is_none());
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<h2>AI &amp; Culture</h2> <p>It&#8217;s <em>here</em>.</p>"),
            "AI & Culture It\u{2019}s here."
        );
        assert_eq!(html_to_text("  plain  "), "plain");
    }

    #[test]
    fn test_html_to_text_separates_blocks() {
        assert_eq!(html_to_text("<h2>Intro</h2><p>Body</p>"), "Intro Body");
        assert_eq!(
            html_to_text("<ul><li>One</li><li>Two</li></ul>Line<br/>break"),
            "One Two Line break"
        );
        assert_eq!(
            html_to_text("<p>Spread\n   over <strong>lines</strong></p>\n\n<P CLASS=\"x\">Next</P>"),
            "Spread over lines Next"
        );
    }

    #[test]
    fn test_taxonomy_collection() {
        assert_eq!(TaxonomyKind::Tag.collection(), "tags");
        assert_eq!(TaxonomyKind::Category.collection(), "categories");
        assert_eq!(TaxonomyKind::Category.to_string(), "category");
    }
}
