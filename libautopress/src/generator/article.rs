//! Turning the model's free-form reply into a validated [`Article`]
//!
//! The model is asked for a JSON object but often wraps it in Markdown
//! fences or adds a sentence before it. Extraction takes the first fenced
//! block, otherwise the outermost `{...}` span.

use serde_json::{Map, Value};

use crate::error::{AutopressError, GenerationError, Result};

pub const MIN_TITLE_CHARS: usize = 10;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MIN_CONTENT_CHARS: usize = 500;
pub const MAX_KEYWORDS: usize = 10;

/// JSON keys that must never leak into rendered content
const LEAKED_KEY_FRAGMENTS: &[&str] = &[
    "\"content_html\":",
    "\"title\":",
    "\"slug\":",
    "\"meta_description\":",
];

/// A generated article that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub slug: String,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
    pub content_html: String,
    pub image_prompt: String,
}

/// Prompt asking for a structured article
pub fn article_prompt(seed: &str, seo_focus: &str, tone: &str, word_count: u32) -> String {
    let focus = if seo_focus.trim().is_empty() {
        seed
    } else {
        seo_focus
    };

    format!(
        r#"You are a professional content writer specializing in AI and technology topics.

Write a comprehensive, SEO-optimized blog article with the following requirements:

TOPIC: {seed}
SEO FOCUS: {focus}
TONE: {tone}
TARGET LENGTH: {word_count} words

REQUIREMENTS:
1. Use a clear structure with H2 and H3 headings
2. Include practical examples and insights
3. Use keywords naturally
4. Include a strong introduction and conclusion
5. Format the body as HTML (h2, h3, p, ul, ol, strong, em)

Return ONLY a JSON object with this exact structure:
{{
    "title": "Compelling article title (60-70 characters)",
    "slug": "url-friendly-slug",
    "meta_description": "Meta description (150-160 characters)",
    "keywords": ["keyword1", "keyword2", "keyword3", "keyword4", "keyword5"],
    "content_html": "Full HTML article body",
    "image_prompt": "Detailed description of a relevant professional illustration"
}}

The article must be written in English."#
    )
}

/// Locate the JSON object inside a model reply
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(block) = first_fenced_block(text) {
        if block.starts_with('{') {
            return Some(block);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn first_fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip an optional language tag such as `json`
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Parse and validate a raw model reply
pub fn parse_article(raw: &str) -> Result<Article> {
    let json = extract_json(raw).ok_or_else(|| {
        GenerationError::Malformed("article response contains no JSON object".to_string())
    })?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| GenerationError::Malformed(format!("article JSON does not parse: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        GenerationError::Malformed("article JSON is not an object".to_string())
    })?;

    article_from_object(object)
}

fn article_from_object(object: &Map<String, Value>) -> Result<Article> {
    let title = required_text(object, &["title"], "title")?;
    let slug_source = required_text(object, &["slug"], "slug")?;
    let content_html = required_text(object, &["content_html", "content"], "content")?;

    validate_title(&title)?;
    validate_content(&content_html)?;

    let slug = normalize_slug(&slug_source);
    if slug.is_empty() {
        return Err(AutopressError::Validation(format!(
            "slug '{}' has no usable characters",
            slug_source
        )));
    }

    let image_prompt = optional_text(object, &["image_prompt"])
        .unwrap_or_else(|| format!("Professional illustration for an article about {}", title));

    Ok(Article {
        meta_description: optional_text(object, &["meta_description", "excerpt"]),
        keywords: normalize_keywords(&string_list(object.get("keywords"))),
        title,
        slug,
        content_html,
        image_prompt,
    })
}

fn optional_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn required_text(object: &Map<String, Value>, keys: &[&str], field: &str) -> Result<String> {
    optional_text(object, keys)
        .ok_or_else(|| AutopressError::Validation(format!("{} is missing or blank", field)))
}

/// Accepts either a JSON array of strings or one comma-separated string
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.contains(['{', '}', '[', ']']) {
        return Err(AutopressError::Validation(format!(
            "title contains JSON syntax: '{}'",
            title
        )));
    }

    let chars = title.chars().count();
    if chars < MIN_TITLE_CHARS {
        return Err(AutopressError::Validation(format!(
            "title is too short ({} characters, minimum {})",
            chars, MIN_TITLE_CHARS
        )));
    }
    if chars > MAX_TITLE_CHARS {
        return Err(AutopressError::Validation(format!(
            "title is too long ({} characters, maximum {})",
            chars, MAX_TITLE_CHARS
        )));
    }

    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    let chars = content.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(AutopressError::Validation(format!(
            "content is too short ({} characters, minimum {})",
            chars, MIN_CONTENT_CHARS
        )));
    }

    if content.starts_with('{') || content.starts_with('[') {
        return Err(AutopressError::Validation(
            "content looks like raw JSON".to_string(),
        ));
    }

    if let Some(fragment) = LEAKED_KEY_FRAGMENTS
        .iter()
        .find(|fragment| content.contains(*fragment))
    {
        return Err(AutopressError::Validation(format!(
            "content still contains the JSON key {}",
            fragment
        )));
    }

    Ok(())
}

/// Lowercase, `-` separated, `[a-z0-9-]` only
pub fn normalize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());

    for c in raw.trim().to_lowercase().chars() {
        let mapped = if c.is_whitespace() || c == '_' || c == '-' {
            '-'
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            continue;
        };

        if mapped == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(mapped);
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Trim, drop blanks and case-insensitive duplicates, keep the first ten
pub fn normalize_keywords(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}
