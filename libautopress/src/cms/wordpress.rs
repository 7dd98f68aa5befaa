//! WordPress REST API (`/wp-json/wp/v2`) with application-password auth

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{decode_entities, html_to_text, Cms, CreatedPost, NewPost, PostDetails, TaxonomyKind};
use crate::config::{parse_duration_field, CmsConfig};
use crate::error::{CmsError, Result};
use crate::types::MediaAsset;

pub struct WordPressClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: SecretString,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: i64,
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TermResponse {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: i64,
    link: Option<String>,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    status: String,
    title: Option<Rendered>,
    excerpt: Option<Rendered>,
    content: Option<Rendered>,
    date: Option<String>,
    modified: Option<String>,
    featured_media: Option<i64>,
    #[serde(default)]
    categories: Vec<i64>,
    #[serde(default)]
    tags: Vec<i64>,
}

impl From<PostResponse> for PostDetails {
    fn from(post: PostResponse) -> Self {
        let rendered = |r: Option<Rendered>| r.map(|r| html_to_text(&r.rendered)).unwrap_or_default();
        PostDetails {
            id: post.id,
            title: rendered(post.title),
            slug: post.slug,
            status: post.status,
            link: post.link,
            date: post.date,
            modified: post.modified,
            excerpt: rendered(post.excerpt),
            content_text: rendered(post.content),
            featured_media: post.featured_media.filter(|id| *id > 0),
            categories: post.categories,
            tags: post.tags,
        }
    }
}

impl WordPressClient {
    /// Build a client; base URL, username and application password are required
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let base_url = required(&config.base_url, "cms.base_url / WP_BASE_URL")?;
        let username = required(&config.username, "cms.username / WP_USERNAME")?;
        let password = required(&config.app_password, "cms.app_password / WP_APP_PASSWORD")?;

        let timeout = parse_duration_field("cms.request_timeout", &config.request_timeout)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CmsError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            // Application passwords are displayed with spaces; the API wants them removed
            password: SecretString::from(password.replace(' ', "")),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.authed(request)
            .send()
            .await
            .map_err(|e| CmsError::Network(e.to_string()).into())
    }

    async fn find_term(&self, kind: TaxonomyKind, name: &str) -> Result<Option<i64>> {
        let response = self
            .send(
                self.client
                    .get(self.url(kind.collection()))
                    .query(&[("search", name), ("per_page", "100")]),
            )
            .await?;
        let response = check_status(response).await?;

        let terms: Vec<TermResponse> = response
            .json()
            .await
            .map_err(|e| CmsError::Malformed(e.to_string()))?;

        Ok(exact_match(&terms, name))
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CmsError::NotConfigured(format!("missing {}", field)).into())
}

/// Map auth failures and other non-2xx statuses to errors
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(300)
        .collect();
    Err(match status.as_u16() {
        401 | 403 => CmsError::Authentication(format!("{}: {}", status, body)),
        code => CmsError::Rejected { status: code, body },
    }
    .into())
}

/// Search results are fuzzy; only an exact, case-insensitive name counts
fn exact_match(terms: &[TermResponse], name: &str) -> Option<i64> {
    let wanted = name.trim().to_lowercase();
    terms
        .iter()
        .find(|t| decode_entities(&t.name).trim().to_lowercase() == wanted)
        .map(|t| t.id)
}

/// Keep upload names header-safe
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if cleaned.is_empty() {
        "image.png".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl Cms for WordPressClient {
    async fn upload_media(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<MediaAsset> {
        let file_name = sanitize_file_name(file_name);
        let response = self
            .send(
                self.client
                    .post(self.url("media"))
                    .header(
                        reqwest::header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    )
                    .header(reqwest::header::CONTENT_TYPE, mime_type)
                    .body(bytes.to_vec()),
            )
            .await?;
        let response = check_status(response).await?;

        let media: MediaResponse = response
            .json()
            .await
            .map_err(|e| CmsError::Malformed(e.to_string()))?;

        info!("Uploaded media {} as id {}", file_name, media.id);
        Ok(MediaAsset {
            id: media.id,
            source_url: media.source_url,
        })
    }

    async fn resolve_term(&self, kind: TaxonomyKind, name: &str) -> Result<i64> {
        if let Some(id) = self.find_term(kind, name).await? {
            debug!("Found existing {} '{}' (id {})", kind, name, id);
            return Ok(id);
        }

        let response = self
            .send(
                self.client
                    .post(self.url(kind.collection()))
                    .json(&json!({ "name": name })),
            )
            .await?;
        let response = check_status(response).await?;

        let term: TermResponse = response
            .json()
            .await
            .map_err(|e| CmsError::Malformed(e.to_string()))?;

        info!("Created {} '{}' (id {})", kind, name, term.id);
        Ok(term.id)
    }

    async fn create_post(&self, post: &NewPost) -> Result<CreatedPost> {
        let response = self
            .send(self.client.post(self.url("posts")).json(post))
            .await?;

        let status = response.status();
        if status.as_u16() != 201 {
            let response = check_status(response).await?;
            // 2xx other than 201 means the post was not created
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            }
            .into());
        }

        let created: PostResponse = response
            .json()
            .await
            .map_err(|e| CmsError::Malformed(e.to_string()))?;

        info!(
            "Created post id {} ({})",
            created.id,
            created.link.as_deref().unwrap_or("no link")
        );
        Ok(CreatedPost {
            id: created.id,
            link: created.link,
        })
    }

    async fn get_post(&self, id: i64) -> Result<PostDetails> {
        let response = self
            .send(self.client.get(self.url(&format!("posts/{}", id))))
            .await?;
        let response = check_status(response).await?;

        let post: PostResponse = response
            .json()
            .await
            .map_err(|e| CmsError::Malformed(e.to_string()))?;

        Ok(post.into())
    }
}
