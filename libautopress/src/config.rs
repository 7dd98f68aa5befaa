//! Configuration management for Autopress
//!
//! Settings come from a TOML file (`$AUTOPRESS_CONFIG` or
//! `~/.config/autopress/config.toml`). Credentials can also be supplied
//! through environment variables, which take precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

const FALLBACK_DATABASE_PATH: &str = "~/.local/share/autopress/storage.db";

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = resolve_data_path()
            .map(|dir| dir.join("storage.db").to_string_lossy().into_owned())
            .unwrap_or_else(|_| FALLBACK_DATABASE_PATH.to_string());
        Self { path }
    }
}

/// Timing of the publish loop, as humantime strings ("3days", "60m")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub publish_interval: String,
    pub failure_cooldown: String,
    pub poll_interval: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            publish_interval: "3days".to_string(),
            failure_cooldown: "60m".to_string(),
            poll_interval: "5m".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub word_count: u32,
    pub tone: String,
    /// Attempts per request when the API answers 429
    pub max_attempts: u32,
    pub retry_base_delay: String,
    pub request_timeout: String,
    /// Keep a local copy of every generated image here
    pub image_dir: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            word_count: 900,
            tone: "informative".to_string(),
            max_attempts: 3,
            retry_base_delay: "2s".to_string(),
            request_timeout: "120s".to_string(),
            image_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub app_password: Option<String>,
    pub post_status: String,
    pub request_timeout: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            app_password: None,
            post_status: "publish".to_string(),
            request_timeout: "30s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub enabled: bool,
    /// Pause between two networks
    pub post_delay: String,
    pub facebook: Option<FacebookConfig>,
    pub threads: Option<ThreadsConfig>,
    pub instagram: Option<InstagramConfig>,
    pub twitter: Option<TwitterConfig>,
    pub vk: Option<VkConfig>,
    pub telegram: Option<TelegramConfig>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            post_delay: "2s".to_string(),
            facebook: None,
            threads: None,
            instagram: None,
            twitter: None,
            vk: None,
            telegram: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    pub page_id: String,
    pub access_token: String,
    #[serde(default = "default_graph_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadsConfig {
    pub user_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    pub user_id: String,
    pub access_token: String,
    #[serde(default = "default_graph_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// OAuth 2.0 user-context access token with `tweet.write`
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VkConfig {
    /// Community id without the leading minus
    pub group_id: String,
    pub access_token: String,
    #[serde(default = "default_vk_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub channel_id: String,
}

fn default_graph_version() -> String {
    "v18.0".to_string()
}

fn default_vk_version() -> String {
    "5.131".to_string()
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: defaults are used and environment
    /// overrides applied on top.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("AUTOPRESS_DB_PATH") {
            self.database.path = path;
        }

        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.generator.api_key = Some(key);
        }

        if let Some(url) = lookup("WP_BASE_URL") {
            self.cms.base_url = Some(url);
        }
        if let Some(user) = lookup("WP_USERNAME") {
            self.cms.username = Some(user);
        }
        if let Some(password) = lookup("WP_APP_PASSWORD") {
            self.cms.app_password = Some(password);
        }

        if let Some(flag) = lookup("AUTOPRESS_SOCIAL_ENABLED") {
            self.social.enabled = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let (Some(page_id), Some(access_token)) =
            (lookup("FACEBOOK_PAGE_ID"), lookup("FACEBOOK_ACCESS_TOKEN"))
        {
            self.social.facebook = Some(FacebookConfig {
                page_id,
                access_token,
                api_version: default_graph_version(),
            });
        }
        if let (Some(user_id), Some(access_token)) =
            (lookup("THREADS_USER_ID"), lookup("THREADS_ACCESS_TOKEN"))
        {
            self.social.threads = Some(ThreadsConfig {
                user_id,
                access_token,
            });
        }
        if let (Some(user_id), Some(access_token)) =
            (lookup("INSTAGRAM_USER_ID"), lookup("INSTAGRAM_ACCESS_TOKEN"))
        {
            self.social.instagram = Some(InstagramConfig {
                user_id,
                access_token,
                api_version: default_graph_version(),
            });
        }
        if let Some(access_token) = lookup("TWITTER_ACCESS_TOKEN") {
            self.social.twitter = Some(TwitterConfig { access_token });
        }
        if let (Some(group_id), Some(access_token)) =
            (lookup("VK_GROUP_ID"), lookup("VK_ACCESS_TOKEN"))
        {
            self.social.vk = Some(VkConfig {
                group_id,
                access_token,
                api_version: default_vk_version(),
            });
        }
        if let (Some(bot_token), Some(channel_id)) =
            (lookup("TELEGRAM_BOT_TOKEN"), lookup("TELEGRAM_CHANNEL_ID"))
        {
            self.social.telegram = Some(TelegramConfig {
                bot_token,
                channel_id,
            });
        }
    }

    /// Database path with `~` expanded
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database.path).to_string())
    }
}

/// Parse a humantime duration string, naming the field on failure
pub fn parse_duration_field(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("'{}' is not a duration ({})", value, e),
        }
        .into()
    })
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("AUTOPRESS_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("autopress").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("autopress"))
}
