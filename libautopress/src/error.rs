//! Error types for Autopress

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AutopressError>;

#[derive(Error, Debug)]
pub enum AutopressError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Article validation failed: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutopressError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AutopressError::InvalidInput(_) => 3,
            AutopressError::Config(_) => 2,
            // Missing credentials are a configuration problem
            AutopressError::Generation(GenerationError::MissingApiKey(_)) => 2,
            AutopressError::Cms(CmsError::NotConfigured(_)) => 2,
            AutopressError::Database(_) => 1,
            AutopressError::Generation(_) => 1,
            AutopressError::Cms(_) => 1,
            AutopressError::Platform(_) => 1,
            AutopressError::Validation(_) => 1,
            AutopressError::Io(_) => 1,
        }
    }

    /// Whether the failure happened in an upstream service rather than locally
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AutopressError::Generation(_) | AutopressError::Cms(_) | AutopressError::Platform(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Plan {0} is not pending")]
    PlanNotPending(i64),
}

/// Failures talking to the generative content API
#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Request rejected with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response had no usable content: {0}")]
    EmptyResponse(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Failures talking to the CMS REST API
#[derive(Error, Debug, Clone)]
pub enum CmsError {
    #[error("CMS is not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Failures posting to a social network
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}
