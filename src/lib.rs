//! Sumi-Rank: a link-authority analyzer for a single website
//!
//! This crate crawls a site from a seed URL, builds the internal link graph,
//! scores every page with PageRank, flags structural issues (orphans, dead ends,
//! low-authority pages) and streams progress to one consumer per crawl session.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod issues;
pub mod output;
pub mod rank;
pub mod session;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Rank operations
#[derive(Debug, Error)]
pub enum RankError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {source}")]
    InvalidSeed { url: String, source: UrlError },

    #[error("Invalid crawl parameter: {0}")]
    InvalidParameter(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unknown session: {0}")]
    SessionNotFound(String),

    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal failure: {0}")]
    Internal(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Per-page fetch failures
///
/// None of these end a crawl; the page is kept in the graph as a failed node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Expected HTML, got {0}")]
    NotHtml(String),

    #[error("Redirect error: {0}")]
    Redirect(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Sumi-Rank operations
pub type Result<T> = std::result::Result<T, RankError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for a single page fetch
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use session::{CrawlEvent, CrawlRequest, EventStream, SessionId, SessionManager};
pub use state::{FetchStatus, SessionStatus};
pub use crate::url::{extract_domain, normalize_url, same_site};
