use crate::issues::LowAuthorityPolicy;
use serde::Deserialize;

/// Smallest page cap a crawl request may ask for
pub const MIN_PAGES_LIMIT: usize = 5;

/// Largest page cap a crawl request may ask for
pub const MAX_PAGES_LIMIT: usize = 200;

/// Main configuration structure for Sumi-Rank
///
/// This is static configuration shared by every session. Per-crawl values
/// (seed, page cap, damping factor) arrive with each request and override the
/// defaults held here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub rank: RankConfig,
    pub issues: IssueConfig,
    pub session: SessionConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page cap used when a request does not name one
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum number of fetches in flight per session
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: usize,

    /// Delay awaited before dispatching each fetch (milliseconds)
    #[serde(rename = "politeness-delay")]
    pub politeness_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_concurrent_fetches: 4,
            politeness_delay_ms: 150,
        }
    }
}

/// HTTP fetch bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Maximum accepted body size in bytes
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            connect_timeout_secs: 3,
            max_redirects: 5,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Sumi-Rank".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/SiliconLion/sumi".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// PageRank parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Damping factor used when a request does not name one
    pub alpha: f64,

    /// L1 change between iterations below which the iteration stops
    pub tolerance: f64,

    /// Iteration cap
    #[serde(rename = "max-iterations")]
    pub max_iterations: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

/// Issue detection parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    #[serde(rename = "low-authority")]
    pub low_authority: LowAuthorityPolicy,
}

/// What a session does when its consumer goes away mid-crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisconnectPolicy {
    /// Cancel outstanding fetches and mark the session cancelled
    #[default]
    Cancel,
    /// Keep crawling in the background and keep the result until the TTL
    Complete,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session may live before it is reaped
    #[serde(rename = "ttl")]
    pub ttl_secs: u64,

    /// Seconds between background reaping passes
    #[serde(rename = "reap-interval")]
    pub reap_interval_secs: u64,

    /// Capacity of the per-session event channel
    #[serde(rename = "event-buffer")]
    pub event_buffer: usize,

    #[serde(rename = "on-disconnect")]
    pub on_disconnect: DisconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            reap_interval_secs: 60,
            event_buffer: 64,
            on_disconnect: DisconnectPolicy::Cancel,
        }
    }
}
