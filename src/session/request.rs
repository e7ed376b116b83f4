//! Crawl requests and the per-session settings derived from them

use crate::config::{Config, MAX_PAGES_LIMIT, MIN_PAGES_LIMIT};
use crate::issues::LowAuthorityPolicy;
use crate::rank::PageRankParams;
use crate::url::parse_seed;
use crate::{RankError, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// A request to analyze one site
///
/// Omitted fields fall back to the configuration defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrawlRequest {
    /// Seed URL; `https://` is assumed when no scheme is given
    pub url: String,

    #[serde(default)]
    pub max_pages: Option<usize>,

    #[serde(default)]
    pub alpha: Option<f64>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pages: None,
            alpha: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Validates the request and resolves it against `config`
    ///
    /// The seed must parse as an http(s) URL and alpha must lie strictly
    /// between 0 and 1. An out-of-range page cap is clamped rather than
    /// rejected.
    pub fn resolve(&self, config: &Config) -> Result<CrawlSettings> {
        let seed = parse_seed(&self.url).map_err(|source| RankError::InvalidSeed {
            url: self.url.clone(),
            source,
        })?;

        let alpha = self.alpha.unwrap_or(config.rank.alpha);
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(RankError::InvalidParameter(format!(
                "alpha must be strictly between 0 and 1, got {}",
                alpha
            )));
        }

        let requested = self.max_pages.unwrap_or(config.crawler.max_pages);
        let max_pages = requested.clamp(MIN_PAGES_LIMIT, MAX_PAGES_LIMIT);
        if max_pages != requested {
            tracing::debug!("Clamped max_pages {} to {}", requested, max_pages);
        }

        Ok(CrawlSettings {
            seed,
            max_pages,
            max_concurrent_fetches: config.crawler.max_concurrent_fetches.max(1),
            politeness_delay: Duration::from_millis(config.crawler.politeness_delay_ms),
            max_body_bytes: config.fetch.max_body_bytes,
            rank: PageRankParams::from_config(&config.rank, alpha),
            low_authority: config.issues.low_authority,
        })
    }
}

/// Everything one crawl session needs, resolved up front
///
/// Sessions never read global state; each crawl loop owns its settings.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub seed: Url,
    pub max_pages: usize,
    pub max_concurrent_fetches: usize,
    pub politeness_delay: Duration,
    pub max_body_bytes: usize,
    pub rank: PageRankParams,
    pub low_authority: LowAuthorityPolicy,
}

impl CrawlSettings {
    pub fn alpha(&self) -> f64 {
        self.rank.alpha
    }
}
