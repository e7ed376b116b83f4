//! Configuration module for Sumi-Rank
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a file is the same as running
//! with an empty one.
//!
//! # Example
//!
//! ```no_run
//! use sumi_rank::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sumi-rank.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DisconnectPolicy, FetchConfig, IssueConfig, RankConfig, SessionConfig,
    UserAgentConfig, MAX_PAGES_LIMIT, MIN_PAGES_LIMIT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
