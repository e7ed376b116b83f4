//! URL handling module for Sumi-Rank
//!
//! This module provides canonical URL normalization, domain extraction and the
//! same-site test that keeps a crawl inside one domain.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, relative_path, same_site};
pub use normalize::{is_asset_path, normalize_url, parse_seed};
pub(crate) use normalize::canonicalize;
