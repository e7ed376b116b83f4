//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The bounded, deduplicating frontier
//! - HTTP fetching with size and time limits
//! - HTML parsing and link extraction
//! - The per-session crawl loop

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{analyze, Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, fetch_url, FetchedPage};
pub use frontier::{Admission, Frontier};
pub use parser::{parse_html, PageLinks, ParsedPage};
