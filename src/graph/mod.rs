//! Link graph module
//!
//! The crawl loop grows a [`GraphBuilder`] one page at a time; once the frontier
//! has drained the builder is frozen into an immutable [`CrawlGraph`] that the
//! PageRank engine and the issue detector read.
//!
//! # Components
//!
//! - `PageNode` / `LinkEdge`: the fixed node and edge schema
//! - `GraphBuilder`: append-only graph used while crawling
//! - `CrawlGraph`: frozen graph with adjacency lists

mod builder;
mod frozen;

pub use builder::{GraphBuilder, RedirectOutcome};
pub use frozen::CrawlGraph;

use crate::state::FetchStatus;
use url::Url;

/// Index of a node inside a graph
pub type NodeId = usize;

/// A page in the crawl graph
#[derive(Debug, Clone, PartialEq)]
pub struct PageNode {
    /// Canonical URL of the page
    pub url: Url,

    /// Fetch outcome so far
    pub status: FetchStatus,

    /// HTTP status code, when a response was received
    pub http_status: Option<u16>,

    /// Contents of the `<title>` tag, when the page was fetched
    pub title: Option<String>,

    /// Number of external links found on the page (counted, never graphed)
    pub external_links: usize,

    /// PageRank score; unset until the graph is ranked
    pub score: Option<f64>,
}

impl PageNode {
    /// Creates a pending node for a URL
    pub fn pending(url: Url) -> Self {
        Self {
            url,
            status: FetchStatus::Pending,
            http_status: None,
            title: None,
            external_links: 0,
            score: None,
        }
    }
}

/// A directed link between two pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkEdge {
    pub source: NodeId,
    pub target: NodeId,
}
