//! Ranking module
//!
//! Power-iteration PageRank over a frozen [`CrawlGraph`](crate::graph::CrawlGraph).

mod pagerank;

pub use pagerank::{compute, PageRankParams, PageRankResult};
