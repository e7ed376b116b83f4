//! Final crawl report
//!
//! This is the payload of the `complete` event: every node with its score and
//! issues, every edge, and summary counts.

use crate::graph::CrawlGraph;
use crate::issues::{IssueKind, IssueReport};
use crate::rank::PageRankResult;
use crate::state::FetchStatus;
use crate::url::{extract_domain, relative_path};
use serde::Serialize;
use std::cmp::Ordering;

/// One page in the final report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    /// 1-based position when ordered by descending score
    pub rank: usize,
    pub url: String,
    /// Path relative to the crawled site
    pub path: String,
    pub title: Option<String>,
    pub status: FetchStatus,
    pub http_status: Option<u16>,
    pub score: f64,
    pub links_in: usize,
    pub links_out: usize,
    pub issues: Vec<IssueKind>,
}

/// One link in the final report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeReport {
    pub source: String,
    pub target: String,
}

/// Summary counts of a crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub pages: usize,
    pub links: usize,
    pub avg_links: f64,
    pub failed_pages: usize,
    pub external_links: usize,
    pub orphan_count: usize,
    pub dead_end_count: usize,
    pub low_authority_count: usize,
    pub low_authority_threshold: f64,
}

/// How the PageRank run went
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankSummary {
    pub alpha: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Everything a consumer needs to render the analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    pub domain: String,
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<EdgeReport>,
    pub summary: ReportSummary,
    pub pagerank: RankSummary,
}

impl CrawlReport {
    /// Assembles the report from a scored graph and its analysis
    ///
    /// Nodes are ordered by descending score; ties are broken by URL so the
    /// order is stable.
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        graph: &CrawlGraph,
        ranking: &PageRankResult,
        issues: &IssueReport,
        alpha: f64,
    ) -> Self {
        let seed_url = graph
            .seed()
            .and_then(|id| graph.node(id))
            .map(|node| node.url.clone());

        let mut nodes: Vec<NodeReport> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(id, node)| NodeReport {
                rank: 0,
                url: node.url.to_string(),
                path: match &seed_url {
                    Some(seed) => relative_path(&node.url, seed),
                    None => node.url.path().to_string(),
                },
                title: node.title.clone(),
                status: node.status,
                http_status: node.http_status,
                score: node
                    .score
                    .or_else(|| ranking.scores.get(id).copied())
                    .unwrap_or(0.0),
                links_in: graph.in_degree(id),
                links_out: graph.out_degree(id),
                issues: issues
                    .issues(id)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();

        nodes.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.url.cmp(&b.url))
        });
        for (i, node) in nodes.iter_mut().enumerate() {
            node.rank = i + 1;
        }

        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                Some(EdgeReport {
                    source: graph.node(edge.source)?.url.to_string(),
                    target: graph.node(edge.target)?.url.to_string(),
                })
            })
            .collect::<Vec<_>>();

        let pages = graph.len();
        let summary = ReportSummary {
            pages,
            links: edges.len(),
            avg_links: if pages == 0 {
                0.0
            } else {
                edges.len() as f64 / pages as f64
            },
            failed_pages: graph
                .nodes()
                .iter()
                .filter(|n| n.status == FetchStatus::Failed)
                .count(),
            external_links: graph.nodes().iter().map(|n| n.external_links).sum(),
            orphan_count: issues.count(IssueKind::Orphan),
            dead_end_count: issues.count(IssueKind::DeadEnd),
            low_authority_count: issues.count(IssueKind::LowAuthority),
            low_authority_threshold: issues.threshold,
        };

        Self {
            seed: seed_url.as_ref().map(|u| u.to_string()).unwrap_or_default(),
            domain: seed_url.as_ref().and_then(extract_domain).unwrap_or_default(),
            nodes,
            edges,
            summary,
            pagerank: RankSummary {
                alpha,
                iterations: ranking.iterations,
                converged: ranking.converged,
            },
        }
    }

    /// Pages carrying a given issue, in report order
    pub fn pages_with(&self, kind: IssueKind) -> impl Iterator<Item = &NodeReport> {
        self.nodes.iter().filter(move |n| n.issues.contains(&kind))
    }

    /// Looks up a page by canonical URL
    pub fn node(&self, url: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.url == url)
    }
}
