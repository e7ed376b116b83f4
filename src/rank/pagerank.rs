//! `PageRank` by power iteration with uniform redistribution of dangling mass.

use crate::config::RankConfig;
use crate::graph::CrawlGraph;
use serde::Serialize;

/// Parameters for one PageRank run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankParams {
    /// Damping factor, in (0, 1)
    pub alpha: f64,
    /// L1 change below which the iteration has converged
    pub tolerance: f64,
    /// Iteration cap
    pub max_iterations: usize,
}

impl Default for PageRankParams {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

impl PageRankParams {
    /// Builds parameters from static configuration with a per-crawl alpha
    pub fn from_config(config: &RankConfig, alpha: f64) -> Self {
        Self {
            alpha,
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
        }
    }
}

/// Scores produced by [`compute`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRankResult {
    /// One score per node, indexed by node id, summing to 1
    pub scores: Vec<f64>,
    /// Iterations performed
    pub iterations: usize,
    /// L1 change of the last iteration
    pub residual: f64,
    /// False when the iteration cap was hit first
    pub converged: bool,
}

/// Computes `PageRank` scores for every node of a frozen graph
///
/// Each step applies
/// `r'[j] = (1-α)/N + α * (Σ_{i→j} r[i]/outdeg(i) + dangling/N)`
/// where `dangling` is the rank held by nodes without outbound links. Hitting
/// the iteration cap is not an error: the result is returned with
/// `converged == false`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute(graph: &CrawlGraph, params: &PageRankParams) -> PageRankResult {
    if graph.is_empty() {
        return PageRankResult {
            scores: Vec::new(),
            iterations: 0,
            residual: 0.0,
            converged: true,
        };
    }

    let n = graph.len() as f64;
    let mut ranks = vec![1.0 / n; graph.len()];
    let mut iterations = 0;
    let mut residual = f64::INFINITY;

    while iterations < params.max_iterations {
        let next = iterate_once(graph, &ranks, params.alpha, n);
        residual = l1_distance(&ranks, &next);
        ranks = next;
        iterations += 1;

        tracing::trace!("PageRank iteration {}: residual {:e}", iterations, residual);

        if residual < params.tolerance {
            break;
        }
    }

    let converged = residual < params.tolerance;
    if !converged {
        tracing::warn!(
            "PageRank did not converge after {} iterations (residual {:e})",
            iterations,
            residual
        );
    }

    normalize(&mut ranks);

    PageRankResult {
        scores: ranks,
        iterations,
        residual,
        converged,
    }
}

fn iterate_once(graph: &CrawlGraph, ranks: &[f64], alpha: f64, n: f64) -> Vec<f64> {
    let dangling: f64 = (0..graph.len())
        .filter(|&id| graph.out_degree(id) == 0)
        .map(|id| ranks[id])
        .sum();

    let teleport = (1.0 - alpha) / n;
    let dangling_share = dangling / n;

    (0..graph.len())
        .map(|target| {
            let incoming = compute_incoming_rank(graph, ranks, target);
            teleport + alpha * (incoming + dangling_share)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn compute_incoming_rank(graph: &CrawlGraph, ranks: &[f64], target: usize) -> f64 {
    graph
        .incoming(target)
        .iter()
        .map(|&source| ranks[source] / graph.out_degree(source) as f64)
        .sum()
}

fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

fn normalize(ranks: &mut [f64]) {
    let total: f64 = ranks.iter().sum();
    if total > 0.0 {
        for rank in ranks.iter_mut() {
            *rank /= total;
        }
    }
}
