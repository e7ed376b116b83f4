use crate::graph::{CrawlGraph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A structural problem with a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// No internal page links here (the seed is exempt)
    Orphan,
    /// The page links nowhere inside the site
    DeadEnd,
    /// The page's score is below the low-authority threshold (the seed is exempt)
    LowAuthority,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orphan => "orphan",
            Self::DeadEnd => "dead-end",
            Self::LowAuthority => "low-authority",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The issues matched by one node, in a stable order
pub type IssueSet = BTreeSet<IssueKind>;

/// How the low-authority threshold is derived from the scores
///
/// Configured in TOML as e.g. `low-authority = { policy = "relative", fraction = 0.5 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum LowAuthorityPolicy {
    /// Below `fraction` of the uniform score 1/N
    Relative { fraction: f64 },
    /// Strictly below the score found at this rank percentile (0 = lowest)
    Percentile { percentile: f64 },
    /// Below a fixed score
    Absolute { cutoff: f64 },
}

impl Default for LowAuthorityPolicy {
    fn default() -> Self {
        Self::Relative { fraction: 0.5 }
    }
}

impl LowAuthorityPolicy {
    /// Resolves the policy to a concrete score threshold
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn threshold(&self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }

        match *self {
            Self::Relative { fraction } => fraction / scores.len() as f64,
            Self::Absolute { cutoff } => cutoff,
            Self::Percentile { percentile } => {
                let mut sorted = scores.to_vec();
                sorted.sort_by(f64::total_cmp);
                let idx = ((sorted.len() as f64) * percentile).floor() as usize;
                sorted[idx.min(sorted.len() - 1)]
            }
        }
    }
}

/// Issues found for every node of a graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueReport {
    /// One set per node, indexed by node id
    pub per_node: Vec<IssueSet>,
    /// The low-authority threshold that was applied
    pub threshold: f64,
}

impl IssueReport {
    pub fn issues(&self, id: NodeId) -> Option<&IssueSet> {
        self.per_node.get(id)
    }

    /// Number of nodes carrying `kind`
    pub fn count(&self, kind: IssueKind) -> usize {
        self.per_node.iter().filter(|s| s.contains(&kind)).count()
    }
}

/// Classifies every node of `graph`
///
/// `scores` is indexed by node id and must hold one score per node.
pub fn detect(graph: &CrawlGraph, scores: &[f64], policy: &LowAuthorityPolicy) -> IssueReport {
    let threshold = policy.threshold(scores);
    let seed = graph.seed();

    let per_node = (0..graph.len())
        .map(|id| {
            let is_seed = seed == Some(id);
            let mut issues = IssueSet::new();

            if graph.in_degree(id) == 0 && !is_seed {
                issues.insert(IssueKind::Orphan);
            }
            if graph.out_degree(id) == 0 {
                issues.insert(IssueKind::DeadEnd);
            }
            if !is_seed && scores.get(id).is_some_and(|&s| s < threshold) {
                issues.insert(IssueKind::LowAuthority);
            }

            issues
        })
        .collect();

    IssueReport {
        per_node,
        threshold,
    }
}
