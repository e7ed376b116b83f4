use crate::graph::{CrawlGraph, LinkEdge, NodeId, PageNode};
use crate::state::FetchStatus;
use std::collections::{HashMap, HashSet};
use url::Url;

/// What happened to a node when its fetch ended on a different URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The final URL is the node's own URL
    Unchanged(NodeId),

    /// The node now lives under the final URL
    Renamed(NodeId),

    /// The final URL already had a node; the requested node was folded into it
    Merged { into: NodeId },
}

impl RedirectOutcome {
    /// The node that carries the page after the redirect was resolved
    pub fn node(&self) -> NodeId {
        match *self {
            Self::Unchanged(id) | Self::Renamed(id) => id,
            Self::Merged { into } => into,
        }
    }
}

/// Append-only link graph grown by the crawl loop
///
/// Only one owner mutates a builder. Nodes are created on first sight of a URL
/// (as a link target or as the seed) and start out pending. Redirects may
/// rename a node or merge it into another; merged slots are tombstoned and
/// dropped when the graph is frozen.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Option<PageNode>>,
    index: HashMap<String, NodeId>,
    edges: Vec<LinkEdge>,
    edge_set: HashSet<LinkEdge>,
    seed: Option<NodeId>,
    live: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the seed node and remembers it as the crawl root
    pub fn set_seed(&mut self, url: &Url) -> NodeId {
        let (id, _) = self.add_node(url);
        self.seed = Some(id);
        id
    }

    /// Returns the seed node, if one was set
    pub fn seed(&self) -> Option<NodeId> {
        self.seed
    }

    /// Adds a pending node for `url` unless one exists
    ///
    /// Returns the node id and whether it was created.
    pub fn add_node(&mut self, url: &Url) -> (NodeId, bool) {
        if let Some(&id) = self.index.get(url.as_str()) {
            return (id, false);
        }

        let id = self.nodes.len();
        self.nodes.push(Some(PageNode::pending(url.clone())));
        self.index.insert(url.as_str().to_string(), id);
        self.live += 1;
        (id, true)
    }

    /// Looks up the node a URL (or a URL that redirected) maps to
    pub fn node_id(&self, url: &str) -> Option<NodeId> {
        self.index.get(url).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&PageNode> {
        self.nodes.get(id).and_then(|n| n.as_ref())
    }

    /// Adds a directed edge, creating missing endpoints
    ///
    /// Self-loops and duplicate edges are ignored. Returns true if an edge was
    /// added.
    pub fn add_edge(&mut self, source: &Url, target: &Url) -> bool {
        let (source, _) = self.add_node(source);
        let (target, _) = self.add_node(target);
        self.insert_edge(LinkEdge { source, target })
    }

    fn insert_edge(&mut self, edge: LinkEdge) -> bool {
        if edge.source == edge.target || !self.edge_set.insert(edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Records the outcome of fetching a node
    pub fn record_fetch(
        &mut self,
        id: NodeId,
        status: FetchStatus,
        http_status: Option<u16>,
        title: Option<String>,
        external_links: usize,
    ) {
        if let Some(Some(node)) = self.nodes.get_mut(id) {
            node.status = status;
            node.http_status = http_status;
            node.title = title;
            node.external_links = external_links;
        }
    }

    /// Moves the node for `requested` to the URL the fetch actually ended on
    ///
    /// When `final_url` is unknown the node is renamed. When another node
    /// already owns `final_url`, the requested node is merged into it: inbound
    /// edges are re-pointed, resulting self-loops and duplicates are dropped,
    /// and the seed designation follows the merge.
    pub fn resolve_redirect(&mut self, requested: NodeId, final_url: &Url) -> RedirectOutcome {
        match self.index.get(final_url.as_str()).copied() {
            Some(existing) if existing == requested => RedirectOutcome::Unchanged(requested),
            Some(existing) => {
                self.merge(requested, existing);
                RedirectOutcome::Merged { into: existing }
            }
            None => {
                if let Some(Some(node)) = self.nodes.get_mut(requested) {
                    node.url = final_url.clone();
                }
                self.index.insert(final_url.as_str().to_string(), requested);
                RedirectOutcome::Renamed(requested)
            }
        }
    }

    fn merge(&mut self, from: NodeId, into: NodeId) {
        if self.nodes.get_mut(from).and_then(Option::take).is_none() {
            return;
        }
        self.live -= 1;

        for id in self.index.values_mut() {
            if *id == from {
                *id = into;
            }
        }

        if self.seed == Some(from) {
            self.seed = Some(into);
        }

        let old_edges = std::mem::take(&mut self.edges);
        self.edge_set.clear();
        for edge in old_edges {
            let remap = |id: NodeId| if id == from { into } else { id };
            self.insert_edge(LinkEdge {
                source: remap(edge.source),
                target: remap(edge.target),
            });
        }
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Freezes the builder into an immutable graph
    ///
    /// Live nodes keep their relative order; ids are compacted.
    pub fn finalize(self) -> CrawlGraph {
        let mut remap = vec![None; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.live);

        for (old, node) in self.nodes.into_iter().enumerate() {
            if let Some(node) = node {
                remap[old] = Some(nodes.len());
                nodes.push(node);
            }
        }

        let edges = self
            .edges
            .into_iter()
            .filter_map(|e| {
                Some(LinkEdge {
                    source: remap[e.source]?,
                    target: remap[e.target]?,
                })
            })
            .collect();

        let seed = self.seed.and_then(|s| remap[s]);
        CrawlGraph::from_parts(nodes, edges, seed)
    }
}
