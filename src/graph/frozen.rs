use crate::graph::{LinkEdge, NodeId, PageNode};
use std::collections::HashMap;

/// Immutable link graph produced by [`GraphBuilder::finalize`]
///
/// Every edge endpoint is a valid node id. Adjacency lists are built once at
/// construction; nothing mutates the graph afterwards. Scores are attached by
/// building a new graph with [`CrawlGraph::with_scores`].
///
/// [`GraphBuilder::finalize`]: crate::graph::GraphBuilder::finalize
#[derive(Debug, Clone)]
pub struct CrawlGraph {
    nodes: Vec<PageNode>,
    edges: Vec<LinkEdge>,
    incoming: Vec<Vec<NodeId>>,
    outgoing: Vec<Vec<NodeId>>,
    index: HashMap<String, NodeId>,
    seed: Option<NodeId>,
}

impl CrawlGraph {
    pub(crate) fn from_parts(
        nodes: Vec<PageNode>,
        edges: Vec<LinkEdge>,
        seed: Option<NodeId>,
    ) -> Self {
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut outgoing = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            outgoing[edge.source].push(edge.target);
            incoming[edge.target].push(edge.source);
        }

        let index = nodes
            .iter()
            .enumerate()
            .map(|(id, node)| (node.url.as_str().to_string(), id))
            .collect();

        Self {
            nodes,
            edges,
            incoming,
            outgoing,
            index,
            seed,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[PageNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&PageNode> {
        self.nodes.get(id)
    }

    pub fn edges(&self) -> &[LinkEdge] {
        &self.edges
    }

    /// The crawl root, if it survived to the frozen graph
    pub fn seed(&self) -> Option<NodeId> {
        self.seed
    }

    /// Finds a node by canonical URL
    pub fn find(&self, url: &str) -> Option<NodeId> {
        self.index.get(url).copied()
    }

    /// Nodes linking to `id`
    pub fn incoming(&self, id: NodeId) -> &[NodeId] {
        &self.incoming[id]
    }

    /// Nodes `id` links to
    pub fn outgoing(&self, id: NodeId) -> &[NodeId] {
        &self.outgoing[id]
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.incoming[id].len()
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.outgoing[id].len()
    }

    /// Returns a copy of the graph with one score assigned per node
    ///
    /// `scores` is indexed by node id; missing entries leave the score unset.
    pub fn with_scores(&self, scores: &[f64]) -> Self {
        let mut graph = self.clone();
        for (node, score) in graph.nodes.iter_mut().zip(scores) {
            node.score = Some(*score);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::GraphBuilder;
    use url::Url;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_degrees() {
        let mut builder = GraphBuilder::new();
        builder.set_seed(&url("/"));
        builder.add_edge(&url("/"), &url("/a"));
        builder.add_edge(&url("/"), &url("/b"));
        builder.add_edge(&url("/a"), &url("/b"));
        let graph = builder.finalize();

        let root = graph.find("https://example.com/").unwrap();
        let b = graph.find("https://example.com/b").unwrap();
        assert_eq!(graph.out_degree(root), 2);
        assert_eq!(graph.in_degree(root), 0);
        assert_eq!(graph.in_degree(b), 2);
        assert_eq!(graph.out_degree(b), 0);
        assert_eq!(graph.incoming(b).len(), 2);
    }

    #[test]
    fn test_with_scores_leaves_original_untouched() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(&url("/"), &url("/a"));
        let graph = builder.finalize();

        let scored = graph.with_scores(&[0.25, 0.75]);
        assert_eq!(scored.node(1).unwrap().score, Some(0.75));
        assert_eq!(graph.node(1).unwrap().score, None);
    }
}
