//! Directed link graph over documents.
//!
//! [`GraphIndex`] builds the graph from a [`DocumentProvider`] on first use
//! and never mutates it afterwards. Queries about paths that are not in the
//! graph return empty results rather than errors.

use crate::provider::DocumentProvider;
use crate::result::{SearchResult, SearchSource, assign_ranks};
use log::{debug, info, warn};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Score given to backlinks of the expansion root that BFS did not reach
const BACKLINK_SCORE: f32 = 0.9;

/// Adjacency queries over path-identified nodes
pub trait LinkGraph: Send + Sync {
    /// Add a node, returning false if it already existed
    fn add_node(&mut self, path: &str) -> bool;

    /// Add a directed edge, creating missing endpoints; duplicates are ignored
    fn add_edge(&mut self, from: &str, to: &str);

    fn contains(&self, path: &str) -> bool;

    /// All nodes in insertion order
    fn nodes(&self) -> Vec<String>;

    /// Edge targets of `path` in the order the edges were added
    fn successors(&self, path: &str) -> Vec<String>;

    /// Edge sources pointing at `path` in the order the edges were added
    fn predecessors(&self, path: &str) -> Vec<String>;

    fn out_degree(&self, path: &str) -> usize;

    fn in_degree(&self, path: &str) -> usize;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// Fewest-hop path following edge direction
    fn shortest_path(&self, start: &str, end: &str) -> Option<Vec<String>>;

    /// Number of weakly connected components
    fn component_count(&self) -> usize;
}

/// [`LinkGraph`] backed by a petgraph `DiGraph`
#[derive(Debug, Default)]
pub struct PetLinkGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl PetLinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, path: &str) -> Option<NodeIndex> {
        self.index.get(path).copied()
    }

    fn ensure_node(&mut self, path: &str) -> NodeIndex {
        if let Some(idx) = self.node(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_string());
        self.index.insert(path.to_string(), idx);
        idx
    }

    fn neighbors(&self, path: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.node(path) else {
            return Vec::new();
        };

        // petgraph walks adjacency newest-first; edge ids restore insertion order
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id().index(), other)
            })
            .collect();
        edges.sort_unstable_by_key(|(id, _)| *id);

        edges
            .into_iter()
            .map(|(_, other)| self.graph[other].clone())
            .collect()
    }

    fn degree(&self, path: &str, direction: Direction) -> usize {
        self.node(path)
            .map(|idx| self.graph.edges_directed(idx, direction).count())
            .unwrap_or(0)
    }
}

impl LinkGraph for PetLinkGraph {
    fn add_node(&mut self, path: &str) -> bool {
        if self.contains(path) {
            return false;
        }
        self.ensure_node(path);
        true
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        self.graph.update_edge(a, b, ());
    }

    fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    fn nodes(&self) -> Vec<String> {
        self.graph.node_weights().cloned().collect()
    }

    fn successors(&self, path: &str) -> Vec<String> {
        self.neighbors(path, Direction::Outgoing)
    }

    fn predecessors(&self, path: &str) -> Vec<String> {
        self.neighbors(path, Direction::Incoming)
    }

    fn out_degree(&self, path: &str) -> usize {
        self.degree(path, Direction::Outgoing)
    }

    fn in_degree(&self, path: &str) -> usize {
        self.degree(path, Direction::Incoming)
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn shortest_path(&self, start: &str, end: &str) -> Option<Vec<String>> {
        if !self.contains(start) || !self.contains(end) {
            return None;
        }
        if start == end {
            return Some(vec![start.to_string()]);
        }

        let mut previous: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::from([start.to_string()]);
        let mut seen = HashSet::from([start.to_string()]);

        while let Some(current) = queue.pop_front() {
            for next in self.successors(&current) {
                if !seen.insert(next.clone()) {
                    continue;
                }
                previous.insert(next.clone(), current.clone());
                if next == end {
                    let mut path = vec![next];
                    while let Some(prev) = path.last().and_then(|p| previous.get(p)) {
                        path.push(prev.clone());
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}

/// Structural summary of the link graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_notes: usize,
    pub total_links: usize,
    pub avg_out_degree: f64,
    pub avg_in_degree: f64,
    pub connected_components: usize,
}

/// Lazily built, read-only link graph over a provider's documents
pub struct GraphIndex {
    provider: Arc<dyn DocumentProvider>,
    graph: OnceCell<PetLinkGraph>,
}

impl GraphIndex {
    pub fn new(provider: Arc<dyn DocumentProvider>) -> Self {
        Self {
            provider,
            graph: OnceCell::new(),
        }
    }

    /// Build the graph if needed; concurrent first callers share one build
    pub async fn graph(&self) -> &PetLinkGraph {
        self.graph.get_or_init(|| self.build()).await
    }

    pub fn is_built(&self) -> bool {
        self.graph.initialized()
    }

    async fn build(&self) -> PetLinkGraph {
        let paths = self.provider.list_paths().await;
        let listed: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let mut graph = PetLinkGraph::new();

        for path in &paths {
            let Some(document) = self.provider.get_document(path).await else {
                warn!("Skipping {path}: listed but not readable");
                continue;
            };
            graph.add_node(path);

            for link in &document.metadata.links {
                if let Some(target) = resolve_link(link, &listed) {
                    graph.add_edge(path, &target);
                }
            }
        }

        info!(
            "Built link graph: {} notes, {} links",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Resolved link targets of `path`, in link order
    pub async fn outgoing_links(&self, path: &str) -> Vec<String> {
        self.graph().await.successors(path)
    }

    /// Paths linking to `path`
    pub async fn backlinks(&self, path: &str) -> Vec<String> {
        self.graph().await.predecessors(path)
    }

    /// Breadth-first neighborhood of `path`, scored by hop distance.
    ///
    /// A node `d` hops away scores `1 / (d + 1)`; backlinks of `path` that
    /// the walk did not reach score 0.9. Sorting is stable, so equal scores
    /// keep discovery order.
    pub async fn expand_context(&self, path: &str, depth: usize) -> Vec<SearchResult> {
        let graph = self.graph().await;
        if !graph.contains(path) {
            return Vec::new();
        }

        let mut visited: HashSet<String> = HashSet::from([path.to_string()]);
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(path.to_string(), 0)]);
        let mut expanded = Vec::new();

        while let Some((current, distance)) = queue.pop_front() {
            let Some(document) = self.provider.get_document(&current).await else {
                warn!("Graph node {current} has no readable document");
                continue;
            };
            let score = 1.0 / (distance as f32 + 1.0);
            expanded.push(SearchResult::new(document, score, SearchSource::Graph));

            if distance < depth {
                for next in graph.successors(&current) {
                    if visited.insert(next.clone()) {
                        queue.push_back((next, distance + 1));
                    }
                }
            }
        }

        for backlink in graph.predecessors(path) {
            if !visited.insert(backlink.clone()) {
                continue;
            }
            match self.provider.get_document(&backlink).await {
                Some(document) => {
                    expanded.push(SearchResult::new(document, BACKLINK_SCORE, SearchSource::Graph));
                }
                None => warn!("Backlink {backlink} has no readable document"),
            }
        }

        expanded.sort_by(|a, b| b.score.total_cmp(&a.score));
        assign_ranks(&mut expanded);
        debug!("Expanded {path} to {} notes at depth {depth}", expanded.len());
        expanded
    }

    /// Shortest link path from `start` to `end`
    pub async fn find_path(&self, start: &str, end: &str) -> Option<Vec<String>> {
        self.graph().await.shortest_path(start, end)
    }

    /// Most connected notes by in + out degree, ties by path
    pub async fn hub_notes(&self, top_k: usize) -> Vec<(String, usize)> {
        let graph = self.graph().await;
        let mut degrees: Vec<(String, usize)> = graph
            .nodes()
            .into_iter()
            .map(|node| {
                let degree = graph.in_degree(&node) + graph.out_degree(&node);
                (node, degree)
            })
            .collect();

        degrees.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        degrees.truncate(top_k);
        degrees
    }

    /// Notes sharing at least `threshold` neighbors with `path`
    pub async fn related_notes(&self, path: &str, threshold: usize) -> Vec<String> {
        let graph = self.graph().await;
        if !graph.contains(path) {
            return Vec::new();
        }

        let neighborhood = |node: &str| -> HashSet<String> {
            graph
                .successors(node)
                .into_iter()
                .chain(graph.predecessors(node))
                .collect()
        };
        let target = neighborhood(path);

        let mut related: Vec<(String, usize)> = graph
            .nodes()
            .into_iter()
            .filter(|node| node != path)
            .filter_map(|node| {
                let common = neighborhood(&node).intersection(&target).count();
                (common >= threshold).then_some((node, common))
            })
            .collect();

        related.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        related.into_iter().map(|(node, _)| node).collect()
    }

    pub async fn stats(&self) -> GraphStats {
        let graph = self.graph().await;
        let total_notes = graph.node_count();
        if total_notes == 0 {
            return GraphStats::default();
        }

        let nodes = graph.nodes();
        let out_sum: usize = nodes.iter().map(|n| graph.out_degree(n)).sum();
        let in_sum: usize = nodes.iter().map(|n| graph.in_degree(n)).sum();

        GraphStats {
            total_notes,
            total_links: graph.edge_count(),
            avg_out_degree: out_sum as f64 / total_notes as f64,
            avg_in_degree: in_sum as f64 / total_notes as f64,
            connected_components: graph.component_count(),
        }
    }
}

/// A link names a listed path directly or by its stem (`note` for `note.md`)
fn resolve_link(link: &str, listed: &HashSet<&str>) -> Option<String> {
    if listed.contains(link) {
        return Some(link.to_string());
    }
    let with_extension = format!("{link}.md");
    listed.contains(with_extension.as_str()).then_some(with_extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryVault;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vaultrag_vector_store::Document;

    /// a -> {b, c}, b -> {c, d}, d -> a
    fn scenario_vault() -> MemoryVault {
        MemoryVault::from_documents([
            Document::new("a.md", "Note A").with_links(["b", "c"]),
            Document::new("b.md", "Note B").with_links(["c", "d", "c"]),
            Document::new("c.md", "Note C").with_links(["missing"]),
            Document::new("d.md", "Note D").with_links(["a.md"]),
        ])
    }

    fn scenario_index() -> GraphIndex {
        GraphIndex::new(Arc::new(scenario_vault()))
    }

    #[tokio::test]
    async fn test_outgoing_links_in_link_order() {
        let index = scenario_index();
        assert_eq!(index.outgoing_links("a.md").await, vec!["b.md", "c.md"]);
        assert_eq!(index.outgoing_links("b.md").await, vec!["c.md", "d.md"]);
        assert!(index.outgoing_links("c.md").await.is_empty());
        assert!(index.outgoing_links("nowhere.md").await.is_empty());
    }

    #[tokio::test]
    async fn test_backlinks_mirror_outgoing_links() {
        let index = scenario_index();
        let graph = index.graph().await;

        for node in graph.nodes() {
            let mut expected: Vec<String> = Vec::new();
            for other in graph.nodes() {
                if index.outgoing_links(&other).await.contains(&node) {
                    expected.push(other);
                }
            }
            let mut backlinks = index.backlinks(&node).await;
            backlinks.sort();
            expected.sort();
            assert_eq!(backlinks, expected, "backlinks of {node}");
        }

        assert_eq!(index.backlinks("c.md").await, vec!["a.md", "b.md"]);
        assert!(index.backlinks("nowhere.md").await.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let stats = scenario_index().stats().await;
        assert_eq!(
            stats,
            GraphStats {
                total_notes: 4,
                total_links: 5,
                avg_out_degree: 1.25,
                avg_in_degree: 1.25,
                connected_components: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_graph_stats() {
        let index = GraphIndex::new(Arc::new(MemoryVault::new()));
        assert_eq!(index.stats().await, GraphStats::default());
        assert!(index.hub_notes(3).await.is_empty());
    }

    #[tokio::test]
    async fn test_find_path() {
        let index = scenario_index();
        assert_eq!(
            index.find_path("a.md", "d.md").await,
            Some(vec!["a.md".to_string(), "b.md".to_string(), "d.md".to_string()])
        );
        assert_eq!(index.find_path("c.md", "d.md").await, None);
        assert_eq!(index.find_path("a.md", "a.md").await, Some(vec!["a.md".to_string()]));
        assert_eq!(index.find_path("a.md", "nowhere.md").await, None);
    }

    #[tokio::test]
    async fn test_hub_notes() {
        let hubs = scenario_index().hub_notes(2).await;
        assert_eq!(hubs, vec![("a.md".to_string(), 3), ("b.md".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_related_notes() {
        let index = scenario_index();
        assert_eq!(index.related_notes("a.md", 2).await, vec!["b.md"]);
        assert_eq!(
            index.related_notes("a.md", 1).await,
            vec!["b.md", "c.md", "d.md"]
        );
        assert!(index.related_notes("nowhere.md", 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_expand_context_depth_one() {
        let expanded = scenario_index().expand_context("a.md", 1).await;
        let scored: Vec<(&str, f32)> = expanded.iter().map(|r| (r.path(), r.score)).collect();

        assert_eq!(
            scored,
            vec![("a.md", 1.0), ("d.md", 0.9), ("b.md", 0.5), ("c.md", 0.5)]
        );
        assert!(expanded.iter().all(|r| r.source == SearchSource::Graph));
        assert_eq!(expanded[3].rank, 3);
    }

    #[tokio::test]
    async fn test_expand_context_depth_two_reaches_backlink() {
        let expanded = scenario_index().expand_context("a.md", 2).await;
        let scored: Vec<(&str, f32)> = expanded.iter().map(|r| (r.path(), r.score)).collect();

        // d is reached at distance 2, so it is not re-added as a backlink
        assert_eq!(
            scored,
            vec![("a.md", 1.0), ("b.md", 0.5), ("c.md", 0.5), ("d.md", 1.0 / 3.0)]
        );
    }

    #[tokio::test]
    async fn test_expand_context_depth_zero_and_absent_root() {
        let index = scenario_index();
        let expanded = index.expand_context("c.md", 0).await;
        let scored: Vec<(&str, f32)> = expanded.iter().map(|r| (r.path(), r.score)).collect();
        assert_eq!(scored, vec![("c.md", 1.0), ("a.md", 0.9), ("b.md", 0.9)]);

        assert!(index.expand_context("nowhere.md", 2).await.is_empty());
    }

    struct CountingProvider {
        inner: MemoryVault,
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentProvider for CountingProvider {
        async fn list_paths(&self) -> Vec<String> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.list_paths().await
        }

        async fn get_document(&self, path: &str) -> Option<Document> {
            self.inner.get_document(path).await
        }

        async fn search(&self, query: &str) -> Vec<SearchResult> {
            self.inner.search(query).await
        }
    }

    #[tokio::test]
    async fn test_build_is_single_flight() {
        let provider = Arc::new(CountingProvider {
            inner: scenario_vault(),
            list_calls: AtomicUsize::new(0),
        });
        let index = GraphIndex::new(provider.clone());
        assert!(!index.is_built());

        let (a, b, c) = tokio::join!(
            index.outgoing_links("a.md"),
            index.backlinks("a.md"),
            index.stats()
        );

        assert_eq!(a.len(), 2);
        assert_eq!(b, vec!["d.md"]);
        assert_eq!(c.total_links, 5);
        assert_eq!(provider.list_calls.load(Ordering::SeqCst), 1);
        assert!(index.is_built());
    }

    #[test]
    fn test_duplicate_edges_and_nodes() {
        let mut graph = PetLinkGraph::new();
        assert!(graph.add_node("x"));
        assert!(!graph.add_node("x"));
        graph.add_edge("x", "y");
        graph.add_edge("x", "y");

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.component_count(), 1);
    }

    #[test]
    fn test_resolve_link() {
        let listed = HashSet::from(["notes/a.md", "b.md"]);
        assert_eq!(resolve_link("notes/a", &listed), Some("notes/a.md".to_string()));
        assert_eq!(resolve_link("b.md", &listed), Some("b.md".to_string()));
        assert_eq!(resolve_link("c", &listed), None);
    }
}
