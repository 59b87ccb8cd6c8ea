use crate::util::Label;
use derive_more::From;
use error_stack::Report;
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use std::cell::OnceCell;
use std::collections::HashMap;
use thiserror::Error;

pub mod adjacency;
#[cfg(feature = "serde")]
pub mod record;

pub use adjacency::AdjacencyMatrix;

/// Identifies a node within one [`Graph`].
///
/// Keys are handed out in increasing order and never reused, even after the node they named
/// was removed.
#[derive(
    Hash,
    Eq,
    PartialEq,
    derive_more::Debug,
    derive_more::Display,
    Clone,
    Copy,
    PartialOrd,
    Ord,
    From,
)]
#[debug("N({_0})")]
#[display("{_0}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeKey(pub u32);

pub type EdgeKey = (NodeKey, NodeKey);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0:?} is not part of the graph")]
    UnknownNode(NodeKey),
    #[error("no node key is left above {0:?}")]
    KeySpaceExhausted(NodeKey),
}

pub type GraphResult<T> = error_stack::Result<T, GraphError>;

/// A directed graph with one label per node and at most one edge per ordered node pair.
///
/// Edges are plain `(origin, target)` key pairs stored in the adjacency lists of the underlying
/// graph map; nodes never reference each other directly.
#[derive(Clone, Debug)]
pub struct Graph {
    name: String,
    graph: DiGraphMap<NodeKey, ()>,
    max_node_key: NodeKey,
    labels: HashMap<NodeKey, Label>,
    adjacency: OnceCell<AdjacencyMatrix>,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph::with_name("")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Graph {
            name: name.into(),
            graph: DiGraphMap::new(),
            max_node_key: NodeKey(0),
            labels: HashMap::new(),
            adjacency: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds a node under the next unused key.
    ///
    /// # Panics
    ///
    /// Panics if every key has been handed out. Use [`Graph::try_add_node`] to get an error
    /// instead.
    pub fn add_node(&mut self, label: impl Into<Label>) -> NodeKey {
        match self.try_add_node(label) {
            Ok(node_key) => node_key,
            Err(report) => panic!("{}", report.current_context()),
        }
    }

    /// Adds a node under the next unused key, failing with
    /// [`GraphError::KeySpaceExhausted`] once keys run out.
    pub fn try_add_node(&mut self, label: impl Into<Label>) -> GraphResult<NodeKey> {
        let node_key = self.max_node_key;
        self.insert_node_with_key(node_key, label.into())?;
        Ok(node_key)
    }

    /// Inserts a node under an explicit key and moves the allocator past it.
    ///
    /// The caller guarantees `node_key` is not in use. `NodeKey(u32::MAX)` is never accepted,
    /// so the allocator always has a successor to move to.
    pub(crate) fn insert_node_with_key(
        &mut self,
        node_key: NodeKey,
        label: Label,
    ) -> GraphResult<()> {
        let successor = node_key
            .0
            .checked_add(1)
            .ok_or_else(|| Report::new(GraphError::KeySpaceExhausted(node_key)))?;
        self.graph.add_node(node_key);
        self.labels.insert(node_key, label);
        if node_key >= self.max_node_key {
            self.max_node_key = NodeKey(successor);
        }
        self.invalidate_adjacency();
        Ok(())
    }

    /// Moves the allocator to at least `next`, so keys below it are never handed out again.
    pub(crate) fn reserve_keys_below(&mut self, next: NodeKey) {
        self.max_node_key = self.max_node_key.max(next);
    }

    /// Removes the node and every edge incident to it.
    ///
    /// Returns the removed node's label, or `None` if the node did not exist.
    pub fn remove_node(&mut self, node_key: NodeKey) -> Option<Label> {
        let label = self.labels.remove(&node_key)?;
        self.graph.remove_node(node_key);
        self.invalidate_adjacency();
        Some(label)
    }

    /// Creates the directed edge `origin -> target`.
    ///
    /// An existing `origin -> target` edge is replaced, so connecting twice leaves exactly one edge.
    pub fn connect(&mut self, origin: NodeKey, target: NodeKey) -> GraphResult<()> {
        self.ensure_node(origin)?;
        self.ensure_node(target)?;
        self.graph.remove_edge(origin, target);
        self.graph.add_edge(origin, target, ());
        self.invalidate_adjacency();
        Ok(())
    }

    /// Creates both `a -> b` and `b -> a`.
    pub fn connect_bidirectional(&mut self, a: NodeKey, b: NodeKey) -> GraphResult<()> {
        self.connect(a, b)?;
        self.connect(b, a)
    }

    /// Removes the edge `origin -> target`. Returns whether it existed.
    pub fn disconnect(&mut self, origin: NodeKey, target: NodeKey) -> bool {
        let removed = self.graph.remove_edge(origin, target).is_some();
        if removed {
            self.invalidate_adjacency();
        }
        removed
    }

    /// Replaces the label of an existing node, leaving its edges untouched.
    ///
    /// Returns the previous label.
    pub fn relabel(&mut self, node_key: NodeKey, label: impl Into<Label>) -> GraphResult<Label> {
        let slot = self
            .labels
            .get_mut(&node_key)
            .ok_or_else(|| Report::new(GraphError::UnknownNode(node_key)))?;
        let old = std::mem::replace(slot, label.into());
        self.invalidate_adjacency();
        Ok(old)
    }

    pub fn label(&self, node_key: NodeKey) -> Option<Label> {
        self.labels.get(&node_key).copied()
    }

    pub fn contains_node(&self, node_key: NodeKey) -> bool {
        self.labels.contains_key(&node_key)
    }

    pub fn contains_edge(&self, origin: NodeKey, target: NodeKey) -> bool {
        self.graph.contains_edge(origin, target)
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All node keys, ascending.
    pub fn node_keys(&self) -> Vec<NodeKey> {
        let mut keys = self.labels.keys().copied().collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    /// All nodes with their labels, in ascending key order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, Label)> + '_ {
        self.node_keys()
            .into_iter()
            .map(|key| (key, self.labels[&key]))
    }

    /// All edges, sorted by `(origin, target)`.
    pub fn edges(&self) -> Vec<EdgeKey> {
        let mut edges = self
            .graph
            .all_edges()
            .map(|(origin, target, _)| (origin, target))
            .collect::<Vec<_>>();
        edges.sort_unstable();
        edges
    }

    /// Targets of the edges leaving `node_key`.
    pub fn successors(&self, node_key: NodeKey) -> Vec<NodeKey> {
        self.neighbors(node_key, Direction::Outgoing)
    }

    /// Origins of the edges entering `node_key`.
    pub fn predecessors(&self, node_key: NodeKey) -> Vec<NodeKey> {
        self.neighbors(node_key, Direction::Incoming)
    }

    fn neighbors(&self, node_key: NodeKey, direction: Direction) -> Vec<NodeKey> {
        if !self.graph.contains_node(node_key) {
            return Vec::new();
        }
        let mut neighbors = self
            .graph
            .neighbors_directed(node_key, direction)
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Keys of every node carrying `label`, ascending.
    pub fn find_by_label(&self, label: &str) -> Vec<NodeKey> {
        self.nodes()
            .filter(|(_, l)| l.as_str() == label)
            .map(|(key, _)| key)
            .collect()
    }

    /// The largest key currently in use, if any node exists.
    pub fn highest_node_key(&self) -> Option<NodeKey> {
        self.labels.keys().max().copied()
    }

    /// The key the next [`Graph::add_node`] call will hand out.
    pub fn next_node_key(&self) -> NodeKey {
        self.max_node_key
    }

    /// The adjacency matrix of the current edge set, rebuilt on first access after a mutation.
    pub fn adjacency_matrix(&self) -> &AdjacencyMatrix {
        self.adjacency
            .get_or_init(|| AdjacencyMatrix::build(self.node_keys(), self.edges()))
    }

    /// Drops the cached adjacency matrix. Every mutating method calls this.
    pub fn invalidate_adjacency(&mut self) {
        self.adjacency.take();
    }

    fn ensure_node(&self, node_key: NodeKey) -> GraphResult<()> {
        if self.contains_node(node_key) {
            Ok(())
        } else {
            Err(Report::new(GraphError::UnknownNode(node_key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_never_recycled() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        assert_eq!(g.remove_node(b), Some(Label::from("B")));
        let c = g.add_node("C");
        assert_eq!(a, NodeKey(0));
        assert_eq!(c, NodeKey(2));
        assert_eq!(g.node_keys(), vec![a, c]);
        assert_eq!(g.remove_node(b), None);
    }

    #[test]
    fn exhausted_key_space_is_an_error() {
        let mut g = Graph::new();
        g.reserve_keys_below(NodeKey(u32::MAX - 1));
        let last = g.add_node("A");
        assert_eq!(last, NodeKey(u32::MAX - 1));
        let err = g.try_add_node("B").unwrap_err();
        assert_eq!(
            err.current_context(),
            &GraphError::KeySpaceExhausted(NodeKey(u32::MAX))
        );
        assert_eq!(g.node_keys(), vec![last]);
        assert_eq!(g.next_node_key(), NodeKey(u32::MAX));
    }

    #[test]
    #[should_panic(expected = "no node key is left")]
    fn add_node_panics_instead_of_wrapping() {
        let mut g = Graph::new();
        g.reserve_keys_below(NodeKey(u32::MAX));
        g.add_node("A");
    }

    #[test]
    fn connect_is_idempotent() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        g.connect(a, b).unwrap();
        g.connect(a, b).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.successors(a), vec![b]);
        assert_eq!(g.predecessors(b), vec![a]);
        assert!(g.predecessors(a).is_empty());
    }

    #[test]
    fn connect_rejects_unknown_nodes() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let err = g.connect(a, NodeKey(7)).unwrap_err();
        assert_eq!(
            err.current_context(),
            &GraphError::UnknownNode(NodeKey(7))
        );
        // graph map would have created the missing node on its own
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn removing_a_node_detaches_its_edges() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.connect_bidirectional(a, b).unwrap();
        g.connect(b, c).unwrap();
        g.connect(c, c).unwrap();
        assert_eq!(g.edge_count(), 4);

        g.remove_node(b);
        assert_eq!(g.edges(), vec![(c, c)]);
        assert!(g.successors(a).is_empty());
        assert!(g.predecessors(a).is_empty());
    }

    #[test]
    fn adjacency_matrix_tracks_mutations() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        g.connect(a, b).unwrap();
        assert!(g.adjacency_matrix().contains_edge(a, b));
        assert!(!g.adjacency_matrix().contains_edge(b, a));

        g.disconnect(a, b);
        g.connect(b, a).unwrap();
        let m = g.adjacency_matrix();
        assert!(!m.contains_edge(a, b));
        assert!(m.contains_edge(b, a));

        let c = g.add_node("C");
        assert_eq!(g.adjacency_matrix().dimension(), 3);
        assert_eq!(g.adjacency_matrix().index(c), Some(2));
    }

    #[test]
    fn relabel_keeps_edges() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        g.connect(a, b).unwrap();
        let old = g.relabel(a, "X").unwrap();
        assert_eq!(old, "A");
        assert_eq!(g.label(a), Some(Label::from("X")));
        assert_eq!(g.edges(), vec![(a, b)]);
        assert_eq!(g.find_by_label("X"), vec![a]);
        assert!(g.relabel(NodeKey(42), "Y").is_err());
    }
}
