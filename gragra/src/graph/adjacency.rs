use crate::graph::NodeKey;
use std::collections::HashMap;

/// A dense snapshot of a graph's edge relation.
///
/// Rows and columns are the graph's nodes in ascending key order, so the dense index of a node
/// is its position in [`AdjacencyMatrix::keys`]. `contains(i, j)` holds iff the edge `i -> j`
/// existed when the matrix was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    keys: Vec<NodeKey>,
    index_of: HashMap<NodeKey, usize>,
    bits: Vec<bool>,
}

impl AdjacencyMatrix {
    pub(crate) fn build(
        keys: Vec<NodeKey>,
        edges: impl IntoIterator<Item = (NodeKey, NodeKey)>,
    ) -> Self {
        let n = keys.len();
        let index_of = keys
            .iter()
            .enumerate()
            .map(|(i, &key)| (key, i))
            .collect::<HashMap<_, _>>();
        let mut bits = vec![false; n * n];
        for (origin, target) in edges {
            // both endpoints are always nodes of the graph the edges came from
            let i = index_of[&origin];
            let j = index_of[&target];
            bits[i * n + j] = true;
        }
        AdjacencyMatrix {
            keys,
            index_of,
            bits,
        }
    }

    /// Number of rows (and columns).
    pub fn dimension(&self) -> usize {
        self.keys.len()
    }

    /// The node keys in dense-index order.
    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    /// The key at dense index `index`. The index must be below [`AdjacencyMatrix::dimension`].
    pub(crate) fn key(&self, index: usize) -> NodeKey {
        self.keys[index]
    }

    pub fn index(&self, key: NodeKey) -> Option<usize> {
        self.index_of.get(&key).copied()
    }

    /// Whether the edge `i -> j` exists, by dense index. Both indices must be in range.
    pub(crate) fn contains(&self, i: usize, j: usize) -> bool {
        self.bits[i * self.keys.len() + j]
    }

    /// Whether the edge `origin -> target` exists, by node key.
    pub fn contains_edge(&self, origin: NodeKey, target: NodeKey) -> bool {
        match (self.index(origin), self.index(target)) {
            (Some(i), Some(j)) => self.contains(i, j),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_indices_follow_key_order() {
        let keys = vec![NodeKey(2), NodeKey(5), NodeKey(9)];
        let m = AdjacencyMatrix::build(keys, [(NodeKey(9), NodeKey(2)), (NodeKey(5), NodeKey(5))]);
        assert_eq!(m.dimension(), 3);
        assert_eq!(m.index(NodeKey(9)), Some(2));
        assert!(m.contains(2, 0));
        assert!(!m.contains(0, 2));
        assert!(m.contains_edge(NodeKey(5), NodeKey(5)));
        assert!(!m.contains_edge(NodeKey(1), NodeKey(5)));
    }

    #[test]
    fn key_lookups_outside_the_graph_are_misses() {
        let m =
            AdjacencyMatrix::build(vec![NodeKey(0), NodeKey(1)], [(NodeKey(0), NodeKey(1))]);
        assert_eq!(m.index(NodeKey(u32::MAX)), None);
        assert!(!m.contains_edge(NodeKey(0), NodeKey(u32::MAX)));
        assert!(!m.contains_edge(NodeKey(7), NodeKey(1)));
        assert_eq!(m.keys().get(5), None);
    }
}
