#![allow(dead_code)]

use gragra::{Graph, NodeKey, Rule};

/// Builds a graph from labels and directed edges given as indices into `labels`.
pub fn graph_from(labels: &[&str], edges: &[(usize, usize)]) -> (Graph, Vec<NodeKey>) {
    let mut g = Graph::new();
    let keys = labels.iter().map(|&l| g.add_node(l)).collect::<Vec<_>>();
    for &(origin, target) in edges {
        g.connect(keys[origin], keys[target]).unwrap();
    }
    (g, keys)
}

/// `A <-> B`
pub fn pattern_graph() -> Graph {
    let mut g = Graph::new();
    let a = g.add_node("A");
    let b = g.add_node("B");
    g.connect_bidirectional(a, b).unwrap();
    g
}

/// ```text
/// C0 - A1 - B2 - A5
///        \
///         A3 -> B4
/// ```
/// `-` is a pair of opposite edges.
pub fn basic_graph() -> Graph {
    let mut g = Graph::new();
    let n = ["C", "A", "B", "A", "B", "A"].map(|l| g.add_node(l));
    g.connect_bidirectional(n[0], n[1]).unwrap();
    g.connect_bidirectional(n[1], n[2]).unwrap();
    g.connect_bidirectional(n[1], n[3]).unwrap();
    g.connect(n[3], n[4]).unwrap();
    g.connect_bidirectional(n[2], n[5]).unwrap();
    g
}

/// ```text
///            D3 - A4 - B9
///           /      ^   |
/// C0 - A1 - B2     |   A8
///           \      |   |
///            A7 - B5 - C6
/// ```
pub fn complex_graph() -> Graph {
    let mut g = Graph::new();
    let n = ["C", "A", "B", "D", "A", "B", "C", "A", "A", "B"].map(|l| g.add_node(l));
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 9), (2, 7), (7, 5), (5, 6), (6, 8), (8, 9)] {
        g.connect_bidirectional(n[a], n[b]).unwrap();
    }
    g.connect(n[5], n[4]).unwrap();
    g
}

/// `A <-> B` becomes `X <-> B`.
pub fn basic_rule() -> Rule {
    let lhs = pattern_graph();
    let mut rhs = pattern_graph();
    let keys = rhs.node_keys();
    rhs.relabel(keys[0], "X").unwrap();
    let mut rule = Rule::new("replace A", lhs, rhs);
    rule.keep(keys[0], keys[0]).unwrap();
    rule.keep(keys[1], keys[1]).unwrap();
    rule
}

/// `A <-> B` becomes `X`; the `B` is deleted.
pub fn removal_rule() -> Rule {
    let lhs = pattern_graph();
    let mut rhs = Graph::new();
    let keys = lhs.node_keys();
    let x = rhs.add_node("X");
    let mut rule = Rule::new("remove B", lhs, rhs);
    rule.keep(keys[0], x).unwrap();
    rule.delete(keys[1]).unwrap();
    rule
}

/// `A <-> B` becomes `X <-> B <-> F`; the `F` is new.
pub fn addition_rule() -> Rule {
    let lhs = pattern_graph();
    let mut rhs = pattern_graph();
    let keys = rhs.node_keys();
    rhs.relabel(keys[0], "X").unwrap();
    let f = rhs.add_node("F");
    rhs.connect_bidirectional(keys[1], f).unwrap();
    let mut rule = Rule::new("add F", lhs, rhs);
    rule.keep(keys[0], keys[0]).unwrap();
    rule.keep(keys[1], keys[1]).unwrap();
    rule.insert(f).unwrap();
    rule
}

/// `A <-> B` becomes `A <-> C <-> B`.
pub fn insertion_rule() -> Rule {
    let lhs = pattern_graph();
    let (rhs, r) = graph_from(&["A", "C", "B"], &[(0, 1), (1, 0), (1, 2), (2, 1)]);
    let l = lhs.node_keys();
    let mut rule = Rule::new("insert C", lhs, rhs);
    rule.keep(l[0], r[0]).unwrap();
    rule.keep(l[1], r[2]).unwrap();
    rule.insert(r[1]).unwrap();
    rule
}
