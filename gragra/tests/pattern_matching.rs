mod util;

use gragra::matcher::{CancellationToken, MatchError};
use gragra::{Graph, SearchLimits, find_pattern_matches, find_pattern_matches_with};
use std::collections::BTreeSet;
use util::*;

fn match_set(subject: &Graph, pattern: &Graph) -> BTreeSet<Vec<gragra::NodeKey>> {
    find_pattern_matches(subject, pattern)
        .into_iter()
        .map(|m| m.into_inner())
        .collect()
}

#[test_log::test]
fn directed_edge_occurs_once_per_chain() {
    // C -> A -> B, plus a disjoint A -> B
    let (subject, n) = graph_from(&["C", "A", "B", "A", "B"], &[(0, 1), (1, 2), (3, 4)]);
    let (pattern, _) = graph_from(&["A", "B"], &[(0, 1)]);
    let matches = match_set(&subject, &pattern);
    assert_eq!(
        matches,
        BTreeSet::from([vec![n[1], n[2]], vec![n[3], n[4]]])
    );
}

#[test_log::test]
fn single_edge_matches_once() {
    let (subject, n) = graph_from(&["A", "B"], &[(0, 1)]);
    let (pattern, _) = graph_from(&["A", "B"], &[(0, 1)]);
    let matches = find_pattern_matches(&subject, &pattern);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].slots(), &[n[0], n[1]]);
}

#[test_log::test]
fn bidirectional_pattern_in_small_chain() {
    let mut subject = Graph::new();
    let c = subject.add_node("C");
    let a = subject.add_node("A");
    let b = subject.add_node("B");
    subject.connect_bidirectional(c, a).unwrap();
    subject.connect_bidirectional(a, b).unwrap();

    let matches = find_pattern_matches(&subject, &pattern_graph());
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].slots(), &[a, b]);
}

#[test_log::test]
fn bidirectional_pattern_in_basic_graph() {
    let subject = basic_graph();
    let keys = subject.node_keys();
    let matches = match_set(&subject, &pattern_graph());
    assert_eq!(
        matches,
        BTreeSet::from([vec![keys[1], keys[2]], vec![keys[5], keys[2]]])
    );
}

#[test_log::test]
fn one_way_pattern_skips_two_way_edges() {
    let subject = basic_graph();
    let keys = subject.node_keys();
    let (pattern, _) = graph_from(&["A", "B"], &[(0, 1)]);
    let matches = match_set(&subject, &pattern);
    // A1 <-> B2 also has the reverse edge, so only A3 -> B4 is an induced occurrence
    assert_eq!(matches, BTreeSet::from([vec![keys[3], keys[4]]]));
}

#[test_log::test]
fn complex_graph_counts() {
    let subject = complex_graph();
    let keys = subject.node_keys();
    assert_eq!(find_pattern_matches(&subject, &pattern_graph()).len(), 5);

    let (b_to_a, _) = graph_from(&["B", "A"], &[(0, 1)]);
    let matches = match_set(&subject, &b_to_a);
    assert_eq!(matches, BTreeSet::from([vec![keys[5], keys[4]]]));

    // C - A - B paths, both directions everywhere
    let (path, _) = graph_from(&["C", "A", "B"], &[(0, 1), (1, 0), (1, 2), (2, 1)]);
    let matches = match_set(&subject, &path);
    assert_eq!(
        matches,
        BTreeSet::from([vec![keys[0], keys[1], keys[2]], vec![keys[6], keys[8], keys[9]]])
    );
}

#[test_log::test]
fn repeated_searches_agree() {
    let subject = complex_graph();
    let pattern = pattern_graph();
    let first = find_pattern_matches(&subject, &pattern);
    for _ in 0..5 {
        assert_eq!(find_pattern_matches(&subject, &pattern), first);
    }
}

#[test_log::test]
fn missing_labels_match_nothing() {
    let subject = basic_graph();
    let (pattern, _) = graph_from(&["Q"], &[]);
    assert!(find_pattern_matches(&subject, &pattern).is_empty());
}

#[test_log::test]
fn bindings_pair_pattern_and_subject_nodes() {
    let subject = basic_graph();
    let pattern = pattern_graph();
    let p = pattern.node_keys();
    for m in find_pattern_matches(&subject, &pattern) {
        for (pattern_node, subject_node) in m.bindings(&pattern) {
            assert_eq!(pattern.label(pattern_node), subject.label(subject_node));
        }
        assert_eq!(m.bindings(&pattern).map(|(k, _)| k).collect::<Vec<_>>(), p);
    }
}

#[test_log::test]
fn cancelled_search_reports_cancellation() {
    let token = CancellationToken::new();
    token.cancel();
    let limits = SearchLimits::unbounded().with_cancellation(token);
    let err = find_pattern_matches_with(&complex_graph(), &pattern_graph(), &limits).unwrap_err();
    assert_eq!(err.current_context(), &MatchError::Cancelled);
}

#[test_log::test]
fn generous_limits_find_everything() {
    let limits = SearchLimits::unbounded()
        .with_max_steps(1_000_000)
        .with_timeout(std::time::Duration::from_secs(60));
    let subject = complex_graph();
    let pattern = pattern_graph();
    let bounded = find_pattern_matches_with(&subject, &pattern, &limits).unwrap();
    assert_eq!(bounded, find_pattern_matches(&subject, &pattern));
}
