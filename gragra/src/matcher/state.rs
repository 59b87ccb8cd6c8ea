use crate::graph::{AdjacencyMatrix, Graph};
use crate::util::Label;
use std::collections::BTreeSet;

/// A read-only, densely indexed view of a graph for the duration of one search.
///
/// Dense indices are shared with the graph's [`AdjacencyMatrix`].
pub(crate) struct GraphView<'g> {
    pub(crate) matrix: &'g AdjacencyMatrix,
    pub(crate) labels: Vec<Label>,
    pub(crate) predecessors: Vec<Vec<usize>>,
    pub(crate) successors: Vec<Vec<usize>>,
}

impl<'g> GraphView<'g> {
    pub(crate) fn new(graph: &'g Graph) -> Self {
        let matrix = graph.adjacency_matrix();
        let mut labels = Vec::with_capacity(matrix.dimension());
        let mut predecessors = Vec::with_capacity(matrix.dimension());
        let mut successors = Vec::with_capacity(matrix.dimension());
        let dense = |keys: Vec<_>| {
            keys.into_iter()
                .filter_map(|key| matrix.index(key))
                .collect::<Vec<_>>()
        };
        for &key in matrix.keys() {
            // keys come from the graph itself, so the label lookup cannot miss
            labels.extend(graph.label(key));
            predecessors.push(dense(graph.predecessors(key)));
            successors.push(dense(graph.successors(key)));
        }
        GraphView {
            matrix,
            labels,
            predecessors,
            successors,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.labels.len()
    }

    pub(crate) fn has_edge(&self, origin: usize, target: usize) -> bool {
        self.matrix.contains(origin, target)
    }
}

/// Search bookkeeping for one of the two graphs.
///
/// `core[n]` is the node of the *other* graph that `n` is mapped to. `in_depth[n]` /
/// `out_depth[n]` record the depth at which `n` first became a predecessor / successor of a
/// mapped node; a node with such a depth that is not itself mapped is in the terminal-in /
/// terminal-out set.
#[derive(Debug, Clone)]
pub(crate) struct SearchData {
    core: Vec<Option<usize>>,
    in_depth: Vec<Option<usize>>,
    out_depth: Vec<Option<usize>>,
    pub(crate) terminal_in: BTreeSet<usize>,
    pub(crate) terminal_out: BTreeSet<usize>,
}

impl SearchData {
    pub(crate) fn new(size: usize) -> Self {
        SearchData {
            core: vec![None; size],
            in_depth: vec![None; size],
            out_depth: vec![None; size],
            terminal_in: BTreeSet::new(),
            terminal_out: BTreeSet::new(),
        }
    }

    pub(crate) fn mapped_to(&self, n: usize) -> Option<usize> {
        self.core[n]
    }

    pub(crate) fn is_mapped(&self, n: usize) -> bool {
        self.core[n].is_some()
    }

    pub(crate) fn in_terminal_in(&self, n: usize) -> bool {
        self.core[n].is_none() && self.in_depth[n].is_some()
    }

    pub(crate) fn in_terminal_out(&self, n: usize) -> bool {
        self.core[n].is_none() && self.out_depth[n].is_some()
    }

    /// Neither mapped nor adjacent to anything mapped.
    pub(crate) fn is_unexplored(&self, n: usize) -> bool {
        self.core[n].is_none() && self.in_depth[n].is_none() && self.out_depth[n].is_none()
    }

    pub(crate) fn unmapped(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.core
            .iter()
            .enumerate()
            .filter(|(_, mapped)| mapped.is_none())
            .map(|(n, _)| n)
    }

    /// Core of the result: `core[n]` for every node, in dense-index order.
    pub(crate) fn core(&self) -> &[Option<usize>] {
        &self.core
    }

    fn map(&mut self, n: usize, other: usize) {
        self.core[n] = Some(other);
        self.terminal_in.remove(&n);
        self.terminal_out.remove(&n);
    }

    /// Tags the not-yet-tagged neighbors of the freshly mapped `n` with `depth`.
    fn update_depths(&mut self, view: &GraphView, n: usize, depth: usize) {
        for &p in &view.predecessors[n] {
            if self.in_depth[p].is_none() {
                self.in_depth[p] = Some(depth);
                if self.core[p].is_none() {
                    self.terminal_in.insert(p);
                }
            }
        }
        for &s in &view.successors[n] {
            if self.out_depth[s].is_none() {
                self.out_depth[s] = Some(depth);
                if self.core[s].is_none() {
                    self.terminal_out.insert(s);
                }
            }
        }
    }

    /// Undoes the mapping of `n` made at `depth`.
    fn backtrack(&mut self, n: usize, depth: usize) {
        self.core[n] = None;
        for i in 0..self.core.len() {
            if self.in_depth[i] == Some(depth) {
                self.in_depth[i] = None;
                self.terminal_in.remove(&i);
            }
            if self.out_depth[i] == Some(depth) {
                self.out_depth[i] = None;
                self.terminal_out.remove(&i);
            }
        }
        // n may have been a terminal node before it was mapped
        if self.in_terminal_in(n) {
            self.terminal_in.insert(n);
        }
        if self.in_terminal_out(n) {
            self.terminal_out.insert(n);
        }
    }
}

/// The state of the whole search: both graphs' bookkeeping and the current depth.
#[derive(Debug, Clone)]
pub(crate) struct MatchState {
    pub(crate) subject: SearchData,
    pub(crate) pattern: SearchData,
    pub(crate) depth: usize,
}

impl MatchState {
    pub(crate) fn new(subject_size: usize, pattern_size: usize) -> Self {
        MatchState {
            subject: SearchData::new(subject_size),
            pattern: SearchData::new(pattern_size),
            depth: 0,
        }
    }

    /// Adds the pair `(n, m)` (subject node, pattern node) to the mapping.
    pub(crate) fn extend(&mut self, subject: &GraphView, pattern: &GraphView, (n, m): (usize, usize)) {
        self.subject.map(n, m);
        self.pattern.map(m, n);
        self.depth += 1;
        self.subject.update_depths(subject, n, self.depth);
        self.pattern.update_depths(pattern, m, self.depth);
    }

    /// Reverts the most recent [`MatchState::extend`] of `(n, m)`.
    pub(crate) fn backtrack(&mut self, (n, m): (usize, usize)) {
        self.subject.backtrack(n, self.depth);
        self.pattern.backtrack(m, self.depth);
        self.depth -= 1;
    }
}
