//! Exhaustive labeled subgraph matching.
//!
//! This is a VF2-style search (Cordella, Foggia, Sansone, Vento: "An Improved Algorithm for
//! Matching Large Graphs"). A partial mapping is grown one node pair at a time; candidates are
//! drawn from the terminal sets so the explored region stays connected, and every candidate must
//! pass the semantic, structural and look-ahead checks before the search descends.
//!
//! Matches are *induced* subgraph isomorphisms: the edges among the matched subject nodes are
//! exactly the pattern's edges, and labels are equal.

mod limits;
mod state;

pub use limits::{CancellationToken, MatchError, SearchLimits};

use crate::graph::{Graph, NodeKey};
use crate::util::log;
use error_stack::Report;
use limits::StepBudget;
use state::{GraphView, MatchState, SearchData};
use std::ops::Index;

pub type MatchResult<T> = error_stack::Result<T, MatchError>;

/// One occurrence of a pattern in a subject graph.
///
/// Slot `i` holds the subject node bound to the `i`-th pattern node in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Match(Vec<NodeKey>);

impl Match {
    pub fn new(slots: Vec<NodeKey>) -> Self {
        Match(slots)
    }

    pub fn slots(&self) -> &[NodeKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<NodeKey> {
        self.0.get(slot).copied()
    }

    pub fn contains(&self, node_key: NodeKey) -> bool {
        self.0.contains(&node_key)
    }

    /// Pairs each pattern node with the subject node it is bound to.
    pub fn bindings<'a>(
        &'a self,
        pattern: &Graph,
    ) -> impl Iterator<Item = (NodeKey, NodeKey)> + 'a {
        pattern.node_keys().into_iter().zip(self.0.iter().copied())
    }

    pub fn into_inner(self) -> Vec<NodeKey> {
        self.0
    }
}

impl Index<usize> for Match {
    type Output = NodeKey;

    fn index(&self, slot: usize) -> &Self::Output {
        &self.0[slot]
    }
}

impl From<Vec<NodeKey>> for Match {
    fn from(slots: Vec<NodeKey>) -> Self {
        Match(slots)
    }
}

/// Finds every occurrence of `pattern` in `subject`.
///
/// The search is unbounded; its worst case is exponential in the pattern size. Use
/// [`find_pattern_matches_with`] to bound it.
pub fn find_pattern_matches(subject: &Graph, pattern: &Graph) -> Vec<Match> {
    let limits = SearchLimits::unbounded();
    let (matches, _) = search(subject, pattern, &limits);
    matches
}

/// Finds every occurrence of `pattern` in `subject`, giving up when `limits` are hit.
pub fn find_pattern_matches_with(
    subject: &Graph,
    pattern: &Graph,
    limits: &SearchLimits,
) -> MatchResult<Vec<Match>> {
    let (matches, outcome) = search(subject, pattern, limits);
    match outcome {
        Ok(()) => Ok(matches),
        Err(interrupted) => Err(Report::new(interrupted.error).attach_printable(format!(
            "{} matches found in {} steps before the search stopped",
            matches.len(),
            interrupted.steps
        ))),
    }
}

struct Interrupted {
    error: MatchError,
    steps: u64,
}

fn search(
    subject: &Graph,
    pattern: &Graph,
    limits: &SearchLimits,
) -> (Vec<Match>, Result<(), Interrupted>) {
    if pattern.is_empty() {
        // the empty mapping is the one embedding of an empty pattern
        return (vec![Match(Vec::new())], Ok(()));
    }
    if pattern.node_count() > subject.node_count() {
        return (Vec::new(), Ok(()));
    }

    let subject_view = GraphView::new(subject);
    let pattern_view = GraphView::new(pattern);
    let mut search = Search {
        state: MatchState::new(subject_view.len(), pattern_view.len()),
        subject: subject_view,
        pattern: pattern_view,
        budget: StepBudget::start(limits),
        matches: Vec::new(),
    };
    let outcome = search.descend();
    log::debug!(
        "pattern search finished after {} steps with {} matches",
        search.budget.steps(),
        search.matches.len()
    );
    let steps = search.budget.steps();
    (
        search.matches,
        outcome.map_err(|error| Interrupted { error, steps }),
    )
}

/// The explicit search context: both graphs, both search states, and the step budget.
struct Search<'a, 'g> {
    subject: GraphView<'g>,
    pattern: GraphView<'g>,
    state: MatchState,
    budget: StepBudget<'a>,
    matches: Vec<Match>,
}

impl Search<'_, '_> {
    fn descend(&mut self) -> Result<(), MatchError> {
        self.budget.tick()?;

        if self.state.depth == self.pattern.len() {
            self.record_match();
            return Ok(());
        }

        for pair in self.candidate_pairs() {
            if !self.is_feasible(pair) {
                continue;
            }
            self.state.extend(&self.subject, &self.pattern, pair);
            let result = self.descend();
            self.state.backtrack(pair);
            result?;
        }
        Ok(())
    }

    fn record_match(&mut self) {
        let slots = self
            .state
            .pattern
            .core()
            .iter()
            .filter_map(|&n| n.map(|n| self.subject.matrix.key(n)))
            .collect::<Vec<_>>();
        debug_assert_eq!(slots.len(), self.pattern.len());
        log::trace!("found match {slots:?}");
        self.matches.push(Match(slots));
    }

    /// Candidate `(subject, pattern)` pairs for the next level.
    ///
    /// One pattern node is fixed per level (the highest-indexed one in the chosen set) and paired
    /// with every eligible subject node. Terminal-in is preferred over terminal-out; with both
    /// pattern-side terminal sets empty (at depth 0, or once a pattern component is exhausted) all
    /// unmapped nodes are eligible.
    fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let subject = &self.state.subject;
        let pattern = &self.state.pattern;
        let (subject_nodes, pattern_node): (Vec<usize>, Option<usize>) =
            if let Some(&m) = pattern.terminal_in.last() {
                (subject.terminal_in.iter().copied().collect(), Some(m))
            } else if let Some(&m) = pattern.terminal_out.last() {
                (subject.terminal_out.iter().copied().collect(), Some(m))
            } else {
                (subject.unmapped().collect(), pattern.unmapped().next_back())
            };

        match pattern_node {
            Some(m) => subject_nodes.into_iter().map(|n| (n, m)).collect(),
            None => Vec::new(),
        }
    }

    fn is_feasible(&self, (n, m): (usize, usize)) -> bool {
        self.labels_match(n, m)
            && self.structure_matches(n, m)
            && self.terminal_lookahead_holds(n, m)
            && self.new_lookahead_holds(n, m)
    }

    fn labels_match(&self, n: usize, m: usize) -> bool {
        self.subject.labels[n] == self.pattern.labels[m]
    }

    /// Edges between the candidates and the already mapped nodes must agree in both graphs.
    fn structure_matches(&self, n: usize, m: usize) -> bool {
        let subject = &self.subject;
        let pattern = &self.pattern;
        let state = &self.state;

        if subject.has_edge(n, n) != pattern.has_edge(m, m) {
            return false;
        }
        // mapped predecessors/successors of n must be predecessors/successors of m
        let subject_to_pattern = subject.predecessors[n].iter().all(|&pred| {
            state
                .subject
                .mapped_to(pred)
                .is_none_or(|pred| pattern.has_edge(pred, m))
        }) && subject.successors[n].iter().all(|&succ| {
            state
                .subject
                .mapped_to(succ)
                .is_none_or(|succ| pattern.has_edge(m, succ))
        });
        // and the other way around
        let pattern_to_subject = pattern.predecessors[m].iter().all(|&pred| {
            state
                .pattern
                .mapped_to(pred)
                .is_none_or(|pred| subject.has_edge(pred, n))
        }) && pattern.successors[m].iter().all(|&succ| {
            state
                .pattern
                .mapped_to(succ)
                .is_none_or(|succ| subject.has_edge(n, succ))
        });
        subject_to_pattern && pattern_to_subject
    }

    /// Rin / Rout: for each direction, the candidate subject node needs at least as many
    /// neighbors in its terminal sets as the pattern node has in the pattern's.
    fn terminal_lookahead_holds(&self, n: usize, m: usize) -> bool {
        let s = Neighborhood::of(&self.subject, &self.state.subject, n);
        let p = Neighborhood::of(&self.pattern, &self.state.pattern, m);
        s.terminal_in_predecessors >= p.terminal_in_predecessors
            && s.terminal_in_successors >= p.terminal_in_successors
            && s.terminal_out_predecessors >= p.terminal_out_predecessors
            && s.terminal_out_successors >= p.terminal_out_successors
    }

    /// Rnew: the same for neighbors not yet touched by the search at all.
    fn new_lookahead_holds(&self, n: usize, m: usize) -> bool {
        let s = Neighborhood::of(&self.subject, &self.state.subject, n);
        let p = Neighborhood::of(&self.pattern, &self.state.pattern, m);
        s.unexplored_predecessors >= p.unexplored_predecessors
            && s.unexplored_successors >= p.unexplored_successors
    }
}

/// Neighbor counts of one candidate node, by the region of the search the neighbors lie in.
///
/// The candidate itself is never counted, even if it has a self-loop.
#[derive(Debug, Default)]
struct Neighborhood {
    terminal_in_predecessors: usize,
    terminal_in_successors: usize,
    terminal_out_predecessors: usize,
    terminal_out_successors: usize,
    unexplored_predecessors: usize,
    unexplored_successors: usize,
}

impl Neighborhood {
    fn of(view: &GraphView, data: &SearchData, node: usize) -> Self {
        let mut counts = Neighborhood::default();
        for &pred in view.predecessors[node].iter().filter(|&&p| p != node) {
            counts.terminal_in_predecessors += usize::from(data.in_terminal_in(pred));
            counts.terminal_out_predecessors += usize::from(data.in_terminal_out(pred));
            counts.unexplored_predecessors += usize::from(data.is_unexplored(pred));
        }
        for &succ in view.successors[node].iter().filter(|&&s| s != node) {
            counts.terminal_in_successors += usize::from(data.in_terminal_in(succ));
            counts.terminal_out_successors += usize::from(data.in_terminal_out(succ));
            counts.unexplored_successors += usize::from(data.is_unexplored(succ));
        }
        counts
    }
}
