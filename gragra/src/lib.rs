//! Graph-grammar rewriting over directed, node-labelled graphs.
//!
//! A [`Rule`] pairs a left-hand side pattern with a right-hand side replacement. The
//! [`matcher`] finds every induced occurrence of a pattern, [`apply_rule`] rewrites one of them,
//! and a [`GrammarEngine`] runs a [`Plan`] of rules against its working graph.

pub mod graph;
pub mod matcher;
pub mod plan;
pub mod rewrite;
pub mod rule;
pub mod util;

pub use graph::{Graph, GraphError, NodeKey};
pub use matcher::{Match, SearchLimits, find_pattern_matches, find_pattern_matches_with};
pub use plan::{EngineConfig, GrammarEngine, Plan, PlanReport, Policy, PolicyKind};
pub use rewrite::{Bindings, apply_rule};
pub use rule::{Association, AssociationKind, Rule};
pub use util::Label;
