use crate::graph::{Graph, NodeKey};
use crate::matcher::Match;
use crate::rule::{Association, AssociationKind, Rule};
use crate::util::log;
use error_stack::{Report, ResultExt};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("match binds {actual} nodes, but the left-hand side has {expected}")]
    MatchArity { expected: usize, actual: usize },
    #[error("matched node {0:?} is no longer part of the working graph")]
    StaleMatch(NodeKey),
    #[error("right-hand side node {0:?} has no association")]
    UnassociatedRhsNode(NodeKey),
    #[error("association #{0} is not bound to a working graph node")]
    UnboundAssociation(usize),
    #[error("could not add a node for right-hand side node {0:?}")]
    Insert(NodeKey),
    #[error("could not connect {origin:?} -> {target:?} in the working graph")]
    Rewire { origin: NodeKey, target: NodeKey },
}

pub type RewriteResult<T> = error_stack::Result<T, RewriteError>;

/// The working-graph node each association of a rule ended up bound to during one application.
///
/// Entries are in the rule's association order. Deleted nodes keep their (now dangling) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(Association, Option<NodeKey>)>,
}

impl Bindings {
    pub fn get(&self, association: usize) -> Option<NodeKey> {
        self.entries.get(association).and_then(|(_, key)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Association, Option<NodeKey>)> {
        self.entries.iter().map(|(a, key)| (a, *key))
    }

    /// Nodes that were added by insertion associations.
    pub fn created(&self) -> Vec<NodeKey> {
        self.entries
            .iter()
            .filter(|(a, _)| a.kind() == AssociationKind::Insertion)
            .filter_map(|(_, key)| *key)
            .collect()
    }

    fn resolve(&self, rule: &Rule, rhs: NodeKey) -> RewriteResult<NodeKey> {
        let (index, _) = rule
            .association_for_rhs(rhs)
            .ok_or_else(|| Report::new(RewriteError::UnassociatedRhsNode(rhs)))?;
        self.get(index)
            .ok_or_else(|| Report::new(RewriteError::UnboundAssociation(index)))
    }
}

/// Rewrites one occurrence of `rule`'s left-hand side in `graph`.
///
/// `m` binds the LHS nodes (in ascending key order) to working-graph nodes. The steps are:
/// 1. every edge between two matched nodes is removed,
/// 2. associations with an LHS side are bound to the matched nodes,
/// 3. in association order, insertions add a node with the RHS label, deletions remove the bound
///    node, relabels give the bound node the RHS label,
/// 4. every RHS edge is recreated between the bound nodes.
///
/// There is no rollback. A rule that fails [`Rule::validate`] can leave the graph half rewritten.
pub fn apply_rule(graph: &mut Graph, rule: &Rule, m: &Match) -> RewriteResult<Bindings> {
    let lhs_keys = rule.lhs().node_keys();
    if m.len() != lhs_keys.len() {
        return Err(Report::new(RewriteError::MatchArity {
            expected: lhs_keys.len(),
            actual: m.len(),
        }));
    }
    if let Some(&stale) = m.slots().iter().find(|&&key| !graph.contains_node(key)) {
        return Err(Report::new(RewriteError::StaleMatch(stale))
            .attach_printable(format!("rule {:?}, match {:?}", rule.name(), m.slots())));
    }
    log::debug!("applying rule {:?} to {:?}", rule.name(), m.slots());

    remove_internal_edges(graph, m);

    let slot_of = lhs_keys
        .iter()
        .enumerate()
        .map(|(slot, &key)| (key, slot))
        .collect::<HashMap<_, _>>();
    let mut bindings = Bindings {
        entries: rule
            .associations()
            .iter()
            .map(|a| {
                let bound = a.lhs().and_then(|lhs| slot_of.get(&lhs)).map(|&slot| m[slot]);
                (*a, bound)
            })
            .collect(),
    };

    for (association, bound) in bindings.entries.iter_mut() {
        match (association.lhs(), association.rhs()) {
            (None, None) => continue,
            (None, Some(rhs)) => {
                let label = rhs_label(rule, rhs)?;
                let added = graph
                    .try_add_node(label)
                    .change_context(RewriteError::Insert(rhs))?;
                log::trace!("inserted {added:?} ({label})");
                *bound = Some(added);
            }
            (Some(_), None) => {
                if let Some(key) = *bound {
                    log::trace!("removing {key:?}");
                    graph.remove_node(key);
                }
            }
            (Some(_), Some(rhs)) => {
                if let Some(key) = *bound {
                    let label = rhs_label(rule, rhs)?;
                    graph
                        .relabel(key, label)
                        .change_context(RewriteError::StaleMatch(key))?;
                }
            }
        }
    }

    rewire(graph, rule, &bindings)?;
    Ok(bindings)
}

fn rhs_label(rule: &Rule, rhs: NodeKey) -> RewriteResult<crate::util::Label> {
    rule.rhs()
        .label(rhs)
        .ok_or_else(|| Report::new(RewriteError::UnassociatedRhsNode(rhs)))
}

/// The pattern's internal edges are always replaced, never partially kept.
fn remove_internal_edges(graph: &mut Graph, m: &Match) {
    let matched = m.slots().iter().copied().collect::<HashSet<_>>();
    for &origin in m.slots() {
        for target in graph.successors(origin) {
            if matched.contains(&target) {
                graph.disconnect(origin, target);
            }
        }
    }
}

fn rewire(graph: &mut Graph, rule: &Rule, bindings: &Bindings) -> RewriteResult<()> {
    let rhs = rule.rhs();
    for template in rhs.node_keys() {
        let outbound = rhs.successors(template).into_iter().map(|t| (template, t));
        let inbound = rhs.predecessors(template).into_iter().map(|o| (o, template));
        for (template_origin, template_target) in outbound.chain(inbound).collect::<Vec<_>>() {
            let origin = bindings.resolve(rule, template_origin)?;
            let target = bindings.resolve(rule, template_target)?;
            graph
                .connect(origin, target)
                .change_context(RewriteError::Rewire { origin, target })?;
        }
    }
    Ok(())
}
