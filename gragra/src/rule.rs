use crate::graph::{Graph, NodeKey};
use crate::util::log;
use error_stack::Report;
use thiserror::Error;

/// What applying an [`Association`] does to the working graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    /// RHS node without LHS counterpart: a new node is added.
    Insertion,
    /// LHS node without RHS counterpart: the matched node is removed.
    Deletion,
    /// Both sides present: the matched node takes the RHS node's label.
    Relabel,
}

/// One row of a rule's association table.
///
/// At least one side is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Association {
    lhs: Option<NodeKey>,
    rhs: Option<NodeKey>,
}

impl Association {
    pub fn lhs(&self) -> Option<NodeKey> {
        self.lhs
    }

    pub fn rhs(&self) -> Option<NodeKey> {
        self.rhs
    }

    pub fn kind(&self) -> AssociationKind {
        match (self.lhs, self.rhs) {
            (None, _) => AssociationKind::Insertion,
            (Some(_), None) => AssociationKind::Deletion,
            (Some(_), Some(_)) => AssociationKind::Relabel,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("an association needs at least one side")]
    EmptyAssociation,
    #[error("node {0:?} is not part of the rule's left-hand side")]
    UnknownLhsNode(NodeKey),
    #[error("node {0:?} is not part of the rule's right-hand side")]
    UnknownRhsNode(NodeKey),
    #[error("left-hand side node {0:?} has no association")]
    UnassociatedLhsNode(NodeKey),
    #[error("right-hand side node {0:?} has no association")]
    UnassociatedRhsNode(NodeKey),
}

pub type RuleResult<T> = error_stack::Result<T, RuleError>;

/// A rewrite rule: find the LHS, replace it with the RHS.
///
/// The association table says which LHS node becomes which RHS node. LHS nodes without an RHS
/// counterpart are deleted, RHS nodes without an LHS counterpart are created. The pattern's edges
/// are always replaced wholesale by the RHS edges.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    lhs: Graph,
    rhs: Graph,
    associations: Vec<Association>,
}

impl Rule {
    pub fn new(name: impl Into<String>, lhs: Graph, rhs: Graph) -> Self {
        Rule {
            name: name.into(),
            lhs,
            rhs,
            associations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lhs(&self) -> &Graph {
        &self.lhs
    }

    pub fn rhs(&self) -> &Graph {
        &self.rhs
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Records that `lhs` turns into `rhs`.
    ///
    /// With only one side given, an earlier entry that paired that node with something is first
    /// reduced to this node alone, so a node is never both a pure insertion/deletion and part of a
    /// relabel. Identical entries are not added twice.
    pub fn associate(&mut self, lhs: Option<NodeKey>, rhs: Option<NodeKey>) -> RuleResult<()> {
        if let Some(l) = lhs
            && !self.lhs.contains_node(l)
        {
            return Err(Report::new(RuleError::UnknownLhsNode(l)));
        }
        if let Some(r) = rhs
            && !self.rhs.contains_node(r)
        {
            return Err(Report::new(RuleError::UnknownRhsNode(r)));
        }

        match (lhs, rhs) {
            (None, None) => return Err(Report::new(RuleError::EmptyAssociation)),
            (None, Some(r)) => {
                if let Some(existing) = self.associations.iter_mut().find(|a| a.rhs == Some(r)) {
                    existing.lhs = None;
                }
            }
            (Some(l), None) => {
                if let Some(existing) = self.associations.iter_mut().find(|a| a.lhs == Some(l)) {
                    existing.rhs = None;
                }
            }
            (Some(_), Some(_)) => {}
        }

        let association = Association { lhs, rhs };
        if !self.associations.contains(&association) {
            log::trace!("rule {:?}: associating {lhs:?} with {rhs:?}", self.name);
            self.associations.push(association);
        }
        Ok(())
    }

    /// Shorthand for `associate(None, Some(rhs))`.
    pub fn insert(&mut self, rhs: NodeKey) -> RuleResult<()> {
        self.associate(None, Some(rhs))
    }

    /// Shorthand for `associate(Some(lhs), None)`.
    pub fn delete(&mut self, lhs: NodeKey) -> RuleResult<()> {
        self.associate(Some(lhs), None)
    }

    /// Shorthand for `associate(Some(lhs), Some(rhs))`.
    pub fn keep(&mut self, lhs: NodeKey, rhs: NodeKey) -> RuleResult<()> {
        self.associate(Some(lhs), Some(rhs))
    }

    /// The first association naming `rhs` on its right-hand side.
    pub fn association_for_rhs(&self, rhs: NodeKey) -> Option<(usize, &Association)> {
        self.associations
            .iter()
            .enumerate()
            .find(|(_, a)| a.rhs == Some(rhs))
    }

    pub fn count_of(&self, kind: AssociationKind) -> usize {
        self.associations.iter().filter(|a| a.kind() == kind).count()
    }

    /// Checks that every LHS and every RHS node is covered by an association.
    ///
    /// Applying a rule that fails this check may leave the working graph half rewritten.
    pub fn validate(&self) -> RuleResult<()> {
        for key in self.lhs.node_keys() {
            if !self.associations.iter().any(|a| a.lhs == Some(key)) {
                return Err(Report::new(RuleError::UnassociatedLhsNode(key)));
            }
        }
        for key in self.rhs.node_keys() {
            if self.association_for_rhs(key).is_none() {
                return Err(Report::new(RuleError::UnassociatedRhsNode(key)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> (Rule, NodeKey, NodeKey, NodeKey, NodeKey) {
        let mut lhs = Graph::new();
        let la = lhs.add_node("A");
        let lb = lhs.add_node("B");
        lhs.connect(la, lb).unwrap();
        let mut rhs = Graph::new();
        let ra = rhs.add_node("X");
        let rb = rhs.add_node("B");
        rhs.connect(ra, rb).unwrap();
        (Rule::new("replace A", lhs, rhs), la, lb, ra, rb)
    }

    #[test]
    fn kinds_follow_present_sides() {
        let (mut rule, la, lb, ra, rb) = two_by_two();
        rule.keep(la, ra).unwrap();
        rule.delete(lb).unwrap();
        rule.insert(rb).unwrap();
        let kinds = rule
            .associations()
            .iter()
            .map(Association::kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                AssociationKind::Relabel,
                AssociationKind::Deletion,
                AssociationKind::Insertion
            ]
        );
    }

    #[test]
    fn duplicates_are_ignored() {
        let (mut rule, la, _, ra, _) = two_by_two();
        rule.keep(la, ra).unwrap();
        rule.keep(la, ra).unwrap();
        assert_eq!(rule.associations().len(), 1);
    }

    #[test]
    fn one_sided_association_splits_earlier_pair() {
        let (mut rule, la, _, ra, _) = two_by_two();
        rule.keep(la, ra).unwrap();
        rule.insert(ra).unwrap();
        // the relabel collapsed into a pure insertion; no duplicate was added
        assert_eq!(rule.associations().len(), 1);
        assert_eq!(rule.associations()[0].kind(), AssociationKind::Insertion);
        assert_eq!(rule.associations()[0].rhs(), Some(ra));
        assert_eq!(rule.associations()[0].lhs(), None);
    }

    #[test]
    fn invalid_associations_are_rejected() {
        let (mut rule, _, _, _, _) = two_by_two();
        let err = rule.associate(None, None).unwrap_err();
        assert_eq!(err.current_context(), &RuleError::EmptyAssociation);
        let err = rule.delete(NodeKey(9)).unwrap_err();
        assert_eq!(err.current_context(), &RuleError::UnknownLhsNode(NodeKey(9)));
        assert!(rule.associations().is_empty());
    }

    #[test]
    fn validate_requires_full_coverage() {
        let (mut rule, la, lb, ra, rb) = two_by_two();
        rule.keep(la, ra).unwrap();
        rule.keep(lb, rb).unwrap();
        assert!(rule.validate().is_ok());

        let (mut rule, la, lb, ra, rb) = two_by_two();
        rule.keep(la, ra).unwrap();
        rule.delete(lb).unwrap();
        let err = rule.validate().unwrap_err();
        assert_eq!(err.current_context(), &RuleError::UnassociatedRhsNode(rb));
    }
}
