//! The structured record a persistence layer stores graphs as.
//!
//! The crate does no I/O itself; these types only fix the shape (`serde` field names are
//! camelCase) and the lossless conversion to and from [`Graph`].

use crate::graph::{Graph, NodeKey};
use crate::util::Label;
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

pub const RECORD_VERSION: u32 = 1;

/// The only edge type the graph store knows about.
pub const DIRECTED_EDGE_TYPE: &str = "directed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecord {
    pub name: String,
    pub version: u32,
    /// The graph's key allocator. Absent in hand-written records, in which case allocation
    /// resumes above the highest listed id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<NodeKey>,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeKey,
    pub label: Label,
    #[serde(default)]
    pub incoming: Vec<EdgeRecord>,
    #[serde(default)]
    pub outgoing: Vec<EdgeRecord>,
    /// Opaque to the core; editors may store layout information here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub origin_id: NodeKey,
    pub target_id: NodeKey,
    pub edge_type: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u32),
    #[error("node id {0:?} appears more than once")]
    DuplicateNode(NodeKey),
    #[error("edge {origin:?} -> {target:?} references a node that is not in the record")]
    DanglingEdge { origin: NodeKey, target: NodeKey },
    #[error("edge {origin:?} -> {target:?} is listed under node {listed_under:?}, which is not one of its endpoints")]
    MisplacedEdge {
        origin: NodeKey,
        target: NodeKey,
        listed_under: NodeKey,
    },
    #[error("node id {0:?} leaves no key for the next node")]
    KeySpaceExhausted(NodeKey),
}

pub type RecordResult<T> = error_stack::Result<T, RecordError>;

impl Graph {
    /// Describes this graph as a [`GraphRecord`], nodes in ascending key order.
    ///
    /// Each edge is listed twice: under its origin's `outgoing` and its target's `incoming`.
    pub fn to_record(&self) -> GraphRecord {
        let nodes = self
            .nodes()
            .map(|(id, label)| {
                let edge = |origin_id, target_id| EdgeRecord {
                    origin_id,
                    target_id,
                    edge_type: DIRECTED_EDGE_TYPE.to_string(),
                };
                NodeRecord {
                    id,
                    label,
                    incoming: self
                        .predecessors(id)
                        .into_iter()
                        .map(|origin| edge(origin, id))
                        .collect(),
                    outgoing: self
                        .successors(id)
                        .into_iter()
                        .map(|target| edge(id, target))
                        .collect(),
                    presentation_hint: None,
                }
            })
            .collect();
        GraphRecord {
            name: self.name().to_string(),
            version: RECORD_VERSION,
            next_id: Some(self.next_node_key()),
            nodes,
        }
    }

    /// Rebuilds a graph from a record, keeping every node id.
    ///
    /// Edges may be listed under either endpoint or both. The key allocator resumes at the
    /// record's `next_id`, and never below the highest restored id + 1, so keys removed before
    /// saving are not handed out again. The id `u32::MAX` is rejected.
    pub fn from_record(record: &GraphRecord) -> RecordResult<Graph> {
        if record.version != RECORD_VERSION {
            return Err(Report::new(RecordError::UnsupportedVersion(record.version)));
        }
        let mut graph = Graph::with_name(record.name.clone());
        let mut seen = HashSet::new();
        for node in &record.nodes {
            if !seen.insert(node.id) {
                return Err(Report::new(RecordError::DuplicateNode(node.id)));
            }
            graph
                .insert_node_with_key(node.id, node.label)
                .change_context(RecordError::KeySpaceExhausted(node.id))?;
        }
        if let Some(next_id) = record.next_id {
            graph.reserve_keys_below(next_id);
        }

        let mut edges = BTreeSet::new();
        for node in &record.nodes {
            for edge in node.incoming.iter().chain(&node.outgoing) {
                if edge.origin_id != node.id && edge.target_id != node.id {
                    return Err(Report::new(RecordError::MisplacedEdge {
                        origin: edge.origin_id,
                        target: edge.target_id,
                        listed_under: node.id,
                    }));
                }
                edges.insert((edge.origin_id, edge.target_id));
            }
        }
        for (origin, target) in edges {
            graph.connect(origin, target).map_err(|report| {
                report.change_context(RecordError::DanglingEdge { origin, target })
            })?;
        }
        Ok(graph)
    }
}
