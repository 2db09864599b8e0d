//! Graph store: owns the node and edge maps and enforces the structural
//! invariants (existing endpoints, automatic edge inference, strength
//! clamping, conflict detection).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectAnnotations, Edge, EdgeType, Node, NodeType};
use crate::error::{GraphError, GraphResult};

/// Automatic parent→child edge inference table. Pairs outside this table
/// yield no edge.
const AUTO_EDGES: &[(NodeType, NodeType, EdgeType)] = &[
    (NodeType::Problem, NodeType::Problem, EdgeType::Decomposes),
    (NodeType::Problem, NodeType::Hypothesis, EdgeType::Hypothesizes),
    (NodeType::Hypothesis, NodeType::Experiment, EdgeType::Tests),
    (NodeType::Experiment, NodeType::Observation, EdgeType::Produces),
    (NodeType::Observation, NodeType::Learning, EdgeType::Learns),
    (NodeType::Solution, NodeType::Problem, EdgeType::Solves),
];

/// Look up the inferred edge type for a (parent, child) node-type pair.
pub fn auto_edge_type(parent: NodeType, child: NodeType) -> Option<EdgeType> {
    AUTO_EDGES
        .iter()
        .find(|(p, c, _)| *p == parent && *c == child)
        .map(|(_, _, edge_type)| *edge_type)
}

/// Graph-level metadata carried in the snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    /// When the graph was first created.
    pub created_at: DateTime<Utc>,
    /// When the graph last changed.
    pub last_modified: DateTime<Utc>,
    /// How many process sessions have opened this graph.
    pub session_count: u64,
}

impl GraphMetadata {
    /// Metadata for a brand-new graph.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_modified: now,
            session_count: 0,
        }
    }
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// An existing edge that opposes a newly connected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConflict {
    /// Id of the opposing edge.
    pub edge_id: String,
    /// Type of the opposing edge.
    pub edge_type: EdgeType,
    /// Human-readable description of the conflict.
    pub message: String,
}

/// Outcome of an explicit connect call.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    /// The edge that was recorded.
    pub edge: Edge,
    /// Opposing edges between the same endpoints, if any. Conflicts are
    /// reported, never blocking: the graph records contradictory evidence.
    pub conflicts: Vec<EdgeConflict>,
}

/// The aggregate graph: node/edge maps, problem roots, and counters.
#[derive(Debug)]
pub struct GraphStore {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    roots: Vec<String>,
    metadata: GraphMetadata,
}

impl GraphStore {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            roots: Vec::new(),
            metadata: GraphMetadata::new(),
        }
    }

    /// Reassemble a graph from replayed journal contents. Replay trusts the
    /// log: no invariant checks are applied here.
    pub fn from_parts(
        nodes: HashMap<String, Node>,
        edges: HashMap<String, Edge>,
        roots: Vec<String>,
        metadata: GraphMetadata,
    ) -> Self {
        Self {
            nodes,
            edges,
            roots,
            metadata,
        }
    }

    /// Insert a freshly created node, registering problem roots.
    pub fn insert_node(&mut self, node: Node) {
        if node.is_root() {
            self.roots.push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
        self.touch();
    }

    /// Draw the automatically inferred edge from `parent_id` to `child_id`.
    ///
    /// Returns `Ok(None)` when the (parent, child) type pair is not in the
    /// inference table: the child stands alone, silently. Returns an error
    /// when the parent id is unknown; the child node is not removed.
    pub fn link_to_parent(
        &mut self,
        parent_id: &str,
        child_id: &str,
    ) -> GraphResult<Option<Edge>> {
        let parent_type = self
            .nodes
            .get(parent_id)
            .map(Node::node_type)
            .ok_or_else(|| GraphError::ParentNotFound {
                node_id: parent_id.to_string(),
            })?;
        let child_type = self
            .nodes
            .get(child_id)
            .map(Node::node_type)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: child_id.to_string(),
            })?;

        match auto_edge_type(parent_type, child_type) {
            Some(edge_type) => {
                let edge = Edge::new(parent_id, child_id, edge_type);
                self.edges.insert(edge.id.clone(), edge.clone());
                self.touch();
                Ok(Some(edge))
            }
            None => Ok(None),
        }
    }

    /// Record an explicit edge between two existing nodes.
    ///
    /// Strength is clamped into [0, 1] (default 1). Supports/contradicts
    /// pairs between the same endpoints are reported as conflicts without
    /// blocking the connect. Self-loops and duplicate edges are permitted.
    pub fn connect(
        &mut self,
        from: &str,
        to: &str,
        edge_type: EdgeType,
        strength: Option<f64>,
        annotations: ConnectAnnotations,
    ) -> GraphResult<ConnectOutcome> {
        let mut missing = Vec::new();
        if !self.nodes.contains_key(from) {
            missing.push(from);
        }
        if !self.nodes.contains_key(to) {
            missing.push(to);
        }
        if !missing.is_empty() {
            return Err(GraphError::EndpointsNotFound {
                missing: missing
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let conflicts = self.find_conflicts(from, to, edge_type);

        let mut edge = Edge::new(from, to, edge_type).with_strength(strength.unwrap_or(1.0));
        if let Some(reasoning) = annotations.reasoning {
            edge = edge.with_reasoning(reasoning);
        }
        if let Some(evidence) = annotations.evidence {
            edge = edge.with_evidence(evidence);
        }

        self.edges.insert(edge.id.clone(), edge.clone());
        self.touch();

        Ok(ConnectOutcome { edge, conflicts })
    }

    /// Existing edges of the opposing type between the same endpoints.
    fn find_conflicts(&self, from: &str, to: &str, edge_type: EdgeType) -> Vec<EdgeConflict> {
        let Some(opposing) = edge_type.conflicting() else {
            return Vec::new();
        };
        self.edges
            .values()
            .filter(|e| e.edge_type == opposing && e.from == from && e.to == to)
            .map(|e| EdgeConflict {
                edge_id: e.id.clone(),
                edge_type: e.edge_type,
                message: format!(
                    "{} edge conflicts with existing {} edge {}",
                    edge_type, e.edge_type, e.id
                ),
            })
            .collect()
    }

    /// Count this process session.
    pub fn begin_session(&mut self) {
        self.metadata.session_count += 1;
    }

    fn touch(&mut self) {
        self.metadata.last_modified = Utc::now();
    }

    /// Get a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Iterate all nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate all edges, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Ids of root problems, in creation order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Graph-level metadata.
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
