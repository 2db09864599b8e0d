//! Derived indexes over the graph store.
//!
//! Four structures keep queries sub-linear:
//!
//! - **error-type buckets**: classifier token → problem node ids (problems
//!   with no extractable type share a reserved "other" bucket)
//! - **nodes by type**: node type → node ids
//! - **adjacency**: node id → incoming/outgoing edge ids, present for every
//!   node so lookups never need existence checks
//! - **parent pointers**: child id → parent id, derived from structural
//!   edges only
//!
//! Every index is updated incrementally on each mutation and can also be
//! rebuilt in full from the store; both paths produce identical contents.

use std::collections::{HashMap, HashSet};

use crate::graph::{Edge, GraphStore, Node, NodeType};
use crate::similarity::{extract_error_type, ErrorCategory};

/// Incoming and outgoing edge ids for one node, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAdjacency {
    /// Edges pointing at this node.
    pub incoming: Vec<String>,
    /// Edges leaving this node.
    pub outgoing: Vec<String>,
}

/// The four derived indexes.
///
/// Error-type buckets are keyed by `Option<ErrorCategory>`; `None` is the
/// reserved bucket for problems with no extractable error type.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GraphIndexes {
    error_type: HashMap<Option<ErrorCategory>, HashSet<String>>,
    by_type: HashMap<NodeType, HashSet<String>>,
    adjacency: HashMap<String, NodeAdjacency>,
    parent: HashMap<String, String>,
}

impl GraphIndexes {
    /// Create empty indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly created node in every applicable index.
    pub fn index_node(&mut self, node: &Node) {
        self.by_type
            .entry(node.node_type())
            .or_default()
            .insert(node.id.clone());
        self.adjacency.entry(node.id.clone()).or_default();
        if node.node_type() == NodeType::Problem {
            let bucket = extract_error_type(&node.content).map(|m| m.category);
            self.error_type
                .entry(bucket)
                .or_default()
                .insert(node.id.clone());
        }
    }

    /// Register a newly created edge in the adjacency lists and, for
    /// structural edges, the parent pointers.
    pub fn index_edge(&mut self, edge: &Edge) {
        self.adjacency
            .entry(edge.from.clone())
            .or_default()
            .outgoing
            .push(edge.id.clone());
        self.adjacency
            .entry(edge.to.clone())
            .or_default()
            .incoming
            .push(edge.id.clone());
        if edge.edge_type.is_structural() {
            self.parent.insert(edge.to.clone(), edge.from.clone());
        }
    }

    /// Rebuild all four indexes by scanning the store, in time linear in
    /// node + edge count.
    pub fn rebuild(store: &GraphStore) -> Self {
        let mut indexes = Self::new();
        for node in store.nodes() {
            indexes.index_node(node);
        }
        // Replay edges in creation order so adjacency lists and parent
        // pointers match what the incremental path produced.
        let mut edges: Vec<&Edge> = store.edges().collect();
        edges.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        for edge in edges {
            indexes.index_edge(edge);
        }
        indexes
    }

    /// Problem ids in the given error-type bucket.
    pub fn problems_for(&self, category: Option<ErrorCategory>) -> Option<&HashSet<String>> {
        self.error_type.get(&category)
    }

    /// Whether no problem has been indexed by error type yet.
    pub fn error_type_is_empty(&self) -> bool {
        self.error_type.is_empty()
    }

    /// Node ids of the given type.
    pub fn nodes_of_type(&self, node_type: NodeType) -> Option<&HashSet<String>> {
        self.by_type.get(&node_type)
    }

    /// Number of nodes of the given type.
    pub fn type_count(&self, node_type: NodeType) -> usize {
        self.by_type.get(&node_type).map_or(0, HashSet::len)
    }

    /// Adjacency entry for a node.
    pub fn adjacency(&self, id: &str) -> Option<&NodeAdjacency> {
        self.adjacency.get(id)
    }

    /// Parent of a node, if a structural edge points at it.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parent.get(id).map(String::as_str)
    }
}
