//! Graph data model for debugging knowledge.
//!
//! Nodes record the steps of a debugging session (problems, hypotheses,
//! experiments, observations, learnings, solutions); edges record typed,
//! directed, weighted relationships between them. Both are immutable once
//! created: the graph is a growing log of facts with no update or delete.

mod store;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use store::{auto_edge_type, ConnectOutcome, EdgeConflict, GraphMetadata, GraphStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Default confidence injected for hypotheses created without one.
pub const DEFAULT_HYPOTHESIS_CONFIDENCE: u8 = 50;
/// Default confidence injected for learnings created without one.
pub const DEFAULT_LEARNING_CONFIDENCE: u8 = 70;

/// The closed set of node types in a debugging graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Something that is going wrong.
    Problem,
    /// A candidate explanation for a problem.
    Hypothesis,
    /// A concrete test of a hypothesis.
    Experiment,
    /// What an experiment showed.
    Observation,
    /// A durable takeaway distilled from observations.
    Learning,
    /// A fix that resolves a problem.
    Solution,
}

impl NodeType {
    /// All node types, in model order.
    pub const ALL: [NodeType; 6] = [
        NodeType::Problem,
        NodeType::Hypothesis,
        NodeType::Experiment,
        NodeType::Observation,
        NodeType::Learning,
        NodeType::Solution,
    ];
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Problem => write!(f, "problem"),
            NodeType::Hypothesis => write!(f, "hypothesis"),
            NodeType::Experiment => write!(f, "experiment"),
            NodeType::Observation => write!(f, "observation"),
            NodeType::Learning => write!(f, "learning"),
            NodeType::Solution => write!(f, "solution"),
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "problem" => Ok(NodeType::Problem),
            "hypothesis" => Ok(NodeType::Hypothesis),
            "experiment" => Ok(NodeType::Experiment),
            "observation" => Ok(NodeType::Observation),
            "learning" => Ok(NodeType::Learning),
            "solution" => Ok(NodeType::Solution),
            _ => Err(format!("Unknown node type: {}", s)),
        }
    }
}

/// The closed set of edge types in a debugging graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Parent problem broken into a sub-problem.
    Decomposes,
    /// Problem spawning a candidate explanation.
    Hypothesizes,
    /// Hypothesis checked by an experiment.
    Tests,
    /// Experiment yielding an observation.
    Produces,
    /// Observation distilled into a learning.
    Learns,
    /// One node contradicting another's claim.
    Contradicts,
    /// One node supporting another's claim.
    Supports,
    /// A solution resolving a problem.
    Solves,
}

impl EdgeType {
    /// Whether this edge type expresses structural parent→child descent.
    ///
    /// Structural edges are the ones automatic parent inference produces,
    /// and the only ones the parent index follows.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            EdgeType::Decomposes
                | EdgeType::Hypothesizes
                | EdgeType::Tests
                | EdgeType::Produces
                | EdgeType::Learns
        )
    }

    /// Whether this edge type expresses evidence (support, contradiction,
    /// resolution) rather than structural descent.
    pub fn is_evidentiary(self) -> bool {
        !self.is_structural()
    }

    /// The edge type whose presence between the same endpoints conflicts
    /// with this one, if any.
    pub fn conflicting(self) -> Option<EdgeType> {
        match self {
            EdgeType::Supports => Some(EdgeType::Contradicts),
            EdgeType::Contradicts => Some(EdgeType::Supports),
            _ => None,
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Decomposes => write!(f, "decomposes"),
            EdgeType::Hypothesizes => write!(f, "hypothesizes"),
            EdgeType::Tests => write!(f, "tests"),
            EdgeType::Produces => write!(f, "produces"),
            EdgeType::Learns => write!(f, "learns"),
            EdgeType::Contradicts => write!(f, "contradicts"),
            EdgeType::Supports => write!(f, "supports"),
            EdgeType::Solves => write!(f, "solves"),
        }
    }
}

impl std::str::FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "decomposes" => Ok(EdgeType::Decomposes),
            "hypothesizes" => Ok(EdgeType::Hypothesizes),
            "tests" => Ok(EdgeType::Tests),
            "produces" => Ok(EdgeType::Produces),
            "learns" => Ok(EdgeType::Learns),
            "contradicts" => Ok(EdgeType::Contradicts),
            "supports" => Ok(EdgeType::Supports),
            "solves" => Ok(EdgeType::Solves),
            _ => Err(format!("Unknown edge type: {}", s)),
        }
    }
}

/// Investigation status of a problem node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    /// Nobody is looking at it yet.
    #[default]
    Open,
    /// Actively being worked on.
    Investigating,
    /// Resolved by a solution.
    Solved,
    /// Given up on.
    Abandoned,
}

impl std::fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemStatus::Open => write!(f, "open"),
            ProblemStatus::Investigating => write!(f, "investigating"),
            ProblemStatus::Solved => write!(f, "solved"),
            ProblemStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for ProblemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(ProblemStatus::Open),
            "investigating" => Ok(ProblemStatus::Investigating),
            "solved" => Ok(ProblemStatus::Solved),
            "abandoned" => Ok(ProblemStatus::Abandoned),
            _ => Err(format!("Unknown problem status: {}", s)),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Type-specific node payload.
///
/// Each variant carries the known fields for its node type, strongly typed;
/// anything else a caller supplies lives in [`NodeMetadata::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    /// A problem under investigation.
    Problem {
        /// Current investigation status.
        #[serde(default)]
        status: ProblemStatus,
        /// Whether this problem was created without a parent.
        #[serde(default, rename = "isRoot")]
        is_root: bool,
    },
    /// A candidate explanation.
    Hypothesis {
        /// Confidence in the hypothesis, 0-100.
        confidence: u8,
        /// Whether the hypothesis can be tested.
        #[serde(default = "default_true")]
        testable: bool,
    },
    /// A concrete test.
    Experiment,
    /// A recorded observation.
    Observation,
    /// A durable takeaway.
    Learning {
        /// Confidence in the learning, 0-100.
        confidence: u8,
    },
    /// A fix for a problem.
    Solution {
        /// Whether the fix was verified to work.
        #[serde(default)]
        verified: bool,
    },
}

impl NodeKind {
    /// The plain node type of this payload.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Problem { .. } => NodeType::Problem,
            NodeKind::Hypothesis { .. } => NodeType::Hypothesis,
            NodeKind::Experiment => NodeType::Experiment,
            NodeKind::Observation => NodeType::Observation,
            NodeKind::Learning { .. } => NodeType::Learning,
            NodeKind::Solution { .. } => NodeType::Solution,
        }
    }
}

/// Shared node metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at`; nodes are never edited.
    pub updated_at: DateTime<Utc>,
    /// Caller-supplied tags, in the order given.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Forward-compatible, non-validated attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller-supplied metadata for node creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetadata {
    /// Tags to attach, in order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Confidence 0-100; meaningful for hypothesis and learning nodes.
    pub confidence: Option<u8>,
    /// Investigation status; meaningful for problem nodes.
    pub status: Option<ProblemStatus>,
    /// Whether a hypothesis is testable.
    pub testable: Option<bool>,
    /// Whether a solution is verified.
    pub verified: Option<bool>,
    /// Anything else; stored verbatim in the node's extension map.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of a debugging process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier, assigned at creation.
    pub id: String,
    /// Type-specific payload; the `type` tag lives here.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Free-form content text.
    pub content: String,
    /// Shared metadata.
    pub metadata: NodeMetadata,
}

impl Node {
    /// Build a node of the given type, applying the per-type creation
    /// defaults (problem → open/non-root, hypothesis → confidence 50 and
    /// testable, learning → confidence 70, solution → unverified).
    pub fn new(node_type: NodeType, content: impl Into<String>, meta: CreateMetadata) -> Self {
        let now = Utc::now();
        let mut extra = meta.extra;

        let kind = match node_type {
            NodeType::Problem => NodeKind::Problem {
                status: meta.status.unwrap_or_default(),
                is_root: false,
            },
            NodeType::Hypothesis => NodeKind::Hypothesis {
                confidence: meta
                    .confidence
                    .unwrap_or(DEFAULT_HYPOTHESIS_CONFIDENCE)
                    .min(100),
                testable: meta.testable.unwrap_or(true),
            },
            NodeType::Experiment => NodeKind::Experiment,
            NodeType::Observation => NodeKind::Observation,
            NodeType::Learning => NodeKind::Learning {
                confidence: meta
                    .confidence
                    .unwrap_or(DEFAULT_LEARNING_CONFIDENCE)
                    .min(100),
            },
            NodeType::Solution => NodeKind::Solution {
                verified: meta.verified.unwrap_or(false),
            },
        };

        // Fields supplied for a type that has no slot for them are kept in
        // the extension map rather than dropped.
        match node_type {
            NodeType::Hypothesis | NodeType::Learning => {}
            _ => {
                if let Some(confidence) = meta.confidence {
                    extra.insert("confidence".to_string(), Value::from(confidence.min(100)));
                }
            }
        }
        if node_type != NodeType::Problem {
            if let Some(status) = meta.status {
                extra.insert("status".to_string(), Value::from(status.to_string()));
            }
        }

        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            metadata: NodeMetadata {
                created_at: now,
                updated_at: now,
                tags: meta.tags,
                extra,
            },
        }
    }

    /// Mark a problem node as a debugging-tree root.
    pub fn as_root(mut self) -> Self {
        if let NodeKind::Problem { ref mut is_root, .. } = self.kind {
            *is_root = true;
        }
        self
    }

    /// The plain node type.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Whether this is a root problem node.
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Problem { is_root: true, .. })
    }

    /// Whether this is a problem node marked solved.
    pub fn is_solved(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Problem {
                status: ProblemStatus::Solved,
                ..
            }
        )
    }
}

/// Edge metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    /// When the edge was created.
    pub created_at: DateTime<Utc>,
    /// Why the edge was drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Evidence backing the relationship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Caller-supplied annotations for an explicit connect call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectAnnotations {
    /// Why the edge is being drawn.
    pub reasoning: Option<String>,
    /// Evidence backing the relationship.
    pub evidence: Option<String>,
}

/// A typed, directed, weighted relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Relationship strength, always within [0, 1].
    pub strength: f64,
    /// Edge metadata.
    pub metadata: EdgeMetadata,
}

impl Edge {
    /// Create a new edge with full strength.
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            edge_type,
            from: from.into(),
            to: to.into(),
            strength: 1.0,
            metadata: EdgeMetadata {
                created_at: Utc::now(),
                reasoning: None,
                evidence: None,
            },
        }
    }

    /// Set strength, clamped into [0, 1].
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Set the reasoning annotation.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.metadata.reasoning = Some(reasoning.into());
        self
    }

    /// Set the evidence annotation.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.metadata.evidence = Some(evidence.into());
        self
    }
}
