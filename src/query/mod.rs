//! Query engine: similar-problems search, recent-activity listing, and
//! debug-path reconstruction.
//!
//! Queries read through the indexes and the similarity engine only; they
//! never mutate graph state.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{Edge, EdgeType, GraphStore, Node, NodeType};
use crate::index::GraphIndexes;
use crate::similarity::{extract_error_type, similarity};

/// Default number of results returned by a query.
pub const DEFAULT_QUERY_LIMIT: usize = 10;
/// Default similarity floor for similar-problems search.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

/// One query request, tagged by `queryType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "queryType", rename_all = "kebab-case")]
pub enum QueryRequest {
    /// Rank past problems against a pattern string.
    SimilarProblems(SimilarProblemsParams),
    /// List the most recently created nodes with their surroundings.
    RecentActivity(RecentActivityParams),
}

/// Parameters for similar-problems search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarProblemsParams {
    /// The query string to rank problems against.
    pub pattern: String,
    /// Maximum number of problems returned.
    pub limit: usize,
    /// Problems scoring below this are dropped.
    pub min_similarity: f64,
}

impl Default for SimilarProblemsParams {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            limit: DEFAULT_QUERY_LIMIT,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

/// Parameters for recent-activity listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecentActivityParams {
    /// Maximum number of nodes returned.
    pub limit: usize,
}

impl Default for RecentActivityParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

/// A past problem ranked against the query pattern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarProblem {
    /// The matched problem node.
    pub problem: Node,
    /// Similarity of the pattern to the problem content, in [0, 1].
    pub similarity: f64,
    /// Solutions recorded for this problem, each with its debug path.
    pub solutions: Vec<SolvedBy>,
}

/// A solution attached to a ranked problem.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedBy {
    /// The solution node.
    pub solution: Node,
    /// The reconstructed path from the problem to this solution.
    pub path: Vec<Node>,
}

/// Direction of an edge relative to the node it annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// The edge points at the node.
    Incoming,
    /// The edge leaves the node.
    Outgoing,
}

/// An edge adjacent to an activity node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacentEdge {
    /// The edge itself.
    pub edge: Edge,
    /// Which way the edge runs relative to the node.
    pub direction: EdgeDirection,
    /// The id of the other endpoint.
    pub other: String,
}

/// One entry in a recent-activity listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// The node.
    pub node: Node,
    /// Its structural parent, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// All adjacent edges, annotated with direction.
    pub edges: Vec<AdjacentEdge>,
}

/// Read-only query engine over a graph store and its indexes.
pub struct QueryEngine<'a> {
    store: &'a GraphStore,
    indexes: &'a GraphIndexes,
}

impl<'a> QueryEngine<'a> {
    /// Create an engine borrowing the store and indexes.
    pub fn new(store: &'a GraphStore, indexes: &'a GraphIndexes) -> Self {
        Self { store, indexes }
    }

    /// Rank past problems against `params.pattern`.
    ///
    /// Candidates come from the error-type bucket matching the pattern's
    /// classification (the "other" bucket when nothing classifies); a full
    /// scan over problem nodes happens only when the index is entirely
    /// unbuilt. Solved problems sort before unsolved ones, then by
    /// similarity descending.
    pub fn similar_problems(&self, params: &SimilarProblemsParams) -> Vec<SimilarProblem> {
        let category = extract_error_type(&params.pattern).map(|m| m.category);

        let candidates: Vec<&Node> = match self.indexes.problems_for(category) {
            Some(bucket) => bucket
                .iter()
                .filter_map(|id| self.store.node(id))
                .collect(),
            None if self.indexes.error_type_is_empty() => {
                // Defensive fallback for an unbuilt index.
                self.store
                    .nodes()
                    .filter(|n| n.node_type() == NodeType::Problem)
                    .collect()
            }
            None => Vec::new(),
        };
        debug!(
            candidates = candidates.len(),
            bucket = %category.map_or_else(|| "other".to_string(), |c| c.to_string()),
            "Similar-problems candidate set selected"
        );

        let mut ranked: Vec<SimilarProblem> = candidates
            .into_iter()
            .filter_map(|node| {
                let score = similarity(&params.pattern, &node.content);
                if score < params.min_similarity {
                    return None;
                }
                Some(SimilarProblem {
                    similarity: score,
                    solutions: self.solutions_for(&node.id),
                    problem: node.clone(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.problem
                .is_solved()
                .cmp(&a.problem.is_solved())
                .then_with(|| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(Ordering::Equal)
                })
        });
        ranked.truncate(params.limit);
        ranked
    }

    /// Solutions recorded for a problem: `solves` edges whose target is the
    /// problem, each with its reconstructed debug path.
    fn solutions_for(&self, problem_id: &str) -> Vec<SolvedBy> {
        let Some(adjacency) = self.indexes.adjacency(problem_id) else {
            return Vec::new();
        };
        adjacency
            .incoming
            .iter()
            .filter_map(|edge_id| self.store.edge(edge_id))
            .filter(|edge| edge.edge_type == EdgeType::Solves)
            .filter_map(|edge| {
                self.store.node(&edge.from).map(|solution| SolvedBy {
                    solution: solution.clone(),
                    path: self.build_path(problem_id, &edge.from),
                })
            })
            .collect()
    }

    /// Reconstruct the debug path from `problem_id` to `solution_id`.
    ///
    /// Walks parent pointers upward from the solution, falling back to the
    /// first incoming edge when a node has no structural parent; stops at
    /// the problem, at a dead end, or on revisiting a node (cycle guard).
    /// The problem is prepended when the walk did not reach it.
    pub fn build_path(&self, problem_id: &str, solution_id: &str) -> Vec<Node> {
        let mut path_ids: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = solution_id.to_string();

        loop {
            if !visited.insert(current.clone()) {
                break;
            }
            path_ids.push(current.clone());
            if current == problem_id {
                break;
            }
            let next = match self.indexes.parent_of(&current) {
                Some(parent) => Some(parent.to_string()),
                None => self
                    .indexes
                    .adjacency(&current)
                    .and_then(|adjacency| adjacency.incoming.first())
                    .and_then(|edge_id| self.store.edge(edge_id))
                    .map(|edge| edge.from.clone()),
            };
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }

        path_ids.reverse();
        if path_ids.first().map(String::as_str) != Some(problem_id) {
            path_ids.insert(0, problem_id.to_string());
        }

        path_ids
            .iter()
            .filter_map(|id| self.store.node(id))
            .cloned()
            .collect()
    }

    /// List the most recently created nodes with their parent and adjacent
    /// edges.
    pub fn recent_activity(&self, params: &RecentActivityParams) -> Vec<ActivityEntry> {
        let mut nodes: Vec<&Node> = self.store.nodes().collect();
        nodes.sort_by(|a, b| {
            b.metadata
                .created_at
                .cmp(&a.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        nodes.truncate(params.limit);

        nodes
            .into_iter()
            .map(|node| ActivityEntry {
                parent_id: self.indexes.parent_of(&node.id).map(str::to_string),
                edges: self.adjacent_edges(&node.id),
                node: node.clone(),
            })
            .collect()
    }

    fn adjacent_edges(&self, id: &str) -> Vec<AdjacentEdge> {
        let Some(adjacency) = self.indexes.adjacency(id) else {
            return Vec::new();
        };
        let mut edges = Vec::with_capacity(adjacency.incoming.len() + adjacency.outgoing.len());
        for edge_id in &adjacency.incoming {
            if let Some(edge) = self.store.edge(edge_id) {
                edges.push(AdjacentEdge {
                    edge: edge.clone(),
                    direction: EdgeDirection::Incoming,
                    other: edge.from.clone(),
                });
            }
        }
        for edge_id in &adjacency.outgoing {
            if let Some(edge) = self.store.edge(edge_id) {
                edges.push(AdjacentEdge {
                    edge: edge.clone(),
                    direction: EdgeDirection::Outgoing,
                    other: edge.to.clone(),
                });
            }
        }
        edges
    }
}
