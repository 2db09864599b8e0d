//! The in-process service consumed by the tool-calling front end.
//!
//! Exposes the three logical operations — create, connect, query — and owns
//! the ordering contract: mutate the store, update the indexes, then append
//! to the journal. Every mutation runs to completion through one `&mut self`
//! path, so index consistency never needs locking.
//!
//! A journal failure after a successful in-memory mutation is surfaced to
//! the caller but does not roll the mutation back; memory and disk are not
//! transactionally coupled. This is a known, documented gap.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::graph::{
    ConnectAnnotations, CreateMetadata, EdgeConflict, EdgeType, GraphMetadata, GraphStore, Node,
    NodeType,
};
use crate::index::GraphIndexes;
use crate::journal::{replay_latest, FileJournal, GraphSnapshot, Journal, JournalContents};
use crate::query::{ActivityEntry, QueryEngine, QueryRequest, SimilarProblem};

/// Parameters for the create operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    /// Type of node to create.
    pub node_type: NodeType,
    /// Free-form content text.
    pub content: String,
    /// Optional parent node; when present and the type pair is mapped, the
    /// parent edge is inferred automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Optional node metadata.
    #[serde(default)]
    pub metadata: CreateMetadata,
}

/// Result of the create operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    /// Id of the created node.
    pub node_id: String,
    /// Id of the automatically inferred parent edge, when one was drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

/// Parameters for the connect operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Relationship strength; clamped into [0, 1], default 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    /// Optional reasoning/evidence annotations.
    #[serde(default)]
    pub metadata: ConnectAnnotations,
}

/// Result of the connect operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    /// Id of the recorded edge.
    pub edge_id: String,
    /// Opposing edges between the same endpoints. Reported, never blocking.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<EdgeConflict>,
}

/// Result of the query operation, tagged like the request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "queryType", content = "results", rename_all = "kebab-case")]
pub enum QueryResponse {
    /// Ranked problems for a similar-problems query.
    SimilarProblems(Vec<SimilarProblem>),
    /// Entries for a recent-activity query.
    RecentActivity(Vec<ActivityEntry>),
}

/// Per-type node counts plus graph-level counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Number of edges in the graph.
    pub edge_count: usize,
    /// Number of root problems.
    pub root_count: usize,
    /// Number of problem nodes.
    pub problems: usize,
    /// Number of hypothesis nodes.
    pub hypotheses: usize,
    /// Number of experiment nodes.
    pub experiments: usize,
    /// Number of observation nodes.
    pub observations: usize,
    /// Number of learning nodes.
    pub learnings: usize,
    /// Number of solution nodes.
    pub solutions: usize,
    /// How many process sessions have opened this graph.
    pub session_count: u64,
}

/// The knowledge store behind the front end.
pub struct GraphService {
    store: GraphStore,
    indexes: GraphIndexes,
    journal: Box<dyn Journal>,
}

impl GraphService {
    /// Open the journal at the configured data directory and load the graph.
    pub async fn open(config: &Config) -> AppResult<Self> {
        let journal = FileJournal::open(&config.storage.data_dir).await?;
        Self::load(Box::new(journal)).await
    }

    /// Load (or initialize) the graph from the given journal.
    ///
    /// Both logs are replayed with last-write-wins-by-id semantics and the
    /// four indexes are rebuilt in full; the reconstructed state matches
    /// what the process that wrote the journal held in memory.
    pub async fn load(journal: Box<dyn Journal>) -> AppResult<Self> {
        let JournalContents {
            nodes,
            edges,
            snapshot,
        } = journal.load().await?;

        let node_map = replay_latest(nodes, |n: &Node| n.id.clone());
        let edge_map = replay_latest(edges, |e| e.id.clone());

        let (roots, metadata) = match snapshot {
            Some(snapshot) => (snapshot.roots.clone(), snapshot.metadata()),
            None => (derive_roots(node_map.values()), GraphMetadata::new()),
        };

        let mut store = GraphStore::from_parts(node_map, edge_map, roots, metadata);
        store.begin_session();
        let indexes = GraphIndexes::rebuild(&store);

        let service = Self {
            store,
            indexes,
            journal,
        };
        service
            .journal
            .write_snapshot(&GraphSnapshot::from(&service.store))
            .await?;

        info!(
            nodes = service.store.node_count(),
            edges = service.store.edge_count(),
            sessions = service.store.metadata().session_count,
            "Debug graph loaded"
        );
        Ok(service)
    }

    /// Record one debugging step, inferring the parent edge when a parent
    /// is given and the type pair is mapped.
    ///
    /// A missing parent is an error, but the node itself is already part of
    /// the graph and journaled by then; append-only semantics mean it is not
    /// rolled back.
    pub async fn create(&mut self, params: CreateParams) -> AppResult<CreateResult> {
        let start = Instant::now();

        let mut node = Node::new(params.node_type, &params.content, params.metadata);
        if params.parent_id.is_none() && params.node_type == NodeType::Problem {
            node = node.as_root();
        }
        let node_id = node.id.clone();

        self.indexes.index_node(&node);
        self.store.insert_node(node.clone());
        self.journal.append_node(&node).await?;

        let mut edge_id = None;
        if let Some(parent_id) = &params.parent_id {
            match self.store.link_to_parent(parent_id, &node_id) {
                Ok(Some(edge)) => {
                    self.indexes.index_edge(&edge);
                    self.journal.append_edge(&edge).await?;
                    edge_id = Some(edge.id);
                }
                // Unmapped (parent, child) type pair: no edge, no error.
                Ok(None) => {}
                Err(e) => {
                    self.write_snapshot().await?;
                    warn!(
                        parent_id = %parent_id,
                        node_id = %node_id,
                        "Parent node missing; node recorded without a parent edge"
                    );
                    return Err(e.into());
                }
            }
        }
        self.write_snapshot().await?;

        info!(
            node_id = %node_id,
            node_type = %params.node_type,
            edge_id = ?edge_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Node created"
        );
        Ok(CreateResult { node_id, edge_id })
    }

    /// Record an explicit relationship between two existing nodes.
    pub async fn connect(&mut self, params: ConnectParams) -> AppResult<ConnectResult> {
        let outcome = self.store.connect(
            &params.from,
            &params.to,
            params.edge_type,
            params.strength,
            params.metadata,
        )?;
        self.indexes.index_edge(&outcome.edge);
        self.journal.append_edge(&outcome.edge).await?;
        self.write_snapshot().await?;

        if !outcome.conflicts.is_empty() {
            warn!(
                edge_id = %outcome.edge.id,
                conflicts = outcome.conflicts.len(),
                "Connect recorded contradictory evidence"
            );
        }
        info!(
            edge_id = %outcome.edge.id,
            edge_type = %params.edge_type,
            from = %params.from,
            to = %params.to,
            "Edge created"
        );
        Ok(ConnectResult {
            edge_id: outcome.edge.id,
            conflicts: outcome.conflicts,
        })
    }

    /// Answer a query. Queries never mutate state.
    pub fn query(&self, request: &QueryRequest) -> QueryResponse {
        let engine = QueryEngine::new(&self.store, &self.indexes);
        match request {
            QueryRequest::SimilarProblems(params) => {
                QueryResponse::SimilarProblems(engine.similar_problems(params))
            }
            QueryRequest::RecentActivity(params) => {
                QueryResponse::RecentActivity(engine.recent_activity(params))
            }
        }
    }

    /// Cheap aggregate view of the graph.
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            node_count: self.store.node_count(),
            edge_count: self.store.edge_count(),
            root_count: self.store.roots().len(),
            problems: self.indexes.type_count(NodeType::Problem),
            hypotheses: self.indexes.type_count(NodeType::Hypothesis),
            experiments: self.indexes.type_count(NodeType::Experiment),
            observations: self.indexes.type_count(NodeType::Observation),
            learnings: self.indexes.type_count(NodeType::Learning),
            solutions: self.indexes.type_count(NodeType::Solution),
            session_count: self.store.metadata().session_count,
        }
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    async fn write_snapshot(&self) -> AppResult<()> {
        self.journal
            .write_snapshot(&GraphSnapshot::from(&self.store))
            .await?;
        Ok(())
    }
}

fn derive_roots<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<String> {
    let mut roots: Vec<&Node> = nodes.filter(|n| n.is_root()).collect();
    roots.sort_by(|a, b| {
        a.metadata
            .created_at
            .cmp(&b.metadata.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    roots.into_iter().map(|n| n.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, JournalError};
    use crate::journal::MockJournal;

    fn quiet_journal() -> MockJournal {
        let mut journal = MockJournal::new();
        journal
            .expect_load()
            .returning(|| Ok(JournalContents::default()));
        journal.expect_append_node().returning(|_| Ok(()));
        journal.expect_append_edge().returning(|_| Ok(()));
        journal.expect_write_snapshot().returning(|_| Ok(()));
        journal
    }

    fn create_problem(content: &str) -> CreateParams {
        CreateParams {
            node_type: NodeType::Problem,
            content: content.to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_create_registers_root_problem() {
        let mut service = GraphService::load(Box::new(quiet_journal())).await.unwrap();

        let created = service.create(create_problem("TypeError: boom")).await.unwrap();
        assert!(created.edge_id.is_none());
        assert_eq!(service.store().roots(), &[created.node_id.clone()]);
        assert!(service.store().node(&created.node_id).unwrap().is_root());
    }

    #[tokio::test]
    async fn test_failed_append_keeps_in_memory_mutation() {
        let mut journal = MockJournal::new();
        journal
            .expect_load()
            .returning(|| Ok(JournalContents::default()));
        journal.expect_write_snapshot().returning(|_| Ok(()));
        journal.expect_append_node().returning(|_| {
            Err(JournalError::Append {
                path: "nodes.jsonl".to_string(),
                message: "disk full".to_string(),
            })
        });

        let mut service = GraphService::load(Box::new(journal)).await.unwrap();
        let result = service.create(create_problem("it broke")).await;

        assert!(matches!(result, Err(AppError::Journal(_))));
        // The in-memory mutation is not rolled back.
        assert_eq!(service.store().node_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_parent_keeps_node() {
        let mut service = GraphService::load(Box::new(quiet_journal())).await.unwrap();

        let result = service
            .create(CreateParams {
                node_type: NodeType::Hypothesis,
                content: "maybe".to_string(),
                parent_id: Some("ghost".to_string()),
                metadata: CreateMetadata::default(),
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Graph error: Parent node ghost not found");
        assert_eq!(service.store().node_count(), 1);
        assert_eq!(service.store().edge_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let mut service = GraphService::load(Box::new(quiet_journal())).await.unwrap();

        let problem = service.create(create_problem("RangeError: nope")).await.unwrap();
        service
            .create(CreateParams {
                node_type: NodeType::Hypothesis,
                content: "off by one".to_string(),
                parent_id: Some(problem.node_id),
                metadata: CreateMetadata::default(),
            })
            .await
            .unwrap();

        let summary = service.summary();
        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.edge_count, 1);
        assert_eq!(summary.problems, 1);
        assert_eq!(summary.hypotheses, 1);
        assert_eq!(summary.root_count, 1);
        assert_eq!(summary.session_count, 1);
    }
}
