//! Append-only persistence log.
//!
//! Two per-entity logs (one JSON record per line, one record per creation
//! event) plus one overwritten snapshot file for graph-level counters and
//! roots. Loading replays both logs with last-write-wins-by-id semantics,
//! which also supports future correction-by-re-append even though no current
//! operation re-appends an existing id.

mod file;

pub use file::FileJournal;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JournalResult;
use crate::graph::{Edge, GraphMetadata, GraphStore, Node};

/// Graph-level counters and roots, overwritten on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    /// Ids of root problems, in creation order.
    pub roots: Vec<String>,
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Number of edges in the graph.
    pub edge_count: usize,
    /// When the graph was first created.
    pub created_at: DateTime<Utc>,
    /// When the graph last changed.
    pub last_modified: DateTime<Utc>,
    /// How many process sessions have opened this graph.
    pub session_count: u64,
}

impl From<&GraphStore> for GraphSnapshot {
    fn from(store: &GraphStore) -> Self {
        let metadata = store.metadata();
        Self {
            roots: store.roots().to_vec(),
            node_count: store.node_count(),
            edge_count: store.edge_count(),
            created_at: metadata.created_at,
            last_modified: metadata.last_modified,
            session_count: metadata.session_count,
        }
    }
}

impl GraphSnapshot {
    /// The graph-level metadata carried by this snapshot.
    pub fn metadata(&self) -> GraphMetadata {
        GraphMetadata {
            created_at: self.created_at,
            last_modified: self.last_modified,
            session_count: self.session_count,
        }
    }
}

/// Everything a journal holds.
#[derive(Debug, Default)]
pub struct JournalContents {
    /// Node records, in file order.
    pub nodes: Vec<Node>,
    /// Edge records, in file order.
    pub edges: Vec<Edge>,
    /// The snapshot, when one was written.
    pub snapshot: Option<GraphSnapshot>,
}

/// Replay append-only records into a map, keeping the last record per id.
///
/// Replay trusts the log: no graph invariants are checked here. Invariants
/// apply at append time only.
pub fn replay_latest<T, F>(records: Vec<T>, id_of: F) -> HashMap<String, T>
where
    F: Fn(&T) -> String,
{
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        map.insert(id_of(&record), record);
    }
    map
}

/// Append-only record store: one log per entity kind plus a snapshot file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Journal: Send + Sync {
    /// Append one node creation record.
    async fn append_node(&self, node: &Node) -> JournalResult<()>;
    /// Append one edge creation record.
    async fn append_edge(&self, edge: &Edge) -> JournalResult<()>;
    /// Overwrite the graph snapshot.
    async fn write_snapshot(&self, snapshot: &GraphSnapshot) -> JournalResult<()>;
    /// Read everything back. Absent files mean an empty journal, not an
    /// error.
    async fn load(&self) -> JournalResult<JournalContents>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CreateMetadata, NodeType};

    #[test]
    fn test_replay_latest_keeps_last_record_per_id() {
        let mut first = Node::new(NodeType::Problem, "original", CreateMetadata::default());
        let mut second = first.clone();
        second.content = "corrected".to_string();
        first.id = "n-1".to_string();
        second.id = "n-1".to_string();
        let other = Node::new(NodeType::Learning, "unrelated", CreateMetadata::default());
        let other_id = other.id.clone();

        let map = replay_latest(vec![first, other, second], |n| n.id.clone());
        assert_eq!(map.len(), 2);
        assert_eq!(map["n-1"].content, "corrected");
        assert!(map.contains_key(&other_id));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = GraphSnapshot {
            roots: vec!["r-1".to_string()],
            node_count: 3,
            edge_count: 2,
            created_at: Utc::now(),
            last_modified: Utc::now(),
            session_count: 4,
        };
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: GraphSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
