//! Filesystem journal: JSONL entity logs plus a JSON snapshot file.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{GraphSnapshot, Journal, JournalContents};
use crate::error::{JournalError, JournalResult};
use crate::graph::{Edge, Node};

const NODES_LOG: &str = "nodes.jsonl";
const EDGES_LOG: &str = "edges.jsonl";
const SNAPSHOT_FILE: &str = "graph.json";

/// Append-only journal rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileJournal {
    dir: PathBuf,
}

impl FileJournal {
    /// Open a journal at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> JournalResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| JournalError::CreateDir {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn append_line<T: Serialize + Sync>(&self, log: &str, record: &T) -> JournalResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let path = self.path(log);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| JournalError::Append {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| JournalError::Append {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Read one JSONL log, skipping malformed lines with a warning.
    async fn read_log<T: DeserializeOwned>(&self, log: &str) -> JournalResult<Vec<T>> {
        let path = self.path(log);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(JournalError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let mut records = Vec::new();
        for (number, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    log = %log,
                    line = number + 1,
                    error = %e,
                    "Skipping malformed journal line"
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl Journal for FileJournal {
    async fn append_node(&self, node: &Node) -> JournalResult<()> {
        self.append_line(NODES_LOG, node).await
    }

    async fn append_edge(&self, edge: &Edge) -> JournalResult<()> {
        self.append_line(EDGES_LOG, edge).await
    }

    async fn write_snapshot(&self, snapshot: &GraphSnapshot) -> JournalResult<()> {
        let path = self.path(SNAPSHOT_FILE);
        let body = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, body)
            .await
            .map_err(|e| JournalError::Snapshot {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    async fn load(&self) -> JournalResult<JournalContents> {
        let nodes = self.read_log(NODES_LOG).await?;
        let edges = self.read_log(EDGES_LOG).await?;

        let snapshot_path = self.path(SNAPSHOT_FILE);
        let snapshot = match fs::read_to_string(&snapshot_path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed graph snapshot");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(JournalError::Read {
                    path: snapshot_path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            snapshot = snapshot.is_some(),
            "Journal loaded"
        );
        Ok(JournalContents {
            nodes,
            edges,
            snapshot,
        })
    }
}
