//! Integration tests for the append-only persistence protocol: idempotent
//! reload, last-write-wins replay, malformed-line tolerance, and snapshot
//! contents.

use anyhow::Result;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

use mcp_debug_graph::graph::{CreateMetadata, Edge, EdgeType, Node, NodeType, ProblemStatus};
use mcp_debug_graph::journal::{FileJournal, GraphSnapshot};
use mcp_debug_graph::service::{ConnectParams, CreateParams, GraphService};

async fn open_service(dir: &TempDir) -> Result<GraphService> {
    let journal = FileJournal::open(dir.path()).await?;
    Ok(GraphService::load(Box::new(journal)).await?)
}

async fn append_raw(dir: &TempDir, file: &str, line: &str) -> Result<()> {
    let mut handle = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.path().join(file))
        .await?;
    handle.write_all(line.as_bytes()).await?;
    handle.write_all(b"\n").await?;
    Ok(())
}

#[tokio::test]
async fn test_reload_reproduces_exact_state() -> Result<()> {
    let dir = TempDir::new()?;
    let mut service = open_service(&dir).await?;

    let p = service
        .create(CreateParams {
            node_type: NodeType::Problem,
            content: "TypeError: Cannot read property 'id' of undefined".to_string(),
            parent_id: None,
            metadata: CreateMetadata {
                tags: vec!["api".to_string(), "prod".to_string()],
                status: Some(ProblemStatus::Investigating),
                ..Default::default()
            },
        })
        .await?;
    let h = service
        .create(CreateParams {
            node_type: NodeType::Hypothesis,
            content: "response not awaited".to_string(),
            parent_id: Some(p.node_id.clone()),
            metadata: CreateMetadata {
                confidence: Some(85),
                ..Default::default()
            },
        })
        .await?;
    let s = service
        .create(CreateParams {
            node_type: NodeType::Solution,
            content: "await the fetch".to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        })
        .await?;
    service
        .connect(ConnectParams {
            from: s.node_id.clone(),
            to: p.node_id.clone(),
            edge_type: EdgeType::Solves,
            strength: Some(0.37),
            metadata: mcp_debug_graph::graph::ConnectAnnotations {
                reasoning: Some("fixed in staging".to_string()),
                evidence: None,
            },
        })
        .await?;

    let mut nodes: Vec<Node> = service.store().nodes().cloned().collect();
    let mut edges: Vec<Edge> = service.store().edges().cloned().collect();
    let roots = service.store().roots().to_vec();
    drop(service);

    let reloaded = open_service(&dir).await?;
    assert_eq!(reloaded.store().node_count(), 3);
    assert_eq!(reloaded.store().edge_count(), 2);
    assert_eq!(reloaded.store().roots(), &roots[..]);

    let mut reloaded_nodes: Vec<Node> = reloaded.store().nodes().cloned().collect();
    let mut reloaded_edges: Vec<Edge> = reloaded.store().edges().cloned().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    reloaded_nodes.sort_by(|a, b| a.id.cmp(&b.id));
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    reloaded_edges.sort_by(|a, b| a.id.cmp(&b.id));

    // Content, types, metadata and timestamps all survive the round trip.
    assert_eq!(reloaded_nodes, nodes);
    assert_eq!(reloaded_edges, edges);

    let hypothesis = reloaded.store().node(&h.node_id).unwrap();
    assert_eq!(hypothesis.node_type(), NodeType::Hypothesis);
    Ok(())
}

#[tokio::test]
async fn test_session_count_increments_per_load() -> Result<()> {
    let dir = TempDir::new()?;

    let service = open_service(&dir).await?;
    assert_eq!(service.summary().session_count, 1);
    drop(service);

    let service = open_service(&dir).await?;
    assert_eq!(service.summary().session_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_files_mean_empty_graph() -> Result<()> {
    let dir = TempDir::new()?;
    let service = open_service(&dir).await?;

    let summary = service.summary();
    assert_eq!(summary.node_count, 0);
    assert_eq!(summary.edge_count, 0);
    assert_eq!(summary.root_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_lines_are_skipped_not_fatal() -> Result<()> {
    let dir = TempDir::new()?;
    let mut service = open_service(&dir).await?;

    service
        .create(CreateParams {
            node_type: NodeType::Problem,
            content: "kept".to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        })
        .await?;
    drop(service);

    append_raw(&dir, "nodes.jsonl", "{ this is not json").await?;
    append_raw(&dir, "edges.jsonl", "nor is this").await?;

    let mut service = open_service(&dir).await?;
    assert_eq!(service.store().node_count(), 1);

    // The store stays fully usable after a partial load.
    let second = service
        .create(CreateParams {
            node_type: NodeType::Problem,
            content: "added after recovery".to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        })
        .await?;
    assert!(service.store().node(&second.node_id).is_some());
    Ok(())
}

#[tokio::test]
async fn test_last_record_per_id_wins_on_replay() -> Result<()> {
    let dir = TempDir::new()?;
    let mut service = open_service(&dir).await?;

    let created = service
        .create(CreateParams {
            node_type: NodeType::Problem,
            content: "original content".to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        })
        .await?;
    let mut corrected = service.store().node(&created.node_id).unwrap().clone();
    corrected.content = "corrected content".to_string();
    drop(service);

    append_raw(&dir, "nodes.jsonl", &serde_json::to_string(&corrected)?).await?;

    let service = open_service(&dir).await?;
    assert_eq!(service.store().node_count(), 1);
    assert_eq!(
        service.store().node(&created.node_id).unwrap().content,
        "corrected content"
    );
    Ok(())
}

#[tokio::test]
async fn test_snapshot_file_tracks_counters_and_roots() -> Result<()> {
    let dir = TempDir::new()?;
    let mut service = open_service(&dir).await?;

    let p = service
        .create(CreateParams {
            node_type: NodeType::Problem,
            content: "root problem".to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        })
        .await?;
    service
        .create(CreateParams {
            node_type: NodeType::Hypothesis,
            content: "a guess".to_string(),
            parent_id: Some(p.node_id.clone()),
            metadata: CreateMetadata::default(),
        })
        .await?;

    let raw = tokio::fs::read_to_string(dir.path().join("graph.json")).await?;
    let snapshot: GraphSnapshot = serde_json::from_str(&raw)?;
    assert_eq!(snapshot.node_count, 2);
    assert_eq!(snapshot.edge_count, 1);
    assert_eq!(snapshot.roots, vec![p.node_id]);
    assert_eq!(snapshot.session_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_auto_edge_survives_reload() -> Result<()> {
    let dir = TempDir::new()?;
    let mut service = open_service(&dir).await?;

    let p = service
        .create(CreateParams {
            node_type: NodeType::Problem,
            content: "outer".to_string(),
            parent_id: None,
            metadata: CreateMetadata::default(),
        })
        .await?;
    let h = service
        .create(CreateParams {
            node_type: NodeType::Hypothesis,
            content: "inner".to_string(),
            parent_id: Some(p.node_id.clone()),
            metadata: CreateMetadata::default(),
        })
        .await?;
    drop(service);

    let reloaded = open_service(&dir).await?;
    let edge = reloaded.store().edge(h.edge_id.as_deref().unwrap()).unwrap();
    assert_eq!(edge.edge_type, EdgeType::Hypothesizes);
    assert_eq!(edge.from, p.node_id);
    assert_eq!(edge.to, h.node_id);
    assert_eq!(edge.strength, 1.0);
    Ok(())
}
