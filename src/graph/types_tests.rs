use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::*;

#[test]
fn test_node_type_display_round_trip() {
    for node_type in NodeType::ALL {
        let parsed: NodeType = node_type.to_string().parse().unwrap();
        assert_eq!(parsed, node_type);
    }
    assert!("widget".parse::<NodeType>().is_err());
}

#[test]
fn test_edge_type_classification() {
    assert!(EdgeType::Decomposes.is_structural());
    assert!(EdgeType::Hypothesizes.is_structural());
    assert!(EdgeType::Tests.is_structural());
    assert!(EdgeType::Produces.is_structural());
    assert!(EdgeType::Learns.is_structural());

    assert!(EdgeType::Supports.is_evidentiary());
    assert!(EdgeType::Contradicts.is_evidentiary());
    assert!(EdgeType::Solves.is_evidentiary());
}

#[test]
fn test_edge_type_conflicting_pairs() {
    assert_eq!(EdgeType::Supports.conflicting(), Some(EdgeType::Contradicts));
    assert_eq!(EdgeType::Contradicts.conflicting(), Some(EdgeType::Supports));
    assert_eq!(EdgeType::Solves.conflicting(), None);
    assert_eq!(EdgeType::Tests.conflicting(), None);
}

#[test]
fn test_problem_defaults() {
    let node = Node::new(NodeType::Problem, "it broke", CreateMetadata::default());
    assert_eq!(
        node.kind,
        NodeKind::Problem {
            status: ProblemStatus::Open,
            is_root: false,
        }
    );
    assert!(!node.is_root());
    assert!(node.as_root().is_root());
}

#[test]
fn test_hypothesis_defaults() {
    let node = Node::new(NodeType::Hypothesis, "maybe the cache", CreateMetadata::default());
    assert_eq!(
        node.kind,
        NodeKind::Hypothesis {
            confidence: DEFAULT_HYPOTHESIS_CONFIDENCE,
            testable: true,
        }
    );

    let meta = CreateMetadata {
        confidence: Some(90),
        testable: Some(false),
        ..Default::default()
    };
    let node = Node::new(NodeType::Hypothesis, "maybe the cache", meta);
    assert_eq!(
        node.kind,
        NodeKind::Hypothesis {
            confidence: 90,
            testable: false,
        }
    );
}

#[test]
fn test_learning_default_confidence() {
    let node = Node::new(NodeType::Learning, "caches lie", CreateMetadata::default());
    assert_eq!(
        node.kind,
        NodeKind::Learning {
            confidence: DEFAULT_LEARNING_CONFIDENCE,
        }
    );
}

#[test]
fn test_solution_defaults_unverified() {
    let node = Node::new(NodeType::Solution, "flush it", CreateMetadata::default());
    assert_eq!(node.kind, NodeKind::Solution { verified: false });
}

#[test]
fn test_timestamps_equal_at_creation() {
    let node = Node::new(NodeType::Observation, "saw it", CreateMetadata::default());
    assert_eq!(node.metadata.created_at, node.metadata.updated_at);
}

#[test]
fn test_misplaced_fields_kept_in_extension_map() {
    let meta = CreateMetadata {
        confidence: Some(80),
        status: Some(ProblemStatus::Solved),
        ..Default::default()
    };
    let node = Node::new(NodeType::Experiment, "run it twice", meta);
    assert_eq!(node.metadata.extra.get("confidence"), Some(&json!(80)));
    assert_eq!(node.metadata.extra.get("status"), Some(&json!("solved")));
}

#[test]
fn test_node_serialization_shape() {
    let meta = CreateMetadata {
        tags: vec!["api".to_string()],
        ..Default::default()
    };
    let node = Node::new(NodeType::Problem, "API timeout", meta).as_root();
    let value = serde_json::to_value(&node).unwrap();

    assert_eq!(value["type"], json!("problem"));
    assert_eq!(value["status"], json!("open"));
    assert_eq!(value["isRoot"], json!(true));
    assert_eq!(value["content"], json!("API timeout"));
    assert_eq!(value["metadata"]["tags"], json!(["api"]));
    assert!(value["metadata"]["createdAt"].is_string());
}

#[test]
fn test_node_serde_round_trip() {
    let meta = CreateMetadata {
        tags: vec!["db".to_string(), "prod".to_string()],
        confidence: Some(65),
        extra: {
            let mut extra = serde_json::Map::new();
            extra.insert("ticket".to_string(), Value::from("OPS-1201"));
            extra
        },
        ..Default::default()
    };
    let node = Node::new(NodeType::Hypothesis, "connection pool exhausted", meta);

    let encoded = serde_json::to_string(&node).unwrap();
    let decoded: Node = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, node);
    assert_eq!(decoded.metadata.extra.get("ticket"), Some(&json!("OPS-1201")));
}

#[test]
fn test_edge_builders_and_round_trip() {
    let edge = Edge::new("a", "b", EdgeType::Supports)
        .with_strength(0.42)
        .with_reasoning("same stack trace")
        .with_evidence("log excerpt");

    assert_eq!(edge.strength, 0.42);
    assert_eq!(edge.metadata.reasoning.as_deref(), Some("same stack trace"));

    let encoded = serde_json::to_string(&edge).unwrap();
    let decoded: Edge = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, edge);

    let value = serde_json::to_value(&edge).unwrap();
    assert_eq!(value["type"], json!("supports"));
}

#[test]
fn test_edge_strength_clamped_by_builder() {
    assert_eq!(Edge::new("a", "b", EdgeType::Tests).with_strength(7.5).strength, 1.0);
    assert_eq!(Edge::new("a", "b", EdgeType::Tests).with_strength(-0.1).strength, 0.0);
}
