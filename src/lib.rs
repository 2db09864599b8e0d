//! # MCP Debug Graph
//!
//! A graph knowledge store for debugging sessions, designed to sit behind a
//! Model Context Protocol (MCP) or similar tool-calling front end. It records
//! problems, hypotheses, experiments, observations, learnings and solutions as
//! a typed graph and answers "have I seen something like this before?" queries
//! by ranking past problems against a new query string.
//!
//! ## Features
//!
//! - **Typed Graph Model**: Six node types and eight edge types covering the
//!   structure of a debugging session
//! - **Automatic Relationships**: Parent/child node pairs infer their edge
//!   type from a fixed lookup table
//! - **Multi-Signal Similarity**: Six weighted string signals (error type,
//!   common substring, edit distance, key phrases, word overlap, identifiers)
//! - **Maintained Indexes**: Error-type buckets, type sets, adjacency lists
//!   and parent pointers keep similarity search sub-linear
//! - **Debug Path Reconstruction**: Walks parent pointers from a solution
//!   back to its problem, with a cycle guard
//! - **Append-Only Persistence**: Per-entity JSONL logs plus a snapshot file;
//!   replay-with-deduplication reproduces the exact in-memory state
//!
//! ## Architecture
//!
//! ```text
//! Tool Front End → GraphService → GraphStore + GraphIndexes
//!                        ↓
//!                  Journal (JSONL logs + snapshot)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mcp_debug_graph::{Config, GraphService};
//! use mcp_debug_graph::graph::NodeType;
//! use mcp_debug_graph::service::CreateParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let mut service = GraphService::open(&config).await?;
//!     let created = service
//!         .create(CreateParams {
//!             node_type: NodeType::Problem,
//!             content: "TypeError: Cannot read property 'id' of undefined".into(),
//!             parent_id: None,
//!             metadata: Default::default(),
//!         })
//!         .await?;
//!     println!("recorded problem {}", created.node_id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management for the knowledge store.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Graph data model and store (nodes, edges, invariants).
pub mod graph;
/// Derived indexes kept consistent with every graph mutation.
pub mod index;
/// Append-only persistence log and snapshot handling.
pub mod journal;
/// Tracing initialization for embedding front ends.
pub mod logging;
/// Query engine: similarity search, recent activity, debug paths.
pub mod query;
/// The in-process service consumed by the tool-calling front end.
pub mod service;
/// Multi-signal text similarity engine and error-type classifier.
pub mod similarity;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use service::GraphService;
