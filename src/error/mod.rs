use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Graph store errors
///
/// Every variant is a reference error: an operation named a node id that is
/// not present in the graph. These are reported to the caller; the store
/// never panics on them.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Parent node {node_id} not found")]
    ParentNotFound { node_id: String },

    #[error("Node(s) not found: {missing}")]
    EndpointsNotFound { missing: String },

    #[error("Node {node_id} not found")]
    NodeNotFound { node_id: String },
}

/// Persistence log errors
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to create storage directory {path}: {message}")]
    CreateDir { path: String, message: String },

    #[error("Append to {path} failed: {message}")]
    Append { path: String, message: String },

    #[error("Snapshot write to {path} failed: {message}")]
    Snapshot { path: String, message: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for graph store operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for journal operations
pub type JournalResult<T> = Result<T, JournalError>;
