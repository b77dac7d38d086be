//! Error types for the view engine.

use thiserror::Error;

/// Errors raised while decoding or resolving a view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A view must be a JSON object keyed by root node id.
    #[error("view must be an object, got {0}")]
    NotAnObject(&'static str),

    /// Edge-view keys are `fromType/toType` with both halves non-empty.
    #[error("malformed edge type key: {0:?}")]
    MalformedEdgeType(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("graph error: {0}")]
    Graph(#[from] strata_graph::GraphError),
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
