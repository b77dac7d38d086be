//! Error types for the graph layer.

use thiserror::Error;

/// Errors raised while addressing or decoding a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The path does not address any leaf of a well-formed graph.
    #[error("invalid graph path: {0}")]
    InvalidPath(String),

    /// A leaf of the wrong kind was written at a path.
    #[error("leaf kind mismatch at {path}: expected {expected}")]
    LeafMismatch { path: String, expected: &'static str },

    /// The reverse-edge index is derived and cannot be written directly.
    #[error("derived path is read-only: {0}")]
    DerivedPath(String),

    /// Wire form could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_display() {
        let e = GraphError::InvalidPath("nodes".into());
        assert!(e.to_string().contains("invalid graph path"));
    }

    #[test]
    fn mismatch_display() {
        let e = GraphError::LeafMismatch {
            path: "nodes/n1".into(),
            expected: "node",
        };
        assert!(e.to_string().contains("expected node"));
    }
}
