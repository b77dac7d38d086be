//! Error types for the store and its collaborators.

use strata_graph::GraphError;
use strata_view::ViewError;
use thiserror::Error;

/// Failure reported by a [`RemoteApi`](crate::RemoteApi) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never completed (connection, timeout, cancellation).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered the whole request with a failure status.
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Errors raised by the store, its handles and the reconciler.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid stack: {0}")]
    InvalidStack(String),

    /// Local writes only target overlay graphs.
    #[error("graph {0:?} cannot be written locally")]
    ReadOnlyGraph(String),

    /// A push or pull call failed as a whole. Nothing was merged.
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    View(#[from] ViewError),

    /// The reducer refused an action; state is unchanged.
    #[error("{action} rejected: {reason}")]
    Rejected { action: &'static str, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn rejected(action: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            action,
            reason: reason.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
