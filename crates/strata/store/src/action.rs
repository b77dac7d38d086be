use bytes::Bytes;
use serde_json::Value;
use strata_graph::{
    EdgeKey, ErrorGraph, FileKey, Graph, MergeMode, NodeId, PendingUpload, PrincipalKind, Props,
    RightFlags,
};

/// Every state change the store accepts. Each action names the graph it
/// applies to and carries just enough to replay the change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Merge `graph` into the named graph with right priority.
    Merge {
        graph_name: String,
        graph: Graph,
        mode: MergeMode,
    },
    /// Record elements the remote rejected.
    MergeError {
        graph_name: String,
        errors: ErrorGraph,
    },
    /// Drop the graph's data, vars, blobs and uploads, then record
    /// `errors` as its error graph. With `keep_errors` the previous errors
    /// are kept and `errors` is merged over them. Never applies to `main`.
    Clear {
        graph_name: String,
        keep_errors: bool,
        errors: ErrorGraph,
    },
    /// Set (`Some`) or remove (`None`) a variable.
    SetVar {
        graph_name: String,
        name: String,
        value: Option<Value>,
    },
    SetNode {
        graph_name: String,
        node_id: NodeId,
        node: Props,
    },
    /// Write the target node and mark the edge (or write its metadata).
    AddEdge {
        graph_name: String,
        edge: EdgeKey,
        node: Props,
        metadata: Option<Props>,
    },
    /// Tombstone the edge and its target node.
    RemoveEdge { graph_name: String, edge: EdgeKey },
    /// Mark the edge (or write its metadata) without touching the target.
    AssocEdge {
        graph_name: String,
        edge: EdgeKey,
        metadata: Option<Props>,
    },
    /// Tombstone the edge only.
    DissocEdge { graph_name: String, edge: EdgeKey },
    SetRights {
        graph_name: String,
        node_id: NodeId,
        kind: PrincipalKind,
        principal: String,
        rights: RightFlags,
    },
    /// Inherit rights from `from`, or tombstone the inheritance with `None`.
    InheritRights {
        graph_name: String,
        node_id: NodeId,
        from: Option<NodeId>,
    },
    /// Attach a file awaiting upload.
    SetFile {
        graph_name: String,
        file: FileKey,
        upload: PendingUpload,
        blob: Bytes,
    },
    RemoveFile { graph_name: String, file: FileKey },
    UploadProgress {
        graph_name: String,
        file: FileKey,
        progress: f64,
    },
    UploadComplete { graph_name: String, file: FileKey },
    UploadError {
        graph_name: String,
        file: FileKey,
        message: String,
    },
}

impl Action {
    pub fn graph_name(&self) -> &str {
        match self {
            Self::Merge { graph_name, .. }
            | Self::MergeError { graph_name, .. }
            | Self::Clear { graph_name, .. }
            | Self::SetVar { graph_name, .. }
            | Self::SetNode { graph_name, .. }
            | Self::AddEdge { graph_name, .. }
            | Self::RemoveEdge { graph_name, .. }
            | Self::AssocEdge { graph_name, .. }
            | Self::DissocEdge { graph_name, .. }
            | Self::SetRights { graph_name, .. }
            | Self::InheritRights { graph_name, .. }
            | Self::SetFile { graph_name, .. }
            | Self::RemoveFile { graph_name, .. }
            | Self::UploadProgress { graph_name, .. }
            | Self::UploadComplete { graph_name, .. }
            | Self::UploadError { graph_name, .. } => graph_name,
        }
    }

    /// Stable action name for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Merge { .. } => "merge",
            Self::MergeError { .. } => "merge_error",
            Self::Clear { .. } => "clear",
            Self::SetVar { .. } => "set_var",
            Self::SetNode { .. } => "set_node",
            Self::AddEdge { .. } => "add_edge",
            Self::RemoveEdge { .. } => "remove_edge",
            Self::AssocEdge { .. } => "assoc_edge",
            Self::DissocEdge { .. } => "dissoc_edge",
            Self::SetRights { .. } => "set_rights",
            Self::InheritRights { .. } => "inherit_rights",
            Self::SetFile { .. } => "set_file",
            Self::RemoveFile { .. } => "remove_file",
            Self::UploadProgress { .. } => "upload_progress",
            Self::UploadComplete { .. } => "upload_complete",
            Self::UploadError { .. } => "upload_error",
        }
    }

    /// Whether the action edits graph content locally rather than merging
    /// remote results.
    pub fn is_local_write(&self) -> bool {
        matches!(
            self,
            Self::SetNode { .. }
                | Self::AddEdge { .. }
                | Self::RemoveEdge { .. }
                | Self::AssocEdge { .. }
                | Self::DissocEdge { .. }
                | Self::SetRights { .. }
                | Self::InheritRights { .. }
                | Self::SetFile { .. }
                | Self::RemoveFile { .. }
        )
    }
}
