//! The reducer: the only code that mutates [`State`].
//!
//! Each action is validated in full before anything is written, so a
//! rejected action leaves the state untouched.

use strata_graph::{
    merge_graphs, EdgeKey, ErrorGraph, FileEntry, Graph, Priority, Props, Right, RightKey, Slot,
};
use tracing::debug;

use crate::action::Action;
use crate::error::{Result, StoreError};
use crate::state::{State, UploadState, UploadStatus, MAIN};

/// Apply `action` to `state`.
pub fn reduce(state: &mut State, action: Action) -> Result<()> {
    validate(&action)?;
    debug!(action = action.kind(), graph = action.graph_name(), "reduce");

    match action {
        Action::Merge {
            graph_name,
            graph,
            mode,
        } => {
            let target = &mut state.graph_state_mut(&graph_name).graph;
            *target = merge_graphs(target, &graph, mode, Priority::Right);
        }
        Action::MergeError { graph_name, errors } => {
            state.graph_state_mut(&graph_name).errors.merge(errors);
        }
        Action::Clear {
            graph_name,
            keep_errors,
            errors,
        } => {
            let removed = state.remove(&graph_name);
            let mut kept = match removed {
                Some(previous) if keep_errors => previous.errors,
                _ => ErrorGraph::new(),
            };
            kept.merge(errors);
            if !kept.is_empty() {
                state.graph_state_mut(&graph_name).errors = kept;
            }
        }
        Action::SetVar {
            graph_name,
            name,
            value,
        } => {
            let vars = &mut state.graph_state_mut(&graph_name).vars;
            match value {
                Some(value) => {
                    vars.insert(name, value);
                }
                None => {
                    vars.remove(&name);
                }
            }
        }
        Action::SetNode {
            graph_name,
            node_id,
            node,
        } => {
            write_node(&mut state.graph_state_mut(&graph_name).graph, node_id, node);
        }
        Action::AddEdge {
            graph_name,
            edge,
            node,
            metadata,
        } => {
            let graph = &mut state.graph_state_mut(&graph_name).graph;
            write_node(graph, edge.to_id.clone(), node);
            graph.set_edge(edge, edge_value(metadata));
        }
        Action::RemoveEdge { graph_name, edge } => {
            let graph = &mut state.graph_state_mut(&graph_name).graph;
            graph.set_node(edge.to_id.clone(), Slot::Tombstone);
            graph.set_edge(edge, Slot::Tombstone);
        }
        Action::AssocEdge {
            graph_name,
            edge,
            metadata,
        } => {
            state
                .graph_state_mut(&graph_name)
                .graph
                .set_edge(edge, edge_value(metadata));
        }
        Action::DissocEdge { graph_name, edge } => {
            state
                .graph_state_mut(&graph_name)
                .graph
                .set_edge(edge, Slot::Tombstone);
        }
        Action::SetRights {
            graph_name,
            node_id,
            kind,
            principal,
            rights,
        } => {
            let graph = &mut state.graph_state_mut(&graph_name).graph;
            for right in Right::ALL {
                if let Some(value) = rights.get(right) {
                    let key = RightKey {
                        node_id: node_id.clone(),
                        kind,
                        principal: principal.clone(),
                        right,
                    };
                    graph.set_right(key, Slot::from_bool(value));
                }
            }
        }
        Action::InheritRights {
            graph_name,
            node_id,
            from,
        } => {
            let from = from.map(Slot::Data).unwrap_or(Slot::Tombstone);
            state
                .graph_state_mut(&graph_name)
                .graph
                .set_inherit(node_id, from);
        }
        Action::SetFile {
            graph_name,
            file,
            upload,
            blob,
        } => {
            let gs = state.graph_state_mut(&graph_name);
            gs.graph
                .set_file(file.clone(), Slot::Data(FileEntry::Upload(upload)));
            gs.uploads.remove(&file);
            gs.blobs.insert(file, blob);
        }
        Action::RemoveFile { graph_name, file } => {
            let gs = state.graph_state_mut(&graph_name);
            gs.graph.set_file(file.clone(), Slot::Tombstone);
            gs.blobs.remove(&file);
            gs.uploads.remove(&file);
        }
        Action::UploadProgress {
            graph_name,
            file,
            progress,
        } => {
            state.graph_state_mut(&graph_name).uploads.insert(
                file,
                UploadState {
                    progress,
                    status: UploadStatus::InProgress,
                },
            );
        }
        Action::UploadComplete { graph_name, file } => {
            let gs = state.graph_state_mut(&graph_name);
            gs.blobs.remove(&file);
            gs.uploads.insert(
                file,
                UploadState {
                    progress: 1.0,
                    status: UploadStatus::Complete,
                },
            );
        }
        Action::UploadError {
            graph_name,
            file,
            message,
        } => {
            let upload = state
                .graph_state_mut(&graph_name)
                .uploads
                .entry(file)
                .or_insert(UploadState {
                    progress: 0.0,
                    status: UploadStatus::InProgress,
                });
            upload.status = UploadStatus::Failed(message);
        }
    }
    Ok(())
}

fn validate(action: &Action) -> Result<()> {
    let kind = action.kind();
    let graph_name = action.graph_name();
    if graph_name.is_empty() {
        return Err(StoreError::rejected(kind, "empty graph name"));
    }
    let clears = matches!(action, Action::Clear { .. });
    if graph_name == MAIN && (action.is_local_write() || clears) {
        return Err(StoreError::ReadOnlyGraph(MAIN.to_string()));
    }

    match action {
        Action::SetNode { node_id, .. } if node_id.is_empty() => {
            Err(StoreError::rejected(kind, "empty node id"))
        }
        Action::AddEdge { edge, .. }
        | Action::RemoveEdge { edge, .. }
        | Action::AssocEdge { edge, .. }
        | Action::DissocEdge { edge, .. } => check_edge(kind, edge),
        Action::SetRights {
            node_id,
            principal,
            rights,
            ..
        } => {
            if node_id.is_empty() || principal.is_empty() {
                Err(StoreError::rejected(kind, "empty node id or principal"))
            } else if rights.is_empty() {
                Err(StoreError::rejected(kind, "no rights given"))
            } else {
                Ok(())
            }
        }
        Action::SetFile { upload, blob, .. } if upload.file_size != blob.len() as u64 => {
            Err(StoreError::rejected(
                kind,
                format!(
                    "declared size {} does not match blob size {}",
                    upload.file_size,
                    blob.len()
                ),
            ))
        }
        Action::UploadProgress { progress, .. } if !(0.0..=1.0).contains(progress) => {
            Err(StoreError::rejected(kind, format!("progress {progress} out of range")))
        }
        _ => Ok(()),
    }
}

fn check_edge(kind: &'static str, edge: &EdgeKey) -> Result<()> {
    let parts = [&edge.from_type, &edge.from_id, &edge.to_type, &edge.to_id];
    if parts.iter().any(|p| p.is_empty()) {
        return Err(StoreError::rejected(kind, format!("incomplete edge {edge}")));
    }
    Ok(())
}

/// Key-wise merge into a live node; anything else is replaced.
fn write_node(graph: &mut Graph, node_id: String, node: Props) {
    let merged = match graph.node(&node_id) {
        Some(Slot::Data(existing)) => {
            let mut merged = existing.clone();
            merged.extend(node);
            merged
        }
        _ => node,
    };
    graph.set_node(node_id, Slot::Data(merged));
}

fn edge_value(metadata: Option<Props>) -> Slot<Props> {
    metadata.map(Slot::Data).unwrap_or(Slot::Marker)
}
