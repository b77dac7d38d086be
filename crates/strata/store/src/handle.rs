//! A store bound to one stack.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use strata_graph::{
    EdgeKey, ErrorGraph, FileEntry, FileKey, Graph, NodeId, NodeRights, PendingUpload,
    PrincipalKind, Props, RightFlags, Slot,
};
use strata_view::{view_tree, View, ViewTree};

use crate::action::Action;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::reconcile::{self, PushReport};
use crate::remote::RemoteApi;
use crate::select::{
    select_edge_from_stack, select_files_from_stack, select_metadata_from_stack,
    select_node_from_stack, select_reverse_edge_from_stack, select_rights_from_stack,
    select_var_from_stack, StackReader,
};
use crate::stack::Stack;
use crate::state::UploadState;
use crate::store::Store;

/// Reads across a [`Stack`] and writes to its current overlay.
///
/// Writes through a handle whose current graph is `main` fail with
/// [`StoreError::ReadOnlyGraph`] before anything is dispatched.
pub struct GraphHandle<S, A: ?Sized> {
    store: Arc<S>,
    api: Arc<A>,
    stack: Stack,
    config: StoreConfig,
}

impl<S, A: ?Sized> Clone for GraphHandle<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            api: Arc::clone(&self.api),
            stack: self.stack.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, A> GraphHandle<S, A>
where
    S: Store,
    A: RemoteApi + ?Sized,
{
    pub fn new(store: Arc<S>, api: Arc<A>, stack: Stack, config: StoreConfig) -> Self {
        Self {
            store,
            api,
            stack,
            config,
        }
    }

    /// The same store with `overlay` pushed on top of this handle's stack.
    pub fn with_overlay(&self, overlay: impl Into<String>) -> Result<Self> {
        Ok(Self {
            stack: self.stack.with_overlay(overlay)?,
            ..self.clone()
        })
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Name of the graph writes go to.
    pub fn graph_name(&self) -> &str {
        self.stack.current()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // -- reads --

    /// The node's properties, if it is live with data anywhere in the stack.
    pub fn node(&self, node_id: &str) -> Option<Props> {
        self.store
            .select(|state| select_node_from_stack(node_id, &self.stack, state))
            .and_then(Slot::into_data)
    }

    /// Live edges `from_type/from_id -> to_type/*`, keyed by target id.
    pub fn edges(&self, from_type: &str, from_id: &str, to_type: &str) -> BTreeMap<NodeId, Slot<Props>> {
        let mut edges = self.store.select(|state| {
            select_edge_from_stack(from_type, from_id, to_type, &self.stack, state)
        });
        edges.retain(|_, edge| edge.is_live());
        edges
    }

    /// Live edges `from_type/* -> to_type/to_id`, keyed by source id.
    pub fn reverse_edges(&self, to_type: &str, to_id: &str, from_type: &str) -> BTreeMap<NodeId, Slot<Props>> {
        let mut edges = self.store.select(|state| {
            select_reverse_edge_from_stack(to_type, to_id, from_type, &self.stack, state)
        });
        edges.retain(|_, edge| edge.is_live());
        edges
    }

    pub fn metadata(&self, edge: &EdgeKey) -> Option<Props> {
        self.store
            .select(|state| select_metadata_from_stack(edge, &self.stack, state))
            .and_then(Slot::into_data)
    }

    pub fn rights(&self, node_id: &str) -> NodeRights {
        self.store
            .select(|state| select_rights_from_stack(node_id, &self.stack, state))
    }

    pub fn files(&self, node_id: &str) -> BTreeMap<String, FileEntry> {
        self.store
            .select(|state| select_files_from_stack(node_id, &self.stack, state))
    }

    pub fn var(&self, name: &str) -> Option<Value> {
        self.store
            .select(|state| select_var_from_stack(name, &self.stack, state))
    }

    /// Elements of the current graph the remote rejected on the last push.
    pub fn errors(&self) -> ErrorGraph {
        self.store.select(|state| {
            state
                .errors(self.graph_name())
                .cloned()
                .unwrap_or_default()
        })
    }

    pub fn upload(&self, file: &FileKey) -> Option<UploadState> {
        self.store.select(|state| {
            state
                .graph_state(self.graph_name())
                .and_then(|gs| gs.uploads.get(file).cloned())
        })
    }

    /// The result tree of `view` over the whole stack.
    pub fn view(&self, view: &View) -> Result<ViewTree> {
        view.validate()?;
        let tree = self.store.select(|state| {
            let reader = StackReader::new(&self.stack, state);
            view_tree(view, &reader, &reader)
        })?;
        Ok(tree)
    }

    // -- writes --

    fn write(&self, action: Action) -> Result<()> {
        if self.stack.is_main() {
            return Err(StoreError::ReadOnlyGraph(self.graph_name().to_string()));
        }
        self.store.dispatch(action);
        Ok(())
    }

    pub fn set_node(&self, node_id: impl Into<NodeId>, node: Props) -> Result<()> {
        self.write(Action::SetNode {
            graph_name: self.graph_name().to_string(),
            node_id: node_id.into(),
            node,
        })
    }

    pub fn add_edge(&self, edge: EdgeKey, node: Props, metadata: Option<Props>) -> Result<()> {
        self.write(Action::AddEdge {
            graph_name: self.graph_name().to_string(),
            edge,
            node,
            metadata,
        })
    }

    pub fn remove_edge(&self, edge: EdgeKey) -> Result<()> {
        self.write(Action::RemoveEdge {
            graph_name: self.graph_name().to_string(),
            edge,
        })
    }

    pub fn assoc_edge(&self, edge: EdgeKey, metadata: Option<Props>) -> Result<()> {
        self.write(Action::AssocEdge {
            graph_name: self.graph_name().to_string(),
            edge,
            metadata,
        })
    }

    pub fn dissoc_edge(&self, edge: EdgeKey) -> Result<()> {
        self.write(Action::DissocEdge {
            graph_name: self.graph_name().to_string(),
            edge,
        })
    }

    pub fn set_rights(
        &self,
        node_id: impl Into<NodeId>,
        kind: PrincipalKind,
        principal: impl Into<String>,
        rights: RightFlags,
    ) -> Result<()> {
        self.write(Action::SetRights {
            graph_name: self.graph_name().to_string(),
            node_id: node_id.into(),
            kind,
            principal: principal.into(),
            rights,
        })
    }

    pub fn inherit_rights(&self, node_id: impl Into<NodeId>, from: Option<NodeId>) -> Result<()> {
        self.write(Action::InheritRights {
            graph_name: self.graph_name().to_string(),
            node_id: node_id.into(),
            from,
        })
    }

    pub fn set_file(&self, file: FileKey, upload: PendingUpload, blob: Bytes) -> Result<()> {
        self.write(Action::SetFile {
            graph_name: self.graph_name().to_string(),
            file,
            upload,
            blob,
        })
    }

    pub fn remove_file(&self, file: FileKey) -> Result<()> {
        self.write(Action::RemoveFile {
            graph_name: self.graph_name().to_string(),
            file,
        })
    }

    /// Set (`Some`) or remove (`None`) a variable on the current graph.
    /// Variables are not graph content, so this works on `main` too.
    pub fn set_var(&self, name: impl Into<String>, value: Option<Value>) {
        self.store.dispatch(Action::SetVar {
            graph_name: self.graph_name().to_string(),
            name: name.into(),
            value,
        });
    }

    /// Drop the current graph's contents. `main` only changes through
    /// push and pull, so clearing it is rejected.
    pub fn clear(&self) -> Result<()> {
        if self.stack.is_main() {
            return Err(StoreError::ReadOnlyGraph(self.graph_name().to_string()));
        }
        self.store.dispatch(Action::Clear {
            graph_name: self.graph_name().to_string(),
            keep_errors: self.config.sync.keep_errors_on_clear,
            errors: ErrorGraph::new(),
        });
        Ok(())
    }

    // -- sync --

    pub async fn push(&self) -> Result<PushReport> {
        reconcile::push(
            self.store.as_ref(),
            self.api.as_ref(),
            self.graph_name(),
            &self.config.sync,
        )
        .await
    }

    pub async fn pull(&self, view: &View) -> Result<Graph> {
        reconcile::pull(self.store.as_ref(), self.api.as_ref(), view).await
    }
}
