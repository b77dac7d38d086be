//! Stack selectors.
//!
//! Every selector reads the same address from each layer of a [`Stack`] and
//! folds the layers top-down with a left-priority merge, so upper layers win.
//! Layers missing from the [`State`] read as empty graphs.

use std::collections::BTreeMap;

use serde_json::Value;
use strata_graph::{
    merge_graphs_left, EdgeKey, FileEntry, Graph, NodeId, NodeRights, Props, Slot,
};
use strata_view::{EdgeSource, EdgeTypes, NodeSource};

use crate::stack::Stack;
use crate::state::State;

/// Fold one projection of every layer, top layer first, with `merge_left`.
pub fn fold_stack<P, M>(stack: &Stack, state: &State, mut project: P, merge_left: M) -> Graph
where
    P: FnMut(&Graph) -> Graph,
    M: Fn(&Graph, &Graph) -> Graph,
{
    stack
        .names()
        .iter()
        .rev()
        .filter_map(|name| state.graph(name))
        .fold(Graph::new(), |upper, layer| merge_left(&upper, &project(layer)))
}

/// The leaves at or below `path` across the stack, merged with `merge_left`.
pub fn select_path_from_stack<S, M>(path: &[S], stack: &Stack, merge_left: M, state: &State) -> Graph
where
    S: AsRef<str>,
    M: Fn(&Graph, &Graph) -> Graph,
{
    fold_stack(stack, state, |layer| layer.pick(path), merge_left)
}

pub fn select_node_from_stack(node_id: &str, stack: &Stack, state: &State) -> Option<Slot<Props>> {
    let merged = fold_stack(
        stack,
        state,
        |layer| {
            let mut out = Graph::new();
            if let Some(node) = layer.node(node_id) {
                out.set_node(node_id, node.clone());
            }
            out
        },
        merge_graphs_left,
    );
    merged.node(node_id).cloned()
}

/// Edges `from_type/from_id -> to_type/*` across the stack, keyed by
/// target id. Tombstoned edges are included.
pub fn select_edge_from_stack(
    from_type: &str,
    from_id: &str,
    to_type: &str,
    stack: &Stack,
    state: &State,
) -> BTreeMap<NodeId, Slot<Props>> {
    let merged = fold_stack(
        stack,
        state,
        |layer| {
            let mut out = Graph::new();
            for (to_id, edge) in layer.edges_from(from_type, from_id, to_type) {
                out.set_edge(EdgeKey::new(from_type, from_id, to_type, to_id.clone()), edge.clone());
            }
            out
        },
        merge_graphs_left,
    );
    merged
        .edges_from(from_type, from_id, to_type)
        .map(|(id, edge)| (id.clone(), edge.clone()))
        .collect()
}

/// Edges `from_type/* -> to_type/to_id` across the stack, keyed by source
/// id.
pub fn select_reverse_edge_from_stack(
    to_type: &str,
    to_id: &str,
    from_type: &str,
    stack: &Stack,
    state: &State,
) -> BTreeMap<NodeId, Slot<Props>> {
    let merged = fold_stack(
        stack,
        state,
        |layer| {
            let mut out = Graph::new();
            for (from_id, edge) in layer.reverse_edges_of(to_type, to_id, from_type) {
                out.set_edge(EdgeKey::new(from_type, from_id.clone(), to_type, to_id), edge.clone());
            }
            out
        },
        merge_graphs_left,
    );
    merged
        .reverse_edges_of(to_type, to_id, from_type)
        .map(|(id, edge)| (id.clone(), edge.clone()))
        .collect()
}

/// Value of one edge across the stack.
pub fn select_metadata_from_stack(edge: &EdgeKey, stack: &Stack, state: &State) -> Option<Slot<Props>> {
    let merged = fold_stack(
        stack,
        state,
        |layer| {
            let mut out = Graph::new();
            if let Some(value) = layer.edge(edge) {
                out.set_edge(edge.clone(), value.clone());
            }
            out
        },
        merge_graphs_left,
    );
    merged.edge(edge).cloned()
}

pub fn select_rights_from_stack(node_id: &str, stack: &Stack, state: &State) -> NodeRights {
    let merged = fold_stack(
        stack,
        state,
        |layer| {
            let mut out = Graph::new();
            for (key, flag) in layer.rights_of(node_id) {
                out.set_right(key.clone(), flag.clone());
            }
            if let Some(from) = layer.inherit(node_id) {
                out.set_inherit(node_id, from.clone());
            }
            out
        },
        merge_graphs_left,
    );
    merged.node_rights(node_id)
}

/// Live file entries of a node across the stack, keyed by property.
pub fn select_files_from_stack(node_id: &str, stack: &Stack, state: &State) -> BTreeMap<String, FileEntry> {
    let merged = fold_stack(
        stack,
        state,
        |layer| {
            let mut out = Graph::new();
            for (key, file) in layer.files_of(node_id) {
                out.set_file(key.clone(), file.clone());
            }
            out
        },
        merge_graphs_left,
    );
    merged
        .files_of(node_id)
        .filter_map(|(key, file)| Some((key.prop.clone(), file.data()?.clone())))
        .collect()
}

/// A variable from the topmost layer that defines it.
pub fn select_var_from_stack(name: &str, stack: &Stack, state: &State) -> Option<Value> {
    stack
        .names()
        .iter()
        .rev()
        .find_map(|graph| state.var(graph, name))
        .cloned()
}

/// A stack bound to a state snapshot, usable as the edge and node source of
/// the view engine.
#[derive(Debug, Clone, Copy)]
pub struct StackReader<'a> {
    pub stack: &'a Stack,
    pub state: &'a State,
}

impl<'a> StackReader<'a> {
    pub fn new(stack: &'a Stack, state: &'a State) -> Self {
        Self { stack, state }
    }
}

impl EdgeSource for StackReader<'_> {
    fn edge_to_ids(
        &self,
        edge_types: &EdgeTypes,
        from_id: &str,
        reverse: bool,
    ) -> BTreeMap<NodeId, Slot<Props>> {
        let EdgeTypes { from_type, to_type } = edge_types;
        if reverse {
            select_reverse_edge_from_stack(from_type, from_id, to_type, self.stack, self.state)
        } else {
            select_edge_from_stack(from_type, from_id, to_type, self.stack, self.state)
        }
    }
}

impl NodeSource for StackReader<'_> {
    fn node(&self, node_id: &str) -> Option<Slot<Props>> {
        select_node_from_stack(node_id, self.stack, self.state)
    }

    fn node_rights(&self, node_id: &str) -> NodeRights {
        select_rights_from_stack(node_id, self.stack, self.state)
    }

    fn node_files(&self, node_id: &str) -> BTreeMap<String, FileEntry> {
        select_files_from_stack(node_id, self.stack, self.state)
    }
}
