//! Typed traversal over every addressable leaf of a graph.
//!
//! [`Graph::walk`] drives a [`GraphVisitor`] (one method per region),
//! [`reduce`] and [`pick_map`] are folds over the same leaf sequence, and
//! [`zip_with`] walks two graphs in lockstep for the merge operators. All
//! of them see exactly the leaves reported by [`Graph::leaves`], so path
//! semantics are identical everywhere.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{Graph, Leaf, LeafRef};
use crate::path::GraphPath;
use crate::slot::{Flag, Slot, SlotData};
use crate::types::{EdgeKey, FileEntry, FileKey, NodeId, Props, ReverseEdgeKey, RightKey};

/// Per-region callbacks. Every method defaults to a no-op.
pub trait GraphVisitor {
    fn visit_node(&mut self, _id: &NodeId, _node: &Slot<Props>) {}
    fn visit_edge(&mut self, _key: &EdgeKey, _edge: &Slot<Props>) {}
    fn visit_right(&mut self, _key: &RightKey, _flag: &Flag) {}
    fn visit_inherit(&mut self, _node_id: &NodeId, _from: &Slot<NodeId>) {}
    fn visit_file(&mut self, _key: &FileKey, _file: &Slot<FileEntry>) {}
    fn visit_reverse_edge(&mut self, _key: &ReverseEdgeKey, _edge: &Slot<Props>) {}
}

impl Graph {
    /// Visit every leaf once, including the reverse index.
    pub fn walk<V: GraphVisitor + ?Sized>(&self, visitor: &mut V) {
        for (id, node) in &self.nodes {
            visitor.visit_node(id, node);
        }
        for (key, edge) in &self.edges {
            visitor.visit_edge(key, edge);
        }
        for (key, flag) in &self.rights {
            visitor.visit_right(key, flag);
        }
        for (id, from) in &self.inherit {
            visitor.visit_inherit(id, from);
        }
        for (key, file) in &self.files {
            visitor.visit_file(key, file);
        }
        for (key, edge) in &self.reverse_edges {
            visitor.visit_reverse_edge(key, edge);
        }
    }

    /// Leaves at or below a string path prefix, as a new graph.
    pub fn pick<S: AsRef<str>>(&self, prefix: &[S]) -> Graph {
        pick_map(self, |path, leaf| {
            path.starts_with(prefix).then(|| leaf.into_leaf())
        })
    }
}

/// Fold over every leaf in path order.
pub fn reduce<A>(graph: &Graph, init: A, mut f: impl FnMut(A, &GraphPath, LeafRef<'_>) -> A) -> A {
    graph
        .leaves()
        .fold(init, |acc, (path, leaf)| f(acc, &path, leaf))
}

/// Build a new graph from the leaves `f` keeps (or rewrites).
pub fn pick_map(graph: &Graph, mut f: impl FnMut(&GraphPath, LeafRef<'_>) -> Option<Leaf>) -> Graph {
    let mut out = Graph::new();
    for (path, leaf) in graph.leaves() {
        if let Some(kept) = f(&path, leaf) {
            insert_leaf(&mut out, path, kept);
        }
    }
    out
}

/// Insert without region checks; callers pair paths with matching leaves.
pub(crate) fn insert_leaf(graph: &mut Graph, path: GraphPath, leaf: Leaf) {
    match (path, leaf) {
        (GraphPath::Node(id), Leaf::Node(s)) => {
            graph.nodes.insert(id, s);
        }
        (GraphPath::Edge(k), Leaf::Edge(s)) => graph.set_edge(k, s),
        (GraphPath::Right(k), Leaf::Right(s)) => {
            graph.rights.insert(k, s);
        }
        (GraphPath::Inherit(id), Leaf::Inherit(s)) => {
            graph.inherit.insert(id, s);
        }
        (GraphPath::File(k), Leaf::File(s)) => {
            graph.files.insert(k, s);
        }
        _ => {}
    }
}

/// Decides the combined value of one leaf present in either input.
pub trait LeafMerge {
    fn merge<T: SlotData>(&self, left: Option<&Slot<T>>, right: Option<&Slot<T>>) -> Option<Slot<T>>;
}

/// Walk two graphs in lockstep, leaf by leaf, combining with `rule`.
/// The reverse index of the result is regenerated from its edges.
pub fn zip_with<R: LeafMerge>(left: &Graph, right: &Graph, rule: &R) -> Graph {
    let mut out = Graph {
        nodes: zip_map(&left.nodes, &right.nodes, rule),
        edges: zip_map(&left.edges, &right.edges, rule),
        rights: zip_map(&left.rights, &right.rights, rule),
        inherit: zip_map(&left.inherit, &right.inherit, rule),
        files: zip_map(&left.files, &right.files, rule),
        reverse_edges: BTreeMap::new(),
    };
    out.rebuild_index();
    out
}

fn zip_map<K, T, R>(
    left: &BTreeMap<K, Slot<T>>,
    right: &BTreeMap<K, Slot<T>>,
    rule: &R,
) -> BTreeMap<K, Slot<T>>
where
    K: Ord + Clone,
    T: SlotData,
    R: LeafMerge,
{
    let keys: BTreeSet<&K> = left.keys().chain(right.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            rule.merge(left.get(key), right.get(key))
                .map(|value| (key.clone(), value))
        })
        .collect()
}
