use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::{GraphError, Result};
use crate::path::GraphPath;
use crate::slot::{Flag, Slot};
use crate::types::{
    EdgeKey, FileEntry, FileKey, NodeId, NodeRights, PrincipalKind, Props, ReverseEdgeKey, RightKey,
};

/// One layer of nodes, edges, rights and files.
///
/// Each region is a flat map keyed by the full typed address of its leaves.
/// The reverse-edge index mirrors `edges` and is patched by every edge
/// mutation, so it can never diverge from the forward map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<NodeId, Slot<Props>>,
    pub(crate) edges: BTreeMap<EdgeKey, Slot<Props>>,
    pub(crate) rights: BTreeMap<RightKey, Flag>,
    pub(crate) inherit: BTreeMap<NodeId, Slot<NodeId>>,
    pub(crate) files: BTreeMap<FileKey, Slot<FileEntry>>,
    pub(crate) reverse_edges: BTreeMap<ReverseEdgeKey, Slot<Props>>,
}

/// An owned leaf value, tagged by region.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Node(Slot<Props>),
    Edge(Slot<Props>),
    Right(Flag),
    Inherit(Slot<NodeId>),
    File(Slot<FileEntry>),
}

impl Leaf {
    /// An explicit deletion instruction for the leaf at `path`. `None` for
    /// the derived index.
    pub fn unset(path: &GraphPath) -> Option<Leaf> {
        match path {
            GraphPath::Node(_) => Some(Leaf::Node(Slot::Unset)),
            GraphPath::Edge(_) => Some(Leaf::Edge(Slot::Unset)),
            GraphPath::Right(_) => Some(Leaf::Right(Slot::Unset)),
            GraphPath::Inherit(_) => Some(Leaf::Inherit(Slot::Unset)),
            GraphPath::File(_) => Some(Leaf::File(Slot::Unset)),
            GraphPath::ReverseEdge(_) => None,
        }
    }
}

/// A borrowed leaf value, tagged by region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafRef<'a> {
    Node(&'a Slot<Props>),
    Edge(&'a Slot<Props>),
    Right(&'a Flag),
    Inherit(&'a Slot<NodeId>),
    File(&'a Slot<FileEntry>),
}

impl LeafRef<'_> {
    pub fn into_leaf(self) -> Leaf {
        match self {
            Self::Node(s) => Leaf::Node(s.clone()),
            Self::Edge(s) => Leaf::Edge(s.clone()),
            Self::Right(s) => Leaf::Right(s.clone()),
            Self::Inherit(s) => Leaf::Inherit(s.clone()),
            Self::File(s) => Leaf::File(s.clone()),
        }
    }

    /// Three-valued view of the leaf regardless of region.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Node(s) | Self::Edge(s) => s.as_bool(),
            Self::Right(s) => s.as_bool(),
            Self::Inherit(s) => s.as_bool(),
            Self::File(s) => s.as_bool(),
        }
    }

    /// Wire form of the leaf. Fails only if the payload cannot be encoded.
    pub fn to_value(self) -> Result<serde_json::Value> {
        let value = match self {
            Self::Node(s) | Self::Edge(s) => s.to_value(),
            Self::Right(s) => s.to_value(),
            Self::Inherit(s) => s.to_value(),
            Self::File(s) => s.to_value(),
        };
        Ok(value?)
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.edges.is_empty()
            && self.rights.is_empty()
            && self.inherit.is_empty()
            && self.files.is_empty()
    }

    /// Number of addressable leaves, excluding the derived index.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len() + self.rights.len() + self.inherit.len() + self.files.len()
    }

    // ── Nodes ───────────────────────────────────────────────────────

    pub fn node(&self, id: &str) -> Option<&Slot<Props>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Slot<Props>)> {
        self.nodes.iter()
    }

    pub fn set_node(&mut self, id: impl Into<NodeId>, node: Slot<Props>) {
        self.nodes.insert(id.into(), node);
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Slot<Props>> {
        self.nodes.remove(id)
    }

    // ── Edges ───────────────────────────────────────────────────────

    pub fn edge(&self, key: &EdgeKey) -> Option<&Slot<Props>> {
        self.edges.get(key)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Slot<Props>)> {
        self.edges.iter()
    }

    /// Write an edge and patch the reverse index in the same step.
    pub fn set_edge(&mut self, key: EdgeKey, edge: Slot<Props>) {
        self.reverse_edges.insert(key.reversed(), edge.clone());
        self.edges.insert(key, edge);
    }

    pub fn remove_edge(&mut self, key: &EdgeKey) -> Option<Slot<Props>> {
        self.reverse_edges.remove(&key.reversed());
        self.edges.remove(key)
    }

    /// All edges `from_type/from_id -> to_type/*`, keyed by target id.
    pub fn edges_from<'a>(
        &'a self,
        from_type: &'a str,
        from_id: &'a str,
        to_type: &'a str,
    ) -> impl Iterator<Item = (&'a NodeId, &'a Slot<Props>)> + 'a {
        let start = EdgeKey::new(from_type, from_id, to_type, "");
        self.edges
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(move |(k, _)| {
                k.from_type == from_type && k.from_id == from_id && k.to_type == to_type
            })
            .map(|(k, v)| (&k.to_id, v))
    }

    // ── Reverse index ───────────────────────────────────────────────

    pub fn reverse_edge(&self, key: &ReverseEdgeKey) -> Option<&Slot<Props>> {
        self.reverse_edges.get(key)
    }

    pub fn reverse_edges(&self) -> impl Iterator<Item = (&ReverseEdgeKey, &Slot<Props>)> {
        self.reverse_edges.iter()
    }

    /// All edges `from_type/* -> to_type/to_id`, keyed by source id.
    pub fn reverse_edges_of<'a>(
        &'a self,
        to_type: &'a str,
        to_id: &'a str,
        from_type: &'a str,
    ) -> impl Iterator<Item = (&'a NodeId, &'a Slot<Props>)> + 'a {
        let start = ReverseEdgeKey {
            to_type: to_type.to_string(),
            to_id: to_id.to_string(),
            from_type: from_type.to_string(),
            from_id: String::new(),
        };
        self.reverse_edges
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(move |(k, _)| {
                k.to_type == to_type && k.to_id == to_id && k.from_type == from_type
            })
            .map(|(k, v)| (&k.from_id, v))
    }

    /// Regenerate the reverse index from `edges`.
    pub fn rebuild_index(&mut self) {
        self.reverse_edges = self
            .edges
            .iter()
            .map(|(k, v)| (k.reversed(), v.clone()))
            .collect();
    }

    /// Whether the reverse index mirrors `edges` exactly.
    pub fn index_consistent(&self) -> bool {
        self.edges.len() == self.reverse_edges.len()
            && self
                .edges
                .iter()
                .all(|(k, v)| self.reverse_edges.get(&k.reversed()) == Some(v))
    }

    // ── Rights ──────────────────────────────────────────────────────

    pub fn right(&self, key: &RightKey) -> Option<&Flag> {
        self.rights.get(key)
    }

    pub fn rights(&self) -> impl Iterator<Item = (&RightKey, &Flag)> {
        self.rights.iter()
    }

    /// Rights flags of one node.
    pub fn rights_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = (&'a RightKey, &'a Flag)> + 'a {
        self.rights.iter().filter(move |(k, _)| k.node_id == node_id)
    }

    pub fn set_right(&mut self, key: RightKey, flag: Flag) {
        self.rights.insert(key, flag);
    }

    pub fn inherit(&self, node_id: &str) -> Option<&Slot<NodeId>> {
        self.inherit.get(node_id)
    }

    pub fn inherits(&self) -> impl Iterator<Item = (&NodeId, &Slot<NodeId>)> {
        self.inherit.iter()
    }

    pub fn set_inherit(&mut self, node_id: impl Into<NodeId>, from: Slot<NodeId>) {
        self.inherit.insert(node_id.into(), from);
    }

    /// Grouped rights of one node. Tombstoned flags read as `false`,
    /// unset flags are skipped.
    pub fn node_rights(&self, node_id: &str) -> NodeRights {
        let mut out = NodeRights::default();
        for (key, flag) in self.rights_of(node_id) {
            let Some(value) = flag.as_bool() else {
                continue;
            };
            let principals = match key.kind {
                PrincipalKind::User => &mut out.user,
                PrincipalKind::Role => &mut out.role,
            };
            principals
                .entry(key.principal.clone())
                .or_default()
                .set(key.right, Some(value));
        }
        out.inherit_from = self.inherit(node_id).and_then(Slot::data).cloned();
        out
    }

    // ── Files ───────────────────────────────────────────────────────

    pub fn file(&self, key: &FileKey) -> Option<&Slot<FileEntry>> {
        self.files.get(key)
    }

    pub fn files(&self) -> impl Iterator<Item = (&FileKey, &Slot<FileEntry>)> {
        self.files.iter()
    }

    pub fn files_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = (&'a FileKey, &'a Slot<FileEntry>)> + 'a {
        self.files.iter().filter(move |(k, _)| k.node_id == node_id)
    }

    pub fn set_file(&mut self, key: FileKey, file: Slot<FileEntry>) {
        self.files.insert(key, file);
    }

    pub fn remove_file(&mut self, key: &FileKey) -> Option<Slot<FileEntry>> {
        self.files.remove(key)
    }

    // ── Leaf access by path ─────────────────────────────────────────

    pub fn get(&self, path: &GraphPath) -> Option<LeafRef<'_>> {
        match path {
            GraphPath::Node(id) => self.nodes.get(id).map(LeafRef::Node),
            GraphPath::Edge(k) => self.edges.get(k).map(LeafRef::Edge),
            GraphPath::Right(k) => self.rights.get(k).map(LeafRef::Right),
            GraphPath::Inherit(id) => self.inherit.get(id).map(LeafRef::Inherit),
            GraphPath::File(k) => self.files.get(k).map(LeafRef::File),
            GraphPath::ReverseEdge(k) => self.reverse_edges.get(k).map(LeafRef::Edge),
        }
    }

    /// Replace the leaf at `path`.
    pub fn set(&mut self, path: GraphPath, leaf: Leaf) -> Result<()> {
        match (path, leaf) {
            (GraphPath::Node(id), Leaf::Node(s)) => self.set_node(id, s),
            (GraphPath::Edge(k), Leaf::Edge(s)) => self.set_edge(k, s),
            (GraphPath::Right(k), Leaf::Right(s)) => self.set_right(k, s),
            (GraphPath::Inherit(id), Leaf::Inherit(s)) => self.set_inherit(id, s),
            (GraphPath::File(k), Leaf::File(s)) => self.set_file(k, s),
            (path @ GraphPath::ReverseEdge(_), _) => {
                return Err(GraphError::DerivedPath(path.to_string()))
            }
            (path, _) => {
                return Err(GraphError::LeafMismatch {
                    expected: region_name(&path),
                    path: path.to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, path: &GraphPath) -> Option<Leaf> {
        match path {
            GraphPath::Node(id) => self.nodes.remove(id).map(Leaf::Node),
            GraphPath::Edge(k) => self.remove_edge(k).map(Leaf::Edge),
            GraphPath::Right(k) => self.rights.remove(k).map(Leaf::Right),
            GraphPath::Inherit(id) => self.inherit.remove(id).map(Leaf::Inherit),
            GraphPath::File(k) => self.files.remove(k).map(Leaf::File),
            GraphPath::ReverseEdge(_) => None,
        }
    }

    /// Every addressable leaf with its typed path, region by region.
    /// The derived index is not included.
    pub fn leaves(&self) -> impl Iterator<Item = (GraphPath, LeafRef<'_>)> {
        let nodes = self
            .nodes
            .iter()
            .map(|(k, v)| (GraphPath::Node(k.clone()), LeafRef::Node(v)));
        let edges = self
            .edges
            .iter()
            .map(|(k, v)| (GraphPath::Edge(k.clone()), LeafRef::Edge(v)));
        let rights = self
            .rights
            .iter()
            .map(|(k, v)| (GraphPath::Right(k.clone()), LeafRef::Right(v)));
        let inherit = self
            .inherit
            .iter()
            .map(|(k, v)| (GraphPath::Inherit(k.clone()), LeafRef::Inherit(v)));
        let files = self
            .files
            .iter()
            .map(|(k, v)| (GraphPath::File(k.clone()), LeafRef::File(v)));
        nodes.chain(edges).chain(rights).chain(inherit).chain(files)
    }
}

fn region_name(path: &GraphPath) -> &'static str {
    match path {
        GraphPath::Node(_) => "node",
        GraphPath::Edge(_) => "edge",
        GraphPath::Right(_) => "rights flag",
        GraphPath::Inherit(_) => "inherit",
        GraphPath::File(_) => "file",
        GraphPath::ReverseEdge(_) => "reverse edge",
    }
}
