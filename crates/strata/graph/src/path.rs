//! Path classification.
//!
//! A path is the ordered list of keys leading into the nested wire shape of a
//! graph. Classification is purely structural: the top-level key picks the
//! region and the path length picks the depth.
//!
//! ```text
//! nodes         nodeId
//! edges         fromType fromId toType toId
//! rights        nodeId   user|role principal read|write|admin
//! rights        nodeId   inherit   from
//! files         nodeId   prop
//! index         reverseEdges toType toId fromType fromId
//! ```

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{GraphError, Result};
use crate::types::{EdgeKey, FileKey, NodeId, ReverseEdgeKey, RightKey};

pub const NODES: &str = "nodes";
pub const EDGES: &str = "edges";
pub const RIGHTS: &str = "rights";
pub const FILES: &str = "files";
pub const INDEX: &str = "index";
pub const REVERSE_EDGES: &str = "reverseEdges";
pub const INHERIT: &str = "inherit";
pub const FROM: &str = "from";

fn first<S: AsRef<str>>(path: &[S]) -> Option<&str> {
    path.first().map(AsRef::as_ref)
}

fn at<S: AsRef<str>>(path: &[S], i: usize) -> Option<&str> {
    path.get(i).map(AsRef::as_ref)
}

pub fn is_nodes_path<S: AsRef<str>>(path: &[S]) -> bool {
    first(path) == Some(NODES)
}

/// Exactly one node.
pub fn is_node_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_nodes_path(path) && path.len() == 2
}

pub fn is_edges_path<S: AsRef<str>>(path: &[S]) -> bool {
    first(path) == Some(EDGES)
}

/// Exactly one edge value (marker, tombstone or metadata).
pub fn is_metadata_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_edges_path(path) && path.len() == 5
}

pub fn is_rights_path<S: AsRef<str>>(path: &[S]) -> bool {
    first(path) == Some(RIGHTS)
}

/// Exactly one rights flag.
pub fn is_right_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_rights_path(path)
        && path.len() == 5
        && matches!(at(path, 2), Some("user") | Some("role"))
        && matches!(at(path, 4), Some("read") | Some("write") | Some("admin"))
}

/// Exactly one `inherit.from` entry.
pub fn is_inherit_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_rights_path(path)
        && path.len() == 4
        && at(path, 2) == Some(INHERIT)
        && at(path, 3) == Some(FROM)
}

pub fn is_files_path<S: AsRef<str>>(path: &[S]) -> bool {
    first(path) == Some(FILES)
}

/// Exactly one per-node-per-prop file entry.
pub fn is_file_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_files_path(path) && path.len() == 3
}

pub fn is_index_path<S: AsRef<str>>(path: &[S]) -> bool {
    first(path) == Some(INDEX)
}

pub fn is_reverse_edges_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_index_path(path) && at(path, 1) == Some(REVERSE_EDGES)
}

/// Exactly one reverse-edge entry.
pub fn is_reverse_edge_path<S: AsRef<str>>(path: &[S]) -> bool {
    is_reverse_edges_path(path) && path.len() == 6
}

/// Top-level region of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Nodes,
    Edges,
    Rights,
    Files,
    Index,
}

/// Which region a path descends into. Every non-empty path into a
/// well-formed graph falls into exactly one region.
pub fn region<S: AsRef<str>>(path: &[S]) -> Option<Region> {
    if is_nodes_path(path) {
        Some(Region::Nodes)
    } else if is_edges_path(path) {
        Some(Region::Edges)
    } else if is_rights_path(path) {
        Some(Region::Rights)
    } else if is_files_path(path) {
        Some(Region::Files)
    } else if is_index_path(path) {
        Some(Region::Index)
    } else {
        None
    }
}

/// Typed address of a single leaf.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphPath {
    Node(NodeId),
    Edge(EdgeKey),
    Right(RightKey),
    Inherit(NodeId),
    File(FileKey),
    ReverseEdge(ReverseEdgeKey),
}

impl GraphPath {
    /// Classify a string path into a typed leaf address.
    pub fn parse<S: AsRef<str>>(path: &[S]) -> Result<Self> {
        let seg = |i: usize| at(path, i).unwrap_or_default().to_string();
        if is_node_path(path) {
            Ok(Self::Node(seg(1)))
        } else if is_metadata_path(path) {
            Ok(Self::Edge(EdgeKey::new(seg(1), seg(2), seg(3), seg(4))))
        } else if is_right_path(path) {
            Ok(Self::Right(RightKey {
                node_id: seg(1),
                kind: seg(2).parse()?,
                principal: seg(3),
                right: seg(4).parse()?,
            }))
        } else if is_inherit_path(path) {
            Ok(Self::Inherit(seg(1)))
        } else if is_file_path(path) {
            Ok(Self::File(FileKey::new(seg(1), seg(2))))
        } else if is_reverse_edge_path(path) {
            Ok(Self::ReverseEdge(ReverseEdgeKey {
                to_type: seg(2),
                to_id: seg(3),
                from_type: seg(4),
                from_id: seg(5),
            }))
        } else {
            Err(GraphError::InvalidPath(join(path)))
        }
    }

    /// The string path of this leaf in the wire shape.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Self::Node(id) => vec![NODES.into(), id.clone()],
            Self::Edge(k) => vec![
                EDGES.into(),
                k.from_type.clone(),
                k.from_id.clone(),
                k.to_type.clone(),
                k.to_id.clone(),
            ],
            Self::Right(k) => vec![
                RIGHTS.into(),
                k.node_id.clone(),
                k.kind.as_str().into(),
                k.principal.clone(),
                k.right.as_str().into(),
            ],
            Self::Inherit(id) => vec![RIGHTS.into(), id.clone(), INHERIT.into(), FROM.into()],
            Self::File(k) => vec![FILES.into(), k.node_id.clone(), k.prop.clone()],
            Self::ReverseEdge(k) => vec![
                INDEX.into(),
                REVERSE_EDGES.into(),
                k.to_type.clone(),
                k.to_id.clone(),
                k.from_type.clone(),
                k.from_id.clone(),
            ],
        }
    }

    pub fn region(&self) -> Region {
        match self {
            Self::Node(_) => Region::Nodes,
            Self::Edge(_) => Region::Edges,
            Self::Right(_) | Self::Inherit(_) => Region::Rights,
            Self::File(_) => Region::Files,
            Self::ReverseEdge(_) => Region::Index,
        }
    }

    /// Whether this leaf lies at or below `prefix`.
    pub fn starts_with<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        let segments = self.segments();
        prefix.len() <= segments.len()
            && prefix
                .iter()
                .zip(segments.iter())
                .all(|(p, s)| p.as_ref() == s)
    }
}

impl fmt::Display for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/")
}

/// Write `leaf` into a nested JSON object at `segments`, creating
/// intermediate objects. Non-object intermediates are replaced.
pub fn insert_nested(target: &mut Map<String, Value>, segments: &[String], leaf: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut cursor = target;
    for key in parents {
        let entry = cursor
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        cursor = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    cursor.insert(last.clone(), leaf);
}

/// Walk `segments` into a nested JSON value.
pub fn lookup_nested<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |value, key| value.get(key.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrincipalKind, Right};
    use serde_json::json;

    #[test]
    fn classifies_each_region_exactly_once() {
        let paths: Vec<Vec<&str>> = vec![
            vec!["nodes", "n1"],
            vec!["edges", "a", "n1", "b", "n2"],
            vec!["rights", "n1", "user", "x@y", "read"],
            vec!["rights", "n1", "inherit", "from"],
            vec!["files", "n1", "avatar"],
            vec!["index", "reverseEdges", "b", "n2", "a", "n1"],
        ];
        for path in &paths {
            let groups = [
                is_nodes_path(path),
                is_edges_path(path),
                is_rights_path(path),
                is_files_path(path),
                is_index_path(path),
            ];
            assert_eq!(groups.iter().filter(|g| **g).count(), 1, "{path:?}");
        }
    }

    #[test]
    fn depth_predicates() {
        assert!(is_node_path(&["nodes", "n1"]));
        assert!(!is_node_path(&["nodes"]));
        assert!(is_metadata_path(&["edges", "a", "n1", "b", "n2"]));
        assert!(!is_metadata_path(&["edges", "a", "n1", "b"]));
        assert!(is_file_path(&["files", "n1", "p"]));
        assert!(is_reverse_edges_path(&["index", "reverseEdges"]));
        assert!(is_reverse_edge_path(&["index", "reverseEdges", "b", "n2", "a", "n1"]));
        assert!(!is_right_path(&["rights", "n1", "user", "x", "own"]));
        assert!(is_inherit_path(&["rights", "n1", "inherit", "from"]));
    }

    #[test]
    fn parse_and_segments_agree() {
        let paths = vec![
            GraphPath::Node("n1".into()),
            GraphPath::Edge(EdgeKey::new("a", "n1", "b", "n2")),
            GraphPath::Right(RightKey {
                node_id: "n1".into(),
                kind: PrincipalKind::Role,
                principal: "editor".into(),
                right: Right::Write,
            }),
            GraphPath::Inherit("n1".into()),
            GraphPath::File(FileKey::new("n1", "avatar")),
            GraphPath::ReverseEdge(EdgeKey::new("a", "n1", "b", "n2").reversed()),
        ];
        for path in paths {
            assert_eq!(GraphPath::parse(&path.segments()).unwrap(), path);
        }
    }

    #[test]
    fn parse_rejects_partial_paths() {
        assert!(GraphPath::parse(&["edges", "a", "n1"]).is_err());
        assert!(GraphPath::parse(&["vars", "x"]).is_err());
        assert!(GraphPath::parse::<&str>(&[]).is_err());
    }

    #[test]
    fn prefix_matching() {
        let path = GraphPath::Edge(EdgeKey::new("a", "n1", "b", "n2"));
        assert!(path.starts_with(&["edges", "a", "n1"]));
        assert!(!path.starts_with(&["edges", "a", "n9"]));
        assert!(path.starts_with::<&str>(&[]));
    }

    #[test]
    fn nested_insert_and_lookup() {
        let mut root = Map::new();
        insert_nested(
            &mut root,
            &["edges".into(), "a".into(), "n1".into()],
            json!(true),
        );
        let value = Value::Object(root);
        assert_eq!(lookup_nested(&value, &["edges", "a", "n1"]), Some(&json!(true)));
        assert_eq!(lookup_nested(&value, &["edges", "b"]), None);
    }
}
