//! Nested wire shape of a graph.
//!
//! ```json
//! {
//!   "nodes":  { "<nodeId>": {...} | true | false },
//!   "edges":  { "<fromType>": { "<fromId>": { "<toType>": { "<toId>": {...} | true | false } } } },
//!   "rights": { "<nodeId>": { "user": { "<email>": { "read": true } }, "inherit": { "from": "<nodeId>" } } },
//!   "files":  { "<nodeId>": { "<prop>": {...} | false } }
//! }
//! ```
//!
//! The reverse index is not part of the wire shape; decoding rebuilds it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::graph::Graph;
use crate::slot::{Flag, Slot};
use crate::types::{EdgeKey, FileEntry, FileKey, NodeId, PrincipalKind, Props, Right, RightKey};

type Nested<T> = BTreeMap<String, T>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawGraph {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    nodes: Nested<Slot<Props>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    edges: Nested<Nested<Nested<Nested<Slot<Props>>>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    rights: Nested<RawNodeRights>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    files: Nested<Nested<Slot<FileEntry>>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawNodeRights {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    user: Nested<RawFlags>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    role: Nested<RawFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inherit: Option<RawInherit>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawFlags {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    read: Option<Flag>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    write: Option<Flag>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    admin: Option<Flag>,
}

impl RawFlags {
    fn slot_mut(&mut self, right: Right) -> &mut Option<Flag> {
        match right {
            Right::Read => &mut self.read,
            Right::Write => &mut self.write,
            Right::Admin => &mut self.admin,
        }
    }

    fn into_flags(self) -> impl Iterator<Item = (Right, Flag)> {
        [
            (Right::Read, self.read),
            (Right::Write, self.write),
            (Right::Admin, self.admin),
        ]
        .into_iter()
        .filter_map(|(right, flag)| flag.map(|f| (right, f)))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawInherit {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    from: Option<Slot<NodeId>>,
}

/// A key that is present always yields a slot, so an explicit `null`
/// decodes to [`Slot::Unset`] rather than to an absent key.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Slot<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Slot::deserialize(deserializer).map(Some)
}

impl From<&Graph> for RawGraph {
    fn from(graph: &Graph) -> Self {
        let mut raw = RawGraph {
            nodes: graph.nodes.clone(),
            ..RawGraph::default()
        };
        for (key, edge) in &graph.edges {
            raw.edges
                .entry(key.from_type.clone())
                .or_default()
                .entry(key.from_id.clone())
                .or_default()
                .entry(key.to_type.clone())
                .or_default()
                .insert(key.to_id.clone(), edge.clone());
        }
        for (key, flag) in &graph.rights {
            let node = raw.rights.entry(key.node_id.clone()).or_default();
            let principals = match key.kind {
                PrincipalKind::User => &mut node.user,
                PrincipalKind::Role => &mut node.role,
            };
            *principals
                .entry(key.principal.clone())
                .or_default()
                .slot_mut(key.right) = Some(flag.clone());
        }
        for (node_id, from) in &graph.inherit {
            raw.rights.entry(node_id.clone()).or_default().inherit = Some(RawInherit {
                from: Some(from.clone()),
            });
        }
        for (key, file) in &graph.files {
            raw.files
                .entry(key.node_id.clone())
                .or_default()
                .insert(key.prop.clone(), file.clone());
        }
        raw
    }
}

impl From<RawGraph> for Graph {
    fn from(raw: RawGraph) -> Self {
        let mut graph = Graph {
            nodes: raw.nodes,
            ..Graph::default()
        };
        for (from_type, by_from) in raw.edges {
            for (from_id, by_to_type) in by_from {
                for (to_type, by_to) in by_to_type {
                    for (to_id, edge) in by_to {
                        graph.edges.insert(
                            EdgeKey::new(from_type.clone(), from_id.clone(), to_type.clone(), to_id),
                            edge,
                        );
                    }
                }
            }
        }
        for (node_id, node_rights) in raw.rights {
            let principals = node_rights
                .user
                .into_iter()
                .map(|(p, f)| (PrincipalKind::User, p, f))
                .chain(
                    node_rights
                        .role
                        .into_iter()
                        .map(|(p, f)| (PrincipalKind::Role, p, f)),
                );
            for (kind, principal, flags) in principals {
                for (right, flag) in flags.into_flags() {
                    graph.rights.insert(
                        RightKey {
                            node_id: node_id.clone(),
                            kind,
                            principal: principal.clone(),
                            right,
                        },
                        flag,
                    );
                }
            }
            if let Some(from) = node_rights.inherit.and_then(|i| i.from) {
                graph.inherit.insert(node_id.clone(), from);
            }
        }
        for (node_id, props) in raw.files {
            for (prop, file) in props {
                graph.files.insert(FileKey::new(node_id.clone(), prop), file);
            }
        }
        graph.rebuild_index();
        graph
    }
}

impl Serialize for Graph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawGraph::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RawGraph::deserialize(deserializer).map(Graph::from)
    }
}

impl Graph {
    /// Encode into the nested JSON shape.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode from the nested JSON shape.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_every_region() {
        let graph = Graph::from_value(json!({
            "nodes": {"n1": {"id": "n1"}},
            "edges": {"todo": {"n1": {"user": {"u1": {"order": 2}, "u2": false}}}},
            "rights": {"n1": {
                "user": {"a@b.c": {"read": true, "write": false}},
                "role": {"editor": {"admin": true}},
                "inherit": {"from": "n0"}
            }},
            "files": {"n1": {"avatar": {"filename": "a.png", "contentType": "image/png", "fileSize": 3}}}
        }))
        .unwrap();

        assert_eq!(graph.len(), 8);
        assert!(graph.index_consistent());
        assert_eq!(
            graph.right(&RightKey::user("n1", "a@b.c", Right::Write)),
            Some(&Slot::Tombstone)
        );
        assert_eq!(
            graph.right(&RightKey::role("n1", "editor", Right::Admin)),
            Some(&Slot::Marker)
        );
        assert_eq!(graph.inherit("n1"), Some(&Slot::Data("n0".to_string())));
        assert_eq!(graph.reverse_edges_of("user", "u2", "todo").count(), 1);
    }

    #[test]
    fn encodes_back_to_same_shape() {
        let value = json!({
            "nodes": {"n1": {"id": "n1"}, "n2": false},
            "edges": {"todo": {"n1": {"user": {"u1": true}}}},
            "rights": {"n1": {"user": {"a@b.c": {"admin": true}}, "inherit": {"from": "n0"}}}
        });
        let graph = Graph::from_value(value.clone()).unwrap();
        assert_eq!(graph.to_value().unwrap(), value);
    }

    #[test]
    fn explicit_nulls_in_rights_decode_to_unset() {
        let value = json!({
            "rights": {"n1": {
                "user": {"a@b.c": {"read": null, "write": true}},
                "inherit": {"from": null}
            }}
        });
        let graph = Graph::from_value(value.clone()).unwrap();

        assert_eq!(
            graph.right(&RightKey::user("n1", "a@b.c", Right::Read)),
            Some(&Slot::Unset)
        );
        assert_eq!(graph.right(&RightKey::user("n1", "a@b.c", Right::Admin)), None);
        assert_eq!(graph.inherit("n1"), Some(&Slot::Unset));
        assert_eq!(graph.to_value().unwrap(), value);
    }

    #[test]
    fn empty_graph_encodes_to_empty_object() {
        assert_eq!(Graph::new().to_value().unwrap(), json!({}));
        assert_eq!(Graph::from_value(json!({})).unwrap(), Graph::new());
    }

    #[test]
    fn rejects_malformed_nodes() {
        assert!(Graph::from_value(json!({"nodes": {"n1": 42}})).is_err());
        assert!(Graph::from_value(json!({"rights": {"n1": {"user": {"x": {"read": {}}}}}})).is_err());
    }
}
