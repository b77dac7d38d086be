use std::collections::BTreeMap;

use serde::Serialize;
use strata_graph::{FileEntry, Graph, NodeId, NodeRights, Props, Slot};

use crate::engine::{do_view_graph, EdgeSource, EdgeVisit, NodeVisit, ViewVisitor};
use crate::error::Result;
use crate::model::View;

/// Per-node lookups used to populate a [`ViewTree`].
pub trait NodeSource {
    fn node(&self, node_id: &str) -> Option<Slot<Props>>;
    fn node_rights(&self, node_id: &str) -> NodeRights;
    /// Live file entries of a node, keyed by property.
    fn node_files(&self, node_id: &str) -> BTreeMap<String, FileEntry>;
}

impl NodeSource for Graph {
    fn node(&self, node_id: &str) -> Option<Slot<Props>> {
        Graph::node(self, node_id).cloned()
    }

    fn node_rights(&self, node_id: &str) -> NodeRights {
        Graph::node_rights(self, node_id)
    }

    fn node_files(&self, node_id: &str) -> BTreeMap<String, FileEntry> {
        self.files_of(node_id)
            .filter_map(|(key, file)| Some((key.prop.clone(), file.data()?.clone())))
            .collect()
    }
}

/// One node of a view result. Edge maps are flattened next to the node's
/// own fields under their alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    #[serde(rename = "_id")]
    pub node_id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<Props>,
    /// Value of the reaching edge: the stored value with `metadata`
    /// included, a bare marker with only `edges` included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Slot<Props>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<NodeRights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, FileEntry>>,
    #[serde(flatten)]
    pub edges: BTreeMap<String, BTreeMap<NodeId, ViewNode>>,
}

impl ViewNode {
    /// Targets under one edge alias.
    pub fn edge(&self, alias: &str) -> Option<&BTreeMap<NodeId, ViewNode>> {
        self.edges.get(alias)
    }
}

/// Concrete result of a view: roots keyed by alias (or node id).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewTree {
    pub roots: BTreeMap<String, ViewNode>,
}

impl ViewTree {
    pub fn get(&self, key: &str) -> Option<&ViewNode> {
        self.roots.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Node at an alias-resolved output path.
    pub fn at<S: AsRef<str>>(&self, path: &[S]) -> Option<&ViewNode> {
        let (root, rest) = path.split_first()?;
        let mut node = self.roots.get(as_str(root))?;
        for pair in rest.chunks(2) {
            let [alias, id] = pair else {
                return None;
            };
            node = node.edges.get(as_str(alias))?.get(as_str(id))?;
        }
        Some(node)
    }

    fn at_mut(&mut self, path: &[String]) -> Option<&mut ViewNode> {
        let (root, rest) = path.split_first()?;
        let mut node = self.roots.get_mut(root)?;
        for pair in rest.chunks(2) {
            let [alias, id] = pair else {
                return None;
            };
            node = node.edges.get_mut(alias)?.get_mut(id)?;
        }
        Some(node)
    }
}

fn as_str<S: AsRef<str>>(segment: &S) -> &str {
    segment.as_ref()
}

/// Build the result tree of `view`, resolving edges through `edges` and
/// node contents through `nodes`.
pub fn view_tree<E, N>(view: &View, edges: &E, nodes: &N) -> Result<ViewTree>
where
    E: EdgeSource + ?Sized,
    N: NodeSource + ?Sized,
{
    let mut builder = TreeBuilder {
        nodes,
        tree: ViewTree::default(),
    };
    do_view_graph(view, edges, &mut builder)?;
    Ok(builder.tree)
}

/// [`view_tree`] against a single graph.
pub fn view_graph(view: &View, graph: &Graph) -> Result<ViewTree> {
    view_tree(view, graph, graph)
}

struct TreeBuilder<'n, N: ?Sized> {
    nodes: &'n N,
    tree: ViewTree,
}

impl<N: NodeSource + ?Sized> TreeBuilder<'_, N> {
    fn build(&self, visit: &NodeVisit<'_>) -> ViewNode {
        let include = visit.query.include;
        let id = visit.node_id;
        ViewNode {
            node_id: id.to_string(),
            node: include
                .node
                .then(|| self.nodes.node(id).and_then(Slot::into_data))
                .flatten(),
            metadata: visit.metadata.and_then(|value| {
                if include.metadata {
                    Some(value.clone())
                } else if include.edges {
                    Some(Slot::Marker)
                } else {
                    None
                }
            }),
            rights: include.rights.then(|| self.nodes.node_rights(id)),
            files: include.files.then(|| self.nodes.node_files(id)),
            edges: BTreeMap::new(),
        }
    }
}

impl<N: NodeSource + ?Sized> ViewVisitor for TreeBuilder<'_, N> {
    fn node(&mut self, visit: &NodeVisit<'_>) {
        let node = self.build(visit);
        match visit.out_path {
            [root] => {
                self.tree.roots.insert(root.clone(), node);
            }
            [parent @ .., alias, id] => {
                if let Some(parent) = self.tree.at_mut(parent) {
                    parent
                        .edges
                        .entry(alias.clone())
                        .or_default()
                        .insert(id.clone(), node);
                }
            }
            [] => {}
        }
    }

    fn edge(&mut self, visit: &EdgeVisit<'_>) {
        if let [parent @ .., alias] = visit.out_path {
            if let Some(parent) = self.tree.at_mut(parent) {
                parent.edges.entry(alias.clone()).or_default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Include, ViewQuery};
    use serde_json::json;

    fn sample() -> Graph {
        Graph::from_value(json!({
            "nodes": {"l1": {"id": "l1", "title": "groceries"}, "t1": {"id": "t1"}, "t2": false},
            "edges": {"list": {"l1": {"todo": {"t1": {"order": 1}, "t2": true}}}},
            "rights": {"l1": {"user": {"a@x": {"read": true, "write": false}}}},
            "files": {"t1": {"img": {"url": "https://f/1", "contentType": "image/png"}}}
        }))
        .unwrap()
    }

    fn everything() -> Include {
        Include {
            node: true,
            edges: true,
            metadata: true,
            rights: true,
            files: true,
        }
    }

    #[test]
    fn builds_aliased_tree() {
        let view = View::new().root(
            "l1",
            ViewQuery::new()
                .alias("list")
                .include(Include { node: true, rights: true, ..Include::default() })
                .edge("list/todo", ViewQuery::new().alias("todos").include(everything())),
        );
        let tree = view_graph(&view, &sample()).unwrap();

        let list = tree.get("list").unwrap();
        assert_eq!(list.node_id, "l1");
        assert_eq!(list.node.as_ref().unwrap()["title"], json!("groceries"));
        let rights = list.rights.as_ref().unwrap();
        assert_eq!(rights.user["a@x"].write, Some(false));

        let t1 = tree.at(&["list", "todos", "t1"]).unwrap();
        assert_eq!(t1.metadata.as_ref().and_then(Slot::data).unwrap()["order"], json!(1));
        assert_eq!(t1.files.as_ref().unwrap().len(), 1);

        let t2 = tree.at(&["list", "todos", "t2"]).unwrap();
        assert_eq!(t2.node, None);
        assert_eq!(t2.metadata, Some(Slot::Marker));
    }

    #[test]
    fn edges_alone_mark_the_reaching_edge() {
        let view = View::new().root(
            "l1",
            ViewQuery::new()
                .include(Include { edges: true, ..Include::default() })
                .edge(
                    "list/todo",
                    ViewQuery::new().include(Include { edges: true, ..Include::default() }),
                ),
        );
        let tree = view_graph(&view, &sample()).unwrap();

        assert_eq!(tree.get("l1").unwrap().metadata, None);
        let t1 = tree.at(&["l1", "list/todo", "t1"]).unwrap();
        assert_eq!(t1.metadata, Some(Slot::Marker));
        assert_eq!(t1.node, None);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["l1"]["list/todo"]["t1"], json!({"_id": "t1", "metadata": true}));
    }

    #[test]
    fn excluded_parts_are_absent_not_false() {
        let view = View::new().root("l1", ViewQuery::new());
        let tree = view_graph(&view, &sample()).unwrap();
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value, json!({"l1": {"_id": "l1"}}));
    }

    #[test]
    fn expanded_edge_without_targets_yields_empty_map() {
        let view = View::new().root(
            "t1",
            ViewQuery::new().edge("todo/user", ViewQuery::new().alias("owners")),
        );
        let tree = view_graph(&view, &sample()).unwrap();
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value, json!({"t1": {"_id": "t1", "owners": {}}}));
    }
}
