use strata_graph::{Graph, Slot};

use crate::engine::{do_view_graph, NodeVisit, RemovedEdgeVisit, ViewVisitor};
use crate::error::Result;
use crate::model::View;

/// Extract the sub-graph of `graph` addressed by `view`.
///
/// Per reached node the `include` flags of its query decide what is copied:
/// `node` the node value, `rights` the rights flags and inheritance, `files`
/// the file entries. For the edge that reached a node, `metadata` copies the
/// stored edge value and `edges` alone copies a marker. A tombstoned edge
/// is copied as a tombstone under either flag, without its target.
/// Anything not reachable from a root through the declared edge types is
/// left out.
pub fn filter_graph(view: &View, graph: &Graph) -> Result<Graph> {
    let mut filter = GraphFilter {
        source: graph,
        out: Graph::new(),
    };
    do_view_graph(view, graph, &mut filter)?;
    Ok(filter.out)
}

struct GraphFilter<'g> {
    source: &'g Graph,
    out: Graph,
}

impl ViewVisitor for GraphFilter<'_> {
    fn node(&mut self, visit: &NodeVisit<'_>) {
        let include = visit.query.include;
        let id = visit.node_id;

        if include.node {
            if let Some(node) = self.source.node(id) {
                self.out.set_node(id, node.clone());
            }
        }
        if include.rights {
            for (key, flag) in self.source.rights_of(id) {
                self.out.set_right(key.clone(), flag.clone());
            }
            if let Some(from) = self.source.inherit(id) {
                self.out.set_inherit(id, from.clone());
            }
        }
        if include.files {
            for (key, file) in self.source.files_of(id) {
                self.out.set_file(key.clone(), file.clone());
            }
        }
        if let (Some(edge), Some(value)) = (visit.edge, visit.metadata) {
            if include.metadata {
                self.out.set_edge(edge.clone(), value.clone());
            } else if include.edges {
                self.out.set_edge(edge.clone(), Slot::Marker);
            }
        }
    }

    fn removed_edge(&mut self, visit: &RemovedEdgeVisit<'_>) {
        let include = visit.query.include;
        if include.edges || include.metadata {
            self.out.set_edge(visit.edge.clone(), Slot::Tombstone);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Include, ViewQuery};
    use serde_json::json;
    use strata_graph::EdgeKey;

    fn sample() -> Graph {
        Graph::from_value(json!({
            "nodes": {"l1": {"id": "l1"}, "t1": {"id": "t1"}, "x": {"id": "x"}},
            "edges": {"list": {"l1": {"todo": {"t1": {"order": 1}}}}},
            "rights": {"t1": {"user": {"a@x": {"read": true}}, "inherit": {"from": "l1"}}},
            "files": {"t1": {"img": {"url": "u", "contentType": "image/png"}}}
        }))
        .unwrap()
    }

    #[test]
    fn copies_only_included_elements() {
        let view = View::new().root(
            "l1",
            ViewQuery::new().include(Include { node: true, ..Include::default() }).edge(
                "list/todo",
                ViewQuery::new().include(Include {
                    edges: true,
                    rights: true,
                    ..Include::default()
                }),
            ),
        );
        let out = filter_graph(&view, &sample()).unwrap();

        assert!(out.node("l1").is_some());
        assert!(out.node("t1").is_none());
        assert!(out.node("x").is_none());
        assert_eq!(out.edge(&EdgeKey::new("list", "l1", "todo", "t1")), Some(&Slot::Marker));
        assert_eq!(out.inherit("t1"), Some(&Slot::Data("l1".to_string())));
        assert_eq!(out.rights_of("t1").count(), 1);
        assert_eq!(out.files().count(), 0);
        assert!(out.index_consistent());
    }

    #[test]
    fn metadata_copies_the_stored_value() {
        let view = View::new().root(
            "l1",
            ViewQuery::new().edge(
                "list/todo",
                ViewQuery::new().include(Include { metadata: true, files: true, ..Include::default() }),
            ),
        );
        let out = filter_graph(&view, &sample()).unwrap();
        let edge = out.edge(&EdgeKey::new("list", "l1", "todo", "t1")).unwrap();
        assert_eq!(edge.data().and_then(|m| m.get("order")), Some(&json!(1)));
        assert_eq!(out.files_of("t1").count(), 1);
    }

    #[test]
    fn dissociated_edges_survive_as_tombstones() {
        let overlay = Graph::from_value(json!({
            "edges": {"list": {"l1": {"todo": {"t1": false, "t2": true}}}},
            "nodes": {"t1": {"id": "t1"}}
        }))
        .unwrap();
        let query = |include| View::new().root("l1", ViewQuery::new().edge("list/todo", ViewQuery::new().include(include)));

        let out = filter_graph(&query(Include { edges: true, node: true, ..Include::default() }), &overlay).unwrap();
        assert_eq!(out.edge(&EdgeKey::new("list", "l1", "todo", "t1")), Some(&Slot::Tombstone));
        assert_eq!(out.edge(&EdgeKey::new("list", "l1", "todo", "t2")), Some(&Slot::Marker));
        assert!(out.node("t1").is_none());
        assert!(out.index_consistent());

        let out = filter_graph(&query(Include { metadata: true, ..Include::default() }), &overlay).unwrap();
        assert_eq!(out.edge(&EdgeKey::new("list", "l1", "todo", "t1")), Some(&Slot::Tombstone));

        let out = filter_graph(&query(Include { node: true, ..Include::default() }), &overlay).unwrap();
        assert!(out.edge(&EdgeKey::new("list", "l1", "todo", "t1")).is_none());
    }

    #[test]
    fn missing_root_yields_empty_graph() {
        let view = View::new().root("nope", ViewQuery::new().include(Include { node: true, ..Include::default() }));
        assert!(filter_graph(&view, &sample()).unwrap().is_empty());
    }
}
