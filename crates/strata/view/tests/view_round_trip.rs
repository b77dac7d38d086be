//! A view that covers everything reachable from its roots reproduces that
//! part of the graph unchanged.

use proptest::prelude::*;
use serde_json::json;
use strata_graph::{EdgeKey, Graph, Props, Right, RightKey, Slot};
use strata_view::{filter_graph, Include, View, ViewQuery};

fn everything() -> Include {
    Include {
        node: true,
        edges: true,
        metadata: true,
        rights: true,
        files: true,
    }
}

/// root -> a (list/todo) -> b (todo/tag), all included.
fn covering_view(root: &str) -> View {
    View::new().root(
        root,
        ViewQuery::new().include(everything()).edge(
            "list/todo",
            ViewQuery::new()
                .include(everything())
                .edge("todo/tag", ViewQuery::new().include(everything())),
        ),
    )
}

fn arb_props() -> impl Strategy<Value = Props> {
    proptest::collection::btree_map("[a-c]", 0i64..3, 0..3)
        .prop_map(|m| m.into_iter().map(|(k, v)| (k, json!(v))).collect())
}

fn arb_edge() -> impl Strategy<Value = Slot<Props>> {
    prop_oneof![Just(Slot::Marker), arb_props().prop_map(Slot::Data)]
}

prop_compose! {
    fn arb_reachable()(
        todos in proptest::collection::btree_map("t[0-3]", (arb_props(), arb_edge()), 0..4),
        tags in proptest::collection::btree_map("g[0-2]", (arb_props(), arb_edge()), 0..3),
        readable in any::<bool>(),
    ) -> Graph {
        let mut graph = Graph::new();
        graph.set_node("l1", Slot::Data(Props::new()));
        graph.set_right(RightKey::user("l1", "a@x", Right::Read), Slot::from_bool(readable));
        for (todo, (props, edge)) in &todos {
            graph.set_node(todo.clone(), Slot::Data(props.clone()));
            graph.set_edge(EdgeKey::new("list", "l1", "todo", todo.clone()), edge.clone());
            for (tag, (props, edge)) in &tags {
                graph.set_node(tag.clone(), Slot::Data(props.clone()));
                graph.set_edge(EdgeKey::new("todo", todo.clone(), "tag", tag.clone()), edge.clone());
            }
        }
        graph
    }
}

proptest! {
    #[test]
    fn covering_view_reproduces_reachable_subset(graph in arb_reachable()) {
        let filtered = filter_graph(&covering_view("l1"), &graph).unwrap();
        prop_assert_eq!(filtered, graph);
    }
}

#[test]
fn unreachable_elements_are_dropped() {
    let graph = Graph::from_value(json!({
        "nodes": {"l1": {"id": "l1"}, "t1": {"id": "t1"}, "lonely": {"id": "lonely"}},
        "edges": {
            "list": {"l1": {"todo": {"t1": true}}},
            "user": {"u1": {"todo": {"t1": true}}}
        }
    }))
    .unwrap();

    let filtered = filter_graph(&covering_view("l1"), &graph).unwrap();
    assert!(filtered.node("lonely").is_none());
    assert!(filtered.edge(&EdgeKey::new("user", "u1", "todo", "t1")).is_none());
    assert!(filtered.node("t1").is_some());
    assert!(filtered.index_consistent());
}
