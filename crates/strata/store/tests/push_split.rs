//! Every pushed element ends up in exactly one of the success and error
//! graphs, whatever the remote answers.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use strata_graph::path::insert_nested;
use strata_graph::{EdgeKey, Graph, Props, Right, RightKey, Slot};
use strata_store::create_success_and_error_graphs;

fn arb_id() -> impl Strategy<Value = String> {
    prop_oneof![Just("n1"), Just("n2"), Just("n3"), Just("n4")].prop_map(String::from)
}

fn arb_slot() -> impl Strategy<Value = Slot<Props>> {
    prop_oneof![
        Just(Slot::Marker),
        Just(Slot::Tombstone),
        (0i64..3).prop_map(|v| {
            let mut props = Props::new();
            props.insert("v".into(), json!(v));
            Slot::Data(props)
        }),
    ]
}

/// `None` leaves the element without a status.
fn arb_status() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(Some(json!({"statusCode": 200}))),
        Just(Some(json!({"statusCode": 403}))),
        Just(Some(json!({"statusCode": 409, "name": "Conflict"}))),
        Just(None),
    ]
}

prop_compose! {
    fn arb_pushed()(
        nodes in proptest::collection::vec((arb_id(), arb_slot()), 0..4),
        edges in proptest::collection::vec((arb_id(), arb_id(), arb_slot()), 0..4),
        rights in proptest::collection::vec((arb_id(), any::<bool>()), 0..3),
    ) -> Graph {
        let mut graph = Graph::new();
        for (id, slot) in nodes {
            graph.set_node(id, slot);
        }
        for (from, to, slot) in edges {
            graph.set_edge(EdgeKey::new("item", from, "item", to), slot);
        }
        for (id, allowed) in rights {
            graph.set_right(RightKey::user(id, "a@x", Right::Write), Slot::from_bool(allowed));
        }
        graph
    }
}

fn arb_case() -> impl Strategy<Value = (Graph, Value)> {
    arb_pushed().prop_flat_map(|pushed| {
        let paths: Vec<Vec<String>> = pushed.leaves().map(|(path, _)| path.segments()).collect();
        let statuses = proptest::collection::vec(arb_status(), paths.len());
        (Just(pushed), statuses).prop_map(move |(pushed, statuses)| {
            let mut result = Map::new();
            for (path, status) in paths.iter().zip(statuses) {
                if let Some(status) = status {
                    insert_nested(&mut result, path, status);
                }
            }
            (pushed, Value::Object(result))
        })
    })
}

proptest! {
    #[test]
    fn split_is_exhaustive_and_disjoint((pushed, result) in arb_case()) {
        let split = create_success_and_error_graphs(&pushed, &result).unwrap();

        prop_assert_eq!(split.success.len() + split.errors.len(), pushed.len());
        for (path, leaf) in pushed.leaves() {
            let accepted = split.success.get(&path);
            let rejected = split.errors.contains(&path);
            prop_assert!(accepted.is_some() != rejected, "{} in both or neither", path);
            if let Some(accepted) = accepted {
                prop_assert_eq!(accepted, leaf);
            }
        }
        prop_assert!(split.success.index_consistent());
    }
}
