//! Merge algebra over pairs of graphs.
//!
//! Two families, each with a left- and a right-priority operator:
//!
//! - **additive** (`merge_graphs_*`): union of both layers. On conflict the
//!   priority side wins, except that a marker never replaces data, an unset
//!   value never replaces anything, and a tombstone on the other side is only
//!   lifted by priority data.
//! - **overwrite** (`merge_overwrite_graphs_*`): reconciliation with a fresh
//!   remote snapshot. Priority data and tombstones replace outright, a
//!   priority marker only replaces a tombstone or nothing, and a priority
//!   unset removes the path from the result.
//!
//! Both families walk leaves with [`zip_with`] and regenerate the reverse
//! index from the merged edges afterwards; the index itself is never merged.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::graph::Graph;
use crate::slot::{Slot, SlotData};
use crate::walk::{zip_with, LeafMerge};

/// Which input wins conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Left,
    Right,
}

/// Merge family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    Additive,
    Overwrite,
}

/// A merge operator: family plus priority side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRule {
    pub mode: MergeMode,
    pub priority: Priority,
}

impl LeafMerge for MergeRule {
    fn merge<T: SlotData>(&self, left: Option<&Slot<T>>, right: Option<&Slot<T>>) -> Option<Slot<T>> {
        let (winner, other) = match self.priority {
            Priority::Left => (left, right),
            Priority::Right => (right, left),
        };
        match self.mode {
            MergeMode::Additive => additive(winner, other),
            MergeMode::Overwrite => overwrite(winner, other),
        }
    }
}

/// Additive rule for one leaf. `winner` is the priority side.
pub fn additive<T: SlotData>(winner: Option<&Slot<T>>, other: Option<&Slot<T>>) -> Option<Slot<T>> {
    match (winner, other) {
        (None | Some(Slot::Unset), None | Some(Slot::Unset)) => None,
        (None | Some(Slot::Unset), Some(other)) => Some(other.clone()),
        (Some(Slot::Tombstone), _) => Some(Slot::Tombstone),
        (Some(Slot::Marker), Some(Slot::Data(data))) => Some(Slot::Data(data.clone())),
        (Some(Slot::Marker), Some(Slot::Tombstone)) => Some(Slot::Tombstone),
        (Some(Slot::Marker), _) => Some(Slot::Marker),
        (Some(Slot::Data(w)), Some(Slot::Data(o))) => Some(Slot::Data(T::combine(w, o))),
        (Some(Slot::Data(w)), _) => Some(Slot::Data(w.clone())),
    }
}

/// Overwrite rule for one leaf. `winner` is the priority side.
pub fn overwrite<T: SlotData>(winner: Option<&Slot<T>>, other: Option<&Slot<T>>) -> Option<Slot<T>> {
    match (winner, other) {
        (None, None | Some(Slot::Unset)) => None,
        (None, Some(other)) => Some(other.clone()),
        (Some(Slot::Unset), _) => None,
        (Some(Slot::Tombstone), _) => Some(Slot::Tombstone),
        (Some(Slot::Data(w)), _) => Some(Slot::Data(w.clone())),
        (Some(Slot::Marker), Some(Slot::Data(o))) => Some(Slot::Data(o.clone())),
        (Some(Slot::Marker), _) => Some(Slot::Marker),
    }
}

/// Merge two graphs with an explicit rule.
pub fn merge_graphs(left: &Graph, right: &Graph, mode: MergeMode, priority: Priority) -> Graph {
    trace!(?mode, ?priority, left = left.len(), right = right.len(), "merging graphs");
    zip_with(left, right, &MergeRule { mode, priority })
}

/// Additive merge, right side wins.
pub fn merge_graphs_right(left: &Graph, right: &Graph) -> Graph {
    merge_graphs(left, right, MergeMode::Additive, Priority::Right)
}

/// Additive merge, left side wins.
pub fn merge_graphs_left(left: &Graph, right: &Graph) -> Graph {
    merge_graphs(left, right, MergeMode::Additive, Priority::Left)
}

/// Overwrite merge, right side wins.
pub fn merge_overwrite_graphs_right(left: &Graph, right: &Graph) -> Graph {
    merge_graphs(left, right, MergeMode::Overwrite, Priority::Right)
}

/// Overwrite merge, left side wins.
pub fn merge_overwrite_graphs_left(left: &Graph, right: &Graph) -> Graph {
    merge_graphs(left, right, MergeMode::Overwrite, Priority::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKey, Props, Right, RightKey};
    use serde_json::{json, Value};

    fn props(value: Value) -> Props {
        value.as_object().cloned().unwrap()
    }

    fn graph(value: Value) -> Graph {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn additive_scenario_from_overview() {
        let left = graph(json!({
            "nodes": {"n1": {"id": "n1", "prop": "v1"}},
            "edges": {"from": {"n1": {"to": {"n2": true}}}}
        }));
        let right = graph(json!({
            "nodes": {"n1": {"prop": "v2"}},
            "edges": {"from": {"n1": {"to": {"n2": false}}}}
        }));
        let merged = merge_graphs_right(&left, &right);
        assert_eq!(
            merged.node("n1"),
            Some(&Slot::Data(props(json!({"id": "n1", "prop": "v2"}))))
        );
        assert_eq!(
            merged.edge(&EdgeKey::new("from", "n1", "to", "n2")),
            Some(&Slot::Tombstone)
        );
        assert!(merged.index_consistent());
    }

    #[test]
    fn additive_leaf_table() {
        let data = || Slot::Data(props(json!({"a": 1})));
        assert_eq!(additive(Some(&Slot::Tombstone), Some(&data())), Some(Slot::Tombstone));
        assert_eq!(additive::<Props>(Some(&Slot::Marker), Some(&Slot::Tombstone)), Some(Slot::Tombstone));
        assert_eq!(additive(Some(&Slot::Marker), Some(&data())), Some(data()));
        assert_eq!(additive(Some(&data()), Some(&Slot::Tombstone)), Some(data()));
        assert_eq!(additive::<Props>(Some(&Slot::Unset), Some(&Slot::Tombstone)), Some(Slot::Tombstone));
        assert_eq!(additive::<Props>(Some(&Slot::Unset), None), None);
        assert_eq!(additive(None, Some(&Slot::Marker)), Some(Slot::<Props>::Marker));
    }

    #[test]
    fn overwrite_leaf_table() {
        let data = |v: i64| Slot::Data(props(json!({ "a": v })));
        assert_eq!(overwrite(Some(&data(2)), Some(&data(1))), Some(data(2)));
        assert_eq!(overwrite(Some(&Slot::Marker), Some(&data(1))), Some(data(1)));
        assert_eq!(overwrite::<Props>(Some(&Slot::Marker), Some(&Slot::Tombstone)), Some(Slot::Marker));
        assert_eq!(overwrite(Some(&Slot::Marker), None), Some(Slot::<Props>::Marker));
        assert_eq!(overwrite(Some(&Slot::Unset), Some(&data(1))), None);
        assert_eq!(overwrite(None, Some(&data(1))), Some(data(1)));
        assert_eq!(overwrite::<Props>(None, Some(&Slot::Unset)), None);
    }

    #[test]
    fn overwrite_replaces_rather_than_unions() {
        let left = graph(json!({"nodes": {"n1": {"id": "n1", "a": 1, "b": 1}}}));
        let right = graph(json!({"nodes": {"n1": {"id": "n1", "a": 2}}}));
        let merged = merge_overwrite_graphs_right(&left, &right);
        assert_eq!(
            merged.node("n1"),
            Some(&Slot::Data(props(json!({"id": "n1", "a": 2}))))
        );
    }

    #[test]
    fn overwrite_unset_removes_path() {
        let left = graph(json!({
            "nodes": {"n1": {"id": "n1"}, "n2": {"id": "n2"}},
            "edges": {"a": {"n1": {"b": {"n2": {"order": 1}}}}}
        }));
        let mut right = Graph::new();
        right.set_node("n1", Slot::Unset);
        right.set_edge(EdgeKey::new("a", "n1", "b", "n2"), Slot::Unset);

        let merged = merge_overwrite_graphs_right(&left, &right);
        assert!(merged.node("n1").is_none());
        assert!(merged.node("n2").is_some());
        assert!(merged.edges().next().is_none());
        assert!(merged.reverse_edges().next().is_none());
    }

    #[test]
    fn left_priority_mirrors_right_priority() {
        let a = graph(json!({"nodes": {"n1": {"x": 1}}}));
        let b = graph(json!({"nodes": {"n1": {"x": 2}}}));
        assert_eq!(merge_graphs_left(&b, &a), merge_graphs_right(&a, &b));
        assert_eq!(
            merge_overwrite_graphs_left(&b, &a),
            merge_overwrite_graphs_right(&a, &b)
        );
    }

    #[test]
    fn rights_merge_per_flag() {
        let mut left = Graph::new();
        left.set_right(RightKey::user("n1", "a@b", Right::Read), Slot::Marker);
        left.set_right(RightKey::user("n1", "a@b", Right::Write), Slot::Marker);
        let mut right = Graph::new();
        right.set_right(RightKey::user("n1", "a@b", Right::Write), Slot::Tombstone);

        let merged = merge_graphs_right(&left, &right);
        assert_eq!(merged.right(&RightKey::user("n1", "a@b", Right::Read)), Some(&Slot::Marker));
        assert_eq!(
            merged.right(&RightKey::user("n1", "a@b", Right::Write)),
            Some(&Slot::Tombstone)
        );
    }
}
