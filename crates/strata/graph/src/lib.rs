#![deny(unsafe_code)]
//! # strata-graph
//!
//! The data layer of the Strata layered graph store: one [`Graph`] is a
//! layer of nodes, edges, rights and files whose every leaf is a
//! three-valued [`Slot`] (data, marker, tombstone, or explicit unset).
//!
//! ## Key types
//!
//! - [`Graph`]: typed maps keyed by composite addresses, plus a reverse-edge
//!   index kept in sync with `edges`
//! - [`Slot`]: `Unset | Tombstone | Marker | Data(T)`
//! - [`GraphPath`]: typed leaf address; the `is_*_path` predicates in
//!   [`path`] classify raw string paths
//! - [`GraphVisitor`], [`reduce`], [`pick_map`], [`zip_with`]: the walker
//! - [`merge_graphs_right`] and friends: the merge algebra
//! - [`ErrorGraph`]: per-element push failures

pub mod error;
pub mod error_graph;
pub mod graph;
pub mod merge;
pub mod path;
pub mod slot;
pub mod types;
pub mod walk;
mod wire;

pub use error::{GraphError, Result};
pub use error_graph::{ElementError, ErrorGraph, MISSING_STATUS, NO_ADMIN_RIGHT, NO_WRITE_RIGHT};
pub use graph::{Graph, Leaf, LeafRef};
pub use merge::{
    merge_graphs, merge_graphs_left, merge_graphs_right, merge_overwrite_graphs_left,
    merge_overwrite_graphs_right, MergeMode, MergeRule, Priority,
};
pub use path::{GraphPath, Region};
pub use slot::{deep_merge, Flag, Never, Slot, SlotData};
pub use types::{
    EdgeKey, FileEntry, FileKey, NodeId, NodeRights, PendingUpload, PrincipalKind, Props, RemoteFile,
    ReverseEdgeKey, Right, RightFlags, RightKey,
};
pub use walk::{pick_map, reduce, zip_with, GraphVisitor, LeafMerge};
