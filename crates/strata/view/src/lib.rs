#![deny(unsafe_code)]
//! # strata-view
//!
//! Declarative projections over Strata graphs. A [`View`] names root nodes
//! and the edge types to follow from them; the engine walks it against any
//! [`EdgeSource`] and reports what it reaches.
//!
//! ## Key types
//!
//! - [`View`], [`ViewQuery`], [`Include`]: the view model
//! - [`do_view_graph`]: the callback-driven traversal
//! - [`filter_graph`]: the sub-graph a view covers
//! - [`view_tree`] / [`ViewTree`]: the concrete nested result
//! - [`Equality`], [`reuse_if_equal`]: stable results across reads

pub mod engine;
pub mod equality;
pub mod error;
pub mod filter;
pub mod model;
pub mod tree;

pub use engine::{
    do_view_graph, stored_edge, EdgeSource, EdgeVisit, NodeVisit, RemovedEdgeVisit, ViewVisitor,
};
pub use equality::{reuse_if_equal, AlwaysFresh, Equality, StructuralEq};
pub use error::{Result, ViewError};
pub use filter::filter_graph;
pub use model::{EdgeTypes, Include, View, ViewQuery, NODE_ID_PLACEHOLDER};
pub use tree::{view_graph, view_tree, NodeSource, ViewNode, ViewTree};
