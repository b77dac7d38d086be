//! The view traversal driver.
//!
//! [`do_view_graph`] walks a [`View`] top-down and reports every node and
//! edge type it reaches to a [`ViewVisitor`]. Edge targets come from an
//! [`EdgeSource`], so the same walk serves a single graph or a merged stack
//! of graphs.

use std::collections::BTreeMap;

use strata_graph::{EdgeKey, Graph, NodeId, Props, Slot};
use tracing::trace;

use crate::error::Result;
use crate::model::{EdgeTypes, View, ViewQuery};

/// A node reached by the walk.
#[derive(Debug, Clone, Copy)]
pub struct NodeVisit<'a> {
    /// The query that reached this node (root query or edge query).
    pub query: &'a ViewQuery,
    pub node_id: &'a str,
    /// Edge-type keys followed from the root, outermost first.
    pub edge_path: &'a [String],
    /// The stored edge that reached this node; `None` for roots.
    pub edge: Option<&'a EdgeKey>,
    /// Alias-resolved location in the result tree:
    /// `[root, edgeAlias, toId, edgeAlias, toId, ...]`.
    pub out_path: &'a [String],
    /// Value of the reaching edge; `None` for roots.
    pub metadata: Option<&'a Slot<Props>>,
}

/// An edge type expanded from a node.
#[derive(Debug, Clone, Copy)]
pub struct EdgeVisit<'a> {
    pub query: &'a ViewQuery,
    pub from_id: &'a str,
    /// The `fromType/toType` key as written in the view.
    pub edge_types: &'a str,
    /// Location of the edge map: parent node path plus the edge alias.
    pub out_path: &'a [String],
}

/// A tombstoned edge met while expanding an edge type. Its target is not
/// walked.
#[derive(Debug, Clone, Copy)]
pub struct RemovedEdgeVisit<'a> {
    pub query: &'a ViewQuery,
    pub from_id: &'a str,
    pub to_id: &'a str,
    /// The stored edge carrying the tombstone.
    pub edge: &'a EdgeKey,
    /// Where the target would sit in the result tree.
    pub out_path: &'a [String],
}

/// Callbacks of [`do_view_graph`]. All default to no-ops.
pub trait ViewVisitor {
    fn node(&mut self, _visit: &NodeVisit<'_>) {}
    fn edge(&mut self, _visit: &EdgeVisit<'_>) {}
    fn removed_edge(&mut self, _visit: &RemovedEdgeVisit<'_>) {}
}

/// Resolves the targets of one edge type from one node.
pub trait EdgeSource {
    /// Target ids and edge values for `edge_types` leaving `from_id`.
    /// With `reverse` the lookup goes through the reverse-edge index:
    /// the ids returned are sources of stored `to_type -> from_type` edges.
    fn edge_to_ids(
        &self,
        edge_types: &EdgeTypes,
        from_id: &str,
        reverse: bool,
    ) -> BTreeMap<NodeId, Slot<Props>>;
}

impl EdgeSource for Graph {
    fn edge_to_ids(
        &self,
        edge_types: &EdgeTypes,
        from_id: &str,
        reverse: bool,
    ) -> BTreeMap<NodeId, Slot<Props>> {
        let EdgeTypes { from_type, to_type } = edge_types;
        if reverse {
            self.reverse_edges_of(from_type, from_id, to_type)
                .map(|(id, slot)| (id.clone(), slot.clone()))
                .collect()
        } else {
            self.edges_from(from_type, from_id, to_type)
                .map(|(id, slot)| (id.clone(), slot.clone()))
                .collect()
        }
    }
}

impl<S: EdgeSource + ?Sized> EdgeSource for &S {
    fn edge_to_ids(
        &self,
        edge_types: &EdgeTypes,
        from_id: &str,
        reverse: bool,
    ) -> BTreeMap<NodeId, Slot<Props>> {
        (**self).edge_to_ids(edge_types, from_id, reverse)
    }
}

/// The stored edge a traversal step corresponds to.
pub fn stored_edge(edge_types: &EdgeTypes, from_id: &str, to_id: &str, reverse: bool) -> EdgeKey {
    if reverse {
        EdgeKey::new(&edge_types.to_type, to_id, &edge_types.from_type, from_id)
    } else {
        EdgeKey::new(&edge_types.from_type, from_id, &edge_types.to_type, to_id)
    }
}

/// Walk `view` against `source`, reporting every reached node and every
/// expanded edge type to `visitor`.
///
/// Only live edges (marker or metadata) are followed. Tombstoned edges are
/// reported through [`ViewVisitor::removed_edge`] and not walked past. A
/// node reachable along several view paths is reported once per path.
pub fn do_view_graph<S, V>(view: &View, source: &S, visitor: &mut V) -> Result<()>
where
    S: EdgeSource + ?Sized,
    V: ViewVisitor + ?Sized,
{
    let mut edge_path: Vec<String> = Vec::new();
    for (root_id, query) in &view.roots {
        let out_path = vec![query.alias.clone().unwrap_or_else(|| root_id.clone())];
        visitor.node(&NodeVisit {
            query,
            node_id: root_id,
            edge_path: &edge_path,
            edge: None,
            out_path: &out_path,
            metadata: None,
        });
        walk_edges(query, root_id, &mut edge_path, &out_path, source, visitor)?;
    }
    Ok(())
}

fn walk_edges<S, V>(
    query: &ViewQuery,
    node_id: &str,
    edge_path: &mut Vec<String>,
    out_path: &[String],
    source: &S,
    visitor: &mut V,
) -> Result<()>
where
    S: EdgeSource + ?Sized,
    V: ViewVisitor + ?Sized,
{
    for (key, edge_query) in &query.edges {
        let edge_types = EdgeTypes::parse(key)?;
        let mut edge_out = out_path.to_vec();
        edge_out.push(edge_query.alias.clone().unwrap_or_else(|| key.clone()));
        visitor.edge(&EdgeVisit {
            query: edge_query,
            from_id: node_id,
            edge_types: key,
            out_path: &edge_out,
        });

        let targets = source.edge_to_ids(&edge_types, node_id, edge_query.reverse);
        trace!(from = node_id, edge = %key, targets = targets.len(), "expand edge");

        edge_path.push(key.clone());
        for (to_id, metadata) in &targets {
            let edge = stored_edge(&edge_types, node_id, to_id, edge_query.reverse);
            let mut node_out = edge_out.clone();
            node_out.push(to_id.clone());
            match metadata {
                Slot::Unset => continue,
                Slot::Tombstone => {
                    visitor.removed_edge(&RemovedEdgeVisit {
                        query: edge_query,
                        from_id: node_id,
                        to_id,
                        edge: &edge,
                        out_path: &node_out,
                    });
                    continue;
                }
                Slot::Marker | Slot::Data(_) => {}
            }
            visitor.node(&NodeVisit {
                query: edge_query,
                node_id: to_id,
                edge_path: edge_path.as_slice(),
                edge: Some(&edge),
                out_path: &node_out,
                metadata: Some(metadata),
            });
            walk_edges(edge_query, to_id, edge_path, &node_out, source, visitor)?;
        }
        edge_path.pop();
    }
    Ok(())
}
