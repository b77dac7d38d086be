use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;
use strata_graph::{ErrorGraph, FileKey, Graph};

/// Name of the committed base graph. Only merges write to it.
pub const MAIN: &str = "main";

/// Progress of one file transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    InProgress,
    Complete,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadState {
    /// Fraction transferred, `0.0..=1.0`.
    pub progress: f64,
    pub status: UploadStatus,
}

/// Everything stored under one graph name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphState {
    pub graph: Graph,
    /// Elements the remote rejected on the last push of this graph.
    pub errors: ErrorGraph,
    pub vars: BTreeMap<String, Value>,
    /// File contents waiting for a push, keyed like the graph's file leaves.
    pub blobs: BTreeMap<FileKey, Bytes>,
    pub uploads: BTreeMap<FileKey, UploadState>,
}

impl GraphState {
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
            && self.errors.is_empty()
            && self.vars.is_empty()
            && self.blobs.is_empty()
            && self.uploads.is_empty()
    }
}

/// All named graphs. Graph names that were never written read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    graphs: BTreeMap<String, GraphState>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph_state(&self, name: &str) -> Option<&GraphState> {
        self.graphs.get(name)
    }

    pub fn graph(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name).map(|s| &s.graph)
    }

    pub fn errors(&self, name: &str) -> Option<&ErrorGraph> {
        self.graphs.get(name).map(|s| &s.errors)
    }

    pub fn var(&self, graph: &str, name: &str) -> Option<&Value> {
        self.graphs.get(graph).and_then(|s| s.vars.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.graphs.keys()
    }

    pub(crate) fn graph_state_mut(&mut self, name: &str) -> &mut GraphState {
        self.graphs.entry(name.to_string()).or_default()
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<GraphState> {
        self.graphs.remove(name)
    }
}

impl FromIterator<(String, Graph)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Graph)>>(iter: I) -> Self {
        let graphs = iter
            .into_iter()
            .map(|(name, graph)| {
                (
                    name,
                    GraphState {
                        graph,
                        ..GraphState::default()
                    },
                )
            })
            .collect();
        Self { graphs }
    }
}
