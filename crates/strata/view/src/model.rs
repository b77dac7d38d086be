use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_graph::NodeId;

use crate::error::{Result, ViewError};

/// Placeholder replaced by the node id when a role is sent to the remote.
pub const NODE_ID_PLACEHOLDER: &str = "$NODEID";

/// Which sub-elements of a reached node to include. Missing flags mean
/// "not included".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Include {
    pub node: bool,
    pub edges: bool,
    pub metadata: bool,
    pub rights: bool,
    pub files: bool,
}

/// One query in a view tree: a root node view or a nested edge view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewQuery {
    /// Output key replacing the node id (roots) or the edge type key.
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Remote-only; `$NODEID` is substituted before sending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Resolve through the reverse-edge index.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reverse: bool,
    pub include: Include,
    /// Nested edge views keyed by `fromType/toType`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub edges: BTreeMap<String, ViewQuery>,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }

    pub fn edge(mut self, edge_types: impl Into<String>, query: ViewQuery) -> Self {
        self.edges.insert(edge_types.into(), query);
        self
    }

    /// The role with `$NODEID` replaced by `node_id`.
    pub fn resolved_role(&self, node_id: &str) -> Option<String> {
        self.role
            .as_ref()
            .map(|role| role.replace(NODE_ID_PLACEHOLDER, node_id))
    }

    fn validate(&self) -> Result<()> {
        for (key, nested) in &self.edges {
            EdgeTypes::parse(key)?;
            nested.validate()?;
        }
        Ok(())
    }
}

/// A view: root node ids mapped to their queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct View {
    pub roots: BTreeMap<NodeId, ViewQuery>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, node_id: impl Into<NodeId>, query: ViewQuery) -> Self {
        self.roots.insert(node_id.into(), query);
        self
    }

    /// Decode a view, failing fast on non-object input or malformed edge keys.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ViewError::NotAnObject(json_kind(&value)));
        }
        let view: View = serde_json::from_value(value)?;
        view.validate()?;
        Ok(view)
    }

    /// Every edge key in the tree parses as `fromType/toType`.
    pub fn validate(&self) -> Result<()> {
        self.roots.values().try_for_each(ViewQuery::validate)
    }

    /// Copy with root roles resolved against their node ids, as sent to
    /// the remote.
    pub fn with_resolved_roles(&self) -> View {
        let roots = self
            .roots
            .iter()
            .map(|(id, query)| {
                let mut query = query.clone();
                query.role = query.resolved_role(id);
                (id.clone(), query)
            })
            .collect();
        View { roots }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parsed `fromType/toType` edge-view key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeTypes {
    pub from_type: String,
    pub to_type: String,
}

impl EdgeTypes {
    pub fn new(from_type: impl Into<String>, to_type: impl Into<String>) -> Self {
        Self {
            from_type: from_type.into(),
            to_type: to_type.into(),
        }
    }

    pub fn parse(key: &str) -> Result<Self> {
        match key.split_once('/') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() && !to.contains('/') => {
                Ok(Self::new(from, to))
            }
            _ => Err(ViewError::MalformedEdgeType(key.to_string())),
        }
    }
}

impl fmt::Display for EdgeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from_type, self.to_type)
    }
}
