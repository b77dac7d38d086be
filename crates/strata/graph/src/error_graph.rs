use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::path::{insert_nested, GraphPath};

/// Remote rejected a write for lack of write rights.
pub const NO_WRITE_RIGHT: &str = "NoWriteRightError";
/// Remote rejected a rights change for lack of admin rights.
pub const NO_ADMIN_RIGHT: &str = "NoAdminRightError";
/// The push result carried no status for an element.
pub const MISSING_STATUS: &str = "MissingStatus";

/// A rejected element as recorded in an [`ErrorGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementError {
    pub status_code: u16,
    pub name: String,
    /// The element as it was pushed.
    pub element: Value,
}

/// Per-element push failures, addressed like graph leaves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorGraph {
    entries: BTreeMap<GraphPath, ElementError>,
}

impl ErrorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, path: GraphPath, error: ElementError) {
        self.entries.insert(path, error);
    }

    pub fn get(&self, path: &GraphPath) -> Option<&ElementError> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &GraphPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GraphPath, &ElementError)> {
        self.entries.iter()
    }

    /// Fold `other` in; its entries replace existing ones at the same path.
    pub fn merge(&mut self, other: ErrorGraph) {
        self.entries.extend(other.entries);
    }

    /// Nested JSON shape, mirroring the graph wire shape.
    pub fn to_value(&self) -> Result<Value> {
        let mut root = Map::new();
        for (path, error) in &self.entries {
            let leaf = serde_json::to_value(error)?;
            insert_nested(&mut root, &path.segments(), leaf);
        }
        Ok(Value::Object(root))
    }
}

impl Serialize for ErrorGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}
