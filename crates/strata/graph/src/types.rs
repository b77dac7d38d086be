use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GraphError;

/// Node identifier. Stable for the lifetime of the node.
pub type NodeId = String;

/// Free-form property bag used for nodes and edge metadata.
pub type Props = serde_json::Map<String, Value>;

/// Full address of an edge: `(fromType, fromId, toType, toId)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeKey {
    pub from_type: String,
    pub from_id: NodeId,
    pub to_type: String,
    pub to_id: NodeId,
}

impl EdgeKey {
    pub fn new(
        from_type: impl Into<String>,
        from_id: impl Into<NodeId>,
        to_type: impl Into<String>,
        to_id: impl Into<NodeId>,
    ) -> Self {
        Self {
            from_type: from_type.into(),
            from_id: from_id.into(),
            to_type: to_type.into(),
            to_id: to_id.into(),
        }
    }

    /// The same edge, addressed from its target.
    pub fn reversed(&self) -> ReverseEdgeKey {
        ReverseEdgeKey {
            to_type: self.to_type.clone(),
            to_id: self.to_id.clone(),
            from_type: self.from_type.clone(),
            from_id: self.from_id.clone(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} -> {}/{}",
            self.from_type, self.from_id, self.to_type, self.to_id
        )
    }
}

/// Address of an entry in the reverse-edge index:
/// `(toType, toId, fromType, fromId)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReverseEdgeKey {
    pub to_type: String,
    pub to_id: NodeId,
    pub from_type: String,
    pub from_id: NodeId,
}

impl ReverseEdgeKey {
    /// The forward edge this index entry mirrors.
    pub fn forward(&self) -> EdgeKey {
        EdgeKey {
            from_type: self.from_type.clone(),
            from_id: self.from_id.clone(),
            to_type: self.to_type.clone(),
            to_id: self.to_id.clone(),
        }
    }
}

/// Who a rights entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// Keyed by user email.
    User,
    /// Keyed by role name.
    Role,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
        }
    }
}

impl FromStr for PrincipalKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "role" => Ok(Self::Role),
            other => Err(GraphError::InvalidPath(format!(
                "unknown principal kind: {other}"
            ))),
        }
    }
}

/// One of the three independent rights flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    Read,
    Write,
    Admin,
}

impl Right {
    pub const ALL: [Right; 3] = [Right::Read, Right::Write, Right::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Right {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            other => Err(GraphError::InvalidPath(format!("unknown right: {other}"))),
        }
    }
}

/// Address of a single rights flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RightKey {
    pub node_id: NodeId,
    pub kind: PrincipalKind,
    pub principal: String,
    pub right: Right,
}

impl RightKey {
    pub fn user(node_id: impl Into<NodeId>, email: impl Into<String>, right: Right) -> Self {
        Self {
            node_id: node_id.into(),
            kind: PrincipalKind::User,
            principal: email.into(),
            right,
        }
    }

    pub fn role(node_id: impl Into<NodeId>, role: impl Into<String>, right: Right) -> Self {
        Self {
            node_id: node_id.into(),
            kind: PrincipalKind::Role,
            principal: role.into(),
            right,
        }
    }
}

/// Rights to write for one principal; `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
}

impl RightFlags {
    pub fn get(&self, right: Right) -> Option<bool> {
        match right {
            Right::Read => self.read,
            Right::Write => self.write,
            Right::Admin => self.admin,
        }
    }

    pub fn set(&mut self, right: Right, value: Option<bool>) {
        match right {
            Right::Read => self.read = value,
            Right::Write => self.write = value,
            Right::Admin => self.admin = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_none() && self.write.is_none() && self.admin.is_none()
    }
}

/// All rights of one node, grouped by principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRights {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user: BTreeMap<String, RightFlags>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub role: BTreeMap<String, RightFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_from: Option<NodeId>,
}

impl NodeRights {
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.role.is_empty() && self.inherit_from.is_none()
    }

    pub fn principal(&self, kind: PrincipalKind, principal: &str) -> Option<&RightFlags> {
        match kind {
            PrincipalKind::User => self.user.get(principal),
            PrincipalKind::Role => self.role.get(principal),
        }
    }
}

/// Address of a file entry: one per node per property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileKey {
    pub node_id: NodeId,
    pub prop: String,
}

impl FileKey {
    pub fn new(node_id: impl Into<NodeId>, prop: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            prop: prop.into(),
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.prop)
    }
}

/// A file attached to a node property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
    /// Awaiting upload; written locally by `set_file`.
    Upload(PendingUpload),
    /// Stored remotely and downloadable.
    Remote(RemoteFile),
}

impl FileEntry {
    pub fn as_upload(&self) -> Option<&PendingUpload> {
        match self {
            Self::Upload(upload) => Some(upload),
            Self::Remote(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpload {
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edge_key_reverses_and_back() {
        let key = EdgeKey::new("todo", "t1", "user", "u1");
        let rev = key.reversed();
        assert_eq!(rev.to_type, "user");
        assert_eq!(rev.from_id, "t1");
        assert_eq!(rev.forward(), key);
    }

    #[test]
    fn file_entry_untagged_forms() {
        let upload: FileEntry = serde_json::from_value(json!({
            "filename": "a.png", "contentType": "image/png", "fileSize": 12
        }))
        .unwrap();
        assert!(upload.as_upload().is_some());

        let remote: FileEntry = serde_json::from_value(json!({
            "url": "https://files/a.png", "etag": "x", "contentType": "image/png",
            "modifiedDate": "2024-01-01"
        }))
        .unwrap();
        assert!(matches!(remote, FileEntry::Remote(_)));
    }

    #[test]
    fn rights_parse() {
        assert_eq!("admin".parse::<Right>().unwrap(), Right::Admin);
        assert!("owner".parse::<Right>().is_err());
        assert_eq!("role".parse::<PrincipalKind>().unwrap(), PrincipalKind::Role);
    }

    #[test]
    fn right_flags_get_set() {
        let mut flags = RightFlags::default();
        assert!(flags.is_empty());
        flags.set(Right::Write, Some(true));
        assert_eq!(flags.get(Right::Write), Some(true));
        assert_eq!(flags.get(Right::Read), None);
    }
}
