//! Three-valued leaf values.
//!
//! Every addressable location of a [`Graph`](crate::Graph) holds a [`Slot`].
//! A location that is not present in its map carries no opinion at that
//! layer; a present location is one of:
//!
//! | JSON     | Slot             | Meaning                                   |
//! |----------|------------------|-------------------------------------------|
//! | object   | `Data(T)`        | concrete value (node props, metadata, ...) |
//! | `true`   | `Marker`         | exists, no data                           |
//! | `false`  | `Tombstone`      | explicitly absent / deleted               |
//! | `null`   | `Unset`          | deletion instruction for overwrite merges |

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{FileEntry, Props};

/// A leaf value with explicit absence, tombstone and marker cases.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Explicitly unset. Only carried by transient graphs that feed an
    /// overwrite merge, where it removes the path from the result.
    Unset,
    /// Explicit `false`.
    Tombstone,
    /// Explicit `true`.
    Marker,
    /// A concrete value.
    Data(T),
}

impl<T> Slot<T> {
    /// Marker or data: the element exists at this layer.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Marker | Self::Data(_))
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Borrow the concrete value, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Slot<&T> {
        match self {
            Self::Unset => Slot::Unset,
            Self::Tombstone => Slot::Tombstone,
            Self::Marker => Slot::Marker,
            Self::Data(value) => Slot::Data(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Slot<U> {
        match self {
            Self::Unset => Slot::Unset,
            Self::Tombstone => Slot::Tombstone,
            Self::Marker => Slot::Marker,
            Self::Data(value) => Slot::Data(f(value)),
        }
    }

    /// The three-valued boolean view: `Some(true)` for live, `Some(false)`
    /// for a tombstone, `None` when unset.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Unset => None,
            Self::Tombstone => Some(false),
            Self::Marker | Self::Data(_) => Some(true),
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Marker
        } else {
            Self::Tombstone
        }
    }
}

impl<T: Serialize> Slot<T> {
    /// JSON form of the slot, as it appears on the wire.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        Ok(match self {
            Self::Unset => Value::Null,
            Self::Tombstone => Value::Bool(false),
            Self::Marker => Value::Bool(true),
            Self::Data(value) => serde_json::to_value(value)?,
        })
    }
}

impl<T: Serialize> Serialize for Slot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_unit(),
            Self::Tombstone => serializer.serialize_bool(false),
            Self::Marker => serializer.serialize_bool(true),
            Self::Data(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Slot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::Unset),
            Value::Bool(false) => Ok(Self::Tombstone),
            Value::Bool(true) => Ok(Self::Marker),
            other => T::deserialize(other)
                .map(Self::Data)
                .map_err(de::Error::custom),
        }
    }
}

/// Uninhabited payload for leaves that are booleans only (rights flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Never {}

impl Serialize for Never {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        match *self {}
    }
}

impl<'de> Deserialize<'de> for Never {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(de::Error::custom("expected a boolean flag"))
    }
}

/// A rights flag: `true`, `false` or unset.
pub type Flag = Slot<Never>;

/// Payloads that can sit inside [`Slot::Data`].
pub trait SlotData: Clone + PartialEq {
    /// Combine two concrete values in an additive merge. `priority` wins
    /// on conflict. Replaces outright unless the payload is key-wise.
    fn combine(priority: &Self, _other: &Self) -> Self {
        priority.clone()
    }
}

impl SlotData for Props {
    fn combine(priority: &Self, other: &Self) -> Self {
        deep_merge(priority, other)
    }
}

impl SlotData for String {}

impl SlotData for FileEntry {}

impl SlotData for Never {}

/// Key-wise recursive merge of two property bags; `priority` wins on
/// every non-object conflict.
pub fn deep_merge(priority: &Props, other: &Props) -> Props {
    let mut merged = other.clone();
    for (key, value) in priority {
        let next = match (value, merged.get(key)) {
            (Value::Object(p), Some(Value::Object(o))) => Value::Object(deep_merge(p, o)),
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}
