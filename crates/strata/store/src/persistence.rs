//! Durable key/value atoms.
//!
//! The store does not persist graphs itself. Small values such as session
//! tokens are saved through an [`AtomStore`] so they survive restarts.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::PersistenceConfig;
use crate::error::{Result, StoreError};

/// Get, set and remove JSON values under string keys.
#[async_trait]
pub trait AtomStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory atom storage for development and testing.
#[derive(Clone, Default)]
pub struct InMemoryAtomStore {
    atoms: Arc<DashMap<String, Value>>,
}

impl InMemoryAtomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[async_trait]
impl AtomStore for InMemoryAtomStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.atoms.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.atoms.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.atoms.remove(key);
        Ok(())
    }
}

/// Typed access to an [`AtomStore`] under a key prefix.
pub struct Atoms<A: ?Sized> {
    prefix: String,
    backend: Arc<A>,
}

impl<A: AtomStore + ?Sized> Atoms<A> {
    pub fn new(backend: Arc<A>, config: &PersistenceConfig) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            backend,
        }
    }

    fn key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(&self.key(key)).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Persistence(format!("atom {key}: {e}"))),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| StoreError::Persistence(format!("atom {key}: {e}")))?;
        self.backend.set(&self.key(key), value).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(&self.key(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        token: String,
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let store = InMemoryAtomStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_typed_atoms_are_prefixed() {
        let backend = Arc::new(InMemoryAtomStore::new());
        let atoms = Atoms::new(Arc::clone(&backend), &PersistenceConfig::default());

        let session = Session { token: "t-1".into() };
        atoms.set("session", &session).await.unwrap();

        assert_eq!(backend.get("strata:session").await.unwrap(), Some(json!({"token": "t-1"})));
        assert_eq!(atoms.get::<Session>("session").await.unwrap(), Some(session));

        backend.set("strata:bad", json!(3)).await.unwrap();
        assert!(matches!(
            atoms.get::<Session>("bad").await,
            Err(StoreError::Persistence(_))
        ));
    }
}
