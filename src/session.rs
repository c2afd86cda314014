//! Per-user session state.
//!
//! Catalog and wizard code read and write session values through the
//! `SessionStore` trait so they never depend on how sessions are kept.
//! `SessionRegistry` keeps one `MemorySession` per issued session id; handlers
//! take a snapshot, work on it, and write it back (last write wins). Only ids
//! handed out by `create` are ever stored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Key-value storage scoped to one user session
pub trait SessionStore {
    fn get_value(&self, key: &str) -> Option<Value>;

    fn set_value(&mut self, key: &str, value: Value);

    /// Remove a key, returning the previous value
    fn delete(&mut self, key: &str) -> Option<Value>;

    fn keys(&self) -> Vec<String>;
}

/// Typed accessors on top of `SessionStore`
pub trait SessionStoreExt: SessionStore {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.get_value(key).map(serde_json::from_value).transpose()
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value);
        Ok(())
    }
}

impl<S: SessionStore + ?Sized> SessionStoreExt for S {}

/// Session held in process memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySession {
    values: HashMap<String, Value>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// All live sessions, keyed by session id
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, MemorySession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new empty session and return its id
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(id.clone(), MemorySession::new());
        id
    }

    /// Snapshot of a session, or `None` for ids never issued or already removed
    pub async fn load(&self, id: &str) -> Option<MemorySession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Write a snapshot back over a live session.
    ///
    /// Returns `false` and drops the snapshot when the session was removed in
    /// the meantime.
    pub async fn store(&self, id: &str, session: MemorySession) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(slot) => {
                *slot = session;
                true
            }
            None => false,
        }
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn remove(&self, id: &str) -> Option<MemorySession> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
