//! Recently used applications.
//!
//! A bounded move-to-front queue of package ids kept in the session. Ids are
//! recorded without checking the catalog; stale ones are pruned when the
//! queue is read.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::api::{Package, PackageClient};
use crate::error::DashboardError;
use crate::session::{SessionStore, SessionStoreExt};

/// Session key holding the id list, most recent first
pub const LATEST_APPS_KEY: &str = "latest_apps";

/// Default capacity of the queue
pub const LATEST_APPS_QUEUE_LIMIT: usize = 6;

/// Ordered set of ids with a fixed capacity, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentQueue {
    capacity: usize,
    ids: VecDeque<String>,
}

impl RecentQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Rebuild from a stored id list, dropping duplicates and overflow
    pub fn from_ids(ids: impl IntoIterator<Item = String>, capacity: usize) -> Self {
        let mut queue = Self::new(capacity);
        for id in ids {
            if queue.ids.len() >= capacity {
                break;
            }
            if !queue.contains(&id) {
                queue.ids.push_back(id);
            }
        }
        queue
    }

    /// Put `id` at the front, moving it if already present
    pub fn push_front(&mut self, id: &str) {
        if let Some(pos) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(pos);
        }
        self.ids.push_front(id.to_string());
        while self.ids.len() > self.capacity {
            self.ids.pop_back();
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.ids.retain(keep);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

/// Tracker for the session's recently used applications
#[derive(Debug, Clone, Copy)]
pub struct RecentApps {
    capacity: usize,
}

impl Default for RecentApps {
    fn default() -> Self {
        Self::new(LATEST_APPS_QUEUE_LIMIT)
    }
}

impl RecentApps {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Current queue as stored in the session
    pub fn load<S: SessionStore + ?Sized>(&self, store: &S) -> Result<RecentQueue, DashboardError> {
        let ids: Vec<String> = store
            .get(LATEST_APPS_KEY)
            .map_err(|e| DashboardError::session(LATEST_APPS_KEY, e))?
            .unwrap_or_default();
        Ok(RecentQueue::from_ids(ids, self.capacity))
    }

    fn save<S: SessionStore + ?Sized>(
        &self,
        store: &mut S,
        queue: &RecentQueue,
    ) -> Result<(), DashboardError> {
        store
            .set(LATEST_APPS_KEY, &queue.to_vec())
            .map_err(|e| DashboardError::session(LATEST_APPS_KEY, e))
    }

    /// Record that `app_id` was just added to an environment
    pub fn record<S: SessionStore + ?Sized>(
        &self,
        store: &mut S,
        app_id: &str,
    ) -> Result<(), DashboardError> {
        let mut queue = self.load(store)?;
        queue.push_front(app_id);
        self.save(store, &queue)
    }

    /// Fetch the recorded packages, pruning ids the catalog no longer knows.
    ///
    /// Only `NotFound` is swallowed; any other catalog error propagates and
    /// leaves the stored queue untouched.
    pub async fn list_valid<S>(
        &self,
        store: &mut S,
        packages: &dyn PackageClient,
    ) -> Result<Vec<Package>, DashboardError>
    where
        S: SessionStore + Send + ?Sized,
    {
        let queue = self.load(store)?;
        let mut apps = Vec::with_capacity(queue.len());

        for app_id in queue.iter() {
            match packages.get(app_id).await {
                Ok(app) => apps.push(app),
                Err(e) if e.is_not_found() => {
                    debug!("Dropping deleted application {} from recent apps", app_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let cleaned =
            RecentQueue::from_ids(apps.iter().map(|app| app.id.clone()), self.capacity);
        self.save(store, &cleaned)?;
        Ok(apps)
    }
}
