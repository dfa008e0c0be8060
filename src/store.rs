//! Per-id document stores.
//!
//! Each store keeps one record kind behind a single `RwLock<HashMap>`. The
//! write lock is the per-document atomicity unit: `update` runs its closure
//! while the lock is held, so concurrent writers to the same document cannot
//! lose updates. Cross-store consistency is best-effort only.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::ApiError;

#[derive(Clone)]
pub struct DocStore<T> {
    /// Resource name used in NotFound/Conflict messages ("User", "Quiz", ...).
    kind: &'static str,
    docs: Arc<RwLock<HashMap<String, T>>>,
}

impl<T: Clone> DocStore<T> {
    pub fn new(kind: &'static str) -> Self {
        Self::from_map(kind, HashMap::new())
    }

    /// Wrap an already-populated map (seed/bank content assembled at startup).
    pub fn from_map(kind: &'static str, docs: HashMap<String, T>) -> Self {
        Self {
            kind,
            docs: Arc::new(RwLock::new(docs)),
        }
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.docs.read().await.get(id).cloned()
    }

    /// Like `get`, but resolves a missing id to the taxonomy error.
    pub async fn get_or_not_found(&self, id: &str) -> Result<T, ApiError> {
        self.get(id).await.ok_or(ApiError::NotFound(self.kind))
    }

    pub async fn list(&self) -> Vec<T> {
        self.docs.read().await.values().cloned().collect()
    }

    /// Strict insert: a second document under the same id is a conflict.
    pub async fn insert(&self, id: &str, doc: T) -> Result<(), ApiError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(id) {
            return Err(ApiError::Conflict(format!(
                "{} with id {id} already exists",
                self.kind
            )));
        }
        docs.insert(id.to_string(), doc);
        Ok(())
    }

    /// Insert-or-replace, for callers with upsert semantics (preferences).
    pub async fn upsert(&self, id: &str, doc: T) {
        self.docs.write().await.insert(id.to_string(), doc);
    }

    /// Atomic read-modify-write on one document. The closure runs under the
    /// write lock; its return value is handed back to the caller.
    pub async fn update<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, ApiError> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(id) {
            Some(doc) => Ok(f(doc)),
            None => Err(ApiError::NotFound(self.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = DocStore::new("Quiz");
        store.insert("q1", 1u32).await.expect("first insert");
        let err = store.insert("q1", 2u32).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        // The original document survives the rejected insert.
        assert_eq!(store.get("q1").await, Some(1));
    }

    #[tokio::test]
    async fn update_is_read_modify_write_on_one_document() {
        let store = DocStore::new("User");
        store.insert("u1", 10u32).await.unwrap();
        let after = store.update("u1", |v| { *v += 5; *v }).await.unwrap();
        assert_eq!(after, 15);
        assert_eq!(store.get("u1").await, Some(15));
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found() {
        let store: DocStore<u32> = DocStore::new("User");
        let err = store.update("ghost", |_| ()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("User")));
    }

    #[tokio::test]
    async fn concurrent_updates_do_not_lose_increments() {
        let store = DocStore::new("User");
        store.insert("u1", 0u32).await.unwrap();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let s = store.clone();
            handles.push(tokio::spawn(async move {
                s.update("u1", |v| *v += 1).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.get("u1").await, Some(50));
    }
}
