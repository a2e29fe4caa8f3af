//! Keyed in-memory session registry with creation-on-first-use semantics.
//!
//! The store is the sole owner of `Session` values and the sole
//! synchronization primitive for per-session mutation: `with_session`
//! hands out a scoped exclusive view, so concurrent inbound messages for
//! one session id serialize while different sessions proceed
//! independently. The closure is synchronous, so nothing can hold a
//! session across a suspension point.
//!
//! Sessions are never deleted here; an eviction policy could live behind
//! this same surface without changing callers.

use std::collections::HashMap;
use std::sync::Arc;

use mellivora_core::{Session, SessionId};
use tokio::sync::{Mutex, RwLock};

/// Concurrency-safe registry of all live sessions.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the handle for `id`, creating a default session on first
    /// access.
    async fn get_or_create(&self, id: &SessionId) -> Arc<Mutex<Session>> {
        // Fast path: session already exists.
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(id) {
                return handle.clone();
            }
        }

        // Slow path: insert under the write lock. `entry` re-checks, so
        // two concurrent creators converge on one handle.
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id.clone()))))
            .clone()
    }

    /// Run `f` with exclusive access to the session, creating it first if
    /// needed. Mutations from concurrent callers are serialized per
    /// session id; the map lock is not held while `f` runs.
    pub async fn with_session<F, T>(&self, id: &SessionId, f: F) -> T
    where
        F: FnOnce(&mut Session) -> T,
    {
        let handle = self.get_or_create(id).await;
        let mut session = handle.lock().await;
        f(&mut session)
    }

    /// Read-only snapshot of one session, if it exists.
    pub async fn snapshot(&self, id: &SessionId) -> Option<Session> {
        let handle = {
            let sessions = self.sessions.read().await;
            sessions.get(id).cloned()
        };
        match handle {
            Some(handle) => Some(handle.lock().await.clone()),
            None => None,
        }
    }

    /// Snapshots of every session, for monitoring.
    pub async fn list(&self) -> Vec<Session> {
        let handles: Vec<_> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };

        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.lock().await.clone());
        }
        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        snapshots
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellivora_core::{Evidence, Message, Phase};

    #[tokio::test]
    async fn creates_on_first_use() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        assert!(store.is_empty().await);

        let phase = store.with_session(&id, |s| s.phase).await;
        assert_eq!(phase, Phase::Unevaluated);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn returns_existing_session() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");

        store
            .with_session(&id, |s| s.push(Message::counterparty("hello", 1)))
            .await;
        let count = store.with_session(&id, |s| s.total_messages()).await;

        assert_eq!(count, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_session_is_none() {
        let store = SessionStore::new();
        assert!(store.snapshot(&SessionId::from("nope")).await.is_none());
    }

    #[tokio::test]
    async fn snapshot_is_detached() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        store
            .with_session(&id, |s| s.push(Message::counterparty("one", 1)))
            .await;

        let snap = store.snapshot(&id).await.unwrap();
        store
            .with_session(&id, |s| s.push(Message::counterparty("two", 2)))
            .await;

        assert_eq!(snap.total_messages(), 1);
        assert_eq!(
            store.snapshot(&id).await.unwrap().total_messages(),
            2
        );
    }

    #[tokio::test]
    async fn concurrent_merges_never_interleave() {
        let store = Arc::new(SessionStore::new());
        let id = SessionId::from("contended");

        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                let mut incoming = Evidence::new();
                incoming.phone_numbers.insert(format!("98765432{i:02}"));
                incoming.suspicious_keywords.insert("kyc".into());
                store
                    .with_session(&id, move |s| s.evidence.merge(&incoming))
                    .await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let snap = store.snapshot(&id).await.unwrap();
        // Every merge landed in full: the result equals sequential
        // application in some order, never a partial overlap.
        assert_eq!(snap.evidence.phone_numbers.len(), 32);
        assert_eq!(snap.evidence.suspicious_keywords.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = SessionStore::new();
        store
            .with_session(&SessionId::from("a"), |s| {
                s.push(Message::counterparty("for a", 1))
            })
            .await;
        store
            .with_session(&SessionId::from("b"), |s| s.engage(0.9, "KYC"))
            .await;

        let a = store.snapshot(&SessionId::from("a")).await.unwrap();
        let b = store.snapshot(&SessionId::from("b")).await.unwrap();
        assert_eq!(a.phase, Phase::Unevaluated);
        assert_eq!(b.phase, Phase::Engaged);
        assert_eq!(a.total_messages(), 1);
        assert_eq!(b.total_messages(), 0);
    }

    #[tokio::test]
    async fn list_returns_all_sessions() {
        let store = SessionStore::new();
        for name in ["s1", "s2", "s3"] {
            store.with_session(&SessionId::from(name), |_| ()).await;
        }
        assert_eq!(store.list().await.len(), 3);
    }
}
