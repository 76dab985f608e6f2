//! In-memory session store keyed by conversation.
//!
//! `SessionStore` is a `DashMap` of per-conversation async mutexes. Holding
//! the guard returned by [`SessionStore::lock`] is the only way to read or
//! mutate a session, so inputs for one conversation are applied one at a
//! time while different conversations proceed in parallel. The `DashMap`
//! shard lock is never held across an `.await`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mintbot_types::session::{ConversationId, Session};

/// Exclusive access to one conversation's slot. `None` means idle.
pub type SessionGuard = OwnedMutexGuard<Option<Session>>;

/// Thread-safe session store. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<ConversationId, Arc<Mutex<Option<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the slot for `id`, waiting for any in-flight input on the same
    /// conversation to finish.
    pub async fn lock(&self, id: ConversationId) -> SessionGuard {
        let slot = self
            .inner
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .value()
            .clone();
        slot.lock_owned().await
    }

    /// Cloned snapshot of the session for `id`, if one is active.
    pub async fn get(&self, id: ConversationId) -> Option<Session> {
        let slot = self.inner.get(&id).map(|r| r.value().clone())?;
        let guard = slot.lock().await;
        guard.clone()
    }

    /// Number of conversation slots currently tracked (including idle ones
    /// not yet swept).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop idle slots and sessions inactive for longer than `max_idle`.
    ///
    /// Slots that are locked, or that another task is about to lock, are
    /// left alone; a session is never removed mid-operation. Returns the
    /// number of slots removed.
    pub fn sweep(&self, max_idle: Option<Duration>) -> usize {
        let cutoff = max_idle.map(|idle| Utc::now() - idle);
        let keys: Vec<ConversationId> = self.inner.iter().map(|r| *r.key()).collect();

        let mut removed = 0;
        for key in keys {
            let evicted = self.inner.remove_if(&key, |_, slot| {
                // Only the map holds the Arc: nobody is waiting on it.
                if Arc::strong_count(slot) != 1 {
                    return false;
                }
                match slot.try_lock() {
                    Ok(guard) => match (guard.as_ref(), cutoff) {
                        (None, _) => true,
                        (Some(session), Some(cutoff)) => session.last_activity < cutoff,
                        (Some(_), None) => false,
                    },
                    Err(_) => false,
                }
            });
            if evicted.is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, remaining = self.len(), "swept session slots");
        }
        removed
    }

    /// Run [`SessionStore::sweep`] every `every` until `cancel` fires.
    pub fn spawn_sweeper(
        &self,
        every: std::time::Duration,
        max_idle: Option<Duration>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        store.sweep(max_idle);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use mintbot_types::session::SessionState;

    use super::*;

    #[tokio::test]
    async fn test_lock_starts_idle() {
        let store = SessionStore::new();
        let guard = store.lock(ConversationId(1)).await;
        assert!(guard.is_none());
    }

    #[tokio::test]
    async fn test_write_through_guard_is_visible() {
        let store = SessionStore::new();
        {
            let mut guard = store.lock(ConversationId(1)).await;
            *guard = Some(Session::new(ConversationId(1), SessionState::CollectingName));
        }
        let session = store.get(ConversationId(1)).await.unwrap();
        assert_eq!(session.state, SessionState::CollectingName);
        assert!(store.get(ConversationId(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let store = SessionStore::new();
        let guard = store.lock(ConversationId(1)).await;

        let contender = store.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.lock(ConversationId(1)).await;
        });

        tokio::time::sleep(StdDuration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(StdDuration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_conversations_do_not_block() {
        let store = SessionStore::new();
        let _first = store.lock(ConversationId(1)).await;
        let second = tokio::time::timeout(StdDuration::from_millis(100), store.lock(ConversationId(2))).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_sweep_removes_idle_slots_only() {
        let store = SessionStore::new();
        drop(store.lock(ConversationId(1)).await);
        {
            let mut guard = store.lock(ConversationId(2)).await;
            *guard = Some(Session::new(ConversationId(2), SessionState::CollectingName));
        }

        assert_eq!(store.sweep(None), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(ConversationId(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_expires_inactive_sessions() {
        let store = SessionStore::new();
        {
            let mut guard = store.lock(ConversationId(3)).await;
            let mut session = Session::new(ConversationId(3), SessionState::CollectingSupply);
            session.last_activity = Utc::now() - Duration::minutes(30);
            *guard = Some(session);
        }

        assert_eq!(store.sweep(Some(Duration::minutes(60))), 0);
        assert_eq!(store.sweep(Some(Duration::minutes(10))), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let store = SessionStore::new();
        drop(store.lock(ConversationId(9)).await);

        let cancel = CancellationToken::new();
        let handle = store.spawn_sweeper(StdDuration::from_millis(5), None, cancel.clone());
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        assert!(store.is_empty());

        cancel.cancel();
        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_skips_locked_sessions() {
        let store = SessionStore::new();
        let mut guard = store.lock(ConversationId(4)).await;
        let mut session = Session::new(ConversationId(4), SessionState::AwaitingSecret);
        session.last_activity = Utc::now() - Duration::hours(5);
        *guard = Some(session);

        assert_eq!(store.sweep(Some(Duration::minutes(1))), 0);
        drop(guard);
        assert_eq!(store.sweep(Some(Duration::minutes(1))), 1);
    }
}
