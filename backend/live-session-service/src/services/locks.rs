//! Per-session lock registry
//!
//! Every read-modify-write of a session's mutable state (status, viewer
//! counts, totals) runs under that session's lock; operations on different
//! sessions never contend. Locks are held only around local store mutations,
//! never across collaborator I/O.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, session_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
