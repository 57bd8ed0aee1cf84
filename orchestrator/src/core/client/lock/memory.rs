use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::error::LockError;
use super::{LockClient, LockResult};

struct LockEntry {
    owner: String,
    expires_at: Instant,
}

/// Process-local lock table. Expired entries are treated as free.
#[derive(Default)]
pub struct InMemoryLock {
    locks: Mutex<HashMap<String, LockEntry>>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockClient for InMemoryLock {
    async fn acquire_lock(&self, key: &str, owner: &str, expiry_seconds: u64) -> Result<LockResult, LockError> {
        let now = Instant::now();
        let mut locks = self.locks.lock().await;
        if let Some(entry) = locks.get(key) {
            if entry.expires_at > now && entry.owner != owner {
                return Ok(LockResult::AlreadyHeld(entry.owner.clone()));
            }
        }
        locks.insert(
            key.to_string(),
            LockEntry { owner: owner.to_string(), expires_at: now + Duration::from_secs(expiry_seconds) },
        );
        debug!(key = %key, owner = %owner, "Lock acquired");
        Ok(LockResult::Acquired)
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError> {
        let mut locks = self.locks.lock().await;
        match locks.get(key) {
            None => Ok(LockResult::NotFound),
            Some(entry) if entry.expires_at <= Instant::now() => {
                locks.remove(key);
                Ok(LockResult::NotFound)
            }
            Some(entry) if entry.owner != owner => Err(LockError::NotOwner {
                key: key.to_string(),
                owner: entry.owner.clone(),
                requester: owner.to_string(),
            }),
            Some(_) => {
                locks.remove(key);
                debug!(key = %key, owner = %owner, "Lock released");
                Ok(LockResult::Released)
            }
        }
    }

    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError> {
        let locks = self.locks.lock().await;
        Ok(locks.get(key).filter(|entry| entry.expires_at > Instant::now()).map(|entry| entry.owner.clone()))
    }
}
