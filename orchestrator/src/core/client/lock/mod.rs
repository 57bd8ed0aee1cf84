pub mod error;
pub mod memory;

use async_trait::async_trait;
use error::LockError;

/// Result of lock acquisition attempts
#[derive(Debug, Clone, PartialEq)]
pub enum LockResult {
    Acquired,
    AlreadyHeld(String), // Contains current owner
    Released,
    NotFound,
}

/// Expiring named locks, used to keep a job with a single executor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Acquire a lock if it is available or its previous holder let it expire
    async fn acquire_lock(&self, key: &str, owner: &str, expiry_seconds: u64) -> Result<LockResult, LockError>;

    /// Release a lock if owned by the specified owner
    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError>;

    /// Check if a lock exists and get its current owner
    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError>;
}

/// Key of the execution lock of a job
pub fn job_lock_key(id: &uuid::Uuid) -> String {
    format!("job:{}", id)
}
