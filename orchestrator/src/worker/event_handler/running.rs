use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Cancellation tokens of the attempts executing in this process, keyed by job id.
#[derive(Default)]
pub struct RunningJobs {
    tokens: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl RunningJobs {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
        // The map stays consistent even if a holder panicked, every operation is a single call.
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an attempt of job `id`. The registration ends when the guard is dropped.
    pub fn register(&self, id: Uuid) -> RunningJobGuard<'_> {
        let token = CancellationToken::new();
        self.tokens().insert(id, token.clone());
        RunningJobGuard { jobs: self, id, token }
    }

    /// Signals the attempt of job `id` to stop. Returns false if no attempt is running here.
    pub fn cancel(&self, id: &Uuid) -> bool {
        match self.tokens().get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: &Uuid) -> bool {
        self.tokens().contains_key(id)
    }
}

pub struct RunningJobGuard<'a> {
    jobs: &'a RunningJobs,
    id: Uuid,
    token: CancellationToken,
}

impl RunningJobGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RunningJobGuard<'_> {
    fn drop(&mut self) {
        self.jobs.tokens().remove(&self.id);
    }
}
