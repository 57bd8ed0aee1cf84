use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use strum::IntoEnumIterator;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace};
use uuid::Uuid;

use super::error::QueueError;
use super::QueueClient;
use crate::types::queue::{JobQueueMessage, QueueType};

#[derive(Default)]
struct QueueContents {
    ready: VecDeque<JobQueueMessage>,
    /// Delayed messages per job id, not yet visible
    delayed: HashMap<Uuid, usize>,
    /// Delayed messages whose job was removed while they were waiting
    dropped: HashMap<Uuid, usize>,
}

#[derive(Default)]
struct QueueState {
    contents: Mutex<QueueContents>,
    notify: Notify,
}

impl QueueState {
    async fn push(&self, message: JobQueueMessage) {
        self.contents.lock().await.ready.push_back(message);
        self.notify.notify_one();
    }
}

/// In-process queue with one FIFO per [`QueueType`].
pub struct InMemoryQueue {
    queues: HashMap<QueueType, Arc<QueueState>>,
    closed: Arc<AtomicBool>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        let queues = QueueType::iter().map(|queue| (queue, Arc::new(QueueState::default()))).collect();
        Self { queues, closed: Arc::new(AtomicBool::new(false)) }
    }

    fn state(&self, queue: QueueType) -> Result<&Arc<QueueState>, QueueError> {
        self.queues.get(&queue).ok_or_else(|| QueueError::ErrorFromQueueError(format!("unknown queue {}", queue)))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn send_message(
        &self,
        queue: QueueType,
        message: JobQueueMessage,
        delay: Option<Duration>,
    ) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::QueueClosed(queue));
        }
        let state = self.state(queue)?.clone();

        match delay.filter(|d| !d.is_zero()) {
            None => {
                state.push(message).await;
                trace!(queue = %queue, "Message sent");
            }
            Some(delay) => {
                *state.contents.lock().await.delayed.entry(message.id).or_default() += 1;
                let closed = self.closed.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let mut contents = state.contents.lock().await;
                    decrement(&mut contents.delayed, message.id);
                    if decrement(&mut contents.dropped, message.id) || closed.load(Ordering::SeqCst) {
                        debug!(queue = %queue, job_id = %message.id, "Delayed message discarded");
                        return;
                    }
                    contents.ready.push_back(message);
                    drop(contents);
                    state.notify.notify_one();
                });
                trace!(queue = %queue, delay_ms = delay.as_millis() as u64, "Delayed message scheduled");
            }
        }
        Ok(())
    }

    async fn consume_message(&self, queue: QueueType) -> Result<Option<JobQueueMessage>, QueueError> {
        let state = self.state(queue)?;
        loop {
            let notified = state.notify.notified();
            tokio::pin!(notified);
            // Registered before checking so a push or close in between is not missed.
            notified.as_mut().enable();

            if self.is_closed() {
                return Ok(None);
            }
            if let Some(message) = state.contents.lock().await.ready.pop_front() {
                return Ok(Some(message));
            }
            notified.await;
        }
    }

    async fn remove_job(&self, queue: QueueType, id: Uuid) -> Result<bool, QueueError> {
        let state = self.state(queue)?;
        let mut contents = state.contents.lock().await;
        let before = contents.ready.len();
        contents.ready.retain(|message| message.id != id);
        let mut removed = contents.ready.len() != before;

        let pending_delayed = contents.delayed.get(&id).copied().unwrap_or(0);
        let already_dropped = contents.dropped.get(&id).copied().unwrap_or(0);
        if pending_delayed > already_dropped {
            contents.dropped.insert(id, pending_delayed);
            removed = true;
        }
        Ok(removed)
    }

    async fn queue_depth(&self, queue: QueueType) -> Result<usize, QueueError> {
        Ok(self.state(queue)?.contents.lock().await.ready.len())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for state in self.queues.values() {
            state.notify.notify_waiters();
        }
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::ErrorFromQueueError("in-memory queue is closed".to_string()));
        }
        Ok(())
    }
}

/// Decrements the counter of `id`, returns whether there was one to decrement.
fn decrement(counters: &mut HashMap<Uuid, usize>, id: Uuid) -> bool {
    match counters.get_mut(&id) {
        Some(count) if *count > 1 => {
            *count -= 1;
            true
        }
        Some(_) => {
            counters.remove(&id);
            true
        }
        None => false,
    }
}
