//! Bounded FIFO dispatch queue.
//!
//! # Responsibilities
//! - Accept jobs from any number of ingress handlers
//! - Hold at most `capacity` jobs; producers wait (or fail fast) beyond that
//! - Hand jobs to workers in admission order
//!
//! # Design Decisions
//! - Backed by `tokio::sync::mpsc`; the receiver is shared by the pool behind
//!   an async mutex so each job goes to exactly one worker
//! - `submit` is cancel-safe: if the caller stops waiting, the job was not
//!   enqueued and is dropped together with its reply slot

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::dispatch::job::Job;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Queue at capacity (only from `try_submit`).
    #[error("dispatch queue is full")]
    Full(Job),
    /// Every worker is gone.
    #[error("dispatch queue is closed")]
    Closed(Job),
}

/// Producer side of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::Sender<Job>,
    capacity: usize,
}

/// Consumer side of the queue, shared by all workers.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl DispatchQueue {
    /// Create a queue holding at most `capacity` jobs.
    ///
    /// # Panics
    /// If `capacity` is zero (rejected earlier by config validation).
    pub fn bounded(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self { tx, capacity },
            JobReceiver {
                rx: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Enqueue, waiting for room if the queue is full.
    pub async fn submit(&self, job: Job) -> Result<(), QueueError> {
        self.tx
            .send(job)
            .await
            .map_err(|mpsc::error::SendError(job)| QueueError::Closed(job))?;
        metrics::record_queue_depth(self.depth());
        Ok(())
    }

    /// Enqueue without waiting.
    pub fn try_submit(&self, job: Job) -> Result<(), QueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => QueueError::Full(job),
            mpsc::error::TrySendError::Closed(job) => QueueError::Closed(job),
        })?;
        metrics::record_queue_depth(self.depth());
        Ok(())
    }

    /// Jobs currently waiting for a worker.
    pub fn depth(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl JobReceiver {
    /// Take the next job. `None` once every producer is dropped and the
    /// queue is drained.
    pub async fn recv(&self) -> Option<Job> {
        let mut rx = self.rx.lock().await;
        let job = rx.recv().await;
        metrics::record_queue_depth(rx.len());
        job
    }
}
