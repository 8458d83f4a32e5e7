//! Fixed-size worker pool draining the dispatch queue.
//!
//! # Responsibilities
//! - Spawn N long-lived worker tasks at startup
//! - Each worker: take one job, run it to completion, write the reply, repeat
//! - Keep running when a job fails or panics
//! - Stop on shutdown signal or when the queue closes

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::JoinHandle;

use crate::dispatch::job::{GatewayResult, Job, JobRequest};
use crate::dispatch::queue::JobReceiver;
use crate::lifecycle::{Shutdown, ShutdownSignal};

/// Work executed for every job. Implemented by the request pipeline.
pub trait JobProcessor: Send + Sync + 'static {
    fn process(&self, request: &JobRequest) -> impl Future<Output = GatewayResult> + Send;
}

/// Handle to the running workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing `receiver`.
    pub fn spawn<P: JobProcessor>(
        size: usize,
        receiver: JobReceiver,
        processor: Arc<P>,
        shutdown: &Shutdown,
    ) -> Self {
        let handles = (0..size)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    receiver.clone(),
                    processor.clone(),
                    shutdown.subscribe(),
                ))
            })
            .collect();

        tracing::info!(workers = size, "Worker pool started");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task terminated abnormally");
            }
        }
    }
}

async fn run_worker<P: JobProcessor>(
    id: usize,
    receiver: JobReceiver,
    processor: Arc<P>,
    mut shutdown: ShutdownSignal,
) {
    tracing::debug!(worker = id, "Worker started");

    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!(worker = id, "Worker received shutdown signal");
                break;
            }
            job = receiver.recv() => match job {
                Some(job) => job,
                None => {
                    tracing::debug!(worker = id, "Dispatch queue closed");
                    break;
                }
            },
        };

        run_job(id, processor.as_ref(), job).await;
    }

    tracing::debug!(worker = id, "Worker stopped");
}

async fn run_job<P: JobProcessor>(id: usize, processor: &P, job: Job) {
    let Job { request, reply } = job;

    match AssertUnwindSafe(processor.process(&request))
        .catch_unwind()
        .await
    {
        Ok(result) => {
            reply.send(result);
        }
        Err(_) => {
            // Dropping the slot unblocks the caller with a closed channel.
            tracing::error!(worker = id, topic = %request.topic, "Job panicked");
            drop(reply);
        }
    }
}
