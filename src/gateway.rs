//! The gateway object: queue, worker pool and shutdown coordinator built
//! once at startup and owned by `main` (or a test).

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::dispatch::{DispatchQueue, JobProcessor, WorkerPool};
use crate::http::GatewayServer;
use crate::lifecycle::Shutdown;
use crate::pipeline::Pipeline;

pub struct Gateway {
    config: GatewayConfig,
    queue: DispatchQueue,
    workers: WorkerPool,
    shutdown: Shutdown,
}

impl Gateway {
    /// Start the worker pool with the standard pipeline built from `config`.
    pub fn from_config(config: GatewayConfig) -> Self {
        let pipeline = Pipeline::from_config(&config);

        for route in &config.routes {
            if !pipeline.routes().contains(&route.topic) {
                tracing::warn!(topic = %route.topic, "Route has no backend; requests will get NO_ROUTE");
            }
        }

        Self::with_processor(config, Arc::new(pipeline))
    }

    /// Start the worker pool with a custom job processor.
    pub fn with_processor<P: JobProcessor>(config: GatewayConfig, processor: Arc<P>) -> Self {
        let (queue, receiver) = DispatchQueue::bounded(config.dispatch.queue_capacity);
        let shutdown = Shutdown::new();
        let workers = WorkerPool::spawn(config.dispatch.workers, receiver, processor, &shutdown);

        Self {
            config,
            queue,
            workers,
            shutdown,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Producer handle for the dispatch queue.
    pub fn queue(&self) -> DispatchQueue {
        self.queue.clone()
    }

    /// HTTP front wired to this gateway's queue.
    pub fn server(&self) -> GatewayServer {
        GatewayServer::new(self.config.clone(), self.queue())
    }

    /// Stop the workers and wait for them. Jobs still queued are dropped,
    /// which closes their reply slots.
    pub async fn shutdown(self) {
        tracing::info!(workers = self.workers.size(), "Stopping worker pool");
        self.shutdown.trigger();
        drop(self.queue);
        self.workers.join().await;
        tracing::info!("Worker pool stopped");
    }
}
