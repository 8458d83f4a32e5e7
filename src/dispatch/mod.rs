//! Dispatch subsystem: the bounded queue, the worker pool, and the jobs
//! flowing between them.
//!
//! # Data Flow
//! ```text
//! ingress handler (one per inbound request)
//!     → job.rs (snapshot request + one-shot reply slot)
//!     → queue.rs (bounded FIFO, shared by all producers)
//!     → worker.rs (fixed pool; each worker takes one job at a time)
//!     → JobProcessor (the pipeline) → GatewayResult
//!     → reply slot → ingress handler
//! ```
//!
//! # Design Decisions
//! - The queue and the reply slot are the only shared primitives; neither
//!   needs an explicit lock from callers
//! - A job handed to the queue cannot be retracted; if the caller gives up,
//!   the job still runs and its result is dropped
//! - A worker never stops because one job failed or panicked

pub mod job;
pub mod queue;
pub mod worker;

pub use job::{GatewayResult, Job, JobRequest, ReplySlot};
pub use queue::{DispatchQueue, JobReceiver, QueueError};
pub use worker::{JobProcessor, WorkerPool};
