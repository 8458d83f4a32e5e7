//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop accepting HTTP traffic
//!
//! Shutdown (shutdown.rs):
//!     trigger() → latched flag; workers leave their loop after the current job,
//!     including workers that subscribe after the trigger
//! ```
//!
//! # Design Decisions
//! - HTTP server drains first, then the worker pool is stopped
//! - A job already running on a worker always completes

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::shutdown_signal;
