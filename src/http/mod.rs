//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one endpoint per route)
//!     → ingress.rs (snapshot request, enqueue, await reply)
//!     → [worker pool runs the pipeline]
//!     → reply slot → Send to client
//! ```

pub mod ingress;
pub mod request;
pub mod server;

pub use ingress::{CallerLiveness, Endpoint, IngressState};
pub use request::{RequestId, X_GATEWAY, X_REQUEST_ID, X_TRACE_ID};
pub use server::GatewayServer;
