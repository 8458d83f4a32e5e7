//! Request identity and the gateway's header vocabulary.
//!
//! # Responsibilities
//! - Generate a unique request ID per job (UUID v4)
//! - Name the headers the gateway adds on both legs of a call
//!
//! # Design Decisions
//! - The request ID is minted when the pipeline starts, not at ingress;
//!   a request that never reaches a worker has no ID
//! - The trace ID is minted per outbound call and never returned to the caller

use std::fmt;

use axum::http::HeaderName;
use uuid::Uuid;

/// Correlation header sent upstream and returned to the caller.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Per-call trace header sent upstream.
pub const X_TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");

/// Identifies the gateway instance on every envelope.
pub const X_GATEWAY: HeaderName = HeaderName::from_static("x-gateway");

/// Unique identifier for one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fresh trace ID for an outbound call.
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}
