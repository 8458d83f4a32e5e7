//! Concrete admission policies.
//!
//! # Data Flow
//! ```text
//! PolicySet (pipeline::admission)
//!     → rate_limit.rs (token bucket keyed by caller IP)
//!     → auth.rs (credential scheme check, only for topics requiring auth)
//!     → rate_limit.rs (token bucket keyed by topic)
//! ```
//!
//! # Design Decisions
//! - Each policy is a `Policy` implementation; the pipeline never sees
//!   concrete types
//! - Fail closed: a denial stops the pipeline before any outbound call

pub mod auth;
pub mod rate_limit;

pub use auth::BearerScheme;
pub use rate_limit::{ThrottleKey, TokenBucketLimiter};
