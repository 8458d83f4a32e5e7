//! Gateway failure taxonomy.
//!
//! Every variant except `ClientCanceled` terminates a job's pipeline and is
//! rendered as an ERROR envelope. `ClientCanceled` never reaches the
//! normalizer; the ingress handler answers it with plain text.
//!
//! A backend answering with an error status is *not* a `GatewayError`: the
//! normalizer passes it through as data (see `pipeline::normalizer`).

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Caller went away (or its liveness budget ran out) before a reply.
    #[error("Client canceled")]
    ClientCanceled,

    #[error("Too Many Requests (IP)")]
    RateLimitedIp,

    #[error("Unauthorized (JWT)")]
    Unauthenticated,

    #[error("Too Many Requests (Feature)")]
    RateLimitedTopic,

    #[error("No route for topic '{0}'")]
    NoRoute(String),

    /// The outbound request could not be constructed.
    #[error("{0}")]
    BuildRequestFailed(String),

    /// The outbound call failed, was canceled, or missed its deadline.
    #[error("Internal service unreachable: {0}")]
    BadGateway(String),
}

impl GatewayError {
    /// Stable machine-readable code placed in `error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::ClientCanceled => "CLIENT_CANCELED",
            GatewayError::RateLimitedIp => "RATE_LIMIT_IP",
            GatewayError::Unauthenticated => "UNAUTHENTICATED",
            GatewayError::RateLimitedTopic => "RATE_LIMIT_FEATURE",
            GatewayError::NoRoute(_) => "NO_ROUTE",
            GatewayError::BuildRequestFailed(_) => "BUILD_REQUEST_FAILED",
            GatewayError::BadGateway(_) => "BAD_GATEWAY",
        }
    }

    /// HTTP status returned to the original caller.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ClientCanceled => StatusCode::REQUEST_TIMEOUT,
            GatewayError::RateLimitedIp | GatewayError::RateLimitedTopic => {
                StatusCode::TOO_MANY_REQUESTS
            }
            GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::NoRoute(_) | GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            GatewayError::BuildRequestFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
