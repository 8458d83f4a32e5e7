//! Jobs and their reply slots.

use std::net::IpAddr;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::pipeline::admission::RequestAttributes;

/// The reply delivered to the caller: status, headers, body.
#[derive(Debug, Clone)]
pub struct GatewayResult {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for GatewayResult {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Immutable snapshot of one inbound request.
#[derive(Debug)]
pub struct JobRequest {
    pub method: Method,
    /// Path with template placeholders already substituted.
    pub path: String,
    /// Forwardable header subset (content negotiation only).
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_ip: IpAddr,
    pub topic: String,
    /// Raw `Authorization` value, if any.
    pub token: Option<String>,
    pub requires_auth: bool,
    /// Fires when the originating caller is gone.
    pub cancel: CancellationToken,
}

impl JobRequest {
    pub fn attributes(&self) -> RequestAttributes<'_> {
        RequestAttributes {
            client_ip: self.client_ip,
            topic: &self.topic,
            token: self.token.as_deref(),
            requires_auth: self.requires_auth,
        }
    }
}

/// Single-use sender half of a job's reply channel.
///
/// `send` consumes the slot, so a result can be written at most once.
#[derive(Debug)]
pub struct ReplySlot {
    tx: oneshot::Sender<GatewayResult>,
}

impl ReplySlot {
    pub fn channel() -> (Self, oneshot::Receiver<GatewayResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver the result. Returns false if the caller already gave up, in
    /// which case the result is dropped.
    pub fn send(self, result: GatewayResult) -> bool {
        match self.tx.send(result) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Reply discarded, caller no longer waiting");
                false
            }
        }
    }

    /// True once the receiving side has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A request queued for the worker pool.
#[derive(Debug)]
pub struct Job {
    pub request: JobRequest,
    pub reply: ReplySlot,
}

impl Job {
    /// Wrap a request with a fresh reply slot, returning the receiving end.
    pub fn new(request: JobRequest) -> (Self, oneshot::Receiver<GatewayResult>) {
        let (reply, rx) = ReplySlot::channel();
        (Self { request, reply }, rx)
    }
}
