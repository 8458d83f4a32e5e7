//! Ingress adapter: turns an inbound HTTP request into a queued job and
//! waits for its reply.
//!
//! # Flow
//! 1. Snapshot the request into a `JobRequest` with a fresh reply slot
//! 2. Race "queue accepted the job" against caller liveness
//! 3. Race "reply arrived" against caller liveness
//!
//! Liveness ends when the client disconnects (the handler future is dropped,
//! which cancels the job's token) or when the request budget elapses. A job
//! already handed to the queue cannot be retracted; it runs to completion and
//! its reply is discarded.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, RawPathParams},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::sync::oneshot;
use tokio::time::Sleep;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::dispatch::{DispatchQueue, GatewayResult, Job, JobRequest};
use crate::observability::metrics;
use crate::pipeline::forwarder::FORWARDED_HEADERS;
use crate::routing::PathTemplate;

/// What the ingress needs to know about one registered endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub topic: String,
    pub template: PathTemplate,
    pub requires_auth: bool,
}

/// Shared state for every ingress handler.
#[derive(Debug, Clone)]
pub struct IngressState {
    pub queue: DispatchQueue,
    /// How long a caller may wait for enqueue + reply.
    pub request_budget: Duration,
}

/// Per-request cancellation signal.
///
/// Fires when the budget elapses or when the value is dropped (the handler
/// future was dropped because the client went away).
pub struct CallerLiveness {
    token: CancellationToken,
    deadline: Pin<Box<Sleep>>,
    _disconnect: DropGuard,
}

impl CallerLiveness {
    pub fn new(budget: Duration) -> Self {
        let token = CancellationToken::new();
        Self {
            _disconnect: token.clone().drop_guard(),
            deadline: Box::pin(tokio::time::sleep(budget)),
            token,
        }
    }

    /// Token handed to the job; observed at the outbound call.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Resolves once the caller is no longer live. Cancel-safe.
    pub async fn expired(&mut self) {
        tokio::select! {
            _ = &mut self.deadline => self.token.cancel(),
            _ = self.token.cancelled() => {}
        }
    }
}

/// axum entry point for one endpoint.
pub async fn handle(
    state: IngressState,
    endpoint: Arc<Endpoint>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    params: RawPathParams,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let liveness = CallerLiveness::new(state.request_budget);

    let path = endpoint
        .template
        .render(|name| params.iter().find(|(key, _)| *key == name).map(|(_, value)| value));

    let request = JobRequest {
        method,
        path,
        headers: forwardable_headers(&headers),
        body,
        client_ip: caller.ip(),
        topic: endpoint.topic.clone(),
        token: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        requires_auth: endpoint.requires_auth,
        cancel: liveness.token(),
    };

    tracing::debug!(topic = %request.topic, path = %request.path, client = %caller, "Dispatching request");

    let (job, reply) = Job::new(request);
    submit_and_wait(&state.queue, job, reply, liveness).await
}

/// Hand `job` to the queue and wait for its reply, both bounded by `liveness`.
pub async fn submit_and_wait(
    queue: &DispatchQueue,
    job: Job,
    reply: oneshot::Receiver<GatewayResult>,
    mut liveness: CallerLiveness,
) -> Response {
    tokio::select! {
        submitted = queue.submit(job) => {
            if let Err(e) = submitted {
                tracing::error!(error = %e, "Dispatch queue unavailable");
                return plain_error(StatusCode::SERVICE_UNAVAILABLE, "Dispatch queue closed");
            }
        }
        _ = liveness.expired() => {
            tracing::warn!(queue_depth = queue.depth(), "Caller gave up before the job was queued");
            metrics::record_client_canceled("enqueue");
            return plain_error(StatusCode::REQUEST_TIMEOUT, "Client canceled");
        }
    }

    tokio::select! {
        result = reply => match result {
            Ok(result) => result.into_response(),
            Err(_) => {
                tracing::error!("Job dropped without a reply");
                plain_error(StatusCode::SERVICE_UNAVAILABLE, "Job aborted without a reply")
            }
        },
        _ = liveness.expired() => {
            tracing::warn!("Caller gave up while the job was in flight");
            metrics::record_client_canceled("reply");
            plain_error(StatusCode::REQUEST_TIMEOUT, "Gateway timeout waiting for pipeline")
        }
    }
}

/// The inbound headers that may travel with the job.
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut subset = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(&name) {
            subset.insert(name, value.clone());
        }
    }
    subset
}

fn plain_error(status: StatusCode, message: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        message,
    )
        .into_response()
}
