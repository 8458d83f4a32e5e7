//! Outbound call to the resolved backend.
//!
//! # Responsibilities
//! - Build the outbound request from the job (method, body, safe headers)
//! - Inject `X-Request-ID` and a fresh `X-Trace-ID`
//! - Bound the call by the forwarding deadline and the caller's cancellation
//! - Buffer the backend body for the normalizer
//!
//! # Design Decisions
//! - Only `Content-Type` and `Accept` are copied from the inbound request;
//!   credentials and hop-by-hop headers never leave the gateway
//! - One attempt per job: no retries
//! - Deadline expiry and cancellation both surface as BAD_GATEWAY

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, Request, StatusCode},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::dispatch::JobRequest;
use crate::error::GatewayError;
use crate::http::request::{new_trace_id, RequestId, X_REQUEST_ID, X_TRACE_ID};

/// Headers copied from the inbound request.
pub const FORWARDED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::ACCEPT];

/// Buffered backend response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    deadline: Duration,
}

impl Forwarder {
    pub fn new(deadline: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Send the job to `url` and buffer the reply.
    pub async fn forward(
        &self,
        job: &JobRequest,
        url: &str,
        request_id: &RequestId,
    ) -> Result<UpstreamResponse, GatewayError> {
        let request = build_request(job, url, request_id)?;

        tracing::debug!(url = %url, method = %job.method, "Forwarding request");

        tokio::select! {
            outcome = time::timeout(self.deadline, self.call(request)) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(url = %url, deadline_ms = self.deadline.as_millis() as u64, "Upstream deadline exceeded");
                    Err(GatewayError::BadGateway(format!(
                        "deadline of {}ms exceeded",
                        self.deadline.as_millis()
                    )))
                }
            },
            _ = job.cancel.cancelled() => {
                tracing::debug!(url = %url, "Caller canceled, abandoning upstream call");
                Err(GatewayError::BadGateway("inbound request canceled".to_string()))
            }
        }
    }

    async fn call(&self, request: Request<Body>) -> Result<UpstreamResponse, GatewayError> {
        let response = self.client.request(request).await.map_err(|e| {
            tracing::error!(error = %e, "Upstream error");
            GatewayError::BadGateway(e.to_string())
        })?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(|e| GatewayError::BadGateway(format!("failed to read response body: {}", e)))?;

        tracing::debug!(
            status = parts.status.as_u16(),
            headers = ?parts.headers,
            body = %String::from_utf8_lossy(&body),
            "Upstream response"
        );

        Ok(UpstreamResponse {
            status: parts.status,
            body,
        })
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Outbound request for `job`, addressed to `url`.
pub fn build_request(
    job: &JobRequest,
    url: &str,
    request_id: &RequestId,
) -> Result<Request<Body>, GatewayError> {
    let mut builder = Request::builder().method(job.method.clone()).uri(url);

    for name in FORWARDED_HEADERS {
        if let Some(value) = job.headers.get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    builder
        .header(X_REQUEST_ID, request_id.as_str())
        .header(X_TRACE_ID, new_trace_id())
        .body(Body::from(job.body.clone()))
        .map_err(|e| GatewayError::BuildRequestFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::job::fixtures;
    use axum::http::{HeaderValue, Method};

    #[test]
    fn test_only_safe_headers_are_copied() {
        let mut job = fixtures::request("profile/update");
        job.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        job.headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        job.headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        job.headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let id = RequestId::new();
        let request = build_request(&job, "http://127.0.0.1:9092/profile/update", &id).unwrap();

        let headers = request.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCEPT], "*/*");
        assert_eq!(headers[X_REQUEST_ID], id.as_str());
        assert!(headers.contains_key(X_TRACE_ID));
        assert_ne!(headers[X_TRACE_ID], id.as_str());
        assert!(!headers.contains_key(header::AUTHORIZATION));
        assert!(!headers.contains_key(header::CONNECTION));
        assert_eq!(headers.len(), 4);

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "http://127.0.0.1:9092/profile/update");
    }

    #[test]
    fn test_bad_url_is_build_failure() {
        let job = fixtures::request("profile/update");
        let err = build_request(&job, "http://bad host/x", &RequestId::new()).unwrap_err();
        assert_eq!(err.code(), "BUILD_REQUEST_FAILED");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = Forwarder::new(Duration::from_secs(2));
        let job = fixtures::request("auth/login");
        let err = forwarder
            .forward(&job, &format!("http://{}/auth/login", addr), &RequestId::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BAD_GATEWAY");
        assert!(err.to_string().starts_with("Internal service unreachable: "));
    }

    #[tokio::test]
    async fn test_canceled_caller_aborts_call() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let forwarder = Forwarder::new(Duration::from_secs(10));
        let job = fixtures::request("auth/login");
        let cancel = job.cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let err = time::timeout(
            Duration::from_secs(2),
            forwarder.forward(&job, &format!("http://{}/auth/login", addr), &RequestId::new()),
        )
        .await
        .expect("cancellation did not abort the call")
        .unwrap_err();
        assert_eq!(err, GatewayError::BadGateway("inbound request canceled".into()));
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct LogSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_upstream_response_is_logged_at_debug() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"ok":true}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nx-backend: alpha\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let sink = LogSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer({
                let sink = sink.clone();
                move || sink.clone()
            })
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let forwarder = Forwarder::new(Duration::from_secs(2));
        let job = fixtures::request("auth/login");
        let response = forwarder
            .forward(&job, &format!("http://{}/auth/login", addr), &RequestId::new())
            .await
            .unwrap();
        assert_eq!(&response.body[..], br#"{"ok":true}"#);

        let logs = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Upstream response"));
        assert!(logs.contains("x-backend"));
        assert!(logs.contains(r#"{"ok":true}"#));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let forwarder = Forwarder::new(Duration::from_millis(100));
        let job = fixtures::request("auth/login");
        let err = forwarder
            .forward(&job, &format!("http://{}/auth/login", addr), &RequestId::new())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::BadGateway("deadline of 100ms exceeded".into()));
    }
}
