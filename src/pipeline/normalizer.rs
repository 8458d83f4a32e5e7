//! Uniform JSON envelope.
//!
//! Every pipeline outcome, success or failure, is rendered as:
//!
//! ```json
//! {
//!   "request_id": "…",
//!   "status": "SUCCESS" | "ERROR",
//!   "latency_ms": 12,
//!   "data": <backend body> | null,
//!   "error": {"code": "…", "message": "…"} | {"upstream_status": 404, "message": "…"} | null
//! }
//! ```
//!
//! # Outer status on backend errors
//! When the backend answers with a status >= 400 the envelope is an ERROR
//! envelope carrying `upstream_status`, but the caller still receives HTTP
//! 200. The gateway-to-client status only reflects gateway failures; this is
//! a deliberate contract relied on by clients.

use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use serde::Serialize;
use serde_json::value::RawValue;

use crate::dispatch::GatewayResult;
use crate::error::GatewayError;
use crate::http::request::{RequestId, X_GATEWAY, X_REQUEST_ID};
use crate::pipeline::forwarder::UpstreamResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Gateway {
        code: &'static str,
        message: String,
    },
    Upstream {
        upstream_status: u16,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub request_id: &'a str,
    pub status: EnvelopeStatus,
    pub latency_ms: u64,
    pub data: Option<Box<RawValue>>,
    pub error: Option<ErrorBody>,
}

/// Builds envelopes and their response headers.
#[derive(Debug, Clone)]
pub struct Normalizer {
    gateway_name: HeaderValue,
}

impl Normalizer {
    pub fn new(gateway_name: &str) -> Self {
        let gateway_name = HeaderValue::from_str(gateway_name).unwrap_or_else(|_| {
            tracing::warn!(name = %gateway_name, "Gateway name is not a valid header value");
            HeaderValue::from_static("api-gateway")
        });
        Self { gateway_name }
    }

    /// Wrap a backend response. Always answers 200 to the caller.
    pub fn upstream(
        &self,
        request_id: &RequestId,
        response: UpstreamResponse,
        latency: Duration,
    ) -> GatewayResult {
        let envelope = if response.status.as_u16() < 400 {
            Envelope {
                request_id: request_id.as_str(),
                status: EnvelopeStatus::Success,
                latency_ms: millis(latency),
                data: raw_body(&response.body),
                error: None,
            }
        } else {
            Envelope {
                request_id: request_id.as_str(),
                status: EnvelopeStatus::Error,
                latency_ms: millis(latency),
                data: None,
                error: Some(ErrorBody::Upstream {
                    upstream_status: response.status.as_u16(),
                    message: String::from_utf8_lossy(&response.body).into_owned(),
                }),
            }
        };

        self.render(request_id, StatusCode::OK, &envelope)
    }

    /// Wrap a gateway failure, using the error's own HTTP status.
    pub fn failure(
        &self,
        request_id: &RequestId,
        error: &GatewayError,
        latency: Duration,
    ) -> GatewayResult {
        let envelope = Envelope {
            request_id: request_id.as_str(),
            status: EnvelopeStatus::Error,
            latency_ms: millis(latency),
            data: None,
            error: Some(ErrorBody::Gateway {
                code: error.code(),
                message: error.to_string(),
            }),
        };

        self.render(request_id, error.status(), &envelope)
    }

    fn render(&self, request_id: &RequestId, status: StatusCode, envelope: &Envelope<'_>) -> GatewayResult {
        let body = serde_json::to_vec(envelope).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize envelope");
            Vec::new()
        });

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(X_GATEWAY, self.gateway_name.clone());
        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            headers.insert(X_REQUEST_ID, value);
        }

        GatewayResult {
            status,
            headers,
            body: Bytes::from(body),
        }
    }
}

fn millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}

/// Backend body as a JSON value: embedded verbatim when it is JSON,
/// otherwise as a JSON string.
fn raw_body(body: &Bytes) -> Option<Box<RawValue>> {
    if let Ok(text) = std::str::from_utf8(body) {
        if let Ok(raw) = RawValue::from_string(text.to_owned()) {
            return Some(raw);
        }
    }

    serde_json::value::to_raw_value(&String::from_utf8_lossy(body)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn normalizer() -> Normalizer {
        Normalizer::new("api-gateway")
    }

    fn upstream(status: u16, body: &'static str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn parse(result: &GatewayResult) -> Value {
        serde_json::from_slice(&result.body).unwrap()
    }

    fn assert_shape(value: &Value) {
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["data", "error", "latency_ms", "request_id", "status"]);

        match value["status"].as_str().unwrap() {
            "SUCCESS" => {
                assert!(value["error"].is_null());
            }
            "ERROR" => {
                assert!(value["data"].is_null());
                assert!(value["error"].is_object());
            }
            other => panic!("unexpected status {}", other),
        }
    }

    #[test]
    fn test_success_embeds_backend_json() {
        let id = RequestId::new();
        let result = normalizer().upstream(
            &id,
            upstream(200, "{\"token\":\"abc\"}\n"),
            Duration::from_millis(7),
        );

        assert_eq!(result.status, StatusCode::OK);
        let value = parse(&result);
        assert_shape(&value);
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["data"], json!({"token": "abc"}));
        assert_eq!(value["latency_ms"], 7);
        assert_eq!(value["request_id"], id.as_str());
    }

    #[test]
    fn test_success_with_non_json_body() {
        let result = normalizer().upstream(
            &RequestId::new(),
            upstream(200, "plain text"),
            Duration::ZERO,
        );
        let value = parse(&result);
        assert_shape(&value);
        assert_eq!(value["data"], "plain text");
    }

    #[test]
    fn test_upstream_error_keeps_outer_200() {
        let result = normalizer().upstream(
            &RequestId::new(),
            upstream(404, "404 page not found"),
            Duration::from_millis(3),
        );

        assert_eq!(result.status, StatusCode::OK);
        let value = parse(&result);
        assert_shape(&value);
        assert_eq!(value["status"], "ERROR");
        assert_eq!(value["error"]["upstream_status"], 404);
        assert_eq!(value["error"]["message"], "404 page not found");
        assert!(value["error"].get("code").is_none());
    }

    #[test]
    fn test_gateway_failure_uses_error_status() {
        let id = RequestId::new();
        let err = GatewayError::NoRoute("billing/pay".into());
        let result = normalizer().failure(&id, &err, Duration::from_millis(1));

        assert_eq!(result.status, StatusCode::BAD_GATEWAY);
        let value = parse(&result);
        assert_shape(&value);
        assert_eq!(value["error"]["code"], "NO_ROUTE");
        assert_eq!(value["error"]["message"], "No route for topic 'billing/pay'");
    }

    #[test]
    fn test_response_headers() {
        let id = RequestId::new();
        let result = Normalizer::new("edge-1").failure(
            &id,
            &GatewayError::Unauthenticated,
            Duration::ZERO,
        );

        assert_eq!(result.status, StatusCode::UNAUTHORIZED);
        assert_eq!(result.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(result.headers[X_GATEWAY], "edge-1");
        assert_eq!(result.headers[X_REQUEST_ID], id.as_str());
    }
}
