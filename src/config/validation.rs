//! Configuration validation.
//!
//! # Responsibilities
//! - Validate value ranges (workers, capacity, deadlines)
//! - Check route definitions (unique topics, methods, path templates)
//! - Check every backend address is a usable base URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - A route without a backend is legal; it answers NO_ROUTE at runtime

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::http::server::{method_filter, HEALTH_PATH};
use crate::routing::PathTemplate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("dispatch.workers must be greater than zero")]
    NoWorkers,

    #[error("dispatch.queue_capacity must be greater than zero")]
    NoQueueCapacity,

    #[error("timeouts.forward_ms must be greater than zero")]
    NoForwardDeadline,

    #[error("timeouts.forward_ms ({forward_ms}ms) must be shorter than timeouts.request_secs ({request_secs}s)")]
    ForwardDeadlineTooLong { forward_ms: u64, request_secs: u64 },

    #[error("topic '{0}' is declared by more than one route")]
    DuplicateTopic(String),

    #[error("route '{topic}': invalid method '{method}'")]
    InvalidMethod { topic: String, method: String },

    #[error("route '{topic}' overlaps route '{other}' on {path}")]
    OverlappingRoute {
        topic: String,
        other: String,
        path: String,
    },

    #[error("route '{0}': path /healthz is reserved")]
    ReservedPath(String),

    #[error("route '{topic}': {reason}")]
    InvalidPath { topic: String, reason: String },

    #[error("backend for '{topic}': invalid address '{address}'")]
    InvalidBackend { topic: String, address: String },

    #[error("throttle '{0}': requests_per_second and burst_size must be greater than zero")]
    InvalidThrottle(&'static str),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.dispatch.workers == 0 {
        errors.push(ValidationError::NoWorkers);
    }
    if config.dispatch.queue_capacity == 0 {
        errors.push(ValidationError::NoQueueCapacity);
    }

    let timeouts = &config.timeouts;
    if timeouts.forward_ms == 0 {
        errors.push(ValidationError::NoForwardDeadline);
    } else if timeouts.forward_ms >= timeouts.request_secs.saturating_mul(1000) {
        errors.push(ValidationError::ForwardDeadlineTooLong {
            forward_ms: timeouts.forward_ms,
            request_secs: timeouts.request_secs,
        });
    }

    for (name, throttle) in [("ip", &config.rate_limit.ip), ("topic", &config.rate_limit.topic)] {
        if throttle.enabled && (throttle.requests_per_second == 0 || throttle.burst_size == 0) {
            errors.push(ValidationError::InvalidThrottle(name));
        }
    }

    let mut topics = HashSet::new();
    // path shape -> (topic, path, method) already claimed; `None` claims every method
    let mut claimed: HashMap<String, Vec<(&str, &str, Option<String>)>> = HashMap::new();
    for route in &config.routes {
        if !topics.insert(route.topic.as_str()) {
            errors.push(ValidationError::DuplicateTopic(route.topic.clone()));
        }
        if let Some(method) = &route.method {
            if method_filter(method).is_none() {
                errors.push(ValidationError::InvalidMethod {
                    topic: route.topic.clone(),
                    method: method.clone(),
                });
            }
        }
        if let Err(e) = PathTemplate::parse(&route.path) {
            errors.push(ValidationError::InvalidPath {
                topic: route.topic.clone(),
                reason: e.to_string(),
            });
        }

        if route.path == HEALTH_PATH {
            errors.push(ValidationError::ReservedPath(route.topic.clone()));
        }

        let method = route.method.as_ref().map(|m| m.to_ascii_uppercase());
        let taken = claimed.entry(path_shape(&route.path)).or_default();
        let clash = taken.iter().find(|(_, path, other)| {
            *path != route.path
                || match (other, &method) {
                    (None, _) | (_, None) => true,
                    (Some(a), Some(b)) => a == b,
                }
        });
        if let Some((other, _, _)) = clash {
            errors.push(ValidationError::OverlappingRoute {
                topic: route.topic.clone(),
                other: other.to_string(),
                path: route.path.clone(),
            });
        }
        taken.push((route.topic.as_str(), route.path.as_str(), method));
    }

    for (topic, address) in &config.backends {
        let usable = Url::parse(address)
            .map(|url| url.scheme() == "http" && url.has_host())
            .unwrap_or(false);
        if !usable {
            errors.push(ValidationError::InvalidBackend {
                topic: topic.clone(),
                address: address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Path with placeholder names erased: `/users/{id}` and `/users/{uid}`
/// match the same requests and cannot share a router entry.
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with('{') { "{}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}
