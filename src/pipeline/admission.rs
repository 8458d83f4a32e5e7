//! Admission stage: ordered allow/deny checks run before routing.
//!
//! # Order
//! 1. IP throttle → `RATE_LIMIT_IP`
//! 2. Identity check, only for topics that require auth → `UNAUTHENTICATED`
//! 3. Topic throttle → `RATE_LIMIT_FEATURE`
//!
//! The first denial wins; later checks do not run.

use std::net::IpAddr;

use crate::config::{GatewayConfig, ThrottleConfig};
use crate::error::GatewayError;
use crate::security::{BearerScheme, ThrottleKey, TokenBucketLimiter};

/// The request attributes a policy may look at.
#[derive(Debug, Clone, Copy)]
pub struct RequestAttributes<'a> {
    pub client_ip: IpAddr,
    pub topic: &'a str,
    pub token: Option<&'a str>,
    pub requires_auth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// A single admission check.
pub trait Policy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, attrs: &RequestAttributes<'_>) -> Decision;
}

/// Admits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Policy for AllowAll {
    fn name(&self) -> &'static str {
        "allow_all"
    }

    fn evaluate(&self, _attrs: &RequestAttributes<'_>) -> Decision {
        Decision::Allow
    }
}

/// The three admission checks, in evaluation order.
#[derive(Debug)]
pub struct PolicySet {
    ip_throttle: Box<dyn Policy>,
    identity: Box<dyn Policy>,
    topic_throttle: Box<dyn Policy>,
}

impl PolicySet {
    pub fn new(
        ip_throttle: Box<dyn Policy>,
        identity: Box<dyn Policy>,
        topic_throttle: Box<dyn Policy>,
    ) -> Self {
        Self {
            ip_throttle,
            identity,
            topic_throttle,
        }
    }

    /// No throttling, bearer-scheme identity check.
    pub fn permissive() -> Self {
        Self::new(Box::new(AllowAll), Box::new(BearerScheme), Box::new(AllowAll))
    }

    /// Throttles built from `[rate_limit]`; disabled throttles admit all.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let throttle = |key: ThrottleKey, settings: &ThrottleConfig| -> Box<dyn Policy> {
            if settings.enabled {
                Box::new(TokenBucketLimiter::from_config(key, settings))
            } else {
                Box::new(AllowAll)
            }
        };

        Self::new(
            throttle(ThrottleKey::ClientIp, &config.rate_limit.ip),
            Box::new(BearerScheme),
            throttle(ThrottleKey::Topic, &config.rate_limit.topic),
        )
    }

    /// Run every applicable check, stopping at the first denial.
    pub fn admit(&self, attrs: &RequestAttributes<'_>) -> Result<(), GatewayError> {
        if !self.ip_throttle.evaluate(attrs).is_allowed() {
            return Err(GatewayError::RateLimitedIp);
        }

        if attrs.requires_auth && !self.identity.evaluate(attrs).is_allowed() {
            tracing::debug!(policy = self.identity.name(), topic = %attrs.topic, "Identity check denied");
            return Err(GatewayError::Unauthenticated);
        }

        if !self.topic_throttle.evaluate(attrs).is_allowed() {
            return Err(GatewayError::RateLimitedTopic);
        }

        Ok(())
    }
}
