//! Per-job request pipeline.
//!
//! # Data Flow
//! ```text
//! JobRequest (inside one worker)
//!     → admission.rs (IP throttle → identity → topic throttle)
//!     → RoutingTable::resolve (topic → backend URL)
//!     → forwarder.rs (deadline-bounded outbound call)
//!     → normalizer.rs (uniform JSON envelope)
//!     → GatewayResult
//! ```
//!
//! # Design Decisions
//! - Stages run strictly in sequence; the first failure short-circuits
//! - Every path ends in a GatewayResult; no error escapes the worker
//! - Only the forwarder observes caller cancellation

pub mod admission;
pub mod forwarder;
pub mod normalizer;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::dispatch::{GatewayResult, JobProcessor, JobRequest};
use crate::error::GatewayError;
use crate::http::request::RequestId;
use crate::observability::metrics;
use crate::routing::RoutingTable;

pub use admission::{AllowAll, Decision, Policy, PolicySet, RequestAttributes};
pub use forwarder::{Forwarder, UpstreamResponse};
pub use normalizer::{Envelope, EnvelopeStatus, Normalizer};

/// Admission → Router → Forwarder → Normalizer.
#[derive(Debug)]
pub struct Pipeline {
    policies: PolicySet,
    routes: Arc<RoutingTable>,
    forwarder: Forwarder,
    normalizer: Normalizer,
}

impl Pipeline {
    pub fn new(
        policies: PolicySet,
        routes: Arc<RoutingTable>,
        forwarder: Forwarder,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            policies,
            routes,
            forwarder,
            normalizer,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            PolicySet::from_config(config),
            Arc::new(RoutingTable::new(config.backends.clone())),
            Forwarder::new(Duration::from_millis(config.timeouts.forward_ms)),
            Normalizer::new(&config.gateway.name),
        )
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Run one job to completion.
    pub async fn run(&self, job: &JobRequest) -> GatewayResult {
        let start = Instant::now();
        let request_id = RequestId::new();
        let span = tracing::info_span!("job", request_id = %request_id, topic = %job.topic);

        async {
            let (result, outcome) = match self.execute(job, &request_id).await {
                Ok(response) => {
                    let outcome = if response.status.as_u16() < 400 {
                        "SUCCESS"
                    } else {
                        "UPSTREAM_ERROR"
                    };
                    tracing::info!(
                        status = response.status.as_u16(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Upstream responded"
                    );
                    (self.normalizer.upstream(&request_id, response, start.elapsed()), outcome)
                }
                Err(error) => {
                    tracing::warn!(code = error.code(), error = %error, "Job failed");
                    (self.normalizer.failure(&request_id, &error, start.elapsed()), error.code())
                }
            };

            metrics::record_job(&job.topic, outcome, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job: &JobRequest,
        request_id: &RequestId,
    ) -> Result<UpstreamResponse, GatewayError> {
        self.policies.admit(&job.attributes())?;
        let url = self.routes.resolve(&job.topic, &job.path)?;
        self.forwarder.forward(job, &url, request_id).await
    }
}

impl JobProcessor for Pipeline {
    async fn process(&self, request: &JobRequest) -> GatewayResult {
        self.run(request).await
    }
}
