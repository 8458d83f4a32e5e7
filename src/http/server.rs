//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: one endpoint per configured route
//! - Wire up middleware (tracing, body limit)
//! - Bind server to listener with peer address info
//! - Hand every request to the ingress adapter

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, RawPathParams},
    http::{HeaderMap, Method},
    response::Response,
    routing::{any, get, MethodFilter, MethodRouter},
    Router,
};
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, RouteConfig};
use crate::dispatch::DispatchQueue;
use crate::http::ingress::{self, Endpoint, IngressState};
use crate::routing::PathTemplate;

/// Liveness check, served outside the dispatch queue.
pub const HEALTH_PATH: &str = "/healthz";

/// Methods a route may be restricted to.
pub fn method_filter(method: &str) -> Option<MethodFilter> {
    let filter = match method.to_ascii_uppercase().as_str() {
        "GET" => MethodFilter::GET,
        "POST" => MethodFilter::POST,
        "PUT" => MethodFilter::PUT,
        "PATCH" => MethodFilter::PATCH,
        "DELETE" => MethodFilter::DELETE,
        "HEAD" => MethodFilter::HEAD,
        "OPTIONS" => MethodFilter::OPTIONS,
        "TRACE" => MethodFilter::TRACE,
        _ => return None,
    };
    Some(filter)
}

/// HTTP front of the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the router; jobs go to `queue`.
    pub fn new(config: GatewayConfig, queue: DispatchQueue) -> Self {
        let state = IngressState {
            queue,
            request_budget: Duration::from_secs(config.timeouts.request_secs),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: IngressState) -> Router {
        let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();

        for route in &config.routes {
            let Some((endpoint, filter)) = compile_route(route) else {
                continue;
            };
            let path = endpoint.template.as_str().to_string();
            let handler = endpoint_handler(state.clone(), Arc::new(endpoint));

            let method_router = match filter {
                Some(filter) => by_path
                    .remove(&path)
                    .unwrap_or_else(MethodRouter::new)
                    .on(filter, handler),
                None => any(handler),
            };
            by_path.insert(path, method_router);

            tracing::debug!(topic = %route.topic, path = %route.path, "Route registered");
        }

        let router = by_path
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            });

        router
            .route(HEALTH_PATH, get(|| async { "ok" }))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(DefaultBodyLimit::max(config.limits.max_body_bytes)),
            )
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn compile_route(route: &RouteConfig) -> Option<(Endpoint, Option<MethodFilter>)> {
    let template = match PathTemplate::parse(&route.path) {
        Ok(template) => template,
        Err(e) => {
            tracing::error!(topic = %route.topic, error = %e, "Skipping route with invalid path");
            return None;
        }
    };

    let filter = match route.method.as_deref() {
        None => None,
        Some(method) => match method_filter(method) {
            Some(filter) => Some(filter),
            None => {
                tracing::error!(topic = %route.topic, method = %method, "Skipping route with unsupported method");
                return None;
            }
        },
    };

    let endpoint = Endpoint {
        topic: route.topic.clone(),
        template,
        requires_auth: route.requires_auth,
    };
    Some((endpoint, filter))
}

fn endpoint_handler(
    state: IngressState,
    endpoint: Arc<Endpoint>,
) -> impl FnOnce(
    ConnectInfo<SocketAddr>,
    RawPathParams,
    Method,
    HeaderMap,
    Bytes,
) -> BoxFuture<'static, Response>
       + Clone
       + Send
       + Sync
       + 'static {
    move |connect, params, method, headers, body| {
        ingress::handle(state, endpoint, connect, params, method, headers, body).boxed()
    }
}
