//! Demo backend for the gateway's built-in routes.
//!
//! Serves `/auth/login`, `/auth/register`, `/profile/get` and
//! `/profile/update` with canned JSON and logs every request it receives.
//! The demo routing table expects instances on ports 9090, 9091 and 9092:
//!
//! ```text
//! internal-service --bind 127.0.0.1:9090
//! internal-service --bind 127.0.0.1:9091
//! internal-service --bind 127.0.0.1:9092
//! ```

use std::collections::HashMap;
use std::fmt::Display;

use api_gateway::config::ObservabilityConfig;
use api_gateway::lifecycle::shutdown_signal;
use api_gateway::observability::logging;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    routing::any,
    Json, Router,
};
use chrono::{DateTime, Local, TimeZone};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[command(name = "internal-service")]
#[command(about = "Demo backend answering the gateway's demo topics", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:9090")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&ObservabilityConfig::default());

    let app = Router::new()
        .route("/auth/login", any(login))
        .route("/auth/register", any(register))
        .route("/profile/get", any(profile_get))
        .route("/profile/update", any(profile_update))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&args.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Internal service running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn login(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    log_request(&method, &uri, &headers, &body);
    Json(json!({ "token": format!("fake-jwt-token-{}", clock()) }))
}

async fn register(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    log_request(&method, &uri, &headers, &body);
    let fields = fields(&body);
    Json(json!({
        "user_id": format!("user-{}", clock()),
        "username": fields.get("login").cloned().unwrap_or_default(),
        "status": "registered",
    }))
}

async fn profile_get(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    log_request(&method, &uri, &headers, &body);
    Json(json!({
        "user_id": "user-123",
        "username": "alice",
        "email": "alice@example.com",
    }))
}

async fn profile_update(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    log_request(&method, &uri, &headers, &body);
    let fields = fields(&body);
    Json(json!({
        "status": "updated",
        "username": fields.get("username").cloned().unwrap_or_default(),
        "email": fields.get("email").cloned().unwrap_or_default(),
    }))
}

fn log_request(method: &Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) {
    let headers: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect();
    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        body = %String::from_utf8_lossy(body),
        "Received request"
    );
}

/// Flat string fields of a JSON object body; anything else reads as empty.
fn fields(body: &Bytes) -> HashMap<String, String> {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Current local time of day as `HHMMSS`.
fn clock() -> String {
    time_of_day(&Local::now())
}

fn time_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%H%M%S").to_string()
}
