use super::gate::AdmissionGate;
use super::identity::{IdentityPolicy, client_identity};
use super::types::{AdmissionDecision, RateLimitedResponse};

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-xss-protection", "1; mode=block"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(), payment=()",
    ),
];

/// Shared state for the admission middleware.
#[derive(Clone)]
pub struct AdmissionState {
    pub gate: Arc<AdmissionGate>,
    pub policy: Arc<IdentityPolicy>,
}

/// Runs every request through the `AdmissionGate` before routing.
pub async fn admit(State(state): State<AdmissionState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(request.headers(), peer, &state.policy);

    let decision = state.gate.check(&client);
    let limit = state.gate.limits().max_requests;

    if !decision.allowed {
        tracing::info!(
            "Rate limit exceeded for client {} (resets in {} ms)",
            client,
            decision.reset_in_ms()
        );
        return rate_limited(limit, &decision);
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    insert_number(headers, HEADER_LIMIT, u64::from(limit));
    insert_number(headers, HEADER_REMAINING, u64::from(decision.remaining));
    response
}

/// Adds the standard browser hardening headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

fn rate_limited(limit: u32, decision: &AdmissionDecision) -> Response {
    let retry_after = decision.retry_after_secs();
    let body = RateLimitedResponse {
        error: "Too Many Requests".to_string(),
        message: "You have exceeded the rate limit. Please try again later.".to_string(),
        retry_after,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    insert_number(headers, HEADER_LIMIT, u64::from(limit));
    insert_number(headers, HEADER_REMAINING, 0);
    insert_number(headers, HEADER_RESET, retry_after);
    response
}

fn insert_number(headers: &mut HeaderMap, name: &'static str, value: u64) {
    headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
}
