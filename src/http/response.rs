//! Responses produced by the proxy itself.
//!
//! # Responsibilities
//! - Build injected error and timeout responses
//! - Mark forwarded responses with the chaos headers
//!
//! # Design Decisions
//! - Injected bodies are JSON with `"chaos": true` so callers can tell them
//!   apart from genuine backend failures
//! - Field order in the bodies is fixed by the structs below

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::config::duration::format_duration;

pub const X_CHAOS_APPLIED: HeaderName = HeaderName::from_static("x-chaos-applied");
pub const X_CHAOS_TIMESTAMP: HeaderName = HeaderName::from_static("x-chaos-timestamp");
pub const X_CHAOS_INJECTED_ERROR: HeaderName = HeaderName::from_static("x-chaos-injected-error");
pub const X_CHAOS_INJECTED_TIMEOUT: HeaderName = HeaderName::from_static("x-chaos-injected-timeout");
pub const X_CHAOS_INJECTED_DELAY: HeaderName = HeaderName::from_static("x-chaos-injected-delay");

const TIMEOUT_MESSAGE: &str = "Request timeout due to chaos engineering";

/// Current wall-clock time, RFC 3339 with second precision.
pub fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Serialize)]
struct InjectedError<'a> {
    error: &'a str,
    code: u16,
    chaos: bool,
    timestamp: String,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct InjectedTimeout {
    error: &'static str,
    code: u16,
    chaos: bool,
    timeout: String,
    timestamp: String,
}

/// The response for an injected error.
pub fn injected_error(code: u16, message: &str, path: &str) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = InjectedError {
        error: message,
        code: status.as_u16(),
        chaos: true,
        timestamp: rfc3339_now(),
        path,
    };

    (
        status,
        [(X_CHAOS_INJECTED_ERROR, status.as_u16().to_string())],
        Json(body),
    )
        .into_response()
}

/// The 504 sent once an injected timeout has elapsed.
pub fn injected_timeout(after: Duration) -> Response {
    let timeout = format_duration(after);
    let body = InjectedTimeout {
        error: TIMEOUT_MESSAGE,
        code: StatusCode::GATEWAY_TIMEOUT.as_u16(),
        chaos: true,
        timeout: timeout.clone(),
        timestamp: rfc3339_now(),
    };

    (
        StatusCode::GATEWAY_TIMEOUT,
        [(X_CHAOS_INJECTED_TIMEOUT, timeout)],
        Json(body),
    )
        .into_response()
}

/// Stamp a forwarded response. A delay that preceded forwarding is reported too.
pub fn mark_forwarded(response: &mut Response, delay: Option<Duration>) {
    let headers = response.headers_mut();
    headers.insert(X_CHAOS_APPLIED, HeaderValue::from_static("true"));
    if let Ok(value) = HeaderValue::from_str(&rfc3339_now()) {
        headers.insert(X_CHAOS_TIMESTAMP, value);
    }
    if let Some(delay) = delay {
        if let Ok(value) = HeaderValue::from_str(&format_duration(delay)) {
            headers.insert(X_CHAOS_INJECTED_DELAY, value);
        }
    }
}
