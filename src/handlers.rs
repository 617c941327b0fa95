// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact service.
//!
//! A submission runs through these gates in order and stops at the first
//! one that fails:
//!
//! 1. Per-IP rate limit
//! 2. Body size and JSON parsing
//! 3. Sanitization and field validation
//! 4. Honeypot check (bots get a normal success response and no email)
//! 5. Email provider configuration
//! 6. Email dispatch
//!
//! Every path ends in a [`SubmissionOutcome`], which is turned into a status
//! code and body in exactly one place.

use crate::clock::Clock;
use crate::config::Config;
use crate::limiter::{RateLimitDecision, RateLimitStore};
use crate::mailer::Mailer;
use crate::metrics::ContactMetrics;
use crate::models::{ContactRequest, SubmissionResult};
use crate::notification::build_notification;
use crate::sanitize::sanitize;
use crate::validator::{validate, ValidationReport};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Thank you for your message! I'll get back to you soon.";

/// Bucket shared by every request that carries no client address headers.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Shared application state.
pub struct AppState {
    pub limiter: Arc<dyn RateLimitStore>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub metrics: ContactMetrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Method-not-allowed body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Email dispatched
    Sent,
    /// Honeypot filled in; answered like `Sent` without sending anything
    BotDetected,
    RateLimited {
        reset_at: DateTime<Utc>,
        retry_after_secs: u64,
    },
    Invalid(ValidationReport),
    Malformed,
    /// Body exceeded the router's size limit
    TooLarge,
    ConfigMissing,
    DispatchFailed,
    /// Anything unexpected, including a panic in the handler
    Internal,
}

impl SubmissionOutcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Sent => "sent",
            SubmissionOutcome::BotDetected => "bot_detected",
            SubmissionOutcome::RateLimited { .. } => "rate_limited",
            SubmissionOutcome::Invalid(_) => "invalid",
            SubmissionOutcome::Malformed => "malformed",
            SubmissionOutcome::TooLarge => "too_large",
            SubmissionOutcome::ConfigMissing => "config_missing",
            SubmissionOutcome::DispatchFailed => "dispatch_failed",
            SubmissionOutcome::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SubmissionOutcome::Sent | SubmissionOutcome::BotDetected => StatusCode::OK,
            SubmissionOutcome::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubmissionOutcome::Invalid(_) | SubmissionOutcome::Malformed => {
                StatusCode::BAD_REQUEST
            }
            SubmissionOutcome::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            SubmissionOutcome::ConfigMissing
            | SubmissionOutcome::DispatchFailed
            | SubmissionOutcome::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> SubmissionResult {
        match self {
            SubmissionOutcome::Sent | SubmissionOutcome::BotDetected => {
                SubmissionResult::ok(SUCCESS_MESSAGE)
            }
            SubmissionOutcome::RateLimited { reset_at, .. } => SubmissionResult::failure(
                format!(
                    "Too many submissions. Please try again after {}.",
                    retry_clock_time(*reset_at).format("%H:%M UTC")
                ),
                "Rate limit exceeded",
            ),
            SubmissionOutcome::Invalid(report) => {
                SubmissionResult::failure("Validation failed", report.joined())
            }
            SubmissionOutcome::Malformed => SubmissionResult::failure(
                "Invalid request format",
                "Request body must be valid JSON",
            ),
            SubmissionOutcome::TooLarge => SubmissionResult::failure(
                "Your message is too long. Please shorten it and try again.",
                "Request body too large",
            ),
            SubmissionOutcome::ConfigMissing => SubmissionResult::failure(
                "Email service is not configured. Please try again later.",
                "Server configuration error",
            ),
            SubmissionOutcome::DispatchFailed => SubmissionResult::failure(
                "Failed to send message. Please try again or contact me directly.",
                "Email delivery failed",
            ),
            SubmissionOutcome::Internal => SubmissionResult::failure(
                "An unexpected error occurred. Please try again later.",
                "Internal server error",
            ),
        }
    }
}

/// The first whole minute at or after `reset_at`, so the advertised time is
/// never earlier than the window's end.
fn retry_clock_time(reset_at: DateTime<Utc>) -> DateTime<Utc> {
    let floor = reset_at
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(reset_at);
    if floor < reset_at {
        floor
            .checked_add_signed(chrono::Duration::minutes(1))
            .unwrap_or(reset_at)
    } else {
        floor
    }
}

impl IntoResponse for SubmissionOutcome {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        if let SubmissionOutcome::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

/// Resolve the client address from proxy headers.
///
/// Uses the first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// [`UNKNOWN_CLIENT`].
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "portfolio-contact",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Any method other than POST on the contact endpoint.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorResponse {
            error: "Method not allowed",
        }),
    )
        .into_response()
}

/// `POST /api/contact`
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = body.map_err(|rejection| rejection.status());
    let outcome = process_submission(&state, &headers, body.as_deref().map_err(|s| *s)).await;
    state.metrics.record(outcome.label());
    outcome.into_response()
}

/// Run a submission through every gate and report how it ended.
///
/// `body` carries the status of the body extraction failure when the raw
/// body could not be read, so oversized bodies still count against the
/// rate limit.
pub async fn process_submission(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<&[u8], StatusCode>,
) -> SubmissionOutcome {
    let ip = client_ip(headers);

    match state.limiter.check_and_increment(&ip).await {
        RateLimitDecision::Allowed { remaining, .. } => {
            debug!(ip = %ip, remaining, "Submission within rate limit");
        }
        RateLimitDecision::Denied {
            reset_at,
            retry_after,
        } => {
            info!(
                ip = %ip,
                retry_after_secs = retry_after.as_secs(),
                "Submission rate limited"
            );
            return SubmissionOutcome::RateLimited {
                reset_at,
                retry_after_secs: retry_after.as_secs(),
            };
        }
    }

    let body = match body {
        Ok(body) => body,
        Err(StatusCode::PAYLOAD_TOO_LARGE) => {
            info!(ip = %ip, "Submission body over size limit");
            return SubmissionOutcome::TooLarge;
        }
        Err(status) => {
            debug!(ip = %ip, status = status.as_u16(), "Submission body unreadable");
            return SubmissionOutcome::Malformed;
        }
    };

    let request: ContactRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => {
            debug!(ip = %ip, error = %err, "Malformed submission body");
            return SubmissionOutcome::Malformed;
        }
    };

    let submission = sanitize(request);

    let report = validate(&submission.form, &state.config.validation);
    if !report.is_valid() {
        info!(ip = %ip, errors = %report.joined(), "Submission failed validation");
        return SubmissionOutcome::Invalid(report);
    }

    if submission.is_bot() {
        warn!(ip = %ip, "Honeypot filled, dropping submission");
        return SubmissionOutcome::BotDetected;
    }

    let credentials = match state.config.email.credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            warn!(error = %err, "Email service is not configured");
            return SubmissionOutcome::ConfigMissing;
        }
    };

    let email = build_notification(&submission.form, &credentials, state.clock.now());

    match state.mailer.send(&email).await {
        Ok(()) => {
            info!(ip = %ip, "Contact submission delivered");
            SubmissionOutcome::Sent
        }
        Err(err) => {
            error!(ip = %ip, error = %err, "Failed to deliver contact submission");
            SubmissionOutcome::DispatchFailed
        }
    }
}

/// Turn a handler panic into the generic 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(detail = %detail, "Handler panicked");
    SubmissionOutcome::Internal.into_response()
}
