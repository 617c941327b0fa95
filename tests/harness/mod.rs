// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for driving the contact service in-process.

#![allow(dead_code)]

pub mod generators;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use portfolio_contact::{
    clock::ManualClock,
    config::{Config, EmailConfig},
    handlers::AppState,
    limiter::InMemoryRateLimiter,
    mailer::{Mailer, RecordingMailer},
    metrics::ContactMetrics,
    routes::{build_router, CONTACT_PATH},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A service instance with observable collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<ManualClock>,
    pub limiter: Arc<InMemoryRateLimiter>,
}

/// Response status, headers and body (JSON, or `Null` when not JSON).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Config with all three email credentials present.
pub fn configured() -> Config {
    Config {
        email: EmailConfig {
            api_key: Some("re_test_key".to_string()),
            from: Some("Portfolio <site@portfolio.example>".to_string()),
            to: Some("owner@portfolio.example".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(configured())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, Arc::new(RecordingMailer::new()), None)
    }

    /// Use a custom mailer; `mailer` field still records nothing in that case.
    pub fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self::build(config, Arc::new(RecordingMailer::new()), Some(mailer))
    }

    fn build(
        config: Config,
        recorder: Arc<RecordingMailer>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap(),
        ));
        let limiter = Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.clone(),
            clock.clone(),
        ));
        let state = Arc::new(AppState {
            limiter: limiter.clone(),
            mailer: mailer.unwrap_or_else(|| recorder.clone() as Arc<dyn Mailer>),
            clock: clock.clone(),
            metrics: ContactMetrics::new().unwrap(),
            config,
        });

        Self {
            router: build_router(state.clone()),
            state,
            mailer: recorder,
            clock,
            limiter,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// POST a raw body to the contact endpoint from `ip`.
    pub async fn post_raw(&self, ip: Option<&str>, body: impl Into<String>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(CONTACT_PATH)
            .header("content-type", "application/json");
        if let Some(ip) = ip {
            builder = builder.header("x-forwarded-for", ip);
        }
        self.send(builder.body(Body::from(body.into())).unwrap()).await
    }

    pub async fn post_json(&self, ip: Option<&str>, body: &Value) -> TestResponse {
        self.post_raw(ip, body.to_string()).await
    }

    pub async fn call(&self, method: Method, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// The submission used throughout the tests.
pub fn jane() -> Value {
    serde_json::json!({
        "name": "Jane Doe",
        "email": "jane@x.com",
        "message": "Hello, I'd like to connect about a role."
    })
}
