// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Security tests for the contact service.
//!
//! These tests replay hostile traffic patterns and check that bots, floods
//! and markup injection never reach the owner's inbox in a harmful form.

mod harness;

use async_trait::async_trait;
use axum::http::StatusCode;
use harness::{configured, generators, jane, TestApp};
use portfolio_contact::{
    error::MailerError,
    mailer::Mailer,
    notification::OutboundEmail,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_bot_flood_is_silently_absorbed() {
    let app = TestApp::new();
    let ips = generators::generate_ips(200);
    let honeypots = generators::generate_bot_honeypots();

    for (i, ip) in ips.iter().enumerate() {
        let body = generators::submission(
            "Totally Human",
            "bot@spam.example",
            "Buy cheap followers today at our site",
            Some(honeypots[i % honeypots.len()]),
        );
        let res = app.post_json(Some(ip), &body).await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["success"], true);
        assert!(res.body.get("error").is_none());
    }

    assert_eq!(app.mailer.attempts(), 0);
    assert_eq!(app.state.metrics.count("bot_detected"), 200);
}

#[tokio::test]
async fn test_bot_still_consumes_rate_limit() {
    let app = TestApp::new();
    let body = generators::submission(
        "Totally Human",
        "bot@spam.example",
        "Buy cheap followers today",
        Some("x"),
    );
    for _ in 0..3 {
        assert_eq!(app.post_json(Some("10.9.9.9"), &body).await.status, StatusCode::OK);
    }
    let res = app.post_json(Some("10.9.9.9"), &body).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_markup_never_reaches_html_verbatim() {
    let app = TestApp::with_config(portfolio_contact::config::Config {
        rate_limit: portfolio_contact::config::RateLimitConfig {
            max_submissions: 1_000,
            ..Default::default()
        },
        ..configured()
    });

    for payload in generators::generate_markup_payloads() {
        let message = format!("{payload} hello there");
        let body = generators::submission(&format!("{payload}x"), "jane@x.com", &message, None);
        let res = app.post_json(None, &body).await;
        assert_eq!(res.status, StatusCode::OK, "payload {payload:?}");

        let email = app.mailer.last().unwrap();
        assert!(!email.html.contains(payload), "payload {payload:?} in html");
        assert!(email.text.contains(payload));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_from_one_client() {
    let app = Arc::new(TestApp::new());

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.post_json(Some("172.16.0.1"), &jane()).await.status })
        })
        .collect();

    let mut ok = 0;
    let mut limited = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(ok, 3);
    assert_eq!(limited, 17);
    assert_eq!(app.mailer.attempts(), 3);
    assert_eq!(app.limiter.record("172.16.0.1").await.unwrap().count, 3);
}

#[tokio::test]
async fn test_oversized_body_rejected_before_dispatch() {
    let app = TestApp::new();
    let body = json!({
        "name": "Jane Doe",
        "email": "jane@x.com",
        "message": "m".repeat(20 * 1024),
    });

    let res = app.post_json(Some("10.1.1.1"), &body).await;

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["error"], "Request body too large");
    assert_eq!(
        res.body["message"],
        "Your message is too long. Please shorten it and try again."
    );
    assert_eq!(app.mailer.attempts(), 0);
    assert_eq!(app.state.metrics.count("too_large"), 1);
}

#[tokio::test]
async fn test_oversized_bodies_count_against_rate_limit() {
    let app = TestApp::new();
    let huge = "x".repeat(20 * 1024);

    for _ in 0..3 {
        let res = app.post_raw(Some("10.1.1.2"), huge.clone()).await;
        assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    }
    assert_eq!(app.limiter.record("10.1.1.2").await.unwrap().count, 3);

    let res = app.post_json(Some("10.1.1.2"), &jane()).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_overlong_message_rejected_not_truncated() {
    let app = TestApp::new();
    let body = generators::submission("Jane Doe", "jane@x.com", &"m".repeat(2001), None);

    let res = app.post_json(None, &body).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Message must be at most 2000 characters");
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn test_header_injection_in_name_is_flattened() {
    let app = TestApp::new();
    let body = generators::submission(
        "Jane\r\nBcc: victim@example.com",
        "jane@x.com",
        "Hello, I'd like to connect about a role.",
        None,
    );

    let res = app.post_json(None, &body).await;
    assert_eq!(res.status, StatusCode::OK);

    let email = app.mailer.last().unwrap();
    assert!(!email.subject.contains('\n'));
    assert!(!email.subject.contains('\r'));
}

#[tokio::test]
async fn test_spoofed_forwarded_chain_uses_first_hop() {
    let app = TestApp::new();
    for _ in 0..3 {
        app.post_json(Some("198.18.0.1, 10.0.0.1"), &jane()).await;
    }
    assert!(app.limiter.record("198.18.0.1").await.is_some());
    assert!(app.limiter.record("10.0.0.1").await.is_none());
}

/// Panics on every send.
struct PanickingMailer;

#[async_trait]
impl Mailer for PanickingMailer {
    async fn send(&self, _email: &OutboundEmail) -> Result<(), MailerError> {
        panic!("provider client blew up");
    }
}

#[tokio::test]
async fn test_panic_is_reported_generically() {
    let app = TestApp::with_mailer(configured(), Arc::new(PanickingMailer));

    let res = app.post_json(None, &jane()).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["success"], false);
    assert_eq!(
        res.body["message"],
        "An unexpected error occurred. Please try again later."
    );
    assert!(!res.body.to_string().contains("blew up"));
}
