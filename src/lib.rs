// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Portfolio Contact
//!
//! The contact form pipeline behind a personal portfolio site:
//!
//! - Per-IP fixed window rate limiting (3 submissions per hour default)
//! - Field sanitization and validation shared with the form controller
//! - Honeypot bot filtering with a success-shaped response
//! - Owner notification email with HTML-escaped submitter content
//! - Uniform JSON results with generic operational errors

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod form;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod models;
pub mod notification;
pub mod routes;
pub mod sanitize;
pub mod validator;

pub use config::Config;
pub use handlers::{AppState, SubmissionOutcome};
pub use limiter::{InMemoryRateLimiter, RateLimitDecision, RateLimitStore};
pub use mailer::{Mailer, RecordingMailer, ResendMailer};
pub use routes::build_router;
pub use validator::{validate, ContactForm, ValidationReport};
