// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Email dispatch.
//!
//! [`ResendMailer`] posts to an HTTP email API with a bounded timeout.
//! [`RecordingMailer`] keeps sent messages in memory for tests and local runs.

use crate::config::EmailConfig;
use crate::error::MailerError;
use crate::notification::OutboundEmail;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, error};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}

/// Request body for the provider API.
#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// HTTP email provider client.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MailerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let api_key = self.api_key.as_deref().ok_or(MailerError::NotConfigured)?;

        let body = SendEmailBody {
            from: &email.from,
            to: [email.to.as_str()],
            reply_to: &email.reply_to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailerError::Timeout
                } else {
                    MailerError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Email provider accepted message");
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                detail = %detail.chars().take(500).collect::<String>(),
                "Email provider rejected message"
            );
            Err(MailerError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// In-memory mailer that records every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails like an unreachable provider.
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `send` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<OutboundEmail> {
        self.sent().pop()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailerError::Transport(
                "connection refused by recording mailer".to_string(),
            ));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(email.clone());
        Ok(())
    }
}
