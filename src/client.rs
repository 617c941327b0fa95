// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client side of `POST /api/contact`.

use crate::models::{ContactRequest, SubmissionResult};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The request never produced an HTTP response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Network error: {0}")]
pub struct TransportError(pub String);

/// HTTP status plus the decoded body, when the body was a submission result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<SubmissionResult>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, request: &ContactRequest) -> Result<TransportResponse, TransportError>;
}

/// Posts submissions as JSON over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SubmissionTransport for HttpTransport {
    async fn submit(&self, request: &ContactRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.json::<SubmissionResult>().await.ok();
        debug!(status, has_body = body.is_some(), "Contact endpoint responded");

        Ok(TransportResponse { status, body })
    }
}
