// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the contact service.

use thiserror::Error;

/// Configuration loading and credential errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Email provider errors. Never shown to submitters.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Email provider timed out")]
    Timeout,

    #[error("Email transport error: {0}")]
    Transport(String),

    #[error("Email provider rejected message with status {status}")]
    Rejected { status: u16 },

    #[error("Email provider is not configured")]
    NotConfigured,

    #[error("Failed to build email client: {0}")]
    Client(String),
}

/// Startup errors for the service binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailer error: {0}")]
    Mailer(#[from] MailerError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Invalid bind address: {0}")]
    BindAddr(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
