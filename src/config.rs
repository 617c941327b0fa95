// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact service.
//!
//! Everything is read once at startup by [`Config::from_env`]. Missing email
//! credentials do not stop the service from starting; they surface per
//! submission through [`EmailConfig::credentials`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the contact service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Allowed browser origin for CORS. Permissive when unset.
    #[serde(default)]
    pub cors_allowed_origin: Option<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Field limits shared by client and server validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Email provider configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Per-IP fixed window limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Submissions admitted per IP in one window (default: 3)
    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,

    /// Window length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between sweeps of expired records in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Field length limits, counted in characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    #[serde(default = "default_max_email_len")]
    pub max_email_len: usize,

    #[serde(default = "default_min_message_len")]
    pub min_message_len: usize,

    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

/// Email provider settings. The three credential fields may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address used in the `from` header
    #[serde(default)]
    pub from: Option<String>,

    /// Site owner address receiving notifications
    #[serde(default)]
    pub to: Option<String>,

    /// Provider endpoint (default: https://api.resend.com/emails)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Provider request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Validated provider credentials, only obtainable when all three are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub api_key: String,
    pub from: String,
    pub to: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_submissions() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    3600
}

/// Longest accepted rate limit window: one year.
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_name_len() -> usize {
    200
}

fn default_max_email_len() -> usize {
    254 // RFC 5321 forward-path limit
}

fn default_min_message_len() -> usize {
    10
}

fn default_max_message_len() -> usize {
    2000
}

fn default_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_allowed_origin: None,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            email: EmailConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            max_email_len: default_max_email_len(),
            min_message_len: default_min_message_len(),
            max_message_len: default_max_message_len(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: None,
            to: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl EmailConfig {
    /// Return the credentials, naming the first variable that is absent or blank.
    pub fn credentials(&self) -> Result<EmailCredentials, ConfigError> {
        fn present(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(ConfigError::Missing(name)),
            }
        }

        Ok(EmailCredentials {
            api_key: present(&self.api_key, "RESEND_API_KEY")?,
            from: present(&self.from, "CONTACT_FROM_EMAIL")?,
            to: present(&self.to, "CONTACT_TO_EMAIL")?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Config {
            bind_addr: text("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cors_allowed_origin: text("CORS_ALLOWED_ORIGIN"),
            rate_limit: RateLimitConfig {
                max_submissions: parse_var(&lookup, "CONTACT_MAX_SUBMISSIONS")?
                    .unwrap_or(defaults.rate_limit.max_submissions),
                window_secs: parse_var(&lookup, "CONTACT_WINDOW_SECS")?
                    .unwrap_or(defaults.rate_limit.window_secs),
                sweep_interval_secs: parse_var(&lookup, "CONTACT_SWEEP_INTERVAL_SECS")?
                    .unwrap_or(defaults.rate_limit.sweep_interval_secs),
            },
            validation: ValidationConfig {
                max_name_len: parse_var(&lookup, "CONTACT_MAX_NAME_LEN")?
                    .unwrap_or(defaults.validation.max_name_len),
                max_email_len: parse_var(&lookup, "CONTACT_MAX_EMAIL_LEN")?
                    .unwrap_or(defaults.validation.max_email_len),
                min_message_len: defaults.validation.min_message_len,
                max_message_len: parse_var(&lookup, "CONTACT_MAX_MESSAGE_LEN")?
                    .unwrap_or(defaults.validation.max_message_len),
            },
            email: EmailConfig {
                api_key: text("RESEND_API_KEY"),
                from: text("CONTACT_FROM_EMAIL"),
                to: text("CONTACT_TO_EMAIL"),
                api_url: text("EMAIL_API_URL").unwrap_or(defaults.email.api_url),
                timeout_secs: parse_var(&lookup, "EMAIL_TIMEOUT_SECS")?
                    .unwrap_or(defaults.email.timeout_secs),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED")?
                    .unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        };

        config.check()?;
        Ok(config)
    }

    /// Reject values that would make the service misbehave.
    fn check(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_submissions == 0 {
            return Err(ConfigError::Invalid {
                name: "CONTACT_MAX_SUBMISSIONS",
                value: "0".to_string(),
            });
        }
        if self.rate_limit.window_secs == 0 || self.rate_limit.window_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::Invalid {
                name: "CONTACT_WINDOW_SECS",
                value: self.rate_limit.window_secs.to_string(),
            });
        }
        if self.validation.max_message_len < self.validation.min_message_len {
            return Err(ConfigError::Invalid {
                name: "CONTACT_MAX_MESSAGE_LEN",
                value: self.validation.max_message_len.to_string(),
            });
        }
        if self.email.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "EMAIL_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        match url::Url::parse(&self.email.api_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::Invalid {
                name: "EMAIL_API_URL",
                value: self.email.api_url.clone(),
            }),
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(None),
    }
}
