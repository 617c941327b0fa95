// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form field validation.
//!
//! The same [`validate`] runs in the form controller before a request is sent
//! and in the submission handler after sanitization, so both sides always
//! agree on whether a form is acceptable.
//!
//! - Name: required, bounded length
//! - Email: required, `local@domain.tld` shape, bounded length
//! - Message: minimum and maximum length

use crate::config::ValidationConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// A form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Message,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::Message];
}

/// Validation error types. The display text is shown to the submitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("Email is required")]
    EmailRequired,

    #[error("Please enter a valid email address")]
    EmailInvalid,

    #[error("Email must be at most {max} characters")]
    EmailTooLong { max: usize },

    #[error("Message must be at least {min} characters")]
    MessageTooShort { min: usize },

    #[error("Message must be at most {max} characters")]
    MessageTooLong { max: usize },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::NameRequired | FieldError::NameTooLong { .. } => Field::Name,
            FieldError::EmailRequired
            | FieldError::EmailInvalid
            | FieldError::EmailTooLong { .. } => Field::Email,
            FieldError::MessageTooShort { .. } | FieldError::MessageTooLong { .. } => {
                Field::Message
            }
        }
    }
}

/// Contact form values as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Message => self.message = value,
        }
    }
}

/// Outcome of validating a whole form. Errors keep field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn errors_for(&self, field: Field) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |e| e.field() == field)
    }

    /// All messages joined with ", ".
    pub fn joined(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Whether `email` has the `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// Validate a single field.
pub fn validate_field(field: Field, value: &str, limits: &ValidationConfig) -> Vec<FieldError> {
    let value = value.trim();
    let len = value.chars().count();
    let mut errors = Vec::new();

    match field {
        Field::Name => {
            if value.is_empty() {
                errors.push(FieldError::NameRequired);
            } else if len > limits.max_name_len {
                errors.push(FieldError::NameTooLong {
                    max: limits.max_name_len,
                });
            }
        }
        Field::Email => {
            if value.is_empty() {
                errors.push(FieldError::EmailRequired);
            } else if len > limits.max_email_len {
                errors.push(FieldError::EmailTooLong {
                    max: limits.max_email_len,
                });
            } else if !is_valid_email(value) {
                errors.push(FieldError::EmailInvalid);
            }
        }
        Field::Message => {
            if len < limits.min_message_len {
                errors.push(FieldError::MessageTooShort {
                    min: limits.min_message_len,
                });
            } else if len > limits.max_message_len {
                errors.push(FieldError::MessageTooLong {
                    max: limits.max_message_len,
                });
            }
        }
    }

    errors
}

/// Validate a complete contact form.
pub fn validate(form: &ContactForm, limits: &ValidationConfig) -> ValidationReport {
    let errors: Vec<FieldError> = Field::ALL
        .iter()
        .flat_map(|&field| validate_field(field, form.get(field), limits))
        .collect();

    if !errors.is_empty() {
        debug!(count = errors.len(), "Contact form failed validation");
    }

    ValidationReport { errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ValidationConfig {
        ValidationConfig::default()
    }

    #[test]
    fn test_valid_form() {
        let form = ContactForm::new(
            "Jane Doe",
            "jane@x.com",
            "Hello, I'd like to connect about a role.",
        );
        assert!(validate(&form, &limits()).is_valid());
    }

    #[test]
    fn test_all_fields_reported_together() {
        let form = ContactForm::new("", "bad", "hi");
        let report = validate(&form, &limits());
        assert_eq!(
            report.errors(),
            &[
                FieldError::NameRequired,
                FieldError::EmailInvalid,
                FieldError::MessageTooShort { min: 10 },
            ]
        );
        assert_eq!(
            report.joined(),
            "Name is required, Please enter a valid email address, Message must be at least 10 characters"
        );
    }

    #[test]
    fn test_whitespace_only_name_is_missing() {
        let form = ContactForm::new("   \t", "jane@x.com", "long enough message");
        let report = validate(&form, &limits());
        assert_eq!(report.errors(), &[FieldError::NameRequired]);
    }

    #[test]
    fn test_message_length_counts_trimmed_characters() {
        assert!(!validate_field(Field::Message, "   123456789   ", &limits()).is_empty());
        assert!(validate_field(Field::Message, "  1234567890  ", &limits()).is_empty());
        // Multi-byte characters count once each
        assert!(validate_field(Field::Message, "éééééééééé", &limits()).is_empty());
    }

    #[test]
    fn test_length_ceilings() {
        let limits = limits();
        let long_name = "a".repeat(limits.max_name_len + 1);
        assert_eq!(
            validate_field(Field::Name, &long_name, &limits),
            vec![FieldError::NameTooLong { max: 200 }]
        );

        let long_message = "m".repeat(limits.max_message_len + 1);
        assert_eq!(
            validate_field(Field::Message, &long_message, &limits),
            vec![FieldError::MessageTooLong { max: 2000 }]
        );

        let long_email = format!("{}@example.com", "l".repeat(250));
        assert_eq!(
            validate_field(Field::Email, &long_email, &limits),
            vec![FieldError::EmailTooLong { max: 254 }]
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
        assert!(!is_valid_email("bad"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("jane doe@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("jane@@x.com"));
    }

    #[test]
    fn test_errors_for_field() {
        let report = validate(&ContactForm::new("", "", ""), &limits());
        assert_eq!(report.errors_for(Field::Email).count(), 1);
        assert_eq!(
            report.errors_for(Field::Email).next(),
            Some(&FieldError::EmailRequired)
        );
    }
}
