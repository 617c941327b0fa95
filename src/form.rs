// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form controller.
//!
//! Holds the values a visitor has typed, validates them with the same rules
//! the server applies, and drives one submission at a time:
//!
//! ```text
//! Idle -> Submitting -> Succeeded (fields cleared)
//!                    -> Failed    (fields kept, retry possible)
//! ```
//!
//! After the first validation pass, edits schedule a debounced re-check of
//! just the edited field.

use crate::client::SubmissionTransport;
use crate::config::ValidationConfig;
use crate::models::ContactRequest;
use crate::sanitize::sanitize_form;
use crate::validator::{validate, validate_field, ContactForm, Field, FieldError, ValidationReport};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub const REVALIDATE_DEBOUNCE: Duration = Duration::from_millis(300);

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Shown when the server answered without a readable result body.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Submitting,
    Succeeded {
        message: String,
    },
    Failed {
        message: String,
        detail: Option<String>,
    },
}

/// Resets a `Submitting` status if the submission future is dropped early.
struct SubmittingGuard<'a> {
    status: &'a mut FormStatus,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if *self.status == FormStatus::Submitting {
            *self.status = FormStatus::Idle;
        }
    }
}

pub struct FormController<T> {
    transport: T,
    limits: ValidationConfig,
    form: ContactForm,
    honeypot: String,
    errors: HashMap<Field, Vec<FieldError>>,
    validated: bool,
    status: FormStatus,
    pending: HashMap<Field, Instant>,
    debounce: Duration,
}

impl<T: SubmissionTransport> FormController<T> {
    pub fn new(transport: T, limits: ValidationConfig) -> Self {
        Self {
            transport,
            limits,
            form: ContactForm::default(),
            honeypot: String::new(),
            errors: HashMap::new(),
            validated: false,
            status: FormStatus::Idle,
            pending: HashMap::new(),
            debounce: REVALIDATE_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Errors currently shown for a field.
    pub fn errors(&self, field: Field) -> &[FieldError] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inputs are disabled while this is true.
    pub fn is_submitting(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    pub fn has_pending_revalidation(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn update_field(&mut self, field: Field, value: impl Into<String>) {
        self.update_field_at(field, value, Instant::now());
    }

    /// Store a new value as of `now`.
    pub fn update_field_at(&mut self, field: Field, value: impl Into<String>, now: Instant) {
        if self.is_submitting() {
            return;
        }

        self.form.set(field, value);

        if matches!(
            self.status,
            FormStatus::Succeeded { .. } | FormStatus::Failed { .. }
        ) {
            self.status = FormStatus::Idle;
        }

        if self.validated {
            self.pending.insert(field, now + self.debounce);
        }
    }

    /// Hidden field value; left blank by people.
    pub fn set_honeypot(&mut self, value: impl Into<String>) {
        self.honeypot = value.into();
    }

    pub fn flush_revalidation(&mut self) -> Vec<Field> {
        self.flush_revalidation_at(Instant::now())
    }

    /// Re-check every field whose debounce deadline has passed by `now`.
    pub fn flush_revalidation_at(&mut self, now: Instant) -> Vec<Field> {
        let due: Vec<Field> = Field::ALL
            .iter()
            .copied()
            .filter(|f| self.pending.get(f).is_some_and(|deadline| *deadline <= now))
            .collect();

        let clean = sanitize_form(&self.form);
        for field in &due {
            self.pending.remove(field);
            let errors = validate_field(*field, clean.get(*field), &self.limits);
            self.set_errors(*field, errors);
        }

        due
    }

    /// Validate the whole form, cleaned the way the server cleans it, and
    /// show the result.
    pub fn validate(&mut self) -> ValidationReport {
        let report = validate(&sanitize_form(&self.form), &self.limits);
        self.errors.clear();
        for field in Field::ALL {
            self.set_errors(field, report.errors_for(field).cloned().collect());
        }
        self.validated = true;
        self.pending.clear();
        report
    }

    /// Validate locally and, if the form passes, send it.
    pub async fn submit(&mut self) -> &FormStatus {
        if self.is_submitting() {
            return &self.status;
        }

        let report = self.validate();
        if !report.is_valid() {
            debug!(errors = %report.joined(), "Form invalid, not submitting");
            self.status = FormStatus::Idle;
            return &self.status;
        }

        let clean = sanitize_form(&self.form);
        let request = ContactRequest {
            name: clean.name,
            email: clean.email,
            message: clean.message,
            honeypot: Some(self.honeypot.clone()),
        };

        {
            self.status = FormStatus::Submitting;
            let guard = SubmittingGuard {
                status: &mut self.status,
            };

            let outcome = self.transport.submit(&request).await;

            *guard.status = match outcome {
                Ok(response) => match (response.is_success(), response.body) {
                    (true, Some(body)) if body.success => {
                        FormStatus::Succeeded {
                            message: body.message,
                        }
                    }
                    (_, Some(body)) => FormStatus::Failed {
                        message: body.message,
                        detail: body.error,
                    },
                    (_, None) => FormStatus::Failed {
                        message: FALLBACK_ERROR_MESSAGE.to_string(),
                        detail: None,
                    },
                },
                Err(err) => {
                    debug!(error = %err, "Contact submission failed to reach server");
                    FormStatus::Failed {
                        message: NETWORK_ERROR_MESSAGE.to_string(),
                        detail: None,
                    }
                }
            };
        }

        if matches!(self.status, FormStatus::Succeeded { .. }) {
            self.form = ContactForm::default();
            self.honeypot.clear();
            self.errors.clear();
            self.pending.clear();
            self.validated = false;
        }

        &self.status
    }

    fn set_errors(&mut self, field: Field, errors: Vec<FieldError>) {
        if errors.is_empty() {
            self.errors.remove(&field);
        } else {
            self.errors.insert(field, errors);
        }
    }
}
