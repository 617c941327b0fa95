// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Input cleanup for inbound submissions and HTML escaping for the
//! notification email.

use crate::models::ContactRequest;
use crate::validator::ContactForm;

/// A submission after trimming and control-character removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    pub form: ContactForm,
    pub honeypot: Option<String>,
}

impl SanitizedSubmission {
    /// A non-blank honeypot marks the submission as automated.
    pub fn is_bot(&self) -> bool {
        self.honeypot
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }
}

/// Clean an inbound request. The honeypot is kept verbatim.
pub fn sanitize(request: ContactRequest) -> SanitizedSubmission {
    SanitizedSubmission {
        form: sanitize_form(&ContactForm {
            name: request.name,
            email: request.email,
            message: request.message,
        }),
        honeypot: request.honeypot,
    }
}

/// Trim every field and drop control characters.
///
/// Newlines and tabs survive in the message; single-line fields lose them.
/// Length ceilings are enforced by validation, never by truncation here.
pub fn sanitize_form(form: &ContactForm) -> ContactForm {
    ContactForm {
        name: clean_line(&form.name),
        email: clean_line(&form.email),
        message: clean_multiline(&form.message),
    }
}

fn clean_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn clean_multiline(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Escape markup-significant characters for interpolation into HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
