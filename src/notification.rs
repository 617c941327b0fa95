// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification email sent to the site owner for each accepted submission.

use crate::config::EmailCredentials;
use crate::sanitize::escape_html;
use crate::validator::ContactForm;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Message handed to the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Build the owner notification. `form` must already be sanitized and valid.
pub fn build_notification(
    form: &ContactForm,
    credentials: &EmailCredentials,
    received_at: DateTime<Utc>,
) -> OutboundEmail {
    let received = received_at.format("%Y-%m-%d %H:%M UTC").to_string();

    OutboundEmail {
        from: credentials.from.clone(),
        to: credentials.to.clone(),
        reply_to: form.email.clone(),
        subject: format!("New contact form submission from {}", form.name),
        html: render_html(form, &received),
        text: render_text(form, &received),
    }
}

fn render_html(form: &ContactForm, received: &str) -> String {
    let name = escape_html(&form.name);
    let email = escape_html(&form.email);
    let message = escape_html(&form.message);

    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; color: #1f2933;">
    <h2>New contact form submission</h2>
    <table cellpadding="4">
      <tr><td><strong>Name</strong></td><td>{name}</td></tr>
      <tr><td><strong>Email</strong></td><td><a href="mailto:{email}">{email}</a></td></tr>
      <tr><td><strong>Received</strong></td><td>{received}</td></tr>
    </table>
    <h3>Message</h3>
    <p style="white-space: pre-wrap;">{message}</p>
  </body>
</html>
"#
    )
}

fn render_text(form: &ContactForm, received: &str) -> String {
    format!(
        "New contact form submission\n\nName: {}\nEmail: {}\nReceived: {}\n\nMessage:\n{}\n",
        form.name, form.email, received, form.message
    )
}
