// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for hostile and edge-case submissions.

use serde_json::{json, Value};

/// Generate a pool of distinct client addresses.
pub fn generate_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("10.{}.{}.{}", (i >> 16) & 0xFF, (i >> 8) & 0xFF, i & 0xFF))
        .collect()
}

/// Name candidates, valid and not.
pub fn generate_names() -> Vec<String> {
    vec![
        String::new(),
        "   ".to_string(),
        "\u{0}\u{7}".to_string(),
        "J".to_string(),
        "  Jane Doe  ".to_string(),
        "Zoë Ångström".to_string(),
        "a".repeat(200),
        "a".repeat(201),
        "<b>Mallory</b>".to_string(),
    ]
}

/// Email candidates, valid and not.
pub fn generate_emails() -> Vec<String> {
    vec![
        String::new(),
        "bad".to_string(),
        "jane@x.com".to_string(),
        " jane@x.com ".to_string(),
        "jane@localhost".to_string(),
        "jane doe@x.com".to_string(),
        "jane\n@x.com".to_string(),
        "first.last+tag@sub.example.co.uk".to_string(),
        format!("{}@example.com", "l".repeat(243)),
        format!("{}@example.com", "l".repeat(242)),
    ]
}

/// Message candidates around the length limits.
pub fn generate_messages() -> Vec<String> {
    vec![
        String::new(),
        "hi".to_string(),
        "123456789".to_string(),
        "1234567890".to_string(),
        "   123456789\u{0}   ".to_string(),
        "line one\r\nline two".to_string(),
        "m".repeat(2000),
        "m".repeat(2001),
    ]
}

/// Markup injection payloads that must never reach the email HTML verbatim.
pub fn generate_markup_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert('x')</script>",
        "<img src=x onerror=alert(1)>",
        "\"><svg onload=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "</p><iframe src=\"https://evil.example\"></iframe>",
    ]
}

/// Honeypot values that mark a bot.
pub fn generate_bot_honeypots() -> Vec<&'static str> {
    vec!["x", "https://spam.example", "  filled  ", "0"]
}

/// Build a submission body.
pub fn submission(name: &str, email: &str, message: &str, honeypot: Option<&str>) -> Value {
    let mut body = json!({
        "name": name,
        "email": email,
        "message": message,
    });
    if let Some(h) = honeypot {
        body["honeypot"] = json!(h);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips_unique() {
        let ips = generate_ips(300);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 300);
    }

    #[test]
    fn test_submission_omits_absent_honeypot() {
        assert!(submission("a", "b", "c", None).get("honeypot").is_none());
        assert_eq!(submission("a", "b", "c", Some("x"))["honeypot"], "x");
    }
}
