//! Maps remote error messages onto `ErrorKind`.
//!
//! # Design
//! The remote service reports failures as free text. `MESSAGES` is the
//! complete list of texts this crate recognises; matching is exact equality
//! after trimming and lower-casing. Where the service words the same failure
//! differently across actions, an entry lists every variant. Anything else
//! becomes `ErrorKind::Unknown` with the original message kept verbatim, so
//! classification itself never fails.

use serde_json::Value;

use crate::dispatch::Action;
use crate::error::{ErrorKind, RemoteError};

/// Normalized message texts per error kind.
pub const MESSAGES: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::ClientNotFound, &["client not found", "client id not found"]),
    (ErrorKind::OrderNotFound, &["order id not found", "order not found"]),
    (ErrorKind::InvoiceNotFound, &["invoice id not found", "invoice not found"]),
    (ErrorKind::TicketNotFound, &["ticket id not found", "ticket not found"]),
    (
        ErrorKind::DuplicateEmail,
        &["a user already exists with that email address", "duplicate email address"],
    ),
    (
        ErrorKind::InvalidEmail,
        &["you did not enter a valid email address", "invalid email address"],
    ),
    (
        ErrorKind::InvalidPhoneNumber,
        &["you did not enter a valid phone number", "invalid phone number"],
    ),
    (
        ErrorKind::MissingCustomField,
        &["a required custom field was not provided", "missing required custom field"],
    ),
    (ErrorKind::IpNotWhitelisted, &["invalid ip"]),
    (ErrorKind::AuthenticationFailed, &["authentication failed"]),
    (ErrorKind::InvalidCredentials, &["email or password invalid"]),
];

/// Prefix of the plain-text rejection some deployments send for hosts that
/// are not on the API allowlist, e.g. `Invalid IP 203.0.113.7`.
const IP_REJECTION_PREFIX: &str = "invalid ip";

/// Build the typed error for a failed response to `action`.
pub fn classify(action: Action, status: u16, body: &str) -> RemoteError {
    let (message, key) = extract_message(status, body);
    let kind = lookup(&key).unwrap_or(ErrorKind::Unknown);
    tracing::debug!(action = %action, status, kind = %kind, "classified remote error");
    RemoteError {
        kind,
        action,
        message,
        body: body.to_string(),
    }
}

/// Table lookup on an already normalized message.
pub fn lookup(normalized: &str) -> Option<ErrorKind> {
    MESSAGES
        .iter()
        .find(|(_, texts)| texts.contains(&normalized))
        .map(|(kind, _)| *kind)
}

pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

/// Returns the message to report and the key to match on.
///
/// The IP rejection carries the caller's address, so it is matched on its
/// prefix whether it arrives as plain text or inside a JSON body.
fn extract_message(status: u16, body: &str) -> (String, String) {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        Err(_) if body.trim().is_empty() => return (format!("HTTP {status}"), String::new()),
        Err(_) => body.trim().to_string(),
    };
    let key = normalize(&message);
    if key.starts_with(IP_REJECTION_PREFIX) {
        (message, IP_REJECTION_PREFIX.to_string())
    } else {
        (message, key)
    }
}
