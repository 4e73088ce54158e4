//! Error types for the billing API client.
//!
//! # Design
//! Every failure the remote service reports lands in `RemoteError`, which
//! always carries the action that triggered it and the raw response body.
//! `ErrorKind` is a flat tag so callers can branch on "not found" versus
//! "validation failed" versus "unknown" without string matching. Transport
//! failures are passed through untouched in `ApiError::Transport`.

use std::fmt;

use thiserror::Error;

use crate::config::ApiVersion;
use crate::dispatch::Action;

pub type Result<T> = std::result::Result<T, ApiError>;

/// The classified category of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ClientNotFound,
    OrderNotFound,
    InvoiceNotFound,
    TicketNotFound,
    ProductNotFound,
    PromotionNotFound,
    /// A lookup that must match one resource matched several.
    ResourceNotUnique,
    DuplicateEmail,
    InvalidEmail,
    InvalidPhoneNumber,
    MissingCustomField,
    /// The calling host is not on the remote API allowlist.
    IpNotWhitelisted,
    /// The API credentials were rejected.
    AuthenticationFailed,
    /// An end-user login (`validatelogin`) was rejected.
    InvalidCredentials,
    /// No table entry matched the remote message.
    Unknown,
}

impl ErrorKind {
    pub fn is_not_found(self) -> bool {
        matches!(
            self,
            ErrorKind::ClientNotFound
                | ErrorKind::OrderNotFound
                | ErrorKind::InvoiceNotFound
                | ErrorKind::TicketNotFound
                | ErrorKind::ProductNotFound
                | ErrorKind::PromotionNotFound
        )
    }

    fn describe(self) -> &'static str {
        match self {
            ErrorKind::ClientNotFound => "client not found",
            ErrorKind::OrderNotFound => "order not found",
            ErrorKind::InvoiceNotFound => "invoice not found",
            ErrorKind::TicketNotFound => "ticket not found",
            ErrorKind::ProductNotFound => "product not found",
            ErrorKind::PromotionNotFound => "promotion not found",
            ErrorKind::ResourceNotUnique => "resource not unique",
            ErrorKind::DuplicateEmail => "duplicate email address",
            ErrorKind::InvalidEmail => "invalid email address",
            ErrorKind::InvalidPhoneNumber => "invalid phone number",
            ErrorKind::MissingCustomField => "missing required custom field",
            ErrorKind::IpNotWhitelisted => "ip address not whitelisted",
            ErrorKind::AuthenticationFailed => "authentication failed",
            ErrorKind::InvalidCredentials => "invalid email or password",
            ErrorKind::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A failure reported by the remote service, tagged with the action that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action}: {kind} ({message})")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub action: Action,
    /// Message as sent by the remote service, original casing preserved.
    pub message: String,
    /// Raw response body, JSON or plain text.
    pub body: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, action: Action, message: impl Into<String>) -> Self {
        Self {
            kind,
            action,
            message: message.into(),
            body: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// A network-level failure raised by a `Transport` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Errors returned by every client and bridge operation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body was not the JSON shape the operation expects.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// Rejected locally before any request was sent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown {resource} field `{field}`")]
    UnknownField {
        resource: &'static str,
        field: String,
    },

    #[error("response is missing required field `{field}`")]
    MissingField { field: String },

    #[error("{feature} requires API version {required}, remote reports {found}")]
    Unsupported {
        feature: &'static str,
        required: ApiVersion,
        found: ApiVersion,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// The remote error kind, if this error came from the remote service.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Remote(err) => Some(err.kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_not_found)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::DeserializationError(err.to_string())
    }
}
