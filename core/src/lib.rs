//! Synchronous client for the WHMCS billing automation API.
//!
//! # Overview
//! Every remote operation is one form-encoded POST to a single endpoint.
//! The `Dispatcher` authenticates, encodes and classifies; the bridges in
//! `resources` translate idiomatic calls into wire actions and parse the
//! replies into typed records.
//!
//! # Design
//! - I/O sits behind the `Transport` trait. `Dispatcher::build_request` and
//!   `Dispatcher::parse_response` are pure, so the whole crate can be driven
//!   by an in-memory transport.
//! - Remote failures are classified by a static message table into
//!   `ErrorKind`; anything unrecognized is `ErrorKind::Unknown`.
//! - Records keep a handle to the bridge that produced them, so
//!   `invoice.capture_payment(None)` needs no extra arguments.
//! - Field names on `update` are checked against each bridge's `FieldMap`;
//!   unknown names are rejected before a request is built.

pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod params;
pub mod php;
pub mod resource;
pub mod resources;
pub mod wire;

pub use client::WhmcsClient;
pub use config::{ApiVersion, Config};
pub use dispatch::{Action, Dispatcher};
pub use error::{ApiError, ErrorKind, RemoteError, Result, TransportError};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use params::{Changes, CustomFields, Params};
pub use resource::{getid, AsLookup, Bridge, Lookup};
