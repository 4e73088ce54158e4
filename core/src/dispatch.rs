//! The single request chokepoint: authentication, encoding, one round-trip,
//! and success/error classification.
//!
//! # Design
//! `Dispatcher` holds the read-only `Config` and a shared `Transport`, and
//! nothing else. Like the other build/parse pairs in this crate, request
//! construction (`build_request`) and response interpretation
//! (`parse_response`) are separate pure steps; `send_request` only glues
//! them around `Transport::execute`. Each call is independent, so one
//! dispatcher can be used from several threads at once.

use std::fmt;
use std::sync::Arc;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde_json::Value;

use crate::classify::classify;
use crate::config::Config;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport, FORM_CONTENT_TYPE};
use crate::params::Params;
use crate::php;

/// Requested response format; the alternative is the legacy tag format.
const RESPONSE_TYPE: &str = "json";

macro_rules! actions {
    ($($variant:ident => $wire:literal),* $(,)?) => {
        /// Every remote operation this crate issues.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Action {
            $($variant),*
        }

        impl Action {
            pub const ALL: &'static [Action] = &[$(Action::$variant),*];

            /// Wire name of the action.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Action::$variant => $wire),*
                }
            }
        }
    };
}

actions! {
    AddClient => "addclient",
    GetClientsDetails => "getclientsdetails",
    UpdateClient => "updateclient",
    DeleteClient => "deleteclient",
    CloseClient => "closeclient",
    GetClientsProducts => "getclientsproducts",
    AddPayMethod => "addpaymethod",
    ValidateLogin => "validatelogin",
    WhmcsDetails => "whmcsdetails",
    CreateInvoice => "createinvoice",
    GetInvoice => "getinvoice",
    GetInvoices => "getinvoices",
    UpdateInvoice => "updateinvoice",
    CapturePayment => "capturepayment",
    AddOrder => "addorder",
    GetOrders => "getorders",
    AcceptOrder => "acceptorder",
    CancelOrder => "cancelorder",
    DeleteOrder => "deleteorder",
    GetProducts => "getproducts",
    GetPromotions => "getpromotions",
    OpenTicket => "openticket",
    GetTicket => "getticket",
    GetTickets => "gettickets",
    UpdateTicket => "updateticket",
    DeleteTicket => "deleteticket",
    AddTicketReply => "addticketreply",
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends authenticated actions to the configured endpoint.
#[derive(Clone)]
pub struct Dispatcher {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Perform `action` with `params` and return the success body untouched.
    ///
    /// Transport failures are returned as-is; every remote failure is
    /// classified into a `RemoteError`.
    pub fn send_request(&self, action: Action, params: Params) -> Result<Value> {
        let request = self.build_request(action, &params);
        tracing::debug!(
            action = %action,
            url = %request.url,
            fields = ?params.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            "dispatching request"
        );
        let response = self.transport.execute(&request)?;
        tracing::debug!(action = %action, status = response.status, "received response");
        self.parse_response(action, response)
    }

    /// Build the form POST for `action`.
    ///
    /// The credential fields come first, then the custom-fields blob when
    /// present, then the caller's parameters.
    pub fn build_request(&self, action: Action, params: &Params) -> HttpRequest {
        let mut form = vec![
            ("username".to_string(), self.config.username.clone()),
            ("password".to_string(), password_digest(&self.config.password)),
            ("responsetype".to_string(), RESPONSE_TYPE.to_string()),
            ("action".to_string(), action.as_str().to_string()),
        ];
        if let Some(custom_fields) = params.custom_fields() {
            let serialized = php::serialize(&custom_fields.to_php());
            form.push(("customfields".to_string(), BASE64_STANDARD.encode(serialized)));
        }
        form.extend(
            params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_wire())),
        );

        HttpRequest {
            url: self.config.api_url.clone(),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            form,
        }
    }

    /// Interpret the response to `action`.
    ///
    /// Non-2xx is always an error. A 2xx body whose top-level `result` or
    /// `status` is `"error"` is an error too.
    pub fn parse_response(&self, action: Action, response: HttpResponse) -> Result<Value> {
        if !response.is_success() {
            return Err(classify(action, response.status, &response.body).into());
        }
        let content: Value = serde_json::from_str(&response.body)?;
        if is_error_body(&content) {
            return Err(classify(action, response.status, &response.body).into());
        }
        Ok(content)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lower-case hex MD5 of the plaintext password, computed per request.
fn password_digest(password: &str) -> String {
    format!("{:x}", md5::compute(password.as_bytes()))
}

fn is_error_body(content: &Value) -> bool {
    ["result", "status"]
        .iter()
        .any(|key| content.get(key).and_then(Value::as_str) == Some("error"))
}
