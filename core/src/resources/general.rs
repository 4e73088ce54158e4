//! Account-wide actions that do not belong to one resource family.

use std::sync::Arc;

use crate::config::ApiVersion;
use crate::dispatch::{Action, Dispatcher};
use crate::error::{ApiError, Result};
use crate::params::Params;
use crate::wire::Fields;

/// What the remote installation reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDetails {
    pub version: ApiVersion,
    /// Full version string, e.g. `8.1.0-release.1`.
    pub canonical_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneralBridge {
    dispatcher: Arc<Dispatcher>,
}

impl GeneralBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Check an end user's login and return their user id.
    ///
    /// A rejected login surfaces as `ErrorKind::InvalidCredentials`.
    pub fn validate_login(&self, email: &str, password: &str) -> Result<u64> {
        let params = Params::new().with("email", email).with("password2", password);
        let body = self.dispatcher.send_request(Action::ValidateLogin, params)?;
        Fields::new(&body)?.id("userid")
    }

    pub fn details(&self) -> Result<ServerDetails> {
        let body = self
            .dispatcher
            .send_request(Action::WhmcsDetails, Params::new())?;
        let info = Fields::new(&body)?
            .object("whmcs")
            .ok_or_else(|| ApiError::MissingField {
                field: "whmcs".to_string(),
            })?;
        let raw = info.text("version")?;
        let version = raw.parse::<ApiVersion>().map_err(|_| {
            ApiError::DeserializationError(format!("server reported unparsable version `{raw}`"))
        })?;
        Ok(ServerDetails {
            version,
            canonical_version: info.opt_text("canonicalversion"),
        })
    }

    /// The configured version if set, otherwise what the server reports.
    pub fn api_version(&self) -> Result<ApiVersion> {
        match self.dispatcher.config().api_version {
            Some(version) => Ok(version),
            None => self.details().map(|details| details.version),
        }
    }
}
