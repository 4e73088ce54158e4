//! Connection settings for the remote API.

use std::fmt;
use std::str::FromStr;

use crate::error::{ApiError, Result};

/// Endpoint and credentials shared by every bridge of one client.
///
/// The password is kept in plaintext for the lifetime of the process and
/// digested immediately before each request.
#[derive(Clone)]
pub struct Config {
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Remote version, if known up front. Consulted by version-gated
    /// operations before they fall back to asking the server.
    pub api_version: Option<ApiVersion>,
}

impl Config {
    pub fn new(api_url: &str, username: &str, password: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            api_version: None,
        }
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Read `WHMCS_API_URL`, `WHMCS_USERNAME`, `WHMCS_PASSWORD` and the
    /// optional `WHMCS_API_VERSION` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::Config(format!("{key} is not set")))
        };
        let mut config = Config::new(
            &require("WHMCS_API_URL")?,
            &require("WHMCS_USERNAME")?,
            &require("WHMCS_PASSWORD")?,
        );
        if let Some(raw) = lookup("WHMCS_API_VERSION").filter(|v| !v.is_empty()) {
            config.api_version = Some(raw.parse()?);
        }
        Ok(config)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// A `major.minor.patch` remote software version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ApiVersion {
    type Err = ApiError;

    /// Accepts `8`, `8.1`, `8.1.0` and tolerates a suffix such as `8.1.0-release.1`.
    fn from_str(s: &str) -> Result<Self> {
        let core = s.trim().split(['-', '+', ' ']).next().unwrap_or_default();
        let mut parts = [0u32; 3];
        let mut seen = 0;
        for (slot, piece) in parts.iter_mut().zip(core.split('.')) {
            *slot = piece
                .parse()
                .map_err(|_| ApiError::Config(format!("invalid API version `{s}`")))?;
            seen += 1;
        }
        if seen == 0 {
            return Err(ApiError::Config(format!("invalid API version `{s}`")));
        }
        Ok(ApiVersion::new(parts[0], parts[1], parts[2]))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_reads_all_fields() {
        let config = Config::from_lookup(env(&[
            ("WHMCS_API_URL", "https://billing.example.com/includes/api.php"),
            ("WHMCS_USERNAME", "api"),
            ("WHMCS_PASSWORD", "secret"),
            ("WHMCS_API_VERSION", "8.1"),
        ]))
        .unwrap();
        assert_eq!(config.username, "api");
        assert_eq!(config.api_version, Some(ApiVersion::new(8, 1, 0)));
    }

    #[test]
    fn from_lookup_requires_password() {
        let err = Config::from_lookup(env(&[
            ("WHMCS_API_URL", "https://billing.example.com/includes/api.php"),
            ("WHMCS_USERNAME", "api"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("WHMCS_PASSWORD")));
    }

    #[test]
    fn debug_redacts_password() {
        let config = Config::new("http://localhost", "api", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn version_parsing_and_ordering() {
        assert_eq!("7.10.2".parse::<ApiVersion>().unwrap(), ApiVersion::new(7, 10, 2));
        assert_eq!("8.0.0-release.1".parse::<ApiVersion>().unwrap(), ApiVersion::new(8, 0, 0));
        assert!(ApiVersion::new(7, 10, 0) > ApiVersion::new(7, 8, 0));
        assert!("seven".parse::<ApiVersion>().is_err());
    }
}
