//! A stand-in for the billing API: one POST endpoint, form fields in, JSON
//! out, backed by an in-memory store.
//!
//! It reproduces the quirks clients have to cope with: failures reported
//! inside 200 responses, list items nested under a plural then singular
//! key, the nested key dropped on empty lists, and numbers sent as strings.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

mod actions;
pub mod php;
pub mod store;

pub use store::Store;

pub const API_PATH: &str = "/includes/api.php";

/// Credentials and behaviour switches for one server instance.
#[derive(Debug, Clone)]
pub struct Settings {
    pub username: String,
    pub password: String,
    /// Version reported by `whmcsdetails`.
    pub version: String,
    /// When set, every request is refused as if from this address.
    pub blocked_ip: Option<String>,
    /// Client custom field that `addclient` insists on.
    pub required_client_field: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: "api".to_string(),
            password: "secret".to_string(),
            version: "8.1.0".to_string(),
            blocked_ip: None,
            required_client_field: None,
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    settings: Arc<Settings>,
}

pub fn app() -> Router {
    app_with(Settings::default())
}

pub fn app_with(settings: Settings) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::seeded())),
        settings: Arc::new(settings),
    };
    Router::new()
        .route(API_PATH, post(api))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Settings::default()).await
}

pub async fn run_with(listener: TcpListener, settings: Settings) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(settings)).await
}

async fn api(State(state): State<AppState>, Form(fields): Form<HashMap<String, String>>) -> Response {
    if let Some(ip) = &state.settings.blocked_ip {
        tracing::info!(%ip, "refusing request from blocked address");
        return (StatusCode::FORBIDDEN, format!("Invalid IP {ip}")).into_response();
    }
    let form = Fields(&fields);
    if !authenticated(&state.settings, &form) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "result": "error", "message": "Authentication Failed" })),
        )
            .into_response();
    }
    if form.text("responsetype") != Some("json") {
        return (StatusCode::BAD_REQUEST, "responsetype must be json").into_response();
    }

    let action = form.text("action").unwrap_or_default().to_lowercase();
    tracing::info!(%action, "dispatching");
    let outcome = {
        let mut store = state.db.write().await;
        actions::dispatch(&mut store, &state.settings, &action, &form)
    };
    match outcome {
        Ok(body) => Json(success(body)).into_response(),
        Err(message) => {
            tracing::info!(%action, %message, "action failed");
            Json(json!({ "result": "error", "message": message })).into_response()
        }
    }
}

fn authenticated(settings: &Settings, form: &Fields<'_>) -> bool {
    let digest = format!("{:x}", md5::compute(settings.password.as_bytes()));
    form.text("username") == Some(settings.username.as_str())
        && form.text("password") == Some(digest.as_str())
}

fn success(body: Value) -> Value {
    let mut out = json!({ "result": "success" });
    if let (Some(out), Value::Object(fields)) = (out.as_object_mut(), body) {
        out.extend(fields);
    }
    out
}

/// Read helpers over the posted form. Empty values count as absent.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a>(&'a HashMap<String, String>);

impl<'a> Fields<'a> {
    pub fn new(fields: &'a HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn owned(&self, key: &str) -> String {
        self.text(key).unwrap_or_default().to_string()
    }

    pub fn id(&self, key: &str) -> Option<u64> {
        self.text(key).and_then(|value| value.trim().parse().ok())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.text(key).and_then(|value| value.trim().parse().ok())
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.text(key), Some("1" | "true" | "on" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_merges_fields_after_result() {
        let body = success(json!({ "clientid": 4 }));
        assert_eq!(body["result"], "success");
        assert_eq!(body["clientid"], 4);
    }

    #[test]
    fn authentication_needs_md5_of_password() {
        let settings = Settings::default();
        let mut fields = HashMap::new();
        fields.insert("username".to_string(), "api".to_string());
        fields.insert("password".to_string(), "secret".to_string());
        assert!(!authenticated(&settings, &Fields(&fields)));

        fields.insert(
            "password".to_string(),
            "5ebe2294ecd0e0f08eab7690d2a6ee69".to_string(),
        );
        assert!(authenticated(&settings, &Fields(&fields)));
    }

    #[test]
    fn empty_form_values_are_absent() {
        let mut fields = HashMap::new();
        fields.insert("companyname".to_string(), String::new());
        fields.insert("currency".to_string(), "2".to_string());
        let form = Fields(&fields);
        assert_eq!(form.text("companyname"), None);
        assert_eq!(form.id("currency"), Some(2));
        assert!(!form.flag("noemail"));
    }
}
