//! Verify request building, response classification and list parsing
//! against JSON vectors stored in `test-vectors/`.
//!
//! Vectors reference actions by variant name and error kinds by their
//! `Debug` spelling, so they stay readable without mirroring the wire.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use whmcs_core::classify::{classify, normalize};
use whmcs_core::{
    Action, ApiError, Bridge, Config, CustomFields, Dispatcher, HttpRequest, HttpResponse,
    Params, Transport, TransportError, WhmcsClient,
};

fn action(name: &str) -> Action {
    *Action::ALL
        .iter()
        .find(|action| format!("{action:?}") == name)
        .unwrap_or_else(|| panic!("unknown action in vector: {name}"))
}

fn config(vectors: &Value) -> Config {
    let c = &vectors["config"];
    Config::new(
        c["api_url"].as_str().unwrap(),
        c["username"].as_str().unwrap(),
        c["password"].as_str().unwrap(),
    )
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let pair = pair.as_array().unwrap();
            (
                pair[0].as_str().unwrap().to_string(),
                pair[1].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

/// Answers every request with the same canned body.
struct Canned(HttpResponse);

impl Transport for Canned {
    fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn request_vectors() {
    let raw = include_str!("../../test-vectors/dispatch.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let dispatcher = Dispatcher::new(
        config(&vectors),
        Arc::new(Canned(HttpResponse::new(200, "{}"))),
    );

    for case in vectors["requests"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut params = Params::new();
        for (key, value) in pairs(&case["params"]) {
            params.push(&key, value);
        }
        if let Some(fields) = case["custom_fields"].as_array() {
            let mut custom = CustomFields::new();
            for field in fields {
                custom.insert(field[0].as_u64().unwrap(), field[1].as_str().unwrap());
            }
            params = params.with_custom_fields(Some(custom));
        }

        let req = dispatcher.build_request(action(case["action"].as_str().unwrap()), &params);
        assert_eq!(req.url, vectors["config"]["api_url"], "{name}: url");
        assert_eq!(req.form, pairs(&case["expected_form"]), "{name}: form");
        assert_eq!(
            req.headers,
            vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )],
            "{name}: headers"
        );
    }
}

#[test]
fn response_vectors() {
    let raw = include_str!("../../test-vectors/dispatch.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let dispatcher = Dispatcher::new(
        config(&vectors),
        Arc::new(Canned(HttpResponse::new(200, "{}"))),
    );

    for case in vectors["responses"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let action = action(case["action"].as_str().unwrap());
        let response = HttpResponse::new(
            case["status"].as_u64().unwrap() as u16,
            case["body"].as_str().unwrap(),
        );
        let expect = &case["expect"];
        let result = dispatcher.parse_response(action, response);

        if let Some(body) = expect.get("ok") {
            assert_eq!(&result.unwrap(), body, "{name}");
        } else if expect.get("deserialization").is_some() {
            assert!(
                matches!(result, Err(ApiError::DeserializationError(_))),
                "{name}: {result:?}"
            );
        } else {
            match result {
                Err(ApiError::Remote(remote)) => {
                    assert_eq!(format!("{:?}", remote.kind), expect["kind"], "{name}: kind");
                    assert_eq!(remote.message, expect["message"], "{name}: message");
                    assert_eq!(remote.action, action, "{name}: action");
                    assert_eq!(remote.body, case["body"], "{name}: body");
                }
                other => panic!("{name}: expected a remote error, got {other:?}"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[test]
fn classify_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let message = case["message"].as_str().unwrap();
        let body = serde_json::json!({ "result": "error", "message": message }).to_string();
        for action in [Action::GetClientsDetails, Action::CancelOrder] {
            let err = classify(action, 200, &body);
            assert_eq!(format!("{:?}", err.kind), case["kind"], "{message:?}");
            assert_eq!(err.action, action, "{message:?}");
            assert_eq!(normalize(&err.message), normalize(message));
        }
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[test]
fn list_vectors() {
    let raw = include_str!("../../test-vectors/lists.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let client = WhmcsClient::with_transport(
            Config::new("https://billing.example.com/includes/api.php", "api", "secret"),
            Arc::new(Canned(HttpResponse::new(200, case["body"].to_string()))),
        );
        let found: Vec<u64> = match case["resource"].as_str().unwrap() {
            "invoices" => ids(client.invoices().list(&Default::default())),
            "orders" => ids(client.orders().list(&Default::default())),
            "tickets" => ids(client.tickets().list(&Default::default())),
            "products" => ids(client.products().list(&Default::default())),
            "promotions" => ids(client.promotions().list(&Default::default())),
            other => panic!("{name}: unknown resource {other}"),
        };
        let expected: Vec<u64> = case["expected_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|id| id.as_u64().unwrap())
            .collect();
        assert_eq!(found, expected, "{name}");
    }
}

/// Ids read back through each record's serialized form.
fn ids<R: Serialize>(records: whmcs_core::Result<Vec<R>>) -> Vec<u64> {
    records
        .unwrap()
        .iter()
        .map(|record| serde_json::to_value(record).unwrap()["id"].as_u64().unwrap())
        .collect()
}
