//! Entry point bundling one dispatcher with every resource bridge.
//!
//! # Design
//! `WhmcsClient` owns nothing but an `Arc<Dispatcher>` shared by all of its
//! bridges, so every bridge and every record they produce talks to the same
//! endpoint with the same credential. The client is cheap to clone and safe
//! to share across threads; the dispatcher keeps no per-call state.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::dispatch::{Action, Dispatcher};
use crate::error::Result;
use crate::http::Transport;
use crate::params::Params;
use crate::resources::clients::ClientBridge;
use crate::resources::general::GeneralBridge;
use crate::resources::invoices::InvoiceBridge;
use crate::resources::orders::OrderBridge;
use crate::resources::products::ProductBridge;
use crate::resources::promotions::PromotionBridge;
use crate::resources::tickets::TicketBridge;

#[derive(Debug, Clone)]
pub struct WhmcsClient {
    dispatcher: Arc<Dispatcher>,
}

impl WhmcsClient {
    /// Client using the blocking `ureq` transport.
    #[cfg(feature = "ureq")]
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(crate::http::UreqTransport::new()))
    }

    /// Client reading its settings from `WHMCS_*` environment variables.
    #[cfg(feature = "ureq")]
    pub fn from_env() -> Result<Self> {
        Config::from_env().map(Self::new)
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(config, transport)),
        }
    }

    pub fn config(&self) -> &Config {
        self.dispatcher.config()
    }

    pub fn clients(&self) -> ClientBridge {
        ClientBridge::new(Arc::clone(&self.dispatcher))
    }

    pub fn invoices(&self) -> InvoiceBridge {
        InvoiceBridge::new(Arc::clone(&self.dispatcher))
    }

    pub fn orders(&self) -> OrderBridge {
        OrderBridge::new(Arc::clone(&self.dispatcher))
    }

    pub fn products(&self) -> ProductBridge {
        ProductBridge::new(Arc::clone(&self.dispatcher))
    }

    pub fn promotions(&self) -> PromotionBridge {
        PromotionBridge::new(Arc::clone(&self.dispatcher))
    }

    pub fn tickets(&self) -> TicketBridge {
        TicketBridge::new(Arc::clone(&self.dispatcher))
    }

    pub fn general(&self) -> GeneralBridge {
        GeneralBridge::new(Arc::clone(&self.dispatcher))
    }

    /// Issue `action` directly and get the raw success body back.
    pub fn send_request(&self, action: Action, params: Params) -> Result<Value> {
        self.dispatcher.send_request(action, params)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::testing::ScriptedTransport;
    use crate::resource::Bridge;
    use crate::resources::invoices::InvoiceFilter;

    fn client(transport: &ScriptedTransport) -> WhmcsClient {
        WhmcsClient::with_transport(
            Config::new("https://billing.example.com/includes/api.php", "api", "secret"),
            Arc::new(transport.clone()),
        )
    }

    #[test]
    fn bridges_share_one_endpoint() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "success", "numreturned": 0 }));
        transport.respond(200, json!({ "result": "success", "totalresults": 0 }));
        let client = client(&transport);

        client.invoices().list(&InvoiceFilter::default()).unwrap();
        client.promotions().list(&Default::default()).unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|r| r.url == "https://billing.example.com/includes/api.php"));
        assert!(requests.iter().all(|r| r.field("username") == Some("api")));
    }

    #[test]
    fn raw_send_request_returns_body() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "success", "whmcs": { "version": "8.1.0" } }));
        let body = client(&transport)
            .send_request(Action::WhmcsDetails, Params::new())
            .unwrap();
        assert_eq!(body["whmcs"]["version"], "8.1.0");
    }

    #[test]
    fn clones_share_dispatcher() {
        let transport = ScriptedTransport::new();
        let client = client(&transport);
        let copy = client.clone();
        assert!(Arc::ptr_eq(&client.dispatcher, &copy.dispatcher));
        assert_eq!(copy.config().username, "api");
    }
}
