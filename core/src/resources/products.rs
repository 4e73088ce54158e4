//! Product catalogue, read only.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::dispatch::{Action, Dispatcher};
use crate::error::{ErrorKind, RemoteError, Result};
use crate::params::Params;
use crate::resource::{getid, record_lookup, AsLookup, Bridge};
use crate::wire::{collection, count, Fields};

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub product_id: Option<u64>,
    pub group_id: Option<u64>,
    /// Provisioning module name, e.g. `cpanel`.
    pub module: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: u64,
    pub group_id: Option<u64>,
    /// `hostingaccount`, `reselleraccount`, `server` or `other`.
    pub kind: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub module: Option<String>,
    pub pay_type: Option<String>,
    /// Per-currency pricing table exactly as returned.
    pub pricing: Value,
    #[serde(skip)]
    bridge: ProductBridge,
}

impl Product {
    pub fn refresh(&self) -> Result<Product> {
        self.bridge.get(self)
    }

    fn parse(bridge: &ProductBridge, item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(Product {
            id: f.id("pid")?,
            group_id: f.opt_id("gid"),
            kind: f.opt_text("type"),
            name: f.text("name")?,
            description: f.opt_text("description"),
            module: f.opt_text("module"),
            pay_type: f.opt_text("paytype"),
            pricing: f.raw("pricing").cloned().unwrap_or(Value::Null),
            bridge: bridge.clone(),
        })
    }
}

record_lookup!(Product);

#[derive(Debug, Clone)]
pub struct ProductBridge {
    dispatcher: Arc<Dispatcher>,
}

impl ProductBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn get<T: AsLookup + ?Sized>(&self, target: &T) -> Result<Product> {
        let id = getid(target).require_id(Self::RESOURCE)?;
        let filter = ProductFilter {
            product_id: Some(id),
            ..ProductFilter::default()
        };
        self.list(&filter)?.into_iter().next().ok_or_else(|| {
            RemoteError::new(
                ErrorKind::ProductNotFound,
                Action::GetProducts,
                format!("Product ID {id} not found"),
            )
            .into()
        })
    }
}

impl Bridge for ProductBridge {
    type Record = Product;
    type Filter = ProductFilter;

    const RESOURCE: &'static str = "product";

    fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let params = Params::new()
            .with_opt("pid", filter.product_id)
            .with_opt("gid", filter.group_id)
            .with_opt("module", filter.module.as_deref());
        let body = self.dispatcher.send_request(Action::GetProducts, params)?;
        if count(&body, "totalresults") == 0 {
            return Ok(Vec::new());
        }
        collection(&body, "products", "product")
            .into_iter()
            .map(|item| Product::parse(self, item))
            .collect()
    }
}
