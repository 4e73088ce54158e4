//! Orders and their lifecycle actions.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::{Action, Dispatcher};
use crate::error::{ErrorKind, RemoteError, Result};
use crate::params::{Changes, CustomFields, FieldMap, Params};
use crate::resource::{getid, record_lookup, AsLookup, Bridge};
use crate::wire::{collection, count, Fields};

pub const FIELDS: FieldMap = FieldMap::new(
    "order",
    &[
        ("client_id", "clientid"),
        ("product_id", "pid"),
        ("payment_method", "paymentmethod"),
        ("billing_cycle", "billingcycle"),
        ("domain", "domain"),
        ("promo_code", "promocode"),
        ("client_ip", "clientip"),
        ("price_override", "priceoverride"),
        ("affiliate_id", "affid"),
        ("no_email", "noemail"),
        ("no_invoice", "noinvoice"),
    ],
);

/// Input for `OrderBridge::create`.
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub client_id: u64,
    pub product_id: u64,
    /// Gateway module name, e.g. `mailin` or `paypal`.
    pub payment_method: String,
    pub billing_cycle: Option<String>,
    pub domain: Option<String>,
    pub promo_code: Option<String>,
    pub client_ip: Option<String>,
    pub price_override: Option<f64>,
    pub affiliate_id: Option<u64>,
    pub custom_fields: Option<CustomFields>,
    /// Suppress the order confirmation email. Defaults to true.
    pub no_email: Option<bool>,
    pub no_invoice: Option<bool>,
}

impl NewOrder {
    fn changes(&self) -> Changes {
        let changes = Changes::new()
            .set("client_id", self.client_id)
            .set("product_id", self.product_id)
            .set("payment_method", &self.payment_method)
            .set_opt("billing_cycle", self.billing_cycle.as_deref())
            .set_opt("domain", self.domain.as_deref())
            .set_opt("promo_code", self.promo_code.as_deref())
            .set_opt("client_ip", self.client_ip.as_deref())
            .set_opt("price_override", self.price_override)
            .set_opt("affiliate_id", self.affiliate_id)
            .set("no_email", self.no_email.unwrap_or(true))
            .set_opt("no_invoice", self.no_invoice);
        match &self.custom_fields {
            Some(custom_fields) => changes.custom_fields(custom_fields.clone()),
            None => changes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub client_id: Option<u64>,
    pub order_id: Option<u64>,
    pub status: Option<String>,
    pub limit_start: Option<u64>,
    pub limit_num: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLineItem {
    pub kind: Option<String>,
    pub rel_id: Option<u64>,
    pub product_type: Option<String>,
    pub product: Option<String>,
    pub domain: Option<String>,
    pub billing_cycle: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<String>,
}

impl OrderLineItem {
    fn parse(item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(OrderLineItem {
            kind: f.opt_text("type"),
            rel_id: f.opt_id("relid"),
            product_type: f.opt_text("producttype"),
            product: f.opt_text("product"),
            domain: f.opt_text("domain"),
            billing_cycle: f.opt_text("billingcycle"),
            amount: f.opt_float("amount"),
            status: f.opt_text("status").map(|s| s.to_lowercase()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: u64,
    pub number: Option<String>,
    pub client_id: u64,
    pub contact_id: Option<u64>,
    pub date: Option<NaiveDateTime>,
    pub amount: f64,
    pub payment_method: Option<String>,
    pub invoice_id: Option<u64>,
    /// Lower-cased: `pending`, `active`, `cancelled`, `fraud`.
    pub status: String,
    pub payment_status: Option<String>,
    pub promo_code: Option<String>,
    pub ip_address: Option<String>,
    pub notes: Option<String>,
    pub line_items: Vec<OrderLineItem>,
    #[serde(skip)]
    bridge: OrderBridge,
}

impl Order {
    pub fn accept(&self) -> Result<()> {
        self.bridge.accept(self)
    }

    pub fn cancel(&self) -> Result<()> {
        self.bridge.cancel(self)
    }

    pub fn delete(&self) -> Result<()> {
        self.bridge.delete(self)
    }

    pub fn refresh(&self) -> Result<Order> {
        self.bridge.get(self)
    }

    fn parse(bridge: &OrderBridge, item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        let line_items = collection(item, "lineitems", "lineitem")
            .into_iter()
            .map(OrderLineItem::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Order {
            id: f.id("id")?,
            number: f.opt_text("ordernum"),
            client_id: f.id("userid")?,
            contact_id: f.opt_id("contactid"),
            date: f.datetime("date"),
            amount: f.float("amount")?,
            payment_method: f.opt_text("paymentmethod"),
            invoice_id: f.opt_id("invoiceid"),
            status: f.status("status")?,
            payment_status: f.opt_text("paymentstatus").map(|s| s.to_lowercase()),
            promo_code: f.opt_text("promocode"),
            ip_address: f.opt_text("ipaddress"),
            notes: f.opt_text("notes"),
            line_items,
            bridge: bridge.clone(),
        })
    }
}

record_lookup!(Order);

#[derive(Debug, Clone)]
pub struct OrderBridge {
    dispatcher: Arc<Dispatcher>,
}

impl OrderBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Place an order and return it as stored.
    pub fn create(&self, order: &NewOrder) -> Result<Order> {
        let params = FIELDS.translate(&order.changes())?;
        let body = self.dispatcher.send_request(Action::AddOrder, params)?;
        let id = Fields::new(&body)?.id("orderid")?;
        self.get(&id)
    }

    /// The remote service has no single-order read; this filters the list
    /// action by id and treats an empty match as not found.
    pub fn get<T: AsLookup + ?Sized>(&self, target: &T) -> Result<Order> {
        let id = getid(target).require_id(Self::RESOURCE)?;
        let body = self
            .dispatcher
            .send_request(Action::GetOrders, Params::new().with("id", id))?;
        let item = match collection(&body, "orders", "order").first() {
            Some(item) if count(&body, "totalresults") > 0 => *item,
            _ => {
                return Err(RemoteError::new(
                    ErrorKind::OrderNotFound,
                    Action::GetOrders,
                    format!("Order ID {id} not found"),
                )
                .with_body(body.to_string())
                .into())
            }
        };
        Order::parse(self, item)
    }

    pub fn accept<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.send_for(Action::AcceptOrder, target)
    }

    pub fn cancel<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.send_for(Action::CancelOrder, target)
    }

    fn send_for<T: AsLookup + ?Sized>(&self, action: Action, target: &T) -> Result<()> {
        let params = Params::new().with("orderid", getid(target).require_id(Self::RESOURCE)?);
        self.dispatcher.send_request(action, params).map(drop)
    }
}

impl Bridge for OrderBridge {
    type Record = Order;
    type Filter = OrderFilter;

    const RESOURCE: &'static str = "order";

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let params = Params::new()
            .with_opt("userid", filter.client_id)
            .with_opt("id", filter.order_id)
            .with_opt("status", filter.status.as_deref())
            .with_opt("limitstart", filter.limit_start)
            .with_opt("limitnum", filter.limit_num);
        let body = self.dispatcher.send_request(Action::GetOrders, params)?;
        if count(&body, "numreturned") == 0 {
            return Ok(Vec::new());
        }
        collection(&body, "orders", "order")
            .into_iter()
            .map(|item| Order::parse(self, item))
            .collect()
    }

    fn delete<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.send_for(Action::DeleteOrder, target)
    }
}
