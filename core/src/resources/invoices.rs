//! Invoices and payment capture.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::{Action, Dispatcher};
use crate::error::Result;
use crate::params::{Changes, FieldMap, Params};
use crate::resource::{getid, record_lookup, AsLookup, Bridge};
use crate::wire::{collection, count, Fields};

pub const FIELDS: FieldMap = FieldMap::new(
    "invoice",
    &[
        ("client_id", "userid"),
        ("status", "status"),
        ("send_invoice", "sendinvoice"),
        ("payment_method", "paymentmethod"),
        ("tax_rate", "taxrate"),
        ("tax_rate2", "taxrate2"),
        ("date", "date"),
        ("date_due", "duedate"),
        ("date_paid", "datepaid"),
        ("notes", "notes"),
        ("credit", "credit"),
        ("auto_apply_credit", "autoapplycredit"),
    ],
);

/// One billable line on a new invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub description: String,
    pub amount: f64,
    pub taxed: bool,
}

impl NewInvoiceItem {
    pub fn new(description: &str, amount: f64, taxed: bool) -> Self {
        Self {
            description: description.to_string(),
            amount,
            taxed,
        }
    }
}

/// Input for `InvoiceBridge::create`.
#[derive(Debug, Clone, Default)]
pub struct NewInvoice {
    pub client_id: u64,
    pub status: Option<String>,
    pub send_invoice: Option<bool>,
    pub payment_method: Option<String>,
    pub tax_rate: Option<f64>,
    pub tax_rate2: Option<f64>,
    pub date: Option<NaiveDate>,
    pub date_due: Option<NaiveDate>,
    pub notes: Option<String>,
    pub auto_apply_credit: Option<bool>,
    pub items: Vec<NewInvoiceItem>,
}

impl NewInvoice {
    fn params(&self) -> Result<Params> {
        let changes = Changes::new()
            .set("client_id", self.client_id)
            .set_opt("status", self.status.as_deref())
            .set_opt("send_invoice", self.send_invoice)
            .set_opt("payment_method", self.payment_method.as_deref())
            .set_opt("tax_rate", self.tax_rate)
            .set_opt("tax_rate2", self.tax_rate2)
            .set_opt("date", self.date)
            .set_opt("date_due", self.date_due)
            .set_opt("notes", self.notes.as_deref())
            .set_opt("auto_apply_credit", self.auto_apply_credit);
        let mut params = FIELDS.translate(&changes)?;
        // line items are numbered from 1 on the wire
        for (n, item) in self.items.iter().enumerate().map(|(i, item)| (i + 1, item)) {
            params.push(&format!("itemdescription{n}"), &item.description);
            params.push(&format!("itemamount{n}"), item.amount);
            params.push(&format!("itemtaxed{n}"), item.taxed);
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub client_id: Option<u64>,
    pub status: Option<String>,
    pub limit_start: Option<u64>,
    pub limit_num: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    pub id: u64,
    pub kind: Option<String>,
    pub rel_id: Option<u64>,
    pub description: String,
    pub amount: f64,
    pub taxed: bool,
}

impl InvoiceItem {
    fn parse(item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(InvoiceItem {
            id: f.id("id")?,
            kind: f.opt_text("type"),
            rel_id: f.opt_id("relid"),
            description: f.text("description")?,
            amount: f.float("amount")?,
            taxed: f.flag("taxed"),
        })
    }
}

/// An invoice as last read. Records from `list` carry no line items; the
/// remote list action does not return them.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: u64,
    pub number: Option<String>,
    pub client_id: u64,
    pub date: Option<NaiveDate>,
    pub date_due: Option<NaiveDate>,
    pub date_paid: Option<NaiveDateTime>,
    pub subtotal: f64,
    pub credit: f64,
    pub tax: f64,
    pub tax2: f64,
    pub total: f64,
    pub balance: Option<f64>,
    pub tax_rate: Option<f64>,
    pub tax_rate2: Option<f64>,
    /// Lower-cased: `unpaid`, `paid`, `cancelled`, ...
    pub status: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<InvoiceItem>,
    #[serde(skip)]
    bridge: InvoiceBridge,
}

impl Invoice {
    pub fn update(&self, changes: &Changes) -> Result<()> {
        self.bridge.update(self, changes)
    }

    pub fn capture_payment(&self, cvv: Option<&str>) -> Result<()> {
        self.bridge.capture_payment(self, cvv)
    }

    pub fn refresh(&self) -> Result<Invoice> {
        self.bridge.get(self)
    }

    fn parse(bridge: &InvoiceBridge, item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        let items = collection(item, "items", "item")
            .into_iter()
            .map(InvoiceItem::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Invoice {
            id: f.id_any(&["invoiceid", "id"])?,
            number: f.opt_text("invoicenum"),
            client_id: f.id("userid")?,
            date: f.date("date"),
            date_due: f.date("duedate"),
            date_paid: f.datetime("datepaid"),
            subtotal: f.float("subtotal")?,
            credit: f.float("credit")?,
            tax: f.float("tax")?,
            tax2: f.float("tax2")?,
            total: f.float("total")?,
            balance: f.opt_float("balance"),
            tax_rate: f.opt_float("taxrate"),
            tax_rate2: f.opt_float("taxrate2"),
            status: f.status("status")?,
            payment_method: f.opt_text("paymentmethod"),
            notes: f.opt_text("notes"),
            items,
            bridge: bridge.clone(),
        })
    }
}

record_lookup!(Invoice, InvoiceItem);

#[derive(Debug, Clone)]
pub struct InvoiceBridge {
    dispatcher: Arc<Dispatcher>,
}

impl InvoiceBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn create(&self, invoice: &NewInvoice) -> Result<Invoice> {
        let body = self
            .dispatcher
            .send_request(Action::CreateInvoice, invoice.params()?)?;
        let id = Fields::new(&body)?.id("invoiceid")?;
        self.get(&id)
    }

    pub fn get<T: AsLookup + ?Sized>(&self, target: &T) -> Result<Invoice> {
        let params = Params::new().with("invoiceid", getid(target).require_id(Self::RESOURCE)?);
        let body = self.dispatcher.send_request(Action::GetInvoice, params)?;
        Invoice::parse(self, &body)
    }

    /// Charge the invoice to the client's default payment method.
    pub fn capture_payment<T: AsLookup + ?Sized>(&self, target: &T, cvv: Option<&str>) -> Result<()> {
        let params = Params::new()
            .with("invoiceid", getid(target).require_id(Self::RESOURCE)?)
            .with_opt("cvv", cvv);
        self.dispatcher
            .send_request(Action::CapturePayment, params)
            .map(drop)
    }
}

impl Bridge for InvoiceBridge {
    type Record = Invoice;
    type Filter = InvoiceFilter;

    const RESOURCE: &'static str = "invoice";

    fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let params = Params::new()
            .with_opt("userid", filter.client_id)
            .with_opt("status", filter.status.as_deref())
            .with_opt("limitstart", filter.limit_start)
            .with_opt("limitnum", filter.limit_num);
        let body = self.dispatcher.send_request(Action::GetInvoices, params)?;
        if count(&body, "numreturned") == 0 {
            return Ok(Vec::new());
        }
        collection(&body, "invoices", "invoice")
            .into_iter()
            .map(|item| Invoice::parse(self, item))
            .collect()
    }

    fn update<T: AsLookup + ?Sized>(&self, target: &T, changes: &Changes) -> Result<()> {
        let mut params = Params::new().with("invoiceid", getid(target).require_id(Self::RESOURCE)?);
        FIELDS.apply(changes, &mut params)?;
        self.dispatcher
            .send_request(Action::UpdateInvoice, params)
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{ApiError, ErrorKind};
    use crate::http::testing::ScriptedTransport;
    use crate::resources::test_support::dispatcher;

    fn invoice_body(id: u64) -> Value {
        json!({
            "result": "success",
            "invoiceid": id.to_string(),
            "invoicenum": "",
            "userid": "7",
            "date": "2024-05-01",
            "duedate": "2024-05-31",
            "datepaid": "0000-00-00 00:00:00",
            "subtotal": "5.00",
            "credit": "0.00",
            "tax": "0.00",
            "tax2": "0.00",
            "total": "5.00",
            "balance": "5.00",
            "taxrate": "0.00",
            "taxrate2": "0.00",
            "status": "Unpaid",
            "paymentmethod": "mailin",
            "notes": "",
            "items": { "item": [
                { "id": 3, "type": "", "relid": 0, "description": "Test item", "amount": "5.00", "taxed": 0 }
            ] }
        })
    }

    fn bridge(transport: &ScriptedTransport) -> InvoiceBridge {
        InvoiceBridge::new(dispatcher(transport))
    }

    #[test]
    fn get_parses_invoice() {
        let transport = ScriptedTransport::new();
        transport.respond(200, invoice_body(12));
        let invoice = bridge(&transport).get(&12u64).unwrap();
        assert_eq!(invoice.id, 12);
        assert_eq!(invoice.client_id, 7);
        assert_eq!(invoice.date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(invoice.date_paid, None);
        assert_eq!(invoice.number, None);
        assert_eq!(invoice.status, "unpaid");
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].rel_id, None);
        assert!(!invoice.items[0].taxed);
    }

    #[test]
    fn get_missing_invoice() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "error", "message": "Invoice ID Not Found" }));
        let err = bridge(&transport).get(&404u64).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvoiceNotFound));
        assert!(err.is_not_found());
    }

    #[test]
    fn get_requires_numeric_reference() {
        let transport = ScriptedTransport::new();
        let err = bridge(&transport).get("latest").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn create_numbers_items_and_fetches() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "success", "invoiceid": 12, "status": "Unpaid" }));
        transport.respond(200, invoice_body(12));
        let input = NewInvoice {
            client_id: 7,
            send_invoice: Some(false),
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_due: NaiveDate::from_ymd_opt(2024, 5, 31),
            items: vec![
                NewInvoiceItem::new("Test item", 5.0, false),
                NewInvoiceItem::new("Setup", 10.5, true),
            ],
            ..NewInvoice::default()
        };
        let invoice = bridge(&transport).create(&input).unwrap();
        assert_eq!(invoice.id, 12);

        let create = &transport.requests()[0];
        assert_eq!(create.field("action"), Some("createinvoice"));
        assert_eq!(create.field("userid"), Some("7"));
        assert_eq!(create.field("sendinvoice"), Some("0"));
        assert_eq!(create.field("duedate"), Some("2024-05-31"));
        assert_eq!(create.field("itemdescription2"), Some("Setup"));
        assert_eq!(create.field("itemamount2"), Some("10.5"));
        assert_eq!(create.field("itemtaxed2"), Some("1"));
        assert!(!create.has_field("paymentmethod"));
        assert!(!create.has_field("itemdescription0"));
    }

    #[test]
    fn list_parses_nested_items() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({
                "result": "success",
                "totalresults": "2",
                "startnumber": 0,
                "numreturned": 2,
                "invoices": { "invoice": [
                    { "id": "1", "userid": "7", "date": "2024-05-01", "duedate": "2024-05-31",
                      "datepaid": "0000-00-00 00:00:00", "subtotal": "5.00", "credit": "0.00",
                      "tax": "0.00", "tax2": "0.00", "total": "5.00", "status": "Paid" },
                    { "id": "2", "userid": "7", "date": "2024-06-01", "duedate": "2024-06-30",
                      "datepaid": "2024-06-02 10:00:00", "subtotal": "5.00", "credit": "0.00",
                      "tax": "0.00", "tax2": "0.00", "total": "5.00", "status": "Unpaid" }
                ] }
            }),
        );
        let filter = InvoiceFilter { client_id: Some(7), ..Default::default() };
        let invoices = bridge(&transport).list(&filter).unwrap();
        assert_eq!(invoices.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(invoices[1].date_paid.is_some());
        assert!(invoices[0].items.is_empty());

        let req = transport.last_request();
        assert_eq!(req.field("userid"), Some("7"));
        assert!(!req.has_field("status"));
        assert!(!req.has_field("limitnum"));
    }

    #[test]
    fn list_zero_results_is_empty() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({ "result": "success", "totalresults": 0, "startnumber": 0, "numreturned": 0 }),
        );
        let invoices = bridge(&transport).list(&InvoiceFilter::default()).unwrap();
        assert!(invoices.is_empty());
    }

    #[test]
    fn update_and_capture_payment() {
        let transport = ScriptedTransport::new();
        transport.respond(200, invoice_body(12));
        transport.respond(200, json!({ "result": "success", "invoiceid": 12 }));
        transport.respond(200, json!({ "result": "success" }));
        let invoice = bridge(&transport).get(&12u64).unwrap();

        invoice.update(&Changes::new().set("status", "Paid")).unwrap();
        invoice.capture_payment(None).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].field("action"), Some("updateinvoice"));
        assert_eq!(requests[1].field("status"), Some("Paid"));
        assert_eq!(requests[2].field("action"), Some("capturepayment"));
        assert_eq!(requests[2].field("invoiceid"), Some("12"));
        assert!(!requests[2].has_field("cvv"));
    }

    #[test]
    fn delete_is_not_offered() {
        let transport = ScriptedTransport::new();
        let err = bridge(&transport).delete(&12u64).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        assert!(transport.requests().is_empty());
    }
}
