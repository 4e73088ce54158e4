//! In-memory tables behind the mock API, rendered in the remote wire shape.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use uuid::Uuid;

/// Rows keyed by a monotonically assigned id. Deleted ids are never reused.
#[derive(Debug)]
pub struct Table<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    pub fn insert(&mut self, build: impl FnOnce(u64) -> T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Client {
    pub id: u64,
    pub uuid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub email: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub post_code: String,
    pub country: String,
    pub phone_number: String,
    pub password: String,
    pub currency: i64,
    pub credit: f64,
    pub group_id: u64,
    pub language: String,
    pub notes: String,
    pub status: String,
    pub custom_fields: Vec<(u64, String)>,
}

impl Client {
    pub fn to_wire(&self) -> Value {
        json!({
            "id": self.id,
            "client_id": self.id,
            "userid": self.id,
            "uuid": self.uuid.to_string(),
            "firstname": self.first_name,
            "lastname": self.last_name,
            "fullname": format!("{} {}", self.first_name, self.last_name),
            "companyname": self.company_name,
            "email": self.email,
            "address1": self.address1,
            "address2": self.address2,
            "city": self.city,
            "state": self.state,
            "postcode": self.post_code,
            "countrycode": self.country,
            "country": self.country,
            "phonenumber": self.phone_number,
            "currency": self.currency,
            "currency_code": "USD",
            "credit": money(self.credit),
            "groupid": self.group_id,
            "language": self.language,
            "notes": self.notes,
            "status": self.status,
            "taxexempt": false,
            "emailoptout": "0",
            "customfields": self
                .custom_fields
                .iter()
                .map(|(id, value)| json!({ "id": id, "value": value }))
                .collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceItem {
    pub id: u64,
    pub description: String,
    pub amount: f64,
    pub taxed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Invoice {
    pub id: u64,
    pub user_id: u64,
    pub date: String,
    pub due_date: String,
    pub date_paid: Option<String>,
    pub status: String,
    pub payment_method: String,
    pub notes: String,
    pub tax_rate: f64,
    pub items: Vec<InvoiceItem>,
}

impl Invoice {
    fn totals(&self) -> (f64, f64) {
        let subtotal: f64 = self.items.iter().map(|item| item.amount).sum();
        let taxable: f64 = self
            .items
            .iter()
            .filter(|item| item.taxed)
            .map(|item| item.amount)
            .sum();
        (subtotal, taxable * self.tax_rate / 100.0)
    }

    /// The shape used by `getinvoices` entries.
    pub fn summary(&self) -> Value {
        let (subtotal, tax) = self.totals();
        json!({
            "id": self.id.to_string(),
            "userid": self.user_id.to_string(),
            "invoicenum": "",
            "date": self.date,
            "duedate": self.due_date,
            "datepaid": self.date_paid.as_deref().unwrap_or(NO_DATETIME),
            "subtotal": money(subtotal),
            "credit": money(0.0),
            "tax": money(tax),
            "tax2": money(0.0),
            "total": money(subtotal + tax),
            "taxrate": money(self.tax_rate),
            "taxrate2": money(0.0),
            "status": self.status,
            "paymentmethod": self.payment_method,
            "notes": self.notes,
        })
    }

    /// The shape returned by `getinvoice`.
    pub fn to_wire(&self) -> Value {
        let (subtotal, tax) = self.totals();
        let balance = if self.status == "Paid" { 0.0 } else { subtotal + tax };
        let mut body = self.summary();
        body["invoiceid"] = json!(self.id);
        body["balance"] = json!(money(balance));
        body["items"] = json!({
            "item": self.items.iter().map(|item| json!({
                "id": item.id,
                "type": "",
                "relid": 0,
                "description": item.description,
                "amount": money(item.amount),
                "taxed": u8::from(item.taxed),
            })).collect::<Vec<_>>()
        });
        body
    }
}

#[derive(Debug, Clone)]
pub struct Service {
    pub id: u64,
    pub user_id: u64,
    pub order_id: u64,
    pub product_id: u64,
    pub domain: String,
    pub billing_cycle: String,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub reg_date: String,
}

impl Service {
    pub fn to_wire(&self, product: Option<&Product>) -> Value {
        json!({
            "id": self.id,
            "clientid": self.user_id,
            "orderid": self.order_id,
            "pid": self.product_id,
            "name": product.map_or("", |p| p.name.as_str()),
            "groupname": product.map_or("", |p| p.group_name),
            "domain": self.domain,
            "billingcycle": self.billing_cycle,
            "firstpaymentamount": money(self.amount),
            "recurringamount": money(self.amount),
            "paymentmethod": self.payment_method,
            "regdate": self.reg_date,
            "nextduedate": self.reg_date,
            "status": self.status,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: u64,
    pub number: String,
    pub user_id: u64,
    pub date: String,
    pub amount: f64,
    pub payment_method: String,
    pub invoice_id: u64,
    pub service_id: u64,
    pub status: String,
    pub promo_code: String,
    pub ip_address: String,
}

impl Order {
    pub fn to_wire(&self, service: Option<&Service>, product: Option<&Product>) -> Value {
        let line_items: Vec<Value> = service
            .map(|service| {
                json!({
                    "type": "product",
                    "relid": service.id,
                    "producttype": product.map_or("", |p| p.kind),
                    "product": product.map_or("", |p| p.name.as_str()),
                    "domain": service.domain,
                    "billingcycle": service.billing_cycle,
                    "amount": format!("${} USD", money(service.amount)),
                    "status": service.status,
                })
            })
            .into_iter()
            .collect();
        json!({
            "id": self.id,
            "ordernum": self.number,
            "userid": self.user_id,
            "contactid": 0,
            "date": self.date,
            "amount": money(self.amount),
            "paymentmethod": self.payment_method,
            "invoiceid": self.invoice_id,
            "status": self.status,
            "paymentstatus": if self.invoice_id == 0 { "" } else { "Unpaid" },
            "promocode": self.promo_code,
            "ipaddress": self.ip_address,
            "notes": "",
            "lineitems": { "lineitem": line_items },
        })
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: u64,
    pub group_id: u64,
    pub group_name: &'static str,
    pub kind: &'static str,
    pub name: String,
    pub module: &'static str,
    pub monthly: f64,
}

impl Product {
    pub fn to_wire(&self) -> Value {
        json!({
            "pid": self.id,
            "gid": self.group_id,
            "type": self.kind,
            "name": self.name,
            "description": "",
            "module": self.module,
            "paytype": "recurring",
            "pricing": { "USD": {
                "prefix": "$",
                "suffix": " USD",
                "monthly": money(self.monthly),
                "annually": money(self.monthly * 10.0),
            } },
        })
    }
}

#[derive(Debug, Clone)]
pub struct Promotion {
    pub id: u64,
    pub code: &'static str,
    pub kind: &'static str,
    pub value: f64,
    pub expires: &'static str,
}

impl Promotion {
    pub fn to_wire(&self) -> Value {
        json!({
            "id": self.id,
            "code": self.code,
            "type": self.kind,
            "recurring": 0,
            "value": money(self.value),
            "cycles": "",
            "appliesto": "",
            "startdate": "0000-00-00",
            "expirationdate": self.expires,
            "maxuses": 0,
            "uses": 0,
            "applyonce": 0,
            "newsignups": 0,
            "existingclient": 0,
            "onceperclient": 0,
            "notes": "",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub admin: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: u64,
    pub mask: String,
    pub dept_id: u64,
    pub user_id: u64,
    pub contact_id: u64,
    pub name: String,
    pub email: String,
    pub cc: String,
    pub date: String,
    pub subject: String,
    pub status: String,
    pub priority: String,
    pub admin: String,
    pub last_reply: String,
    pub flag: u64,
    pub service: String,
    pub replies: Vec<Reply>,
}

impl Ticket {
    /// The shape used by `gettickets` entries.
    pub fn summary(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "tid": self.mask,
            "deptid": self.dept_id.to_string(),
            "userid": self.user_id.to_string(),
            "name": self.name,
            "email": self.email,
            "cc": self.cc,
            "date": self.date,
            "title": self.subject,
            "status": self.status,
            "priority": self.priority,
            "admin": self.admin,
            "lastreply": self.last_reply,
            "flag": self.flag.to_string(),
            "service": self.service,
        })
    }

    /// The shape returned by `getticket`.
    pub fn to_wire(&self) -> Value {
        let replies: Vec<Value> = self
            .replies
            .iter()
            .map(|reply| {
                json!({
                    "replyid": reply.id.to_string(),
                    "userid": reply.user_id.to_string(),
                    "name": reply.name,
                    "email": reply.email,
                    "admin": reply.admin,
                    "date": reply.date,
                    "message": reply.message,
                })
            })
            .collect();
        json!({
            "ticketid": self.id,
            "tid": self.mask,
            "c": format!("{:08x}", self.id * 2_654_435_761 % 0xffff_ffff),
            "deptid": self.dept_id.to_string(),
            "deptname": department_name(self.dept_id).unwrap_or_default(),
            "userid": self.user_id.to_string(),
            "contactid": self.contact_id.to_string(),
            "name": self.name,
            "email": self.email,
            "cc": self.cc,
            "date": self.date,
            "subject": self.subject,
            "status": self.status,
            "priority": self.priority,
            "admin": self.admin,
            "lastreply": self.last_reply,
            "flag": self.flag.to_string(),
            "service": self.service,
            "replies": { "reply": replies },
            "notes": "",
        })
    }
}

pub const NO_DATETIME: &str = "0000-00-00 00:00:00";

pub fn department_name(id: u64) -> Option<&'static str> {
    match id {
        1 => Some("Support"),
        2 => Some("Sales"),
        _ => None,
    }
}

pub fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Everything the mock API serves.
#[derive(Debug)]
pub struct Store {
    pub clients: Table<Client>,
    pub invoices: Table<Invoice>,
    pub services: Table<Service>,
    pub orders: Table<Order>,
    pub tickets: Table<Ticket>,
    pub products: Vec<Product>,
    pub promotions: Vec<Promotion>,
    pub pay_methods: Table<u64>,
}

impl Store {
    /// A store holding the fixed catalogue and nothing else.
    pub fn seeded() -> Self {
        Self {
            clients: Table::default(),
            invoices: Table::default(),
            services: Table::default(),
            orders: Table::default(),
            tickets: Table::default(),
            products: vec![
                Product {
                    id: 1,
                    group_id: 1,
                    group_name: "Hosting",
                    kind: "hostingaccount",
                    name: "Starter".to_string(),
                    module: "cpanel",
                    monthly: 10.0,
                },
                Product {
                    id: 2,
                    group_id: 1,
                    group_name: "Hosting",
                    kind: "hostingaccount",
                    name: "Pro".to_string(),
                    module: "cpanel",
                    monthly: 25.0,
                },
                Product {
                    id: 3,
                    group_id: 2,
                    group_name: "Servers",
                    kind: "server",
                    name: "Dedicated".to_string(),
                    module: "",
                    monthly: 120.0,
                },
            ],
            promotions: vec![
                Promotion {
                    id: 1,
                    code: "SPRING",
                    kind: "Percentage",
                    value: 10.0,
                    expires: "2030-01-01",
                },
                Promotion {
                    id: 2,
                    code: "WELCOME",
                    kind: "Fixed Amount",
                    value: 5.0,
                    expires: "0000-00-00",
                },
            ],
            pay_methods: Table::default(),
        }
    }

    pub fn product(&self, id: u64) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn client_by_email(&self, email: &str) -> Option<&Client> {
        self.clients
            .values()
            .find(|client| client.email.eq_ignore_ascii_case(email))
    }
}
