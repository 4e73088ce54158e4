//! Client accounts.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ApiVersion;
use crate::dispatch::{Action, Dispatcher};
use crate::error::{ApiError, Result};
use crate::params::{Changes, CustomFields, FieldMap, Params};
use crate::resource::{getid, record_lookup, AsLookup, Bridge, Lookup};
use crate::resources::general::GeneralBridge;
use crate::wire::{collection, count, CustomFieldValue, Fields};

/// Idiomatic → wire names accepted by `create` and `update`.
pub const FIELDS: FieldMap = FieldMap::new(
    "client",
    &[
        ("first_name", "firstname"),
        ("last_name", "lastname"),
        ("company_name", "companyname"),
        ("email", "email"),
        ("address1", "address1"),
        ("address2", "address2"),
        ("city", "city"),
        ("state", "state"),
        ("post_code", "postcode"),
        ("country", "country"),
        ("phone_number", "phonenumber"),
        ("password", "password2"),
        ("currency", "currency"),
        ("client_ip", "clientip"),
        ("language", "language"),
        ("group_id", "groupid"),
        ("security_question_id", "securityqid"),
        ("security_question_answer", "securityqans"),
        ("notes", "notes"),
        ("status", "status"),
        ("credit", "credit"),
        ("payment_method", "paymentmethod"),
        ("tax_exempt", "taxexempt"),
        ("late_fee_override", "latefeeoveride"),
        ("override_due_notices", "overideduenotices"),
        ("separate_invoices", "separateinvoices"),
        ("disable_auto_cc", "disableautocc"),
        ("email_opt_out", "emailoptout"),
        ("no_email", "noemail"),
        ("skip_validation", "skipvalidation"),
    ],
);

const PAY_METHOD_FIELDS: FieldMap = FieldMap::new(
    "pay method",
    &[
        ("description", "description"),
        ("gateway_module_name", "gateway_module_name"),
        ("card_number", "card_number"),
        ("card_expiry", "card_expiry"),
        ("card_issue_number", "card_issue_number"),
        ("bank_name", "bank_name"),
        ("bank_account_type", "bank_account_type"),
        ("bank_code", "bank_code"),
        ("bank_account", "bank_account"),
        ("set_as_default", "set_as_default"),
    ],
);

/// First remote release that accepts `addpaymethod`.
pub const PAY_METHODS_SINCE: ApiVersion = ApiVersion::new(7, 8, 0);

/// Input for `ClientBridge::create`.
///
/// `country` is an ISO 3166-1 alpha-2 code; `state` is the full state
/// name; `language` is the full language name ("english").
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub post_code: String,
    pub country: String,
    pub phone_number: String,
    pub company_name: Option<String>,
    pub address2: Option<String>,
    pub currency: Option<u64>,
    pub client_ip: Option<String>,
    pub language: Option<String>,
    pub group_id: Option<u64>,
    pub security_question_id: Option<u64>,
    pub security_question_answer: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<CustomFields>,
    /// Suppress the welcome email. Defaults to true.
    pub no_email: Option<bool>,
    pub skip_validation: Option<bool>,
}

impl NewClient {
    fn changes(&self) -> Changes {
        let changes = Changes::new()
            .set("first_name", &self.first_name)
            .set("last_name", &self.last_name)
            .set("email", &self.email)
            .set("address1", &self.address1)
            .set("city", &self.city)
            .set("state", &self.state)
            .set("post_code", &self.post_code)
            .set("country", &self.country)
            .set("phone_number", &self.phone_number)
            .set("password", &self.password)
            .set_opt("company_name", self.company_name.as_deref())
            .set_opt("address2", self.address2.as_deref())
            .set_opt("currency", self.currency)
            .set_opt("client_ip", self.client_ip.as_deref())
            .set_opt("language", self.language.as_deref())
            .set_opt("group_id", self.group_id)
            .set_opt("security_question_id", self.security_question_id)
            .set_opt("security_question_answer", self.security_question_answer.as_deref())
            .set_opt("notes", self.notes.as_deref())
            .set("no_email", self.no_email.unwrap_or(true))
            .set_opt("skip_validation", self.skip_validation);
        match &self.custom_fields {
            Some(custom_fields) => changes.custom_fields(custom_fields.clone()),
            None => changes,
        }
    }
}

/// Kind of stored payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayMethodKind {
    CreditCard,
    BankAccount,
}

impl PayMethodKind {
    fn as_str(self) -> &'static str {
        match self {
            PayMethodKind::CreditCard => "CreditCard",
            PayMethodKind::BankAccount => "BankAccount",
        }
    }
}

/// Input for `ClientBridge::add_pay_method`.
///
/// Credit cards need `card_number` and `card_expiry` (`MMYY`); bank
/// accounts need `bank_code` and `bank_account`.
#[derive(Debug, Clone)]
pub struct NewPayMethod {
    pub kind: PayMethodKind,
    pub description: Option<String>,
    pub gateway_module_name: Option<String>,
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    pub card_issue_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_type: Option<String>,
    pub bank_code: Option<String>,
    pub bank_account: Option<String>,
    pub set_as_default: Option<bool>,
}

impl NewPayMethod {
    pub fn new(kind: PayMethodKind) -> Self {
        Self {
            kind,
            description: None,
            gateway_module_name: None,
            card_number: None,
            card_expiry: None,
            card_issue_number: None,
            bank_name: None,
            bank_account_type: None,
            bank_code: None,
            bank_account: None,
            set_as_default: None,
        }
    }

    fn validate(&self) -> Result<()> {
        let required = match self.kind {
            PayMethodKind::CreditCard => [
                ("card_number", &self.card_number),
                ("card_expiry", &self.card_expiry),
            ],
            PayMethodKind::BankAccount => [
                ("bank_code", &self.bank_code),
                ("bank_account", &self.bank_account),
            ],
        };
        for (name, value) in required {
            if value.is_none() {
                return Err(ApiError::InvalidParameter(format!(
                    "{} pay method requires {name}",
                    self.kind.as_str()
                )));
            }
        }
        Ok(())
    }

    fn changes(&self) -> Changes {
        Changes::new()
            .set_opt("description", self.description.as_deref())
            .set_opt("gateway_module_name", self.gateway_module_name.as_deref())
            .set_opt("card_number", self.card_number.as_deref())
            .set_opt("card_expiry", self.card_expiry.as_deref())
            .set_opt("card_issue_number", self.card_issue_number.as_deref())
            .set_opt("bank_name", self.bank_name.as_deref())
            .set_opt("bank_account_type", self.bank_account_type.as_deref())
            .set_opt("bank_code", self.bank_code.as_deref())
            .set_opt("bank_account", self.bank_account.as_deref())
            .set_opt("set_as_default", self.set_as_default)
    }
}

/// Filters for `ClientBridge::services`.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub product_id: Option<u64>,
    pub service_id: Option<u64>,
    pub domain: Option<String>,
    pub limit_start: Option<u64>,
    pub limit_num: Option<u64>,
}

/// A client account as last read from the remote service.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: u64,
    pub uuid: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub company_name: Option<String>,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub state_code: Option<String>,
    pub post_code: String,
    pub country: String,
    pub country_name: Option<String>,
    pub phone_number: String,
    pub phone_number_formatted: Option<String>,
    pub phone_cc: Option<i64>,
    pub currency: i64,
    pub currency_code: Option<String>,
    pub credit: f64,
    pub group_id: Option<u64>,
    pub language: Option<String>,
    pub notes: Option<String>,
    pub default_gateway: Option<String>,
    pub security_question_id: Option<u64>,
    pub cc_type: Option<String>,
    pub cc_last_four: Option<String>,
    pub last_login: Option<String>,
    pub tax_exempt: bool,
    pub email_opt_out: bool,
    pub disable_auto_cc: bool,
    pub late_fee_override: bool,
    pub override_due_notices: bool,
    pub separate_invoices: bool,
    pub override_auto_close: bool,
    pub two_factor_enabled: bool,
    pub allow_single_sign_on: bool,
    /// Lower-cased: `active`, `inactive`, `closed`.
    pub status: String,
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(skip)]
    bridge: ClientBridge,
}

impl Client {
    pub fn update(&self, changes: &Changes) -> Result<()> {
        self.bridge.update(self, changes)
    }

    pub fn delete(&self) -> Result<()> {
        self.bridge.delete(self)
    }

    pub fn close(&self) -> Result<()> {
        self.bridge.close_client(self)
    }

    pub fn enable(&self) -> Result<()> {
        self.bridge.enable(self)
    }

    pub fn disable(&self) -> Result<()> {
        self.bridge.disable(self)
    }

    pub fn services(&self, filter: &ServiceFilter) -> Result<Vec<Service>> {
        self.bridge.services(self, filter)
    }

    pub fn add_pay_method(&self, method: &NewPayMethod) -> Result<u64> {
        self.bridge.add_pay_method(self, method)
    }

    /// Read the account again.
    pub fn refresh(&self) -> Result<Client> {
        self.bridge.get(self)
    }

    fn parse(bridge: &ClientBridge, body: &Value) -> Result<Self> {
        // Newer releases nest the account under `client`; older ones
        // put the fields at the top level.
        let source = body.get("client").filter(|c| c.is_object()).unwrap_or(body);
        let f = Fields::new(source)?;
        let first_name = f.text("firstname")?;
        let last_name = f.text("lastname")?;
        Ok(Client {
            id: f.id_any(&["id", "client_id", "userid"])?,
            uuid: f.opt_text("uuid").and_then(|u| Uuid::parse_str(&u).ok()),
            email: f.text("email")?,
            full_name: f
                .opt_text("fullname")
                .unwrap_or_else(|| format!("{first_name} {last_name}")),
            first_name,
            last_name,
            company_name: f.opt_text("companyname"),
            address1: f.text("address1")?,
            address2: f.opt_text("address2"),
            city: f.text("city")?,
            state: f.text("state")?,
            state_code: f.opt_text("statecode"),
            post_code: f.text("postcode")?,
            country: f.text_any(&["countrycode", "country"])?,
            country_name: f.opt_text("countryname"),
            phone_number: f.text("phonenumber")?,
            phone_number_formatted: f.opt_text("phonenumberformatted"),
            phone_cc: f.opt_int("phonecc"),
            currency: f.int("currency")?,
            currency_code: f.opt_text("currency_code"),
            credit: f.float("credit")?,
            group_id: f.opt_id("groupid"),
            language: f.opt_text("language"),
            notes: f.opt_text("notes"),
            default_gateway: f.opt_text("defaultgateway"),
            security_question_id: f.opt_id("securityqid"),
            cc_type: f.opt_text("cctype"),
            cc_last_four: f.opt_text("cclastfour"),
            last_login: f.opt_text("lastlogin"),
            tax_exempt: f.flag("taxexempt"),
            email_opt_out: f.flag("emailoptout"),
            disable_auto_cc: f.flag("disableautocc"),
            late_fee_override: f.flag("latefeeoveride"),
            override_due_notices: f.flag("overideduenotices"),
            separate_invoices: f.flag("separateinvoices"),
            override_auto_close: f.flag("overrideautoclose"),
            two_factor_enabled: f.flag("twofaenabled"),
            allow_single_sign_on: f.flag("allowSingleSignOn"),
            status: f.status("status")?,
            custom_fields: f.custom_fields("customfields"),
            bridge: bridge.clone(),
        })
    }
}

/// A product or service a client has purchased.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: u64,
    pub client_id: u64,
    pub order_id: Option<u64>,
    pub product_id: u64,
    pub name: String,
    pub group_name: Option<String>,
    pub domain: Option<String>,
    pub status: String,
    pub billing_cycle: Option<String>,
    pub recurring_amount: Option<f64>,
    pub first_payment_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
}

impl Service {
    fn parse(item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(Service {
            id: f.id("id")?,
            client_id: f.id_any(&["clientid", "userid"])?,
            order_id: f.opt_id("orderid"),
            product_id: f.id("pid")?,
            name: f.text_any(&["name", "translated_name"])?,
            group_name: f.opt_text("groupname"),
            domain: f.opt_text("domain"),
            status: f.status("status")?,
            billing_cycle: f.opt_text("billingcycle"),
            recurring_amount: f.opt_float("recurringamount"),
            first_payment_amount: f.opt_float("firstpaymentamount"),
            payment_method: f.opt_text("paymentmethod"),
            registration_date: f.date("regdate"),
            next_due_date: f.date("nextduedate"),
        })
    }
}

record_lookup!(Client, Service);

#[derive(Debug, Clone)]
pub struct ClientBridge {
    dispatcher: Arc<Dispatcher>,
}

impl ClientBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Create an account and return it as the remote side stored it.
    pub fn create(&self, client: &NewClient) -> Result<Client> {
        let params = FIELDS.translate(&client.changes())?;
        let body = self.dispatcher.send_request(Action::AddClient, params)?;
        let id = Fields::new(&body)?.id("clientid")?;
        self.get(&id)
    }

    /// Fetch by numeric id or by email address.
    pub fn get<T: AsLookup + ?Sized>(&self, target: &T) -> Result<Client> {
        let lookup = getid(target);
        let params = match (lookup.as_id(), &lookup) {
            (Some(id), _) | (None, &Lookup::Id(id)) => Params::new().with("clientid", id),
            (None, Lookup::Key(email)) => Params::new().with("email", email),
        };
        let body = self.dispatcher.send_request(Action::GetClientsDetails, params)?;
        Client::parse(self, &body)
    }

    /// Products and services the client has purchased.
    pub fn services<T: AsLookup + ?Sized>(
        &self,
        target: &T,
        filter: &ServiceFilter,
    ) -> Result<Vec<Service>> {
        let params = Params::new()
            .with("clientid", getid(target).require_id(Self::RESOURCE)?)
            .with_opt("pid", filter.product_id)
            .with_opt("serviceid", filter.service_id)
            .with_opt("domain", filter.domain.as_deref())
            .with_opt("limitstart", filter.limit_start)
            .with_opt("limitnum", filter.limit_num);
        let body = self
            .dispatcher
            .send_request(Action::GetClientsProducts, params)?;
        if count(&body, "numreturned") == 0 {
            return Ok(Vec::new());
        }
        collection(&body, "products", "product")
            .into_iter()
            .map(Service::parse)
            .collect()
    }

    pub fn close_client<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.send_for(Action::CloseClient, target)
    }

    pub fn enable<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.update(target, &Changes::new().set("status", "Active"))
    }

    pub fn disable<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.update(target, &Changes::new().set("status", "Inactive"))
    }

    /// Store a payment method for the client and return its id.
    ///
    /// Only available from `PAY_METHODS_SINCE` on; older installations get
    /// `ApiError::Unsupported` without the pay method being sent.
    pub fn add_pay_method<T: AsLookup + ?Sized>(
        &self,
        target: &T,
        method: &NewPayMethod,
    ) -> Result<u64> {
        let client_id = getid(target).require_id(Self::RESOURCE)?;
        method.validate()?;
        let found = GeneralBridge::new(self.dispatcher.clone()).api_version()?;
        if found < PAY_METHODS_SINCE {
            return Err(ApiError::Unsupported {
                feature: "addpaymethod",
                required: PAY_METHODS_SINCE,
                found,
            });
        }
        let mut params = Params::new()
            .with("clientid", client_id)
            .with("type", method.kind.as_str());
        PAY_METHOD_FIELDS.apply(&method.changes(), &mut params)?;
        let body = self.dispatcher.send_request(Action::AddPayMethod, params)?;
        Fields::new(&body)?.id("paymethodid")
    }

    fn send_for<T: AsLookup + ?Sized>(&self, action: Action, target: &T) -> Result<()> {
        let params = Params::new().with("clientid", getid(target).require_id(Self::RESOURCE)?);
        self.dispatcher.send_request(action, params).map(drop)
    }
}

impl Bridge for ClientBridge {
    type Record = Client;
    type Filter = ();

    const RESOURCE: &'static str = "client";

    /// Listing returns summaries only on the remote side; fetch accounts
    /// individually with `get`.
    fn list(&self, _filter: &()) -> Result<Vec<Client>> {
        Err(ApiError::InvalidParameter(
            "client listing is not supported; use get".to_string(),
        ))
    }

    fn update<T: AsLookup + ?Sized>(&self, target: &T, changes: &Changes) -> Result<()> {
        let mut params = Params::new().with("clientid", getid(target).require_id(Self::RESOURCE)?);
        FIELDS.apply(changes, &mut params)?;
        self.dispatcher
            .send_request(Action::UpdateClient, params)
            .map(drop)
    }

    fn delete<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        self.send_for(Action::DeleteClient, target)
    }
}
