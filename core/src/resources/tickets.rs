//! Support tickets.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::{Action, Dispatcher};
use crate::error::{ApiError, Result};
use crate::params::{Changes, CustomFields, FieldMap, Params};
use crate::resource::{getid, record_lookup, AsLookup, Bridge};
use crate::wire::{collection, count, Fields};

pub const FIELDS: FieldMap = FieldMap::new(
    "ticket",
    &[
        ("dept_id", "deptid"),
        ("client_id", "userid"),
        ("name", "name"),
        ("email", "email"),
        ("cc_email", "cc"),
        ("subject", "subject"),
        ("status", "status"),
        ("priority", "priority"),
        ("flag", "flag"),
        ("message", "message"),
        ("markdown", "markdown"),
    ],
);

/// Input for `TicketBridge::open`.
///
/// `service_id` and `domain_id` are mutually exclusive, and `contact_id`
/// needs `client_id`. Both are checked before anything is sent.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub subject: String,
    pub message: String,
    pub dept_id: u64,
    pub client_id: Option<u64>,
    pub contact_id: Option<u64>,
    /// Name and email identify a guest when no client is given.
    pub name: Option<String>,
    pub email: Option<String>,
    /// `low`, `medium` or `high`, any casing.
    pub priority: Option<String>,
    pub service_id: Option<u64>,
    pub domain_id: Option<u64>,
    pub admin: Option<bool>,
    pub markdown: Option<bool>,
    pub custom_fields: Option<CustomFields>,
}

impl NewTicket {
    fn validate(&self) -> Result<()> {
        if self.service_id.is_some() && self.domain_id.is_some() {
            return Err(ApiError::InvalidParameter(
                "service_id and domain_id are mutually exclusive".to_string(),
            ));
        }
        if self.contact_id.is_some() && self.client_id.is_none() {
            return Err(ApiError::InvalidParameter(
                "contact_id requires client_id".to_string(),
            ));
        }
        Ok(())
    }

    fn params(&self) -> Params {
        Params::new()
            .with("subject", &self.subject)
            .with("message", &self.message)
            .with("deptid", self.dept_id)
            .with_opt("clientid", self.client_id)
            .with_opt("contactid", self.contact_id)
            .with_opt("name", self.name.as_deref())
            .with_opt("email", self.email.as_deref())
            .with_opt("priority", self.priority.as_deref().map(title_case))
            .with_opt("serviceid", self.service_id)
            .with_opt("domainid", self.domain_id)
            .with_opt("admin", self.admin)
            .with_opt("markdown", self.markdown)
            .with_custom_fields(self.custom_fields.clone())
    }
}

/// Input for `TicketBridge::reply`.
#[derive(Debug, Clone, Default)]
pub struct NewReply {
    pub message: String,
    pub client_id: Option<u64>,
    pub contact_id: Option<u64>,
    /// Post as this admin user instead of the client.
    pub admin_username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Ticket status to set along with the reply.
    pub status: Option<String>,
    pub markdown: Option<bool>,
}

impl NewReply {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            ..Self::default()
        }
    }

    fn params(&self) -> Params {
        Params::new()
            .with("message", &self.message)
            .with_opt("clientid", self.client_id)
            .with_opt("contactid", self.contact_id)
            .with_opt("adminusername", self.admin_username.as_deref())
            .with_opt("name", self.name.as_deref())
            .with_opt("email", self.email.as_deref())
            .with_opt("status", self.status.as_deref())
            .with_opt("markdown", self.markdown)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub client_id: Option<u64>,
    pub dept_id: Option<u64>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub subject: Option<String>,
    pub limit_start: Option<u64>,
    pub limit_num: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketReply {
    /// Absent for the opening message.
    pub id: Option<u64>,
    pub client_id: Option<u64>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Admin user that posted the reply, if any.
    pub admin: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub message: String,
}

impl TicketReply {
    fn parse(item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(TicketReply {
            id: f.opt_id("replyid"),
            client_id: f.opt_id("userid"),
            name: f.opt_text("name"),
            email: f.opt_text("email"),
            admin: f.opt_text("admin"),
            date: f.datetime("date"),
            message: f.opt_text("message").unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketNote {
    pub id: u64,
    pub admin: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub message: String,
}

impl TicketNote {
    fn parse(item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(TicketNote {
            id: f.id("noteid")?,
            admin: f.opt_text("admin"),
            date: f.datetime("date"),
            message: f.opt_text("message").unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: u64,
    /// Public ticket mask shown to clients, e.g. `ABC-123456`.
    pub number: String,
    pub client_id: Option<u64>,
    pub contact_id: Option<u64>,
    pub dept_id: u64,
    pub dept_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub cc_email: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub last_reply: Option<NaiveDateTime>,
    pub subject: String,
    /// Lower-cased: `open`, `answered`, `customer-reply`, `closed`, ...
    pub status: String,
    /// Lower-cased: `low`, `medium` or `high`.
    pub priority: String,
    pub admin: Option<String>,
    pub flag: Option<u64>,
    pub service: Option<String>,
    pub replies: Vec<TicketReply>,
    pub notes: Vec<TicketNote>,
    #[serde(skip)]
    bridge: TicketBridge,
}

impl Ticket {
    pub fn update(&self, changes: &Changes) -> Result<()> {
        self.bridge.update(self, changes)
    }

    pub fn delete(&self) -> Result<()> {
        self.bridge.delete(self)
    }

    pub fn reply(&self, reply: &NewReply) -> Result<()> {
        self.bridge.reply(self, reply)
    }

    pub fn close(&self) -> Result<()> {
        self.update(&Changes::new().set("status", "Closed"))
    }

    pub fn refresh(&self) -> Result<Ticket> {
        self.bridge.get(self)
    }

    fn parse(bridge: &TicketBridge, item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        let replies = collection(item, "replies", "reply")
            .into_iter()
            .map(TicketReply::parse)
            .collect::<Result<Vec<_>>>()?;
        let notes = collection(item, "notes", "note")
            .into_iter()
            .map(TicketNote::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Ticket {
            id: f.id_any(&["ticketid", "id"])?,
            number: f.text("tid")?,
            client_id: f.opt_id("userid"),
            contact_id: f.opt_id("contactid"),
            dept_id: f.id("deptid")?,
            dept_name: f.opt_text("deptname"),
            name: f.opt_text("name"),
            email: f.opt_text("email"),
            cc_email: f.opt_text("cc"),
            date: f.datetime("date"),
            last_reply: f.datetime("lastreply"),
            subject: f.text_any(&["subject", "title"])?,
            status: f.status("status")?,
            priority: f.status("priority")?,
            admin: f.opt_text("admin"),
            flag: f.opt_id("flag"),
            service: f.opt_text("service"),
            replies,
            notes,
            bridge: bridge.clone(),
        })
    }
}

record_lookup!(Ticket);

#[derive(Debug, Clone)]
pub struct TicketBridge {
    dispatcher: Arc<Dispatcher>,
}

impl TicketBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Open a ticket and return it as stored.
    pub fn open(&self, ticket: &NewTicket) -> Result<Ticket> {
        ticket.validate()?;
        let body = self
            .dispatcher
            .send_request(Action::OpenTicket, ticket.params())?;
        let id = Fields::new(&body)?.id("id")?;
        self.get(&id)
    }

    /// Same as `open`.
    pub fn create(&self, ticket: &NewTicket) -> Result<Ticket> {
        self.open(ticket)
    }

    pub fn get<T: AsLookup + ?Sized>(&self, target: &T) -> Result<Ticket> {
        let params = Params::new().with("ticketid", getid(target).require_id(Self::RESOURCE)?);
        let body = self.dispatcher.send_request(Action::GetTicket, params)?;
        Ticket::parse(self, &body)
    }

    pub fn reply<T: AsLookup + ?Sized>(&self, target: &T, reply: &NewReply) -> Result<()> {
        let mut params = reply.params();
        params.push("ticketid", getid(target).require_id(Self::RESOURCE)?);
        self.dispatcher
            .send_request(Action::AddTicketReply, params)
            .map(drop)
    }
}

impl Bridge for TicketBridge {
    type Record = Ticket;
    type Filter = TicketFilter;

    const RESOURCE: &'static str = "ticket";

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let params = Params::new()
            .with_opt("clientid", filter.client_id)
            .with_opt("deptid", filter.dept_id)
            .with_opt("email", filter.email.as_deref())
            .with_opt("status", filter.status.as_deref())
            .with_opt("subject", filter.subject.as_deref())
            .with_opt("limitstart", filter.limit_start)
            .with_opt("limitnum", filter.limit_num);
        let body = self.dispatcher.send_request(Action::GetTickets, params)?;
        if count(&body, "numreturned") == 0 {
            return Ok(Vec::new());
        }
        collection(&body, "tickets", "ticket")
            .into_iter()
            .map(|item| Ticket::parse(self, item))
            .collect()
    }

    fn update<T: AsLookup + ?Sized>(&self, target: &T, changes: &Changes) -> Result<()> {
        let mut params = Params::new().with("ticketid", getid(target).require_id(Self::RESOURCE)?);
        FIELDS.apply(changes, &mut params)?;
        self.dispatcher
            .send_request(Action::UpdateTicket, params)
            .map(drop)
    }

    fn delete<T: AsLookup + ?Sized>(&self, target: &T) -> Result<()> {
        let params = Params::new().with("ticketid", getid(target).require_id(Self::RESOURCE)?);
        self.dispatcher
            .send_request(Action::DeleteTicket, params)
            .map(drop)
    }
}

/// `"very HIGH"` → `"Very High"`.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::http::testing::ScriptedTransport;
    use crate::resources::test_support::dispatcher;

    fn ticket_body(id: u64) -> Value {
        json!({
            "result": "success",
            "ticketid": id,
            "tid": "ABC-123456",
            "c": "k3Jd9s",
            "deptid": "1",
            "deptname": "Support",
            "userid": "7",
            "contactid": "0",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "cc": "",
            "date": "2024-05-01 09:00:00",
            "subject": "Server down",
            "status": "Open",
            "priority": "High",
            "admin": "",
            "lastreply": "2024-05-01 09:00:00",
            "flag": "0",
            "service": "",
            "replies": { "reply": [
                { "replyid": "0", "userid": "7", "name": "Ada Lovelace", "email": "ada@example.com",
                  "date": "2024-05-01 09:00:00", "message": "It is down.", "admin": "" }
            ] },
            "notes": ""
        })
    }

    fn bridge(transport: &ScriptedTransport) -> TicketBridge {
        TicketBridge::new(dispatcher(transport))
    }

    fn new_ticket() -> NewTicket {
        NewTicket {
            subject: "Server down".to_string(),
            message: "It is down.".to_string(),
            dept_id: 1,
            client_id: Some(7),
            priority: Some("high".to_string()),
            ..NewTicket::default()
        }
    }

    #[test]
    fn get_parses_ticket() {
        let transport = ScriptedTransport::new();
        transport.respond(200, ticket_body(5));
        let ticket = bridge(&transport).get(&5u64).unwrap();
        assert_eq!(ticket.id, 5);
        assert_eq!(ticket.number, "ABC-123456");
        assert_eq!(ticket.client_id, Some(7));
        assert_eq!(ticket.contact_id, None);
        assert_eq!(ticket.status, "open");
        assert_eq!(ticket.priority, "high");
        assert_eq!(ticket.flag, None);
        assert_eq!(ticket.replies.len(), 1);
        assert_eq!(ticket.replies[0].id, None);
        assert!(ticket.notes.is_empty());
    }

    #[test]
    fn get_missing_ticket_reports_getticket() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "error", "message": "Ticket ID Not Found" }));
        let err = bridge(&transport).get(&404u64).unwrap_err();
        match err {
            ApiError::Remote(remote) => {
                assert_eq!(remote.kind, ErrorKind::TicketNotFound);
                assert_eq!(remote.action.as_str(), "getticket");
                assert_eq!(remote.message.to_lowercase(), "ticket id not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn open_rejects_service_and_domain_locally() {
        let transport = ScriptedTransport::new();
        let input = NewTicket {
            service_id: Some(5),
            domain_id: Some(9),
            ..new_ticket()
        };
        let err = bridge(&transport).open(&input).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn open_rejects_contact_without_client() {
        let transport = ScriptedTransport::new();
        let input = NewTicket {
            client_id: None,
            contact_id: Some(3),
            ..new_ticket()
        };
        let err = bridge(&transport).create(&input).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn open_title_cases_priority_and_fetches() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "success", "id": 5, "tid": "ABC-123456", "c": "k3Jd9s" }));
        transport.respond(200, ticket_body(5));
        let ticket = bridge(&transport).open(&new_ticket()).unwrap();
        assert_eq!(ticket.id, 5);

        let open = &transport.requests()[0];
        assert_eq!(open.field("action"), Some("openticket"));
        assert_eq!(open.field("priority"), Some("High"));
        assert_eq!(open.field("deptid"), Some("1"));
        assert_eq!(open.field("clientid"), Some("7"));
        assert!(!open.has_field("admin"));
        assert!(!open.has_field("markdown"));
        assert!(!open.has_field("serviceid"));
        assert_eq!(transport.requests()[1].field("ticketid"), Some("5"));
    }

    #[test]
    fn list_uses_list_field_names() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({
                "result": "success", "totalresults": 1, "startnumber": 0, "numreturned": 1,
                "tickets": { "ticket": [{
                    "id": "5", "tid": "ABC-123456", "deptid": "1", "userid": "7",
                    "title": "Server down", "status": "Customer-Reply", "priority": "Medium",
                    "date": "2024-05-01 09:00:00", "lastreply": "2024-05-02 10:00:00"
                }] }
            }),
        );
        let filter = TicketFilter { client_id: Some(7), ..Default::default() };
        let tickets = bridge(&transport).list(&filter).unwrap();
        assert_eq!(tickets[0].subject, "Server down");
        assert_eq!(tickets[0].status, "customer-reply");
        assert!(tickets[0].replies.is_empty());
        assert_eq!(transport.last_request().field("clientid"), Some("7"));
    }

    #[test]
    fn list_zero_results_is_empty() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({ "result": "success", "totalresults": 0, "startnumber": 0, "numreturned": 0 }),
        );
        assert!(bridge(&transport).list(&TicketFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn record_actions_route_through_bridge() {
        let transport = ScriptedTransport::new();
        transport.respond(200, ticket_body(5));
        for _ in 0..3 {
            transport.respond(200, json!({ "result": "success" }));
        }
        let ticket = bridge(&transport).get(&5u64).unwrap();
        ticket.reply(&NewReply::new("On it.")).unwrap();
        ticket.close().unwrap();
        ticket.delete().unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].field("action"), Some("addticketreply"));
        assert_eq!(requests[1].field("message"), Some("On it."));
        assert_eq!(requests[1].field("ticketid"), Some("5"));
        assert_eq!(requests[2].field("action"), Some("updateticket"));
        assert_eq!(requests[2].field("status"), Some("Closed"));
        assert_eq!(requests[3].field("action"), Some("deleteticket"));
    }

    #[test]
    fn update_rejects_unknown_field() {
        let transport = ScriptedTransport::new();
        let err = bridge(&transport)
            .update(&5u64, &Changes::new().set("urgency", "now"))
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownField { resource: "ticket", .. }));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("high"), "High");
        assert_eq!(title_case("MEDIUM"), "Medium");
        assert_eq!(title_case("very  low"), "Very Low");
    }
}
