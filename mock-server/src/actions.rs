//! One function per supported action. Each returns the success fields, or
//! the remote error message for a `"result": "error"` reply.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::store::{department_name, Client, Invoice, InvoiceItem, Order, Reply, Service, Store, Ticket};
use crate::{php, Fields, Settings};

type Outcome = Result<Value, String>;

const CLIENT_NOT_FOUND: &str = "Client ID Not Found";
const INVOICE_NOT_FOUND: &str = "Invoice ID Not Found";
const ORDER_NOT_FOUND: &str = "Order ID Not Found";
const TICKET_NOT_FOUND: &str = "Ticket ID Not Found";
const PRIORITIES: [&str; 3] = ["Low", "Medium", "High"];

pub fn dispatch(store: &mut Store, settings: &Settings, action: &str, form: &Fields<'_>) -> Outcome {
    match action {
        "addclient" => add_client(store, settings, form),
        "getclientsdetails" => get_client(store, form),
        "updateclient" => update_client(store, form),
        "closeclient" => close_client(store, form),
        "deleteclient" => delete_client(store, form),
        "getclientsproducts" => get_client_products(store, form),
        "addpaymethod" => add_pay_method(store, form),
        "validatelogin" => validate_login(store, form),
        "whmcsdetails" => Ok(json!({
            "whmcs": {
                "version": settings.version,
                "canonicalversion": format!("{}-release.1", settings.version),
            }
        })),
        "createinvoice" => create_invoice(store, form),
        "getinvoice" => get_invoice(store, form),
        "getinvoices" => get_invoices(store, form),
        "updateinvoice" => update_invoice(store, form),
        "capturepayment" => capture_payment(store, form),
        "addorder" => add_order(store, form),
        "getorders" => get_orders(store, form),
        "acceptorder" => set_order_status(store, form, "Active"),
        "cancelorder" => set_order_status(store, form, "Cancelled"),
        "deleteorder" => delete_order(store, form),
        "getproducts" => get_products(store, form),
        "getpromotions" => get_promotions(store, form),
        "openticket" => open_ticket(store, form),
        "getticket" => get_ticket(store, form),
        "gettickets" => get_tickets(store, form),
        "updateticket" => update_ticket(store, form),
        "deleteticket" => delete_ticket(store, form),
        "addticketreply" => add_ticket_reply(store, form),
        _ => Err("Command Not Found".to_string()),
    }
}

// --- clients ---

fn add_client(store: &mut Store, settings: &Settings, form: &Fields<'_>) -> Outcome {
    let email = form.owned("email");
    if !valid_email(&email) {
        return Err("You did not enter a valid email address".to_string());
    }
    if store.client_by_email(&email).is_some() {
        return Err("A user already exists with that email address".to_string());
    }
    let phone = form.owned("phonenumber");
    if !phone.chars().all(|c| c.is_ascii_digit() || " +-.()".contains(c)) {
        return Err("You did not enter a valid phone number".to_string());
    }
    let custom_fields = match form.text("customfields") {
        Some(encoded) => php::custom_fields(encoded)?,
        None => Vec::new(),
    };
    if let Some(required) = settings.required_client_field {
        if !custom_fields.iter().any(|(id, value)| *id == required && !value.is_empty()) {
            return Err("A required custom field was not provided".to_string());
        }
    }
    let mut client = Client {
        email,
        phone_number: phone,
        currency: 1,
        status: "Active".to_string(),
        language: "english".to_string(),
        custom_fields,
        ..Client::default()
    };
    apply_client_fields(&mut client, form);
    let id = store.clients.insert(|id| Client {
        id,
        uuid: Uuid::new_v4(),
        ..client
    });
    Ok(json!({ "clientid": id }))
}

fn apply_client_fields(client: &mut Client, form: &Fields<'_>) {
    let text_fields: [(&str, &mut String); 13] = [
        ("firstname", &mut client.first_name),
        ("lastname", &mut client.last_name),
        ("companyname", &mut client.company_name),
        ("email", &mut client.email),
        ("address1", &mut client.address1),
        ("address2", &mut client.address2),
        ("city", &mut client.city),
        ("state", &mut client.state),
        ("postcode", &mut client.post_code),
        ("country", &mut client.country),
        ("phonenumber", &mut client.phone_number),
        ("password2", &mut client.password),
        ("status", &mut client.status),
    ];
    for (key, slot) in text_fields {
        if let Some(value) = form.text(key) {
            *slot = value.to_string();
        }
    }
    if let Some(notes) = form.text("notes") {
        client.notes = notes.to_string();
    }
    if let Some(language) = form.text("language") {
        client.language = language.to_string();
    }
    if let Some(currency) = form.id("currency") {
        client.currency = currency as i64;
    }
    if let Some(group) = form.id("groupid") {
        client.group_id = group;
    }
    if let Some(credit) = form.number("credit") {
        client.credit = credit;
    }
}

/// Look the client up by `clientid`, falling back to `email`.
fn find_client<'s>(store: &'s Store, form: &Fields<'_>) -> Result<&'s Client, String> {
    let found = match (form.id("clientid"), form.text("email")) {
        (Some(id), _) => store.clients.get(id),
        (None, Some(email)) => store.client_by_email(email),
        (None, None) => None,
    };
    found.ok_or_else(|| CLIENT_NOT_FOUND.to_string())
}

fn get_client(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let client = find_client(store, form)?;
    Ok(json!({ "client": client.to_wire() }))
}

fn update_client(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("clientid").unwrap_or(0);
    if let Some(email) = form.text("email") {
        if !valid_email(email) {
            return Err("You did not enter a valid email address".to_string());
        }
        if store.client_by_email(email).is_some_and(|other| other.id != id) {
            return Err("A user already exists with that email address".to_string());
        }
    }
    let client = store
        .clients
        .get_mut(id)
        .ok_or_else(|| CLIENT_NOT_FOUND.to_string())?;
    apply_client_fields(client, form);
    Ok(json!({ "clientid": id }))
}

fn close_client(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("clientid").unwrap_or(0);
    let client = store
        .clients
        .get_mut(id)
        .ok_or_else(|| CLIENT_NOT_FOUND.to_string())?;
    client.status = "Closed".to_string();
    Ok(json!({ "clientid": id }))
}

fn delete_client(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("clientid").unwrap_or(0);
    store
        .clients
        .remove(id)
        .ok_or_else(|| CLIENT_NOT_FOUND.to_string())?;
    Ok(json!({ "clientid": id }))
}

fn get_client_products(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let store = &*store;
    let client_id = find_client(store, form)?.id;
    let items = store
        .services
        .values()
        .filter(|s| s.user_id == client_id)
        .filter(|s| form.id("pid").map_or(true, |pid| s.product_id == pid))
        .filter(|s| form.id("serviceid").map_or(true, |id| s.id == id))
        .filter(|s| form.text("domain").map_or(true, |d| s.domain == d))
        .map(|s| s.to_wire(store.product(s.product_id)))
        .collect();
    let mut body = page("products", "product", items, form);
    body["clientid"] = json!(client_id);
    Ok(body)
}

fn add_pay_method(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let client_id = find_client(store, form)?.id;
    match form.text("type") {
        Some("CreditCard" | "RemoteCreditCard" | "BankAccount" | "RemoteBankAccount") => {}
        _ => return Err("Invalid Pay Method Type".to_string()),
    }
    let id = store.pay_methods.insert(|_| client_id);
    Ok(json!({ "clientid": client_id, "paymethodid": id }))
}

fn validate_login(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let email = form.text("email").unwrap_or_default();
    let password = form.text("password2").unwrap_or_default();
    match store.client_by_email(email) {
        Some(client) if !password.is_empty() && client.password == password => {
            Ok(json!({ "userid": client.id, "passwordhash": "" }))
        }
        _ => Err("Email or Password Invalid".to_string()),
    }
}

// --- invoices ---

fn create_invoice(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let user_id = form.id("userid").unwrap_or(0);
    let client = store
        .clients
        .get(user_id)
        .ok_or_else(|| CLIENT_NOT_FOUND.to_string())?;
    let payment_method = form.text("paymentmethod").unwrap_or("mailin").to_string();
    let mut items = Vec::new();
    for n in 1.. {
        let Some(description) = form.text(&format!("itemdescription{n}")) else {
            break;
        };
        items.push(InvoiceItem {
            id: n,
            description: description.to_string(),
            amount: form.number(&format!("itemamount{n}")).unwrap_or(0.0),
            taxed: form.flag(&format!("itemtaxed{n}")),
        });
    }
    let invoice = Invoice {
        user_id: client.id,
        date: form.text("date").map_or_else(today, str::to_string),
        due_date: form.text("duedate").map_or_else(today, str::to_string),
        date_paid: None,
        status: form.text("status").unwrap_or("Unpaid").to_string(),
        payment_method,
        notes: form.owned("notes"),
        tax_rate: form.number("taxrate").unwrap_or(0.0),
        items,
        ..Invoice::default()
    };
    let status = invoice.status.clone();
    let id = store.invoices.insert(|id| Invoice { id, ..invoice });
    Ok(json!({ "invoiceid": id, "status": status }))
}

fn get_invoice(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("invoiceid").unwrap_or(0);
    store
        .invoices
        .get(id)
        .map(Invoice::to_wire)
        .ok_or_else(|| INVOICE_NOT_FOUND.to_string())
}

fn get_invoices(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let items = store
        .invoices
        .values()
        .filter(|i| form.id("userid").map_or(true, |id| i.user_id == id))
        .filter(|i| form.text("status").map_or(true, |s| i.status.eq_ignore_ascii_case(s)))
        .map(Invoice::summary)
        .collect();
    Ok(page("invoices", "invoice", items, form))
}

fn update_invoice(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("invoiceid").unwrap_or(0);
    let invoice = store
        .invoices
        .get_mut(id)
        .ok_or_else(|| INVOICE_NOT_FOUND.to_string())?;
    if let Some(status) = form.text("status") {
        invoice.status = status.to_string();
    }
    if let Some(due) = form.text("duedate") {
        invoice.due_date = due.to_string();
    }
    if let Some(paid) = form.text("datepaid") {
        invoice.date_paid = Some(paid.to_string());
    }
    if let Some(method) = form.text("paymentmethod") {
        invoice.payment_method = method.to_string();
    }
    if let Some(notes) = form.text("notes") {
        invoice.notes = notes.to_string();
    }
    if let Some(rate) = form.number("taxrate") {
        invoice.tax_rate = rate;
    }
    Ok(json!({ "invoiceid": id }))
}

fn capture_payment(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("invoiceid").unwrap_or(0);
    let invoice = store
        .invoices
        .get_mut(id)
        .ok_or_else(|| INVOICE_NOT_FOUND.to_string())?;
    if invoice.status != "Unpaid" {
        return Err("Payment Attempt Failed".to_string());
    }
    invoice.status = "Paid".to_string();
    invoice.date_paid = Some(now());
    Ok(json!({}))
}

// --- orders ---

fn add_order(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let user_id = store
        .clients
        .get(form.id("clientid").unwrap_or(0))
        .map(|client| client.id)
        .ok_or_else(|| CLIENT_NOT_FOUND.to_string())?;
    let product = store
        .product(form.id("pid").unwrap_or(0))
        .cloned()
        .ok_or_else(|| "Invalid Product ID".to_string())?;
    let payment_method = form
        .text("paymentmethod")
        .ok_or_else(|| "Invalid Payment Method. Valid options include mailin".to_string())?
        .to_string();
    let promo_code = form.owned("promocode");
    if !promo_code.is_empty() && !store.promotions.iter().any(|p| p.code == promo_code) {
        return Err("Promotion Code Not Found".to_string());
    }
    let amount = form.number("priceoverride").unwrap_or(product.monthly);
    let billing_cycle = form.text("billingcycle").unwrap_or("monthly").to_string();

    let invoice_id = if form.flag("noinvoice") {
        0
    } else {
        store.invoices.insert(|id| Invoice {
            id,
            user_id,
            date: today(),
            due_date: today(),
            status: "Unpaid".to_string(),
            payment_method: payment_method.clone(),
            items: vec![InvoiceItem {
                id: 1,
                description: product.name.clone(),
                amount,
                taxed: false,
            }],
            ..Invoice::default()
        })
    };
    let order_id = store.orders.insert(|id| Order {
        id,
        number: format!("{:010}", 5_300_000_000 + id),
        user_id,
        date: now(),
        amount,
        payment_method: payment_method.clone(),
        invoice_id,
        service_id: 0,
        status: "Pending".to_string(),
        promo_code,
        ip_address: form.owned("clientip"),
    });
    let service_id = store.services.insert(|id| Service {
        id,
        user_id,
        order_id,
        product_id: product.id,
        domain: form.owned("domain"),
        billing_cycle,
        amount,
        payment_method,
        status: "Pending".to_string(),
        reg_date: today(),
    });
    if let Some(order) = store.orders.get_mut(order_id) {
        order.service_id = service_id;
    }
    Ok(json!({
        "orderid": order_id,
        "serviceids": service_id.to_string(),
        "addonids": "",
        "domainids": "",
        "invoiceid": invoice_id,
    }))
}

fn order_wire(store: &Store, order: &Order) -> Value {
    let service = store.services.get(order.service_id);
    let product = service.and_then(|s| store.product(s.product_id));
    order.to_wire(service, product)
}

fn get_orders(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let store = &*store;
    let items = store
        .orders
        .values()
        .filter(|o| form.id("id").map_or(true, |id| o.id == id))
        .filter(|o| form.id("userid").map_or(true, |id| o.user_id == id))
        .filter(|o| form.text("status").map_or(true, |s| o.status.eq_ignore_ascii_case(s)))
        .map(|o| order_wire(store, o))
        .collect();
    Ok(page("orders", "order", items, form))
}

fn set_order_status(store: &mut Store, form: &Fields<'_>, status: &str) -> Outcome {
    let id = form.id("orderid").unwrap_or(0);
    let order = store
        .orders
        .get_mut(id)
        .ok_or_else(|| ORDER_NOT_FOUND.to_string())?;
    order.status = status.to_string();
    let service_id = order.service_id;
    if let Some(service) = store.services.get_mut(service_id) {
        service.status = status.to_string();
    }
    Ok(json!({}))
}

fn delete_order(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("orderid").unwrap_or(0);
    let order = store
        .orders
        .remove(id)
        .ok_or_else(|| ORDER_NOT_FOUND.to_string())?;
    store.services.remove(order.service_id);
    Ok(json!({}))
}

// --- catalogue ---

fn get_products(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let items = store
        .products
        .iter()
        .filter(|p| form.id("pid").map_or(true, |id| p.id == id))
        .filter(|p| form.id("gid").map_or(true, |id| p.group_id == id))
        .filter(|p| form.text("module").map_or(true, |m| p.module == m))
        .map(|p| p.to_wire())
        .collect();
    Ok(page("products", "product", items, form))
}

fn get_promotions(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let items = store
        .promotions
        .iter()
        .filter(|p| form.text("code").map_or(true, |code| p.code == code))
        .map(|p| p.to_wire())
        .collect();
    Ok(page("promotions", "promotion", items, form))
}

// --- tickets ---

fn open_ticket(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let dept_id = form.id("deptid").unwrap_or(0);
    if department_name(dept_id).is_none() {
        return Err("Department ID not found".to_string());
    }
    let (Some(subject), Some(message)) = (form.text("subject"), form.text("message")) else {
        return Err("Subject and Message are required".to_string());
    };
    let priority = form.text("priority").unwrap_or("Medium");
    if !PRIORITIES.contains(&priority) {
        return Err("Invalid Priority. Valid priorities are: Low,Medium,High".to_string());
    }
    let (user_id, name, email) = match form.id("clientid") {
        Some(id) => {
            let client = store
                .clients
                .get(id)
                .ok_or_else(|| CLIENT_NOT_FOUND.to_string())?;
            (
                client.id,
                format!("{} {}", client.first_name, client.last_name),
                client.email.clone(),
            )
        }
        None => match (form.text("name"), form.text("email")) {
            (Some(name), Some(email)) => (0, name.to_string(), email.to_string()),
            _ => return Err("Name and email address are required if not a client".to_string()),
        },
    };
    let service = match (form.id("serviceid"), form.id("domainid")) {
        (Some(id), _) => format!("S{id}"),
        (None, Some(id)) => format!("D{id}"),
        (None, None) => String::new(),
    };
    let date = now();
    let opening = Reply {
        id: 0,
        user_id,
        name: name.clone(),
        email: email.clone(),
        admin: if form.flag("admin") { "System".to_string() } else { String::new() },
        date: date.clone(),
        message: message.to_string(),
    };
    let id = store.tickets.insert(|id| Ticket {
        id,
        mask: format!("MCK-{:06}", 100_000 + id),
        dept_id,
        user_id,
        contact_id: form.id("contactid").unwrap_or(0),
        name,
        email,
        cc: String::new(),
        date: date.clone(),
        subject: subject.to_string(),
        status: "Open".to_string(),
        priority: priority.to_string(),
        admin: String::new(),
        last_reply: date,
        flag: 0,
        service,
        replies: vec![opening],
    });
    let mask = store.tickets.get(id).map(|t| t.mask.clone()).unwrap_or_default();
    Ok(json!({ "id": id, "tid": mask, "c": format!("{:08x}", id) }))
}

fn get_ticket(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("ticketid").unwrap_or(0);
    store
        .tickets
        .get(id)
        .map(Ticket::to_wire)
        .ok_or_else(|| TICKET_NOT_FOUND.to_string())
}

fn get_tickets(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let items = store
        .tickets
        .values()
        .filter(|t| form.id("clientid").map_or(true, |id| t.user_id == id))
        .filter(|t| form.id("deptid").map_or(true, |id| t.dept_id == id))
        .filter(|t| form.text("email").map_or(true, |e| t.email.eq_ignore_ascii_case(e)))
        .filter(|t| form.text("subject").map_or(true, |s| t.subject.contains(s)))
        .filter(|t| form.text("status").map_or(true, |s| t.status.eq_ignore_ascii_case(s)))
        .map(Ticket::summary)
        .collect();
    Ok(page("tickets", "ticket", items, form))
}

fn update_ticket(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("ticketid").unwrap_or(0);
    let ticket = store
        .tickets
        .get_mut(id)
        .ok_or_else(|| TICKET_NOT_FOUND.to_string())?;
    if let Some(dept_id) = form.id("deptid") {
        if department_name(dept_id).is_none() {
            return Err("Department ID not found".to_string());
        }
        ticket.dept_id = dept_id;
    }
    if let Some(priority) = form.text("priority") {
        if !PRIORITIES.contains(&priority) {
            return Err("Invalid Priority. Valid priorities are: Low,Medium,High".to_string());
        }
        ticket.priority = priority.to_string();
    }
    let text_fields: [(&str, &mut String); 5] = [
        ("subject", &mut ticket.subject),
        ("status", &mut ticket.status),
        ("name", &mut ticket.name),
        ("email", &mut ticket.email),
        ("cc", &mut ticket.cc),
    ];
    for (key, slot) in text_fields {
        if let Some(value) = form.text(key) {
            *slot = value.to_string();
        }
    }
    if let Some(flag) = form.id("flag") {
        ticket.flag = flag;
    }
    Ok(json!({ "ticketid": id }))
}

fn delete_ticket(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("ticketid").unwrap_or(0);
    store
        .tickets
        .remove(id)
        .ok_or_else(|| TICKET_NOT_FOUND.to_string())?;
    Ok(json!({}))
}

fn add_ticket_reply(store: &mut Store, form: &Fields<'_>) -> Outcome {
    let id = form.id("ticketid").unwrap_or(0);
    let ticket = store
        .tickets
        .get_mut(id)
        .ok_or_else(|| TICKET_NOT_FOUND.to_string())?;
    let message = form
        .text("message")
        .ok_or_else(|| "Message is required".to_string())?;
    let admin = form.owned("adminusername");
    let date = now();
    let default_status = if admin.is_empty() { "Customer-Reply" } else { "Answered" };
    ticket.status = form.text("status").unwrap_or(default_status).to_string();
    ticket.last_reply = date.clone();
    let reply_id = ticket.replies.iter().map(|r| r.id).max().unwrap_or(0) + 1;
    ticket.replies.push(Reply {
        id: reply_id,
        user_id: form.id("clientid").unwrap_or(ticket.user_id),
        name: form.text("name").map_or_else(|| ticket.name.clone(), str::to_string),
        email: form.text("email").map_or_else(|| ticket.email.clone(), str::to_string),
        admin,
        date,
        message: message.to_string(),
    });
    Ok(json!({}))
}

// --- helpers ---

/// Page `items` per `limitstart`/`limitnum` and wrap them the way list
/// actions do. The wrapper is left out entirely when the page is empty.
fn page(plural: &str, singular: &str, items: Vec<Value>, form: &Fields<'_>) -> Value {
    let total = items.len();
    let start = form.id("limitstart").unwrap_or(0) as usize;
    let limit = form.id("limitnum").unwrap_or(25) as usize;
    let page: Vec<Value> = items.into_iter().skip(start).take(limit).collect();
    let mut body = json!({
        "totalresults": total,
        "startnumber": start,
        "numreturned": page.len(),
    });
    if !page.is_empty() {
        let mut inner = Map::new();
        inner.insert(singular.to_string(), Value::Array(page));
        body[plural] = Value::Object(inner);
    }
    body
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::store::NO_DATETIME;

    fn run(store: &mut Store, action: &str, pairs: &[(&str, &str)]) -> Outcome {
        let fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        dispatch(store, &Settings::default(), action, &Fields::new(&fields))
    }

    #[test]
    fn empty_page_drops_wrapper() {
        let mut store = Store::seeded();
        let body = run(&mut store, "getinvoices", &[]).unwrap();
        assert_eq!(body["numreturned"], 0);
        assert!(body.get("invoices").is_none());
    }

    #[test]
    fn page_honours_limits() {
        let mut store = Store::seeded();
        let body = run(&mut store, "getproducts", &[("limitstart", "1"), ("limitnum", "1")]).unwrap();
        assert_eq!(body["totalresults"], 3);
        assert_eq!(body["numreturned"], 1);
        assert_eq!(body["products"]["product"][0]["pid"], 2);
    }

    #[test]
    fn ticket_priority_must_be_title_case() {
        let mut store = Store::seeded();
        let base = [
            ("deptid", "1"),
            ("subject", "Hi"),
            ("message", "Hello"),
            ("name", "Guest"),
            ("email", "guest@example.com"),
        ];
        let mut lower = base.to_vec();
        lower.push(("priority", "high"));
        assert!(run(&mut store, "openticket", &lower).is_err());

        let mut title = base.to_vec();
        title.push(("priority", "High"));
        let body = run(&mut store, "openticket", &title).unwrap();
        assert_eq!(body["id"], 1);
    }

    #[test]
    fn unknown_action() {
        let mut store = Store::seeded();
        assert_eq!(
            run(&mut store, "frobnicate", &[]),
            Err("Command Not Found".to_string())
        );
    }

    #[test]
    fn missing_records_use_remote_messages() {
        let mut store = Store::seeded();
        let cases = [
            ("getclientsdetails", "clientid", CLIENT_NOT_FOUND),
            ("getinvoice", "invoiceid", INVOICE_NOT_FOUND),
            ("cancelorder", "orderid", ORDER_NOT_FOUND),
            ("getticket", "ticketid", TICKET_NOT_FOUND),
        ];
        for (action, key, message) in cases {
            assert_eq!(run(&mut store, action, &[(key, "99")]), Err(message.to_string()));
        }
    }

    #[test]
    fn email_validation() {
        assert!(valid_email("ada@example.com"));
        assert!(!valid_email("ada.example.com"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("ada@localhost"));
        assert_eq!(NO_DATETIME.len(), 19);
    }
}
