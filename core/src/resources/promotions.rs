//! Promotion codes, read only.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::{Action, Dispatcher};
use crate::error::{ErrorKind, RemoteError, Result};
use crate::params::Params;
use crate::resource::{record_lookup, Bridge};
use crate::wire::{collection, count, Fields};

#[derive(Debug, Clone, Default)]
pub struct PromotionFilter {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub id: u64,
    pub code: String,
    /// `Percentage`, `Fixed Amount`, `Price Override` or `Free Setup`.
    pub kind: String,
    pub value: f64,
    pub recurring: bool,
    pub cycles: Option<String>,
    pub applies_to: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    /// Zero means unlimited.
    pub max_uses: i64,
    pub uses: i64,
    pub apply_once: bool,
    pub new_signups: bool,
    pub existing_client: bool,
    pub once_per_client: bool,
    pub notes: Option<String>,
    #[serde(skip)]
    bridge: PromotionBridge,
}

impl Promotion {
    pub fn refresh(&self) -> Result<Promotion> {
        self.bridge.get(&self.code)
    }

    fn parse(bridge: &PromotionBridge, item: &Value) -> Result<Self> {
        let f = Fields::new(item)?;
        Ok(Promotion {
            id: f.id("id")?,
            code: f.text("code")?,
            kind: f.text("type")?,
            value: f.float("value")?,
            recurring: f.flag("recurring"),
            cycles: f.opt_text("cycles"),
            applies_to: f.opt_text("appliesto"),
            start_date: f.date("startdate"),
            expiration_date: f.date("expirationdate"),
            max_uses: f.opt_int("maxuses").unwrap_or(0),
            uses: f.opt_int("uses").unwrap_or(0),
            apply_once: f.flag("applyonce"),
            new_signups: f.flag("newsignups"),
            existing_client: f.flag("existingclient"),
            once_per_client: f.flag("onceperclient"),
            notes: f.opt_text("notes"),
            bridge: bridge.clone(),
        })
    }
}

record_lookup!(Promotion);

#[derive(Debug, Clone)]
pub struct PromotionBridge {
    dispatcher: Arc<Dispatcher>,
}

impl PromotionBridge {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Look a promotion up by its code. The code must match exactly one.
    pub fn get(&self, code: &str) -> Result<Promotion> {
        let filter = PromotionFilter {
            code: Some(code.to_string()),
        };
        let mut matches = self.list(&filter)?;
        let kind = match matches.len() {
            1 => return Ok(matches.remove(0)),
            0 => ErrorKind::PromotionNotFound,
            _ => ErrorKind::ResourceNotUnique,
        };
        Err(RemoteError::new(
            kind,
            Action::GetPromotions,
            format!("{} promotions match code {code}", matches.len()),
        )
        .into())
    }
}

impl Bridge for PromotionBridge {
    type Record = Promotion;
    type Filter = PromotionFilter;

    const RESOURCE: &'static str = "promotion";

    fn list(&self, filter: &PromotionFilter) -> Result<Vec<Promotion>> {
        let params = Params::new().with_opt("code", filter.code.as_deref());
        let body = self.dispatcher.send_request(Action::GetPromotions, params)?;
        if count(&body, "totalresults") == 0 {
            return Ok(Vec::new());
        }
        collection(&body, "promotions", "promotion")
            .into_iter()
            .map(|item| Promotion::parse(self, item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::testing::ScriptedTransport;
    use crate::resources::test_support::dispatcher;

    fn promotion(id: u64, code: &str) -> Value {
        json!({
            "id": id, "code": code, "type": "Percentage", "recurring": 0, "value": "10.00",
            "cycles": "", "appliesto": "1", "startdate": "0000-00-00",
            "expirationdate": "2030-01-01", "maxuses": 0, "uses": 3, "applyonce": 1,
            "newsignups": 0, "existingclient": 0, "onceperclient": 1, "notes": ""
        })
    }

    fn bridge(transport: &ScriptedTransport) -> PromotionBridge {
        PromotionBridge::new(dispatcher(transport))
    }

    #[test]
    fn get_by_code() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({ "result": "success", "totalresults": 1, "promotions": { "promotion": [promotion(1, "SPRING")] } }),
        );
        let promo = bridge(&transport).get("SPRING").unwrap();
        assert_eq!(promo.code, "SPRING");
        assert_eq!(promo.value, 10.0);
        assert_eq!(promo.start_date, None);
        assert_eq!(promo.expiration_date, NaiveDate::from_ymd_opt(2030, 1, 1));
        assert!(promo.apply_once);
        assert!(!promo.recurring);
        assert_eq!(transport.last_request().field("code"), Some("SPRING"));
    }

    #[test]
    fn get_unknown_code() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({ "result": "success", "totalresults": 0 }));
        let err = bridge(&transport).get("NOPE").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::PromotionNotFound));
        assert!(err.is_not_found());
    }

    #[test]
    fn get_ambiguous_code() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({ "result": "success", "totalresults": 2, "promotions": { "promotion": [
                promotion(1, "DUP"), promotion(2, "DUP")
            ] } }),
        );
        let err = bridge(&transport).get("DUP").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ResourceNotUnique));
        assert!(!err.is_not_found());
    }

    #[test]
    fn list_all_sends_no_code() {
        let transport = ScriptedTransport::new();
        transport.respond(
            200,
            json!({ "result": "success", "totalresults": 1, "promotions": { "promotion": promotion(4, "ALL") } }),
        );
        let promos = bridge(&transport).list(&PromotionFilter::default()).unwrap();
        assert_eq!(promos.len(), 1);
        assert_eq!(promos[0].id, 4);
        assert!(!transport.last_request().has_field("code"));
    }
}
