//! Readers for success bodies.
//!
//! The remote service is loose with types: numbers arrive as strings, flags
//! as `"1"`/`"0"` or `"on"`, and unset dates as `0000-00-00`. `Fields`
//! coerces all of these. Required accessors fail with `MissingField` so a
//! record is never built from a partial body.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Typed view over one JSON object from a response.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Result<Self> {
        value
            .as_object()
            .map(|map| Self { map })
            .ok_or_else(|| ApiError::DeserializationError(format!("expected an object, got {value}")))
    }

    /// The raw value, with JSON `null` treated as absent.
    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    /// Nested object at `key`, if any.
    pub fn object(&self, key: &str) -> Option<Fields<'a>> {
        self.raw(key)
            .and_then(Value::as_object)
            .map(|map| Fields { map })
    }

    pub fn text(&self, key: &str) -> Result<String> {
        self.raw(key).map(scalar_text).ok_or_else(|| missing(key))
    }

    /// First present key wins; for fields the service names differently
    /// between its single-item and list actions.
    pub fn text_any(&self, keys: &[&str]) -> Result<String> {
        keys.iter()
            .find_map(|key| self.raw(key).map(scalar_text))
            .ok_or_else(|| missing(keys[0]))
    }

    /// Empty strings count as absent.
    pub fn opt_text(&self, key: &str) -> Option<String> {
        self.raw(key).map(scalar_text).filter(|text| !text.is_empty())
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        let value = self.raw(key).ok_or_else(|| missing(key))?;
        as_int(value).ok_or_else(|| invalid(key, value))
    }

    pub fn opt_int(&self, key: &str) -> Option<i64> {
        self.raw(key).and_then(as_int)
    }

    pub fn id(&self, key: &str) -> Result<u64> {
        self.id_any(&[key])
    }

    pub fn id_any(&self, keys: &[&str]) -> Result<u64> {
        let (key, value) = keys
            .iter()
            .find_map(|key| self.raw(key).map(|value| (*key, value)))
            .ok_or_else(|| missing(keys[0]))?;
        as_int(value)
            .and_then(|id| u64::try_from(id).ok())
            .ok_or_else(|| invalid(key, value))
    }

    /// Zero and empty are the service's "no reference" values.
    pub fn opt_id(&self, key: &str) -> Option<u64> {
        self.opt_int(key)
            .and_then(|id| u64::try_from(id).ok())
            .filter(|id| *id != 0)
    }

    pub fn float(&self, key: &str) -> Result<f64> {
        let value = self.raw(key).ok_or_else(|| missing(key))?;
        as_float(value).ok_or_else(|| invalid(key, value))
    }

    pub fn opt_float(&self, key: &str) -> Option<f64> {
        self.raw(key).and_then(as_float)
    }

    /// Absent flags read as false.
    pub fn flag(&self, key: &str) -> bool {
        self.raw(key).is_some_and(as_flag)
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.raw(key).and_then(Value::as_str).and_then(parse_date)
    }

    pub fn datetime(&self, key: &str) -> Option<NaiveDateTime> {
        self.raw(key).and_then(Value::as_str).and_then(parse_datetime)
    }

    /// Lower-cased status text; the service's casing varies per action.
    pub fn status(&self, key: &str) -> Result<String> {
        self.text(key).map(|status| status.to_lowercase())
    }
}

/// A custom field value as reported on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomFieldValue {
    pub id: u64,
    pub value: String,
}

impl<'a> Fields<'a> {
    /// Custom field values under `key`, either a bare array or wrapped as
    /// `{"customfield": [...]}`. Malformed entries are skipped.
    pub fn custom_fields(&self, key: &str) -> Vec<CustomFieldValue> {
        let items = match self.raw(key) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(wrapper) if wrapper.is_object() => collection_items(wrapper.get("customfield")),
            _ => Vec::new(),
        };
        items
            .into_iter()
            .filter_map(|item| {
                let fields = Fields::new(item).ok()?;
                Some(CustomFieldValue {
                    id: fields.id("id").ok()?,
                    value: fields.opt_text("value").unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// Parse `YYYY-MM-DD`, ignoring any time suffix. Sentinels such as
/// `0000-00-00` and unparsable text give `None`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let head = text.trim().get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Parse `YYYY-MM-DD HH:MM:SS`, or a bare date at midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            if text.len() == 10 {
                parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0))
            } else {
                None
            }
        })
}

/// Read a count field such as `totalresults`; absent or malformed is zero.
pub fn count(body: &Value, key: &str) -> u64 {
    body.get(key)
        .and_then(as_int)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

/// Items of a list response, which nest under `{plural: {singular: [...]}}`.
///
/// The service drops the inner key entirely (or sends `""` for the
/// wrapper) when nothing matched, and some deployments send a lone object
/// instead of a one-element array. All of these are normalized here.
pub fn collection<'a>(body: &'a Value, plural: &str, singular: &str) -> Vec<&'a Value> {
    collection_items(body.get(plural).and_then(|wrapper| wrapper.get(singular)))
}

fn collection_items(inner: Option<&Value>) -> Vec<&Value> {
    match inner {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) if item.is_object() => vec![item],
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        _ => false,
    }
}

fn missing(key: &str) -> ApiError {
    ApiError::MissingField {
        field: key.to_string(),
    }
}

fn invalid(key: &str, value: &Value) -> ApiError {
    ApiError::DeserializationError(format!("field `{key}` has unexpected value {value}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_from_strings() {
        let body = json!({ "id": "12", "credit": "3.50", "currency": 1, "blank": "" });
        let fields = Fields::new(&body).unwrap();
        assert_eq!(fields.id("id").unwrap(), 12);
        assert_eq!(fields.float("credit").unwrap(), 3.5);
        assert_eq!(fields.int("currency").unwrap(), 1);
        assert_eq!(fields.opt_int("blank"), None);
    }

    #[test]
    fn flags() {
        let body = json!({ "a": "1", "b": "0", "c": "on", "d": true, "e": "", "f": 0 });
        let fields = Fields::new(&body).unwrap();
        assert!(fields.flag("a"));
        assert!(!fields.flag("b"));
        assert!(fields.flag("c"));
        assert!(fields.flag("d"));
        assert!(!fields.flag("e"));
        assert!(!fields.flag("f"));
        assert!(!fields.flag("absent"));
    }

    #[test]
    fn dates_and_sentinels() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("2024-02-29 10:11:12"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("0000-00-00"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);

        let at = parse_datetime("2024-02-29 10:11:12").unwrap();
        assert_eq!(at.format("%H:%M:%S").to_string(), "10:11:12");
        let midnight = parse_datetime("2024-02-29").unwrap();
        assert_eq!(midnight.format("%H:%M").to_string(), "00:00");
        assert_eq!(parse_datetime("0000-00-00 00:00:00"), None);
    }

    #[test]
    fn missing_required_field() {
        let body = json!({ "id": null });
        let fields = Fields::new(&body).unwrap();
        assert!(matches!(fields.id("id"), Err(ApiError::MissingField { .. })));
        assert!(matches!(fields.text("email"), Err(ApiError::MissingField { field }) if field == "email"));
    }

    #[test]
    fn opt_id_treats_zero_as_absent() {
        let body = json!({ "contactid": "0", "invoiceid": "9" });
        let fields = Fields::new(&body).unwrap();
        assert_eq!(fields.opt_id("contactid"), None);
        assert_eq!(fields.opt_id("invoiceid"), Some(9));
    }

    #[test]
    fn collection_quirks() {
        let full = json!({ "invoices": { "invoice": [{ "id": 1 }, { "id": 2 }] } });
        assert_eq!(collection(&full, "invoices", "invoice").len(), 2);

        let single = json!({ "invoices": { "invoice": { "id": 1 } } });
        assert_eq!(collection(&single, "invoices", "invoice").len(), 1);

        let empty_wrapper = json!({ "totalresults": 0, "invoices": "" });
        assert!(collection(&empty_wrapper, "invoices", "invoice").is_empty());

        let no_wrapper = json!({ "totalresults": 0 });
        assert!(collection(&no_wrapper, "invoices", "invoice").is_empty());
    }

    #[test]
    fn custom_fields_in_both_shapes() {
        let bare = json!({ "customfields": [{ "id": "3", "value": "blue" }, { "value": "no id" }] });
        let wrapped = json!({ "customfields": { "customfield": [{ "id": 3, "value": "blue" }] } });
        for body in [bare, wrapped] {
            let values = Fields::new(&body).unwrap().custom_fields("customfields");
            assert_eq!(values, vec![CustomFieldValue { id: 3, value: "blue".to_string() }]);
        }
    }

    #[test]
    fn count_accepts_strings() {
        assert_eq!(count(&json!({ "totalresults": "3" }), "totalresults"), 3);
        assert_eq!(count(&json!({ "totalresults": 2 }), "totalresults"), 2);
        assert_eq!(count(&json!({}), "totalresults"), 0);
    }
}
