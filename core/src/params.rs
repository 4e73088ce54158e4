//! Request parameters: wire values, the per-request field list, caller
//! supplied change sets, and idiomatic-to-wire field name tables.
//!
//! # Design
//! Bridges never hand the dispatcher a value meaning "unset". Optional
//! inputs go through `Params::with_opt`, which simply skips `None`, so an
//! absent optional is absent from the transmitted form.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{ApiError, Result};
use crate::php::PhpValue;

/// A scalar ready for form encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Encoded as `1`/`0`; the remote side tests truthiness, so `"false"`
    /// would read as set.
    Bool(bool),
    Date(NaiveDate),
}

impl WireValue {
    pub fn to_wire(&self) -> String {
        match self {
            WireValue::Text(s) => s.clone(),
            WireValue::Int(i) => i.to_string(),
            WireValue::UInt(u) => u.to_string(),
            WireValue::Float(f) => f.to_string(),
            WireValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            WireValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

macro_rules! wire_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(impl From<$ty> for WireValue {
            fn from(value: $ty) -> Self {
                WireValue::$variant(<$conv>::from(value))
            }
        })*
    };
}

wire_from! {
    &str => Text as String,
    String => Text as String,
    &String => Text as String,
    i64 => Int as i64,
    i32 => Int as i64,
    u32 => Int as i64,
    u64 => UInt as u64,
    f64 => Float as f64,
    bool => Bool as bool,
    NaiveDate => Date as NaiveDate,
}


/// Values for the remote system's custom fields, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFields(BTreeMap<u64, String>);

impl CustomFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field_id: u64, value: impl Into<String>) -> Self {
        self.insert(field_id, value);
        self
    }

    pub fn insert(&mut self, field_id: u64, value: impl Into<String>) {
        self.0.insert(field_id, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_php(&self) -> PhpValue {
        PhpValue::Array(
            self.0
                .iter()
                .map(|(id, value)| (PhpValue::from(*id), PhpValue::from(value.as_str())))
                .collect(),
        )
    }
}

/// Wire parameters for one action, in insertion order.
///
/// Custom fields are held apart: the dispatcher encodes them in the
/// remote nested-array format rather than as a plain string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    fields: Vec<(String, WireValue)>,
    custom_fields: Option<CustomFields>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<WireValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn with_opt<V: Into<WireValue>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    /// Set `name`, replacing an earlier value for the same name.
    pub fn push(&mut self, name: &str, value: impl Into<WireValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn with_custom_fields(mut self, custom_fields: Option<CustomFields>) -> Self {
        if let Some(custom_fields) = custom_fields {
            self.custom_fields = Some(custom_fields);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&WireValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn custom_fields(&self) -> Option<&CustomFields> {
        self.custom_fields.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.custom_fields.is_none()
    }
}

/// A caller-supplied set of field changes keyed by idiomatic names, used by
/// `update` operations and record convenience methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    fields: Vec<(String, WireValue)>,
    custom_fields: Option<CustomFields>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl Into<WireValue>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn set_opt<V: Into<WireValue>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    pub fn custom_fields(mut self, custom_fields: CustomFields) -> Self {
        self.custom_fields = Some(custom_fields);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.custom_fields.is_none()
    }
}

/// A bridge's table of `(idiomatic name, wire name)` pairs.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    resource: &'static str,
    pairs: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    pub const fn new(resource: &'static str, pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { resource, pairs }
    }

    pub fn wire_name(&self, name: &str) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(idiomatic, _)| *idiomatic == name)
            .map(|(_, wire)| *wire)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(idiomatic, _)| *idiomatic)
    }

    /// Translate `changes` onto `params`. Any name outside the table is
    /// rejected before anything is sent.
    pub fn apply(&self, changes: &Changes, params: &mut Params) -> Result<()> {
        for (name, value) in &changes.fields {
            let wire = self.wire_name(name).ok_or_else(|| ApiError::UnknownField {
                resource: self.resource,
                field: name.clone(),
            })?;
            params.push(wire, value.clone());
        }
        if let Some(custom_fields) = &changes.custom_fields {
            params.custom_fields = Some(custom_fields.clone());
        }
        Ok(())
    }

    pub fn translate(&self, changes: &Changes) -> Result<Params> {
        let mut params = Params::new();
        self.apply(changes, &mut params)?;
        Ok(params)
    }
}
