//! Encoder for the remote system's PHP `serialize()` array format.
//!
//! Only the custom-fields parameter travels in this format, as
//! `base64(serialize(array(...)))`. Lengths of strings are byte lengths, as
//! PHP counts them.

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered key/value pairs. Keys should be `Int` or `Str`.
    Array(Vec<(PhpValue, PhpValue)>),
}

impl From<&str> for PhpValue {
    fn from(value: &str) -> Self {
        PhpValue::Str(value.to_string())
    }
}

impl From<String> for PhpValue {
    fn from(value: String) -> Self {
        PhpValue::Str(value)
    }
}

impl From<i64> for PhpValue {
    fn from(value: i64) -> Self {
        PhpValue::Int(value)
    }
}

impl From<u64> for PhpValue {
    fn from(value: u64) -> Self {
        // Remote ids fit comfortably in a PHP int.
        PhpValue::Int(value as i64)
    }
}

pub fn serialize(value: &PhpValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &PhpValue) {
    // write! into a String cannot fail
    let _ = match value {
        PhpValue::Null => write!(out, "N;"),
        PhpValue::Bool(b) => write!(out, "b:{};", u8::from(*b)),
        PhpValue::Int(i) => write!(out, "i:{i};"),
        PhpValue::Float(f) => write!(out, "d:{f};"),
        PhpValue::Str(s) => write!(out, "s:{}:\"{s}\";", s.len()),
        PhpValue::Array(entries) => {
            let _ = write!(out, "a:{}:{{", entries.len());
            for (key, item) in entries {
                write_value(out, key);
                write_value(out, item);
            }
            write!(out, "}}")
        }
    };
}
