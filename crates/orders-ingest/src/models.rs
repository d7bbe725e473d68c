//! Record models for each pipeline stage
//!
//! A row moves through three shapes: [`RawRecord`] straight from the reader,
//! [`ValidatedRecord`] after required-field checks and trimming, and
//! [`TransformedRecord`] with typed values, which is what gets persisted.

use chrono::NaiveDate;
use orders_common::types::{ORDER_ID, STORED_DATE_FORMAT, UNKNOWN_ORDER_ID};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// One CSV data line keyed by header name
pub type RawRecord = BTreeMap<String, String>;

/// Best-effort order identifier for diagnostics
pub(crate) fn order_id_of<'a>(value: Option<&'a str>) -> &'a str {
    match value {
        Some(id) if !id.trim().is_empty() => id,
        _ => UNKNOWN_ORDER_ID,
    }
}

/// Row whose required fields are present and non-empty, all values trimmed
///
/// Only the validator constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    fields: BTreeMap<String, String>,
}

impl ValidatedRecord {
    pub(crate) fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn order_id(&self) -> &str {
        order_id_of(self.get(ORDER_ID))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Typed value of a persisted field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Date(NaiveDate),
    Number(f64),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON form stored in the document column
    ///
    /// Dates become ISO `YYYY-MM-DD` strings. Non-finite numbers cannot be
    /// represented in JSON and become null.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Date(d) => Value::String(d.format(STORED_DATE_FORMAT).to_string()),
            FieldValue::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

/// Row with typed values; the unit of persistence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl TransformedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn order_id(&self) -> &str {
        order_id_of(self.get(ORDER_ID).and_then(FieldValue::as_text))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object stored as one order document
    pub fn to_document(&self) -> Value {
        let map: Map<String, Value> =
            self.fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        Value::Object(map)
    }
}

impl FromIterator<(String, FieldValue)> for TransformedRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TransformedRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
