//! Required-field validation
//!
//! Every value is trimmed first. A required field whose key is absent is
//! reported as missing; one that is present but blank after trimming is
//! reported as empty. Both lists are collected in full before rejecting.

use orders_common::types::{ORDER_ID, REQUIRED_FIELDS};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::diagnostics::{DiagnosticEvent, SharedDiagnostics};
use crate::models::{order_id_of, RawRecord, ValidatedRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(ValidatedRecord),
    Rejected { reason: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }
}

pub struct Validator {
    required: Vec<String>,
    diagnostics: SharedDiagnostics,
}

impl Validator {
    pub fn new(required: Vec<String>, diagnostics: SharedDiagnostics) -> Self {
        Self {
            required,
            diagnostics,
        }
    }

    /// Validator checking the order columns every row must carry
    pub fn for_orders(diagnostics: SharedDiagnostics) -> Self {
        Self::new(
            REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            diagnostics,
        )
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    pub fn validate(&self, record: &RawRecord) -> Validation {
        let cleaned: BTreeMap<String, String> = record
            .iter()
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect();
        self.check(cleaned)
    }

    /// Validate a record that arrived as JSON
    ///
    /// Anything other than an object is rejected. Null values count as empty;
    /// other scalars are validated by their string form.
    pub fn validate_json(&self, value: &Value) -> Validation {
        let Value::Object(map) = value else {
            let reason = "Validation failed - record is not a field map".to_string();
            self.reject(None, &reason);
            return Validation::Rejected { reason };
        };

        let cleaned: BTreeMap<String, String> = map
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::Null => String::new(),
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect();
        self.check(cleaned)
    }

    fn check(&self, cleaned: BTreeMap<String, String>) -> Validation {
        let mut missing = Vec::new();
        let mut empty = Vec::new();

        for field in &self.required {
            match cleaned.get(field) {
                None => missing.push(field.as_str()),
                Some(value) if value.is_empty() => empty.push(field.as_str()),
                Some(_) => {}
            }
        }

        if missing.is_empty() && empty.is_empty() {
            return Validation::Valid(ValidatedRecord::new(cleaned));
        }

        let mut parts = Vec::with_capacity(2);
        if !missing.is_empty() {
            parts.push(format!("missing: {}", missing.join(", ")));
        }
        if !empty.is_empty() {
            parts.push(format!("empty: {}", empty.join(", ")));
        }
        let reason = format!("Validation failed - {}", parts.join(", "));

        self.reject(cleaned.get(ORDER_ID).map(String::as_str), &reason);
        Validation::Rejected { reason }
    }

    fn reject(&self, order_id: Option<&str>, reason: &str) {
        self.diagnostics.emit(DiagnosticEvent::RecordRejected {
            order_id: order_id_of(order_id).to_string(),
            reason: reason.to_string(),
        });
    }
}
