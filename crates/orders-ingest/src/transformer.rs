//! Field type conversions
//!
//! Turns a [`ValidatedRecord`] into a [`TransformedRecord`]. Designated date
//! fields are parsed from `MM/DD/YYYY`, the designated numeric field is parsed
//! as a float, empty strings become null and everything else passes through.
//! A failed conversion nulls that one field and emits a diagnostic; the record
//! itself is always kept.

use chrono::NaiveDate;
use orders_common::types::{DATE_FIELDS, NUMERIC_FIELD, SOURCE_DATE_FORMAT};
use thiserror::Error;

use crate::diagnostics::{DiagnosticEvent, SharedDiagnostics};
use crate::models::{FieldValue, TransformedRecord, ValidatedRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("expected date in MM/DD/YYYY format")]
    InvalidDate,

    #[error("expected a number")]
    InvalidNumber,

    #[error("number is not finite")]
    NonFinite,
}

/// Parse a source date in `MM/DD/YYYY` form with a four-digit year
pub fn parse_source_date(raw: &str) -> Result<NaiveDate, ConversionError> {
    let year = raw.rsplit('/').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConversionError::InvalidDate);
    }
    NaiveDate::parse_from_str(raw, SOURCE_DATE_FORMAT).map_err(|_| ConversionError::InvalidDate)
}

/// Parse a finite floating point number
pub fn parse_number(raw: &str) -> Result<f64, ConversionError> {
    let value: f64 = raw.parse().map_err(|_| ConversionError::InvalidNumber)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConversionError::NonFinite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Date,
    Number,
    Plain,
}

pub struct Transformer {
    date_fields: Vec<String>,
    numeric_field: String,
    diagnostics: SharedDiagnostics,
}

impl Transformer {
    /// Transformer for the standard order columns
    pub fn new(diagnostics: SharedDiagnostics) -> Self {
        Self::with_fields(
            DATE_FIELDS.iter().map(|f| f.to_string()).collect(),
            NUMERIC_FIELD.to_string(),
            diagnostics,
        )
    }

    pub fn with_fields(
        date_fields: Vec<String>,
        numeric_field: String,
        diagnostics: SharedDiagnostics,
    ) -> Self {
        Self {
            date_fields,
            numeric_field,
            diagnostics,
        }
    }

    fn kind_of(&self, field: &str) -> FieldKind {
        if self.date_fields.iter().any(|f| f == field) {
            FieldKind::Date
        } else if self.numeric_field == field {
            FieldKind::Number
        } else {
            FieldKind::Plain
        }
    }

    pub fn transform(&self, record: &ValidatedRecord) -> TransformedRecord {
        let order_id = record.order_id();
        record
            .iter()
            .map(|(field, value)| {
                let converted = self.convert(order_id, field, value);
                (field.to_string(), converted)
            })
            .collect()
    }

    /// Run an already-transformed record through the rules again
    ///
    /// Typed values pass through untouched, so applying this to the output of
    /// [`Transformer::transform`] returns the same record.
    pub fn retransform(&self, record: TransformedRecord) -> TransformedRecord {
        let order_id = record.order_id().to_string();
        record
            .into_iter()
            .map(|(field, value)| {
                let converted = match value {
                    FieldValue::Text(text) => self.convert(&order_id, &field, &text),
                    typed => typed,
                };
                (field, converted)
            })
            .collect()
    }

    fn convert(&self, order_id: &str, field: &str, value: &str) -> FieldValue {
        if value.is_empty() {
            return FieldValue::Null;
        }

        let result = match self.kind_of(field) {
            FieldKind::Plain => return FieldValue::Text(value.to_string()),
            FieldKind::Date => parse_source_date(value).map(FieldValue::Date),
            FieldKind::Number => parse_number(value).map(FieldValue::Number),
        };

        result.unwrap_or_else(|error| {
            self.diagnostics.emit(DiagnosticEvent::ConversionFailed {
                order_id: order_id.to_string(),
                field: field.to_string(),
                raw_value: value.to_string(),
                error: error.to_string(),
            });
            FieldValue::Null
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diagnostics::CapturedDiagnostics;
    use crate::validator::{Validation, Validator};
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn validated(pairs: &[(&str, &str)]) -> ValidatedRecord {
        ValidatedRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_converts_dates_and_sales() {
        let sink = Arc::new(CapturedDiagnostics::new());
        let transformer = Transformer::new(sink.clone());
        let record = transformer.transform(&validated(&[
            ("Order ID", "CA-2016-152156"),
            ("Order Date", "11/08/2016"),
            ("Ship Date", "11/11/2016"),
            ("Sales", "261.96"),
            ("Ship Mode", "Second Class"),
            ("Postal Code", ""),
        ]));

        assert_eq!(
            record.get("Order Date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2016, 11, 8).unwrap()))
        );
        assert_eq!(record.get("Sales"), Some(&FieldValue::Number(261.96)));
        assert_eq!(record.get("Ship Mode"), Some(&FieldValue::Text("Second Class".into())));
        assert_eq!(record.get("Postal Code"), Some(&FieldValue::Null));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_bad_values_become_null_with_diagnostic() {
        let sink = Arc::new(CapturedDiagnostics::new());
        let transformer = Transformer::new(sink.clone());
        let record = transformer.transform(&validated(&[
            ("Order ID", "CA-7"),
            ("Order Date", "2016-11-08"),
            ("Ship Date", "13/40/2016"),
            ("Sales", "12,50"),
        ]));

        assert_eq!(record.get("Order Date"), Some(&FieldValue::Null));
        assert_eq!(record.get("Ship Date"), Some(&FieldValue::Null));
        assert_eq!(record.get("Sales"), Some(&FieldValue::Null));
        assert_eq!(record.get("Order ID"), Some(&FieldValue::Text("CA-7".into())));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(events.contains(&DiagnosticEvent::ConversionFailed {
            order_id: "CA-7".into(),
            field: "Sales".into(),
            raw_value: "12,50".into(),
            error: "expected a number".into(),
        }));
    }

    #[test]
    fn test_parse_source_date_requires_four_digit_year() {
        assert!(parse_source_date("1/2/2020").is_ok());
        assert_eq!(parse_source_date("01/02/20"), Err(ConversionError::InvalidDate));
        assert_eq!(parse_source_date("01/02/20200"), Err(ConversionError::InvalidDate));
        assert_eq!(parse_source_date("02/30/2020"), Err(ConversionError::InvalidDate));
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number("1e3"), Ok(1000.0));
        assert_eq!(parse_number("-4.5"), Ok(-4.5));
        assert_eq!(parse_number("inf"), Err(ConversionError::NonFinite));
        assert_eq!(parse_number("NaN"), Err(ConversionError::NonFinite));
        assert_eq!(parse_number("1_000"), Err(ConversionError::InvalidNumber));
    }

    #[test]
    fn test_retransform_converts_remaining_text() {
        let transformer = Transformer::new(Arc::new(CapturedDiagnostics::new()));
        let record: TransformedRecord = [
            ("Sales".to_string(), FieldValue::Text("5".into())),
            ("Region".to_string(), FieldValue::Text(String::new())),
        ]
        .into_iter()
        .collect();

        let again = transformer.retransform(record);
        assert_eq!(again.get("Sales"), Some(&FieldValue::Number(5.0)));
        assert_eq!(again.get("Region"), Some(&FieldValue::Null));
    }

    proptest! {
        #[test]
        fn prop_transform_is_idempotent(
            order_id in "[A-Z]{2}-[0-9]{1,4}",
            date in "[0-9/]{0,10}",
            sales in "[0-9.e-]{0,6}",
            region in "[A-Za-z ]{0,8}",
        ) {
            let sink = Arc::new(CapturedDiagnostics::new());
            let validator = Validator::new(vec!["Order ID".into()], sink.clone());
            let transformer = Transformer::new(sink);

            let raw = [
                ("Order ID".to_string(), order_id),
                ("Order Date".to_string(), date),
                ("Sales".to_string(), sales),
                ("Region".to_string(), region),
            ]
            .into_iter()
            .collect();
            let Validation::Valid(valid) = validator.validate(&raw) else {
                return Err(TestCaseError::fail("order id is always present"));
            };

            let once = transformer.transform(&valid);
            prop_assert_eq!(once.len(), valid.len());
            for (field, value) in once.iter() {
                if value.is_null() {
                    let source = valid.get(field).unwrap_or_default();
                    let designated = field == "Order Date" || field == "Sales";
                    prop_assert!(source.is_empty() || designated);
                }
            }

            let twice = transformer.retransform(once.clone());
            prop_assert_eq!(twice, once);
        }
    }
}
