//! Figures returned by the extraction boundary
//!
//! The model's answer is kept as an open mapping ([`ExtractedFinancials`]) so
//! it can be echoed back untouched, and decoded once into the typed
//! [`RawFinancials`] the ratio engine consumes.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Company name used when the document does not yield one
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Income statement figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub net_profit_or_loss: f64,
}

/// Balance sheet and income statement figures for one company
///
/// Absent figures are zero. Values may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFinancials {
    pub company: String,
    #[serde(default)]
    pub net_worth: f64,
    #[serde(default)]
    pub liabilities: f64,
    #[serde(default)]
    pub equity: f64,
    #[serde(default)]
    pub profit_and_loss: ProfitAndLoss,
    #[serde(default)]
    pub source_file: String,
}

impl Default for RawFinancials {
    fn default() -> Self {
        Self {
            company: UNKNOWN_COMPANY.to_string(),
            net_worth: 0.0,
            liabilities: 0.0,
            equity: 0.0,
            profit_and_loss: ProfitAndLoss::default(),
            source_file: String::new(),
        }
    }
}

impl RawFinancials {
    /// Decode a loosely typed mapping
    ///
    /// `null` and missing keys read as zero, numeric strings such as
    /// `"1,250,000"` are coerced, and anything else is a computation failure
    /// naming the field. A non-string `company` becomes "Unknown".
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(ReportError::Computation {
                company: UNKNOWN_COMPANY.to_string(),
                field: "financials".to_string(),
                message: format!("expected an object, found {}", type_name(value)),
            });
        };

        let company = object
            .get("company")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_COMPANY)
            .to_string();

        let number = |map: &Map<String, Value>, key: &str, path: &str| {
            decode_number(map.get(key), path, &company)
        };

        let profit_and_loss = match object.get("profit_and_loss") {
            None | Some(Value::Null) => ProfitAndLoss::default(),
            Some(Value::Object(pl)) => ProfitAndLoss {
                total_revenue: number(pl, "total_revenue", "profit_and_loss.total_revenue")?,
                total_expenses: number(pl, "total_expenses", "profit_and_loss.total_expenses")?,
                net_profit_or_loss: number(
                    pl,
                    "net_profit_or_loss",
                    "profit_and_loss.net_profit_or_loss",
                )?,
            },
            Some(other) => {
                return Err(ReportError::Computation {
                    company,
                    field: "profit_and_loss".to_string(),
                    message: format!("expected an object, found {}", type_name(other)),
                });
            }
        };

        Ok(Self {
            net_worth: number(object, "net_worth", "net_worth")?,
            liabilities: number(object, "liabilities", "liabilities")?,
            equity: number(object, "equity", "equity")?,
            profit_and_loss,
            source_file: object
                .get("source_file")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            company,
        })
    }
}

/// Read one figure under the absent-is-zero policy
fn decode_number(value: Option<&Value>, field: &str, company: &str) -> Result<f64> {
    let failure = |message: String| ReportError::Computation {
        company: company.to_string(),
        field: field.to_string(),
        message,
    };

    let number = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| failure(format!("is not representable as a number: {n}")))?,
        Some(Value::String(s)) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '_'))
                .collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| failure(format!("expected a number, found string \"{s}\"")))?
        }
        Some(other) => {
            return Err(failure(format!(
                "expected a number, found {}",
                type_name(other)
            )));
        }
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(failure(format!("is not a finite number: {number}")))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The extraction boundary's answer for one document
///
/// Keeps every key the model returned; `source_file` is attached by the
/// caller and serialized alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFinancials {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub source_file: String,
}

impl ExtractedFinancials {
    /// Wrap a model mapping, attaching the originating document
    pub fn new(source_file: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("source_file");
        Self {
            fields,
            source_file: source_file.into(),
        }
    }

    /// Company name as reported by the model
    pub fn company(&self) -> &str {
        self.fields
            .get("company")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_COMPANY)
    }

    /// Decode into typed figures
    pub fn decode(&self) -> Result<RawFinancials> {
        let mut raw = RawFinancials::from_value(&Value::Object(self.fields.clone()))?;
        raw.source_file.clone_from(&self.source_file);
        Ok(raw)
    }

    /// The mapping with `source_file` set, as returned to callers
    pub fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(
            "source_file".to_string(),
            Value::String(self.source_file.clone()),
        );
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_complete_record() {
        let raw = RawFinancials::from_value(&json!({
            "company": "Acme Ltd",
            "net_worth": 1000,
            "liabilities": 400.5,
            "equity": 600,
            "profit_and_loss": {
                "total_revenue": 2000,
                "total_expenses": 1700,
                "net_profit_or_loss": 300
            },
            "source_file": "reports/acme.pdf"
        }))
        .unwrap();

        assert_eq!(raw.company, "Acme Ltd");
        assert!((raw.liabilities - 400.5).abs() < f64::EPSILON);
        assert!((raw.profit_and_loss.net_profit_or_loss - 300.0).abs() < f64::EPSILON);
        assert_eq!(raw.source_file, "reports/acme.pdf");
    }

    #[test]
    fn test_absent_and_null_read_as_zero() {
        let raw = RawFinancials::from_value(&json!({
            "net_worth": null,
            "profit_and_loss": { "total_revenue": null }
        }))
        .unwrap();

        assert_eq!(raw.company, UNKNOWN_COMPANY);
        assert_eq!(raw, RawFinancials::default());

        let raw = RawFinancials::from_value(&json!({ "profit_and_loss": null })).unwrap();
        assert_eq!(raw.profit_and_loss, ProfitAndLoss::default());
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let raw = RawFinancials::from_value(&json!({
            "company": "Acme",
            "liabilities": " 1,250,000 ",
            "equity": "-35.5",
            "profit_and_loss": { "total_revenue": "2_000" }
        }))
        .unwrap();

        assert!((raw.liabilities - 1_250_000.0).abs() < f64::EPSILON);
        assert!((raw.equity + 35.5).abs() < f64::EPSILON);
        assert!((raw.profit_and_loss.total_revenue - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_type_mismatch_names_field_and_company() {
        let err = RawFinancials::from_value(&json!({
            "company": "Acme",
            "profit_and_loss": { "total_revenue": true }
        }))
        .unwrap_err();

        match err {
            ReportError::Computation {
                company,
                field,
                message,
            } => {
                assert_eq!(company, "Acme");
                assert_eq!(field, "profit_and_loss.total_revenue");
                assert!(message.contains("boolean"));
            }
            other => panic!("Expected Computation, got {other:?}"),
        }
    }

    #[test]
    fn test_rejected_shapes() {
        let non_numeric = RawFinancials::from_value(&json!({ "equity": "about 5 million" }));
        assert!(matches!(
            non_numeric,
            Err(ReportError::Computation { ref field, .. }) if field == "equity"
        ));

        let non_finite = RawFinancials::from_value(&json!({ "equity": "inf" }));
        assert!(non_finite.is_err());

        let array = RawFinancials::from_value(&json!({ "net_worth": [1, 2] }));
        assert!(array.is_err());

        let bad_pl = RawFinancials::from_value(&json!({ "profit_and_loss": 12 }));
        assert!(matches!(
            bad_pl,
            Err(ReportError::Computation { ref field, .. }) if field == "profit_and_loss"
        ));

        let not_object = RawFinancials::from_value(&json!([1, 2, 3]));
        assert!(not_object.is_err());
    }

    #[test]
    fn test_non_string_company_defaults() {
        let raw = RawFinancials::from_value(&json!({ "company": 42 })).unwrap();
        assert_eq!(raw.company, UNKNOWN_COMPANY);
    }

    #[test]
    fn test_extracted_financials_roundtrip() {
        let fields = json!({
            "company": "Acme",
            "equity": 10,
            "source_file": "model-invented.pdf",
            "currency": "EUR"
        });
        let Value::Object(fields) = fields else {
            unreachable!()
        };

        let extracted = ExtractedFinancials::new("upload.pdf", fields);
        assert_eq!(extracted.company(), "Acme");

        let value = extracted.to_value();
        assert_eq!(value["source_file"], "upload.pdf");
        assert_eq!(value["currency"], "EUR");

        let serialized = serde_json::to_value(&extracted).unwrap();
        assert_eq!(serialized, value);

        let raw = extracted.decode().unwrap();
        assert_eq!(raw.source_file, "upload.pdf");
        assert!((raw.equity - 10.0).abs() < f64::EPSILON);
    }
}
