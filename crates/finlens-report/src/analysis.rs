//! Market analysis records
//!
//! The analysis boundary returns free-form JSON. It is stored as an open map
//! and only a handful of keys are read, through accessors that tolerate
//! missing or mistyped values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const GROUNDING_ENABLED: &str = "grounding_enabled";
const SEARCH_PERFORMED: &str = "search_performed";

/// Note attached when the analysis came from the ungrounded tier
pub const FALLBACK_NOTE: &str = "Analysis based on model knowledge, live search unavailable";

/// Note attached to the failure record when both tiers failed
pub const FAILURE_NOTE: &str = "Falling back to basic benchmarking";

/// Narrative analysis for one company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisRecord(Map<String, Value>);

impl AnalysisRecord {
    /// Wrap a JSON value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Record produced when every analysis tier failed
    pub fn failure(company: impl Into<String>, message: impl std::fmt::Display) -> Self {
        let mut map = Map::new();
        map.insert("company".to_string(), Value::String(company.into()));
        map.insert(
            "error".to_string(),
            Value::String(format!("AI analysis failed: {message}")),
        );
        map.insert(GROUNDING_ENABLED.to_string(), Value::Bool(false));
        map.insert(SEARCH_PERFORMED.to_string(), Value::Bool(false));
        map.insert("note".to_string(), Value::String(FAILURE_NOTE.to_string()));
        Self(map)
    }

    /// Stamp which tier produced the record
    pub(crate) fn annotate(&mut self, grounded: bool) {
        self.0
            .insert(GROUNDING_ENABLED.to_string(), Value::Bool(grounded));
        self.0
            .insert(SEARCH_PERFORMED.to_string(), Value::Bool(grounded));
        if !grounded {
            self.0
                .insert("note".to_string(), Value::String(FALLBACK_NOTE.to_string()));
        }
    }

    /// Fill in the company when the model left it out
    pub(crate) fn ensure_company(&mut self, company: &str) {
        if self.company().is_none() {
            self.0
                .insert("company".to_string(), Value::String(company.to_string()));
        }
    }

    pub fn company(&self) -> Option<&str> {
        self.str_field("company")
    }

    /// Health score in 0..=100; numeric strings are accepted
    pub fn overall_health_score(&self) -> Option<f64> {
        let score = match self.0.get("overall_health_score")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        score.filter(|score| (0.0..=100.0).contains(score))
    }

    pub fn performance_grade(&self) -> Option<&str> {
        self.str_field("performance_grade")
    }

    pub fn investment_outlook(&self) -> Option<&str> {
        self.str_field("investment_outlook")
    }

    pub fn grounding_enabled(&self) -> bool {
        self.bool_field(GROUNDING_ENABLED)
    }

    pub fn search_performed(&self) -> bool {
        self.bool_field(SEARCH_PERFORMED)
    }

    pub fn note(&self) -> Option<&str> {
        self.str_field("note")
    }

    pub fn error(&self) -> Option<&str> {
        self.str_field("error")
    }

    /// Whether this is a failure record
    pub fn is_failure(&self) -> bool {
        self.0.contains_key("error")
    }

    /// Raw value of any key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    fn bool_field(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> AnalysisRecord {
        AnalysisRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_requires_object() {
        assert!(AnalysisRecord::from_value(json!([1, 2])).is_none());
        assert!(AnalysisRecord::from_value(json!("text")).is_none());
        assert!(AnalysisRecord::from_value(json!({})).is_some());
    }

    #[test]
    fn test_accessors() {
        let analysis = record(json!({
            "company": "Acme",
            "overall_health_score": 78,
            "performance_grade": "B+",
            "investment_outlook": "Positive",
            "key_strengths": ["margins"]
        }));

        assert_eq!(analysis.company(), Some("Acme"));
        assert_eq!(analysis.overall_health_score(), Some(78.0));
        assert_eq!(analysis.performance_grade(), Some("B+"));
        assert_eq!(analysis.investment_outlook(), Some("Positive"));
        assert!(!analysis.grounding_enabled());
        assert!(!analysis.is_failure());
        assert_eq!(analysis.get("key_strengths"), Some(&json!(["margins"])));
    }

    #[test]
    fn test_accessors_tolerate_bad_types() {
        let analysis = record(json!({
            "company": 7,
            "overall_health_score": "150",
            "performance_grade": null,
            "grounding_enabled": "yes"
        }));

        assert_eq!(analysis.company(), None);
        assert_eq!(analysis.overall_health_score(), None);
        assert_eq!(analysis.performance_grade(), None);
        assert!(!analysis.grounding_enabled());

        let analysis = record(json!({ "overall_health_score": " 64.5 " }));
        assert_eq!(analysis.overall_health_score(), Some(64.5));
    }

    #[test]
    fn test_annotate_grounded() {
        let mut analysis = record(json!({ "company": "Acme" }));
        analysis.annotate(true);
        assert!(analysis.grounding_enabled());
        assert!(analysis.search_performed());
        assert_eq!(analysis.note(), None);
    }

    #[test]
    fn test_annotate_fallback() {
        let mut analysis = record(json!({ "company": "Acme", "grounding_enabled": true }));
        analysis.annotate(false);
        assert!(!analysis.grounding_enabled());
        assert!(!analysis.search_performed());
        assert_eq!(analysis.note(), Some(FALLBACK_NOTE));
    }

    #[test]
    fn test_failure_record() {
        let failure = AnalysisRecord::failure("Acme", "quota exhausted");
        assert!(failure.is_failure());
        assert_eq!(failure.company(), Some("Acme"));
        assert_eq!(failure.error(), Some("AI analysis failed: quota exhausted"));
        assert!(!failure.grounding_enabled());
        assert!(!failure.search_performed());
        assert_eq!(failure.note(), Some(FAILURE_NOTE));
    }

    #[test]
    fn test_ensure_company() {
        let mut analysis = record(json!({}));
        analysis.ensure_company("Acme");
        assert_eq!(analysis.company(), Some("Acme"));

        let mut analysis = record(json!({ "company": "Model Name" }));
        analysis.ensure_company("Acme");
        assert_eq!(analysis.company(), Some("Model Name"));
    }

    #[test]
    fn test_transparent_serialization() {
        let analysis = record(json!({ "company": "Acme", "overall_health_score": 80 }));
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value, json!({ "company": "Acme", "overall_health_score": 80 }));
        assert_eq!(analysis.clone().into_value(), value);
        assert_eq!(analysis.as_map().len(), 2);
    }
}
