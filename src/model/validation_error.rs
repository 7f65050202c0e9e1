//! Violations raised by rules and the sink that accumulates them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Structural failure; blocks the per-record pass
    #[serde(rename = "F")]
    Fail,
    /// Standard rule violation
    #[serde(rename = "E")]
    Error,
    /// Advisory only
    #[serde(rename = "W")]
    Warning,
}

impl Severity {
    /// Parse severity from its short code or full name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "f" | "fail" => Some(Self::Fail),
            "e" | "error" => Some(Self::Error),
            "w" | "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fail => "Fail",
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name/value pair describing the data that triggered a violation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorMessageParameter {
    pub property_name: String,
    pub value: String,
}

impl ErrorMessageParameter {
    pub fn new(property_name: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            property_name: property_name.into(),
            value: value.to_string(),
        }
    }
}

/// One violation produced by one rule for one record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationError {
    pub learner_reference_number: Option<String>,
    pub aim_sequence_number: Option<i64>,
    pub rule_name: String,
    pub severity: Severity,
    #[serde(default)]
    pub error_message_parameters: Vec<ErrorMessageParameter>,
}

impl ValidationError {
    pub fn is_fail(&self) -> bool {
        self.severity == Severity::Fail
    }
}

/// Append-only sink rules report violations through
pub trait ValidationErrorHandler: Send + Sync {
    fn handle(&self, error: ValidationError);
}

/// Thread-safe accumulation of violations
///
/// Used as the per-worker sink and as the central cache the coordinator
/// merges worker results into. Entries are never deduplicated.
#[derive(Debug, Default)]
pub struct ValidationErrorCache {
    errors: Mutex<Vec<ValidationError>>,
}

impl ValidationErrorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            errors: Mutex::new(errors),
        }
    }

    pub fn extend(&self, errors: impl IntoIterator<Item = ValidationError>) {
        self.lock().extend(errors);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True if any accumulated violation has `Fail` severity
    pub fn has_fail(&self) -> bool {
        self.lock().iter().any(ValidationError::is_fail)
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ValidationError>> {
        // A poisoned lock only means a rule panicked mid-push; the vector is intact.
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ValidationErrorHandler for ValidationErrorCache {
    fn handle(&self, error: ValidationError) {
        self.lock().push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(rule: &str, severity: Severity) -> ValidationError {
        ValidationError {
            learner_reference_number: Some("L001".to_string()),
            aim_sequence_number: None,
            rule_name: rule.to_string(),
            severity,
            error_message_parameters: vec![],
        }
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("F"), Some(Severity::Fail));
        assert_eq!(Severity::parse(" error "), Some(Severity::Error));
        assert_eq!(Severity::parse("w"), Some(Severity::Warning));
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn test_severity_serializes_as_short_code() {
        assert_eq!(serde_json::to_string(&Severity::Fail).unwrap(), "\"F\"");
        assert_eq!(
            serde_json::from_str::<Severity>("\"E\"").unwrap(),
            Severity::Error
        );
    }

    #[test]
    fn test_cache_keeps_duplicates() {
        let cache = ValidationErrorCache::new();
        cache.handle(error("ULN_02", Severity::Error));
        cache.handle(error("ULN_02", Severity::Error));
        assert_eq!(cache.len(), 2);
        assert!(!cache.has_fail());
    }

    #[test]
    fn test_cache_detects_fail() {
        let cache = ValidationErrorCache::new();
        cache.extend(vec![
            error("Ethnicity_01", Severity::Error),
            error("UKPRN_03", Severity::Fail),
        ]);
        assert!(cache.has_fail());
        assert_eq!(cache.into_errors().len(), 2);
    }

    #[test]
    fn test_parameter_formats_value() {
        let p = ErrorMessageParameter::new("FundModel", 35);
        assert_eq!(p.value, "35");
    }
}
