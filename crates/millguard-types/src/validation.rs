// ─────────────────────────────────────────────────────────────────────
// MillGuard — Input Validation Types
// ─────────────────────────────────────────────────────────────────────
//! Structured validation results. Validation never fails by panicking
//! or returning an error: every problem becomes a `ValidationIssue`.

use serde::{Deserialize, Serialize};

/// How serious a validation issue is.
///
/// `Error` blocks calculation; `Warning` marks a value that is atypical
/// but physically possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One reason an input is unacceptable or suspicious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of `Algorithm::validate()`.
///
/// `valid` is derived from the issues and cannot be set independently:
/// it is false iff at least one issue has `Severity::Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IssueList")]
pub struct ValidationResult {
    valid: bool,
    issues: Vec<ValidationIssue>,
}

/// Wire form of a `ValidationResult`; a serialised `valid` is ignored.
#[derive(Deserialize)]
struct IssueList {
    #[serde(default)]
    issues: Vec<ValidationIssue>,
}

impl From<IssueList> for ValidationResult {
    fn from(list: IssueList) -> Self {
        Self::from_issues(list.issues)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    /// A result with no issues.
    pub fn ok() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let valid = !issues.iter().any(ValidationIssue::is_error);
        Self { valid, issues }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Append the issues of `other`, recomputing validity.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.issues.extend(other.issues);
        Self::from_issues(self.issues)
    }

    /// One-line human-readable summary of the error issues.
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(|i| format!("{}: {}", i.field, i.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Accumulates issues while a model walks its input fields.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::error(field, message));
    }

    pub fn warning(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::warning(field, message));
    }

    /// Require `0 < value <= max`. Returns true when the value passed.
    pub fn positive(&mut self, field: &str, value: f64, max: f64) -> bool {
        if !value.is_finite() {
            self.error(field, format!("must be a finite number, got {value}"));
            false
        } else if value <= 0.0 {
            self.error(field, format!("must be > 0, got {value}"));
            false
        } else if value > max {
            self.error(field, format!("must be <= {max}, got {value}"));
            false
        } else {
            true
        }
    }

    /// Require `lo <= value <= hi`. Returns true when the value passed.
    pub fn within(&mut self, field: &str, value: f64, lo: f64, hi: f64) -> bool {
        if !value.is_finite() {
            self.error(field, format!("must be a finite number, got {value}"));
            false
        } else if value < lo || value > hi {
            self.error(field, format!("must be in [{lo}, {hi}], got {value}"));
            false
        } else {
            true
        }
    }

    /// Require `lo < value < hi`. Returns true when the value passed.
    pub fn within_open(&mut self, field: &str, value: f64, lo: f64, hi: f64) -> bool {
        if !value.is_finite() {
            self.error(field, format!("must be a finite number, got {value}"));
            false
        } else if value <= lo || value >= hi {
            self.error(field, format!("must be in ({lo}, {hi}), got {value}"));
            false
        } else {
            true
        }
    }

    /// Require a whole number in `1..=max`, e.g. a tooth count.
    /// Returns true when the value passed.
    pub fn count(&mut self, field: &str, value: f64, max: f64) -> bool {
        if !self.within(field, value, 1.0, max) {
            false
        } else if value.fract() != 0.0 {
            self.error(field, format!("must be a whole number, got {value}"));
            false
        } else {
            true
        }
    }

    /// Warn when a finite value lies outside its typical band.
    pub fn typical(&mut self, field: &str, value: f64, lo: f64, hi: f64) {
        if value.is_finite() && (value < lo || value > hi) {
            self.warning(
                field,
                format!("{value} is outside the typical range [{lo}, {hi}]"),
            );
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult::from_issues(self.issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_valid() {
        let result = IssueCollector::new().finish();
        assert!(result.is_valid());
        assert!(result.issues().is_empty());
    }

    #[test]
    fn test_warning_keeps_valid() {
        let mut c = IssueCollector::new();
        c.typical("Vc", 1900.0, 20.0, 1200.0);
        let result = c.finish();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_error_makes_invalid() {
        let mut c = IssueCollector::new();
        assert!(!c.positive("fz", 0.0, 10.0));
        let result = c.finish();
        assert!(!result.is_valid());
        assert_eq!(result.errors().count(), 1);
        assert!(result.error_summary().starts_with("fz:"));
    }

    #[test]
    fn test_positive_rejects_nan_and_ceiling() {
        let mut c = IssueCollector::new();
        assert!(!c.positive("Vc", f64::NAN, 2000.0));
        assert!(!c.positive("Vc", 2000.1, 2000.0));
        assert!(c.positive("Vc", 2000.0, 2000.0));
        assert_eq!(c.finish().errors().count(), 2);
    }

    #[test]
    fn test_within_open_bounds() {
        let mut c = IssueCollector::new();
        assert!(!c.within_open("gamma", 90.0, -90.0, 90.0));
        assert!(c.within_open("gamma", 89.9, -90.0, 90.0));
        assert!(!c.finish().is_valid());
    }

    #[test]
    fn test_count_requires_whole_number() {
        let mut c = IssueCollector::new();
        assert!(c.count("z", 4.0, 100.0));
        assert!(!c.count("z", 2.5, 100.0));
        assert!(!c.count("z", 0.0, 100.0));
        assert!(!c.count("z", f64::NAN, 100.0));
        let result = c.finish();
        assert_eq!(result.errors().count(), 3);
        assert!(result.issues()[0].message.contains("whole number"));
    }

    #[test]
    fn test_typical_ignores_non_finite() {
        let mut c = IssueCollector::new();
        c.typical("x", f64::INFINITY, 0.0, 1.0);
        assert!(c.finish().issues().is_empty());
    }

    #[test]
    fn test_merge_recomputes_validity() {
        let ok = ValidationResult::from_issues(vec![ValidationIssue::warning("a", "w")]);
        let bad = ValidationResult::from_issues(vec![ValidationIssue::error("b", "e")]);
        let merged = ok.merge(bad);
        assert!(!merged.is_valid());
        assert_eq!(merged.issues().len(), 2);
    }

    #[test]
    fn test_serialized_severity_lowercase() {
        let issue = ValidationIssue::warning("ap", "deep");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"warning\""));
    }

    #[test]
    fn test_deserialize_recomputes_validity() {
        let json = r#"{"valid": true,
            "issues": [{"field": "Vc", "message": "neg", "severity": "error"}]}"#;
        let result: ValidationResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors().count(), 1);

        let result: ValidationResult =
            serde_json::from_str(r#"{"valid": false, "issues": []}"#).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_serialized_result_round_trips() {
        let result = ValidationResult::from_issues(vec![ValidationIssue::warning("ap", "deep")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], true);
        let back: ValidationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
