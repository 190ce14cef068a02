// ─────────────────────────────────────────────────────────────────────
// MillGuard — Safety Score Types
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// True for a finite value in [0, 1].
#[inline]
pub fn is_unit_score(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Named inputs of the composite safety score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    /// Safety sub-score supplied by the caller. Required by policy.
    PriorSafety,
    /// Share of validated inputs inside their typical band.
    RangeCompliance,
    /// Agreement with an independent model.
    CrossModelAgreement,
    /// Completeness of the upstream data records.
    DataCompleteness,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 4] = [
        ScoreComponent::PriorSafety,
        ScoreComponent::RangeCompliance,
        ScoreComponent::CrossModelAgreement,
        ScoreComponent::DataCompleteness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreComponent::PriorSafety => "prior_safety",
            ScoreComponent::RangeCompliance => "range_compliance",
            ScoreComponent::CrossModelAgreement => "cross_model_agreement",
            ScoreComponent::DataCompleteness => "data_completeness",
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The composite score, or an explicit statement that it does not exist.
///
/// There is no numeric stand-in for `Undefined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ScoreValue {
    Defined { value: f64 },
    Undefined { reason: String },
}

impl ScoreValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            ScoreValue::Defined { value } => Some(*value),
            ScoreValue::Undefined { .. } => None,
        }
    }
}

/// Safety score S(x) of one calculation. Never cached across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyScore {
    pub score: ScoreValue,
    pub components: BTreeMap<String, f64>,
    pub threshold: f64,
}

impl SafetyScore {
    pub fn value(&self) -> Option<f64> {
        self.score.value()
    }

    /// True only for a defined score at or above the threshold.
    pub fn passes(&self) -> bool {
        matches!(self.score, ScoreValue::Defined { value } if value >= self.threshold)
    }
}

/// Quality signals handed to hooks through the execution context.
///
/// Every field is optional; absence is meaningful and is never filled
/// with a default by the kernel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySignals {
    /// Composite safety score S(x) (pre-output) or the caller's prior
    /// safety score (pre-calculation).
    pub safety: Option<f64>,
    pub completeness: Option<f64>,
    pub agreement: Option<f64>,
    /// Individual score components by name.
    pub components: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_score(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_below_lo() {
        assert_eq!(clamp_score(-0.3, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_is_unit_score() {
        assert!(is_unit_score(0.0));
        assert!(is_unit_score(1.0));
        assert!(!is_unit_score(1.0001));
        assert!(!is_unit_score(f64::NAN));
    }

    #[test]
    fn test_undefined_never_passes() {
        let score = SafetyScore {
            score: ScoreValue::Undefined {
                reason: "missing prior_safety".into(),
            },
            components: BTreeMap::new(),
            threshold: 0.0,
        };
        assert!(!score.passes());
        assert_eq!(score.value(), None);
    }

    #[test]
    fn test_threshold_boundary() {
        let at = SafetyScore {
            score: ScoreValue::Defined { value: 0.70 },
            components: BTreeMap::new(),
            threshold: 0.70,
        };
        assert!(at.passes());
        let below = SafetyScore {
            score: ScoreValue::Defined { value: 0.699 },
            ..at
        };
        assert!(!below.passes());
    }

    #[test]
    fn test_score_value_serialises_explicit_state() {
        let json = serde_json::to_string(&ScoreValue::Undefined {
            reason: "x".into(),
        })
        .unwrap();
        assert!(json.contains("\"state\":\"undefined\""));
    }

    #[test]
    fn test_quality_signals_empty_object() {
        let q: QualitySignals = serde_json::from_str("{}").unwrap();
        assert_eq!(q, QualitySignals::default());
        assert!(q.safety.is_none());
    }

    #[test]
    fn test_component_names() {
        let names: Vec<&str> = ScoreComponent::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec!["prior_safety", "range_compliance", "cross_model_agreement", "data_completeness"]
        );
    }
}
