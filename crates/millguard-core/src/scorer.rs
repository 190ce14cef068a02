// ─────────────────────────────────────────────────────────────────────
// MillGuard — Composite Safety Scorer
// ─────────────────────────────────────────────────────────────────────
//! Composite safety score S(x) over up to four named components:
//!
//! - **prior_safety**: the caller's own safety sub-score (required).
//! - **range_compliance**: share of inputs inside their typical band.
//! - **cross_model_agreement**: agreement with an independent model.
//! - **data_completeness**: completeness of the upstream records.
//!
//! `S = min(Σ wᵢ·cᵢ / Σ wᵢ, min over required cᵢ)` where the sums run
//! over the components present in this call. A missing required
//! component, or any component outside [0, 1], makes S undefined.
//! Undefined is never replaced by a number.

use std::collections::BTreeMap;

use millguard_types::score::{clamp_score, is_unit_score};
use millguard_types::{
    MillGuardConfig, SafetyScore, ScoreComponent, ScoreValue, ScoreWeights, ValidationResult,
};

/// Components that must be present for S(x) to exist.
pub const REQUIRED_COMPONENTS: [ScoreComponent; 1] = [ScoreComponent::PriorSafety];

/// Raw component values for one calculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringInputs {
    pub prior_safety: Option<f64>,
    pub range_compliance: Option<f64>,
    pub cross_model_agreement: Option<f64>,
    pub data_completeness: Option<f64>,
}

impl ScoringInputs {
    pub fn get(&self, component: ScoreComponent) -> Option<f64> {
        match component {
            ScoreComponent::PriorSafety => self.prior_safety,
            ScoreComponent::RangeCompliance => self.range_compliance,
            ScoreComponent::CrossModelAgreement => self.cross_model_agreement,
            ScoreComponent::DataCompleteness => self.data_completeness,
        }
    }
}

/// Stateless scorer. Every call computes S(x) from scratch.
#[derive(Debug, Clone)]
pub struct SafetyScorer {
    weights: ScoreWeights,
    threshold: f64,
}

impl SafetyScorer {
    pub fn new(weights: ScoreWeights, threshold: f64) -> Self {
        Self { weights, threshold }
    }

    pub fn from_config(config: &MillGuardConfig) -> Self {
        Self::new(config.weights.clone(), config.safety_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn weight(&self, component: ScoreComponent) -> f64 {
        match component {
            ScoreComponent::PriorSafety => self.weights.prior_safety,
            ScoreComponent::RangeCompliance => self.weights.range_compliance,
            ScoreComponent::CrossModelAgreement => self.weights.cross_model_agreement,
            ScoreComponent::DataCompleteness => self.weights.data_completeness,
        }
    }

    /// `1 − warnings / declared_inputs`, clamped to [0, 1].
    ///
    /// A model without declared inputs is fully compliant.
    pub fn range_compliance(validation: &ValidationResult, declared_inputs: usize) -> f64 {
        if declared_inputs == 0 {
            return 1.0;
        }
        let share = validation.warning_count() as f64 / declared_inputs as f64;
        clamp_score(1.0 - share, 0.0, 1.0)
    }

    /// Compute S(x).
    pub fn score(&self, inputs: &ScoringInputs) -> SafetyScore {
        let mut components = BTreeMap::new();
        let mut malformed = Vec::new();

        for component in ScoreComponent::ALL {
            if let Some(value) = inputs.get(component) {
                if is_unit_score(value) {
                    components.insert(component.as_str().to_string(), value);
                } else {
                    malformed.push(format!("{component}={value}"));
                }
            }
        }

        let score = self.combine(inputs, &components, &malformed);
        if let ScoreValue::Undefined { reason } = &score {
            log::warn!("safety score undefined: {reason}");
        }

        SafetyScore {
            score,
            components,
            threshold: self.threshold,
        }
    }

    fn combine(
        &self,
        inputs: &ScoringInputs,
        components: &BTreeMap<String, f64>,
        malformed: &[String],
    ) -> ScoreValue {
        if !malformed.is_empty() {
            return ScoreValue::Undefined {
                reason: format!("malformed score components: {}", malformed.join(", ")),
            };
        }

        let mut cap = 1.0_f64;
        for component in REQUIRED_COMPONENTS {
            match inputs.get(component) {
                Some(value) => cap = cap.min(value),
                None => {
                    return ScoreValue::Undefined {
                        reason: format!("required component {component} is absent"),
                    }
                }
            }
        }

        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for component in ScoreComponent::ALL {
            let w = self.weight(component);
            if let Some(value) = components.get(component.as_str()) {
                if w.is_finite() && w > 0.0 {
                    weighted += w * value;
                    weight_sum += w;
                }
            }
        }
        if weight_sum <= 0.0 {
            return ScoreValue::Undefined {
                reason: "no weighted component is present".to_string(),
            };
        }

        let mean = weighted / weight_sum;
        let value = clamp_score(mean.min(cap), 0.0, 1.0);
        log::debug!("safety score: mean={mean:.4} cap={cap:.4} S={value:.4}");
        ScoreValue::Defined { value }
    }
}
