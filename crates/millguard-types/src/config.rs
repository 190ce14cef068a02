// ─────────────────────────────────────────────────────────────────────
// MillGuard — Safety Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{MillGuardError, MillGuardResult};

/// Runtime configuration for the MillGuard kernel.
///
/// Built once at process start and handed to the pipeline; nothing in
/// the kernel mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MillGuardConfig {
    /// Hard floor of the composite safety score S(x).
    /// Results scoring below this (or without a score) are blocked.
    /// Default: 0.70.
    pub safety_threshold: f64,

    /// Weights of the safety-score components.
    pub weights: ScoreWeights,

    /// Physical ceilings enforced on every outgoing result.
    pub limits: OutputLimits,
}

impl Default for MillGuardConfig {
    fn default() -> Self {
        Self {
            safety_threshold: 0.70,
            weights: ScoreWeights::default(),
            limits: OutputLimits::default(),
        }
    }
}

/// Weights of the four safety-score components.
///
/// Only components that are present in a given call contribute; the
/// weighted mean is normalised by the sum of the present weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Caller-supplied safety sub-score. Default: 0.40.
    pub prior_safety: f64,
    /// Typical-range compliance of the validated input. Default: 0.30.
    pub range_compliance: f64,
    /// Agreement with an independent model. Default: 0.20.
    pub cross_model_agreement: f64,
    /// Completeness of the upstream data records. Default: 0.10.
    pub data_completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            prior_safety: 0.40,
            range_compliance: 0.30,
            cross_model_agreement: 0.20,
            data_completeness: 0.10,
        }
    }
}

impl ScoreWeights {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("prior_safety", self.prior_safety),
            ("range_compliance", self.range_compliance),
            ("cross_model_agreement", self.cross_model_agreement),
            ("data_completeness", self.data_completeness),
        ]
    }
}

/// Ceilings for the output fields named by the output schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLimits {
    /// m/min. Default: 2000.
    pub max_cutting_speed: f64,
    /// mm. Default: 10.
    pub max_feed_per_tooth: f64,
    /// mm. Default: 100.
    pub max_depth_of_cut: f64,
    /// N. Default: 100 000.
    pub max_force: f64,
    /// rpm. Default: 100 000.
    pub max_spindle_speed: f64,
    /// min. Default: 10 000.
    pub max_tool_life: f64,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_cutting_speed: 2000.0,
            max_feed_per_tooth: 10.0,
            max_depth_of_cut: 100.0,
            max_force: 100_000.0,
            max_spindle_speed: 100_000.0,
            max_tool_life: 10_000.0,
        }
    }
}

impl OutputLimits {
    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("max_cutting_speed", self.max_cutting_speed),
            ("max_feed_per_tooth", self.max_feed_per_tooth),
            ("max_depth_of_cut", self.max_depth_of_cut),
            ("max_force", self.max_force),
            ("max_spindle_speed", self.max_spindle_speed),
            ("max_tool_life", self.max_tool_life),
        ]
    }
}

impl MillGuardConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> MillGuardResult<()> {
        if !(0.0..=1.0).contains(&self.safety_threshold) {
            return Err(MillGuardError::Config(format!(
                "safety_threshold must be in [0, 1], got {}",
                self.safety_threshold
            )));
        }

        let mut weight_sum = 0.0;
        for (name, w) in self.weights.entries() {
            if !w.is_finite() || w < 0.0 {
                return Err(MillGuardError::Config(format!(
                    "weights.{name} must be finite and >= 0, got {w}"
                )));
            }
            weight_sum += w;
        }
        if weight_sum <= 0.0 {
            return Err(MillGuardError::Config(
                "at least one score weight must be > 0".to_string(),
            ));
        }
        if self.weights.prior_safety <= 0.0 {
            return Err(MillGuardError::Config(
                "weights.prior_safety must be > 0: the caller safety score is required".to_string(),
            ));
        }

        for (name, limit) in self.limits.entries() {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(MillGuardError::Config(format!(
                    "limits.{name} must be finite and > 0, got {limit}"
                )));
            }
        }
        Ok(())
    }

    /// Load from JSON string. Missing keys take their defaults.
    pub fn from_json(json: &str) -> MillGuardResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MillGuardError::Config(format!("JSON parse error: {e}")))
    }
}
