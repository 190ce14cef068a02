// ─────────────────────────────────────────────────────────────────────
// MillGuard — Requests, Reports and Outcomes
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use millguard_types::{QualitySignals, ValidationResult};

/// One calculation request.
///
/// The model parameters sit at the top level next to the optional
/// safety signals; everything that is not a known signal is taken as a
/// model parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The caller's safety sub-score. Without it S(x) is undefined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_completeness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_model_agreement: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
    /// Label for logs and the report. Defaults to the algorithm id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl CalculationRequest {
    pub fn new(params: Map<String, Value>) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_safety_score(mut self, score: f64) -> Self {
        self.safety_score = Some(score);
        self
    }

    pub fn with_data_completeness(mut self, completeness: f64) -> Self {
        self.data_completeness = Some(completeness);
        self
    }

    pub fn with_cross_model_agreement(mut self, agreement: f64) -> Self {
        self.cross_model_agreement = Some(agreement);
        self
    }

    pub fn with_material(mut self, material_id: &str) -> Self {
        self.material_id = Some(material_id.to_string());
        self
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    /// The caller-side signals, as seen by pre-calculation hooks.
    pub fn quality_signals(&self) -> QualitySignals {
        QualitySignals {
            safety: self.safety_score,
            completeness: self.data_completeness,
            agreement: self.cross_model_agreement,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub model: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// A result that passed every gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationReport {
    pub results: Map<String, Value>,
    pub safety_score: f64,
    pub material_id: Option<String>,
    pub operation: String,
    pub meta: ReportMeta,
    pub warnings: Vec<String>,
}

impl CalculationReport {
    /// Numeric result by field name.
    pub fn result(&self, field: &str) -> Option<f64> {
        self.results.get(field).and_then(Value::as_f64)
    }
}

/// Where in the pipeline a calculation was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStage {
    PreCalculation,
    Calculation,
    Scoring,
    PreOutput,
    OutputSchema,
}

impl fmt::Display for BlockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockStage::PreCalculation => "pre_calculation",
            BlockStage::Calculation => "calculation",
            BlockStage::Scoring => "scoring",
            BlockStage::PreOutput => "pre_output",
            BlockStage::OutputSchema => "output_schema",
        };
        f.write_str(s)
    }
}

/// A refused calculation. Carries no result values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedResult {
    pub blocked: bool,
    pub blocked_by: String,
    pub reason: String,
    pub stage: BlockStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
}

impl BlockedResult {
    pub fn new(
        stage: BlockStage,
        blocked_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            blocked: true,
            blocked_by: blocked_by.into(),
            reason: reason.into(),
            stage,
            safety_score: None,
        }
    }

    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.safety_score = score.filter(|s| s.is_finite());
        self
    }
}

/// Every way a pipeline run can end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(CalculationReport),
    Invalid(ValidationResult),
    Blocked(BlockedResult),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, RunOutcome::Blocked(_))
    }

    pub fn report(&self) -> Option<&CalculationReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn blocked(&self) -> Option<&BlockedResult> {
        match self {
            RunOutcome::Blocked(blocked) => Some(blocked),
            _ => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            RunOutcome::Invalid(validation) => Some(validation),
            _ => None,
        }
    }
}
