// ─────────────────────────────────────────────────────────────────────
// MillGuard — Taylor Tool Life
// ─────────────────────────────────────────────────────────────────────
//! Extended Taylor tool-life equation:
//!
//!   Vc · T^n · f^a · ap^b = C
//!   T = (C / (Vc · f^a · ap^b))^(1/n)
//!
//! With no feed/depth terms this is the classic `Vc · T^n = C`.

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::{
    COEFFICIENT_TAYLOR_C, COEFFICIENT_TAYLOR_N, MAX_CUTTING_SPEED, MAX_DEPTH_OF_CUT, MAX_FEED,
};

pub const DEFAULT_REFERENCE_LIFE_MIN: f64 = 15.0;
const MAX_TOOL_LIFE_MIN: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaylorInput {
    /// Cutting speed (m/min).
    #[serde(rename = "Vc")]
    pub cutting_speed: f64,
    /// Taylor constant (m/min).
    #[serde(rename = "C")]
    pub taylor_c: f64,
    /// Taylor exponent.
    #[serde(rename = "n")]
    pub taylor_n: f64,
    /// Feed (mm), paired with exponent `a`.
    #[serde(default)]
    pub f: Option<f64>,
    #[serde(default)]
    pub a: Option<f64>,
    /// Depth of cut (mm), paired with exponent `b`.
    #[serde(default)]
    pub ap: Option<f64>,
    #[serde(default)]
    pub b: Option<f64>,
    /// Tool life the reference speed is computed for (min). Default 15.
    #[serde(rename = "T_ref", default)]
    pub reference_life: Option<f64>,
}

impl TaylorInput {
    /// f^a · ap^b; 1.0 when the extension terms are absent.
    fn extension_factor(&self) -> f64 {
        let feed = match (self.f, self.a) {
            (Some(f), Some(a)) => f.powf(a),
            _ => 1.0,
        };
        let depth = match (self.ap, self.b) {
            (Some(ap), Some(b)) => ap.powf(b),
            _ => 1.0,
        };
        feed * depth
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaylorOutput {
    pub tool_life: f64,
    pub reference_life: f64,
    pub speed_for_reference_life: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for TaylorOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct TaylorToolLife {
    meta: AlgorithmMeta,
}

impl Default for TaylorToolLife {
    fn default() -> Self {
        Self::new()
    }
}

impl TaylorToolLife {
    pub const ID: &'static str = "taylor_tool_life";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Taylor tool life".to_string(),
                description: "Tool life from cutting speed via the extended Taylor equation"
                    .to_string(),
                formula: "T = (C / (Vc * f^a * ap^b))^(1/n)".to_string(),
                reference: "Taylor, F. W. (1907) On the Art of Cutting Metals, ASME Trans. 28"
                    .to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Critical,
                domain: Domain::ToolLife,
                inputs: vec![
                    FieldSpec::required("Vc", "m/min"),
                    FieldSpec::required("C", "m/min").with_material(COEFFICIENT_TAYLOR_C),
                    FieldSpec::required("n", "-").with_material(COEFFICIENT_TAYLOR_N),
                    FieldSpec::optional("f", "mm"),
                    FieldSpec::optional("a", "-"),
                    FieldSpec::optional("ap", "mm"),
                    FieldSpec::optional("b", "-"),
                    FieldSpec::optional("T_ref", "min"),
                ],
                outputs: vec![
                    FieldSpec::required("tool_life", "min"),
                    FieldSpec::required("reference_life", "min"),
                    FieldSpec::required("speed_for_reference_life", "m/min"),
                ],
            },
        }
    }
}

impl Algorithm for TaylorToolLife {
    type Input = TaylorInput;
    type Output = TaylorOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &TaylorInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        c.positive("Vc", input.cutting_speed, MAX_CUTTING_SPEED);
        if c.positive("C", input.taylor_c, 10_000.0) {
            c.typical("C", input.taylor_c, 50.0, 3000.0);
        }
        if c.within_open("n", input.taylor_n, 0.0, 1.0) {
            c.typical("n", input.taylor_n, 0.1, 0.6);
        }

        match (input.f, input.a) {
            (Some(f), Some(a)) => {
                c.positive("f", f, MAX_FEED);
                c.within("a", a, 0.0, 2.0);
            }
            (None, None) => {}
            _ => c.error("a", "feed f and its exponent a must be given together"),
        }
        match (input.ap, input.b) {
            (Some(ap), Some(b)) => {
                c.positive("ap", ap, MAX_DEPTH_OF_CUT);
                c.within("b", b, 0.0, 2.0);
            }
            (None, None) => {}
            _ => c.error("b", "depth ap and its exponent b must be given together"),
        }
        if let Some(t_ref) = input.reference_life {
            c.positive("T_ref", t_ref, MAX_TOOL_LIFE_MIN);
        }

        if !c.has_errors() && input.cutting_speed * input.extension_factor() > input.taylor_c {
            c.warning(
                "Vc",
                "cutting speed exceeds the Taylor constant; predicted life is under one minute",
            );
        }

        c.finish()
    }

    fn calculate(&self, input: &TaylorInput) -> TaylorOutput {
        let mut warnings = Vec::new();
        let ext = input.extension_factor();
        let inv_n = 1.0 / input.taylor_n;

        let tool_life = (input.taylor_c / (input.cutting_speed * ext)).powf(inv_n);
        let reference_life = input.reference_life.unwrap_or(DEFAULT_REFERENCE_LIFE_MIN);
        let speed_for_reference_life = input.taylor_c / (reference_life.powf(input.taylor_n) * ext);

        if tool_life < 1.0 {
            warnings.push(format!(
                "predicted tool life {tool_life:.3} min is below one minute"
            ));
        }
        if tool_life > MAX_TOOL_LIFE_MIN {
            warnings.push(format!(
                "predicted tool life {tool_life:.0} min lies far outside the fitted range"
            ));
        }

        TaylorOutput {
            tool_life,
            reference_life,
            speed_for_reference_life,
            warnings,
        }
    }
}
