// ─────────────────────────────────────────────────────────────────────
// MillGuard — Milling Kinematics
// ─────────────────────────────────────────────────────────────────────
//! Spindle speed, table feed and removal rate from cutting speed and
//! feed per tooth:
//!
//!   n  = 1000 · Vc / (π · D)        [rpm]
//!   vf = n · z · fz                 [mm/min]
//!   Q  = ap · ae · vf / 1000        [cm³/min]
//!
//! Tool geometry is optional; missing geometry falls back to a 10 mm,
//! four-flute cutter at half-diameter engagement and the assumption is
//! reported as an output warning.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::{MAX_CUTTING_SPEED, MAX_DEPTH_OF_CUT, MAX_FEED, MAX_TEETH, MAX_TOOL_DIAMETER};

pub const DEFAULT_TOOL_DIAMETER_MM: f64 = 10.0;
pub const DEFAULT_TEETH: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MillingInput {
    /// Cutting speed (m/min).
    #[serde(rename = "Vc")]
    pub cutting_speed: f64,
    /// Feed per tooth (mm).
    #[serde(rename = "fz")]
    pub feed_per_tooth: f64,
    /// Axial depth of cut (mm).
    #[serde(rename = "ap")]
    pub depth_of_cut: f64,
    /// Radial width of cut (mm).
    #[serde(rename = "ae", default)]
    pub width_of_cut: Option<f64>,
    /// Tool diameter (mm).
    #[serde(rename = "D", default)]
    pub tool_diameter: Option<f64>,
    /// Number of teeth. Whole number; `4` and `4.0` both decode.
    #[serde(rename = "z", default)]
    pub teeth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MillingOutput {
    pub cutting_speed: f64,
    pub feed_per_tooth: f64,
    pub depth_of_cut: f64,
    pub width_of_cut: f64,
    pub spindle_speed: f64,
    pub feed_rate: f64,
    pub material_removal_rate: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for MillingOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct MillingParameters {
    meta: AlgorithmMeta,
}

impl Default for MillingParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl MillingParameters {
    pub const ID: &'static str = "milling_parameters";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Milling kinematics".to_string(),
                description: "Spindle speed, feed rate and removal rate from Vc and fz".to_string(),
                formula: "n = 1000*Vc/(pi*D); vf = n*z*fz; Q = ap*ae*vf/1000".to_string(),
                reference: "ISO 3002-1; Sandvik Coromant, Metal Cutting Technology (2010)"
                    .to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Standard,
                domain: Domain::Kinematics,
                inputs: vec![
                    FieldSpec::required("Vc", "m/min"),
                    FieldSpec::required("fz", "mm"),
                    FieldSpec::required("ap", "mm"),
                    FieldSpec::optional("ae", "mm"),
                    FieldSpec::optional("D", "mm"),
                    FieldSpec::optional("z", "-"),
                ],
                outputs: vec![
                    FieldSpec::required("cutting_speed", "m/min"),
                    FieldSpec::required("feed_per_tooth", "mm"),
                    FieldSpec::required("depth_of_cut", "mm"),
                    FieldSpec::required("width_of_cut", "mm"),
                    FieldSpec::required("spindle_speed", "rpm"),
                    FieldSpec::required("feed_rate", "mm/min"),
                    FieldSpec::required("material_removal_rate", "cm³/min"),
                ],
            },
        }
    }
}

impl Algorithm for MillingParameters {
    type Input = MillingInput;
    type Output = MillingOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &MillingInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        if c.positive("Vc", input.cutting_speed, MAX_CUTTING_SPEED) {
            c.typical("Vc", input.cutting_speed, 10.0, 1800.0);
        }
        if c.positive("fz", input.feed_per_tooth, MAX_FEED) {
            c.typical("fz", input.feed_per_tooth, 0.01, 1.0);
        }
        if c.positive("ap", input.depth_of_cut, MAX_DEPTH_OF_CUT) {
            c.typical("ap", input.depth_of_cut, 0.05, 50.0);
        }

        let diameter = match input.tool_diameter {
            Some(d) => c.positive("D", d, MAX_TOOL_DIAMETER).then_some(d),
            None => Some(DEFAULT_TOOL_DIAMETER_MM),
        };
        if let Some(z) = input.teeth {
            c.count("z", z, MAX_TEETH);
        }
        if let Some(ae) = input.width_of_cut {
            if c.positive("ae", ae, MAX_TOOL_DIAMETER) {
                if let Some(d) = diameter {
                    if ae > d {
                        c.error("ae", format!("width of cut {ae} mm exceeds tool diameter {d} mm"));
                    }
                }
            }
        }

        c.finish()
    }

    fn calculate(&self, input: &MillingInput) -> MillingOutput {
        let mut warnings = Vec::new();

        let diameter = input.tool_diameter.unwrap_or_else(|| {
            warnings.push(format!(
                "tool diameter not supplied; assumed {DEFAULT_TOOL_DIAMETER_MM} mm"
            ));
            DEFAULT_TOOL_DIAMETER_MM
        });
        let teeth = input.teeth.unwrap_or_else(|| {
            warnings.push(format!("tooth count not supplied; assumed {DEFAULT_TEETH}"));
            DEFAULT_TEETH
        });
        let width = input.width_of_cut.unwrap_or_else(|| {
            warnings.push("width of cut not supplied; assumed half the tool diameter".to_string());
            0.5 * diameter
        });

        let spindle_speed = 1000.0 * input.cutting_speed / (PI * diameter);
        let feed_rate = spindle_speed * teeth * input.feed_per_tooth;
        let material_removal_rate = input.depth_of_cut * width * feed_rate / 1000.0;

        MillingOutput {
            cutting_speed: input.cutting_speed,
            feed_per_tooth: input.feed_per_tooth,
            depth_of_cut: input.depth_of_cut,
            width_of_cut: width,
            spindle_speed,
            feed_rate,
            material_removal_rate,
            warnings,
        }
    }
}
