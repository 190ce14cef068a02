// ─────────────────────────────────────────────────────────────────────
// MillGuard — Theoretical Surface Roughness
// ─────────────────────────────────────────────────────────────────────
//! Kinematic roughness left by a tool with corner radius r:
//!
//!   Ra ≈ f² / (32 r)    Rz ≈ f² / (8 r)
//!
//! Valid while the feed stays below twice the corner radius.

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::MAX_FEED;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoughnessInput {
    /// Feed per revolution (mm).
    pub f: f64,
    /// Tool corner radius (mm).
    pub r_epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoughnessOutput {
    pub arithmetic_roughness: f64,
    pub peak_to_valley_roughness: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for RoughnessOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct SurfaceRoughness {
    meta: AlgorithmMeta,
}

impl Default for SurfaceRoughness {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceRoughness {
    pub const ID: &'static str = "surface_roughness";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Theoretical surface roughness".to_string(),
                description: "Kinematic Ra and Rz from feed and corner radius".to_string(),
                formula: "Ra = f^2/(32 r); Rz = f^2/(8 r)".to_string(),
                reference: "Shaw, M. C. (2005) Metal Cutting Principles, 2nd ed.".to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Informational,
                domain: Domain::Surface,
                inputs: vec![
                    FieldSpec::required("f", "mm"),
                    FieldSpec::required("r_epsilon", "mm"),
                ],
                outputs: vec![
                    FieldSpec::required("arithmetic_roughness", "µm"),
                    FieldSpec::required("peak_to_valley_roughness", "µm"),
                ],
            },
        }
    }
}

impl Algorithm for SurfaceRoughness {
    type Input = RoughnessInput;
    type Output = RoughnessOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &RoughnessInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        let feed_ok = c.positive("f", input.f, MAX_FEED);
        let radius_ok = c.positive("r_epsilon", input.r_epsilon, 25.0);
        if radius_ok {
            c.typical("r_epsilon", input.r_epsilon, 0.1, 3.2);
        }
        if feed_ok && radius_ok {
            if input.f >= 2.0 * input.r_epsilon {
                c.error("f", "feed must be smaller than twice the corner radius");
            } else if input.f > input.r_epsilon {
                c.warning("f", "feed exceeds the corner radius; roughness is underestimated");
            }
        }

        c.finish()
    }

    fn calculate(&self, input: &RoughnessInput) -> RoughnessOutput {
        let f2 = input.f * input.f;
        RoughnessOutput {
            arithmetic_roughness: f2 / (32.0 * input.r_epsilon) * 1000.0,
            peak_to_valley_roughness: f2 / (8.0 * input.r_epsilon) * 1000.0,
            warnings: Vec::new(),
        }
    }
}
