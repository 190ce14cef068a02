// ─────────────────────────────────────────────────────────────────────
// MillGuard — Regenerative Chatter Stability Limit
// ─────────────────────────────────────────────────────────────────────
//! Unconditionally stable depth of cut for a single-degree-of-freedom
//! tool/spindle system (Tlusty):
//!
//!   Re[G]min = −1 / (4 k ζ (1 + ζ))
//!   b_lim    = −1 / (2 Ks m Re[G]min) = 2 k ζ (1 + ζ) / (Ks m)
//!
//! with k in N/µm and Ks in N/mm² this gives b_lim in mm after a factor
//! of 1000. The first stability-lobe peak sits at n₀ = 60 fₙ / z.

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::{MAX_DEPTH_OF_CUT, MAX_TEETH};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StabilityInput {
    /// Modal stiffness at the tool tip (N/µm).
    #[serde(rename = "k")]
    pub stiffness: f64,
    /// Modal damping ratio.
    #[serde(rename = "zeta")]
    pub damping_ratio: f64,
    /// Natural frequency (Hz).
    #[serde(rename = "fn")]
    pub natural_frequency: f64,
    /// Specific cutting force coefficient (N/mm²).
    #[serde(rename = "Ks")]
    pub cutting_coefficient: f64,
    /// Number of teeth.
    pub z: f64,
    /// Planned depth of cut (mm).
    pub ap: f64,
    /// Average number of teeth in cut. Default 1.
    #[serde(default)]
    pub teeth_in_cut: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityOutput {
    pub critical_depth: f64,
    pub stable_spindle_speed: f64,
    pub chatter_frequency: f64,
    pub stability_margin: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for StabilityOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct StabilityLobeLimit {
    meta: AlgorithmMeta,
}

impl Default for StabilityLobeLimit {
    fn default() -> Self {
        Self::new()
    }
}

impl StabilityLobeLimit {
    pub const ID: &'static str = "stability_lobe_limit";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Chatter stability limit".to_string(),
                description: "Unconditionally stable depth of cut and first lobe-peak speed"
                    .to_string(),
                formula: "b_lim = 2*k*zeta*(1+zeta)/(Ks*m); n0 = 60*fn/z".to_string(),
                reference: "Altintas, Y. (2012) Manufacturing Automation, 2nd ed., ch. 3"
                    .to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Critical,
                domain: Domain::Stability,
                inputs: vec![
                    FieldSpec::required("k", "N/µm"),
                    FieldSpec::required("zeta", "-"),
                    FieldSpec::required("fn", "Hz"),
                    FieldSpec::required("Ks", "N/mm²"),
                    FieldSpec::required("z", "-"),
                    FieldSpec::required("ap", "mm"),
                    FieldSpec::optional("teeth_in_cut", "-"),
                ],
                outputs: vec![
                    FieldSpec::required("critical_depth", "mm"),
                    FieldSpec::required("stable_spindle_speed", "rpm"),
                    FieldSpec::required("chatter_frequency", "Hz"),
                    FieldSpec::required("stability_margin", "-"),
                ],
            },
        }
    }
}

impl Algorithm for StabilityLobeLimit {
    type Input = StabilityInput;
    type Output = StabilityOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &StabilityInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        if c.positive("k", input.stiffness, 1000.0) {
            c.typical("k", input.stiffness, 1.0, 500.0);
        }
        if c.within_open("zeta", input.damping_ratio, 0.0, 1.0) {
            c.typical("zeta", input.damping_ratio, 0.005, 0.2);
        }
        if c.positive("fn", input.natural_frequency, 20_000.0) {
            c.typical("fn", input.natural_frequency, 50.0, 5000.0);
        }
        c.positive("Ks", input.cutting_coefficient, 10_000.0);
        let teeth_ok = c.count("z", input.z, MAX_TEETH);
        c.positive("ap", input.ap, MAX_DEPTH_OF_CUT);
        if let Some(m) = input.teeth_in_cut {
            if c.positive("teeth_in_cut", m, MAX_TEETH) && teeth_ok && m > input.z {
                c.error("teeth_in_cut", "cannot exceed the number of teeth");
            }
        }

        c.finish()
    }

    fn calculate(&self, input: &StabilityInput) -> StabilityOutput {
        let mut warnings = Vec::new();

        let zeta = input.damping_ratio;
        let m = input.teeth_in_cut.unwrap_or(1.0);
        let critical_depth =
            2000.0 * input.stiffness * zeta * (1.0 + zeta) / (input.cutting_coefficient * m);
        let stable_spindle_speed = 60.0 * input.natural_frequency / input.z;
        let chatter_frequency = input.natural_frequency * (1.0 + 2.0 * zeta).sqrt();
        let stability_margin = critical_depth / input.ap;

        if stability_margin < 1.0 {
            warnings.push(format!(
                "depth of cut {:.3} mm exceeds the unconditionally stable limit {critical_depth:.3} mm; \
                 run near a lobe peak such as {stable_spindle_speed:.0} rpm",
                input.ap
            ));
        }

        StabilityOutput {
            critical_depth,
            stable_spindle_speed,
            chatter_frequency,
            stability_margin,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spindle() -> StabilityInput {
        StabilityInput {
            stiffness: 20.0,
            damping_ratio: 0.03,
            natural_frequency: 800.0,
            cutting_coefficient: 2000.0,
            z: 4.0,
            ap: 0.5,
            teeth_in_cut: None,
        }
    }

    #[test]
    fn test_validate_nominal() {
        let model = StabilityLobeLimit::new();
        assert!(model.validate(&spindle()).is_valid());
    }

    #[test]
    fn test_validate_overdamped() {
        let model = StabilityLobeLimit::new();
        let mut i = spindle();
        i.damping_ratio = 1.0;
        assert!(!model.validate(&i).is_valid());
    }

    #[test]
    fn test_validate_fractional_teeth() {
        let model = StabilityLobeLimit::new();
        let mut i = spindle();
        i.z = 2.5;
        let result = model.validate(&i);
        assert!(!result.is_valid());
        assert_eq!(result.errors().next().unwrap().field, "z");
    }

    #[test]
    fn test_validate_teeth_in_cut_exceeds_teeth() {
        let model = StabilityLobeLimit::new();
        let mut i = spindle();
        i.teeth_in_cut = Some(5.0);
        let result = model.validate(&i);
        assert!(!result.is_valid());
        assert_eq!(result.errors().next().unwrap().field, "teeth_in_cut");
    }

    #[test]
    fn test_calculate_limit() {
        // b_lim = 2000 * 20 * 0.03 * 1.03 / 2000 = 0.618 mm
        let model = StabilityLobeLimit::new();
        let out = model.calculate(&spindle());
        assert!((out.critical_depth - 0.618).abs() < 1e-9);
        assert!((out.stable_spindle_speed - 12_000.0).abs() < 1e-9);
        assert!((out.stability_margin - 1.236).abs() < 1e-9);
        assert!(out.chatter_frequency > 800.0);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_deep_cut_warns() {
        let model = StabilityLobeLimit::new();
        let mut i = spindle();
        i.ap = 2.0;
        let out = model.calculate(&i);
        assert!(out.stability_margin < 1.0);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_more_teeth_in_cut_lowers_limit() {
        let model = StabilityLobeLimit::new();
        let mut i = spindle();
        i.teeth_in_cut = Some(2.0);
        let out = model.calculate(&i);
        assert!((out.critical_depth - 0.309).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_deterministic() {
        let model = StabilityLobeLimit::new();
        assert_eq!(model.calculate(&spindle()), model.calculate(&spindle()));
    }
}
