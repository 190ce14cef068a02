// ─────────────────────────────────────────────────────────────────────
// MillGuard — Kienzle Cutting Force
// ─────────────────────────────────────────────────────────────────────
//! Main cutting force after Kienzle & Victor:
//!
//!   h  = f · sin κ            (undeformed chip thickness)
//!   b  = ap / sin κ           (chip width)
//!   kc = kc1.1 · h^(−mc) · Kγ (specific cutting force)
//!   Fc = kc · b · h
//!   Pc = Fc · Vc / 60 000     [kW]
//!
//! Kγ = 1 − (γ − γ0)/100 corrects for rake angles differing from the
//! γ0 = 6° of the reference tables.

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::{
    COEFFICIENT_KC11, COEFFICIENT_MC, MAX_CUTTING_SPEED, MAX_DEPTH_OF_CUT, MAX_FEED,
    REFERENCE_RAKE_ANGLE_DEG,
};

/// Below this chip thickness (mm) the kc1.1 tables are extrapolated.
pub const MIN_TABULATED_CHIP_THICKNESS: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KienzleInput {
    /// Specific cutting force at h = b = 1 mm (N/mm²).
    pub kc11: f64,
    /// Kienzle exponent.
    pub mc: f64,
    /// Feed per revolution or per tooth (mm).
    pub f: f64,
    /// Depth of cut (mm).
    pub ap: f64,
    /// Cutting speed (m/min).
    #[serde(rename = "Vc")]
    pub cutting_speed: f64,
    /// Tool cutting edge angle (deg). Default 90.
    #[serde(default)]
    pub kappa_r: Option<f64>,
    /// Rake angle (deg). Default 6.
    #[serde(default)]
    pub gamma: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KienzleOutput {
    pub chip_thickness: f64,
    pub chip_width: f64,
    pub specific_cutting_force: f64,
    pub cutting_force: f64,
    pub cutting_power: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for KienzleOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct KienzleForce {
    meta: AlgorithmMeta,
}

impl Default for KienzleForce {
    fn default() -> Self {
        Self::new()
    }
}

impl KienzleForce {
    pub const ID: &'static str = "kienzle_force";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Kienzle cutting force".to_string(),
                description: "Main cutting force and power from the specific cutting force law"
                    .to_string(),
                formula: "Fc = kc1.1 * b * h^(1-mc) * Kgamma".to_string(),
                reference: "Kienzle, O.; Victor, H. (1957) Spezifische Schnittkraefte bei der Metallbearbeitung"
                    .to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Critical,
                domain: Domain::Force,
                inputs: vec![
                    FieldSpec::required("kc11", "N/mm²").with_material(COEFFICIENT_KC11),
                    FieldSpec::required("mc", "-").with_material(COEFFICIENT_MC),
                    FieldSpec::required("f", "mm"),
                    FieldSpec::required("ap", "mm"),
                    FieldSpec::required("Vc", "m/min"),
                    FieldSpec::optional("kappa_r", "deg"),
                    FieldSpec::optional("gamma", "deg"),
                ],
                outputs: vec![
                    FieldSpec::required("chip_thickness", "mm"),
                    FieldSpec::required("chip_width", "mm"),
                    FieldSpec::required("specific_cutting_force", "N/mm²"),
                    FieldSpec::required("cutting_force", "N"),
                    FieldSpec::required("cutting_power", "kW"),
                ],
            },
        }
    }
}

impl Algorithm for KienzleForce {
    type Input = KienzleInput;
    type Output = KienzleOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &KienzleInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        if c.positive("kc11", input.kc11, 10_000.0) {
            c.typical("kc11", input.kc11, 500.0, 4000.0);
        }
        if c.within_open("mc", input.mc, 0.0, 1.0) {
            c.typical("mc", input.mc, 0.1, 0.45);
        }
        if c.positive("f", input.f, MAX_FEED) {
            c.typical("f", input.f, 0.02, 1.5);
        }
        c.positive("ap", input.ap, MAX_DEPTH_OF_CUT);
        c.positive("Vc", input.cutting_speed, MAX_CUTTING_SPEED);

        if let Some(kappa) = input.kappa_r {
            if c.within_open("kappa_r", kappa, 0.0, 180.0) {
                c.typical("kappa_r", kappa, 30.0, 95.0);
            }
        }
        if let Some(gamma) = input.gamma {
            if c.within_open("gamma", gamma, -90.0, 90.0) {
                c.typical("gamma", gamma, -15.0, 25.0);
            }
        }

        c.finish()
    }

    fn calculate(&self, input: &KienzleInput) -> KienzleOutput {
        let mut warnings = Vec::new();

        let kappa = input.kappa_r.unwrap_or(90.0).to_radians();
        let gamma = input.gamma.unwrap_or(REFERENCE_RAKE_ANGLE_DEG);

        let h = input.f * kappa.sin();
        let b = input.ap / kappa.sin();
        let k_gamma = 1.0 - (gamma - REFERENCE_RAKE_ANGLE_DEG) / 100.0;
        let kc = input.kc11 * h.powf(-input.mc) * k_gamma;
        let fc = kc * b * h;
        let pc = fc * input.cutting_speed / 60_000.0;

        if h < MIN_TABULATED_CHIP_THICKNESS {
            warnings.push(format!(
                "chip thickness {h:.4} mm is below {MIN_TABULATED_CHIP_THICKNESS} mm; kc is extrapolated"
            ));
        }

        KienzleOutput {
            chip_thickness: h,
            chip_width: b,
            specific_cutting_force: kc,
            cutting_force: fc,
            cutting_power: pc,
            warnings,
        }
    }
}
