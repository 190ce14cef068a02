// ─────────────────────────────────────────────────────────────────────
// MillGuard — Johnson-Cook Flow Stress
// ─────────────────────────────────────────────────────────────────────
//! Strain-, rate- and temperature-dependent flow stress:
//!
//!   σ = (A + B·εⁿ) · (1 + C·ln(ε̇/ε̇₀)) · (1 − T*ᵐ)
//!   T* = (T − T_room) / (T_melt − T_room), floored at 0

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::ROOM_TEMPERATURE_C;

const ABSOLUTE_ZERO_C: f64 = -273.15;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JohnsonCookInput {
    /// Yield stress (MPa).
    #[serde(rename = "A")]
    pub yield_stress: f64,
    /// Hardening modulus (MPa).
    #[serde(rename = "B")]
    pub hardening_modulus: f64,
    /// Hardening exponent.
    #[serde(rename = "n")]
    pub hardening_exponent: f64,
    /// Strain-rate sensitivity.
    #[serde(rename = "C")]
    pub rate_sensitivity: f64,
    /// Thermal softening exponent.
    #[serde(rename = "m")]
    pub softening_exponent: f64,
    /// Equivalent plastic strain.
    #[serde(rename = "eps")]
    pub strain: f64,
    /// Strain rate (1/s).
    #[serde(rename = "eps_dot")]
    pub strain_rate: f64,
    /// Reference strain rate (1/s). Default 1.
    #[serde(rename = "eps_dot_ref", default)]
    pub reference_strain_rate: Option<f64>,
    /// Temperature (°C).
    #[serde(rename = "T")]
    pub temperature: f64,
    /// Reference (room) temperature (°C). Default 20.
    #[serde(rename = "T_room", default)]
    pub room_temperature: Option<f64>,
    /// Melting temperature (°C).
    #[serde(rename = "T_melt")]
    pub melting_temperature: f64,
}

impl JohnsonCookInput {
    fn reference_rate(&self) -> f64 {
        self.reference_strain_rate.unwrap_or(1.0)
    }

    fn room(&self) -> f64 {
        self.room_temperature.unwrap_or(ROOM_TEMPERATURE_C)
    }

    fn rate_factor(&self) -> f64 {
        1.0 + self.rate_sensitivity * (self.strain_rate / self.reference_rate()).ln()
    }

    fn homologous_temperature(&self) -> f64 {
        ((self.temperature - self.room()) / (self.melting_temperature - self.room())).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JohnsonCookOutput {
    pub flow_stress: f64,
    pub strain_hardening_stress: f64,
    pub strain_rate_factor: f64,
    pub thermal_softening_factor: f64,
    pub homologous_temperature: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for JohnsonCookOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct JohnsonCookFlowStress {
    meta: AlgorithmMeta,
}

impl Default for JohnsonCookFlowStress {
    fn default() -> Self {
        Self::new()
    }
}

impl JohnsonCookFlowStress {
    pub const ID: &'static str = "johnson_cook_flow_stress";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Johnson-Cook flow stress".to_string(),
                description: "Flow stress of the workpiece under cutting strain, rate and heat"
                    .to_string(),
                formula: "sigma = (A + B*eps^n)(1 + C*ln(eps_dot/eps_dot_ref))(1 - T*^m)"
                    .to_string(),
                reference: "Johnson, G. R.; Cook, W. H. (1983) Proc. 7th Int. Symp. Ballistics"
                    .to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Standard,
                domain: Domain::Material,
                inputs: vec![
                    FieldSpec::required("A", "MPa"),
                    FieldSpec::required("B", "MPa"),
                    FieldSpec::required("n", "-"),
                    FieldSpec::required("C", "-"),
                    FieldSpec::required("m", "-"),
                    FieldSpec::required("eps", "-"),
                    FieldSpec::required("eps_dot", "1/s"),
                    FieldSpec::optional("eps_dot_ref", "1/s"),
                    FieldSpec::required("T", "°C"),
                    FieldSpec::optional("T_room", "°C"),
                    FieldSpec::required("T_melt", "°C"),
                ],
                outputs: vec![
                    FieldSpec::required("flow_stress", "MPa"),
                    FieldSpec::required("strain_hardening_stress", "MPa"),
                    FieldSpec::required("strain_rate_factor", "-"),
                    FieldSpec::required("thermal_softening_factor", "-"),
                    FieldSpec::required("homologous_temperature", "-"),
                ],
            },
        }
    }
}

impl Algorithm for JohnsonCookFlowStress {
    type Input = JohnsonCookInput;
    type Output = JohnsonCookOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &JohnsonCookInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        c.positive("A", input.yield_stress, 5000.0);
        c.within("B", input.hardening_modulus, 0.0, 10_000.0);
        c.within("n", input.hardening_exponent, 0.0, 1.5);
        c.within("C", input.rate_sensitivity, 0.0, 1.0);
        c.positive("m", input.softening_exponent, 5.0);
        if c.within("eps", input.strain, 0.0, 10.0) {
            c.typical("eps", input.strain, 0.0, 5.0);
        }
        c.positive("eps_dot", input.strain_rate, 1.0e8);
        if let Some(rate) = input.reference_strain_rate {
            c.positive("eps_dot_ref", rate, 1.0e8);
        }

        let room_ok = match input.room_temperature {
            Some(t) => c.within("T_room", t, ABSOLUTE_ZERO_C, 200.0),
            None => true,
        };
        let temp_ok = c.within("T", input.temperature, ABSOLUTE_ZERO_C, 5000.0);
        let melt_ok = c.within("T_melt", input.melting_temperature, 0.0, 5000.0);

        if room_ok && melt_ok && input.melting_temperature <= input.room() {
            c.error("T_melt", "melting temperature must exceed room temperature");
        } else if room_ok && temp_ok && melt_ok {
            if input.temperature >= input.melting_temperature {
                c.error("T", "temperature is at or above the melting point");
            } else {
                c.typical("T", input.homologous_temperature(), 0.0, 0.9);
            }
        }

        if !c.has_errors() {
            if input.strain_rate < input.reference_rate() {
                c.warning("eps_dot", "strain rate below the reference rate");
            }
            if input.rate_factor() <= 0.0 {
                c.error(
                    "eps_dot",
                    "strain-rate term 1 + C*ln(eps_dot/eps_dot_ref) is not positive",
                );
            }
        }

        c.finish()
    }

    fn calculate(&self, input: &JohnsonCookInput) -> JohnsonCookOutput {
        let mut warnings = Vec::new();

        let hardening = input.yield_stress
            + input.hardening_modulus * input.strain.powf(input.hardening_exponent);
        let rate = input.rate_factor();
        let t_star = input.homologous_temperature();
        let softening = 1.0 - t_star.powf(input.softening_exponent);

        if t_star > 0.9 {
            warnings.push(format!(
                "homologous temperature {t_star:.3} is close to melting; flow stress is unreliable"
            ));
        }

        JohnsonCookOutput {
            flow_stress: hardening * rate * softening,
            strain_hardening_stress: hardening,
            strain_rate_factor: rate,
            thermal_softening_factor: softening,
            homologous_temperature: t_star,
            warnings,
        }
    }
}
