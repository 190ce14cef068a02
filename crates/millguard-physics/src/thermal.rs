// ─────────────────────────────────────────────────────────────────────
// MillGuard — Cook Cutting Temperature
// ─────────────────────────────────────────────────────────────────────
//! Mean tool-chip interface temperature rise after Cook (1973):
//!
//!   ΔT = 0.4 · U / (ρc) · (V · t₀ / K)^(1/3)
//!
//! U specific cutting energy (MPa = MJ/m³), ρc volumetric heat capacity
//! (MJ/(m³·K)), V cutting speed (m/s), t₀ undeformed chip thickness (m),
//! K thermal diffusivity (m²/s).

use serde::{Deserialize, Serialize};

use millguard_types::{
    Algorithm, AlgorithmMeta, Domain, FieldSpec, IssueCollector, ModelOutput, SafetyClass,
    ValidationResult,
};

use crate::params::{MAX_CUTTING_SPEED, MAX_FEED, ROOM_TEMPERATURE_C};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CookInput {
    /// Specific cutting energy (MPa).
    #[serde(rename = "U")]
    pub specific_energy: f64,
    /// Volumetric heat capacity of the workpiece (MJ/(m³·K)).
    pub rho_c: f64,
    /// Cutting speed (m/min).
    #[serde(rename = "Vc")]
    pub cutting_speed: f64,
    /// Undeformed chip thickness (mm).
    pub h: f64,
    /// Thermal diffusivity of the workpiece (mm²/s).
    #[serde(rename = "K")]
    pub diffusivity: f64,
    /// Ambient temperature (°C). Default 20.
    #[serde(rename = "T_ambient", default)]
    pub ambient: Option<f64>,
    /// Softening limit of the tool material (°C).
    #[serde(rename = "T_tool_max", default)]
    pub tool_limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookOutput {
    pub thermal_number: f64,
    pub temperature_rise: f64,
    pub tool_temperature: f64,
    pub warnings: Vec<String>,
}

impl ModelOutput for CookOutput {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

pub struct CookTemperatureRise {
    meta: AlgorithmMeta,
}

impl Default for CookTemperatureRise {
    fn default() -> Self {
        Self::new()
    }
}

impl CookTemperatureRise {
    pub const ID: &'static str = "cook_temperature_rise";

    pub fn new() -> Self {
        Self {
            meta: AlgorithmMeta {
                id: Self::ID.to_string(),
                name: "Cook cutting temperature".to_string(),
                description: "Mean tool-chip interface temperature rise".to_string(),
                formula: "dT = 0.4*U/(rho*c) * (V*t0/K)^(1/3)".to_string(),
                reference: "Cook, N. H. (1973) Tool Wear and Tool Life, J. Eng. Ind. 95(4)"
                    .to_string(),
                version: "1.0.0".to_string(),
                safety_class: SafetyClass::Standard,
                domain: Domain::Thermal,
                inputs: vec![
                    FieldSpec::required("U", "MPa"),
                    FieldSpec::required("rho_c", "MJ/(m³·K)"),
                    FieldSpec::required("Vc", "m/min"),
                    FieldSpec::required("h", "mm"),
                    FieldSpec::required("K", "mm²/s"),
                    FieldSpec::optional("T_ambient", "°C"),
                    FieldSpec::optional("T_tool_max", "°C"),
                ],
                outputs: vec![
                    FieldSpec::required("thermal_number", "-"),
                    FieldSpec::required("temperature_rise", "K"),
                    FieldSpec::required("tool_temperature", "°C"),
                ],
            },
        }
    }
}

impl Algorithm for CookTemperatureRise {
    type Input = CookInput;
    type Output = CookOutput;

    fn metadata(&self) -> &AlgorithmMeta {
        &self.meta
    }

    fn validate(&self, input: &CookInput) -> ValidationResult {
        let mut c = IssueCollector::new();

        if c.positive("U", input.specific_energy, 20_000.0) {
            c.typical("U", input.specific_energy, 300.0, 10_000.0);
        }
        if c.positive("rho_c", input.rho_c, 10.0) {
            c.typical("rho_c", input.rho_c, 1.0, 5.0);
        }
        c.positive("Vc", input.cutting_speed, MAX_CUTTING_SPEED);
        c.positive("h", input.h, MAX_FEED);
        if c.positive("K", input.diffusivity, 200.0) {
            c.typical("K", input.diffusivity, 1.0, 100.0);
        }
        if let Some(t) = input.ambient {
            c.within("T_ambient", t, -50.0, 200.0);
        }
        if let Some(t) = input.tool_limit {
            c.positive("T_tool_max", t, 2000.0);
        }

        c.finish()
    }

    fn calculate(&self, input: &CookInput) -> CookOutput {
        let mut warnings = Vec::new();

        let v = input.cutting_speed / 60.0;
        let t0 = input.h / 1000.0;
        let k = input.diffusivity * 1.0e-6;
        let thermal_number = v * t0 / k;
        let temperature_rise = 0.4 * input.specific_energy / input.rho_c * thermal_number.cbrt();
        let tool_temperature = input.ambient.unwrap_or(ROOM_TEMPERATURE_C) + temperature_rise;

        if let Some(limit) = input.tool_limit {
            if tool_temperature > limit {
                warnings.push(format!(
                    "tool temperature {tool_temperature:.0} °C exceeds the tool softening limit {limit:.0} °C"
                ));
            }
        }

        CookOutput {
            thermal_number,
            temperature_rise,
            tool_temperature,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steel() -> CookInput {
        CookInput {
            specific_energy: 2700.0,
            rho_c: 3.6,
            cutting_speed: 150.0,
            h: 0.1,
            diffusivity: 14.0,
            ambient: None,
            tool_limit: None,
        }
    }

    #[test]
    fn test_validate_nominal() {
        let model = CookTemperatureRise::new();
        let result = model.validate(&steel());
        assert!(result.is_valid());
        assert!(result.issues().is_empty());
    }

    #[test]
    fn test_validate_negative_diffusivity() {
        let model = CookTemperatureRise::new();
        let mut i = steel();
        i.diffusivity = -1.0;
        let result = model.validate(&i);
        assert!(!result.is_valid());
        assert_eq!(result.errors().next().unwrap().field, "K");
    }

    #[test]
    fn test_calculate_steel() {
        // V t0 / K = 2.5 * 1e-4 / 1.4e-5 = 17.857
        let model = CookTemperatureRise::new();
        let out = model.calculate(&steel());
        let expected_n = 2.5 * 1.0e-4 / 1.4e-5;
        assert!((out.thermal_number - expected_n).abs() < 1e-9);
        let expected_rise = 0.4 * 2700.0 / 3.6 * expected_n.cbrt();
        assert!((out.temperature_rise - expected_rise).abs() < 1e-9);
        assert!((out.tool_temperature - (20.0 + expected_rise)).abs() < 1e-9);
        assert!(out.temperature_rise > 700.0 && out.temperature_rise < 900.0);
    }

    #[test]
    fn test_temperature_grows_with_speed() {
        let model = CookTemperatureRise::new();
        let mut fast = steel();
        fast.cutting_speed = 300.0;
        let base = model.calculate(&steel());
        assert!(model.calculate(&fast).temperature_rise > base.temperature_rise);
    }

    #[test]
    fn test_tool_limit_warning() {
        let model = CookTemperatureRise::new();
        let mut i = steel();
        i.tool_limit = Some(600.0);
        let out = model.calculate(&i);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("softening limit"));
    }

    #[test]
    fn test_calculate_deterministic() {
        let model = CookTemperatureRise::new();
        assert_eq!(model.calculate(&steel()), model.calculate(&steel()));
    }
}
