// ─────────────────────────────────────────────────────────────────────
// MillGuard — Algorithm Contract
// ─────────────────────────────────────────────────────────────────────
//! The uniform shape every physical model implements:
//! `validate` → `calculate` → `metadata`.
//!
//! Callers validate first and only calculate on a valid result. This is
//! a calling convention, not a runtime guard inside `calculate`; the
//! enforcement pipeline is the caller that honours it.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationResult;

/// How much a wrong result from a model can hurt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyClass {
    /// Drives machine motion or loads directly (forces, tool life, chatter).
    Critical,
    Standard,
    /// Advisory values only.
    Informational,
}

/// Physical domain a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Kinematics,
    Force,
    Material,
    ToolLife,
    Thermal,
    Stability,
    Surface,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Kinematics => "kinematics",
            Domain::Force => "force",
            Domain::Material => "material",
            Domain::ToolLife => "tool_life",
            Domain::Thermal => "thermal",
            Domain::Stability => "stability",
            Domain::Surface => "surface",
        };
        f.write_str(name)
    }
}

/// A named input or output quantity with its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub unit: String,
    pub required: bool,
    /// Material coefficient that supplies this input when the caller
    /// names a material and leaves the field out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl FieldSpec {
    pub fn required(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            required: true,
            material: None,
        }
    }

    pub fn optional(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            required: false,
            material: None,
        }
    }

    pub fn with_material(mut self, coefficient: &str) -> Self {
        self.material = Some(coefficient.to_string());
        self
    }
}

/// Immutable descriptor of one model, built once at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmMeta {
    pub id: String,
    pub name: String,
    pub description: String,
    pub formula: String,
    pub reference: String,
    pub version: String,
    pub safety_class: SafetyClass,
    pub domain: Domain,
    pub inputs: Vec<FieldSpec>,
    pub outputs: Vec<FieldSpec>,
}

impl AlgorithmMeta {
    pub fn input(&self, name: &str) -> Option<&FieldSpec> {
        self.inputs.iter().find(|f| f.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&FieldSpec> {
        self.outputs.iter().find(|f| f.name == name)
    }

    pub fn required_inputs(&self) -> impl Iterator<Item = &FieldSpec> {
        self.inputs.iter().filter(|f| f.required)
    }
}

/// Output of a model: the physical results plus advisory warnings.
///
/// Serialising an output must yield a JSON object whose keys are the
/// declared output fields plus a `warnings` array.
pub trait ModelOutput: Serialize + Clone + PartialEq + fmt::Debug + Send {
    fn warnings(&self) -> &[String];
}

/// A stateless physical model.
///
/// `calculate` must be a pure, deterministic function of its input so
/// it can run concurrently and be memoised.
pub trait Algorithm: Send + Sync {
    type Input: DeserializeOwned;
    type Output: ModelOutput;

    /// Static descriptor; returns the same value on every call.
    fn metadata(&self) -> &AlgorithmMeta;

    /// Check every field against physically meaningful bounds.
    /// Never panics.
    fn validate(&self, input: &Self::Input) -> ValidationResult;

    /// Compute the model. Only call with input that validated.
    fn calculate(&self, input: &Self::Input) -> Self::Output;
}
