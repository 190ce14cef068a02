// ─────────────────────────────────────────────────────────────────────
// MillGuard — Algorithm Registry
// ─────────────────────────────────────────────────────────────────────
//! Id-keyed catalogue of models plus the type-erased view the pipeline
//! dispatches through.
//!
//! Each model has its own typed input. `DynAlgorithm` decodes a JSON
//! parameter map into that type, so the pipeline only ever sees maps.
//! Missing required fields and undeclared keys are reported as
//! validation errors before the typed `validate` ever runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use millguard_physics::{
    CookTemperatureRise, JohnsonCookFlowStress, KienzleForce, MillingParameters,
    StabilityLobeLimit, SurfaceRoughness, TaylorToolLife,
};
use millguard_types::{
    Algorithm, AlgorithmMeta, MillGuardError, MillGuardResult, ModelOutput, ValidationIssue,
    ValidationResult,
};

/// Result fields and warnings of one model call, already serialised.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedOutput {
    pub results: Map<String, Value>,
    pub warnings: Vec<String>,
}

/// Object-safe view of an [`Algorithm`] over JSON parameter maps.
pub trait DynAlgorithm: Send + Sync {
    fn meta(&self) -> &AlgorithmMeta;

    /// Structural checks, decoding, then the model's own validation.
    fn validate_params(&self, params: &Map<String, Value>) -> ValidationResult;

    /// Decode and calculate. Only call after `validate_params` passed.
    fn calculate_params(&self, params: &Map<String, Value>) -> MillGuardResult<ComputedOutput>;
}

impl<A: Algorithm> DynAlgorithm for A {
    fn meta(&self) -> &AlgorithmMeta {
        self.metadata()
    }

    fn validate_params(&self, params: &Map<String, Value>) -> ValidationResult {
        let meta = self.metadata();
        let mut issues = Vec::new();

        for spec in meta.required_inputs() {
            match params.get(&spec.name) {
                None | Some(Value::Null) if spec.material.is_some() => {
                    issues.push(ValidationIssue::error(
                        spec.name.as_str(),
                        "required field is missing; give it or a material_id",
                    ))
                }
                None | Some(Value::Null) => issues.push(ValidationIssue::error(
                    spec.name.as_str(),
                    "required field is missing",
                )),
                Some(_) => {}
            }
        }
        for key in params.keys() {
            if meta.input(key).is_none() {
                issues.push(ValidationIssue::error(
                    key.as_str(),
                    format!("'{key}' is not an input of {}", meta.id),
                ));
            }
        }
        if !issues.is_empty() {
            return ValidationResult::from_issues(issues);
        }

        match decode::<A::Input>(params) {
            Ok(input) => self.validate(&input),
            Err(e) => ValidationResult::from_issues(vec![ValidationIssue::error(
                "input",
                format!("malformed input: {e}"),
            )]),
        }
    }

    fn calculate_params(&self, params: &Map<String, Value>) -> MillGuardResult<ComputedOutput> {
        let input = decode::<A::Input>(params)
            .map_err(|e| MillGuardError::Input(format!("malformed input: {e}")))?;
        let output = self.calculate(&input);
        let warnings = output.warnings().to_vec();

        let Value::Object(mut results) = serde_json::to_value(&output)? else {
            return Err(MillGuardError::Numerical(format!(
                "{} produced an output that is not a JSON object",
                self.metadata().id
            )));
        };
        results.remove("warnings");
        Ok(ComputedOutput { results, warnings })
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    params: &Map<String, Value>,
) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(params.clone()))
}

/// Catalogue of registered models, keyed by id.
///
/// Populated at start-up and then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<String, Arc<dyn DynAlgorithm>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the seven machining models shipped with MillGuard.
    pub fn with_builtin_models() -> MillGuardResult<Self> {
        let mut registry = Self::new();
        registry.register(MillingParameters::new())?;
        registry.register(KienzleForce::new())?;
        registry.register(TaylorToolLife::new())?;
        registry.register(JohnsonCookFlowStress::new())?;
        registry.register(CookTemperatureRise::new())?;
        registry.register(StabilityLobeLimit::new())?;
        registry.register(SurfaceRoughness::new())?;
        Ok(registry)
    }

    pub fn register<A: Algorithm + 'static>(&mut self, algorithm: A) -> MillGuardResult<()> {
        self.register_dyn(Arc::new(algorithm))
    }

    /// Register an already type-erased model. Ids must be unique.
    pub fn register_dyn(&mut self, algorithm: Arc<dyn DynAlgorithm>) -> MillGuardResult<()> {
        let id = algorithm.meta().id.clone();
        if id.trim().is_empty() {
            return Err(MillGuardError::Registration(
                "algorithm id must not be empty".to_string(),
            ));
        }
        if self.algorithms.contains_key(&id) {
            return Err(MillGuardError::Registration(format!(
                "algorithm '{id}' is already registered"
            )));
        }
        log::debug!("registered algorithm {id}");
        self.algorithms.insert(id, algorithm);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn DynAlgorithm>> {
        self.algorithms.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.algorithms.contains_key(id)
    }

    /// Descriptors of every registered model, ordered by id.
    pub fn list(&self) -> Vec<AlgorithmMeta> {
        self.algorithms.values().map(|a| a.meta().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}
