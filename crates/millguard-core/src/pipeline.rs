// ─────────────────────────────────────────────────────────────────────
// MillGuard — Enforcement Pipeline
// ─────────────────────────────────────────────────────────────────────
//! The only path from a request to a released result:
//!
//! ```text
//! lookup → validate → pre-calc hooks → calculate → score
//!        → pre-output hooks → assemble → schema → release
//! ```
//!
//! Each stage can end the run. Invalid input never reaches
//! `calculate`. No result leaves without a defined safety score at or
//! above the threshold and a report that satisfies the output schema.
//! Every decision is written to the audit sink.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};

use millguard_types::{
    AlgorithmMeta, MillGuardConfig, MillGuardError, MillGuardResult, QualitySignals, ScoreValue,
    ValidationIssue, ValidationResult,
};

use crate::audit::{AuditDecision, AuditEntry, AuditSink, LogAuditSink};
use crate::hooks::{HookEngine, HookExecutionContext, HookPhase, HookTarget, PhaseOutcome};
use crate::materials::{InMemoryMaterials, MaterialStore};
use crate::registry::{AlgorithmRegistry, ComputedOutput, DynAlgorithm};
use crate::report::{
    BlockStage, BlockedResult, CalculationReport, CalculationRequest, ReportMeta, RunOutcome,
};
use crate::schema::OutputSchema;
use crate::scorer::{SafetyScorer, ScoringInputs};

/// `blocked_by` of a run stopped for lack of a passing score.
pub const SCORE_GATE_ID: &str = "safety-score";
/// `blocked_by` of a run stopped by the output schema.
pub const OUTPUT_SCHEMA_ID: &str = "output-schema";

/// Fail-closed calculation pipeline.
///
/// Thread-safe: all shared state is immutable except the two atomic
/// counters, so one instance can serve any number of threads.
pub struct EnforcementPipeline {
    config: MillGuardConfig,
    registry: Arc<AlgorithmRegistry>,
    hooks: Arc<HookEngine>,
    scorer: SafetyScorer,
    schema: OutputSchema,
    materials: Arc<dyn MaterialStore>,
    audit: Arc<dyn AuditSink>,
    dispatch_count: AtomicU64,
    blocked_count: AtomicU64,
}

impl EnforcementPipeline {
    pub fn new(
        config: MillGuardConfig,
        registry: Arc<AlgorithmRegistry>,
        hooks: Arc<HookEngine>,
    ) -> MillGuardResult<Self> {
        config.validate()?;
        let schema = OutputSchema::from_limits(&config.limits);
        for meta in registry.list() {
            if !schema.covers(&meta) {
                log::warn!(
                    "{} declares outputs without a schema bound; its results will be blocked",
                    meta.id
                );
            }
        }
        Ok(Self {
            scorer: SafetyScorer::from_config(&config),
            schema,
            config,
            registry,
            hooks,
            materials: Arc::new(InMemoryMaterials::new()),
            audit: Arc::new(LogAuditSink),
            dispatch_count: AtomicU64::new(0),
            blocked_count: AtomicU64::new(0),
        })
    }

    /// Pipeline over the built-in models and standard hooks.
    pub fn with_defaults(config: MillGuardConfig) -> MillGuardResult<Self> {
        let hooks = HookEngine::with_standard_hooks(&config)?;
        let registry = AlgorithmRegistry::with_builtin_models()?;
        Self::new(config, Arc::new(registry), Arc::new(hooks))
    }

    pub fn with_materials(mut self, materials: Arc<dyn MaterialStore>) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replace the output schema, e.g. to bound a custom model's fields.
    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &MillGuardConfig {
        &self.config
    }

    /// Descriptors of every registered model.
    pub fn list_algorithms(&self) -> Vec<AlgorithmMeta> {
        self.registry.list()
    }

    /// Runs started, whatever their outcome.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.load(Ordering::Relaxed)
    }

    /// Runs that ended in `RunOutcome::Blocked`.
    pub fn blocked_count(&self) -> u64 {
        self.blocked_count.load(Ordering::Relaxed)
    }

    /// Decode a JSON request and run it.
    ///
    /// Only a request that is not a JSON object of the expected shape
    /// is an `Err`; every other failure is a `RunOutcome`.
    pub fn run_json(&self, algorithm_id: &str, request: &Value) -> MillGuardResult<RunOutcome> {
        if !request.is_object() {
            return Err(MillGuardError::Input(
                "request must be a JSON object".to_string(),
            ));
        }
        let request: CalculationRequest = serde_json::from_value(request.clone())
            .map_err(|e| MillGuardError::Input(format!("malformed request: {e}")))?;
        Ok(self.run(algorithm_id, &request))
    }

    /// Run one calculation through every gate.
    pub fn run(&self, algorithm_id: &str, request: &CalculationRequest) -> RunOutcome {
        self.dispatch_count.fetch_add(1, Ordering::Relaxed);
        let operation = request
            .operation
            .clone()
            .unwrap_or_else(|| algorithm_id.to_string());

        let Some(algorithm) = self.registry.get(algorithm_id) else {
            let validation = ValidationResult::from_issues(vec![ValidationIssue::error(
                "algorithm_id",
                format!("no algorithm registered under '{algorithm_id}'"),
            )]);
            return self.invalid(algorithm_id, &operation, validation);
        };
        let meta = algorithm.meta();

        // ── Resolve material and validate ───────────────────────────
        let (params, material_check) = self.resolve_material(meta, request);
        let validation = algorithm.validate_params(&params).merge(material_check);
        if !validation.is_valid() {
            return self.invalid(&meta.id, &operation, validation);
        }

        // ── Pre-calculation hooks ───────────────────────────────────
        let ctx = HookExecutionContext::new(operation.as_str(), HookPhase::PreCalculation)
            .with_quality(request.quality_signals())
            .with_target(HookTarget::algorithm(
                meta.id.as_str(),
                Value::Object(params.clone()),
            ));
        if let PhaseOutcome::Blocked {
            blocked_by,
            summary,
            ..
        } = self.hooks.execute(&ctx)
        {
            let blocked = BlockedResult::new(BlockStage::PreCalculation, blocked_by, summary);
            return self.block(&meta.id, &operation, blocked);
        }

        // ── Calculate ───────────────────────────────────────────────
        let computed = match self.calculate(algorithm.as_ref(), &params) {
            Ok(computed) => computed,
            Err(reason) => {
                let blocked = BlockedResult::new(BlockStage::Calculation, meta.id.as_str(), reason);
                return self.block(&meta.id, &operation, blocked);
            }
        };

        // ── Score ───────────────────────────────────────────────────
        let score = self.scorer.score(&ScoringInputs {
            prior_safety: request.safety_score,
            range_compliance: Some(SafetyScorer::range_compliance(
                &validation,
                meta.inputs.len(),
            )),
            cross_model_agreement: request.cross_model_agreement,
            data_completeness: request.data_completeness,
        });

        // ── Pre-output hooks ────────────────────────────────────────
        let quality = QualitySignals {
            safety: score.value(),
            completeness: request.data_completeness,
            agreement: request.cross_model_agreement,
            components: score.components.clone(),
        };
        let ctx = HookExecutionContext::new(operation.as_str(), HookPhase::PreOutput)
            .with_quality(quality)
            .with_target(HookTarget::algorithm(
                meta.id.as_str(),
                json!({
                    "results": computed.results,
                    "warnings": computed.warnings,
                    "safety_class": meta.safety_class,
                }),
            ));
        if let PhaseOutcome::Blocked {
            blocked_by,
            summary,
            ..
        } = self.hooks.execute(&ctx)
        {
            let blocked = BlockedResult::new(BlockStage::PreOutput, blocked_by, summary)
                .with_score(score.value());
            return self.block(&meta.id, &operation, blocked);
        }

        // Independent of which hooks are registered.
        let safety_score = match score.score {
            ScoreValue::Defined { value } if value >= self.config.safety_threshold => value,
            ScoreValue::Defined { value } => {
                let reason = format!(
                    "safety score {value:.4} is below the threshold {:.2}",
                    self.config.safety_threshold
                );
                let blocked = BlockedResult::new(BlockStage::Scoring, SCORE_GATE_ID, reason)
                    .with_score(Some(value));
                return self.block(&meta.id, &operation, blocked);
            }
            ScoreValue::Undefined { reason } => {
                let blocked = BlockedResult::new(BlockStage::Scoring, SCORE_GATE_ID, reason);
                return self.block(&meta.id, &operation, blocked);
            }
        };

        // ── Assemble and enforce schema ─────────────────────────────
        let report = CalculationReport {
            results: computed.results,
            safety_score,
            material_id: request.material_id.clone(),
            operation: operation.clone(),
            meta: ReportMeta {
                model: meta.id.clone(),
                version: meta.version.clone(),
                timestamp: Utc::now(),
            },
            warnings: computed.warnings,
        };
        let rejection = match serde_json::to_value(&report) {
            Ok(value) => self.schema.enforce(&value, meta).err().map(|r| r.to_string()),
            Err(e) => Some(format!("report could not be serialised: {e}")),
        };
        if let Some(reason) = rejection {
            let blocked = BlockedResult::new(BlockStage::OutputSchema, OUTPUT_SCHEMA_ID, reason)
                .with_score(Some(safety_score));
            return self.block(&meta.id, &operation, blocked);
        }

        self.audit.record(
            AuditEntry::new(&meta.id, &operation, AuditDecision::Completed)
                .with_score(Some(safety_score)),
        );
        RunOutcome::Completed(report)
    }

    /// Inputs with the material-backed coefficients filled in.
    ///
    /// A value the caller gave always wins. An unknown material id is an
    /// error issue; the parameters are then returned untouched.
    fn resolve_material(
        &self,
        meta: &AlgorithmMeta,
        request: &CalculationRequest,
    ) -> (Map<String, Value>, ValidationResult) {
        let mut params = request.params.clone();
        let Some(material_id) = &request.material_id else {
            return (params, ValidationResult::ok());
        };
        let Some(record) = self.materials.get(material_id) else {
            let issue =
                ValidationIssue::error("material_id", format!("unknown material '{material_id}'"));
            return (params, ValidationResult::from_issues(vec![issue]));
        };
        log::debug!("material {material_id} resolved to ISO group {}", record.iso_group);

        for field in &meta.inputs {
            let Some(coefficient) = field.material.as_deref() else {
                continue;
            };
            if !params.get(&field.name).map_or(true, Value::is_null) {
                continue;
            }
            if let Some(value) = record.coefficients.get(coefficient) {
                log::debug!("{}: {} = {value} from {material_id}", meta.id, field.name);
                params.insert(field.name.clone(), json!(value));
            }
        }
        (params, ValidationResult::ok())
    }

    /// Run the model, turning a decode error or a panic into a reason.
    fn calculate(
        &self,
        algorithm: &dyn DynAlgorithm,
        params: &Map<String, Value>,
    ) -> Result<ComputedOutput, String> {
        match catch_unwind(AssertUnwindSafe(|| algorithm.calculate_params(params))) {
            Ok(Ok(computed)) => Ok(computed),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => {
                log::error!("{} panicked during calculation", algorithm.meta().id);
                Err("algorithm panicked during calculation".to_string())
            }
        }
    }

    fn invalid(
        &self,
        algorithm_id: &str,
        operation: &str,
        validation: ValidationResult,
    ) -> RunOutcome {
        log::info!("{algorithm_id}: invalid input: {}", validation.error_summary());
        self.audit.record(
            AuditEntry::new(algorithm_id, operation, AuditDecision::Invalid)
                .with_reason(validation.error_summary()),
        );
        RunOutcome::Invalid(validation)
    }

    fn block(&self, algorithm_id: &str, operation: &str, blocked: BlockedResult) -> RunOutcome {
        self.blocked_count.fetch_add(1, Ordering::Relaxed);
        log::error!(
            ">>> BLOCKED [{}] {algorithm_id}: {} ({})",
            blocked.stage,
            blocked.blocked_by,
            blocked.reason
        );
        self.audit.record(
            AuditEntry::new(algorithm_id, operation, AuditDecision::Blocked)
                .with_block(&blocked.blocked_by, &blocked.reason)
                .with_score(blocked.safety_score),
        );
        RunOutcome::Blocked(blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use serde::{Deserialize, Serialize};

    use millguard_types::{Algorithm, Domain, FieldSpec, ModelOutput, SafetyClass, Severity};

    use crate::audit::MemoryAuditLog;
    use crate::hooks::{Hook, HookPriority, HookResult};
    use crate::materials::ExternalMaterials;
    use millguard_physics::IsoGroup;

    // ── Test models ─────────────────────────────────────────────────

    #[derive(Deserialize)]
    struct SpeedInput {
        speed: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct SpeedOutput {
        cutting_speed: f64,
        warnings: Vec<String>,
    }

    impl ModelOutput for SpeedOutput {
        fn warnings(&self) -> &[String] {
            &self.warnings
        }
    }

    /// Echoes `speed` as `cutting_speed` with no bounds of its own, and
    /// counts how often it is asked to calculate.
    struct EchoSpeed {
        meta: AlgorithmMeta,
        calls: Arc<AtomicUsize>,
        panic_on_calculate: bool,
    }

    impl EchoSpeed {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                meta: AlgorithmMeta {
                    id: "echo_speed".to_string(),
                    name: "Echo".to_string(),
                    description: "Echo the input speed".to_string(),
                    formula: "Vc = speed".to_string(),
                    reference: "-".to_string(),
                    version: "0.0.1".to_string(),
                    safety_class: SafetyClass::Critical,
                    domain: Domain::Kinematics,
                    inputs: vec![FieldSpec::required("speed", "m/min")],
                    outputs: vec![FieldSpec::required("cutting_speed", "m/min")],
                },
                calls,
                panic_on_calculate: false,
            }
        }
    }

    impl Algorithm for EchoSpeed {
        type Input = SpeedInput;
        type Output = SpeedOutput;

        fn metadata(&self) -> &AlgorithmMeta {
            &self.meta
        }

        fn validate(&self, input: &SpeedInput) -> ValidationResult {
            if input.speed.is_finite() {
                ValidationResult::ok()
            } else {
                ValidationResult::from_issues(vec![ValidationIssue::error("speed", "not finite")])
            }
        }

        fn calculate(&self, input: &SpeedInput) -> SpeedOutput {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_calculate {
                panic!("model fault");
            }
            SpeedOutput {
                cutting_speed: input.speed,
                warnings: Vec::new(),
            }
        }
    }

    fn default_pipeline() -> EnforcementPipeline {
        EnforcementPipeline::with_defaults(MillGuardConfig::default()).unwrap()
    }

    fn echo_pipeline(
        echo: EchoSpeed,
        hooks: HookEngine,
    ) -> (EnforcementPipeline, Arc<MemoryAuditLog>) {
        let mut registry = AlgorithmRegistry::new();
        registry.register(echo).unwrap();
        let audit = Arc::new(MemoryAuditLog::new());
        let config = MillGuardConfig::default();
        let pipeline = EnforcementPipeline::new(config, Arc::new(registry), Arc::new(hooks))
            .unwrap()
            .with_audit(audit.clone());
        (pipeline, audit)
    }

    fn standard_hooks() -> HookEngine {
        HookEngine::with_standard_hooks(&MillGuardConfig::default()).unwrap()
    }

    fn milling(safety: f64) -> CalculationRequest {
        CalculationRequest::default()
            .with_param("Vc", 1500.0)
            .with_param("fz", 0.1)
            .with_param("ap", 2.0)
            .with_safety_score(safety)
    }

    // ── End-to-end tests ────────────────────────────────────────────

    #[test]
    fn test_milling_scenario_released() {
        let pipeline = default_pipeline();
        let outcome = pipeline.run("milling_parameters", &milling(0.70));
        let report = outcome.report().expect("released");

        assert_eq!(report.safety_score, 0.70);
        assert_eq!(report.operation, "milling_parameters");
        assert_eq!(report.meta.model, "milling_parameters");
        assert_eq!(report.material_id, None);
        let n = report.result("spindle_speed").unwrap();
        assert!((n - 1500.0 * 1000.0 / (std::f64::consts::PI * 10.0)).abs() < 1e-6);
        assert!(report.result("feed_rate").unwrap() > 0.0);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_run_json_scenario() {
        let pipeline = default_pipeline();
        let outcome = pipeline
            .run_json(
                "milling_parameters",
                &json!({"Vc": 1500, "fz": 0.1, "ap": 2, "safety_score": 0.70}),
            )
            .unwrap();
        assert!(outcome.is_completed());
    }

    #[test]
    fn test_every_builtin_model_can_release() {
        let pipeline = default_pipeline();
        let requests = [
            (
                "milling_parameters",
                json!({"Vc": 200, "fz": 0.1, "ap": 2, "ae": 5, "D": 10, "z": 4}),
            ),
            ("kienzle_force", json!({"kc11": 1700, "mc": 0.25, "f": 0.2, "ap": 2, "Vc": 150})),
            ("taylor_tool_life", json!({"Vc": 200, "C": 350, "n": 0.25})),
            (
                "johnson_cook_flow_stress",
                json!({"A": 792, "B": 510, "n": 0.26, "C": 0.014, "m": 1.03,
                       "eps": 0.5, "eps_dot": 1000, "T": 500, "T_melt": 1520}),
            ),
            (
                "cook_temperature_rise",
                json!({"U": 2700, "rho_c": 3.6, "Vc": 150, "h": 0.1, "K": 14}),
            ),
            (
                "stability_lobe_limit",
                json!({"k": 20, "zeta": 0.03, "fn": 800, "Ks": 2000, "z": 4, "ap": 0.5}),
            ),
            ("surface_roughness", json!({"f": 0.2, "r_epsilon": 0.8})),
        ];
        for (id, mut params) in requests {
            params["safety_score"] = json!(0.95);
            let outcome = pipeline.run_json(id, &params).unwrap();
            assert!(outcome.is_completed(), "{id}: {outcome:?}");
        }
        assert_eq!(pipeline.dispatch_count(), 7);
        assert_eq!(pipeline.blocked_count(), 0);
    }

    #[test]
    fn test_list_algorithms() {
        let pipeline = default_pipeline();
        assert_eq!(pipeline.list_algorithms().len(), 7);
    }

    // ── Validation tests ────────────────────────────────────────────

    #[test]
    fn test_unknown_algorithm_is_invalid() {
        let pipeline = default_pipeline();
        let outcome = pipeline.run("does_not_exist", &milling(0.9));
        let validation = outcome.validation().expect("invalid");
        assert_eq!(validation.issues()[0].field, "algorithm_id");
        assert_eq!(validation.issues()[0].severity, Severity::Error);
    }

    #[test]
    fn test_invalid_input_never_calculates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, audit) = echo_pipeline(EchoSpeed::new(calls.clone()), standard_hooks());
        let outcome = pipeline.run(
            "echo_speed",
            &CalculationRequest::default().with_safety_score(1.0),
        );
        assert!(outcome.validation().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(audit.entries()[0].decision, AuditDecision::Invalid);
    }

    #[test]
    fn test_unknown_material_is_invalid() {
        let pipeline = default_pipeline();
        let request = milling(0.9).with_material("unobtainium");
        let outcome = pipeline.run("milling_parameters", &request);
        let validation = outcome.validation().expect("invalid");
        assert!(validation.errors().any(|i| i.field == "material_id"));
    }

    #[test]
    fn test_known_material_is_reported() {
        let pipeline = default_pipeline();
        let outcome = pipeline.run("milling_parameters", &milling(0.9).with_material("C45"));
        assert_eq!(outcome.report().unwrap().material_id.as_deref(), Some("C45"));
    }

    #[test]
    fn test_material_supplies_force_coefficients() {
        let pipeline = default_pipeline();
        let cut = |material: &str| {
            let request = json!({
                "f": 0.2, "ap": 2.0, "Vc": 60.0,
                "material_id": material, "safety_score": 0.9
            });
            let outcome = pipeline.run_json("kienzle_force", &request).unwrap();
            let report = outcome.report().cloned().expect("released");
            report.result("cutting_force").unwrap()
        };
        let titanium = cut("Ti6Al4V");
        let aluminium = cut("AlSi10Mg");
        let s = IsoGroup::S.reference();
        let expected = s.kc11 * 0.2f64.powf(-s.mc) * 2.0 * 0.2;
        assert!((titanium - expected).abs() < 1e-9);
        assert!(titanium > aluminium);
    }

    #[test]
    fn test_material_supplies_taylor_constants() {
        let pipeline = default_pipeline();
        let request = CalculationRequest::default()
            .with_param("Vc", 60.0)
            .with_material("Ti6Al4V")
            .with_safety_score(0.9);
        let outcome = pipeline.run("taylor_tool_life", &request);
        let report = outcome.report().expect("released");
        let life = report.result("tool_life").unwrap();
        let s = IsoGroup::S.reference();
        assert!((life - (s.taylor_c / 60.0).powf(1.0 / s.taylor_n)).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_coefficient_overrides_material() {
        let pipeline = default_pipeline();
        let request = CalculationRequest::default()
            .with_param("kc11", 1000.0)
            .with_param("f", 0.2)
            .with_param("ap", 2.0)
            .with_param("Vc", 60.0)
            .with_material("Ti6Al4V")
            .with_safety_score(0.9);
        let outcome = pipeline.run("kienzle_force", &request);
        let report = outcome.report().expect("released");
        let kc = report.result("specific_cutting_force").unwrap();
        let mc = IsoGroup::S.reference().mc;
        assert!((kc - 1000.0 * 0.2f64.powf(-mc)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_coefficients_without_material_invalid() {
        let pipeline = default_pipeline();
        let request = CalculationRequest::default()
            .with_param("f", 0.2)
            .with_param("ap", 2.0)
            .with_param("Vc", 60.0)
            .with_safety_score(0.9);
        let outcome = pipeline.run("kienzle_force", &request);
        let validation = outcome.validation().expect("invalid");
        let fields: Vec<&str> = validation.errors().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["kc11", "mc"]);
    }

    #[test]
    fn test_material_fills_only_declared_inputs() {
        let pipeline = default_pipeline();
        let outcome = pipeline.run("milling_parameters", &milling(0.9).with_material("Ti6Al4V"));
        assert!(outcome.is_completed(), "{outcome:?}");
    }

    #[test]
    fn test_external_material_store() {
        let store = ExternalMaterials::new(|_| None);
        let pipeline = default_pipeline().with_materials(Arc::new(store));
        let outcome = pipeline.run("milling_parameters", &milling(0.9).with_material("C45"));
        assert!(outcome.validation().is_some());
    }

    #[test]
    fn test_float_tooth_count_accepted() {
        let pipeline = default_pipeline();
        let request = json!({"Vc": 200, "fz": 0.1, "ap": 2, "z": 4.0, "safety_score": 0.9});
        let outcome = pipeline.run_json("milling_parameters", &request).unwrap();
        assert!(outcome.is_completed(), "{outcome:?}");

        let request = json!({"Vc": 200, "fz": 0.1, "ap": 2, "z": 2.5, "safety_score": 0.9});
        let outcome = pipeline.run_json("milling_parameters", &request).unwrap();
        let validation = outcome.validation().expect("invalid");
        assert_eq!(validation.errors().next().unwrap().field, "z");
    }

    #[test]
    fn test_run_json_rejects_non_object() {
        let pipeline = default_pipeline();
        let err = pipeline.run_json("milling_parameters", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, MillGuardError::Input(_)));
    }

    // ── Fail-closed tests ───────────────────────────────────────────

    #[test]
    fn test_missing_safety_score_blocked_before_calculation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, _) = echo_pipeline(EchoSpeed::new(calls.clone()), standard_hooks());
        let outcome = pipeline.run(
            "echo_speed",
            &CalculationRequest::default().with_param("speed", 100.0),
        );
        let blocked = outcome.blocked().expect("blocked");
        assert!(blocked.blocked);
        assert_eq!(blocked.stage, BlockStage::PreCalculation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_safety_score_blocked_without_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, _) = echo_pipeline(EchoSpeed::new(calls), HookEngine::new());
        let outcome = pipeline.run(
            "echo_speed",
            &CalculationRequest::default().with_param("speed", 100.0),
        );
        let blocked = outcome.blocked().expect("blocked");
        assert_eq!(blocked.stage, BlockStage::Scoring);
        assert_eq!(blocked.blocked_by, SCORE_GATE_ID);
        assert_eq!(blocked.safety_score, None);
    }

    #[test]
    fn test_low_score_blocked_by_hard_gate() {
        let pipeline = default_pipeline();
        let outcome = pipeline.run("milling_parameters", &milling(0.69));
        let blocked = outcome.blocked().expect("blocked");
        assert_eq!(blocked.stage, BlockStage::PreOutput);
        assert_eq!(blocked.blocked_by, crate::gates::SAFETY_HARD_GATE_ID);
        assert_eq!(pipeline.blocked_count(), 1);
    }

    #[test]
    fn test_low_score_blocked_without_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, _) = echo_pipeline(EchoSpeed::new(calls), HookEngine::new());
        let outcome = pipeline.run(
            "echo_speed",
            &CalculationRequest::default()
                .with_param("speed", 100.0)
                .with_safety_score(0.3),
        );
        let blocked = outcome.blocked().expect("blocked");
        assert_eq!(blocked.stage, BlockStage::Scoring);
        assert_eq!(blocked.safety_score, Some(0.3));
    }

    #[test]
    fn test_malformed_optional_signal_blocks() {
        let pipeline = default_pipeline();
        let outcome = pipeline.run("milling_parameters", &milling(0.9).with_data_completeness(2.0));
        assert!(outcome.is_blocked());
    }

    #[test]
    fn test_out_of_schema_result_blocked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, audit) = echo_pipeline(EchoSpeed::new(calls), standard_hooks());
        let outcome = pipeline.run(
            "echo_speed",
            &CalculationRequest::default()
                .with_param("speed", 5000.0)
                .with_safety_score(1.0),
        );
        let blocked = outcome.blocked().expect("blocked");
        assert_eq!(blocked.stage, BlockStage::OutputSchema);
        assert_eq!(blocked.blocked_by, OUTPUT_SCHEMA_ID);
        assert!(blocked.reason.contains("results.cutting_speed"));
        assert_eq!(audit.entries()[0].decision, AuditDecision::Blocked);
    }

    #[test]
    fn test_panicking_model_blocked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut echo = EchoSpeed::new(calls.clone());
        echo.panic_on_calculate = true;
        let (pipeline, _) = echo_pipeline(echo, standard_hooks());
        let outcome = pipeline.run(
            "echo_speed",
            &CalculationRequest::default()
                .with_param("speed", 100.0)
                .with_safety_score(1.0),
        );
        let blocked = outcome.blocked().expect("blocked");
        assert_eq!(blocked.stage, BlockStage::Calculation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_blocking_hook_vetoes() {
        let mut hooks = standard_hooks();
        hooks
            .register_hook(Hook::blocking(
                "no-roughing",
                HookPhase::PreCalculation,
                HookPriority::High,
                |ctx: &HookExecutionContext| {
                    if ctx.operation == "roughing" {
                        HookResult::block("roughing disabled on this machine")
                    } else {
                        HookResult::pass("ok")
                    }
                },
            ))
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, _) = echo_pipeline(EchoSpeed::new(calls.clone()), hooks);
        let request = CalculationRequest::default()
            .with_param("speed", 100.0)
            .with_safety_score(1.0);

        let blocked_run = pipeline.run("echo_speed", &request.clone().with_operation("roughing"));
        assert_eq!(blocked_run.blocked().unwrap().blocked_by, "no-roughing");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let released = pipeline.run("echo_speed", &request.with_operation("finishing"));
        assert_eq!(released.report().unwrap().operation, "finishing");
    }

    // ── Audit and concurrency tests ─────────────────────────────────

    #[test]
    fn test_audit_records_every_decision() {
        let audit = Arc::new(MemoryAuditLog::new());
        let pipeline = default_pipeline().with_audit(audit.clone());
        pipeline.run("milling_parameters", &milling(0.9));
        pipeline.run("milling_parameters", &milling(0.1));
        pipeline.run("nope", &milling(0.9));
        let decisions: Vec<AuditDecision> = audit.entries().iter().map(|e| e.decision).collect();
        assert_eq!(
            decisions,
            vec![AuditDecision::Completed, AuditDecision::Blocked, AuditDecision::Invalid]
        );
    }

    #[test]
    fn test_concurrent_dispatch() {
        let pipeline = default_pipeline();
        std::thread::scope(|s| {
            for t in 0..8 {
                let pipeline = &pipeline;
                s.spawn(move || {
                    for i in 0..25 {
                        let safety = if (t + i) % 2 == 0 { 0.9 } else { 0.2 };
                        let outcome = pipeline.run("milling_parameters", &milling(safety));
                        assert_eq!(outcome.is_completed(), safety >= 0.7);
                    }
                });
            }
        });
        assert_eq!(pipeline.dispatch_count(), 200);
        assert_eq!(pipeline.blocked_count(), 100);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MillGuardConfig {
            safety_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(EnforcementPipeline::with_defaults(config).is_err());
    }
}
