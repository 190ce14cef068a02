// ─────────────────────────────────────────────────────────────────────
// MillGuard — Safety Kernel Pipeline Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the gate path: scoring, hooks, schema, and
//! a full released and blocked pipeline run.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use millguard_core::{
    CalculationRequest, EnforcementPipeline, HookEngine, HookExecutionContext, HookPhase,
    OutputSchema, SafetyScorer, ScoringInputs,
};
use millguard_types::{MillGuardConfig, QualitySignals};

fn milling(safety: f64) -> CalculationRequest {
    CalculationRequest::default()
        .with_param("Vc", 1500.0)
        .with_param("fz", 0.1)
        .with_param("ap", 2.0)
        .with_safety_score(safety)
}

// ── SafetyScorer.score() ────────────────────────────────────────────

fn bench_scorer(c: &mut Criterion) {
    let scorer = SafetyScorer::from_config(&MillGuardConfig::default());
    let inputs = ScoringInputs {
        prior_safety: Some(0.9),
        range_compliance: Some(0.8),
        cross_model_agreement: Some(0.95),
        data_completeness: Some(1.0),
    };
    c.bench_function("scorer_score", |b| b.iter(|| scorer.score(black_box(&inputs))));
}

// ── HookEngine.execute() ────────────────────────────────────────────

fn bench_pre_output_hooks(c: &mut Criterion) {
    let engine = HookEngine::with_standard_hooks(&MillGuardConfig::default()).unwrap();
    let ctx = HookExecutionContext::new("bench", HookPhase::PreOutput).with_quality(QualitySignals {
        safety: Some(0.9),
        ..Default::default()
    });
    c.bench_function("hooks_pre_output", |b| b.iter(|| engine.execute(black_box(&ctx))));
}

// ── OutputSchema.enforce() ──────────────────────────────────────────

fn bench_schema(c: &mut Criterion) {
    let pipeline = EnforcementPipeline::with_defaults(MillGuardConfig::default()).unwrap();
    let meta = pipeline
        .list_algorithms()
        .into_iter()
        .find(|m| m.id == "milling_parameters")
        .unwrap();
    let schema = OutputSchema::from_limits(&MillGuardConfig::default().limits);
    let report = json!({
        "results": {
            "cutting_speed": 1500.0, "feed_per_tooth": 0.1, "depth_of_cut": 2.0,
            "width_of_cut": 5.0, "spindle_speed": 47746.48, "feed_rate": 19098.59,
            "material_removal_rate": 190.99
        },
        "safety_score": 0.7,
        "material_id": null,
        "operation": "milling_parameters",
        "meta": {
            "model": "milling_parameters",
            "version": "1.0.0",
            "timestamp": "2026-01-15T10:30:00Z"
        },
        "warnings": []
    });
    c.bench_function("schema_enforce", |b| b.iter(|| schema.enforce(black_box(&report), &meta)));
}

// ── Full pipeline ───────────────────────────────────────────────────

fn bench_pipeline_released(c: &mut Criterion) {
    let pipeline = EnforcementPipeline::with_defaults(MillGuardConfig::default()).unwrap();
    let request = milling(0.9);
    c.bench_function("pipeline_released", |b| {
        b.iter(|| pipeline.run(black_box("milling_parameters"), black_box(&request)))
    });
}

fn bench_pipeline_blocked(c: &mut Criterion) {
    let pipeline = EnforcementPipeline::with_defaults(MillGuardConfig::default()).unwrap();
    let request = milling(0.2);
    c.bench_function("pipeline_blocked", |b| {
        b.iter(|| pipeline.run(black_box("milling_parameters"), black_box(&request)))
    });
}

criterion_group!(
    benches,
    bench_scorer,
    bench_pre_output_hooks,
    bench_schema,
    bench_pipeline_released,
    bench_pipeline_blocked,
);
criterion_main!(benches);
