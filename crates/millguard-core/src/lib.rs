// ─────────────────────────────────────────────────────────────────────
// MillGuard — Safety Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Algorithm registry, composite safety scorer, hook engine, output
//! schema enforcement and the enforcement pipeline that ties them
//! together.
//!
//! # Safety Invariants
//!
//! 1. **Fail closed**: a result is released only with a defined safety
//!    score S(x) at or above the configured threshold. A missing,
//!    malformed or NaN score blocks, with or without hooks registered.
//!
//! 2. **Invalid input is never computed**: `calculate` runs only after
//!    validation produced no error-severity issue.
//!
//! 3. **Blocking hooks are final**: the first blocking hook that
//!    reports `blocked` halts its phase; no later hook runs. Monitoring
//!    hooks never block. A panicking hook is treated as blocked
//!    (blocking) or failed (monitoring).
//!
//! 4. **Schema before release**: every outgoing report is checked in
//!    its serialised form against the output schema. Violations are
//!    collected, never clamped.
//!
//! 5. **No shared mutable state on the hot path**: registry, hooks,
//!    schema and scorer are immutable once the pipeline is built. Only
//!    the dispatch counters are atomic, and audit sinks synchronise
//!    themselves.

pub mod audit;
pub mod gates;
pub mod hooks;
pub mod materials;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod schema;
pub mod scorer;

pub use audit::{AuditDecision, AuditEntry, AuditSink, LogAuditSink, MemoryAuditLog};
pub use gates::{SafetyHardGate, SafetySignalGate};
pub use hooks::{
    Hook, HookEngine, HookExecutionContext, HookHandler, HookMode, HookPhase, HookPriority,
    HookRecord, HookResult, HookTarget, PhaseOutcome,
};
pub use materials::{ExternalMaterials, InMemoryMaterials, MaterialRecord, MaterialStore};
pub use pipeline::EnforcementPipeline;
pub use registry::{AlgorithmRegistry, ComputedOutput, DynAlgorithm};
pub use report::{
    BlockStage, BlockedResult, CalculationReport, CalculationRequest, ReportMeta, RunOutcome,
};
pub use schema::{FieldBound, Minimum, OutputSchema, SchemaRejection, SchemaViolation};
pub use scorer::{SafetyScorer, ScoringInputs};
