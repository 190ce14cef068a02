// ─────────────────────────────────────────────────────────────────────
// MillGuard — Standard Safety Hooks
// ─────────────────────────────────────────────────────────────────────
//! The hooks every production pipeline carries.
//!
//! | id                                  | phase           | mode       | priority |
//! |-------------------------------------|-----------------|------------|----------|
//! | `pre-calc-safety-signal-present`    | pre-calculation | blocking   | critical |
//! | `pre-calc-parameter-trace`          | pre-calculation | monitoring | low      |
//! | `pre-output-safety-hard-gate`       | pre-output      | blocking   | critical |
//! | `pre-output-range-compliance`       | pre-output      | monitoring | high     |
//! | `pre-output-model-warnings`         | pre-output      | monitoring | low      |

use serde_json::Value;

use millguard_types::score::is_unit_score;
use millguard_types::{MillGuardConfig, MillGuardResult, ScoreComponent};

use crate::hooks::{
    Hook, HookEngine, HookExecutionContext, HookHandler, HookPhase, HookPriority, HookResult,
};

pub const SAFETY_SIGNAL_GATE_ID: &str = "pre-calc-safety-signal-present";
pub const PARAMETER_TRACE_ID: &str = "pre-calc-parameter-trace";
pub const SAFETY_HARD_GATE_ID: &str = "pre-output-safety-hard-gate";
pub const RANGE_COMPLIANCE_MONITOR_ID: &str = "pre-output-range-compliance";
pub const MODEL_WARNINGS_MONITOR_ID: &str = "pre-output-model-warnings";

/// Blocks unless `quality.safety` is a score in [0, 1] at or above the
/// threshold. Absent quality, absent safety, NaN and out-of-range
/// values all block.
#[derive(Debug, Clone, Copy)]
pub struct SafetyHardGate {
    threshold: f64,
}

impl SafetyHardGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn into_hook(self) -> Hook {
        Hook::blocking(
            SAFETY_HARD_GATE_ID,
            HookPhase::PreOutput,
            HookPriority::Critical,
            self,
        )
    }
}

impl HookHandler for SafetyHardGate {
    fn handle(&self, ctx: &HookExecutionContext) -> HookResult {
        let Some(quality) = ctx.quality.as_ref() else {
            return HookResult::block("no quality signals; safety is unknown");
        };
        match quality.safety {
            None => HookResult::block("safety score is undefined"),
            Some(s) if !is_unit_score(s) => {
                HookResult::block(format!("safety score {s} is not in [0, 1]"))
            }
            Some(s) if s >= self.threshold => HookResult::pass(format!(
                "safety score {s:.3} meets the hard floor {:.2}",
                self.threshold
            ))
            .with_score(s),
            Some(s) => HookResult::block(format!(
                "safety score {s:.3} is below the hard floor {:.2}",
                self.threshold
            ))
            .with_score(s),
        }
    }
}

/// Refuses to run a model when the caller sent no usable safety score.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetySignalGate;

impl SafetySignalGate {
    pub fn into_hook(self) -> Hook {
        Hook::blocking(
            SAFETY_SIGNAL_GATE_ID,
            HookPhase::PreCalculation,
            HookPriority::Critical,
            self,
        )
    }
}

impl HookHandler for SafetySignalGate {
    fn handle(&self, ctx: &HookExecutionContext) -> HookResult {
        match ctx.safety() {
            Some(s) if is_unit_score(s) => {
                HookResult::pass(format!("prior safety score {s:.3} supplied")).with_score(s)
            }
            Some(s) => HookResult::block(format!("prior safety score {s} is not in [0, 1]")),
            None => HookResult::block("no prior safety score supplied"),
        }
    }
}

fn trace_parameters(ctx: &HookExecutionContext) -> HookResult {
    let count = ctx.target.data.as_object().map_or(0, |m| m.len());
    log::debug!("{} {}: {} parameters", ctx.operation, ctx.target.id, count);
    HookResult::pass(format!("{count} parameters"))
}

fn monitor_range_compliance(ctx: &HookExecutionContext) -> HookResult {
    let compliance = ctx
        .quality
        .as_ref()
        .and_then(|q| q.components.get(ScoreComponent::RangeCompliance.as_str()))
        .copied();
    match compliance {
        Some(rc) if rc >= 1.0 => {
            HookResult::pass("all inputs inside their typical ranges").with_score(rc)
        }
        Some(rc) => HookResult::fail(format!(
            "{:.0}% of inputs inside their typical ranges",
            rc * 100.0
        ))
        .with_score(rc),
        None => HookResult::fail("range compliance not reported"),
    }
}

fn monitor_model_warnings(ctx: &HookExecutionContext) -> HookResult {
    let warnings: Vec<&str> = ctx
        .target
        .data
        .get("warnings")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if warnings.is_empty() {
        HookResult::pass("model raised no warnings")
    } else {
        HookResult::fail(format!(
            "model raised {} warning(s): {}",
            warnings.len(),
            warnings.join("; ")
        ))
    }
}

impl HookEngine {
    /// Engine pre-loaded with the standard hooks for `config`.
    pub fn with_standard_hooks(config: &MillGuardConfig) -> MillGuardResult<Self> {
        let mut engine = Self::new();
        engine.register_hook(SafetySignalGate.into_hook())?;
        engine.register_hook(Hook::monitoring(
            PARAMETER_TRACE_ID,
            HookPhase::PreCalculation,
            HookPriority::Low,
            trace_parameters,
        ))?;
        engine.register_hook(SafetyHardGate::new(config.safety_threshold).into_hook())?;
        engine.register_hook(Hook::monitoring(
            RANGE_COMPLIANCE_MONITOR_ID,
            HookPhase::PreOutput,
            HookPriority::High,
            monitor_range_compliance,
        ))?;
        engine.register_hook(Hook::monitoring(
            MODEL_WARNINGS_MONITOR_ID,
            HookPhase::PreOutput,
            HookPriority::Low,
            monitor_model_warnings,
        ))?;
        Ok(engine)
    }
}
