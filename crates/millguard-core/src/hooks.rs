// ─────────────────────────────────────────────────────────────────────
// MillGuard — Hook Engine
// ─────────────────────────────────────────────────────────────────────
//! Phase-bound hooks that can veto a calculation.
//!
//! Hooks run in priority order (critical first); ties keep their
//! registration order. A **blocking** hook that reports `blocked`
//! halts the phase immediately and no later hook runs. A
//! **monitoring** hook can only record a failure. A hook that panics
//! is treated as blocked (blocking) or failed (monitoring).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use millguard_types::{MillGuardError, MillGuardResult, QualitySignals};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    /// After validation, before the model runs.
    #[default]
    PreCalculation,
    /// After scoring, before the report leaves the kernel.
    PreOutput,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::PreCalculation => f.write_str("pre_calculation"),
            HookPhase::PreOutput => f.write_str("pre_output"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookMode {
    /// May halt the phase.
    Blocking,
    /// Observes only; never halts.
    Monitoring,
}

/// Execution priority. Variants are ordered: `Critical` runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPriority {
    Critical,
    High,
    Normal,
    Low,
}

/// What a hook reports back to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResult {
    pub success: bool,
    /// Honoured only for blocking hooks. Implies `!success`.
    pub blocked: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl HookResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            success: true,
            blocked: false,
            message: message.into(),
            score: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            blocked: false,
            message: message.into(),
            score: None,
        }
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self {
            success: false,
            blocked: true,
            message: message.into(),
            score: None,
        }
    }

    /// Attach a finite score; non-finite values are dropped.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score.is_finite().then_some(score);
        self
    }
}

/// The entity a hook is judging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookTarget {
    pub kind: String,
    pub id: String,
    pub data: Value,
}

impl HookTarget {
    pub fn algorithm(id: impl Into<String>, data: Value) -> Self {
        Self {
            kind: "algorithm".to_string(),
            id: id.into(),
            data,
        }
    }
}

/// Everything a hook may look at. Every field may be absent when the
/// context is deserialised from a partial JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookExecutionContext {
    pub operation: String,
    pub phase: HookPhase,
    pub timestamp: DateTime<Utc>,
    pub quality: Option<QualitySignals>,
    pub target: HookTarget,
}

impl Default for HookExecutionContext {
    fn default() -> Self {
        Self {
            operation: String::new(),
            phase: HookPhase::default(),
            timestamp: Utc::now(),
            quality: None,
            target: HookTarget::default(),
        }
    }
}

impl HookExecutionContext {
    pub fn new(operation: impl Into<String>, phase: HookPhase) -> Self {
        Self {
            operation: operation.into(),
            phase,
            ..Default::default()
        }
    }

    pub fn with_quality(mut self, quality: QualitySignals) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_target(mut self, target: HookTarget) -> Self {
        self.target = target;
        self
    }

    /// The safety signal, if the context carries one.
    pub fn safety(&self) -> Option<f64> {
        self.quality.as_ref().and_then(|q| q.safety)
    }
}

/// Hook behaviour. Implemented for plain closures.
pub trait HookHandler: Send + Sync {
    fn handle(&self, ctx: &HookExecutionContext) -> HookResult;
}

impl<F> HookHandler for F
where
    F: Fn(&HookExecutionContext) -> HookResult + Send + Sync,
{
    fn handle(&self, ctx: &HookExecutionContext) -> HookResult {
        self(ctx)
    }
}

/// A registered hook.
#[derive(Clone)]
pub struct Hook {
    pub id: String,
    pub phase: HookPhase,
    pub mode: HookMode,
    pub priority: HookPriority,
    pub enabled: bool,
    handler: Arc<dyn HookHandler>,
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("mode", &self.mode)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Hook {
    pub fn new(
        id: impl Into<String>,
        phase: HookPhase,
        mode: HookMode,
        priority: HookPriority,
        handler: impl HookHandler + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            phase,
            mode,
            priority,
            enabled: true,
            handler: Arc::new(handler),
        }
    }

    pub fn blocking(
        id: impl Into<String>,
        phase: HookPhase,
        priority: HookPriority,
        handler: impl HookHandler + 'static,
    ) -> Self {
        Self::new(id, phase, HookMode::Blocking, priority, handler)
    }

    pub fn monitoring(
        id: impl Into<String>,
        phase: HookPhase,
        priority: HookPriority,
        handler: impl HookHandler + 'static,
    ) -> Self {
        Self::new(id, phase, HookMode::Monitoring, priority, handler)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Run the handler, converting a panic into block/fail by mode.
    fn run(&self, ctx: &HookExecutionContext) -> HookResult {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.handler.handle(ctx))) {
            Ok(result) => result,
            Err(_) => {
                log::error!("hook {} panicked", self.id);
                match self.mode {
                    HookMode::Blocking => HookResult::block(format!("hook {} panicked", self.id)),
                    HookMode::Monitoring => HookResult::fail(format!("hook {} panicked", self.id)),
                }
            }
        }
    }
}

/// One executed hook and what it said.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookRecord {
    pub hook_id: String,
    pub mode: HookMode,
    pub priority: HookPriority,
    pub result: HookResult,
    pub elapsed_us: u64,
}

/// Aggregate outcome of one phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    Completed {
        results: Vec<HookRecord>,
    },
    Blocked {
        blocked_by: String,
        summary: String,
        results: Vec<HookRecord>,
    },
}

impl PhaseOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, PhaseOutcome::Blocked { .. })
    }

    pub fn results(&self) -> &[HookRecord] {
        match self {
            PhaseOutcome::Completed { results } | PhaseOutcome::Blocked { results, .. } => results,
        }
    }
}

/// Ordered hook lists per phase.
///
/// Built before the pipeline starts and then shared read-only, so
/// execution needs no locking.
#[derive(Debug, Default)]
pub struct HookEngine {
    phases: BTreeMap<HookPhase, Vec<Hook>>,
    ids: HashSet<String>,
}

impl HookEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every hook of equal or higher priority.
    pub fn register_hook(&mut self, hook: Hook) -> MillGuardResult<()> {
        if hook.id.trim().is_empty() {
            return Err(MillGuardError::Registration(
                "hook id must not be empty".to_string(),
            ));
        }
        if !self.ids.insert(hook.id.clone()) {
            return Err(MillGuardError::Registration(format!(
                "hook '{}' is already registered",
                hook.id
            )));
        }
        log::debug!(
            "registered {:?} hook {} ({:?}, {})",
            hook.mode,
            hook.id,
            hook.priority,
            hook.phase
        );
        let hooks = self.phases.entry(hook.phase).or_default();
        let pos = hooks
            .iter()
            .position(|h| h.priority > hook.priority)
            .unwrap_or(hooks.len());
        hooks.insert(pos, hook);
        Ok(())
    }

    /// Hooks of a phase in execution order.
    pub fn hooks(&self, phase: HookPhase) -> &[Hook] {
        self.phases.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Run every enabled hook of `ctx.phase`.
    pub fn execute(&self, ctx: &HookExecutionContext) -> PhaseOutcome {
        let mut results = Vec::new();

        for hook in self.hooks(ctx.phase) {
            if !hook.enabled {
                continue;
            }

            let start = Instant::now();
            let mut result = hook.run(ctx);
            let elapsed_us = start.elapsed().as_micros() as u64;

            if result.blocked && result.success {
                log::warn!("hook {} reported blocked with success; treating as failure", hook.id);
                result.success = false;
            }

            let halts = hook.mode == HookMode::Blocking && result.blocked;
            if halts {
                log::error!(">>> HOOK BLOCKED [{}]: {} ({})", ctx.phase, hook.id, result.message);
            } else if !result.success {
                log::warn!("hook {} reported failure: {}", hook.id, result.message);
            }

            let summary = format!("{}: {}", hook.id, result.message);
            results.push(HookRecord {
                hook_id: hook.id.clone(),
                mode: hook.mode,
                priority: hook.priority,
                result,
                elapsed_us,
            });

            if halts {
                return PhaseOutcome::Blocked {
                    blocked_by: hook.id.clone(),
                    summary,
                    results,
                };
            }
        }

        PhaseOutcome::Completed { results }
    }
}
