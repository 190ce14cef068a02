// ─────────────────────────────────────────────────────────────────────
// MillGuard — Safety Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, the algorithm contract, and the
//! error hierarchy for the MillGuard machining safety kernel.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod score;
pub mod validation;

pub use algorithm::{Algorithm, AlgorithmMeta, Domain, FieldSpec, ModelOutput, SafetyClass};
pub use config::{MillGuardConfig, OutputLimits, ScoreWeights};
pub use error::{MillGuardError, MillGuardResult};
pub use score::{QualitySignals, SafetyScore, ScoreComponent, ScoreValue};
pub use validation::{IssueCollector, Severity, ValidationIssue, ValidationResult};
