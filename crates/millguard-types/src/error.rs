// ─────────────────────────────────────────────────────────────────────
// MillGuard — Safety Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all MillGuard kernel failures.
///
/// Validation failures, safety blocks and schema rejections are ordinary
/// outcomes and travel as typed results, not through this enum.
#[derive(Error, Debug)]
pub enum MillGuardError {
    /// Invalid runtime configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An algorithm or hook was registered twice under the same id.
    #[error("registration error: {0}")]
    Registration(String),

    /// A caller request could not be decoded into a calculation request.
    #[error("input error: {0}")]
    Input(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type MillGuardResult<T> = Result<T, MillGuardError>;
