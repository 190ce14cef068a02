// ─────────────────────────────────────────────────────────────────────
// MillGuard — Decision Audit Trail
// ─────────────────────────────────────────────────────────────────────
//! Every pipeline decision (completed, invalid, blocked) is written to
//! an `AuditSink`. Entries are append-only.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDecision {
    Completed,
    Invalid,
    Blocked,
}

/// One recorded decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub algorithm_id: String,
    pub operation: String,
    pub decision: AuditDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
}

impl AuditEntry {
    pub fn new(algorithm_id: &str, operation: &str, decision: AuditDecision) -> Self {
        Self {
            timestamp: Utc::now(),
            algorithm_id: algorithm_id.to_string(),
            operation: operation.to_string(),
            decision,
            blocked_by: None,
            reason: None,
            safety_score: None,
        }
    }

    pub fn with_block(mut self, blocked_by: &str, reason: &str) -> Self {
        self.blocked_by = Some(blocked_by.to_string());
        self.reason = Some(reason.to_string());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.safety_score = score;
        self
    }
}

/// Destination of audit entries. Must tolerate concurrent writers.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Writes each entry to the `log` facade under the `millguard::audit`
/// target.
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, entry: AuditEntry) {
        match entry.decision {
            AuditDecision::Blocked => log::warn!(
                target: "millguard::audit",
                "{} {} BLOCKED by {}: {}",
                entry.algorithm_id,
                entry.operation,
                entry.blocked_by.as_deref().unwrap_or("-"),
                entry.reason.as_deref().unwrap_or("-")
            ),
            AuditDecision::Invalid => log::info!(
                target: "millguard::audit",
                "{} {} INVALID: {}",
                entry.algorithm_id,
                entry.operation,
                entry.reason.as_deref().unwrap_or("-")
            ),
            AuditDecision::Completed => log::info!(
                target: "millguard::audit",
                "{} {} COMPLETED S={:.4}",
                entry.algorithm_id,
                entry.operation,
                entry.safety_score.unwrap_or(f64::NAN)
            ),
        }
    }
}

/// Unbounded in-memory trail, for tests and for callers that ship
/// entries elsewhere in batches.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all entries in write order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_log_appends_in_order() {
        let log = MemoryAuditLog::new();
        log.record(AuditEntry::new("a", "op", AuditDecision::Completed).with_score(Some(0.9)));
        log.record(AuditEntry::new("b", "op", AuditDecision::Blocked).with_block("gate", "low"));
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].algorithm_id, "a");
        assert_eq!(entries[1].blocked_by.as_deref(), Some("gate"));
    }

    #[test]
    fn test_concurrent_writers() {
        let log = Arc::new(MemoryAuditLog::new());
        std::thread::scope(|s| {
            for t in 0..4 {
                let log = Arc::clone(&log);
                s.spawn(move || {
                    for _ in 0..25 {
                        log.record(AuditEntry::new(&format!("t{t}"), "op", AuditDecision::Invalid));
                    }
                });
            }
        });
        assert_eq!(log.len(), 100);
    }

    #[test]
    fn test_entry_json_omits_absent_fields() {
        let entry = AuditEntry::new("m", "op", AuditDecision::Invalid).with_reason("bad input");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["decision"], "invalid");
        assert!(json.get("blocked_by").is_none());
        assert_eq!(json["reason"], "bad input");
    }

    #[test]
    fn test_log_sink_accepts_all_decisions() {
        let sink = LogAuditSink;
        sink.record(AuditEntry::new("m", "op", AuditDecision::Completed));
        sink.record(AuditEntry::new("m", "op", AuditDecision::Invalid));
        sink.record(AuditEntry::new("m", "op", AuditDecision::Blocked));
    }
}
