// ─────────────────────────────────────────────────────────────────────
// MillGuard — Output Schema Enforcement
// ─────────────────────────────────────────────────────────────────────
//! Last line of defence before a report leaves the kernel.
//!
//! The report is checked in its serialised form, exactly as a caller
//! would receive it. Every violation is collected; nothing is clamped
//! or repaired. A non-finite float serialises to `null` and is rejected
//! as "not a finite number".

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use millguard_types::{AlgorithmMeta, OutputLimits};

/// Top-level keys of a report. No others are allowed.
pub const REPORT_FIELDS: [&str; 6] = [
    "results",
    "safety_score",
    "material_id",
    "operation",
    "meta",
    "warnings",
];

/// Keys of the report metadata block.
pub const META_FIELDS: [&str; 3] = ["model", "version", "timestamp"];

/// Lower end of a numeric field's admissible interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Minimum {
    Exclusive(f64),
    Inclusive(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldBound {
    pub minimum: Minimum,
    pub maximum: f64,
}

impl FieldBound {
    /// `0 < x <= maximum`.
    pub fn positive(maximum: f64) -> Self {
        Self {
            minimum: Minimum::Exclusive(0.0),
            maximum,
        }
    }

    /// `lo <= x <= hi`.
    pub fn closed(lo: f64, hi: f64) -> Self {
        Self {
            minimum: Minimum::Inclusive(lo),
            maximum: hi,
        }
    }

    fn check(&self, x: f64) -> Option<String> {
        match self.minimum {
            Minimum::Exclusive(lo) if x <= lo => return Some(format!("must be > {lo}, got {x}")),
            Minimum::Inclusive(lo) if x < lo => return Some(format!("must be >= {lo}, got {x}")),
            _ => {}
        }
        (x > self.maximum).then(|| format!("must be <= {}, got {x}", self.maximum))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaViolation {
    /// JSON path of the offending field, e.g. `results.cutting_force`.
    pub path: String,
    pub message: String,
}

/// Every reason a report was refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRejection {
    pub violations: Vec<SchemaViolation>,
}

impl fmt::Display for SchemaRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect();
        write!(f, "output schema violated: {}", parts.join("; "))
    }
}

/// Bounds for every output field any registered model may emit.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    bounds: BTreeMap<String, FieldBound>,
}

impl OutputSchema {
    /// Schema for the built-in models, ceilings taken from `limits`.
    pub fn from_limits(limits: &OutputLimits) -> Self {
        let table = [
            // kinematics
            ("cutting_speed", FieldBound::positive(limits.max_cutting_speed)),
            ("feed_per_tooth", FieldBound::positive(limits.max_feed_per_tooth)),
            ("depth_of_cut", FieldBound::positive(limits.max_depth_of_cut)),
            ("width_of_cut", FieldBound::positive(500.0)),
            ("spindle_speed", FieldBound::positive(limits.max_spindle_speed)),
            ("feed_rate", FieldBound::positive(200_000.0)),
            ("material_removal_rate", FieldBound::positive(10_000.0)),
            // force
            ("chip_thickness", FieldBound::positive(limits.max_feed_per_tooth)),
            ("chip_width", FieldBound::positive(1000.0)),
            ("specific_cutting_force", FieldBound::positive(50_000.0)),
            ("cutting_force", FieldBound::positive(limits.max_force)),
            ("cutting_power", FieldBound::positive(1000.0)),
            // tool life
            ("tool_life", FieldBound::positive(limits.max_tool_life)),
            ("reference_life", FieldBound::positive(limits.max_tool_life)),
            ("speed_for_reference_life", FieldBound::positive(limits.max_cutting_speed)),
            // material
            ("flow_stress", FieldBound::positive(10_000.0)),
            ("strain_hardening_stress", FieldBound::positive(10_000.0)),
            ("strain_rate_factor", FieldBound::positive(100.0)),
            ("thermal_softening_factor", FieldBound::closed(0.0, 1.0)),
            ("homologous_temperature", FieldBound::closed(0.0, 1.0)),
            // thermal
            ("thermal_number", FieldBound::positive(1.0e6)),
            ("temperature_rise", FieldBound::positive(2000.0)),
            ("tool_temperature", FieldBound::closed(-273.15, 2500.0)),
            // stability
            ("critical_depth", FieldBound::positive(1000.0)),
            ("stable_spindle_speed", FieldBound::positive(limits.max_spindle_speed)),
            ("chatter_frequency", FieldBound::positive(50_000.0)),
            ("stability_margin", FieldBound::positive(1.0e6)),
            // surface
            ("arithmetic_roughness", FieldBound::positive(1000.0)),
            ("peak_to_valley_roughness", FieldBound::positive(1000.0)),
        ];
        Self {
            bounds: table
                .into_iter()
                .map(|(name, bound)| (name.to_string(), bound))
                .collect(),
        }
    }

    /// Add or replace the bound of one field.
    pub fn with_bound(mut self, field: impl Into<String>, bound: FieldBound) -> Self {
        self.bounds.insert(field.into(), bound);
        self
    }

    pub fn bound(&self, field: &str) -> Option<&FieldBound> {
        self.bounds.get(field)
    }

    /// True if every declared output of `meta` has a bound.
    pub fn covers(&self, meta: &AlgorithmMeta) -> bool {
        meta.outputs.iter().all(|o| self.bounds.contains_key(&o.name))
    }

    /// Check a serialised report produced by the model `meta`.
    pub fn enforce(&self, report: &Value, meta: &AlgorithmMeta) -> Result<(), SchemaRejection> {
        let mut violations = Vec::new();
        let mut push = |path: &str, message: String| {
            violations.push(SchemaViolation {
                path: path.to_string(),
                message,
            })
        };

        let Some(obj) = report.as_object() else {
            push("$", "report must be a JSON object".to_string());
            return Err(SchemaRejection { violations });
        };

        for key in obj.keys() {
            if !REPORT_FIELDS.contains(&key.as_str()) {
                push(key, "field is not part of the report schema".to_string());
            }
        }
        for key in REPORT_FIELDS {
            if !obj.contains_key(key) {
                push(key, "required field is missing".to_string());
            }
        }

        match obj.get("results") {
            Some(Value::Object(results)) => self.check_results(results, meta, &mut push),
            Some(_) => push("results", "must be an object".to_string()),
            None => {}
        }

        if let Some(v) = obj.get("safety_score") {
            match v.as_f64() {
                Some(s) if s.is_finite() && (0.0..=1.0).contains(&s) => {}
                Some(s) => push("safety_score", format!("must be in [0, 1], got {s}")),
                None => push("safety_score", "must be a finite number".to_string()),
            }
        }

        match obj.get("material_id") {
            Some(Value::Null) | None => {}
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(_) => push("material_id", "must be null or a non-empty string".to_string()),
        }

        match obj.get("operation") {
            Some(Value::String(s)) if !s.is_empty() => {}
            None => {}
            Some(_) => push("operation", "must be a non-empty string".to_string()),
        }

        match obj.get("warnings") {
            Some(Value::Array(items)) => {
                if items.iter().any(|w| !w.is_string()) {
                    push("warnings", "must contain only strings".to_string());
                }
            }
            Some(_) => push("warnings", "must be an array of strings".to_string()),
            None => {}
        }

        match obj.get("meta") {
            Some(Value::Object(m)) => check_meta(m, &mut push),
            Some(_) => push("meta", "must be an object".to_string()),
            None => {}
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaRejection { violations })
        }
    }

    fn check_results(
        &self,
        results: &Map<String, Value>,
        meta: &AlgorithmMeta,
        push: &mut impl FnMut(&str, String),
    ) {
        for (name, value) in results {
            let path = format!("results.{name}");
            if meta.output(name).is_none() {
                push(&path, format!("'{name}' is not an output of {}", meta.id));
                continue;
            }
            let Some(bound) = self.bound(name) else {
                push(&path, "no schema bound for this field".to_string());
                continue;
            };
            match value.as_f64() {
                Some(x) if x.is_finite() => {
                    if let Some(message) = bound.check(x) {
                        push(&path, message);
                    }
                }
                _ => push(&path, "must be a finite number".to_string()),
            }
        }
        for spec in meta.outputs.iter().filter(|o| o.required) {
            if !results.contains_key(&spec.name) {
                push(
                    &format!("results.{}", spec.name),
                    "required field is missing".to_string(),
                );
            }
        }
    }
}

fn check_meta(meta: &Map<String, Value>, push: &mut impl FnMut(&str, String)) {
    for key in meta.keys() {
        if !META_FIELDS.contains(&key.as_str()) {
            push(&format!("meta.{key}"), "field is not part of the report schema".to_string());
        }
    }
    for key in META_FIELDS {
        let path = format!("meta.{key}");
        match meta.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                if key == "timestamp" && DateTime::parse_from_rfc3339(s).is_err() {
                    push(&path, format!("'{s}' is not an RFC 3339 timestamp"));
                }
            }
            Some(_) => push(&path, "must be a non-empty string".to_string()),
            None => push(&path, "required field is missing".to_string()),
        }
    }
}
