// ─────────────────────────────────────────────────────────────────────
// MillGuard — Material Store
// ─────────────────────────────────────────────────────────────────────
//! Lookup of workpiece materials by id.
//!
//! The in-memory backend ships one reference grade per ISO group and is
//! enough for tests and small deployments. A plant database can be
//! plugged in through `MaterialStore` or a closure via
//! `ExternalMaterials`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use millguard_physics::{IsoGroup, ReferenceCoefficients};

/// A workpiece material the kernel can resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: String,
    pub name: String,
    pub iso_group: IsoGroup,
    pub coefficients: ReferenceCoefficients,
}

impl MaterialRecord {
    /// Record carrying the reference coefficients of its ISO group.
    pub fn reference(id: &str, name: &str, iso_group: IsoGroup) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            iso_group,
            coefficients: iso_group.reference(),
        }
    }
}

/// Trait for material lookup backends.
pub trait MaterialStore: Send + Sync {
    /// `None` when the id is unknown.
    fn get(&self, id: &str) -> Option<MaterialRecord>;
}

/// In-memory material table keyed by id.
pub struct InMemoryMaterials {
    records: HashMap<String, MaterialRecord>,
}

impl Default for InMemoryMaterials {
    fn default() -> Self {
        let seed = [
            MaterialRecord::reference("C45", "Carbon steel C45", IsoGroup::P),
            MaterialRecord::reference("42CrMo4", "Alloy steel 42CrMo4", IsoGroup::P),
            MaterialRecord::reference("X5CrNi18-10", "Austenitic stainless 1.4301", IsoGroup::M),
            MaterialRecord::reference("EN-GJL-250", "Grey cast iron GJL-250", IsoGroup::K),
            MaterialRecord::reference("AlSi10Mg", "Cast aluminium AlSi10Mg", IsoGroup::N),
            MaterialRecord::reference("Ti6Al4V", "Titanium alloy Ti-6Al-4V", IsoGroup::S),
            MaterialRecord::reference("Inconel718", "Nickel superalloy 718", IsoGroup::S),
            MaterialRecord::reference("X153CrMoV12", "Hardened tool steel 60 HRC", IsoGroup::H),
        ];
        Self::with_records(seed)
    }
}

impl InMemoryMaterials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding exactly `records`.
    pub fn with_records(records: impl IntoIterator<Item = MaterialRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Insert or replace a record.
    pub fn add_record(&mut self, record: MaterialRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MaterialStore for InMemoryMaterials {
    fn get(&self, id: &str) -> Option<MaterialRecord> {
        self.records.get(id).cloned()
    }
}

type LookupFn = Box<dyn Fn(&str) -> Option<MaterialRecord> + Send + Sync>;

/// Material store that delegates to a closure.
pub struct ExternalMaterials {
    lookup_fn: LookupFn,
}

impl ExternalMaterials {
    pub fn new(lookup_fn: impl Fn(&str) -> Option<MaterialRecord> + Send + Sync + 'static) -> Self {
        Self {
            lookup_fn: Box::new(lookup_fn),
        }
    }
}

impl MaterialStore for ExternalMaterials {
    fn get(&self, id: &str) -> Option<MaterialRecord> {
        (self.lookup_fn)(id)
    }
}
