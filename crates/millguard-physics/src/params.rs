// ─────────────────────────────────────────────────────────────────────
// MillGuard — Reference Parameters
// ─────────────────────────────────────────────────────────────────────
//! Validation ceilings shared by the models, and reference cutting
//! coefficients per ISO 513 material group.
//!
//! Coefficient sources: König & Klocke, "Fertigungsverfahren 1" (kc1.1,
//! mc); Taylor constants are representative uncoated-carbide values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation ceiling for cutting speed (m/min).
pub const MAX_CUTTING_SPEED: f64 = 2000.0;
/// Validation ceiling for feed per tooth / feed per revolution (mm).
pub const MAX_FEED: f64 = 10.0;
/// Validation ceiling for depth of cut (mm).
pub const MAX_DEPTH_OF_CUT: f64 = 100.0;
/// Validation ceiling for tool diameter (mm).
pub const MAX_TOOL_DIAMETER: f64 = 500.0;
/// Validation ceiling for the number of cutting edges.
pub const MAX_TEETH: f64 = 100.0;
/// Reference rake angle of the kc1.1 tables (deg).
pub const REFERENCE_RAKE_ANGLE_DEG: f64 = 6.0;
/// Room temperature used by temperature-dependent models (°C).
pub const ROOM_TEMPERATURE_C: f64 = 20.0;

/// ISO 513 workpiece material group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsoGroup {
    /// Steels.
    P,
    /// Stainless steels.
    M,
    /// Cast iron.
    K,
    /// Non-ferrous metals.
    N,
    /// Heat-resistant superalloys and titanium.
    S,
    /// Hardened steels.
    H,
}

impl IsoGroup {
    pub const ALL: [IsoGroup; 6] = [
        IsoGroup::P,
        IsoGroup::M,
        IsoGroup::K,
        IsoGroup::N,
        IsoGroup::S,
        IsoGroup::H,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            IsoGroup::P => "steels",
            IsoGroup::M => "stainless steels",
            IsoGroup::K => "cast iron",
            IsoGroup::N => "non-ferrous metals",
            IsoGroup::S => "superalloys and titanium",
            IsoGroup::H => "hardened steels",
        }
    }

    /// Reference coefficients for this group.
    pub fn reference(&self) -> ReferenceCoefficients {
        REFERENCE_TABLE
            .iter()
            .find(|(g, _)| g == self)
            .map(|(_, c)| *c)
            .unwrap_or(ReferenceCoefficients::STEEL)
    }
}

impl fmt::Display for IsoGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            IsoGroup::P => "P",
            IsoGroup::M => "M",
            IsoGroup::K => "K",
            IsoGroup::N => "N",
            IsoGroup::S => "S",
            IsoGroup::H => "H",
        };
        f.write_str(letter)
    }
}

/// Kienzle and Taylor coefficients representative of a material group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCoefficients {
    /// Specific cutting force for h = b = 1 mm (N/mm²).
    pub kc11: f64,
    /// Kienzle exponent.
    pub mc: f64,
    /// Taylor constant: cutting speed for 1 min tool life (m/min).
    pub taylor_c: f64,
    /// Taylor exponent.
    pub taylor_n: f64,
}

/// Coefficient names material-backed model inputs refer to.
pub const COEFFICIENT_KC11: &str = "kc11";
pub const COEFFICIENT_MC: &str = "mc";
pub const COEFFICIENT_TAYLOR_C: &str = "taylor_c";
pub const COEFFICIENT_TAYLOR_N: &str = "taylor_n";

impl ReferenceCoefficients {
    /// Coefficient by name; `None` for an unknown name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            COEFFICIENT_KC11 => Some(self.kc11),
            COEFFICIENT_MC => Some(self.mc),
            COEFFICIENT_TAYLOR_C => Some(self.taylor_c),
            COEFFICIENT_TAYLOR_N => Some(self.taylor_n),
            _ => None,
        }
    }

    const STEEL: ReferenceCoefficients = ReferenceCoefficients {
        kc11: 1700.0,
        mc: 0.25,
        taylor_c: 350.0,
        taylor_n: 0.25,
    };
}

const REFERENCE_TABLE: [(IsoGroup, ReferenceCoefficients); 6] = [
    (IsoGroup::P, ReferenceCoefficients::STEEL),
    (
        IsoGroup::M,
        ReferenceCoefficients {
            kc11: 2100.0,
            mc: 0.21,
            taylor_c: 250.0,
            taylor_n: 0.22,
        },
    ),
    (
        IsoGroup::K,
        ReferenceCoefficients {
            kc11: 1100.0,
            mc: 0.28,
            taylor_c: 300.0,
            taylor_n: 0.25,
        },
    ),
    (
        IsoGroup::N,
        ReferenceCoefficients {
            kc11: 700.0,
            mc: 0.25,
            taylor_c: 1800.0,
            taylor_n: 0.35,
        },
    ),
    (
        IsoGroup::S,
        ReferenceCoefficients {
            kc11: 2600.0,
            mc: 0.24,
            taylor_c: 80.0,
            taylor_n: 0.18,
        },
    ),
    (
        IsoGroup::H,
        ReferenceCoefficients {
            kc11: 3000.0,
            mc: 0.22,
            taylor_c: 120.0,
            taylor_n: 0.20,
        },
    ),
];
