// ─────────────────────────────────────────────────────────────────────
// MillGuard — Machining Physics Models
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Physical models of the cutting process, each behind the uniform
//! `Algorithm` contract: kinematics, Kienzle force, Taylor tool life,
//! Johnson-Cook flow stress, Cook temperature, chatter stability limit,
//! and kinematic surface roughness.
//!
//! Every model is a stateless unit struct holding only its descriptor;
//! `calculate` is pure and safe to call from any number of threads.

pub mod johnson_cook;
pub mod kienzle;
pub mod kinematics;
pub mod params;
pub mod stability;
pub mod surface;
pub mod taylor;
pub mod thermal;

pub use johnson_cook::JohnsonCookFlowStress;
pub use kienzle::KienzleForce;
pub use kinematics::MillingParameters;
pub use params::{IsoGroup, ReferenceCoefficients};
pub use stability::StabilityLobeLimit;
pub use surface::SurfaceRoughness;
pub use taylor::TaylorToolLife;
pub use thermal::CookTemperatureRise;
