//! Analytic-element wells in multi-layer leaky aquifer systems.
//!
//! The crate models steady two-dimensional groundwater flow with the
//! analytic element method. An [`AquiferSystem`](aquifer::AquiferSystem)
//! describes one or more regions of stacked aquifer layers separated by
//! leaky aquitards; each region's leakage eigendecomposition turns the
//! coupled layer equations into independent modes with closed-form decay
//! lengths. A [`Well`](well::Well) is a cylindrical sink screened in one
//! or more layers, operating either at specified total discharge or at
//! specified bore head. The [`Model`](model::Model) assembles the
//! boundary conditions of all wells into one dense linear system, solves
//! it, and then answers head, discharge, and velocity queries anywhere in
//! the plane. Streamlines can be traced through the solved field and
//! terminated at capturing wells, which is how capture zones are
//! delineated.

pub mod aquifer;
pub mod equation;
pub mod error;
pub mod field;
pub mod model;
pub mod solver;
pub mod trace;
pub mod well;

pub use aquifer::{AquiferRegion, AquiferSystem, RegionId};
pub use equation::{EquationRow, EquationSystem};
pub use error::AemError;
pub use field::FlowField;
pub use model::{Model, ReferencePoint};
pub use trace::{
    CaptureZoneOptions, EulerTracer, ParticleState, Termination, TracePhase, TracedPath, Tracer,
};
pub use well::{DischargeInfluence, Well, WellConfig, WellMode};
