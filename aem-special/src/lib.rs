//! Special functions and analytical reference solutions for layered
//! groundwater flow.
//!
//! This crate is the leaf of the workspace: it wraps the modified Bessel
//! functions the influence kernels are built on, and provides the
//! closed-form steady-state well solutions (Thiem, De Glee) that the
//! `aem-well` test suites validate against.

pub mod analytical;
pub mod bessel;

pub use analytical::{deglee_drawdown, thiem_head, two_aquifer_leakage_factor};
pub use bessel::{k0, k0_slice, k1, k1_slice};
