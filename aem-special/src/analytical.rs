//! Closed-form steady-state well solutions.
//!
//! These are the textbook profiles the numerical kernels must reproduce:
//!
//! - **Thiem** (confined aquifer): logarithmic cone of depression,
//!   `h(r) - h(r_ref) = Q/(2πT) · ln(r/r_ref)`.
//! - **De Glee** (semi-confined aquifer, leakage through a resistive top):
//!   drawdown `s(r) = Q/(2πT) · K0(r/λ)` with leakage factor `λ = √(cT)`.
//!
//! Sign convention: positive `q` is extraction, so the Thiem head difference
//! is positive for `r > r_ref` chosen near the well, and the De Glee
//! drawdown is positive everywhere.
//!
//! References: Verruijt, "Theory of Groundwater Flow"; Bruggeman,
//! "Analytical Solutions of Geohydrological Problems".

use crate::bessel::k0;
use std::f64::consts::PI;

/// Thiem head difference `h(r) - h(r_ref)` for a well with discharge `q`
/// in a confined aquifer of transmissivity `transmissivity`.
pub fn thiem_head(q: f64, transmissivity: f64, r: f64, r_ref: f64) -> f64 {
    q / (2.0 * PI * transmissivity) * (r / r_ref).ln()
}

/// De Glee drawdown at distance `r` from a well with discharge `q` in a
/// semi-confined aquifer with transmissivity `transmissivity` and leakage
/// factor `lab`.
pub fn deglee_drawdown(q: f64, transmissivity: f64, lab: f64, r: f64) -> f64 {
    q / (2.0 * PI * transmissivity) * k0(r / lab)
}

/// Leakage factor of a two-aquifer confined system separated by an aquitard
/// of resistance `c`: `λ = √(c·t1·t2/(t1+t2))`.
///
/// This is the decay length of the single non-trivial relaxation mode of
/// the pair; the other mode is the non-decaying (logarithmic) one.
pub fn two_aquifer_leakage_factor(t1: f64, t2: f64, c: f64) -> f64 {
    (c * t1 * t2 / (t1 + t2)).sqrt()
}
