//! Modified Bessel functions of the second kind.
//!
//! Thin wrappers around the Cephes translations in `spec_math`, exposed as
//! free functions so callers do not need the `Bessel` trait in scope.
//! K0 and K1 are the radial building blocks of every leaky-aquifer
//! influence function: a mode with decay length λ contributes K0(r/λ) to
//! the potential and K1(r/λ) to the specific discharge.
//!
//! Both functions require a strictly positive argument. Callers are
//! expected to clamp their radii before evaluating (the well kernels clamp
//! to the well radius), so a non-positive argument here is an internal
//! invariant failure, not a recoverable error.

use spec_math::Bessel;

/// Modified Bessel function of the second kind, order zero, K0(x).
///
/// Requires `x > 0`; K0 diverges logarithmically as x → 0.
#[inline]
pub fn k0(x: f64) -> f64 {
    debug_assert!(x > 0.0, "K0 argument must be positive, got {x}");
    x.bessel_k0()
}

/// Modified Bessel function of the second kind, order one, K1(x).
///
/// Requires `x > 0`; K1 diverges as 1/x as x → 0.
#[inline]
pub fn k1(x: f64) -> f64 {
    debug_assert!(x > 0.0, "K1 argument must be positive, got {x}");
    x.bessel_k1()
}

/// K0 evaluated element-wise over a slice of arguments.
pub fn k0_slice(xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| k0(x)).collect()
}

/// K1 evaluated element-wise over a slice of arguments.
pub fn k1_slice(xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| k1(x)).collect()
}
