//! Read-only flow-field queries consumed by wells and by particle tracing.

use ndarray::Array1;

/// A solved flow field that can be queried for heads and seepage
/// velocities.
///
/// Wells use the head query to express boundary conditions just outside
/// their screen; the streamline termination rule uses the velocity query to
/// finish a captured particle's path. Implementations must be pure with
/// respect to these calls so they can be evaluated concurrently.
pub trait FlowField {
    /// Head at (x, y) in each of the requested layers.
    fn head(&self, x: f64, y: f64, layers: &[usize]) -> Array1<f64>;

    /// Seepage velocity (vx, vy, vz) at a point in three dimensions.
    fn velocity(&self, x: f64, y: f64, z: f64) -> [f64; 3];
}
