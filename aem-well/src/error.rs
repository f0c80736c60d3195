//! Error types for aquifer and well construction and for the linear solve.

use thiserror::Error;

/// Errors produced by this crate.
///
/// Configuration problems are rejected eagerly, at construction or at
/// `initialize` time, never silently tolerated. Contract violations such as
/// querying a well before it has been initialized or solved are *not*
/// represented here: those panic, because they indicate a sequencing bug in
/// the calling code rather than bad user input.
#[derive(Debug, Clone, Error)]
pub enum AemError {
    /// Invalid well configuration (non-positive radius, negative skin
    /// resistance, empty or duplicated screen list).
    #[error("invalid well configuration: {0}")]
    InvalidWell(String),

    /// Invalid aquifer definition (non-positive transmissivity or
    /// thickness, non-descending layer stack, bad resistance).
    #[error("invalid aquifer definition: {0}")]
    InvalidAquifer(String),

    /// A screened-layer index does not exist in the bound aquifer region.
    #[error("layer index {layer} out of range for aquifer region with {naq} layers")]
    LayerOutOfRange {
        /// Offending layer index.
        layer: usize,
        /// Number of layers in the region.
        naq: usize,
    },

    /// The global system matrix is singular or nearly so.
    #[error("singular system matrix (pivot {0} below tolerance)")]
    SingularMatrix(usize),

    /// The model cannot be assembled (e.g. a head-type condition with no
    /// reference point, or a reference constant in a leaky system).
    #[error("model assembly failed: {0}")]
    Assembly(String),
}
