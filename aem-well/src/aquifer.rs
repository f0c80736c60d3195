//! Multi-layer aquifer regions and planar region lookup.
//!
//! A region is a vertical stack of aquifer layers exchanging water through
//! resistive aquitards. Steady multi-layer flow separates into relaxation
//! modes: writing the layer potentials as Φ, the governing equations are
//! ∇²Φ = A·Φ with the leakage matrix A built from the aquitard resistances
//! and layer transmissivities. A is similar to a symmetric matrix under the
//! scaling D = diag(1/√T), so its eigen-decomposition is computed with a
//! cyclic Jacobi sweep on S = D·A·D⁻¹. Each eigenvalue w gives a mode with
//! decay length λ = 1/√w; a confined system (infinite top resistance) has a
//! zero eigenvalue whose mode does not decay and carries the logarithmic
//! far-field of wells.
//!
//! The `coef` matrix maps a unit sink in a given layer onto mode strengths
//! and `eigvec` maps mode values back onto layer potentials. They satisfy
//! `eigvec · coef[l, :]ᵀ = e_l`, which is what makes an influence function
//! expressed per mode reproduce a sink in exactly one layer.

use ndarray::{Array1, Array2};

use crate::error::AemError;

/// Handle to a region inside an [`AquiferSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionId(pub usize);

/// One aquifer region: an immutable stack of layers with its mode
/// decomposition precomputed at construction.
#[derive(Debug, Clone)]
pub struct AquiferRegion {
    /// Number of aquifer layers.
    pub naq: usize,
    /// Transmissivity per layer.
    pub t: Array1<f64>,
    /// Saturated thickness per layer.
    pub haq: Array1<f64>,
    /// Bottom elevation per layer (descending stack).
    pub zaqbot: Array1<f64>,
    /// Porosity per layer (used for seepage velocities).
    pub porosity: Array1<f64>,
    /// Decay length per relaxation mode; `lab[0]` is infinite when `ilap`.
    pub lab: Array1<f64>,
    /// True when the top is confined: mode 0 does not decay and wells carry
    /// a logarithmic far field in that mode.
    pub ilap: bool,
    /// Sink-to-mode coefficients, indexed (layer, mode).
    pub coef: Array2<f64>,
    /// Mode-to-layer projection, indexed (layer, mode).
    pub eigvec: Array2<f64>,
}

impl AquiferRegion {
    /// Build a region from per-layer data and aquitard resistances.
    ///
    /// `c[i]` is the resistance of the aquitard on top of layer `i`;
    /// `c[0] = f64::INFINITY` declares a confined top. Layers are stacked
    /// contiguously downward from `ztop` (the aquitards are resistance-only
    /// and carry no thickness of their own).
    pub fn new(
        t: &[f64],
        haq: &[f64],
        ztop: f64,
        porosity: &[f64],
        c: &[f64],
    ) -> Result<Self, AemError> {
        let naq = t.len();
        if naq == 0 {
            return Err(AemError::InvalidAquifer("no layers".into()));
        }
        if haq.len() != naq || porosity.len() != naq || c.len() != naq {
            return Err(AemError::InvalidAquifer(format!(
                "per-layer arrays must all have length {naq}"
            )));
        }
        for (i, &ti) in t.iter().enumerate() {
            if !(ti > 0.0) {
                return Err(AemError::InvalidAquifer(format!(
                    "transmissivity of layer {i} must be positive, got {ti}"
                )));
            }
        }
        for (i, &hi) in haq.iter().enumerate() {
            if !(hi > 0.0) {
                return Err(AemError::InvalidAquifer(format!(
                    "thickness of layer {i} must be positive, got {hi}"
                )));
            }
        }
        for (i, &ni) in porosity.iter().enumerate() {
            if !(ni > 0.0 && ni <= 1.0) {
                return Err(AemError::InvalidAquifer(format!(
                    "porosity of layer {i} must lie in (0, 1], got {ni}"
                )));
            }
        }
        if !(c[0] > 0.0) {
            return Err(AemError::InvalidAquifer(format!(
                "top resistance must be positive or infinite, got {}",
                c[0]
            )));
        }
        for (i, &ci) in c.iter().enumerate().skip(1) {
            if !(ci > 0.0 && ci.is_finite()) {
                return Err(AemError::InvalidAquifer(format!(
                    "interior resistance {i} must be positive and finite, got {ci}"
                )));
            }
        }

        let ilap = c[0].is_infinite();

        // Symmetrized leakage matrix S = D·A·D⁻¹ with D = diag(1/√T).
        let mut s = Array2::zeros((naq, naq));
        for i in 0..naq {
            let c_above = c[i];
            let c_below = if i + 1 < naq { c[i + 1] } else { f64::INFINITY };
            s[[i, i]] = (1.0 / c_above + 1.0 / c_below) / t[i];
            if i + 1 < naq {
                let off = -1.0 / (c[i + 1] * (t[i] * t[i + 1]).sqrt());
                s[[i, i + 1]] = off;
                s[[i + 1, i]] = off;
            }
        }

        let (w, u) = jacobi_eigen(s);

        // Confined systems carry their zero eigenvalue as mode 0; every
        // other mode must have a strictly positive eigenvalue.
        let first_decaying = usize::from(ilap);
        for m in first_decaying..naq {
            if !(w[m] > 0.0) {
                return Err(AemError::InvalidAquifer(format!(
                    "relaxation mode {m} has non-positive eigenvalue {}",
                    w[m]
                )));
            }
        }

        let mut lab = Array1::zeros(naq);
        if ilap {
            lab[0] = f64::INFINITY;
        }
        for m in first_decaying..naq {
            lab[m] = 1.0 / w[m].sqrt();
        }

        let mut eigvec = Array2::zeros((naq, naq));
        let mut coef = Array2::zeros((naq, naq));
        for i in 0..naq {
            let sq = t[i].sqrt();
            for m in 0..naq {
                eigvec[[i, m]] = sq * u[[i, m]];
                coef[[i, m]] = u[[i, m]] / sq;
            }
        }

        let mut zaqbot = Array1::zeros(naq);
        let mut z = ztop;
        for i in 0..naq {
            z -= haq[i];
            zaqbot[i] = z;
        }

        Ok(Self {
            naq,
            t: Array1::from(t.to_vec()),
            haq: Array1::from(haq.to_vec()),
            zaqbot,
            porosity: Array1::from(porosity.to_vec()),
            lab,
            ilap,
            coef,
            eigvec,
        })
    }

    /// Convenience constructor for a single confined layer.
    pub fn confined_single(t: f64, haq: f64, ztop: f64, porosity: f64) -> Result<Self, AemError> {
        Self::new(&[t], &[haq], ztop, &[porosity], &[f64::INFINITY])
    }

    /// Convenience constructor for a single semi-confined layer below an
    /// aquitard of resistance `c`.
    pub fn leaky_single(
        t: f64,
        haq: f64,
        ztop: f64,
        porosity: f64,
        c: f64,
    ) -> Result<Self, AemError> {
        Self::new(&[t], &[haq], ztop, &[porosity], &[c])
    }

    /// Index of the layer containing elevation `z`, if any.
    pub fn layer_of(&self, z: f64) -> Option<usize> {
        for i in 0..self.naq {
            let bot = self.zaqbot[i];
            if z >= bot && z <= bot + self.haq[i] {
                return Some(i);
            }
        }
        None
    }

    /// Elevation of the middle of layer `layer`.
    pub fn layer_middle(&self, layer: usize) -> f64 {
        self.zaqbot[layer] + 0.5 * self.haq[layer]
    }
}

/// Planar domains attached to the regions of an [`AquiferSystem`].
#[derive(Debug, Clone)]
enum Domain {
    /// The unbounded default region.
    Background,
    /// A circular inhomogeneity overriding the background.
    Circle { x: f64, y: f64, radius: f64 },
}

/// An ordered set of aquifer regions with planar lookup.
///
/// Region 0 is the unbounded background; circular inhomogeneities may be
/// layered on top, with later additions taking precedence where they
/// overlap.
#[derive(Debug, Clone)]
pub struct AquiferSystem {
    regions: Vec<AquiferRegion>,
    domains: Vec<Domain>,
}

impl AquiferSystem {
    /// A system consisting of a single unbounded region.
    pub fn single(region: AquiferRegion) -> Self {
        Self {
            regions: vec![region],
            domains: vec![Domain::Background],
        }
    }

    /// Add a circular inhomogeneity region and return its handle.
    pub fn add_circular_region(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        region: AquiferRegion,
    ) -> Result<RegionId, AemError> {
        if !(radius > 0.0) {
            return Err(AemError::InvalidAquifer(format!(
                "inhomogeneity radius must be positive, got {radius}"
            )));
        }
        self.regions.push(region);
        self.domains.push(Domain::Circle { x, y, radius });
        Ok(RegionId(self.regions.len() - 1))
    }

    /// Handle of the background region.
    pub fn background(&self) -> RegionId {
        RegionId(0)
    }

    /// Resolve the region containing the point (x, y).
    pub fn find(&self, x: f64, y: f64) -> RegionId {
        for (i, dom) in self.domains.iter().enumerate().rev() {
            if let Domain::Circle {
                x: xc,
                y: yc,
                radius,
            } = dom
            {
                if (x - xc).hypot(y - yc) <= *radius {
                    return RegionId(i);
                }
            }
        }
        RegionId(0)
    }

    /// Region data for a handle.
    pub fn region(&self, id: RegionId) -> &AquiferRegion {
        &self.regions[id.0]
    }
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
///
/// Returns eigenvalues in ascending order with the matching orthonormal
/// eigenvectors as columns. The matrices here are tiny (one row per aquifer
/// layer), so a dense full-sweep Jacobi is both simple and accurate.
fn jacobi_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v: Array2<f64> = Array2::eye(n);

    let total_sq: f64 = a.iter().map(|x| x * x).sum();
    let tol = 1e-28 * total_sq.max(f64::MIN_POSITIVE);

    for _sweep in 0..100 {
        let mut off_sq = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off_sq += 2.0 * a[[p, q]] * a[[p, q]];
            }
        }
        if off_sq <= tol {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                let tan = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
                let cos = 1.0 / (tan * tan + 1.0).sqrt();
                let sin = tan * cos;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = cos * akp - sin * akq;
                    a[[k, q]] = sin * akp + cos * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = cos * apk - sin * aqk;
                    a[[q, k]] = sin * apk + cos * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = cos * vkp - sin * vkq;
                    v[[k, q]] = sin * vkp + cos * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[i, i]].partial_cmp(&a[[j, j]]).unwrap());

    let mut w = Array1::zeros(n);
    let mut u = Array2::zeros((n, n));
    for (m, &src) in order.iter().enumerate() {
        w[m] = a[[src, src]];
        for k in 0..n {
            u[[k, m]] = v[[k, src]];
        }
    }
    (w, u)
}
