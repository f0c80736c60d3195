//! Well geometry, state, and influence kernels.
//!
//! A well is a cylindrical sink of radius `rw` screened in one or more
//! layers of a single aquifer region. Its influence on the potential and on
//! the specific discharge is closed-form: the non-decaying mode (confined
//! systems only) contributes `ln(r/rw)/2π` and every decaying mode `m`
//! contributes `-K0(r/λ_m)/2π`, projected onto screened layers by the
//! region's `coef` matrix. Evaluation points inside the well radius are
//! clamped to the radius: the well is a finite-radius source, so the
//! interior is defined to look exactly like the bore wall. That clamp is
//! what keeps K0/K1 arguments strictly positive.
//!
//! The two physical operating modes (specified total discharge, specified
//! head) are a closed enum on the configuration record; the equation-row
//! construction in [`crate::equation`] dispatches on it.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use aem_special::bessel::{k0, k1};

use crate::aquifer::{AquiferSystem, RegionId};
use crate::error::AemError;
use crate::field::FlowField;

/// Operating mode of a well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WellMode {
    /// Total discharge over all screens is specified. A single-screen well
    /// has no unknowns; a multiscreen well distributes the total across its
    /// screens so that the bore head is common to all of them.
    Discharge {
        /// Target total discharge (positive = extraction).
        total: f64,
    },
    /// The head just outside the screen is specified; all screen strengths
    /// are unknowns.
    Head {
        /// Target head at the well bore.
        target: f64,
    },
}

/// Immutable well configuration, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellConfig {
    /// Human-readable name.
    pub name: String,
    /// Optional label used in trace termination reports.
    pub label: Option<String>,
    /// Well center x.
    pub x: f64,
    /// Well center y.
    pub y: f64,
    /// Well radius (must be positive).
    pub radius: f64,
    /// Skin resistance (head loss per unit flux across the screen, ≥ 0).
    pub resistance: f64,
    /// Screened layer indices, distinct, into the bound region's stack.
    pub layers: Vec<usize>,
    /// Operating mode.
    pub mode: WellMode,
}

/// Aquifer binding computed once by [`Well::initialize`].
#[derive(Debug, Clone)]
struct Binding {
    region: RegionId,
    naq: usize,
    /// Skin factor per screen: `resistance / (2π·rw·haq[layer])`.
    resfac: Array1<f64>,
    /// Head-mode boundary target per screen: `target · t[layer]`.
    pc: Option<Array1<f64>>,
}

/// The (x, y) components of a discharge-vector influence, one row per
/// unknown parameter, one column per mode of the evaluation region.
#[derive(Debug, Clone)]
pub struct DischargeInfluence {
    /// x-component per (parameter, mode).
    pub qx: Array2<f64>,
    /// y-component per (parameter, mode).
    pub qy: Array2<f64>,
}

/// A cylindrical well in a multi-layer aquifer region.
///
/// Lifecycle: [`Well::new`] validates the configuration,
/// [`Well::initialize`] binds the well to its aquifer region and computes
/// derived quantities, and [`Well::set_strengths`] stores the solved
/// per-screen strengths (the single-screen discharge case is fixed at
/// initialization). Influence queries are pure and may run concurrently
/// once initialization is done.
#[derive(Debug, Clone)]
pub struct Well {
    config: WellConfig,
    binding: Option<Binding>,
    strengths: Option<Array1<f64>>,
}

impl Well {
    /// Validate a configuration and construct the well.
    pub fn new(config: WellConfig) -> Result<Self, AemError> {
        if !(config.radius > 0.0) {
            return Err(AemError::InvalidWell(format!(
                "radius must be positive, got {}",
                config.radius
            )));
        }
        if !(config.resistance >= 0.0) {
            return Err(AemError::InvalidWell(format!(
                "skin resistance must be non-negative, got {}",
                config.resistance
            )));
        }
        if config.layers.is_empty() {
            return Err(AemError::InvalidWell("no screened layers".into()));
        }
        let mut seen = config.layers.clone();
        seen.sort_unstable();
        if seen.windows(2).any(|w| w[0] == w[1]) {
            return Err(AemError::InvalidWell(format!(
                "duplicate screened layer in {:?}",
                config.layers
            )));
        }
        Ok(Self {
            config,
            binding: None,
            strengths: None,
        })
    }

    /// The immutable configuration record.
    pub fn config(&self) -> &WellConfig {
        &self.config
    }

    /// Number of screened layers.
    pub fn nscreens(&self) -> usize {
        self.config.layers.len()
    }

    /// Number of unknown strengths contributed to the global system.
    pub fn nunknowns(&self) -> usize {
        match self.config.mode {
            WellMode::Discharge { .. } if self.nscreens() == 1 => 0,
            _ => self.nscreens(),
        }
    }

    /// Identifier used when reporting trace terminations.
    pub fn identifier(&self) -> String {
        match &self.config.label {
            Some(label) => label.clone(),
            None => format!(
                "{} at ({}, {})",
                self.config.name, self.config.x, self.config.y
            ),
        }
    }

    /// Bind the well to the aquifer region containing its center and
    /// compute the derived per-screen quantities.
    ///
    /// Must be called before any influence query; screened-layer indices
    /// are validated against the region here.
    pub fn initialize(&mut self, aquifer: &AquiferSystem) -> Result<(), AemError> {
        let region = aquifer.find(self.config.x, self.config.y);
        let aq = aquifer.region(region);
        for &layer in &self.config.layers {
            if layer >= aq.naq {
                return Err(AemError::LayerOutOfRange { layer, naq: aq.naq });
            }
        }

        let resfac = Array1::from_iter(self.config.layers.iter().map(|&l| {
            self.config.resistance / (2.0 * PI * self.config.radius * aq.haq[l])
        }));
        let pc = match self.config.mode {
            WellMode::Head { target } => Some(Array1::from_iter(
                self.config.layers.iter().map(|&l| target * aq.t[l]),
            )),
            WellMode::Discharge { .. } => None,
        };
        self.binding = Some(Binding {
            region,
            naq: aq.naq,
            resfac,
            pc,
        });

        // A single-screen discharge well is fully determined up front.
        if let WellMode::Discharge { total } = self.config.mode {
            if self.nscreens() == 1 {
                self.strengths = Some(Array1::from_elem(1, total));
            }
        }
        Ok(())
    }

    fn binding(&self) -> &Binding {
        self.binding
            .as_ref()
            .unwrap_or_else(|| panic!("well '{}' used before initialize()", self.config.name))
    }

    /// Region the well is bound to.
    pub fn region(&self) -> RegionId {
        self.binding().region
    }

    /// Skin factors per screen.
    pub fn resfac(&self) -> &Array1<f64> {
        &self.binding().resfac
    }

    /// Head-mode boundary targets `pc = target · T`, per screen.
    ///
    /// Panics for discharge-mode wells.
    pub fn pc(&self) -> &Array1<f64> {
        self.binding()
            .pc
            .as_ref()
            .unwrap_or_else(|| panic!("well '{}' has no head target", self.config.name))
    }

    /// Control point where boundary conditions are expressed: on the bore
    /// wall, at `(x + rw, y)`.
    pub fn control_point(&self) -> (f64, f64) {
        (self.config.x + self.config.radius, self.config.y)
    }

    /// Store the solved strengths, one per screen, in screen order.
    pub fn set_strengths(&mut self, sub: &[f64]) {
        assert_eq!(
            sub.len(),
            self.nscreens(),
            "strength vector length must match screen count of well '{}'",
            self.config.name
        );
        self.strengths = Some(Array1::from(sub.to_vec()));
    }

    /// Solved strengths per screen.
    ///
    /// Panics when called before the solve has assigned them.
    pub fn strengths(&self) -> &Array1<f64> {
        self.strengths
            .as_ref()
            .unwrap_or_else(|| panic!("well '{}' queried before strengths were set", self.config.name))
    }

    /// Planar distance from the well center, clamped to the well radius,
    /// with the matching offsets. The clamped offset is fixed along +x to
    /// keep the direction well-defined at the center.
    fn clamped_offset(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let dx = x - self.config.x;
        let dy = y - self.config.y;
        let r = dx.hypot(dy);
        if r < self.config.radius {
            (self.config.radius, self.config.radius, 0.0)
        } else {
            (r, dx, dy)
        }
    }

    /// Potential influence per unknown parameter per mode of the
    /// evaluation region.
    ///
    /// Returns all zeros when the evaluation point resolves to a region
    /// other than the well's own: analytic elements have no cross-region
    /// influence. `at` short-circuits the region lookup when the caller has
    /// already resolved it.
    pub fn potential_influence(
        &self,
        x: f64,
        y: f64,
        aquifer: &AquiferSystem,
        at: Option<RegionId>,
    ) -> Array2<f64> {
        let b = self.binding();
        let at = at.unwrap_or_else(|| aquifer.find(x, y));
        let eval = aquifer.region(at);
        let mut rv = Array2::zeros((self.nscreens(), eval.naq));
        if at != b.region {
            return rv;
        }

        let aq = aquifer.region(b.region);
        let (r, _, _) = self.clamped_offset(x, y);
        let mut pot = Array1::zeros(aq.naq);
        let first = usize::from(aq.ilap);
        if aq.ilap {
            pot[0] = (r / self.config.radius).ln() / (2.0 * PI);
        }
        for m in first..aq.naq {
            pot[m] = -k0(r / aq.lab[m]) / (2.0 * PI);
        }
        for (p, &l) in self.config.layers.iter().enumerate() {
            for m in 0..aq.naq {
                rv[[p, m]] = aq.coef[[l, m]] * pot[m];
            }
        }
        rv
    }

    /// Discharge-vector influence per unknown parameter per mode of the
    /// evaluation region, as the physical specific discharge (negative
    /// potential gradient).
    pub fn discharge_influence(
        &self,
        x: f64,
        y: f64,
        aquifer: &AquiferSystem,
        at: Option<RegionId>,
    ) -> DischargeInfluence {
        let b = self.binding();
        let at = at.unwrap_or_else(|| aquifer.find(x, y));
        let eval = aquifer.region(at);
        let mut qx = Array2::zeros((self.nscreens(), eval.naq));
        let mut qy = Array2::zeros((self.nscreens(), eval.naq));
        if at != b.region {
            return DischargeInfluence { qx, qy };
        }

        let aq = aquifer.region(b.region);
        let (r, dx, dy) = self.clamped_offset(x, y);
        let rsq = r * r;
        let mut mx = Array1::zeros(aq.naq);
        let mut my = Array1::zeros(aq.naq);
        let first = usize::from(aq.ilap);
        if aq.ilap {
            mx[0] = -dx / (2.0 * PI * rsq);
            my[0] = -dy / (2.0 * PI * rsq);
        }
        for m in first..aq.naq {
            let kone = k1(r / aq.lab[m]);
            mx[m] = -kone * dx / (2.0 * PI * r * aq.lab[m]);
            my[m] = -kone * dy / (2.0 * PI * r * aq.lab[m]);
        }
        for (p, &l) in self.config.layers.iter().enumerate() {
            for m in 0..aq.naq {
                qx[[p, m]] = aq.coef[[l, m]] * mx[m];
                qy[[p, m]] = aq.coef[[l, m]] * my[m];
            }
        }
        DischargeInfluence { qx, qy }
    }

    /// Potential influence projected from mode space onto the requested
    /// aquifer layers of the evaluation region; one row per unknown
    /// parameter, one column per requested layer.
    pub fn potential_influence_layers(
        &self,
        x: f64,
        y: f64,
        aquifer: &AquiferSystem,
        at: Option<RegionId>,
        layers: &[usize],
    ) -> Array2<f64> {
        let at = at.unwrap_or_else(|| aquifer.find(x, y));
        let rv = self.potential_influence(x, y, aquifer, Some(at));
        project_modes(&rv, aquifer, at, layers)
    }

    /// Discharge-vector influence projected onto the requested layers.
    pub fn discharge_influence_layers(
        &self,
        x: f64,
        y: f64,
        aquifer: &AquiferSystem,
        at: Option<RegionId>,
        layers: &[usize],
    ) -> (Array2<f64>, Array2<f64>) {
        let at = at.unwrap_or_else(|| aquifer.find(x, y));
        let dv = self.discharge_influence(x, y, aquifer, Some(at));
        (
            project_modes(&dv.qx, aquifer, at, layers),
            project_modes(&dv.qy, aquifer, at, layers),
        )
    }

    /// Head just inside the well, per screen: the field head at the bore
    /// wall minus the skin loss `resfac · strength`.
    pub fn head_inside(&self, field: &dyn FlowField) -> Array1<f64> {
        let b = self.binding();
        let (xc, yc) = self.control_point();
        let h = field.head(xc, yc, &self.config.layers);
        &h - &(&b.resfac * self.strengths())
    }

    /// Discharge per aquifer layer of the bound region: zero in layers the
    /// well is not screened in, the assigned strength elsewhere.
    pub fn discharge(&self) -> Array1<f64> {
        let b = self.binding();
        let mut q = Array1::zeros(b.naq);
        for (p, &l) in self.config.layers.iter().enumerate() {
            q[l] = self.strengths()[p];
        }
        q
    }
}

/// Project a (parameter × mode) influence onto aquifer layers using the
/// evaluation region's eigenvector matrix.
fn project_modes(
    rv: &Array2<f64>,
    aquifer: &AquiferSystem,
    at: RegionId,
    layers: &[usize],
) -> Array2<f64> {
    let aq = aquifer.region(at);
    let nparam = rv.nrows();
    let mut out = Array2::zeros((nparam, layers.len()));
    for p in 0..nparam {
        for (j, &l) in layers.iter().enumerate() {
            let mut acc = 0.0;
            for m in 0..aq.naq {
                acc += aq.eigvec[[l, m]] * rv[[p, m]];
            }
            out[[p, j]] = acc;
        }
    }
    out
}
