//! Boundary-condition rows contributed by wells to the global system.
//!
//! The global solver assembles one linear equation per unknown. Wells see
//! the rest of the system only through the [`EquationSystem`] trait: the
//! potential influence of every global unknown at a point, and the
//! potential already contributed by elements whose strengths are known.
//! Rows are expressed at the well's control point on the bore wall.
//!
//! Row semantics per operating mode:
//!
//! - **Discharge, single screen**: the strength is fixed at initialization,
//!   no rows.
//! - **Discharge, multiscreen**: the bore is one cavity, so the head just
//!   inside the well must match across screens. That yields `n − 1`
//!   equality rows in head units (potential columns divided by layer
//!   transmissivity) with the skin self-terms on the well's own columns.
//!   The closing `Σ strengths = Q_total` row is the assembling model's
//!   responsibility, not produced here.
//! - **Head**: one row per screen in potential units, with right-hand side
//!   `pc = target · T` minus the known potential, and the skin self-term
//!   `−T · resfac` on the own column.

use ndarray::{Array1, Array2};

use crate::aquifer::AquiferSystem;
use crate::well::{Well, WellMode};

/// One assembled boundary-condition equation.
#[derive(Debug, Clone)]
pub struct EquationRow {
    /// Coefficient per global unknown.
    pub coefficients: Array1<f64>,
    /// Right-hand side.
    pub rhs: f64,
}

/// The view of the global system a well needs to express its rows.
///
/// Implemented by the assembling model; kept minimal so the core never
/// holds a back-reference to the model.
pub trait EquationSystem {
    /// Total number of global unknowns.
    fn neq(&self) -> usize;

    /// Potential influence of every global unknown at (x, y), one row per
    /// unknown, one column per requested layer.
    fn unknown_potentials(&self, x: f64, y: f64, layers: &[usize]) -> Array2<f64>;

    /// Potential at (x, y) per requested layer contributed by elements
    /// whose strengths are already known.
    fn known_potentials(&self, x: f64, y: f64, layers: &[usize]) -> Array1<f64>;
}

impl Well {
    /// Build this well's boundary-condition rows.
    ///
    /// `offset` is the first global unknown index assigned to this well;
    /// the well's own columns receive the skin-loss self-terms.
    pub fn equation_rows(
        &self,
        sys: &dyn EquationSystem,
        aquifer: &AquiferSystem,
        offset: usize,
    ) -> Vec<EquationRow> {
        if self.nunknowns() == 0 {
            return Vec::new();
        }
        let (xc, yc) = self.control_point();
        let layers = &self.config().layers;
        let aq = aquifer.region(self.region());
        let pot = sys.unknown_potentials(xc, yc, layers);
        let known = sys.known_potentials(xc, yc, layers);
        let resfac = self.resfac();
        let n = self.nscreens();

        match self.config().mode {
            WellMode::Discharge { .. } => {
                // Head equality between consecutive screens, in head units.
                let mut rows = Vec::with_capacity(n - 1);
                for i in 0..n - 1 {
                    let ti = aq.t[layers[i]];
                    let tn = aq.t[layers[i + 1]];
                    let mut coefficients = Array1::zeros(sys.neq());
                    for j in 0..sys.neq() {
                        coefficients[j] = pot[[j, i]] / ti - pot[[j, i + 1]] / tn;
                    }
                    coefficients[offset + i] -= resfac[i];
                    coefficients[offset + i + 1] += resfac[i + 1];
                    let rhs = known[i + 1] / tn - known[i] / ti;
                    rows.push(EquationRow { coefficients, rhs });
                }
                rows
            }
            WellMode::Head { .. } => {
                // Specified head per screen, in potential units.
                let pc = self.pc();
                let mut rows = Vec::with_capacity(n);
                for i in 0..n {
                    let ti = aq.t[layers[i]];
                    let mut coefficients = pot.column(i).to_owned();
                    coefficients[offset + i] -= ti * resfac[i];
                    rows.push(EquationRow {
                        coefficients,
                        rhs: pc[i] - known[i],
                    });
                }
                rows
            }
        }
    }

    /// Back-substitution: store the solved sub-vector as this well's
    /// strengths, in screen order. A no-op for wells without unknowns.
    pub fn apply_solution(&mut self, sub: &[f64]) {
        if self.nunknowns() > 0 {
            self.set_strengths(sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aquifer::{AquiferRegion, AquiferSystem};
    use crate::well::WellConfig;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Two global unknowns: the probed well's single strength (column 0)
    /// and one foreign unknown (column 1) with hand-picked influences.
    struct TwoUnknowns;

    impl EquationSystem for TwoUnknowns {
        fn neq(&self) -> usize {
            2
        }
        fn unknown_potentials(&self, _x: f64, _y: f64, layers: &[usize]) -> Array2<f64> {
            assert_eq!(layers, &[0]);
            array![[0.0], [2.5]]
        }
        fn known_potentials(&self, _x: f64, _y: f64, layers: &[usize]) -> Array1<f64> {
            assert_eq!(layers, &[0]);
            array![3.0]
        }
    }

    #[test]
    fn test_head_well_row_structure() {
        let sys = AquiferSystem::single(
            AquiferRegion::confined_single(500.0, 20.0, 0.0, 0.3).unwrap(),
        );
        let mut well = Well::new(WellConfig {
            name: "hw".into(),
            label: None,
            x: 0.0,
            y: 0.0,
            radius: 0.1,
            resistance: 1.0,
            layers: vec![0],
            mode: WellMode::Head { target: 15.0 },
        })
        .unwrap();
        well.initialize(&sys).unwrap();

        let rows = well.equation_rows(&TwoUnknowns, &sys, 0);
        assert_eq!(rows.len(), 1);
        // Own column: influence at the bore wall (zero for the log mode)
        // minus T·resfac; foreign column passes through unchanged.
        let resfac = well.resfac()[0];
        assert_relative_eq!(rows[0].coefficients[0], -500.0 * resfac, epsilon = 1e-12);
        assert_relative_eq!(rows[0].coefficients[1], 2.5);
        // rhs = pc − known = 15·500 − 3.
        assert_relative_eq!(rows[0].rhs, 15.0 * 500.0 - 3.0);
    }

    /// Three unknowns: the probed multiscreen well (columns 0, 1) plus one
    /// foreign unknown (column 2).
    struct ThreeUnknowns;

    impl EquationSystem for ThreeUnknowns {
        fn neq(&self) -> usize {
            3
        }
        fn unknown_potentials(&self, _x: f64, _y: f64, layers: &[usize]) -> Array2<f64> {
            assert_eq!(layers, &[0, 1]);
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]
        }
        fn known_potentials(&self, _x: f64, _y: f64, layers: &[usize]) -> Array1<f64> {
            array![10.0, 30.0]
        }
    }

    #[test]
    fn test_multiscreen_equality_row_structure() {
        let region = AquiferRegion::new(
            &[400.0, 100.0],
            &[20.0, 10.0],
            0.0,
            &[0.3, 0.3],
            &[f64::INFINITY, 2000.0],
        )
        .unwrap();
        let sys = AquiferSystem::single(region);
        let mut well = Well::new(WellConfig {
            name: "mw".into(),
            label: None,
            x: 0.0,
            y: 0.0,
            radius: 0.1,
            resistance: 2.0,
            layers: vec![0, 1],
            mode: WellMode::Discharge { total: 100.0 },
        })
        .unwrap();
        well.initialize(&sys).unwrap();

        let rows = well.equation_rows(&ThreeUnknowns, &sys, 0);
        // n − 1 equality rows; the ΣQ closure row is not produced here.
        assert_eq!(rows.len(), 1);
        let resfac = well.resfac();
        let (t0, t1) = (400.0, 100.0);
        assert_relative_eq!(
            rows[0].coefficients[0],
            1.0 / t0 - 2.0 / t1 - resfac[0],
            epsilon = 1e-12
        );
        assert_relative_eq!(
            rows[0].coefficients[1],
            3.0 / t0 - 4.0 / t1 + resfac[1],
            epsilon = 1e-12
        );
        assert_relative_eq!(rows[0].coefficients[2], 5.0 / t0 - 6.0 / t1, epsilon = 1e-12);
        assert_relative_eq!(rows[0].rhs, 30.0 / t1 - 10.0 / t0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_screen_discharge_contributes_no_rows() {
        let sys = AquiferSystem::single(
            AquiferRegion::confined_single(500.0, 20.0, 0.0, 0.3).unwrap(),
        );
        let mut well = Well::new(WellConfig {
            name: "w".into(),
            label: None,
            x: 0.0,
            y: 0.0,
            radius: 0.1,
            resistance: 0.0,
            layers: vec![0],
            mode: WellMode::Discharge { total: 100.0 },
        })
        .unwrap();
        well.initialize(&sys).unwrap();
        assert!(well.equation_rows(&TwoUnknowns, &sys, 0).is_empty());
    }
}
