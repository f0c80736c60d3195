//! Reference model: global assembly, solve, and field evaluation.
//!
//! The model owns the aquifer system and the wells, assembles the global
//! boundary-condition system (well rows, multiscreen discharge closure
//! rows, reference-head row), solves it by dense LU, and back-substitutes
//! the solution into the wells. After the solve it is a read-only
//! [`FlowField`]: heads, potentials, and discharge vectors are pure
//! superpositions and may be evaluated concurrently — `head_grid` does so
//! with rayon.
//!
//! Head-type boundary conditions need an absolute datum. That is the
//! reference constant: one extra unknown adding a uniform-head component
//! (the non-decaying mode of a confined background region), pinned by a
//! specified head at a reference point. Leaky backgrounds have no
//! non-decaying mode; models over them run without a reference and produce
//! drawdowns relative to the undisturbed field.

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::aquifer::{AquiferSystem, RegionId};
use crate::equation::{EquationSystem, EquationRow};
use crate::error::AemError;
use crate::field::FlowField;
use crate::solver::lu_solve;
use crate::well::{Well, WellMode};

/// A specified head at a point, pinning the reference constant.
#[derive(Debug, Clone, Copy)]
pub struct ReferencePoint {
    /// Reference point x.
    pub x: f64,
    /// Reference point y.
    pub y: f64,
    /// Layer in which the head is specified.
    pub layer: usize,
    /// Specified head.
    pub head: f64,
}

/// Aquifer system plus wells, solvable for the unknown well strengths.
#[derive(Debug)]
pub struct Model {
    aquifer: AquiferSystem,
    wells: Vec<Well>,
    reference: Option<ReferencePoint>,
    /// Solved strength of the reference constant.
    constant: Option<f64>,
    solved: bool,
}

impl Model {
    /// Create an empty model over an aquifer system.
    pub fn new(aquifer: AquiferSystem) -> Self {
        Self {
            aquifer,
            wells: Vec::new(),
            reference: None,
            constant: None,
            solved: false,
        }
    }

    /// Specify the reference head pinning the uniform-head constant.
    pub fn set_reference(&mut self, reference: ReferencePoint) {
        self.reference = Some(reference);
    }

    /// Add a well; returns its index for later queries.
    pub fn add_well(&mut self, well: Well) -> usize {
        self.wells.push(well);
        self.wells.len() - 1
    }

    /// The aquifer system.
    pub fn aquifer(&self) -> &AquiferSystem {
        &self.aquifer
    }

    /// Well by index.
    pub fn well(&self, index: usize) -> &Well {
        &self.wells[index]
    }

    /// All wells.
    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    /// Initialize every well, assemble the global system, solve it, and
    /// back-substitute strengths.
    pub fn solve(&mut self) -> Result<(), AemError> {
        for well in &mut self.wells {
            well.initialize(&self.aquifer)?;
        }

        let mut offsets = Vec::with_capacity(self.wells.len());
        let mut neq = 0;
        for well in &self.wells {
            offsets.push(neq);
            neq += well.nunknowns();
        }
        let const_col = match &self.reference {
            Some(reference) => {
                let background = self.aquifer.region(self.aquifer.background());
                if !background.ilap {
                    return Err(AemError::Assembly(
                        "reference constant requires a confined background region".into(),
                    ));
                }
                if reference.layer >= background.naq {
                    return Err(AemError::LayerOutOfRange {
                        layer: reference.layer,
                        naq: background.naq,
                    });
                }
                let col = neq;
                neq += 1;
                Some(col)
            }
            None => None,
        };

        if neq == 0 {
            self.solved = true;
            return Ok(());
        }

        let view = Assembly {
            aquifer: &self.aquifer,
            wells: &self.wells,
            offsets: &offsets,
            neq,
            const_col,
        };

        let mut mat = Array2::zeros((neq, neq));
        let mut rhs = Array1::zeros(neq);
        let mut irow = 0;
        for (i, well) in self.wells.iter().enumerate() {
            for EquationRow { coefficients, rhs: r } in
                well.equation_rows(&view, &self.aquifer, offsets[i])
            {
                mat.row_mut(irow).assign(&coefficients);
                rhs[irow] = r;
                irow += 1;
            }
            // Closure row for multiscreen discharge wells: strengths sum
            // to the specified total.
            if let WellMode::Discharge { total } = well.config().mode {
                if well.nunknowns() > 0 {
                    for j in 0..well.nunknowns() {
                        mat[[irow, offsets[i] + j]] = 1.0;
                    }
                    rhs[irow] = total;
                    irow += 1;
                }
            }
        }
        if let (Some(reference), Some(_)) = (&self.reference, const_col) {
            let layers = [reference.layer];
            let pot = view.unknown_potentials(reference.x, reference.y, &layers);
            let known = view.known_potentials(reference.x, reference.y, &layers);
            let at = self.aquifer.find(reference.x, reference.y);
            let t = self.aquifer.region(at).t[reference.layer];
            mat.row_mut(irow).assign(&pot.column(0));
            rhs[irow] = reference.head * t - known[0];
            irow += 1;
        }
        debug_assert_eq!(irow, neq);

        log::info!(
            "solving {} equations for {} wells",
            neq,
            self.wells.len()
        );
        let solution = lu_solve(&mat, &rhs)?.to_vec();
        for (i, well) in self.wells.iter_mut().enumerate() {
            let n = well.nunknowns();
            well.apply_solution(&solution[offsets[i]..offsets[i] + n]);
        }
        if let Some(col) = const_col {
            self.constant = Some(solution[col]);
        }
        self.solved = true;
        Ok(())
    }

    fn assert_solved(&self) {
        assert!(self.solved, "model queried before solve()");
    }

    /// Potential at (x, y) per requested layer.
    pub fn potential(&self, x: f64, y: f64, layers: &[usize]) -> Array1<f64> {
        self.assert_solved();
        let at = self.aquifer.find(x, y);
        let mut pot = Array1::zeros(layers.len());
        for well in &self.wells {
            let inf = well.potential_influence_layers(x, y, &self.aquifer, Some(at), layers);
            let strengths = well.strengths();
            for p in 0..well.nscreens() {
                for j in 0..layers.len() {
                    pot[j] += strengths[p] * inf[[p, j]];
                }
            }
        }
        if let Some(c) = self.constant {
            if at == self.aquifer.background() {
                let aq = self.aquifer.region(at);
                for (j, &l) in layers.iter().enumerate() {
                    pot[j] += c * aq.eigvec[[l, 0]];
                }
            }
        }
        pot
    }

    /// Specific discharge vector at (x, y) per requested layer.
    pub fn discharge_vector(
        &self,
        x: f64,
        y: f64,
        layers: &[usize],
    ) -> (Array1<f64>, Array1<f64>) {
        self.assert_solved();
        let at = self.aquifer.find(x, y);
        let mut qx = Array1::zeros(layers.len());
        let mut qy = Array1::zeros(layers.len());
        for well in &self.wells {
            let (ix, iy) =
                well.discharge_influence_layers(x, y, &self.aquifer, Some(at), layers);
            let strengths = well.strengths();
            for p in 0..well.nscreens() {
                for j in 0..layers.len() {
                    qx[j] += strengths[p] * ix[[p, j]];
                    qy[j] += strengths[p] * iy[[p, j]];
                }
            }
        }
        // The uniform-head constant carries no discharge.
        (qx, qy)
    }

    /// Heads over a grid of points in one layer, rows indexed by `ys`,
    /// columns by `xs`. Evaluated in parallel; the field queries are pure.
    pub fn head_grid(&self, xs: &[f64], ys: &[f64], layer: usize) -> Array2<f64> {
        self.assert_solved();
        let layers = [layer];
        let rows: Vec<Vec<f64>> = ys
            .par_iter()
            .map(|&y| xs.iter().map(|&x| self.head(x, y, &layers)[0]).collect())
            .collect();
        let mut grid = Array2::zeros((ys.len(), xs.len()));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, h) in row.into_iter().enumerate() {
                grid[[i, j]] = h;
            }
        }
        grid
    }
}

impl FlowField for Model {
    fn head(&self, x: f64, y: f64, layers: &[usize]) -> Array1<f64> {
        let pot = self.potential(x, y, layers);
        let aq = self.aquifer.region(self.aquifer.find(x, y));
        Array1::from_iter(
            layers
                .iter()
                .enumerate()
                .map(|(j, &l)| pot[j] / aq.t[l]),
        )
    }

    fn velocity(&self, x: f64, y: f64, z: f64) -> [f64; 3] {
        self.assert_solved();
        let at = self.aquifer.find(x, y);
        let aq = self.aquifer.region(at);
        let Some(layer) = aq.layer_of(z) else {
            return [0.0, 0.0, 0.0];
        };
        let (qx, qy) = self.discharge_vector(x, y, &[layer]);
        let pore_area = aq.haq[layer] * aq.porosity[layer];
        // Vertical seepage reconstruction is out of scope for the
        // reference model; the termination rule takes whatever vz the
        // field reports.
        [qx[0] / pore_area, qy[0] / pore_area, 0.0]
    }
}

/// Assembly-time view of the global unknowns, handed to wells while their
/// rows are being built.
struct Assembly<'a> {
    aquifer: &'a AquiferSystem,
    wells: &'a [Well],
    offsets: &'a [usize],
    neq: usize,
    const_col: Option<usize>,
}

impl EquationSystem for Assembly<'_> {
    fn neq(&self) -> usize {
        self.neq
    }

    fn unknown_potentials(&self, x: f64, y: f64, layers: &[usize]) -> Array2<f64> {
        let at = self.aquifer.find(x, y);
        let mut mat = Array2::zeros((self.neq, layers.len()));
        for (i, well) in self.wells.iter().enumerate() {
            if well.nunknowns() == 0 {
                continue;
            }
            let inf = well.potential_influence_layers(x, y, self.aquifer, Some(at), layers);
            for p in 0..well.nunknowns() {
                for j in 0..layers.len() {
                    mat[[self.offsets[i] + p, j]] = inf[[p, j]];
                }
            }
        }
        if let Some(col) = self.const_col {
            if at == self.aquifer.background() {
                let aq = self.aquifer.region(at);
                for (j, &l) in layers.iter().enumerate() {
                    mat[[col, j]] = aq.eigvec[[l, 0]];
                }
            }
        }
        mat
    }

    fn known_potentials(&self, x: f64, y: f64, layers: &[usize]) -> Array1<f64> {
        let at = self.aquifer.find(x, y);
        let mut pot = Array1::zeros(layers.len());
        for well in self.wells {
            if well.nunknowns() > 0 {
                continue;
            }
            let inf = well.potential_influence_layers(x, y, self.aquifer, Some(at), layers);
            let strengths = well.strengths();
            for p in 0..well.nscreens() {
                for j in 0..layers.len() {
                    pot[j] += strengths[p] * inf[[p, j]];
                }
            }
        }
        pot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aquifer::AquiferRegion;
    use crate::well::WellConfig;
    use approx::assert_relative_eq;

    fn pumping_well(x: f64, y: f64, q: f64) -> Well {
        Well::new(WellConfig {
            name: "well".into(),
            label: None,
            x,
            y,
            radius: 0.1,
            resistance: 0.0,
            layers: vec![0],
            mode: WellMode::Discharge { total: q },
        })
        .unwrap()
    }

    fn confined_model() -> Model {
        let region = AquiferRegion::confined_single(500.0, 20.0, 0.0, 0.3).unwrap();
        let mut model = Model::new(AquiferSystem::single(region));
        model.set_reference(ReferencePoint {
            x: 1000.0,
            y: 0.0,
            layer: 0,
            head: 20.0,
        });
        model
    }

    #[test]
    fn test_reference_head_is_honored() {
        let mut model = confined_model();
        model.add_well(pumping_well(0.0, 0.0, 100.0));
        model.solve().unwrap();
        let h = model.head(1000.0, 0.0, &[0]);
        assert_relative_eq!(h[0], 20.0, epsilon = 1e-10);
    }

    #[test]
    fn test_superposition_of_two_wells() {
        let mut model = confined_model();
        model.add_well(pumping_well(0.0, 0.0, 100.0));
        model.add_well(pumping_well(50.0, 0.0, 60.0));
        model.solve().unwrap();

        // Heads drop more than with either well alone; spot-check by
        // removing one well and comparing drawdowns at a probe point.
        let h_both = model.head(25.0, 10.0, &[0])[0];

        let mut single = confined_model();
        single.add_well(pumping_well(0.0, 0.0, 100.0));
        single.solve().unwrap();
        let h_single = single.head(25.0, 10.0, &[0])[0];

        assert!(h_both < h_single);
    }

    #[test]
    fn test_velocity_points_toward_extraction_well() {
        let mut model = confined_model();
        model.add_well(pumping_well(0.0, 0.0, 100.0));
        model.solve().unwrap();
        let v = model.velocity(10.0, 0.0, -10.0);
        assert!(v[0] < 0.0, "flow at +x must move in -x toward the well");
        assert_relative_eq!(v[1], 0.0, epsilon = 1e-14);
        assert_relative_eq!(v[2], 0.0);
    }

    #[test]
    fn test_velocity_outside_layer_stack_is_zero() {
        let mut model = confined_model();
        model.add_well(pumping_well(0.0, 0.0, 100.0));
        model.solve().unwrap();
        assert_eq!(model.velocity(10.0, 0.0, 5.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_head_grid_matches_pointwise_queries() {
        let mut model = confined_model();
        model.add_well(pumping_well(0.0, 0.0, 100.0));
        model.solve().unwrap();
        let xs = [5.0, 10.0, 20.0];
        let ys = [-5.0, 0.0, 5.0];
        let grid = model.head_grid(&xs, &ys, 0);
        for (i, &y) in ys.iter().enumerate() {
            for (j, &x) in xs.iter().enumerate() {
                assert_relative_eq!(grid[[i, j]], model.head(x, y, &[0])[0]);
            }
        }
    }

    #[test]
    fn test_reference_requires_confined_background() {
        let region = AquiferRegion::leaky_single(500.0, 20.0, 0.0, 0.3, 1000.0).unwrap();
        let mut model = Model::new(AquiferSystem::single(region));
        model.set_reference(ReferencePoint {
            x: 0.0,
            y: 0.0,
            layer: 0,
            head: 10.0,
        });
        model.add_well(pumping_well(0.0, 0.0, 100.0));
        assert!(matches!(model.solve(), Err(AemError::Assembly(_))));
    }

    #[test]
    #[should_panic(expected = "before solve")]
    fn test_query_before_solve_panics() {
        let model = confined_model();
        model.potential(0.0, 0.0, &[0]);
    }
}
