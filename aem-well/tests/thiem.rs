//! Single confined layer against the Thiem solution.

use approx::assert_relative_eq;

use aem_special::thiem_head;
use aem_well::{
    AquiferRegion, AquiferSystem, FlowField, Model, ReferencePoint, Well, WellConfig, WellMode,
};

const T: f64 = 500.0;
const Q: f64 = 100.0;
const RW: f64 = 0.1;

fn well(resistance: f64) -> Well {
    Well::new(WellConfig {
        name: "pump".into(),
        label: None,
        x: 0.0,
        y: 0.0,
        radius: RW,
        resistance,
        layers: vec![0],
        mode: WellMode::Discharge { total: Q },
    })
    .unwrap()
}

fn solved_model(resistance: f64) -> Model {
    let region = AquiferRegion::confined_single(T, 20.0, 0.0, 0.3).unwrap();
    let mut model = Model::new(AquiferSystem::single(region));
    model.set_reference(ReferencePoint {
        x: 1000.0,
        y: 0.0,
        layer: 0,
        head: 20.0,
    });
    model.add_well(well(resistance));
    model.solve().unwrap();
    model
}

#[test]
fn test_head_differences_follow_thiem() {
    let model = solved_model(0.0);
    for &(r1, r2) in &[(1.0, 10.0), (5.0, 50.0), (10.0, 500.0)] {
        let h1 = model.head(r1, 0.0, &[0])[0];
        let h2 = model.head(0.0, r2, &[0])[0];
        assert_relative_eq!(h2 - h1, thiem_head(Q, T, r2, r1), epsilon = 1e-10);
    }
}

#[test]
fn test_cone_of_depression_is_monotone() {
    let model = solved_model(0.0);
    let mut prev = model.head(RW, 0.0, &[0])[0];
    for &r in &[0.5, 1.0, 5.0, 20.0, 100.0, 500.0] {
        let h = model.head(r, 0.0, &[0])[0];
        assert!(h > prev, "head must rise away from an extraction well");
        prev = h;
    }
}

#[test]
fn test_head_inside_without_skin_matches_bore_wall() {
    let model = solved_model(0.0);
    let well = model.well(0);
    let h_wall = model.head(RW, 0.0, &[0])[0];
    assert_relative_eq!(well.head_inside(&model)[0], h_wall, epsilon = 1e-12);
}

#[test]
fn test_head_inside_with_skin_subtracts_the_skin_loss() {
    let resistance = 2.0;
    let model = solved_model(resistance);
    let well = model.well(0);
    let h_wall = model.head(RW, 0.0, &[0])[0];
    let resfac = well.resfac()[0];
    assert_relative_eq!(
        well.head_inside(&model)[0],
        h_wall - resfac * Q,
        epsilon = 1e-12
    );
    assert!(well.head_inside(&model)[0] < h_wall);
}

#[test]
fn test_head_is_flat_inside_the_bore() {
    let model = solved_model(0.0);
    let h_wall = model.head(RW, 0.0, &[0])[0];
    for &(x, y) in &[(0.0, 0.0), (0.03, -0.02), (0.0, 0.09)] {
        assert_relative_eq!(model.head(x, y, &[0])[0], h_wall, epsilon = 1e-12);
    }
}
