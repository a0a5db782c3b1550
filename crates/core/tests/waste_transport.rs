//! Waste transport regression tests
//!
//! Covers the golden 4×4 plan, disabled transport rules and mass conservation.
//!
//! Run tests with: cargo test --test `waste_transport`

use approx::assert_relative_eq;
use urban_sim_core::grid::LandGrid;
use urban_sim_core::solver::{
    generate_waste, simulate_waste, transport_waste, FieldData, FlowCoefficients, WasteParams,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn golden_grid() -> LandGrid {
    LandGrid::parse("dlgb\nldgb\nggld\nbbdl").unwrap()
}

fn golden_temperature() -> FieldData {
    FieldData::from_rows(&[
        vec![10.0, 12.0, 15.0, 16.0],
        vec![20.0, 18.0, 15.0, 14.0],
        vec![15.0, 15.0, 17.0, 19.0],
        vec![13.0, 14.0, 16.0, 20.0],
    ])
    .unwrap()
}

#[test]
fn test_golden_four_by_four() {
    let outcome = simulate_waste(&golden_grid(), &golden_temperature(), &WasteParams::default())
        .unwrap();

    let expected = [
        [
            256.2819283841425,
            211.5690292073815,
            71.25503434355944,
            72.80397641327933,
        ],
        [
            212.32714133116082,
            130.81736355964875,
            152.61186984807608,
            205.2925889688302,
        ],
        [
            71.98899902341806,
            152.41372212764162,
            168.40947959024905,
            205.41194279713642,
        ],
        [
            72.20863338167551,
            201.70340124397455,
            202.40355337482598,
            287.6013364049999,
        ],
    ];

    for (y, row) in expected.iter().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            assert_relative_eq!(outcome.waste.get(x, y), value, epsilon = 1e-9);
        }
    }
    assert_relative_eq!(outcome.stats.generated_total, 2675.1, epsilon = 1e-9);
    assert_relative_eq!(outcome.stats.total, 2675.1, epsilon = 1e-9);
    assert!(outcome.stats.mass_drift.abs() < 1e-9);
}

#[test]
fn test_golden_generation_matches_population_and_temperature() {
    let generated =
        generate_waste(&golden_grid(), &golden_temperature(), &WasteParams::default()).unwrap();

    // High density at 10°C: 500 × 1.2 × (1 + 0.015 × (10 − 15))
    assert_relative_eq!(generated.get(0, 0), 500.0 * 1.2 * (1.0 - 0.075));
    // Low density at 12°C
    assert_relative_eq!(generated.get(1, 0), 50.0 * 1.2 * (1.0 - 0.045));
    assert_eq!(generated.get(2, 0), 0.0);
    assert_eq!(generated.get(3, 0), 0.0);
}

#[test]
fn test_zero_coefficients_leave_generated_field() {
    let grid = golden_grid();
    let params = WasteParams {
        coefficients: FlowCoefficients::ZERO,
        steps: 25,
        ..WasteParams::default()
    };
    let outcome = simulate_waste(&grid, &golden_temperature(), &params).unwrap();
    assert_eq!(outcome.waste, outcome.generated);

    for steps in [0, 1, 100] {
        let generated = outcome.generated.clone();
        let moved = transport_waste(&grid, generated, &FlowCoefficients::ZERO, steps);
        assert_eq!(moved, outcome.generated);
    }
}

#[test]
fn test_mass_is_conserved_on_irregular_plans() {
    let grid = LandGrid::parse(
        "dddllggbbe\n\
         dlxlggbbbe\n\
         ggggdbbble\n\
         llddbbglle\n\
         bbbbbbbbbb",
    )
    .unwrap();
    let temperature = FieldData::with_value(grid.width(), grid.height(), 27.0);
    let params = WasteParams {
        steps: 200,
        ..WasteParams::default()
    };
    let outcome = simulate_waste(&grid, &temperature, &params).unwrap();

    let generated = outcome.stats.generated_total;
    assert!(generated > 0.0);
    assert!(
        (outcome.stats.total - generated).abs() < 1e-9 * generated,
        "drift {}",
        outcome.stats.mass_drift
    );
    assert!(outcome.waste.as_slice().iter().all(|&w| w >= 0.0));
}

#[test]
fn test_waste_reaches_water_from_housing() {
    let grid = LandGrid::parse("db").unwrap();
    let temperature = FieldData::with_value(2, 1, 15.0);
    let params = WasteParams {
        steps: 1,
        ..WasteParams::default()
    };
    let outcome = simulate_waste(&grid, &temperature, &params).unwrap();

    // One step: 5% of 600 kg runs off into the water cell
    assert_relative_eq!(outcome.waste.get(1, 0), 30.0);
    assert_relative_eq!(outcome.waste.get(0, 0), 570.0);
}

#[test]
fn test_temperature_overlay_must_match() {
    let temperature = FieldData::with_value(3, 4, 15.0);
    assert!(simulate_waste(&golden_grid(), &temperature, &WasteParams::default()).is_err());
}
