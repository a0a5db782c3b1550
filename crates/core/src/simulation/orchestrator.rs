//! Pipeline sequencing
//!
//! One run is: validate inputs → heat → energy → load → waste (driven by the final heat
//! field) → assemble the result. [`Simulation`] only carries validated parameters; every run
//! allocates fresh fields, so a single instance can serve concurrent callers.

use super::climate::{AmbientSource, ClimateQuery, ClimateSource, ResolvedAmbient};
use super::params::SimulationParams;
use super::profiler::StageScope;
use super::result::{RunMetadata, SimulationResult};
use crate::error::SimulationError;
use crate::grid::{CellMask, LandGrid, Submission};
use crate::solver::{distribute_load, estimate_energy, simulate_heat, simulate_waste};
use tracing::info;

/// Orchestrates the field engines over one grid at a time
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    params: SimulationParams,
}

impl Simulation {
    /// Create an orchestrator after validating `params`
    ///
    /// # Errors
    /// Returns `InvalidParameter` for negative or non-finite rates
    pub fn new(params: SimulationParams) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters used for every run
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Run with a caller-supplied ambient temperature
    ///
    /// A missing or non-finite `ambient` is replaced by the fallback policy.
    ///
    /// # Errors
    /// Returns `OverlayMismatch` if `retrofit` does not match the grid
    pub fn run(
        &self,
        grid: &LandGrid,
        ambient: Option<f64>,
        retrofit: Option<&CellMask>,
    ) -> Result<SimulationResult, SimulationError> {
        let ambient =
            ResolvedAmbient::resolve(ambient, AmbientSource::Supplied, &self.params.fallback);
        self.run_resolved(grid, ambient, retrofit)
    }

    /// Run with the ambient temperature looked up from a climate source
    ///
    /// # Errors
    /// Returns `OverlayMismatch` if `retrofit` does not match the grid
    pub fn run_with_climate(
        &self,
        grid: &LandGrid,
        climate: &dyn ClimateSource,
        query: &ClimateQuery,
        retrofit: Option<&CellMask>,
    ) -> Result<SimulationResult, SimulationError> {
        let ambient = ResolvedAmbient::from_climate(climate, query, &self.params.fallback);
        self.run_resolved(grid, ambient, retrofit)
    }

    /// Run a builder submission, querying `climate` with its year and coordinates
    ///
    /// # Errors
    /// Returns the submission's grid errors, or `OverlayMismatch` for a bad retrofit mask
    pub fn run_submission(
        &self,
        submission: &Submission,
        climate: &dyn ClimateSource,
        retrofit: Option<&CellMask>,
    ) -> Result<SimulationResult, SimulationError> {
        let grid = submission.to_grid()?;
        let query = ClimateQuery::from(submission);
        self.run_with_climate(&grid, climate, &query, retrofit)
    }

    /// Run with an already resolved ambient temperature
    ///
    /// # Errors
    /// Returns `OverlayMismatch` if `retrofit` does not match the grid
    pub fn run_resolved(
        &self,
        grid: &LandGrid,
        ambient: ResolvedAmbient,
        retrofit: Option<&CellMask>,
    ) -> Result<SimulationResult, SimulationError> {
        if let Some(mask) = retrofit {
            mask.ensure_matches(grid)?;
        }

        let params = &self.params;
        let (width, height) = grid.dimensions();
        let retrofitted_cells = retrofit.map_or(0, |mask| {
            mask.as_slice().iter().filter(|&&flagged| flagged).count()
        });

        info!(
            "Starting simulation: {}x{} grid, ambient {} ({:?}), {} retrofitted cells",
            width, height, ambient.temperature, ambient.source, retrofitted_cells
        );

        let temperature = {
            let _scope = StageScope::new("heat");
            simulate_heat(grid, ambient.temperature, &params.heat)
        };
        let energy = {
            let _scope = StageScope::new("energy");
            estimate_energy(grid, retrofit, &params.energy)?
        };
        let load = {
            let _scope = StageScope::new("load");
            distribute_load(grid, &params.load)
        };
        let waste = {
            let _scope = StageScope::new("waste");
            simulate_waste(grid, &temperature.temperature, &params.waste)?
        };

        info!(
            "Simulation complete: T [{:.2}, {:.2}]°C, energy {:.1} kWh/day, waste {:.1} kg",
            temperature.summary.min,
            temperature.summary.max,
            energy.stats.total,
            waste.stats.total
        );

        Ok(SimulationResult {
            metadata: RunMetadata {
                width,
                height,
                ambient: ambient.temperature,
                ambient_source: ambient.source,
                unknown_codes: grid.unknown_codes(),
                retrofitted_cells,
                heat_steps: params.heat.steps,
                smoothing_steps: params.energy.smoothing.steps,
                load_steps: params.load.steps,
                waste_steps: params.waste.steps,
            },
            composition: grid.composition(),
            temperature,
            energy,
            waste,
            load,
        })
    }
}

/// Validate `params` and run once with a supplied ambient temperature
///
/// # Errors
/// Returns `InvalidParameter` for bad parameters, `OverlayMismatch` for a bad retrofit mask
pub fn run_simulation(
    grid: &LandGrid,
    ambient: Option<f64>,
    retrofit: Option<&CellMask>,
    params: &SimulationParams,
) -> Result<SimulationResult, SimulationError> {
    Simulation::new(*params)?.run(grid, ambient, retrofit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Celsius, LandUse};
    use crate::simulation::climate::{FallbackPolicy, FixedClimate, NoClimate};

    fn sample_grid() -> LandGrid {
        LandGrid::parse("dlgb\nldgb\nggld\nbbdl").unwrap()
    }

    #[test]
    fn test_run_fills_every_block() {
        let grid = sample_grid();
        let result = Simulation::default().run(&grid, Some(18.0), None).unwrap();

        assert_eq!(result.metadata.width, 4);
        assert_eq!(result.metadata.height, 4);
        assert_eq!(result.metadata.ambient, Celsius::new(18.0));
        assert_eq!(result.metadata.ambient_source, AmbientSource::Supplied);
        assert_eq!(result.metadata.heat_steps, 200);
        assert_eq!(result.temperature.temperature.data.len(), 16);
        assert_eq!(result.energy.demand.data.len(), 16);
        assert_eq!(result.waste.waste.data.len(), 16);
        assert_eq!(result.load.load.data.len(), 16);
        assert_eq!(result.composition[&LandUse::Green], 25.0);
    }

    #[test]
    fn test_waste_uses_final_temperature() {
        let grid = sample_grid();
        let simulation = Simulation::default();
        let result = simulation.run(&grid, Some(25.0), None).unwrap();

        let expected =
            simulate_waste(&grid, &result.temperature.temperature, &simulation.params().waste)
                .unwrap();
        assert_eq!(result.waste, expected);
    }

    #[test]
    fn test_missing_ambient_uses_fallback() {
        let params = SimulationParams {
            fallback: FallbackPolicy::Fixed(Celsius::new(12.0)),
            ..SimulationParams::default()
        };
        let result = run_simulation(&sample_grid(), None, None, &params).unwrap();
        assert_eq!(result.metadata.ambient, Celsius::new(12.0));
        assert_eq!(result.metadata.ambient_source, AmbientSource::Fallback);
    }

    #[test]
    fn test_climate_sources_are_recorded() {
        let grid = sample_grid();
        let simulation = Simulation::default();
        let query = ClimateQuery::default();

        let result = simulation
            .run_with_climate(&grid, &FixedClimate(21.0), &query, None)
            .unwrap();
        assert_eq!(result.metadata.ambient_source, AmbientSource::Climate);
        assert_eq!(result.metadata.ambient, Celsius::new(21.0));

        let result = simulation
            .run_with_climate(&grid, &NoClimate, &query, None)
            .unwrap();
        assert_eq!(result.metadata.ambient_source, AmbientSource::Fallback);
    }

    #[test]
    fn test_mismatched_retrofit_fails_fast() {
        let mask = CellMask::empty(3, 4);
        let err = Simulation::default()
            .run(&sample_grid(), Some(20.0), Some(&mask))
            .unwrap_err();
        assert_eq!(
            err,
            SimulationError::OverlayMismatch {
                expected: (4, 4),
                found: (3, 4),
            }
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = SimulationParams::default();
        params.heat.beta = f64::NAN;
        assert!(Simulation::new(params).is_err());
    }

    #[test]
    fn test_runs_are_independent() {
        let grid = sample_grid();
        let simulation = Simulation::default();
        let first = simulation.run(&grid, Some(20.0), None).unwrap();
        let _other = simulation
            .run(&LandGrid::parse("dd\ndd").unwrap(), Some(35.0), None)
            .unwrap();
        let second = simulation.run(&grid, Some(20.0), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_submission_run() {
        let json = r#"{
            "gridSize": 2,
            "grid": [
                [{"type": "High Density Building", "color": "red"}, {"type": "Water", "color": "blue"}],
                [{"type": "Green Spaces", "color": "green"}, {"type": "helipad", "color": "grey"}]
            ],
            "latitude": "40.7",
            "longitude": -74.0,
            "year": 2015
        }"#;
        let submission = Submission::from_json(json).unwrap();
        let climate = |query: &ClimateQuery| query.latitude.map(|lat| lat / 2.0);
        let result = Simulation::default()
            .run_submission(&submission, &climate, None)
            .unwrap();

        assert_eq!(result.metadata.ambient, Celsius::new(20.35));
        assert_eq!(result.metadata.unknown_codes, 1);
        assert_eq!(result.composition[&LandUse::Empty], 25.0);
    }
}
