//! Waste generation and transport
//!
//! Housing generates waste in proportion to its population, scaled up on hot cells.
//! A cellular automaton then moves waste between 4-connected neighbors according to six
//! directional land-use rules:
//!
//! | Source | Target | Flow |
//! |---|---|---|
//! | high density | low density | `overflow × max(w_src − w_dst, 0)` |
//! | housing | water | `housing_to_water × w_src` |
//! | housing | green | `housing_to_green × w_src` |
//! | green | water | `green_to_water × w_src` |
//! | water | green, housing, empty land | `water_to_land × w_src` |
//! | water | water | `water_diffusion × max(w_src − w_dst, 0)` |
//!
//! Every flow is computed from the pre-step snapshot. Each cell gathers what it sends to
//! and receives from each neighbor, which gives the same per-step delta as accumulating
//! flows pair by pair. Every flow leaves one in-bounds cell and enters another, so the
//! total is conserved up to rounding.

use super::fields::{FieldData, FieldSummary};
use super::stencil::relax;
use crate::core_types::{Celsius, LandUse};
use crate::error::{ensure_rate, SimulationError};
use crate::grid::LandGrid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rate constants of the six transport rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowCoefficients {
    /// High density → low density, on the positive difference
    pub overflow: f64,
    /// Housing → water runoff
    pub housing_to_water: f64,
    /// Housing → green litter
    pub housing_to_green: f64,
    /// Green → water runoff
    pub green_to_water: f64,
    /// Water → adjacent land buildup
    pub water_to_land: f64,
    /// Water → water evening-out, on the positive difference
    pub water_diffusion: f64,
}

impl Default for FlowCoefficients {
    fn default() -> Self {
        Self {
            overflow: 0.1,
            housing_to_water: 0.05,
            housing_to_green: 0.05,
            green_to_water: 0.10,
            water_to_land: 0.01,
            water_diffusion: 0.05,
        }
    }
}

impl FlowCoefficients {
    /// All rules disabled
    pub const ZERO: FlowCoefficients = FlowCoefficients {
        overflow: 0.0,
        housing_to_water: 0.0,
        housing_to_green: 0.0,
        green_to_water: 0.0,
        water_to_land: 0.0,
        water_diffusion: 0.0,
    };

    /// Reject negative or non-finite coefficients
    ///
    /// # Errors
    /// Returns `InvalidParameter` naming the offending coefficient
    pub fn validate(&self) -> Result<(), SimulationError> {
        ensure_rate("waste.overflow", self.overflow)?;
        ensure_rate("waste.housing_to_water", self.housing_to_water)?;
        ensure_rate("waste.housing_to_green", self.housing_to_green)?;
        ensure_rate("waste.green_to_water", self.green_to_water)?;
        ensure_rate("waste.water_to_land", self.water_to_land)?;
        ensure_rate("waste.water_diffusion", self.water_diffusion)
    }

    /// Total flow from a source cell into one adjacent target cell
    ///
    /// Several rules may apply to the same pair; their flows add.
    #[inline]
    pub fn flow(
        &self,
        source: LandUse,
        source_waste: f64,
        target: LandUse,
        target_waste: f64,
    ) -> f64 {
        use LandUse::{Empty, Green, HighDensity, LowDensity, Water};

        let mut flow = 0.0;
        if source == HighDensity && target == LowDensity {
            let diff = source_waste - target_waste;
            if diff > 0.0 {
                flow += diff * self.overflow;
            }
        }
        if source.is_building() && target == Water {
            flow += source_waste * self.housing_to_water;
        }
        if source.is_building() && target == Green {
            flow += source_waste * self.housing_to_green;
        }
        if source == Green && target == Water {
            flow += source_waste * self.green_to_water;
        }
        if source == Water && matches!(target, Green | LowDensity | HighDensity | Empty) {
            flow += source_waste * self.water_to_land;
        }
        if source == Water && target == Water {
            let diff = source_waste - target_waste;
            if diff > 0.0 {
                flow += diff * self.water_diffusion;
            }
        }
        flow
    }
}

/// Waste generation and transport parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasteParams {
    /// Temperature at which per-person waste equals `per_person`
    pub baseline_temperature: Celsius,
    /// Waste per resident per day (kg)
    pub per_person: f64,
    /// Fractional change of per-person waste per °C above baseline
    pub temperature_coefficient: f64,
    /// Number of transport steps
    pub steps: usize,
    /// Rule rate constants
    pub coefficients: FlowCoefficients,
}

impl Default for WasteParams {
    fn default() -> Self {
        Self {
            baseline_temperature: Celsius::new(15.0),
            per_person: 1.2,
            temperature_coefficient: 0.015,
            steps: 10,
            coefficients: FlowCoefficients::default(),
        }
    }
}

impl WasteParams {
    /// Reject negative or non-finite constants
    ///
    /// # Errors
    /// Returns `InvalidParameter` naming the offending constant
    pub fn validate(&self) -> Result<(), SimulationError> {
        ensure_rate("waste.per_person", self.per_person)?;
        if !self.temperature_coefficient.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "waste.temperature_coefficient must be finite, got {}",
                self.temperature_coefficient
            )));
        }
        self.coefficients.validate()
    }
}

/// Waste field statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WasteStats {
    /// Most polluted cell (kg)
    pub max: f64,
    /// Mean waste per cell (kg)
    pub mean: f64,
    /// Variance of the waste distribution
    pub variance: f64,
    /// `1 / (variance + 1)`, higher means waste is spread more evenly
    pub efficiency: f64,
    /// Total waste after transport (kg)
    pub total: f64,
    /// Total waste before transport (kg)
    pub generated_total: f64,
    /// `total − generated_total`, rounding error only
    pub mass_drift: f64,
}

/// Result of a waste run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteOutcome {
    /// Waste right after generation
    pub generated: FieldData,
    /// Waste after all transport steps
    pub waste: FieldData,
    /// Statistics of `waste`
    pub stats: WasteStats,
}

/// Per-cell waste from population and local temperature
///
/// # Errors
/// Returns `OverlayMismatch` if `temperature` does not match the grid
pub fn generate_waste(
    grid: &LandGrid,
    temperature: &FieldData,
    params: &WasteParams,
) -> Result<FieldData, SimulationError> {
    let (width, height) = grid.dimensions();
    if (temperature.width, temperature.height) != (width, height) {
        return Err(SimulationError::OverlayMismatch {
            expected: (width, height),
            found: (temperature.width, temperature.height),
        });
    }

    let baseline = params.baseline_temperature.value();
    let data = grid
        .cells()
        .iter()
        .zip(temperature.as_slice())
        .map(|(land_use, &t)| {
            let per_person =
                params.per_person * (1.0 + params.temperature_coefficient * (t - baseline));
            land_use.population() * per_person
        })
        .collect();

    Ok(FieldData {
        data,
        width,
        height,
    })
}

/// Run `steps` transport steps over an existing waste field
///
/// # Panics
///
/// Panics if `waste` does not match the grid dimensions
pub fn transport_waste(
    grid: &LandGrid,
    waste: FieldData,
    coefficients: &FlowCoefficients,
    steps: usize,
) -> FieldData {
    assert_eq!(
        (waste.width, waste.height),
        grid.dimensions(),
        "Waste field must match the grid"
    );
    let cells = grid.cells();
    let coefficients = *coefficients;

    relax(waste, steps, |cell| {
        let own = cells[cell.index];
        let delta = cell.neighbor_indices().fold(0.0, |delta, idx| {
            let other = cells[idx];
            let other_waste = cell.value_at(idx);
            let incoming = coefficients.flow(other, other_waste, own, cell.value);
            let outgoing = coefficients.flow(own, cell.value, other, other_waste);
            delta + incoming - outgoing
        });
        cell.value + delta
    })
    .field
}

/// Generate waste from the temperature field and transport it
///
/// # Errors
/// Returns `OverlayMismatch` if `temperature` does not match the grid
pub fn simulate_waste(
    grid: &LandGrid,
    temperature: &FieldData,
    params: &WasteParams,
) -> Result<WasteOutcome, SimulationError> {
    let generated = generate_waste(grid, temperature, params)?;
    let waste = transport_waste(grid, generated.clone(), &params.coefficients, params.steps);

    let summary: FieldSummary = waste.summary();
    let generated_total = generated.total();
    let stats = WasteStats {
        max: summary.max,
        mean: summary.mean,
        variance: summary.variance,
        efficiency: summary.efficiency(),
        total: summary.total,
        generated_total,
        mass_drift: summary.total - generated_total,
    };

    debug!(
        "Waste transport: {} steps, total={:.3} kg (drift {:.2e}), max={:.3} kg",
        params.steps, stats.total, stats.mass_drift, stats.max
    );

    Ok(WasteOutcome {
        generated,
        waste,
        stats,
    })
}
