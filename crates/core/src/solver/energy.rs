//! Building energy demand
//!
//! Three full-grid passes:
//! 1. **Baseline**: annual demand per m² × cell area, converted to kWh/day. Only housing
//!    cells consume energy.
//! 2. **Neighborhood**: a 5×5 window (radius 2, centre excluded, clipped at edges) adjusts
//!    demand. Dense surroundings add a surcharge; green and water surroundings cool the
//!    block, with the combined cooling credit capped. Cool-roof retrofits apply after that,
//!    and no building ever drops below a fixed share of its baseline.
//! 3. **Smoothing**: a presentation-only diffusion over the shared stencil. Parks and
//!    water are pinned to negative "cooling sources" every step and pull adjacent buildings
//!    down with them.
//!
//! Statistics (totals, per-type averages, efficiency ratio) are taken from the demand of
//! pass 2, not from the smoothed field.

use super::fields::{FieldData, FieldSummary};
use super::stencil::relax;
use crate::core_types::LandUse;
use crate::error::{ensure_rate, ensure_stable, SimulationError};
use crate::grid::{CellMask, LandGrid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Neighborhood and retrofit modifiers applied to baseline demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyParams {
    /// Floor area of one cell (m²)
    pub cell_area: f64,
    /// Days used to turn annual into daily demand
    pub days_per_year: f64,
    /// Chebyshev radius of the neighborhood window
    pub neighborhood_radius: usize,
    /// Share of dense neighbors that triggers the surcharge
    pub dense_share_threshold: f64,
    /// Multiplier for blocks surrounded by dense development
    pub dense_surcharge: f64,
    /// Share of green neighbors that triggers green cooling
    pub green_share_threshold: f64,
    /// Multiplier for green cooling
    pub green_multiplier: f64,
    /// Share of water neighbors that triggers water cooling
    pub water_share_threshold: f64,
    /// Multiplier for water cooling
    pub water_multiplier: f64,
    /// Lowest combined green × water multiplier
    pub cooling_floor: f64,
    /// Multiplier for cells flagged as cool-roof retrofits
    pub retrofit_multiplier: f64,
    /// Lowest demand of any building as a share of its baseline
    pub demand_floor: f64,
    /// Presentation smoothing pass
    pub smoothing: SmoothingParams,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            cell_area: 100.0,
            days_per_year: 365.0,
            neighborhood_radius: 2,
            dense_share_threshold: 0.5,
            dense_surcharge: 1.04,
            green_share_threshold: 0.20,
            green_multiplier: 0.97,
            water_share_threshold: 0.10,
            water_multiplier: 0.92,
            cooling_floor: 0.88,
            retrofit_multiplier: 0.85,
            demand_floor: 0.88,
            smoothing: SmoothingParams::default(),
        }
    }
}

/// Diffusion settings for the smoothed energy map
///
/// Pins, cooling and minimum are fractions of the mean positive demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Number of relaxation steps
    pub steps: usize,
    /// Diffusion rate α
    pub alpha: f64,
    /// Decay rate β toward the mean positive demand
    pub beta: f64,
    /// Green cells are held at `−green_sink × mean`
    pub green_sink: f64,
    /// Water cells are held at `−water_sink × mean`
    pub water_sink: f64,
    /// Cooling of a building per unit share of green neighbors
    pub green_cooling: f64,
    /// Cooling of a building per unit share of water neighbors
    pub water_cooling: f64,
    /// Value given to a building that diffusion drives negative
    pub building_minimum: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            steps: 50,
            alpha: 0.02,
            beta: 0.01,
            green_sink: 0.3,
            water_sink: 0.5,
            green_cooling: 0.15,
            water_cooling: 0.25,
            building_minimum: 0.1,
        }
    }
}

impl EnergyParams {
    /// Reject negative or non-finite constants and an unstable smoothing step
    ///
    /// # Errors
    /// Returns `InvalidParameter` naming the offending constant
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.cell_area.is_finite() && self.cell_area > 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "energy.cell_area must be positive, got {}",
                self.cell_area
            )));
        }
        if !(self.days_per_year.is_finite() && self.days_per_year > 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "energy.days_per_year must be positive, got {}",
                self.days_per_year
            )));
        }
        for (name, value) in [
            ("energy.dense_share_threshold", self.dense_share_threshold),
            ("energy.dense_surcharge", self.dense_surcharge),
            ("energy.green_share_threshold", self.green_share_threshold),
            ("energy.green_multiplier", self.green_multiplier),
            ("energy.water_share_threshold", self.water_share_threshold),
            ("energy.water_multiplier", self.water_multiplier),
            ("energy.cooling_floor", self.cooling_floor),
            ("energy.retrofit_multiplier", self.retrofit_multiplier),
            ("energy.demand_floor", self.demand_floor),
            ("energy.smoothing.alpha", self.smoothing.alpha),
            ("energy.smoothing.beta", self.smoothing.beta),
            ("energy.smoothing.green_sink", self.smoothing.green_sink),
            ("energy.smoothing.water_sink", self.smoothing.water_sink),
            ("energy.smoothing.green_cooling", self.smoothing.green_cooling),
            ("energy.smoothing.water_cooling", self.smoothing.water_cooling),
            (
                "energy.smoothing.building_minimum",
                self.smoothing.building_minimum,
            ),
        ] {
            ensure_rate(name, value)?;
        }
        ensure_stable("energy.smoothing", self.smoothing.alpha, self.smoothing.beta)
    }

    /// Daily baseline demand of one cell of the given type (kWh/day)
    #[inline]
    pub fn baseline(&self, land_use: LandUse) -> f64 {
        land_use.baseline_demand() * self.cell_area / self.days_per_year
    }
}

/// Land-use counts around one cell, centre excluded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborhoodMix {
    /// Cells examined
    pub total: usize,
    /// High-density cells
    pub dense: usize,
    /// Green cells
    pub green: usize,
    /// Water cells
    pub water: usize,
}

impl NeighborhoodMix {
    /// Count land uses within `radius` of `(x, y)`, clipped at the grid edge
    pub fn around(grid: &LandGrid, x: usize, y: usize, radius: usize) -> Self {
        // Any radius up to usize::MAX clips to the grid
        let reach = |c: usize, len: usize| {
            c.saturating_sub(radius)..c.saturating_add(radius).saturating_add(1).min(len)
        };
        let y_range = reach(y, grid.height());
        let x_range = reach(x, grid.width());

        let mut mix = Self::default();
        for ny in y_range {
            for nx in x_range.clone() {
                if nx == x && ny == y {
                    continue;
                }
                mix.total += 1;
                match grid.get(nx, ny) {
                    LandUse::HighDensity => mix.dense += 1,
                    LandUse::Green => mix.green += 1,
                    LandUse::Water => mix.water += 1,
                    LandUse::LowDensity | LandUse::Empty => {}
                }
            }
        }
        mix
    }

    /// Demand multiplier from this neighborhood; 1.0 when there are no neighbors
    ///
    /// All thresholds are inclusive.
    pub fn multiplier(&self, params: &EnergyParams) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        let total = self.total as f64;

        let mut multiplier = 1.0;
        if self.dense as f64 >= total * params.dense_share_threshold {
            multiplier *= params.dense_surcharge;
        }

        let green = if self.green as f64 / total >= params.green_share_threshold {
            params.green_multiplier
        } else {
            1.0
        };
        let water = if self.water as f64 / total >= params.water_share_threshold {
            params.water_multiplier
        } else {
            1.0
        };

        multiplier * (green * water).max(params.cooling_floor)
    }
}

/// Demand subtotal for one land-use type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeDemand {
    /// Number of cells of this type
    pub count: usize,
    /// Summed daily demand (kWh/day)
    pub total: f64,
    /// `total / max(count, 1)`
    pub average: f64,
}

/// Summary of the neighborhood-adjusted demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyStats {
    /// Demand over the whole plan (kWh/day)
    pub total: f64,
    /// Per-type subtotal, every type present
    pub by_type: BTreeMap<LandUse, TypeDemand>,
    /// Low-density total over high-density total; a zero high-density total counts as 1
    pub efficiency_ratio: f64,
}

impl EnergyStats {
    fn from_demand(grid: &LandGrid, demand: &FieldData) -> Self {
        let mut by_type: BTreeMap<LandUse, TypeDemand> = LandUse::ALL
            .iter()
            .map(|&land_use| {
                (
                    land_use,
                    TypeDemand {
                        count: 0,
                        total: 0.0,
                        average: 0.0,
                    },
                )
            })
            .collect();

        for (land_use, value) in grid.cells().iter().zip(demand.as_slice()) {
            if let Some(entry) = by_type.get_mut(land_use) {
                entry.count += 1;
                entry.total += value;
            }
        }
        for entry in by_type.values_mut() {
            entry.average = entry.total / entry.count.max(1) as f64;
        }

        let low = by_type[&LandUse::LowDensity].total;
        let high = by_type[&LandUse::HighDensity].total;
        let efficiency_ratio = low / if high == 0.0 { 1.0 } else { high };

        Self {
            total: demand.total(),
            by_type,
            efficiency_ratio,
        }
    }

    /// Subtotal for one type
    pub fn subtotal(&self, land_use: LandUse) -> TypeDemand {
        self.by_type[&land_use]
    }
}

/// Result of the energy estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyOutcome {
    /// Neighborhood- and retrofit-adjusted demand per cell (kWh/day)
    pub demand: FieldData,
    /// Presentation field after smoothing
    pub smoothed: FieldData,
    /// Statistics of `smoothed`
    pub smoothed_summary: FieldSummary,
    /// Statistics of `demand`
    pub stats: EnergyStats,
    /// Mean of the positive demand values, the reference level for smoothing
    pub reference_level: f64,
}

/// Baseline daily demand of every cell
pub fn baseline_demand(grid: &LandGrid, params: &EnergyParams) -> FieldData {
    let (width, height) = grid.dimensions();
    FieldData {
        data: grid.cells().iter().map(|&c| params.baseline(c)).collect(),
        width,
        height,
    }
}

/// Apply neighborhood modifiers, retrofits and the building floor to the baseline
///
/// # Errors
/// Returns `OverlayMismatch` if `retrofit` does not match the grid
pub fn adjusted_demand(
    grid: &LandGrid,
    retrofit: Option<&CellMask>,
    params: &EnergyParams,
) -> Result<FieldData, SimulationError> {
    if let Some(mask) = retrofit {
        mask.ensure_matches(grid)?;
    }
    let (width, height) = grid.dimensions();

    let data = (0..grid.len())
        .into_par_iter()
        .map(|index| {
            let (x, y) = (index % width, index / width);
            let land_use = grid.get(x, y);
            let baseline = params.baseline(land_use);

            let mix = NeighborhoodMix::around(grid, x, y, params.neighborhood_radius);
            let mut demand = baseline * mix.multiplier(params);

            if land_use.is_building() {
                if retrofit.is_some_and(|mask| mask.get(x, y)) {
                    demand *= params.retrofit_multiplier;
                }
                demand = demand.max(baseline * params.demand_floor);
            }
            demand
        })
        .collect();

    Ok(FieldData {
        data,
        width,
        height,
    })
}

/// Mean of the strictly positive values, 0 if there are none
fn positive_mean(field: &FieldData) -> f64 {
    let (sum, count) = field
        .as_slice()
        .iter()
        .filter(|&&v| v > 0.0)
        .fold((0.0, 0_usize), |(sum, count), &v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Diffuse the demand field for display, with parks and water acting as cooling sinks
pub fn smooth_demand(
    grid: &LandGrid,
    demand: &FieldData,
    params: &SmoothingParams,
) -> (FieldData, f64) {
    let reference = positive_mean(demand);
    let cells = grid.cells();
    let p = *params;

    let relaxed = relax(demand.clone(), p.steps, |cell| {
        let count = cell.neighbor_count();
        if count == 0 {
            return cell.value;
        }

        let diffused = cell.value + p.alpha * cell.laplacian() - p.beta * (cell.value - reference);
        let land_use = cells[cell.index];
        match land_use {
            LandUse::Green => -reference * p.green_sink,
            LandUse::Water => -reference * p.water_sink,
            LandUse::LowDensity | LandUse::HighDensity => {
                let (green, water) =
                    cell.neighbor_indices()
                        .fold((0_usize, 0_usize), |(g, w), idx| match cells[idx] {
                            LandUse::Green => (g + 1, w),
                            LandUse::Water => (g, w + 1),
                            _ => (g, w),
                        });
                let green_cooling = (green as f64 / count as f64) * p.green_cooling * reference;
                let water_cooling = (water as f64 / count as f64) * p.water_cooling * reference;
                let cooled = diffused - (green_cooling + water_cooling);
                if cooled < 0.0 {
                    reference * p.building_minimum
                } else {
                    cooled
                }
            }
            LandUse::Empty => diffused,
        }
    });

    (relaxed.field, reference)
}

/// Run all three energy passes
///
/// # Errors
/// Returns `OverlayMismatch` if `retrofit` does not match the grid
pub fn estimate_energy(
    grid: &LandGrid,
    retrofit: Option<&CellMask>,
    params: &EnergyParams,
) -> Result<EnergyOutcome, SimulationError> {
    let demand = adjusted_demand(grid, retrofit, params)?;
    let stats = EnergyStats::from_demand(grid, &demand);
    let (smoothed, reference_level) = smooth_demand(grid, &demand, &params.smoothing);
    let smoothed_summary = smoothed.summary();

    debug!(
        "Energy demand: total={:.2} kWh/day, ratio={:.3}, reference={:.3}, {} smoothing steps",
        stats.total, stats.efficiency_ratio, reference_level, params.smoothing.steps
    );

    Ok(EnergyOutcome {
        demand,
        smoothed,
        smoothed_summary,
        stats,
        reference_level,
    })
}
