//! Urban heat-island diffusion
//!
//! Surface temperature starts at ambient plus a per-land-use offset and is relaxed with
//! an explicit finite-difference heat equation on the 4-neighbor grid:
//!
//! ```text
//! T' = T + α·∇²T − β·(T − T_ambient)
//! ```
//!
//! Where:
//! - `∇²T`: discrete Laplacian over in-bounds neighbors only (no padding, no wraparound)
//! - `α`: diffusion rate between neighboring cells
//! - `β`: relaxation of every cell back toward ambient
//!
//! Explicit stepping is stable while `4α + β ≤ 1`; [`HeatParams::validate`] rejects anything above.

use super::fields::{FieldData, FieldSummary};
use super::stencil::relax;
use crate::core_types::Celsius;
use crate::error::{ensure_rate, ensure_stable, SimulationError};
use crate::grid::LandGrid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Diffusion parameters for the temperature field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatParams {
    /// Number of relaxation steps
    pub steps: usize,
    /// Diffusion rate α
    pub alpha: f64,
    /// Decay-to-ambient rate β
    pub beta: f64,
}

impl Default for HeatParams {
    fn default() -> Self {
        Self {
            steps: 200,
            alpha: 0.01,
            beta: 0.01,
        }
    }
}

impl HeatParams {
    /// Reject negative or non-finite rates and unstable steps
    ///
    /// # Errors
    /// Returns `InvalidParameter` naming the offending rate
    pub fn validate(&self) -> Result<(), SimulationError> {
        ensure_rate("heat.alpha", self.alpha)?;
        ensure_rate("heat.beta", self.beta)?;
        ensure_stable("heat", self.alpha, self.beta)
    }
}

/// Result of a heat diffusion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatOutcome {
    /// Temperature after the last step (°C)
    pub temperature: FieldData,
    /// Temperature one step before the last, equal to `temperature` for zero steps
    pub previous: FieldData,
    /// Statistics of `temperature`; `min`/`max` drive colour normalisation downstream
    pub summary: FieldSummary,
    /// Largest per-cell change in the last step
    pub residual: f64,
}

/// Initial temperature: ambient plus the thermal offset of each cell's land use
pub fn initial_temperature(grid: &LandGrid, ambient: Celsius) -> FieldData {
    let (width, height) = grid.dimensions();
    FieldData {
        data: grid
            .cells()
            .iter()
            .map(|land_use| *(ambient + land_use.thermal_offset()))
            .collect(),
        width,
        height,
    }
}

/// Relax the surface temperature of `grid` under the given ambient temperature
pub fn simulate_heat(grid: &LandGrid, ambient: Celsius, params: &HeatParams) -> HeatOutcome {
    let ambient_c = ambient.value();
    let HeatParams { steps, alpha, beta } = *params;

    let relaxed = relax(initial_temperature(grid, ambient), steps, |cell| {
        cell.value + alpha * cell.laplacian() - beta * (cell.value - ambient_c)
    });

    let summary = relaxed.field.summary();
    let residual = relaxed.residual();

    debug!(
        "Heat diffusion: {} steps, T range [{:.3}, {:.3}]°C, residual={:.2e}",
        steps, summary.min, summary.max, residual
    );

    HeatOutcome {
        temperature: relaxed.field,
        previous: relaxed.previous,
        summary,
        residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::LandUse;
    use approx::assert_relative_eq;

    fn mixed_grid() -> LandGrid {
        LandGrid::parse("bbbddggbbb\nbbbdgggbbb\nbbbgggbbbb\nlbbggbbbbb\nddggbbbbbl").unwrap()
    }

    #[test]
    fn test_zero_steps_is_ambient_plus_offset() {
        let grid = LandGrid::parse("ldbge\nxldbg").unwrap();
        let ambient = Celsius::new(5.0);
        let params = HeatParams {
            steps: 0,
            ..HeatParams::default()
        };
        let outcome = simulate_heat(&grid, ambient, &params);

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let expected = 5.0 + *grid.get(x, y).thermal_offset();
                assert_eq!(outcome.temperature.get(x, y), expected);
            }
        }
        assert_eq!(outcome.residual, 0.0);
    }

    #[test]
    fn test_single_step_matches_hand_computation() {
        // 2x1: high density (T=21.5) next to water (T=18.5), ambient 20
        let grid = LandGrid::parse("db").unwrap();
        let params = HeatParams {
            steps: 1,
            alpha: 0.1,
            beta: 0.05,
        };
        let outcome = simulate_heat(&grid, Celsius::new(20.0), &params);

        let d = 21.5 + 0.1 * (18.5 - 21.5) - 0.05 * (21.5 - 20.0);
        let b = 18.5 + 0.1 * (21.5 - 18.5) - 0.05 * (18.5 - 20.0);
        assert_relative_eq!(outcome.temperature.get(0, 0), d);
        assert_relative_eq!(outcome.temperature.get(1, 0), b);
        assert_eq!(outcome.previous.get(0, 0), 21.5);
    }

    #[test]
    fn test_heat_spreads_from_dense_blocks() {
        let grid = mixed_grid();
        let outcome = simulate_heat(&grid, Celsius::new(5.0), &HeatParams::default());

        // Dense cells stay warmer than water cells, but the contrast shrinks
        let dense = outcome.temperature.get(3, 0);
        let water = outcome.temperature.get(9, 2);
        assert!(dense > water);
        assert!(dense - water < 1.5 - (-1.5));
        assert!(outcome.summary.max <= 5.0 + 1.5);
        assert!(outcome.summary.min >= 5.0 - 1.5);
    }

    #[test]
    fn test_uniform_grid_stays_uniform() {
        for land_use in LandUse::ALL {
            let rows = vec![vec![land_use.code(); 6]; 4];
            let grid = LandGrid::from_code_rows(&rows).unwrap();
            for steps in [1, 17, 200] {
                let params = HeatParams {
                    steps,
                    ..HeatParams::default()
                };
                let summary = simulate_heat(&grid, Celsius::new(12.0), &params).summary;
                assert!(
                    summary.max - summary.min < 1e-9,
                    "{land_use:?} after {steps} steps spans {}",
                    summary.max - summary.min
                );
            }
        }
    }

    #[test]
    fn test_stronger_diffusion_lowers_variance() {
        let grid = mixed_grid();
        let ambient = Celsius::new(20.0);
        let variance = |alpha: f64| {
            let params = HeatParams {
                steps: 50,
                alpha,
                beta: 0.01,
            };
            simulate_heat(&grid, ambient, &params).summary.variance
        };

        let slow = variance(0.01);
        let fast = variance(0.05);
        let faster = variance(0.1);
        assert!(fast < slow, "variance {fast} should be below {slow}");
        assert!(faster < fast, "variance {faster} should be below {fast}");
    }

    #[test]
    fn test_negative_rates_rejected() {
        let params = HeatParams {
            alpha: -0.01,
            ..HeatParams::default()
        };
        assert!(params.validate().is_err());
        assert!(HeatParams::default().validate().is_ok());
    }

    #[test]
    fn test_unstable_rates_rejected() {
        let params = HeatParams {
            alpha: 2.0,
            ..HeatParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidParameter(_))
        ));

        // A convex step near the limit is still accepted
        let params = HeatParams {
            alpha: 0.2,
            beta: 0.1,
            ..HeatParams::default()
        };
        assert!(params.validate().is_ok());
    }
}
