//! Infrastructure load distribution
//!
//! Each housing cell puts a base load on the local network; the load then spreads slowly
//! to neighboring cells, pulling every cell toward the mean of its neighbors:
//!
//! ```text
//! L' = L + rate·(mean(neighbors) − L)·damping
//! ```
//!
//! The resulting variance is the network's unevenness, reported as a grid efficiency score.
//! `rate·damping` above 1 would overshoot the neighbor mean, so validation caps it there.

use super::fields::{FieldData, FieldSummary};
use super::stencil::relax;
use crate::error::{ensure_rate, SimulationError};
use crate::grid::LandGrid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Load spreading parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadParams {
    /// Number of relaxation steps
    pub steps: usize,
    /// Distribution rate toward the neighbor mean
    pub rate: f64,
    /// Extra damping applied to every transfer
    pub damping: f64,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            steps: 50,
            rate: 0.05,
            damping: 0.1,
        }
    }
}

impl LoadParams {
    /// Reject negative or non-finite rates, and a combined step past the neighbor mean
    ///
    /// # Errors
    /// Returns `InvalidParameter` naming the offending rate
    pub fn validate(&self) -> Result<(), SimulationError> {
        ensure_rate("load.rate", self.rate)?;
        ensure_rate("load.damping", self.damping)?;
        let step = self.rate * self.damping;
        if step > 1.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "load: rate * damping must not exceed 1, got {step}"
            )));
        }
        Ok(())
    }
}

/// Load field statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Heaviest cell load
    pub max_load: f64,
    /// Mean cell load
    pub mean_load: f64,
    /// Variance of the load
    pub variance: f64,
    /// `1 / (variance + 1)`
    pub grid_efficiency: f64,
}

impl From<FieldSummary> for LoadStats {
    fn from(summary: FieldSummary) -> Self {
        Self {
            max_load: summary.max,
            mean_load: summary.mean,
            variance: summary.variance,
            grid_efficiency: summary.efficiency(),
        }
    }
}

/// Result of the load distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOutcome {
    /// Distributed load per cell
    pub load: FieldData,
    /// Statistics of `load`
    pub stats: LoadStats,
}

/// Spread base loads across the network
pub fn distribute_load(grid: &LandGrid, params: &LoadParams) -> LoadOutcome {
    let (width, height) = grid.dimensions();
    let initial = FieldData {
        data: grid
            .cells()
            .iter()
            .map(|land_use| land_use.properties().base_load)
            .collect(),
        width,
        height,
    };
    let LoadParams {
        steps,
        rate,
        damping,
    } = *params;

    let relaxed = relax(initial, steps, |cell| match cell.neighbor_mean() {
        Some(mean) => cell.value + rate * (mean - cell.value) * damping,
        None => cell.value,
    });
    let stats = LoadStats::from(relaxed.field.summary());

    debug!(
        "Load distribution: {} steps, max={:.3}, efficiency={:.4}",
        steps, stats.max_load, stats.grid_efficiency
    );

    LoadOutcome {
        load: relaxed.field,
        stats,
    }
}
