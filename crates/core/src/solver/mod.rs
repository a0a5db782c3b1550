//! Field engines
//!
//! Every engine produces a [`FieldData`] over the land-use grid and advances it with the
//! shared synchronous stencil in [`stencil`]:
//!
//! - [`heat`]: urban heat-island temperature
//! - [`energy`]: building energy demand with neighborhood modifiers and smoothing
//! - [`load`]: infrastructure load spreading
//! - [`waste`]: waste generation and rule-based transport
//!
//! # Example
//!
//! ```rust
//! use urban_sim_core::core_types::Celsius;
//! use urban_sim_core::grid::LandGrid;
//! use urban_sim_core::solver::{simulate_heat, HeatParams};
//!
//! let grid = LandGrid::parse("dlg\nlbg").unwrap();
//! let heat = simulate_heat(&grid, Celsius::new(20.0), &HeatParams::default());
//! assert!(heat.summary.max > heat.summary.min);
//! ```

pub mod energy;
mod fields;
pub mod heat;
pub mod load;
pub mod stencil;
pub mod waste;

// Re-exports
pub use energy::{
    estimate_energy, EnergyOutcome, EnergyParams, EnergyStats, NeighborhoodMix, SmoothingParams,
    TypeDemand,
};
pub use fields::{FieldData, FieldSummary};
pub use heat::{simulate_heat, HeatOutcome, HeatParams};
pub use load::{distribute_load, LoadOutcome, LoadParams, LoadStats};
pub use stencil::{relax, relax_step, CellView, Relaxation};
pub use waste::{
    generate_waste, simulate_waste, transport_waste, FlowCoefficients, WasteOutcome, WasteParams,
    WasteStats,
};
