//! Urban Simulation Core Library
//!
//! Grid-based urban planning simulation. A city plan is a rectangular grid of land-use cells
//! (low-density housing, high-density housing, water, green space, empty land); three coupled
//! scalar-field engines run over it:
//!
//! - heat-island diffusion of surface temperature
//! - building energy demand with neighborhood and retrofit modifiers
//! - waste generation and rule-based transport between land uses
//!
//! An infrastructure-load spreading pass and land-use composition complete the report.
//! Every engine advances its field with the same synchronous 4-neighbor stencil, and every
//! run is a pure function of grid, ambient temperature and parameters.
//!
//! ## Example
//!
//! ```rust
//! use urban_sim_core::{LandGrid, Simulation};
//!
//! let grid = LandGrid::parse("dlgb\nldgb\nggld\nbbdl").unwrap();
//! let result = Simulation::default().run(&grid, Some(20.0), None).unwrap();
//! assert_eq!(result.waste.waste.width, 4);
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Land-use grid and builder input
pub mod grid;

// Field engines
pub mod solver;

// Orchestration, configuration and results
pub mod simulation;

// Re-export core types
pub use core_types::{Celsius, CelsiusDelta, LandUse};
pub use error::SimulationError;
pub use grid::{CellMask, LandGrid, Submission};

// Re-export engine types
pub use solver::{FieldData, FieldSummary, FlowCoefficients};

// Re-export orchestration types
pub use simulation::{
    run_simulation, AmbientSource, ClimateQuery, ClimateSource, FallbackPolicy, Simulation,
    SimulationParams, SimulationResult,
};
