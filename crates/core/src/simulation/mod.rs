//! Orchestrated simulation runs
//!
//! [`Simulation`] sequences the field engines over one land-use grid:
//! - ambient temperature from the caller, a [`ClimateSource`] or the [`FallbackPolicy`]
//! - heat diffusion, energy demand and infrastructure load
//! - waste generation driven by the final temperature field
//!
//! The outcome of every engine is gathered into a [`SimulationResult`].

pub mod climate;
pub mod orchestrator;
pub mod params;
mod profiler;
pub mod result;

// Re-export public types
pub use climate::{
    AmbientSource, ClimateQuery, ClimateSource, FallbackPolicy, FixedClimate, NoClimate,
    ResolvedAmbient,
};
pub use orchestrator::{run_simulation, Simulation};
pub use params::SimulationParams;
pub use result::{RunMetadata, SimulationResult};
