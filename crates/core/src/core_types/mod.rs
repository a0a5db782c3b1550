//! Core types and utilities

pub mod land_use;
pub mod units;

pub use land_use::{LandUse, LandUseProperties};
pub use units::{Celsius, CelsiusDelta};
