//! Run configuration
//!
//! Every engine keeps its own parameter struct next to its implementation; this module
//! bundles them into one document that can be loaded from and saved to JSON. All structs use
//! `#[serde(default)]`, so a partial document such as `{"heat": {"steps": 50}}` is valid.

use super::climate::FallbackPolicy;
use crate::error::SimulationError;
use crate::solver::{EnergyParams, HeatParams, LoadParams, WasteParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters for one orchestrated run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Heat diffusion
    pub heat: HeatParams,
    /// Energy demand and its smoothing pass
    pub energy: EnergyParams,
    /// Waste generation and transport
    pub waste: WasteParams,
    /// Infrastructure load spreading
    pub load: LoadParams,
    /// Ambient temperature substitution
    pub fallback: FallbackPolicy,
}

impl SimulationParams {
    /// Check every engine's parameters
    ///
    /// # Errors
    /// Returns the first `InvalidParameter` found
    pub fn validate(&self) -> Result<(), SimulationError> {
        self.heat.validate()?;
        self.energy.validate()?;
        self.waste.validate()?;
        self.load.validate()?;
        self.fallback.validate()
    }

    /// Parse and validate a JSON parameter document
    ///
    /// # Errors
    /// Returns `Serialization` for malformed JSON, `InvalidParameter` for bad values
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| SimulationError::Serialization(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let contents = fs::read_to_string(path).map_err(|e| SimulationError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Save parameters to a JSON file
    ///
    /// # Errors
    /// Returns error if the parameters cannot be serialized or the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimulationError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SimulationError::Serialization(e.to_string()))?;
        fs::write(path, contents).map_err(|e| SimulationError::Io(e.to_string()))
    }
}
