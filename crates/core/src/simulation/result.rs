//! Simulation result document
//!
//! A [`SimulationResult`] holds every field of one run together with its statistics and the
//! metadata needed to reproduce it. It is handed to the rendering collaborator as JSON; floats
//! are written with enough digits to parse back to the same bits, so a round trip yields
//! identical matrices.

use super::climate::AmbientSource;
use crate::core_types::{Celsius, LandUse};
use crate::error::SimulationError;
use crate::solver::{EnergyOutcome, HeatOutcome, LoadOutcome, WasteOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// How a run was set up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Ambient temperature used by the heat and waste engines
    pub ambient: Celsius,
    /// Where `ambient` came from
    pub ambient_source: AmbientSource,
    /// Cells whose land-use code was not recognised and became empty land
    pub unknown_codes: usize,
    /// Cells flagged as cool-roof retrofits
    pub retrofitted_cells: usize,
    /// Heat diffusion steps
    pub heat_steps: usize,
    /// Energy smoothing steps
    pub smoothing_steps: usize,
    /// Load spreading steps
    pub load_steps: usize,
    /// Waste transport steps
    pub waste_steps: usize,
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Run setup
    pub metadata: RunMetadata,
    /// Surface temperature (°C)
    pub temperature: HeatOutcome,
    /// Energy demand (kWh/day)
    pub energy: EnergyOutcome,
    /// Waste (kg)
    pub waste: WasteOutcome,
    /// Infrastructure load
    pub load: LoadOutcome,
    /// Percentage of cells per land use
    pub composition: BTreeMap<LandUse, f64>,
}

impl SimulationResult {
    /// Encode as compact JSON
    ///
    /// # Errors
    /// Returns `Serialization` if encoding fails
    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self).map_err(|e| SimulationError::Serialization(e.to_string()))
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns `Serialization` if the document is malformed
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| SimulationError::Serialization(e.to_string()))
    }

    /// Write the result to a JSON file
    ///
    /// # Errors
    /// Returns error if the result cannot be serialized or the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimulationError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SimulationError::Serialization(e.to_string()))?;
        fs::write(path, contents).map_err(|e| SimulationError::Io(e.to_string()))
    }

    /// Read a result from a JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let contents = fs::read_to_string(path).map_err(|e| SimulationError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }
}
