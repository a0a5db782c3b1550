//! City-builder submissions
//!
//! The builder UI posts its plan as JSON: a square `grid` of painted tiles, each with a
//! palette `type` label and a display `color`, plus optional coordinates used to look
//! up the ambient temperature. Tiles may also be plain code strings (`"d"`).
//!
//! ```json
//! {
//!   "gridSize": 2,
//!   "latitude": "-31.95",
//!   "longitude": "115.86",
//!   "grid": [
//!     [{ "color": "#4b5563", "type": "High Density Building" }, { "type": "Water" }],
//!     ["g", "empty"]
//!   ]
//! }
//! ```

use super::LandGrid;
use crate::core_types::LandUse;
use crate::error::SimulationError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::sync::LazyLock;

/// Lower-cased palette labels, snake-case names and single-letter codes
static LAND_USE_ALIASES: LazyLock<FxHashMap<&'static str, LandUse>> = LazyLock::new(|| {
    let mut aliases = FxHashMap::default();
    for land_use in LandUse::ALL {
        aliases.insert(land_use.label_lowercase(), land_use);
    }
    aliases.extend([
        ("l", LandUse::LowDensity),
        ("low_density", LandUse::LowDensity),
        ("d", LandUse::HighDensity),
        ("high_density", LandUse::HighDensity),
        ("b", LandUse::Water),
        ("g", LandUse::Green),
        ("green", LandUse::Green),
        ("green space", LandUse::Green),
        ("e", LandUse::Empty),
        ("empty", LandUse::Empty),
    ]);
    aliases
});

impl LandUse {
    fn label_lowercase(self) -> &'static str {
        match self {
            Self::LowDensity => "low density building",
            Self::HighDensity => "high density building",
            Self::Water => "water",
            Self::Green => "green spaces",
            Self::Empty => "empty land",
        }
    }

    /// Resolve a palette label, snake-case name or code, case-insensitive
    pub fn from_label(label: &str) -> Option<Self> {
        LAND_USE_ALIASES
            .get(label.trim().to_ascii_lowercase().as_str())
            .copied()
    }
}

/// One painted tile; its display color is ignored
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SubmittedCell {
    Tile {
        #[serde(rename = "type")]
        kind: String,
    },
    Code(String),
}

impl SubmittedCell {
    fn label(&self) -> &str {
        match self {
            Self::Tile { kind, .. } => kind,
            Self::Code(code) => code,
        }
    }
}

/// A decoded builder submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Declared side length, checked against the grid rows when present
    #[serde(default)]
    pub grid_size: Option<usize>,
    grid: Vec<Vec<SubmittedCell>>,
    /// Site latitude in degrees
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    /// Site longitude in degrees
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    /// Climate year to look up
    #[serde(default)]
    pub year: Option<i32>,
}

/// Accept a number, a numeric string, an empty string or null
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Submission {
    /// Decode a submission from JSON text
    ///
    /// # Errors
    /// Returns `Submission` if the JSON does not describe a builder plan
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| SimulationError::Submission(e.to_string()))
    }

    /// Read and decode a submission file
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `Submission` if it cannot be decoded
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| SimulationError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Convert the painted tiles into a land-use grid
    ///
    /// Unknown labels become `Empty`, exactly as unknown codes do.
    ///
    /// # Errors
    /// Returns `Submission` if `gridSize` disagrees with the rows, otherwise the grid's
    /// structural errors
    pub fn to_grid(&self) -> Result<LandGrid, SimulationError> {
        if let Some(size) = self.grid_size {
            if size != self.grid.len() {
                return Err(SimulationError::Submission(format!(
                    "gridSize is {size} but the grid has {} rows",
                    self.grid.len()
                )));
            }
        }

        let rows: Vec<Vec<Option<LandUse>>> = self
            .grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| LandUse::from_label(cell.label()))
                    .collect()
            })
            .collect();
        LandGrid::from_parsed_rows(&rows)
    }
}
