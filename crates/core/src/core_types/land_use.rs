//! Land-use categories and their constant tables
//!
//! Every grid cell holds exactly one [`LandUse`]. All per-type constants live in
//! [`LandUseProperties`] tables and are reached through an exhaustive `match`, so there
//! is no lookup that can miss: unrecognised input codes become [`LandUse::Empty`], whose
//! table contributes nothing.

use super::units::CelsiusDelta;
use serde::{Deserialize, Serialize};

/// Per-type constants used by the heat, energy, waste and load engines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandUseProperties {
    /// Surface temperature offset above ambient (°C)
    pub thermal_offset: CelsiusDelta,
    /// Annual energy demand per floor area (kWh/m²/yr)
    pub baseline_demand: f64,
    /// Residents per cell, drives waste generation
    pub population: f64,
    /// Base infrastructure load per cell (kWh/day)
    pub base_load: f64,
}

impl LandUseProperties {
    /// Detached and low-rise housing
    pub const LOW_DENSITY: LandUseProperties = LandUseProperties {
        thermal_offset: CelsiusDelta::new(1.0),
        baseline_demand: 60.0,
        population: 50.0,
        base_load: 15.0,
    };

    /// High-rise housing and commercial blocks
    pub const HIGH_DENSITY: LandUseProperties = LandUseProperties {
        thermal_offset: CelsiusDelta::new(1.5),
        baseline_demand: 160.0,
        population: 500.0,
        base_load: 45.0,
    };

    /// Lakes, rivers, canals
    pub const WATER: LandUseProperties = LandUseProperties {
        thermal_offset: CelsiusDelta::new(-1.5),
        baseline_demand: 0.0,
        population: 0.0,
        base_load: 0.0,
    };

    /// Parks and other vegetated open space
    pub const GREEN: LandUseProperties = LandUseProperties {
        thermal_offset: CelsiusDelta::new(-1.0),
        baseline_demand: 0.0,
        population: 0.0,
        base_load: 0.0,
    };

    /// Neutral default: no contribution to any field
    pub const EMPTY: LandUseProperties = LandUseProperties {
        thermal_offset: CelsiusDelta::new(0.0),
        baseline_demand: 0.0,
        population: 0.0,
        base_load: 0.0,
    };
}

/// Land-use category of a single grid cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LandUse {
    /// Low-density residential (`l`)
    LowDensity,
    /// High-density residential / commercial (`d`)
    HighDensity,
    /// Water body (`b`)
    Water,
    /// Green space (`g`)
    Green,
    /// Empty land or anything unrecognised (`e`)
    #[default]
    Empty,
}

impl LandUse {
    /// All variants, in table order
    pub const ALL: [LandUse; 5] = [
        LandUse::LowDensity,
        LandUse::HighDensity,
        LandUse::Water,
        LandUse::Green,
        LandUse::Empty,
    ];

    /// Parse a single-character code, case-insensitive
    ///
    /// Returns `None` for codes outside the known set so the caller can count them;
    /// use [`LandUse::from_code_or_default`] when only the value matters.
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_lowercase() {
            'l' => Some(Self::LowDensity),
            'd' => Some(Self::HighDensity),
            'b' => Some(Self::Water),
            'g' => Some(Self::Green),
            'e' => Some(Self::Empty),
            _ => None,
        }
    }

    /// Parse a code, substituting [`LandUse::Empty`] for anything unknown
    pub fn from_code_or_default(code: char) -> Self {
        Self::from_code(code).unwrap_or_default()
    }

    /// Single-character code used in text grids
    pub const fn code(self) -> char {
        match self {
            Self::LowDensity => 'l',
            Self::HighDensity => 'd',
            Self::Water => 'b',
            Self::Green => 'g',
            Self::Empty => 'e',
        }
    }

    /// Label shown in the city builder palette
    pub const fn label(self) -> &'static str {
        match self {
            Self::LowDensity => "Low Density Building",
            Self::HighDensity => "High Density Building",
            Self::Water => "Water",
            Self::Green => "Green Spaces",
            Self::Empty => "Empty Land",
        }
    }

    /// Constant table for this type
    pub const fn properties(self) -> &'static LandUseProperties {
        match self {
            Self::LowDensity => &LandUseProperties::LOW_DENSITY,
            Self::HighDensity => &LandUseProperties::HIGH_DENSITY,
            Self::Water => &LandUseProperties::WATER,
            Self::Green => &LandUseProperties::GREEN,
            Self::Empty => &LandUseProperties::EMPTY,
        }
    }

    /// Temperature offset above ambient (°C)
    #[inline]
    pub fn thermal_offset(self) -> CelsiusDelta {
        self.properties().thermal_offset
    }

    /// Annual energy demand per square metre (kWh/m²/yr)
    #[inline]
    pub fn baseline_demand(self) -> f64 {
        self.properties().baseline_demand
    }

    /// Residents per cell
    #[inline]
    pub fn population(self) -> f64 {
        self.properties().population
    }

    /// Housing cells: the only ones that consume energy and generate waste
    #[inline]
    pub const fn is_building(self) -> bool {
        matches!(self, Self::LowDensity | Self::HighDensity)
    }
}
