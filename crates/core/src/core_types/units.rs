//! Semantic unit types for temperatures
//!
//! Ambient and baseline temperatures cross the boundary to the climate collaborator,
//! so they are wrapped in newtypes instead of travelling as bare `f64`. Scalar fields
//! themselves stay as raw `f64` for the relaxation loops.
//!
//! # Usage
//! ```
//! use urban_sim_core::core_types::units::{Celsius, CelsiusDelta};
//!
//! let ambient = Celsius::new(20.0);
//! let hot = ambient + CelsiusDelta::new(1.5);
//! assert_eq!(*hot, 21.5);
//! assert!(Celsius::finite(f64::NAN).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Sub};

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Celsius(f64);

impl Eq for Celsius {}

impl PartialOrd for Celsius {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Celsius {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Celsius {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Celsius {
    /// Absolute zero in Celsius
    pub const ABSOLUTE_ZERO: Celsius = Celsius(-273.15);

    /// Create a new Celsius temperature. Asserts value >= absolute zero (-273.15°C).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= -273.15,
            "Celsius::new: value is below absolute zero (-273.15°C)"
        );
        Celsius(value)
    }

    /// Accept a raw reading only if it is a usable temperature
    ///
    /// Returns `None` for NaN, infinities and values below absolute zero, which is how
    /// a missing climate-archive value shows up.
    #[inline]
    #[must_use]
    pub fn finite(value: f64) -> Option<Self> {
        (value.is_finite() && value >= *Self::ABSOLUTE_ZERO).then_some(Celsius(value))
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Celsius> for f64 {
    fn from(c: Celsius) -> f64 {
        c.0
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°C", self.0)
    }
}

/// Temperature difference in Celsius, used for per-type thermal offsets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct CelsiusDelta(f64);

impl CelsiusDelta {
    /// Create a temperature delta (can be any value, positive or negative)
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        CelsiusDelta(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Deref for CelsiusDelta {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Add<CelsiusDelta> for Celsius {
    type Output = Celsius;
    fn add(self, rhs: CelsiusDelta) -> Celsius {
        Celsius(self.0 + rhs.0)
    }
}

impl Sub<Celsius> for Celsius {
    type Output = CelsiusDelta;
    fn sub(self, rhs: Celsius) -> CelsiusDelta {
        CelsiusDelta(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_rejects_unusable_readings() {
        assert_eq!(Celsius::finite(12.5), Some(Celsius::new(12.5)));
        assert!(Celsius::finite(f64::NAN).is_none());
        assert!(Celsius::finite(f64::NEG_INFINITY).is_none());
        assert!(Celsius::finite(-300.0).is_none());
    }

    #[test]
    #[should_panic(expected = "below absolute zero")]
    fn test_new_panics_below_absolute_zero() {
        let _ = Celsius::new(-274.0);
    }

    #[test]
    fn test_delta_arithmetic() {
        let t = Celsius::new(10.0) + CelsiusDelta::new(-1.5);
        assert_eq!(*t, 8.5);
        assert_eq!(*(Celsius::new(20.0) - Celsius::new(15.0)), 5.0);
    }

    #[test]
    fn test_total_ordering() {
        let a = Celsius::new(5.0);
        let b = Celsius::new(7.0);
        assert_eq!(a.max(b), b);
        assert_eq!(a.min(b), a);
    }
}
