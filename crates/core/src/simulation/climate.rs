//! Ambient temperature sourcing
//!
//! The ambient temperature normally comes from an external climate archive keyed by year and
//! coordinates. That archive lives behind [`ClimateSource`]; the core only consumes the value.
//! When no usable value arrives (source unavailable, `None`, NaN or infinite) the run degrades to
//! a deterministic [`FallbackPolicy`] instead of failing, and the substitution is recorded in the
//! result as [`AmbientSource::Fallback`].

use crate::core_types::Celsius;
use crate::error::SimulationError;
use crate::grid::Submission;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where a climate archive should look up the ambient temperature
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateQuery {
    /// Calendar year of the observation
    pub year: Option<i32>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
}

impl From<&Submission> for ClimateQuery {
    fn from(submission: &Submission) -> Self {
        Self {
            year: submission.year,
            latitude: submission.latitude,
            longitude: submission.longitude,
        }
    }
}

/// External provider of ambient temperatures (°C)
///
/// Implementations may return any value; the orchestrator treats `None` and non-finite
/// temperatures as missing.
pub trait ClimateSource {
    /// Mean ambient temperature for the query, if known
    fn ambient_temperature(&self, query: &ClimateQuery) -> Option<f64>;
}

impl<F> ClimateSource for F
where
    F: Fn(&ClimateQuery) -> Option<f64>,
{
    fn ambient_temperature(&self, query: &ClimateQuery) -> Option<f64> {
        self(query)
    }
}

/// Climate source that always answers with the same temperature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClimate(pub f64);

impl ClimateSource for FixedClimate {
    fn ambient_temperature(&self, _query: &ClimateQuery) -> Option<f64> {
        Some(self.0)
    }
}

/// Climate source that never has data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoClimate;

impl ClimateSource for NoClimate {
    fn ambient_temperature(&self, _query: &ClimateQuery) -> Option<f64> {
        None
    }
}

/// Substitution used when no ambient temperature is available
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Always use this temperature
    Fixed(Celsius),
    /// Draw uniformly from `[min, max]` with a seeded generator
    Seeded {
        /// Generator seed; equal seeds give equal temperatures
        seed: u64,
        /// Lowest temperature drawn
        min: Celsius,
        /// Highest temperature drawn
        max: Celsius,
    },
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy::Fixed(Celsius::new(15.0))
    }
}

impl FallbackPolicy {
    /// Reject temperatures that are not finite or lie below absolute zero, and inverted ranges
    ///
    /// # Errors
    /// Returns `InvalidParameter` describing the bad temperature or range
    pub fn validate(&self) -> Result<(), SimulationError> {
        let physical = |t: Celsius| Celsius::finite(t.value()).is_some();
        match *self {
            FallbackPolicy::Fixed(temperature) if !physical(temperature) => {
                Err(SimulationError::InvalidParameter(format!(
                    "fallback temperature {temperature} is not a physical temperature"
                )))
            }
            FallbackPolicy::Seeded { min, max, .. }
                if !(physical(min) && physical(max) && min <= max) =>
            {
                Err(SimulationError::InvalidParameter(format!(
                    "fallback range [{min}, {max}] is empty or not a physical range"
                )))
            }
            _ => Ok(()),
        }
    }

    /// The substitute temperature
    pub fn temperature(&self) -> Celsius {
        match *self {
            FallbackPolicy::Fixed(temperature) => temperature,
            FallbackPolicy::Seeded { seed, min, max } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let value = rng.random_range(min.value()..=max.value());
                Celsius::finite(value).unwrap_or(min)
            }
        }
    }
}

/// Origin of the ambient temperature a run used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientSource {
    /// Passed in directly by the caller
    Supplied,
    /// Answered by a [`ClimateSource`]
    Climate,
    /// Substituted by the [`FallbackPolicy`]
    Fallback,
}

/// Ambient temperature together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAmbient {
    /// Temperature used for the run
    pub temperature: Celsius,
    /// Where `temperature` came from
    pub source: AmbientSource,
}

impl ResolvedAmbient {
    /// Accept `raw` as coming from `source`, or fall back if it is missing or not finite
    pub fn resolve(raw: Option<f64>, source: AmbientSource, policy: &FallbackPolicy) -> Self {
        match raw.and_then(Celsius::finite) {
            Some(temperature) => Self {
                temperature,
                source,
            },
            None => {
                let temperature = policy.temperature();
                warn!(
                    "Ambient temperature unavailable ({:?}), using fallback {}",
                    raw, temperature
                );
                Self {
                    temperature,
                    source: AmbientSource::Fallback,
                }
            }
        }
    }

    /// Ask `climate` for the ambient temperature, falling back if it has none
    pub fn from_climate(
        climate: &dyn ClimateSource,
        query: &ClimateQuery,
        policy: &FallbackPolicy,
    ) -> Self {
        Self::resolve(
            climate.ambient_temperature(query),
            AmbientSource::Climate,
            policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_value_is_kept() {
        let resolved =
            ResolvedAmbient::resolve(Some(22.5), AmbientSource::Supplied, &FallbackPolicy::default());
        assert_eq!(resolved.temperature, Celsius::new(22.5));
        assert_eq!(resolved.source, AmbientSource::Supplied);
    }

    #[test]
    fn test_missing_and_nan_fall_back() {
        let policy = FallbackPolicy::Fixed(Celsius::new(9.0));
        for raw in [None, Some(f64::NAN), Some(f64::INFINITY)] {
            let resolved = ResolvedAmbient::resolve(raw, AmbientSource::Supplied, &policy);
            assert_eq!(resolved.temperature, Celsius::new(9.0));
            assert_eq!(resolved.source, AmbientSource::Fallback);
        }
    }

    #[test]
    fn test_climate_sources() {
        let query = ClimateQuery {
            year: Some(2020),
            latitude: Some(51.5),
            longitude: Some(-0.1),
        };
        let policy = FallbackPolicy::default();

        let fixed = ResolvedAmbient::from_climate(&FixedClimate(11.0), &query, &policy);
        assert_eq!(fixed.temperature, Celsius::new(11.0));
        assert_eq!(fixed.source, AmbientSource::Climate);

        let none = ResolvedAmbient::from_climate(&NoClimate, &query, &policy);
        assert_eq!(none.temperature, Celsius::new(15.0));
        assert_eq!(none.source, AmbientSource::Fallback);

        let by_year = |q: &ClimateQuery| q.year.map(|year| f64::from(year - 2000));
        let closure = ResolvedAmbient::from_climate(&by_year, &query, &policy);
        assert_eq!(closure.temperature, Celsius::new(20.0));
    }

    #[test]
    fn test_seeded_fallback_is_deterministic() {
        let policy = FallbackPolicy::Seeded {
            seed: 42,
            min: Celsius::new(5.0),
            max: Celsius::new(25.0),
        };
        let first = policy.temperature();
        assert_eq!(first, policy.temperature());
        assert!((5.0..=25.0).contains(&first.value()));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let policy = FallbackPolicy::Seeded {
            seed: 1,
            min: Celsius::new(30.0),
            max: Celsius::new(10.0),
        };
        assert!(policy.validate().is_err());
        assert!(FallbackPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_below_absolute_zero_rejected() {
        let fixed: FallbackPolicy = serde_json::from_str(r#"{"fixed":-500.0}"#).unwrap();
        assert!(matches!(
            fixed.validate(),
            Err(SimulationError::InvalidParameter(_))
        ));

        let seeded: FallbackPolicy =
            serde_json::from_str(r#"{"seeded":{"seed":3,"min":-400.0,"max":10.0}}"#).unwrap();
        assert!(seeded.validate().is_err());

        let coldest: FallbackPolicy = serde_json::from_str(r#"{"fixed":-273.15}"#).unwrap();
        assert!(coldest.validate().is_ok());
    }

    #[test]
    fn test_policy_json_shape() {
        let json = serde_json::to_string(&FallbackPolicy::default()).unwrap();
        assert_eq!(json, r#"{"fixed":15.0}"#);
        let parsed: FallbackPolicy =
            serde_json::from_str(r#"{"seeded":{"seed":7,"min":0.0,"max":1.0}}"#).unwrap();
        assert!(matches!(parsed, FallbackPolicy::Seeded { seed: 7, .. }));
    }
}
