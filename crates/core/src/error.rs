//! Error taxonomy for grid validation and simulation setup
//!
//! Only structural problems are errors. Unknown land-use codes and missing ambient
//! temperatures are absorbed with a documented substitution and never reach this type.

/// Errors that can occur before a simulation run starts
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Grid has no rows or its first row has no cells
    EmptyGrid,
    /// A row differs in length from the first row
    RaggedRow {
        /// Zero-based index of the offending row
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        found: usize,
    },
    /// A per-cell overlay does not match the grid dimensions
    OverlayMismatch {
        /// Grid dimensions as `(width, height)`
        expected: (usize, usize),
        /// Overlay dimensions as `(width, height)`
        found: (usize, usize),
    },
    /// A rate, coefficient or constant is negative or not finite
    InvalidParameter(String),
    /// A builder submission could not be understood
    Submission(String),
    /// A result or parameter document could not be encoded or decoded
    Serialization(String),
    /// Reading or writing a file failed
    Io(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::EmptyGrid => write!(f, "Grid must have at least one row and column"),
            SimulationError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "Grid row {row} has {found} cells, expected {expected}"
            ),
            SimulationError::OverlayMismatch { expected, found } => write!(
                f,
                "Overlay is {}x{}, grid is {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            SimulationError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            SimulationError::Submission(msg) => write!(f, "Invalid submission: {msg}"),
            SimulationError::Serialization(msg) => write!(f, "Serialization failed: {msg}"),
            SimulationError::Io(msg) => write!(f, "I/O failed: {msg}"),
        }
    }
}

impl std::error::Error for SimulationError {}

/// Reject negative or non-finite rates
pub(crate) fn ensure_rate(name: &str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

/// Reject a four-neighbour diffusion step that is not a convex update
///
/// `4 * alpha + beta` above 1 lets the explicit scheme oscillate and grow without bound.
pub(crate) fn ensure_stable(name: &str, alpha: f64, beta: f64) -> Result<(), SimulationError> {
    let weight = 4.0 * alpha + beta;
    if weight <= 1.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter(format!(
            "{name}: 4 * alpha + beta must not exceed 1, got {weight}"
        )))
    }
}
