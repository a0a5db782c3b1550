//! Scalar field storage
//!
//! Every derived quantity (temperature, energy demand, waste, infrastructure load) is a
//! [`FieldData`]: one `f64` per grid cell in row-major order. Fields are `f64` so that
//! repeated relaxation steps stay reproducible against reference values.

use serde::{Deserialize, Serialize};

/// Scalar field container
///
/// Stores 2D field data as a flat `Vec<f64>` in row-major order (`y * width + x`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    /// Field values in row-major order (y * width + x)
    pub data: Vec<f64>,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
}

impl FieldData {
    /// Create a new field with given dimensions, initialized to zero
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Create a new field with given dimensions, initialized to a value
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create a field from nested rows
    ///
    /// Returns `None` if the rows are empty or ragged.
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let (width, height) = crate::grid::land_grid::rectangular_dimensions(rows).ok()?;
        Some(Self {
            data: rows.iter().flatten().copied().collect(),
            width,
            height,
        })
    }

    /// Nested rows, for collaborators that expect a matrix
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.width).map(<[f64]>::to_vec).collect()
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Sum of all cells
    #[must_use]
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Largest absolute per-cell difference from another field of the same size
    #[must_use]
    pub fn max_abs_diff(&self, other: &FieldData) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Summary statistics over every cell
    #[must_use]
    pub fn summary(&self) -> FieldSummary {
        FieldSummary::of(&self.data)
    }
}

/// Summary statistics of a scalar field
///
/// `min` and `max` are what the rendering collaborator normalises against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    /// Smallest cell value
    pub min: f64,
    /// Largest cell value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Sum over all cells
    pub total: f64,
    /// Population variance
    pub variance: f64,
}

impl FieldSummary {
    /// Compute statistics over a slice of values
    ///
    /// An empty slice yields all zeros.
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                total: 0.0,
                variance: 0.0,
            };
        }

        let count = values.len() as f64;
        let total: f64 = values.iter().sum();
        let mean = total / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            min,
            max,
            mean,
            total,
            variance,
        }
    }

    /// Uniformity score in `(0, 1]`: `1 / (variance + 1)`, higher is more even
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        1.0 / (self.variance + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_field_creation() {
        let field = FieldData::new(10, 20);
        assert_eq!(field.width, 10);
        assert_eq!(field.height, 20);
        assert_eq!(field.data.len(), 200);
        assert!(field.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_field_get_set() {
        let mut field = FieldData::new(10, 10);
        field.set(3, 4, 123.45);
        assert_eq!(field.get(3, 4), 123.45);

        // Verify row-major indexing
        let index = 4 * 10 + 3;
        assert_eq!(field.data[index], 123.45);
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = FieldData::new(10, 10);
        let _ = field.get(10, 5);
    }

    #[test]
    fn test_rows_conversion() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let field = FieldData::from_rows(&rows).unwrap();
        assert_eq!(field.width, 3);
        assert_eq!(field.height, 2);
        assert_eq!(field.get(2, 1), 6.0);
        assert_eq!(field.to_rows(), rows);

        assert!(FieldData::from_rows(&[vec![1.0], vec![]]).is_none());
        assert!(FieldData::from_rows(&[]).is_none());
    }

    #[test]
    fn test_summary_statistics() {
        let field = FieldData::from_rows(&[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        let summary = field.summary();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 6.0);
        assert_eq!(summary.total, 12.0);
        assert_eq!(summary.mean, 3.0);
        // ((−2)² + (−1)² + 0² + 3²) / 4 = 3.5
        assert_relative_eq!(summary.variance, 3.5);
        assert_relative_eq!(summary.efficiency(), 1.0 / 4.5);
    }

    #[test]
    fn test_uniform_field_is_perfectly_efficient() {
        let summary = FieldData::with_value(4, 4, 7.5).summary();
        assert_eq!(summary.variance, 0.0);
        assert_eq!(summary.efficiency(), 1.0);
    }

    #[test]
    fn test_max_abs_diff() {
        let a = FieldData::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let b = FieldData::from_rows(&[vec![1.5, 0.0]]).unwrap();
        assert_eq!(a.max_abs_diff(&b), 2.0);
    }
}
