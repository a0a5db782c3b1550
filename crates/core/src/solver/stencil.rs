//! Synchronous 4-neighbor relaxation
//!
//! All engines advance their fields with the same primitive: every step reads one
//! immutable snapshot of the previous step and writes a separate back buffer, then the
//! buffers are swapped (ping-pong). A cell update never observes a value written in the
//! same step, so the result does not depend on evaluation order and rows can be computed
//! in parallel with Rayon.

use super::fields::FieldData;
use crate::grid::neighbors4;
use rayon::prelude::*;

/// Read-only view of one cell and its snapshot, passed to an update rule
pub struct CellView<'a> {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
    /// Row-major index (`y * width + x`)
    pub index: usize,
    /// Value of this cell in the previous step
    pub value: f64,
    snapshot: &'a [f64],
    width: usize,
    height: usize,
}

impl CellView<'_> {
    /// Row-major indices of the in-bounds 4-connected neighbors (up, down, left, right)
    #[inline]
    pub fn neighbor_indices(&self) -> impl Iterator<Item = usize> + '_ {
        neighbors4(self.x, self.y, self.width, self.height).map(|(nx, ny)| ny * self.width + nx)
    }

    /// Snapshot value of any cell
    #[inline]
    pub fn value_at(&self, index: usize) -> f64 {
        self.snapshot[index]
    }

    /// Number of in-bounds neighbors (2 at corners, 3 on edges, 4 inside)
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbor_indices().count()
    }

    /// Sum of neighbor values, accumulated in neighbor order
    #[inline]
    pub fn neighbor_sum(&self) -> f64 {
        self.neighbor_indices()
            .fold(0.0, |sum, idx| sum + self.snapshot[idx])
    }

    /// Discrete Laplacian: `Σ neighbors − count × center`
    #[inline]
    pub fn laplacian(&self) -> f64 {
        self.neighbor_sum() - self.neighbor_count() as f64 * self.value
    }

    /// Mean of the neighbor values, `None` on a 1×1 grid
    #[inline]
    pub fn neighbor_mean(&self) -> Option<f64> {
        let count = self.neighbor_count();
        (count > 0).then(|| self.neighbor_sum() / count as f64)
    }
}

/// Advance one step: `next[i] = update(view of current at i)`
///
/// # Panics
///
/// Panics if the two buffers differ in size
pub fn relax_step<F>(current: &FieldData, next: &mut FieldData, update: F)
where
    F: Fn(&CellView<'_>) -> f64 + Sync,
{
    assert_eq!(
        (current.width, current.height),
        (next.width, next.height),
        "Field buffers must have matching dimensions"
    );
    let width = current.width;
    let height = current.height;
    let snapshot = current.as_slice();

    next.as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let index = y * width + x;
                let view = CellView {
                    x,
                    y,
                    index,
                    value: snapshot[index],
                    snapshot,
                    width,
                    height,
                };
                *cell = update(&view);
            }
        });
}

/// Final field of a relaxation run together with the snapshot one step before it
#[derive(Debug, Clone)]
pub struct Relaxation {
    /// Field after the last step
    pub field: FieldData,
    /// Field before the last step; equal to `field` when no steps ran
    pub previous: FieldData,
}

impl Relaxation {
    /// Largest per-cell change made by the last step
    pub fn residual(&self) -> f64 {
        self.field.max_abs_diff(&self.previous)
    }
}

/// Run `steps` synchronous steps starting from `initial`
pub fn relax<F>(initial: FieldData, steps: usize, update: F) -> Relaxation
where
    F: Fn(&CellView<'_>) -> f64 + Sync,
{
    let mut current = initial;
    let mut back = current.clone();

    for _ in 0..steps {
        relax_step(&current, &mut back, &update);
        std::mem::swap(&mut current, &mut back);
    }

    Relaxation {
        field: current,
        previous: back,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laplacian_uses_in_bounds_neighbors_only() {
        let field = FieldData::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap();
        let mut out = FieldData::new(3, 3);
        relax_step(&field, &mut out, |cell| cell.laplacian());

        // Corner (0,0): neighbors 4 and 2
        assert_eq!(out.get(0, 0), 4.0 + 2.0 - 2.0 * 1.0);
        // Edge (1,0): neighbors 5, 1, 3
        assert_eq!(out.get(1, 0), 5.0 + 1.0 + 3.0 - 3.0 * 2.0);
        // Center: symmetric plane has zero Laplacian
        assert_eq!(out.get(1, 1), 0.0);
    }

    #[test]
    fn test_step_reads_only_previous_snapshot() {
        // Shift-right rule: each cell takes its left neighbor's value.
        // An in-place update would smear the first value across the row.
        let field = FieldData::from_rows(&[vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
        let shifted = relax(field, 1, |cell| {
            if cell.x == 0 {
                0.0
            } else {
                cell.value_at(cell.index - 1)
            }
        });
        assert_eq!(shifted.field.data, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(shifted.previous.data, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shifted.residual(), 1.0);
    }

    #[test]
    fn test_zero_steps_keeps_initial_field() {
        let field = FieldData::with_value(3, 2, 4.0);
        let relaxed = relax(field.clone(), 0, |cell| cell.value + 1.0);
        assert_eq!(relaxed.field, field);
        assert_eq!(relaxed.previous, field);
        assert_eq!(relaxed.residual(), 0.0);
    }

    #[test]
    fn test_single_cell_has_no_neighbors() {
        let field = FieldData::with_value(1, 1, 3.0);
        let mut out = FieldData::new(1, 1);
        relax_step(&field, &mut out, |cell| {
            assert_eq!(cell.neighbor_count(), 0);
            assert!(cell.neighbor_mean().is_none());
            cell.laplacian()
        });
        assert_eq!(out.get(0, 0), 0.0);
    }
}
