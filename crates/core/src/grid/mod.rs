//! Land-use grid model and input decoding

pub mod land_grid;
pub mod submission;

pub use land_grid::{neighbors4, CellMask, LandGrid};
pub use submission::Submission;
