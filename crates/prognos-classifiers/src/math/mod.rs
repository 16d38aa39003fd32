//! Small ndarray-like containers used throughout the crate.
//!
//! `Array2` is a dense row-major matrix (samples × features) and `Array1` a
//! plain vector wrapper. Both stay dependency-free so the model and
//! preprocessing code can share them without conversions.
pub mod matrix;
pub mod vector;

pub use matrix::{Array2, ShapeError};
pub use vector::Array1;
