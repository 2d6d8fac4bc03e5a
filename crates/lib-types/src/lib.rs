//! # lib-types
//!
//! Shared numeric value types for the KIBIS toolchain:
//! - Typ/Min/Max corner triples with an explicit `NA` sentinel
//! - dV/dt ramp slopes
//! - package parasitic matrices (banded / full / sparse encodings)

pub mod matrix;
pub mod numeric;

pub use matrix::{BandedMatrix, FullMatrix, Matrix, MatrixFillError, SparseMatrix};
pub use numeric::{is_na, Corner, Dvdt, DvdtTypMinMax, TypMinMax, NA};
