//! Package parasitic matrix encodings.
//!
//! A `[Define Package Model]` block stores pin-to-pin R/L/C coupling as a
//! symmetric matrix in one of three encodings: banded (diagonal plus a fixed
//! upper bandwidth), full (explicit upper triangle), or sparse (explicit
//! (row, col, value) triples). All three are upper-triangle conventions;
//! dimension equals the package model's declared pin count.
//!
//! Storage is reserved exactly once when the encoding is selected, and every
//! fill is bounds-checked, so a malformed file can never write past the
//! declared capacity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while filling a matrix from file data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixFillError {
    /// More values supplied for a row than the row can hold.
    #[error("row {row} overflows: capacity {capacity} values")]
    RowOverflow { row: usize, capacity: usize },

    /// Row or column index outside the declared dimension.
    #[error("index ({row}, {col}) outside {dim}x{dim} matrix")]
    IndexOutOfRange { row: usize, col: usize, dim: usize },

    /// Total fill would exceed the reserved capacity.
    #[error("matrix capacity {capacity} exceeded")]
    CapacityExceeded { capacity: usize },
}

/// A banded matrix: for each row, the diagonal element plus `bandwidth - 1`
/// elements to its right, stored row-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BandedMatrix {
    pub dim: usize,
    pub bandwidth: usize,
    pub data: Vec<f64>,
}

impl BandedMatrix {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            bandwidth: 0,
            data: Vec::new(),
        }
    }

    /// Set the bandwidth and reserve `bandwidth * dim` slots, all NaN until
    /// filled.
    pub fn set_bandwidth(&mut self, bandwidth: usize) {
        self.bandwidth = bandwidth;
        self.data = vec![f64::NAN; bandwidth * self.dim];
    }

    /// Store one band value: `offset` counts from the diagonal of `row`.
    pub fn push(&mut self, row: usize, offset: usize, value: f64) -> Result<(), MatrixFillError> {
        if row >= self.dim {
            return Err(MatrixFillError::IndexOutOfRange {
                row,
                col: row + offset,
                dim: self.dim,
            });
        }
        if offset >= self.bandwidth {
            return Err(MatrixFillError::RowOverflow {
                row,
                capacity: self.bandwidth,
            });
        }
        self.data[row * self.bandwidth + offset] = value;
        Ok(())
    }

    /// Element lookup, symmetric, zero outside the band.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (r, c) = if row <= col { (row, col) } else { (col, row) };
        let offset = c - r;
        if r >= self.dim || offset >= self.bandwidth {
            return 0.0;
        }
        self.data[r * self.bandwidth + offset]
    }

    pub fn check(&self) -> bool {
        self.dim > 0
            && self.bandwidth > 0
            && self.data.len() == self.bandwidth * self.dim
            && self.data.iter().all(|v| !v.is_nan())
    }
}

/// A full matrix: the upper triangle stored row-major, each row one element
/// shorter than the last (`dim`, `dim - 1`, ..., `1` values).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FullMatrix {
    pub dim: usize,
    pub data: Vec<f64>,
}

impl FullMatrix {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: vec![f64::NAN; dim * (dim + 1) / 2],
        }
    }

    fn triangle_index(&self, row: usize, col: usize) -> Option<usize> {
        let (r, c) = if row <= col { (row, col) } else { (col, row) };
        if c >= self.dim {
            return None;
        }
        // row r holds (dim - r) values starting at its diagonal
        let start: usize = (0..r).map(|k| self.dim - k).sum();
        Some(start + (c - r))
    }

    /// Store the value at (row, col) in the upper triangle.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixFillError> {
        match self.triangle_index(row, col) {
            Some(i) if i < self.data.len() => {
                self.data[i] = value;
                Ok(())
            }
            _ => Err(MatrixFillError::IndexOutOfRange {
                row,
                col,
                dim: self.dim,
            }),
        }
    }

    /// Capacity of one row: the diagonal and everything right of it.
    pub fn row_capacity(&self, row: usize) -> usize {
        self.dim.saturating_sub(row)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.triangle_index(row, col)
            .and_then(|i| self.data.get(i).copied())
            .unwrap_or(0.0)
    }

    pub fn check(&self) -> bool {
        self.dim > 0 && self.data.iter().all(|v| !v.is_nan())
    }
}

/// A sparse matrix: explicit upper-triangle entries; absent entries are zero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SparseMatrix {
    pub dim: usize,
    pub entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Record one explicit entry. At most `dim * dim` entries are accepted.
    /// Indices are normalized to the upper triangle so lookup finds the
    /// entry whichever way the file wrote it.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixFillError> {
        if row >= self.dim || col >= self.dim {
            return Err(MatrixFillError::IndexOutOfRange {
                row,
                col,
                dim: self.dim,
            });
        }
        if self.entries.len() >= self.dim * self.dim {
            return Err(MatrixFillError::CapacityExceeded {
                capacity: self.dim * self.dim,
            });
        }
        let (r, c) = if row <= col { (row, col) } else { (col, row) };
        self.entries.push((r, c, value));
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (r, c) = if row <= col { (row, col) } else { (col, row) };
        self.entries
            .iter()
            .find(|(er, ec, _)| *er == r && *ec == c)
            .map(|(_, _, v)| *v)
            .unwrap_or(0.0)
    }

    pub fn check(&self) -> bool {
        self.dim > 0 && self.entries.iter().all(|(_, _, v)| !v.is_nan())
    }
}

/// Tagged union over the three encodings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Matrix {
    Banded(BandedMatrix),
    Full(FullMatrix),
    Sparse(SparseMatrix),
}

impl Matrix {
    pub fn dim(&self) -> usize {
        match self {
            Matrix::Banded(m) => m.dim,
            Matrix::Full(m) => m.dim,
            Matrix::Sparse(m) => m.dim,
        }
    }

    /// Symmetric element lookup regardless of encoding.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            Matrix::Banded(m) => m.get(row, col),
            Matrix::Full(m) => m.get(row, col),
            Matrix::Sparse(m) => m.get(row, col),
        }
    }

    pub fn check(&self) -> bool {
        match self {
            Matrix::Banded(m) => m.check(),
            Matrix::Full(m) => m.check(),
            Matrix::Sparse(m) => m.check(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_matrix_triangle() {
        let mut m = FullMatrix::new(3);
        // rows hold 3, 2, 1 values
        assert_eq!(m.row_capacity(0), 3);
        assert_eq!(m.row_capacity(1), 2);
        assert_eq!(m.row_capacity(2), 1);
        m.set(0, 0, 1.0).unwrap();
        m.set(0, 1, 2.0).unwrap();
        m.set(0, 2, 3.0).unwrap();
        m.set(1, 1, 4.0).unwrap();
        m.set(1, 2, 5.0).unwrap();
        m.set(2, 2, 6.0).unwrap();
        assert!(m.check());
        // symmetric access
        assert_eq!(m.get(1, 0), 2.0);
        assert_eq!(m.get(2, 1), 5.0);
        // out of range is an error
        assert!(m.set(0, 3, 9.0).is_err());
    }

    #[test]
    fn test_full_matrix_incomplete_fails_check() {
        let mut m = FullMatrix::new(2);
        m.set(0, 0, 1.0).unwrap();
        assert!(!m.check());
    }

    #[test]
    fn test_banded_matrix() {
        let mut m = BandedMatrix::new(3);
        m.set_bandwidth(2);
        for row in 0..3 {
            m.push(row, 0, 1.0).unwrap();
            m.push(row, 1, 0.1).unwrap();
        }
        assert!(m.check());
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(0, 1), 0.1);
        assert_eq!(m.get(1, 0), 0.1); // symmetric
        assert_eq!(m.get(0, 2), 0.0); // outside band
        assert!(m.push(0, 2, 0.5).is_err());
    }

    #[test]
    fn test_sparse_matrix() {
        let mut m = SparseMatrix::new(3);
        m.set(0, 2, 0.5).unwrap();
        m.set(1, 1, 2.0).unwrap();
        assert!(m.check());
        assert_eq!(m.get(2, 0), 0.5);
        assert_eq!(m.get(0, 1), 0.0);
        assert!(m.set(3, 0, 1.0).is_err());
    }

    #[test]
    fn test_sparse_lower_triangle_entry_retrievable() {
        let mut m = SparseMatrix::new(3);
        m.set(2, 0, 0.7).unwrap();
        assert_eq!(m.get(2, 0), 0.7);
        assert_eq!(m.get(0, 2), 0.7);
    }
}
