//! Square 8-bit matrices streamed to the array

use crate::error::{EtpuError, Result};
use etpu_chip::frame::reference;
use std::str::FromStr;

/// Square grid of 8-bit unsigned values, row-major
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    dim: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Build from row-major `data` of length `dim * dim`
    ///
    /// # Errors
    ///
    /// Returns error if `dim` is zero or `data` has the wrong length.
    pub fn new(dim: usize, data: Vec<u8>) -> Result<Self> {
        if dim == 0 {
            return Err(EtpuError::matrix_parse("dimension must be at least 1"));
        }
        if dim.checked_mul(dim) != Some(data.len()) {
            return Err(EtpuError::matrix_parse(format!(
                "{} elements cannot form a {dim}x{dim} matrix",
                data.len()
            )));
        }
        Ok(Self { dim, data })
    }

    /// Build from fixed-size rows
    ///
    /// # Panics
    ///
    /// Panics if `N` is zero.
    pub fn from_rows<const N: usize>(rows: &[[u8; N]; N]) -> Self {
        assert!(N > 0, "empty matrix");
        Self {
            dim: N,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// All-zero matrix
    ///
    /// # Panics
    ///
    /// Panics if `dim` is zero.
    pub fn zeros(dim: usize) -> Self {
        assert!(dim > 0, "empty matrix");
        Self {
            dim,
            data: vec![0; dim * dim],
        }
    }

    /// Weight matrix of the reference frame
    pub fn reference_weights() -> Self {
        Self::from_rows(&reference::WEIGHTS)
    }

    /// Input matrix of the reference frame
    pub fn reference_input() -> Self {
        Self::from_rows(&reference::INPUT)
    }

    /// Side length
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Element at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is out of range.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.dim && col < self.dim, "({row}, {col}) outside {0}x{0}", self.dim);
        self.data[row * self.dim + col]
    }

    /// Row `row`
    pub fn row(&self, row: usize) -> &[u8] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    /// Row-major elements
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Parses `"1,5,6;4,8,7;5,9,11"`: rows split by `;`, elements by `,`.
impl FromStr for Matrix {
    type Err = EtpuError;

    fn from_str(s: &str) -> Result<Self> {
        let rows: Vec<Vec<u8>> = s
            .split(';')
            .map(|row| {
                row.split(',')
                    .map(|v| {
                        let v = v.trim();
                        v.parse::<u8>().map_err(|e| {
                            EtpuError::matrix_parse(format!("element {v:?}: {e}"))
                        })
                    })
                    .collect::<Result<Vec<u8>>>()
            })
            .collect::<Result<_>>()?;

        let dim = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
            return Err(EtpuError::matrix_parse(format!(
                "row {i} has {} elements, expected {dim}",
                row.len()
            )));
        }
        Self::new(dim, rows.into_iter().flatten().collect())
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in 0..self.dim {
            if r > 0 {
                f.write_str(";")?;
            }
            for (c, v) in self.row(r).iter().enumerate() {
                if c > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{v}")?;
            }
        }
        Ok(())
    }
}
