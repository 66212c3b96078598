//! Error types for ETPU driver operations
//!
//! Register accesses themselves never fail; everything here is raised
//! either while validating a frame plan, before the first bus access, or
//! while opening a platform bus.

use thiserror::Error;

/// Result type alias for ETPU operations
pub type Result<T> = std::result::Result<T, EtpuError>;

/// Errors that can occur during ETPU operations
#[derive(Debug, Error)]
pub enum EtpuError {
    /// Array geometry cannot be expressed in the register windows
    #[error("Invalid array geometry: {reason}")]
    InvalidGeometry {
        /// Reason for rejection
        reason: String,
    },

    /// Weight traversal table is not a permutation of the matrix
    #[error("Invalid weight traversal: {reason}")]
    InvalidTraversal {
        /// Reason for rejection
        reason: String,
    },

    /// Matrix dimension does not match the configured array
    #[error("Matrix is {found}x{found}, array expects {expected}x{expected}")]
    DimensionMismatch {
        /// Configured array dimension
        expected: usize,
        /// Dimension of the supplied matrix
        found: usize,
    },

    /// Matrix text could not be parsed
    #[error("Cannot parse matrix: {reason}")]
    MatrixParse {
        /// Reason for failure
        reason: String,
    },

    /// Readout drain span falls outside the readout window
    #[error("Readout span {first}+{count} exceeds the readout window")]
    ReadoutSpan {
        /// First slot polled
        first: usize,
        /// Number of slots polled
        count: usize,
    },

    /// Weight window did not read back what was written
    #[error("Weight slot {slot} reads back {found:#04x}, wrote {expected:#04x}")]
    WeightReadback {
        /// Weight window slot
        slot: usize,
        /// Low byte written
        expected: u8,
        /// Low byte read back
        found: u8,
    },

    /// Register window could not be mapped
    #[error("Cannot map accelerator registers: {reason}")]
    Mapping {
        /// Reason for failure
        reason: String,
    },

    /// I/O error while opening a platform bus
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl EtpuError {
    /// Create an invalid geometry error
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }

    /// Create an invalid traversal error
    pub fn invalid_traversal(reason: impl Into<String>) -> Self {
        Self::InvalidTraversal {
            reason: reason.into(),
        }
    }

    /// Create a matrix parse error
    pub fn matrix_parse(reason: impl Into<String>) -> Self {
        Self::MatrixParse {
            reason: reason.into(),
        }
    }

    /// Create a mapping error
    pub fn mapping(reason: impl Into<String>) -> Self {
        Self::Mapping {
            reason: reason.into(),
        }
    }
}
