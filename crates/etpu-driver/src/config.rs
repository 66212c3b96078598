//! Driver configuration
//!
//! Everything here defaults to the reference accelerator: a 3×3 array with
//! the readout drain over slots 5..30 and no extra verification reads, so
//! the default bus sequence is exactly 9 + 5 + 25 + 1 accesses.

use crate::error::Result;
use crate::geometry::{ArrayGeometry, Coord};
use crate::readout::ReadoutSpan;
use etpu_chip::frame::DIMENSION;
use tracing::debug;

/// Frame driver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Array side length
    pub dimension: usize,

    /// Weight traversal table, `None` for row-major
    pub traversal: Option<Vec<Coord>>,

    /// Readout slots polled per frame
    pub readout: ReadoutSpan,

    /// Read the weight window back after loading
    pub verify_weights: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dimension: DIMENSION,
            traversal: None,
            readout: ReadoutSpan::REFERENCE,
            verify_weights: false,
        }
    }
}

impl DriverConfig {
    /// Reference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the array dimension
    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set an explicit weight traversal table
    #[must_use]
    pub fn with_traversal(mut self, table: Vec<Coord>) -> Self {
        self.traversal = Some(table);
        self
    }

    /// Set the readout span
    #[must_use]
    pub const fn with_readout(mut self, span: ReadoutSpan) -> Self {
        self.readout = span;
        self
    }

    /// Enable or disable weight readback verification
    #[must_use]
    pub const fn with_verify_weights(mut self, verify: bool) -> Self {
        self.verify_weights = verify;
        self
    }

    /// Validate the configuration and generate the array plan
    ///
    /// # Errors
    ///
    /// Returns error if the dimension or traversal table is invalid.
    pub fn build_geometry(&self) -> Result<ArrayGeometry> {
        let geometry = ArrayGeometry::new(self.dimension)?;
        let geometry = match &self.traversal {
            Some(table) => geometry.with_traversal(table.clone())?,
            None => geometry,
        };
        debug!(
            "Driver config: {0}x{0} array, readout {1:?}, verify={2}",
            self.dimension,
            self.readout.slots(),
            self.verify_weights
        );
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtpuError;

    #[test]
    fn defaults_describe_reference_frame() {
        let cfg = DriverConfig::default();
        assert_eq!(cfg.dimension, 3);
        assert_eq!(cfg.readout.slots(), 5..30);
        assert!(!cfg.verify_weights);
        assert_eq!(cfg.build_geometry().unwrap(), ArrayGeometry::reference());
    }

    #[test]
    fn builders_chain() {
        let cfg = DriverConfig::new()
            .with_dimension(2)
            .with_readout(ReadoutSpan::new(0, 8).unwrap())
            .with_verify_weights(true);
        assert_eq!(cfg.build_geometry().unwrap().dim(), 2);
        assert_eq!(cfg.readout.count(), 8);
        assert!(cfg.verify_weights);
    }

    #[test]
    fn traversal_is_validated_against_dimension() {
        let cfg = DriverConfig::new()
            .with_dimension(2)
            .with_traversal(vec![(0, 0), (0, 1), (1, 0), (2, 2)]);
        assert!(matches!(
            cfg.build_geometry(),
            Err(EtpuError::InvalidTraversal { .. })
        ));
    }
}
