//! Per-job conversion parameters.
//!
//! Unlike service configuration (listen address, artifact directory — owned
//! by the binary), [`SliceParameters`] travels with a single job and is
//! immutable once the job is admitted. Validation is a separate, explicit
//! step so the HTTP layer can reject bad requests synchronously while
//! library callers remain free to construct parameters however they like.

use crate::error::JobError;
use crate::format::PaperFormat;
use serde::{Deserialize, Serialize};

/// Inclusive bounds accepted by [`SliceParameters::validate`].
pub const OVERLAP_MM_RANGE: (f64, f64) = (0.0, 50.0);
pub const DPI_RANGE: (u32, u32) = (72, 600);

/// Parameters of one slicing job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceParameters {
    /// Vertical overlap between consecutive output pages, in millimetres.
    /// Adjacent slices repeat this much source content so that text cut by a
    /// page break remains readable on both pages. Default: 8.
    pub overlap_mm: f64,

    /// Render resolution in DPI. Range-checked on admission; the vector
    /// slicing path carries it for a future raster output mode but does not
    /// consume it — page geometry is resolution-independent. Default: 300.
    pub dpi: u32,

    /// Output page format. Default: A4.
    pub format: PaperFormat,
}

impl Default for SliceParameters {
    fn default() -> Self {
        Self {
            overlap_mm: 8.0,
            dpi: 300,
            format: PaperFormat::A4,
        }
    }
}

impl SliceParameters {
    /// Check the admission bounds: overlap in [0, 50] mm, DPI in [72, 600].
    pub fn validate(&self) -> Result<(), JobError> {
        let (lo, hi) = OVERLAP_MM_RANGE;
        if !self.overlap_mm.is_finite() || self.overlap_mm < lo || self.overlap_mm > hi {
            return Err(JobError::InvalidInput(format!(
                "overlap must be between {lo} and {hi} mm, got {}",
                self.overlap_mm
            )));
        }
        let (lo, hi) = DPI_RANGE;
        if self.dpi < lo || self.dpi > hi {
            return Err(JobError::InvalidInput(format!(
                "dpi must be between {lo} and {hi}, got {}",
                self.dpi
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SliceParameters::default().validate().is_ok());
    }

    #[test]
    fn overlap_bounds() {
        let mut p = SliceParameters::default();
        p.overlap_mm = 0.0;
        assert!(p.validate().is_ok());
        p.overlap_mm = 50.0;
        assert!(p.validate().is_ok());
        p.overlap_mm = -0.1;
        assert!(p.validate().is_err());
        p.overlap_mm = 50.1;
        assert!(p.validate().is_err());
        p.overlap_mm = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn dpi_bounds() {
        let mut p = SliceParameters::default();
        p.dpi = 72;
        assert!(p.validate().is_ok());
        p.dpi = 600;
        assert!(p.validate().is_ok());
        p.dpi = 71;
        assert!(p.validate().is_err());
        p.dpi = 601;
        assert!(p.validate().is_err());
    }
}
