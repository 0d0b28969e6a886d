//! Target paper formats.
//!
//! All dimensions are in PDF points (1/72 inch), matching the coordinate
//! space the engine works in. Overlap arrives from users in millimetres and
//! is converted once, at plan time, via [`POINTS_PER_MM`].
//!
//! Two ways to turn a name into a format coexist on purpose:
//!
//! * [`PaperFormat::from_str`] is strict and is what the synchronous
//!   validation gate uses — an unknown name never admits a job.
//! * [`PaperFormat::from_name_lossy`] falls back to A4 with a logged warning.
//!   Callers that construct [`crate::config::SliceParameters`] directly
//!   (bypassing the gate) still get a working conversion out of a typo.

use crate::engine::PageSize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Conversion factor from millimetres to PDF points (72 points per inch,
/// 25.4 mm per inch).
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// The fixed set of supported output page formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperFormat {
    A2,
    A3,
    /// The default everywhere a format is optional.
    #[default]
    A4,
    A5,
    Letter,
}

/// Returned by the strict parser for names outside the supported set.
#[derive(Debug, Clone, Error)]
#[error("unknown paper format '{0}'")]
pub struct UnknownFormat(pub String);

impl PaperFormat {
    /// Every supported format, in the order shown to users.
    pub const ALL: [PaperFormat; 5] = [
        PaperFormat::A2,
        PaperFormat::A3,
        PaperFormat::A4,
        PaperFormat::A5,
        PaperFormat::Letter,
    ];

    /// Page dimensions in points.
    pub fn dimensions(self) -> PageSize {
        let (width, height) = match self {
            PaperFormat::A2 => (1191.0, 1684.0),
            PaperFormat::A3 => (842.0, 1191.0),
            PaperFormat::A4 => (595.0, 842.0),
            PaperFormat::A5 => (420.0, 595.0),
            PaperFormat::Letter => (612.0, 792.0),
        };
        PageSize { width, height }
    }

    /// Canonical name, as accepted by the parsers.
    pub fn name(self) -> &'static str {
        match self {
            PaperFormat::A2 => "A2",
            PaperFormat::A3 => "A3",
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::Letter => "Letter",
        }
    }

    /// Resolve a format name, falling back to A4 for anything unknown.
    ///
    /// The fallback is logged rather than surfaced: a conversion started with
    /// a bad name still produces a usable (A4) document.
    pub fn from_name_lossy(name: &str) -> Self {
        match name.parse() {
            Ok(format) => format,
            Err(UnknownFormat(_)) => {
                warn!("unknown paper format '{name}', defaulting to A4");
                PaperFormat::A4
            }
        }
    }
}

impl FromStr for PaperFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A2" => Ok(PaperFormat::A2),
            "A3" => Ok(PaperFormat::A3),
            "A4" => Ok(PaperFormat::A4),
            "A5" => Ok(PaperFormat::A5),
            "Letter" => Ok(PaperFormat::Letter),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_dimensions() {
        let size = PaperFormat::A4.dimensions();
        assert_eq!(size.width, 595.0);
        assert_eq!(size.height, 842.0);
    }

    #[test]
    fn every_format_is_portrait() {
        for format in PaperFormat::ALL {
            let size = format.dimensions();
            assert!(size.height > size.width, "{format} is not portrait");
        }
    }

    #[test]
    fn strict_parse_round_trips() {
        for format in PaperFormat::ALL {
            assert_eq!(format.name().parse::<PaperFormat>().unwrap(), format);
        }
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert!("Tabloid".parse::<PaperFormat>().is_err());
        assert!("a4".parse::<PaperFormat>().is_err(), "names are case-sensitive");
    }

    #[test]
    fn lossy_parse_falls_back_to_a4() {
        assert_eq!(PaperFormat::from_name_lossy("Tabloid"), PaperFormat::A4);
        assert_eq!(PaperFormat::from_name_lossy("Letter"), PaperFormat::Letter);
    }

    #[test]
    fn eight_millimetres_in_points() {
        let pt = 8.0 * POINTS_PER_MM;
        assert!((pt - 22.677).abs() < 1e-3);
    }
}
