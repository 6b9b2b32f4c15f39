use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

/// Errors raised while configuring or building a simulation.
///
/// Numerical drift during integration is never reported here; the engine
/// lets compartment values leave `[0, 1]` and only the frame mapping
/// saturates them.
#[derive(Debug)]
pub enum OutbreakError {
    Io(io::Error),
    Json(serde_json::Error),
    /// No raster bounding box contains the requested coordinate.
    NoRasterMatch { lat: f64, lon: f64 },
    /// The population density map for a matched raster is absent.
    MissingImage(PathBuf),
    /// The matched raster entry carries no affine transform.
    MissingTransform(PathBuf),
    /// The coordinate is inside the raster's bounding box but maps outside
    /// its density map.
    OutsideRaster { lat: f64, lon: f64, x: f64, y: f64 },
    DispersionRateCount { expected: usize, actual: usize },
    InvalidParameter(String),
}

impl OutbreakError {
    /// Missing-input errors make a single locality unusable; configuration
    /// errors make every locality unusable.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            OutbreakError::Io(_)
                | OutbreakError::NoRasterMatch { .. }
                | OutbreakError::MissingImage(_)
                | OutbreakError::MissingTransform(_)
                | OutbreakError::OutsideRaster { .. }
        )
    }
}

impl From<io::Error> for OutbreakError {
    fn from(error: io::Error) -> Self {
        OutbreakError::Io(error)
    }
}

impl From<serde_json::Error> for OutbreakError {
    fn from(error: serde_json::Error) -> Self {
        OutbreakError::Json(error)
    }
}

impl From<String> for OutbreakError {
    fn from(error: String) -> Self {
        OutbreakError::InvalidParameter(error)
    }
}

impl From<&str> for OutbreakError {
    fn from(error: &str) -> Self {
        OutbreakError::InvalidParameter(error.to_string())
    }
}

impl std::error::Error for OutbreakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutbreakError::Io(e) => Some(e),
            OutbreakError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for OutbreakError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutbreakError::Io(e) => write!(f, "i/o error: {e}"),
            OutbreakError::Json(e) => write!(f, "json error: {e}"),
            OutbreakError::NoRasterMatch { lat, lon } => {
                write!(f, "no raster covers coordinate ({lat}, {lon})")
            }
            OutbreakError::MissingImage(path) => {
                write!(f, "population density map not found: {}", path.display())
            }
            OutbreakError::MissingTransform(path) => {
                write!(f, "raster {} has no affine transform", path.display())
            }
            OutbreakError::OutsideRaster { lat, lon, x, y } => write!(
                f,
                "coordinate ({lat}, {lon}) falls outside its density map at ({x}, {y})"
            ),
            OutbreakError::DispersionRateCount { expected, actual } => write!(
                f,
                "expected {expected} dispersion rates (one per compartment), got {actual}"
            ),
            OutbreakError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutbreakError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_coordinate() {
        let err = OutbreakError::NoRasterMatch { lat: 1.5, lon: -2.0 };
        assert_eq!(err.to_string(), "no raster covers coordinate (1.5, -2)");
        assert!(err.is_missing_input());
    }

    #[test]
    fn position_outside_the_map_is_missing_input() {
        let err = OutbreakError::OutsideRaster { lat: 0.0, lon: 8.0, x: 0.5, y: 1.0 };
        assert!(err.is_missing_input());
        assert!(err.to_string().contains("outside its density map"));
    }

    #[test]
    fn rate_count_is_a_configuration_error() {
        let err = OutbreakError::DispersionRateCount { expected: 3, actual: 2 };
        assert!(!err.is_missing_input());
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn io_errors_convert_and_keep_their_source() {
        let err: OutbreakError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
