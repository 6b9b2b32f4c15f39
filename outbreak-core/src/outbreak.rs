//! Building a simulation from a place on the map.
//!
//! The raster metadata and the density map loader are passed in as trait
//! objects so callers can swap the on-disk implementations for their own.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{OutbreakError, Result};
use crate::geo::relative_position;
use crate::metadata::RasterLookup;
use crate::params::ModelParams;
use crate::population::{DensityImage, OutbreakPoint, seed_grid};
use crate::simulation::Simulation;

pub const DEFAULT_WIDTH: u32 = 400;

/// Reads population density maps.
pub trait DensitySource {
    /// `(width, height)` of the map at `path`, in pixels.
    fn size(&self, path: &Path) -> Result<(u32, u32)>;

    /// The map at `path`, resized to `width` pixels keeping its aspect.
    fn load_resized(&self, path: &Path, width: u32) -> Result<DensityImage>;
}

/// A named outbreak origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub country_code: String,
    pub locality: String,
    pub lat: f64,
    pub lon: f64,
}

impl Locality {
    pub fn new(country_code: &str, locality: &str, lat: f64, lon: f64) -> Locality {
        Locality {
            country_code: country_code.to_lowercase(),
            locality: locality.to_lowercase(),
            lat,
            lon,
        }
    }

    /// File stem shared by every output of this locality.
    pub fn output_stem(&self) -> String {
        format!(
            "zombie-outbreak-{}-{}",
            self.country_code.to_lowercase(),
            self.locality.to_lowercase()
        )
    }
}

/// Where density maps live and how wide the grid is.
#[derive(Clone, Debug, PartialEq)]
pub struct OutbreakSettings {
    pub pdm_dir: PathBuf,
    pub width: u32,
}

impl OutbreakSettings {
    pub fn new(pdm_dir: impl Into<PathBuf>) -> OutbreakSettings {
        OutbreakSettings {
            pdm_dir: pdm_dir.into(),
            width: DEFAULT_WIDTH,
        }
    }

    pub fn with_width(mut self, width: u32) -> OutbreakSettings {
        self.width = width;
        self
    }
}

/// Everything resolved while building a simulation for a locality.
#[derive(Debug)]
pub struct Outbreak {
    pub locality: Locality,
    pub raster: PathBuf,
    pub pdm_path: PathBuf,
    pub origin: OutbreakPoint,
    pub simulation: Simulation,
}

/// Looks up the raster under `locality`, loads its density map and seeds
/// the outbreak at the locality's position on that map.
pub fn build_outbreak(
    locality: &Locality,
    settings: &OutbreakSettings,
    lookup: &dyn RasterLookup,
    source: &dyn DensitySource,
    params: ModelParams,
) -> Result<Outbreak> {
    let entry = lookup
        .match_coordinate(locality.lat, locality.lon)
        .ok_or(OutbreakError::NoRasterMatch {
            lat: locality.lat,
            lon: locality.lon,
        })?;
    let stem = entry
        .stem()
        .ok_or_else(|| format!("raster path {} has no file name", entry.file.display()))?;
    let pdm_path = settings.pdm_dir.join(format!("{stem}.png"));
    debug!("{} matched raster {}", locality.output_stem(), entry.file.display());

    let transform = entry
        .transform
        .ok_or_else(|| OutbreakError::MissingTransform(entry.file.clone()))?;
    let (px_x, px_y) = transform.to_pixel(locality.lat, locality.lon);

    let (map_w, map_h) = source.size(&pdm_path)?;
    let origin = relative_position(px_x, px_y, map_w, map_h);
    if !origin.is_inside() {
        return Err(OutbreakError::OutsideRaster {
            lat: locality.lat,
            lon: locality.lon,
            x: origin.x,
            y: origin.y,
        });
    }

    let image = source.load_resized(&pdm_path, settings.width)?;
    let grid = seed_grid(&image, origin);
    info!(
        "{}: {}x{} grid, outbreak at ({:.3}, {:.3})",
        locality.output_stem(),
        grid.width(),
        grid.height(),
        origin.x,
        origin.y
    );

    Ok(Outbreak {
        locality: locality.clone(),
        raster: entry.file.clone(),
        pdm_path,
        origin,
        simulation: Simulation::new(grid, params),
    })
}

/// [`build_outbreak`] returning only the simulation.
pub fn build_simulation(
    locality: &Locality,
    settings: &OutbreakSettings,
    lookup: &dyn RasterLookup,
    source: &dyn DensitySource,
    params: ModelParams,
) -> Result<Simulation> {
    build_outbreak(locality, settings, lookup, source, params).map(|o| o.simulation)
}
