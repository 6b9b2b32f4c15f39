use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::{BoundingBox, GeoTransform};

/// What is known about one population raster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterEntry {
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<GeoTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl RasterEntry {
    pub fn new(file: impl Into<PathBuf>, bbox: BoundingBox, transform: GeoTransform) -> RasterEntry {
        RasterEntry {
            file: file.into(),
            bbox: Some(bbox),
            transform: Some(transform),
            dtype: None,
            nodata: None,
            width: None,
            height: None,
            bands: None,
            crs: None,
        }
    }

    /// File name of the raster without directory or extension.
    pub fn stem(&self) -> Option<&str> {
        self.file.file_stem().and_then(|s| s.to_str())
    }
}

/// Finds the raster covering a coordinate.
pub trait RasterLookup {
    fn match_coordinate(&self, lat: f64, lon: f64) -> Option<&RasterEntry>;
}

/// Raster entries keyed by raster name, persisted as one JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataStore {
    entries: BTreeMap<String, RasterEntry>,
}

impl MetadataStore {
    pub fn new() -> MetadataStore {
        MetadataStore::default()
    }

    /// Reads the store at `path`. A missing file is an empty store; so is
    /// an unreadable one, after logging why.
    pub fn load(path: &Path) -> MetadataStore {
        if !path.exists() {
            debug!("no metadata at {}, starting empty", path.display());
            return MetadataStore::default();
        }
        match Self::read(path) {
            Ok(store) => {
                info!("loaded {} raster entries from {}", store.len(), path.display());
                store
            }
            Err(e) => {
                error!("Error loading metadata from {}: {e}", path.display());
                MetadataStore::default()
            }
        }
    }

    /// Like [`MetadataStore::load`] but every failure is returned.
    pub fn read(path: &Path) -> Result<MetadataStore> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes pretty JSON with keys in sorted order.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, &self.entries)?;
        w.write_all(b"\n")?;
        w.flush()?;
        info!("Metadata written to {}", path.display());
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: RasterEntry) -> Option<RasterEntry> {
        self.entries.insert(key.into(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&RasterEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RasterLookup for MetadataStore {
    /// First entry in key order whose bounding box holds the point.
    /// Entries without a bounding box never match.
    fn match_coordinate(&self, lat: f64, lon: f64) -> Option<&RasterEntry> {
        self.entries
            .values()
            .find(|entry| entry.bbox.is_some_and(|b| b.contains(lat, lon)))
    }
}
