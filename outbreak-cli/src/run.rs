use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info, warn};
use outbreak_core::{
    Locality, MetadataStore, ModelParams, OutbreakError, OutbreakSettings, build_outbreak,
};
use rayon::prelude::*;
use serde::Serialize;

use crate::encode::{OutputFormat, write_frames};
use crate::raster::PngDensitySource;

pub const RUN_LOG: &str = "runs.jsonl";

/// Everything one animation needs besides its locality.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub settings: OutbreakSettings,
    pub params: ModelParams,
    pub out: PathBuf,
    pub format: OutputFormat,
    pub duration: f64,
    pub fps: u32,
    pub force: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Generated,
    Skipped,
    Failed,
}

/// One line of `runs.jsonl`.
#[derive(Clone, Debug, Serialize)]
pub struct RunRow {
    pub country_code: String,
    pub locality: String,
    pub lat: f64,
    pub lon: f64,

    pub status: RunStatus,
    pub output: PathBuf,
    pub format: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raster: Option<PathBuf>,
    pub grid_width: usize,
    pub grid_height: usize,

    pub frames: usize,
    pub steps: u64,
    pub clock_hours: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRow {
    fn new(locality: &Locality, status: RunStatus, output: PathBuf, format: OutputFormat) -> RunRow {
        RunRow {
            country_code: locality.country_code.clone(),
            locality: locality.locality.clone(),
            lat: locality.lat,
            lon: locality.lon,
            status,
            output,
            format: format.as_str(),
            raster: None,
            grid_width: 0,
            grid_height: 0,
            frames: 0,
            steps: 0,
            clock_hours: 0.0,
            error: None,
        }
    }
}

/// Builds, runs and encodes one outbreak. Failures are logged and reported
/// in the returned row rather than propagated, so a batch keeps going.
pub fn run_locality(locality: &Locality, store: &MetadataStore, opts: &RunOptions) -> RunRow {
    let output = opts.format.output_path(&opts.out, &locality.output_stem());

    if output.exists() && !opts.force {
        info!("Animation already exists at {}", output.display());
        return RunRow::new(locality, RunStatus::Skipped, output, opts.format);
    }

    match animate(locality, store, opts, &output) {
        Ok(row) => {
            info!("Generated animation at {}", output.display());
            row
        }
        Err(e) => {
            // Missing inputs only cost this locality; anything else likely
            // hits the whole batch.
            let missing = e
                .downcast_ref::<OutbreakError>()
                .is_some_and(OutbreakError::is_missing_input);
            if missing {
                warn!("{}: {e:#}", locality.output_stem());
            } else {
                error!("{}: {e:#}", locality.output_stem());
            }
            let mut row = RunRow::new(locality, RunStatus::Failed, output, opts.format);
            row.error = Some(format!("{e:#}"));
            row
        }
    }
}

fn animate(
    locality: &Locality,
    store: &MetadataStore,
    opts: &RunOptions,
    output: &Path,
) -> Result<RunRow> {
    let outbreak = build_outbreak(locality, &opts.settings, store, &PngDensitySource, opts.params)?;
    let (grid_width, grid_height) = {
        let grid = outbreak.simulation.grid();
        (grid.width(), grid.height())
    };

    let mut frames = outbreak
        .simulation
        .into_frames(f64::from(opts.fps), opts.duration)?;
    let written = write_frames(opts.format, &mut frames, opts.fps, output)?;
    let sim = frames.into_simulation();

    let mut row = RunRow::new(locality, RunStatus::Generated, output.to_path_buf(), opts.format);
    row.raster = Some(outbreak.raster);
    row.grid_width = grid_width;
    row.grid_height = grid_height;
    row.frames = written;
    row.steps = sim.steps();
    row.clock_hours = sim.clock();
    Ok(row)
}

/// Runs every locality on a pool of `jobs` threads (rayon's default when
/// `None`). Rows come back in input order.
pub fn run_batch(
    localities: &[Locality],
    store: &MetadataStore,
    opts: &RunOptions,
    jobs: Option<usize>,
) -> Result<Vec<RunRow>> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = jobs {
        builder = builder.num_threads(n);
    }
    let pool = builder.build().context("building worker pool")?;

    Ok(pool.install(|| {
        localities
            .par_iter()
            .map(|locality| run_locality(locality, store, opts))
            .collect()
    }))
}

/// Rewrites `<out>/runs.jsonl` with one JSON object per row.
pub fn write_run_log(out: &Path, rows: &[RunRow]) -> Result<PathBuf> {
    fs::create_dir_all(out)?;
    let path = out.join(RUN_LOG);
    let mut w = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?,
    );
    for row in rows {
        serde_json::to_writer(&mut w, row)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(path)
}

/// Reads a JSON array of localities.
pub fn load_localities(path: &Path) -> Result<Vec<Locality>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let localities = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(localities)
}
