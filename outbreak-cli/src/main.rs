mod encode;
mod logging;
mod raster;
mod run;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use encode::OutputFormat;
use log::{LevelFilter, info, warn};
use outbreak_core::{
    Locality, MetadataStore, ModelConfig, ModelParams, OutbreakSettings, RasterLookup,
};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use run::{RunOptions, RunStatus, load_localities, run_batch, write_run_log};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Animate an outbreak starting at one coordinate
    Animate {
        /// ISO 3166-1 alpha-2 country code
        #[arg(long)]
        country_code: String,

        /// Locality name, used in the output file name
        #[arg(long)]
        locality: String,

        /// Latitude of the outbreak, decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude of the outbreak, decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Animate every locality in a JSON list
    Batch {
        /// JSON array of {country_code, locality, lat, lon}
        #[arg(long)]
        localities: PathBuf,

        /// Only the first N localities
        #[arg(long)]
        limit: Option<usize>,

        /// Pick a single locality at random
        #[arg(long)]
        random: bool,

        /// RNG seed for --random (reproducibility)
        #[arg(long, default_value_t = 123)]
        seed: u64,

        /// Worker threads (defaults to one per core)
        #[arg(long)]
        jobs: Option<usize>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the raster metadata entry covering a coordinate
    Match {
        /// Raster metadata JSON
        #[arg(long)]
        metadata: PathBuf,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Raster metadata JSON (bounding boxes and geo transforms)
    #[arg(long)]
    metadata: PathBuf,

    /// Directory of population density map PNGs
    #[arg(long)]
    pdm_dir: PathBuf,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Grid (and output) width in pixels
    #[arg(long, default_value_t = 400)]
    width: u32,

    /// Video duration in seconds
    #[arg(long, default_value_t = 25.0)]
    duration: f64,

    /// Frames per second
    #[arg(long, default_value_t = 15)]
    fps: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Gif)]
    format: OutputFormat,

    /// Regenerate outputs that already exist
    #[arg(long)]
    force: bool,

    /// Model parameters JSON; flags below override its fields
    #[arg(long)]
    model_config: Option<PathBuf>,

    /// Infection rate (sane -> infected, per zombie contact)
    #[arg(long)]
    infection_rate: Option<f64>,

    /// Incubation rate (infected -> rampaging)
    #[arg(long)]
    incubation_rate: Option<f64>,

    /// Integration timestep in model hours
    #[arg(long)]
    timestep: Option<f64>,

    /// Model hours per second of video
    #[arg(long)]
    hours_per_second: Option<f64>,

    /// Comma-separated dispersion rates "sane,infected,rampaging", e.g. "0,0.07,0.03"
    #[arg(long)]
    dispersion_rates: Option<String>,
}

impl RunArgs {
    fn model_params(&self) -> anyhow::Result<ModelParams> {
        let base = match &self.model_config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                ModelConfig::from_json(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => ModelConfig::default(),
        };
        let overrides = ModelConfig {
            infection_rate: self.infection_rate,
            incubation_rate: self.incubation_rate,
            timestep: self.timestep,
            hours_per_second: self.hours_per_second,
            dispersion_rates: self.dispersion_rates.as_deref().map(parse_rates).transpose()?,
        };
        Ok(ModelParams::try_from(base.merge(overrides))?)
    }

    fn options(&self) -> anyhow::Result<RunOptions> {
        if self.fps == 0 {
            bail!("fps must be > 0");
        }
        Ok(RunOptions {
            settings: OutbreakSettings::new(&self.pdm_dir).with_width(self.width),
            params: self.model_params()?,
            out: self.out.clone(),
            format: self.format,
            duration: self.duration,
            fps: self.fps,
            force: self.force,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    match cli.command {
        Command::Animate {
            country_code,
            locality,
            lat,
            lon,
            run,
        } => {
            let opts = run.options()?;
            let store = MetadataStore::load(&run.metadata);
            let place = Locality::new(&country_code, &locality, lat, lon);

            let row = run::run_locality(&place, &store, &opts);
            write_run_log(&opts.out, std::slice::from_ref(&row))?;
            if let Some(e) = row.error {
                bail!("{}: {e}", place.output_stem());
            }
            println!("{}", row.output.display());
        }

        Command::Batch {
            localities,
            limit,
            random,
            seed,
            jobs,
            run,
        } => {
            let opts = run.options()?;
            let store = MetadataStore::load(&run.metadata);
            let mut places = load_localities(&localities)?;

            if random {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                places = places.choose(&mut rng).cloned().into_iter().collect();
            }
            if let Some(n) = limit {
                places.truncate(n);
            }
            if places.is_empty() {
                warn!("no localities to animate");
            }
            info!("animating {} localities", places.len());

            let rows = run_batch(&places, &store, &opts, jobs)?;
            let log_path = write_run_log(&opts.out, &rows)?;

            let count = |s: RunStatus| rows.iter().filter(|r| r.status == s).count();
            println!("Wrote run log to: {}", log_path.display());
            println!(
                "Localities: {} (generated={} skipped={} failed={})",
                rows.len(),
                count(RunStatus::Generated),
                count(RunStatus::Skipped),
                count(RunStatus::Failed)
            );
        }

        Command::Match { metadata, lat, lon } => {
            let store = MetadataStore::read(&metadata)
                .with_context(|| format!("loading {}", metadata.display()))?;
            match store.match_coordinate(lat, lon) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
                None => bail!("no raster covers ({lat}, {lon})"),
            }
        }
    }

    Ok(())
}

fn parse_rates(s: &str) -> anyhow::Result<Vec<f64>> {
    let mut out = Vec::new();
    for part in s.split(',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        let v: f64 = p
            .parse()
            .with_context(|| format!("bad dispersion rate {p:?}"))?;
        out.push(v);
    }
    Ok(out)
}
