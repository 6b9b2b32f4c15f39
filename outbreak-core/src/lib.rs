//! Reaction–diffusion model of a zombie outbreak over a population density
//! map.
//!
//! The population is split into three compartments:
//!
//! - **Sane** individuals stay where they are.
//! - **Infected** individuals panic and move quickly.
//! - **Rampaging** zombies move slowly and infect the sane.
//!
//! Infected individuals tend to flee toward larger settlements, which get
//! contaminated ahead of the main zombie wave.
//!
//! ```
//! use outbreak_core::{DensityImage, ModelParams, OutbreakPoint, Simulation, seed_grid};
//!
//! let map = DensityImage::new(4, 4, 1, vec![200; 16]).unwrap();
//! let mut sim = Simulation::new(seed_grid(&map, OutbreakPoint::center()), ModelParams::default());
//! let frame = sim.render(0.1);
//! assert_eq!((frame.width(), frame.height()), (4, 4));
//! ```

pub mod diffusion;
pub mod error;
pub mod frame;
pub mod geo;
pub mod grid;
pub mod metadata;
pub mod outbreak;
pub mod params;
pub mod population;
pub mod reaction;
pub mod simulation;

pub use diffusion::{DispersionKernel, DispersionRates, disperse};
pub use error::{OutbreakError, Result};
pub use frame::{Frame, to_frame};
pub use geo::{BoundingBox, GeoTransform};
pub use grid::{Compartment, Grid};
pub use metadata::{MetadataStore, RasterEntry, RasterLookup};
pub use outbreak::{
    DensitySource, Locality, Outbreak, OutbreakSettings, build_outbreak, build_simulation,
};
pub use params::{ModelConfig, ModelParams};
pub use population::{DensityImage, OutbreakPoint, SEED_LEVEL, seed_grid};
pub use reaction::evolve;
pub use simulation::{FrameSequence, Simulation};
