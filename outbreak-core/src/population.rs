use crate::error::{OutbreakError, Result};
use crate::grid::{Compartment, Grid};

/// Infected level placed on the outbreak cell at t = 0.
pub const SEED_LEVEL: f64 = 0.8;

/// A population density map: 8-bit samples, row-major, interleaved
/// channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DensityImage {
    width: usize,
    height: usize,
    channels: usize,
    samples: Vec<u8>,
}

impl DensityImage {
    pub fn new(width: usize, height: usize, channels: usize, samples: Vec<u8>) -> Result<DensityImage> {
        if !(1..=4).contains(&channels) {
            return Err(format!("density image needs 1 to 4 channels, got {channels}").into());
        }
        if samples.len() != width * height * channels {
            return Err(format!(
                "density image {width}x{height}x{channels} needs {} samples, got {}",
                width * height * channels,
                samples.len()
            )
            .into());
        }
        Ok(DensityImage {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Channels holding colour: grey-alpha and RGBA drop the trailing alpha.
    fn colour_channels(&self) -> usize {
        match self.channels {
            2 | 4 => self.channels - 1,
            n => n,
        }
    }

    /// Mean of the colour channels of a pixel, scaled to `[0, 1]`.
    pub fn intensity(&self, row: usize, col: usize) -> f64 {
        let start = (row * self.width + col) * self.channels;
        self.mean_of(&self.samples[start..start + self.channels])
    }

    fn mean_of(&self, px: &[u8]) -> f64 {
        let colour = self.colour_channels();
        let sum: f64 = px[..colour].iter().map(|&v| f64::from(v)).sum();
        sum / colour as f64 / 255.0
    }
}

/// Outbreak location as a fraction of the image extent, `x` across the
/// columns and `y` down the rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutbreakPoint {
    pub x: f64,
    pub y: f64,
}

impl OutbreakPoint {
    pub fn new(x: f64, y: f64) -> OutbreakPoint {
        OutbreakPoint { x, y }
    }

    pub fn center() -> OutbreakPoint {
        OutbreakPoint { x: 0.5, y: 0.5 }
    }

    /// Whether both fractions lie in `[0, 1)`, i.e. the point maps to a
    /// cell of any non-empty image.
    pub fn is_inside(&self) -> bool {
        (0.0..1.0).contains(&self.x) && (0.0..1.0).contains(&self.y)
    }

    /// `(row, col)` of the cell the point falls in.
    pub fn cell(&self, height: usize, width: usize) -> (usize, usize) {
        ((self.y * height as f64) as usize, (self.x * width as f64) as usize)
    }
}

/// Initial state: sane population from the image, a single infected seed,
/// no zombies yet.
///
/// # Panics
///
/// The point must map inside the image (see [`OutbreakPoint::is_inside`]).
/// A point outside panics on indexing.
pub fn seed_grid(image: &DensityImage, point: OutbreakPoint) -> Grid {
    let mut grid = Grid::zeros(image.height, image.width);

    let sane = grid.layer_mut(Compartment::Sane);
    for (cell, px) in sane.iter_mut().zip(image.samples.chunks_exact(image.channels)) {
        *cell = image.mean_of(px);
    }

    let (row, col) = point.cell(image.height, image.width);
    grid.set(Compartment::Infected, row, col, SEED_LEVEL);

    grid
}

impl TryFrom<(usize, usize, Vec<u8>)> for DensityImage {
    type Error = OutbreakError;

    /// Single channel `(width, height, samples)`.
    fn try_from((width, height, samples): (usize, usize, Vec<u8>)) -> Result<Self> {
        DensityImage::new(width, height, 1, samples)
    }
}
