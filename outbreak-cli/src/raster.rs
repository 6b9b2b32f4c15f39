use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use log::debug;
use outbreak_core::{DensityImage, DensitySource, OutbreakError, Result};

/// Population density maps stored as PNG files.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngDensitySource;

impl DensitySource for PngDensitySource {
    fn size(&self, path: &Path) -> Result<(u32, u32)> {
        image::image_dimensions(path).map_err(|e| image_error(path, e))
    }

    fn load_resized(&self, path: &Path, width: u32) -> Result<DensityImage> {
        let img = image::open(path).map_err(|e| image_error(path, e))?;
        let img = resize_to_width(img, width);
        debug!("loaded {} as {}x{}", path.display(), img.width(), img.height());
        to_density(img)
    }
}

/// Keeps the aspect ratio; height is rounded and never zero.
pub fn resize_to_width(img: DynamicImage, width: u32) -> DynamicImage {
    if img.width() == width || width == 0 {
        return img;
    }
    let height = (f64::from(img.height()) * f64::from(width) / f64::from(img.width()))
        .round()
        .max(1.0) as u32;
    img.resize_exact(width, height, FilterType::Triangle)
}

fn to_density(img: DynamicImage) -> Result<DensityImage> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    if img.color().has_color() {
        DensityImage::new(w, h, 3, img.into_rgb8().into_raw())
    } else {
        DensityImage::new(w, h, 1, img.into_luma8().into_raw())
    }
}

fn image_error(path: &Path, e: ImageError) -> OutbreakError {
    match e {
        ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            OutbreakError::MissingImage(path.to_path_buf())
        }
        ImageError::IoError(io) => OutbreakError::Io(io),
        other => OutbreakError::InvalidParameter(format!("{}: {other}", path.display())),
    }
}
