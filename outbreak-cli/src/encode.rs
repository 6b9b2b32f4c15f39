use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, RgbImage, RgbaImage};
use log::debug;
use outbreak_core::{Frame, FrameSequence};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single looping animated GIF
    Gif,
    /// Directory of numbered PNG frames
    Frames,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
            OutputFormat::Frames => "frames",
        }
    }

    /// Where the output for `stem` goes under `out`.
    pub fn output_path(&self, out: &Path, stem: &str) -> PathBuf {
        match self {
            OutputFormat::Gif => out.join("gif").join(format!("{stem}.gif")),
            OutputFormat::Frames => out.join("frames").join(stem),
        }
    }
}

/// Drains `frames` into `path`. Returns the number of frames written.
pub fn write_frames(
    format: OutputFormat,
    frames: &mut FrameSequence,
    fps: u32,
    path: &Path,
) -> Result<usize> {
    match format {
        OutputFormat::Gif => write_gif(frames, fps, path),
        OutputFormat::Frames => write_png_frames(frames, path),
    }
}

fn write_gif(frames: &mut FrameSequence, fps: u32, path: &Path) -> Result<usize> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite)?;

    let delay = Delay::from_numer_denom_ms(1000, fps.max(1));

    let mut written = 0;
    for (t, frame) in frames {
        let buffer = rgba_image(&frame)?;
        encoder
            .encode_frame(image::Frame::from_parts(buffer, 0, 0, delay))
            .with_context(|| format!("encoding frame at t={t:.3}s"))?;
        written += 1;
    }
    debug!("wrote {written} frames to {}", path.display());
    Ok(written)
}

fn write_png_frames(frames: &mut FrameSequence, dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = 0;
    for (_, frame) in frames {
        let path = dir.join(format!("frame_{written:05}.png"));
        rgb_image(&frame)?
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }
    debug!("wrote {written} frames to {}", dir.display());
    Ok(written)
}

fn rgb_image(frame: &Frame) -> Result<RgbImage> {
    RgbImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.as_rgb().to_vec(),
    )
    .context("frame buffer does not match its dimensions")
}

fn rgba_image(frame: &Frame) -> Result<RgbaImage> {
    RgbaImage::from_raw(frame.width() as u32, frame.height() as u32, frame.to_rgba())
        .context("frame buffer does not match its dimensions")
}
