use log::{Level, LevelFilter, Record, debug};
use outbreak_core::{
    DensityImage, DispersionRates, ModelParams, OutbreakPoint, Simulation, seed_grid,
};
use wasm_bindgen::prelude::*;
use web_sys::console;

#[wasm_bindgen]
pub struct Outbreak {
    inner: Simulation,
}

#[wasm_bindgen]
impl Outbreak {
    /// Default model parameters. `samples` holds `channels` interleaved
    /// bytes per pixel (RGBA canvas data has 4).
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<u8>,
        x: f64,
        y: f64,
    ) -> Result<Outbreak, JsValue> {
        Self::build(width, height, channels, samples, x, y, ModelParams::default())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_params(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<u8>,
        x: f64,
        y: f64,
        infection_rate: f64,
        incubation_rate: f64,
        timestep: f64,
        hours_per_second: f64,
        dispersion_rates: Vec<f64>,
    ) -> Result<Outbreak, JsValue> {
        let rates = DispersionRates::try_from(dispersion_rates.as_slice()).map_err(js_err)?;
        let params = ModelParams::new(infection_rate, incubation_rate, timestep, hours_per_second, rates)
            .map_err(js_err)?;
        Self::build(width, height, channels, samples, x, y, params)
    }

    pub fn width(&self) -> usize { self.inner.grid().width() }
    pub fn height(&self) -> usize { self.inner.grid().height() }
    pub fn clock(&self) -> f64 { self.inner.clock() }
    pub fn steps(&self) -> u32 { saturating_u32(self.inner.steps()) }

    /// RGBA bytes for `ImageData` after advancing to `t` seconds of video.
    pub fn render(&mut self, t: f64) -> Vec<u8> {
        self.inner.render(t).to_rgba()
    }

    /// Current state without advancing.
    pub fn frame(&self) -> Vec<u8> {
        self.inner.frame().to_rgba()
    }

    // Advance + timing (WASM-only)
    pub fn render_timed(&mut self, t: f64) -> RenderInfo {
        let t0 = now_ms();
        let steps = self
            .inner
            .advance_to(self.inner.params().hours_per_second() * t);
        let t1 = now_ms();
        RenderInfo {
            steps: saturating_u32(steps),
            compute_ms: t1 - t0,
            clock: self.inner.clock(),
        }
    }
}

impl Outbreak {
    fn build(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<u8>,
        x: f64,
        y: f64,
        params: ModelParams,
    ) -> Result<Outbreak, JsValue> {
        let point = OutbreakPoint::new(x, y);
        if !point.is_inside() {
            return Err(JsValue::from_str("outbreak point must lie inside the map"));
        }
        let image = DensityImage::new(width, height, channels, samples).map_err(js_err)?;
        let grid = seed_grid(&image, point);
        debug!("outbreak grid {width}x{height} seeded at ({x}, {y})");
        Ok(Outbreak {
            inner: Simulation::new(grid, params),
        })
    }
}

#[wasm_bindgen]
pub struct RenderInfo {
    steps: u32,
    compute_ms: f64,
    clock: f64,
}

#[wasm_bindgen]
impl RenderInfo {
    pub fn steps(&self) -> u32 { self.steps }
    pub fn compute_ms(&self) -> f64 { self.compute_ms }
    pub fn clock(&self) -> f64 { self.clock }
}

/// Routes `log` records at or above `level` ("info", "debug", ...) to the
/// browser console. Later calls are ignored.
#[wasm_bindgen]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    let level: LevelFilter = level.parse().map_err(js_err)?;
    if fern::Dispatch::new()
        .level(level)
        .chain(fern::Output::call(log_to_console))
        .apply()
        .is_err()
    {
        debug!("logger already installed");
    }
    Ok(())
}

fn log_to_console(record: &Record) {
    let message = JsValue::from_str(&format!(
        "{:<5} {} - {}",
        record.level(),
        record.target(),
        record.args()
    ));
    match record.level() {
        Level::Error => console::error_1(&message),
        Level::Warn => console::warn_1(&message),
        Level::Info => console::info_1(&message),
        Level::Debug => console::log_1(&message),
        Level::Trace => console::debug_1(&message),
    }
}

fn saturating_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
