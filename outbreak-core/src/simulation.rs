use log::{debug, trace};

use crate::diffusion::{DispersionKernel, disperse};
use crate::error::{OutbreakError, Result};
use crate::frame::{Frame, to_frame};
use crate::grid::Grid;
use crate::params::ModelParams;
use crate::reaction::evolve;

/// Owns the population grid and the model clock and advances them with an
/// explicit Euler scheme.
///
/// The clock only moves forward. Rendering at a video time the clock has
/// already passed re-renders the current state.
#[derive(Clone, Debug)]
pub struct Simulation {
    grid: Grid,
    params: ModelParams,
    steps: u64,
}

impl Simulation {
    pub fn new(grid: Grid, params: ModelParams) -> Simulation {
        Simulation {
            grid,
            params,
            steps: 0,
        }
    }

    // ---- Accessors ----

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Elapsed model hours. Derived from the step count so that `n` steps
    /// always read exactly `n * timestep`.
    pub fn clock(&self) -> f64 {
        self.steps as f64 * self.params.timestep()
    }

    // ---- Core: one explicit step ----

    /// Advances the grid by one timestep.
    ///
    /// The reaction delta is applied once on its own and then a second
    /// time together with the dispersion computed on the reaction-advanced
    /// grid.
    pub fn step(&mut self) {
        let dt = self.params.timestep();

        let evolution = evolve(
            &self.grid,
            self.params.infection_rate(),
            self.params.incubation_rate(),
        );
        self.grid.add_scaled(&evolution, dt);

        let mut delta = disperse(&self.grid, &DispersionKernel::DEFAULT, self.params.dispersion_rates());
        delta.add_assign(&evolution);
        self.grid.add_scaled(&delta, dt);

        self.steps += 1;
    }

    /// Steps until the clock reaches `hours`. Returns the number of steps
    /// taken, zero if the clock is already there.
    pub fn advance_to(&mut self, hours: f64) -> u64 {
        let start = self.steps;
        while self.clock() < hours {
            self.step();
        }
        let taken = self.steps - start;
        if taken > 0 {
            trace!("advanced {taken} steps to t={}h", self.clock());
        }
        taken
    }

    /// Advances until model time catches up with `video_seconds` of video,
    /// then colours the current state.
    ///
    /// Cost grows linearly with `video_seconds / timestep`.
    pub fn render(&mut self, video_seconds: f64) -> Frame {
        self.advance_to(self.params.hours_per_second() * video_seconds);
        self.frame()
    }

    /// Colours the current state without advancing.
    pub fn frame(&self) -> Frame {
        to_frame(&self.grid)
    }

    /// Turns the simulation into a forward-only frame source sampling
    /// `duration` seconds of video at `fps`.
    pub fn into_frames(self, fps: f64, duration: f64) -> Result<FrameSequence> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(OutbreakError::InvalidParameter(format!("fps must be > 0, got {fps}")));
        }
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(OutbreakError::InvalidParameter(format!(
                "duration must be >= 0, got {duration}"
            )));
        }
        let count = (duration * fps).ceil() as usize;
        debug!("frame sequence: {count} frames at {fps} fps");

        Ok(FrameSequence {
            simulation: self,
            fps,
            next: 0,
            count,
        })
    }
}

/// Frames at `t = i / fps` for increasing `i`, each produced by rendering
/// the owned simulation further forward.
#[derive(Debug)]
pub struct FrameSequence {
    simulation: Simulation,
    fps: f64,
    next: usize,
    count: usize,
}

impl FrameSequence {
    pub fn into_simulation(self) -> Simulation {
        self.simulation
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Iterator for FrameSequence {
    type Item = (f64, Frame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let t = self.next as f64 / self.fps;
        self.next += 1;
        Some((t, self.simulation.render(t)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.count - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for FrameSequence {}
