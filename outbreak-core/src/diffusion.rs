use crate::error::{OutbreakError, Result};
use crate::grid::{Compartment, Grid};

/// 3x3 discrete spread operator. Weights sum to zero, so interior cells
/// only redistribute population; with zero padding the border leaks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispersionKernel([[f64; 3]; 3]);

impl DispersionKernel {
    #[rustfmt::skip]
    pub const DEFAULT: DispersionKernel = DispersionKernel([
        [0.5,  1.0, 0.5],
        [1.0, -6.0, 1.0],
        [0.5,  1.0, 0.5],
    ]);

    /// Zero-padded 2D convolution of `src` (`height x width`, row-major),
    /// scaled by `rate`, written into `out`.
    pub fn convolve(&self, src: &[f64], height: usize, width: usize, rate: f64, out: &mut [f64]) {
        debug_assert_eq!(src.len(), height * width);
        debug_assert_eq!(out.len(), height * width);

        for y in 0..height {
            let row = y * width;
            for x in 0..width {
                let mut acc = 0.0;
                for (ky, weights) in self.0.iter().enumerate() {
                    // Convolution flips the kernel: output (y, x) reads input (y + 1 - ky, x + 1 - kx).
                    let Some(sy) = (y + 1).checked_sub(ky).filter(|&sy| sy < height) else {
                        continue;
                    };
                    for (kx, &w) in weights.iter().enumerate() {
                        let Some(sx) = (x + 1).checked_sub(kx).filter(|&sx| sx < width) else {
                            continue;
                        };
                        acc += w * src[sy * width + sx];
                    }
                }
                out[row + x] = acc * rate;
            }
        }
    }
}

impl Default for DispersionKernel {
    fn default() -> Self {
        DispersionKernel::DEFAULT
    }
}

/// How strongly each compartment spreads to its neighbours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispersionRates([f64; Compartment::COUNT]);

impl DispersionRates {
    /// Sane individuals stay put, infected panic and run, zombies shamble.
    pub const DEFAULT: DispersionRates = DispersionRates([0.0, 0.07, 0.03]);

    pub fn new(sane: f64, infected: f64, rampaging: f64) -> DispersionRates {
        DispersionRates([sane, infected, rampaging])
    }

    pub fn rate(&self, c: Compartment) -> f64 {
        self.0[c.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Default for DispersionRates {
    fn default() -> Self {
        DispersionRates::DEFAULT
    }
}

impl TryFrom<&[f64]> for DispersionRates {
    type Error = OutbreakError;

    fn try_from(rates: &[f64]) -> Result<Self> {
        let rates: [f64; Compartment::COUNT] =
            rates.try_into().map_err(|_| OutbreakError::DispersionRateCount {
                expected: Compartment::COUNT,
                actual: rates.len(),
            })?;
        Ok(DispersionRates(rates))
    }
}

/// Spatial spread of every compartment: the kernel convolved with each
/// layer, scaled by that compartment's rate. Inputs are not modified.
pub fn disperse(grid: &Grid, kernel: &DispersionKernel, rates: &DispersionRates) -> Grid {
    let (height, width) = (grid.height(), grid.width());
    let mut delta = Grid::zeros(height, width);

    for c in Compartment::ALL {
        let rate = rates.rate(c);
        if rate == 0.0 {
            continue;
        }
        kernel.convolve(grid.layer(c), height, width, rate, delta.layer_mut(c));
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn point_source(c: Compartment) -> Grid {
        let mut g = Grid::zeros(3, 3);
        g.set(c, 1, 1, 1.0);
        g
    }

    #[test]
    fn point_source_spreads_with_kernel_weights() {
        let g = point_source(Compartment::Infected);
        let d = disperse(&g, &DispersionKernel::DEFAULT, &DispersionRates::DEFAULT);

        let rate = 0.07;
        assert_abs_diff_eq!(d.get(Compartment::Infected, 1, 1), -6.0 * rate, epsilon = 1e-12);
        for (row, col) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
            assert_abs_diff_eq!(d.get(Compartment::Infected, row, col), rate, epsilon = 1e-12);
        }
        for (row, col) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_abs_diff_eq!(d.get(Compartment::Infected, row, col), 0.5 * rate, epsilon = 1e-12);
        }
        assert_eq!(d.total(Compartment::Sane), 0.0);
        assert_eq!(d.total(Compartment::Rampaging), 0.0);
    }

    #[test]
    fn zero_rate_compartment_does_not_move() {
        let g = point_source(Compartment::Sane);
        let d = disperse(&g, &DispersionKernel::DEFAULT, &DispersionRates::DEFAULT);
        assert!(d.layer(Compartment::Sane).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn interior_spread_conserves_mass() {
        let mut g = Grid::zeros(5, 5);
        g.set(Compartment::Rampaging, 2, 2, 1.0);
        let d = disperse(&g, &DispersionKernel::DEFAULT, &DispersionRates::DEFAULT);
        assert_abs_diff_eq!(d.total(Compartment::Rampaging), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_padding_leaks_mass_at_the_border() {
        let mut g = Grid::zeros(4, 6);
        for (k, v) in g.layer_mut(Compartment::Infected).iter_mut().enumerate() {
            *v = 0.1 + 0.02 * k as f64;
        }
        let before = g.total(Compartment::Infected);
        let d = disperse(&g, &DispersionKernel::DEFAULT, &DispersionRates::DEFAULT);
        g.add_assign(&d);
        let after = g.total(Compartment::Infected);
        assert!(after < before, "expected border leak: {after} >= {before}");
    }

    #[test]
    fn corner_source_keeps_only_in_grid_neighbours() {
        let mut g = Grid::zeros(3, 3);
        g.set(Compartment::Infected, 0, 0, 1.0);
        let d = disperse(&g, &DispersionKernel::DEFAULT, &DispersionRates::new(0.0, 1.0, 0.0));
        // -6 at the source, +1 +1 +0.5 into the grid, the rest falls off.
        assert_abs_diff_eq!(d.total(Compartment::Infected), -3.5, epsilon = 1e-12);
        assert_abs_diff_eq!(d.get(Compartment::Infected, 1, 1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rates_need_one_value_per_compartment() {
        let err = DispersionRates::try_from(&[0.0, 0.07][..]).unwrap_err();
        assert!(matches!(
            err,
            OutbreakError::DispersionRateCount { expected: 3, actual: 2 }
        ));

        let ok = DispersionRates::try_from(&[0.0, 0.07, 0.03][..]).unwrap();
        assert_eq!(ok, DispersionRates::DEFAULT);
    }
}
