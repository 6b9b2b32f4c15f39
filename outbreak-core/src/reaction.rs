use crate::grid::Grid;

/// Local transition rates between compartments.
///
/// Sane cells are infected in proportion to the rampaging population on the
/// same cell; infected cells turn rampaging at the incubation rate. The
/// three deltas of every cell sum to zero. Inputs are not modified.
pub fn evolve(grid: &Grid, infection_rate: f64, incubation_rate: f64) -> Grid {
    let mut delta = Grid::zeros(grid.height(), grid.width());
    let [s, i, r] = grid.layers();
    let [ds, di, dr] = delta.layers_mut();

    for k in 0..s.len() {
        let newly_infected = infection_rate * r[k] * s[k];
        let newly_rampaging = incubation_rate * i[k];

        ds[k] = -newly_infected;
        di[k] = newly_infected - newly_rampaging;
        dr[k] = newly_rampaging;
    }

    delta
}
