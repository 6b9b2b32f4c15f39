/// Population compartments, in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compartment {
    Sane,
    Infected,
    Rampaging,
}

impl Compartment {
    pub const ALL: [Compartment; 3] = [
        Compartment::Sane,
        Compartment::Infected,
        Compartment::Rampaging,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Compartment::Sane => 0,
            Compartment::Infected => 1,
            Compartment::Rampaging => 2,
        }
    }
}

/// Three stacked `height x width` layers of population fractions, stored
/// compartment-major then row-major.
///
/// Values are not clamped: explicit Euler steps may push them above 1 or
/// slightly below 0.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<f64>,
}

impl Grid {
    pub fn zeros(height: usize, width: usize) -> Grid {
        Grid {
            height,
            width,
            cells: vec![0.0; Compartment::COUNT * height * width],
        }
    }

    // ---- Accessors ----

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn layer_len(&self) -> usize {
        self.height * self.width
    }

    pub fn layer(&self, c: Compartment) -> &[f64] {
        let n = self.layer_len();
        &self.cells[c.index() * n..(c.index() + 1) * n]
    }

    pub fn layer_mut(&mut self, c: Compartment) -> &mut [f64] {
        let n = self.layer_len();
        &mut self.cells[c.index() * n..(c.index() + 1) * n]
    }

    /// Borrows the three layers at once as `[sane, infected, rampaging]`.
    pub fn layers(&self) -> [&[f64]; 3] {
        let n = self.layer_len();
        let (s, rest) = self.cells.split_at(n);
        let (i, r) = rest.split_at(n);
        [s, i, r]
    }

    pub fn layers_mut(&mut self) -> [&mut [f64]; 3] {
        let n = self.layer_len();
        let (s, rest) = self.cells.split_at_mut(n);
        let (i, r) = rest.split_at_mut(n);
        [s, i, r]
    }

    /// # Panics
    ///
    /// Panics if `row` or `col` is outside the grid.
    pub fn get(&self, c: Compartment, row: usize, col: usize) -> f64 {
        self.layer(c)[self.offset(row, col)]
    }

    /// # Panics
    ///
    /// Panics if `row` or `col` is outside the grid.
    pub fn set(&mut self, c: Compartment, row: usize, col: usize, value: f64) {
        let idx = self.offset(row, col);
        self.layer_mut(c)[idx] = value;
    }

    pub fn total(&self, c: Compartment) -> f64 {
        self.layer(c).iter().sum()
    }

    pub fn total_mass(&self) -> f64 {
        self.cells.iter().sum()
    }

    // ---- Elementwise arithmetic ----

    /// `self += other * scale`, cell by cell.
    ///
    /// # Panics
    ///
    /// Panics if the two grids differ in shape.
    pub fn add_scaled(&mut self, other: &Grid, scale: f64) {
        self.assert_same_shape(other);
        for (dst, &src) in self.cells.iter_mut().zip(&other.cells) {
            *dst += src * scale;
        }
    }

    /// `self += other`, cell by cell.
    pub fn add_assign(&mut self, other: &Grid) {
        self.assert_same_shape(other);
        for (dst, &src) in self.cells.iter_mut().zip(&other.cells) {
            *dst += src;
        }
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.height && col < self.width,
            "cell ({row}, {col}) outside {}x{} grid",
            self.height,
            self.width
        );
        row * self.width + col
    }

    fn assert_same_shape(&self, other: &Grid) {
        assert_eq!(
            (self.height, self.width),
            (other.height, other.width),
            "grid shape mismatch"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_are_disjoint_views() {
        let mut g = Grid::zeros(2, 3);
        g.set(Compartment::Infected, 1, 2, 0.5);
        g.set(Compartment::Rampaging, 0, 0, 0.25);

        let [s, i, r] = g.layers();
        assert!(s.iter().all(|&v| v == 0.0));
        assert_eq!(i[5], 0.5);
        assert_eq!(r[0], 0.25);
        assert_eq!(g.total_mass(), 0.75);
    }

    #[test]
    fn add_scaled_accumulates() {
        let mut a = Grid::zeros(1, 2);
        let mut b = Grid::zeros(1, 2);
        b.layer_mut(Compartment::Sane).fill(2.0);
        a.add_scaled(&b, 0.5);
        a.add_scaled(&b, 0.5);
        assert_eq!(a.layer(Compartment::Sane), &[2.0, 2.0]);
        assert_eq!(a.total(Compartment::Infected), 0.0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_cell_panics() {
        let g = Grid::zeros(2, 2);
        g.get(Compartment::Sane, 2, 0);
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn mismatched_shapes_panic() {
        let mut a = Grid::zeros(2, 2);
        a.add_assign(&Grid::zeros(2, 3));
    }
}
