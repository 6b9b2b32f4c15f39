use crate::grid::Grid;

/// Per-compartment accentuation in storage order (sane, infected, rampaging).
pub const ACCENT: [f64; 3] = [2.0, 25.0, 25.0];

/// An RGB8 image, row-major, three bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_rgb(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_rgb(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        let i = 3 * (row * self.width + col);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Opaque RGBA copy, as expected by GIF encoders and canvas `ImageData`.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for px in self.pixels.chunks_exact(3) {
            out.extend_from_slice(px);
            out.push(u8::MAX);
        }
        out
    }
}

/// Colours a grid: rampaging drives red, infected green, sane blue.
pub fn to_frame(grid: &Grid) -> Frame {
    let [s, i, r] = grid.layers();
    let mut pixels = Vec::with_capacity(3 * s.len());

    for k in 0..s.len() {
        pixels.push(channel(r[k], ACCENT[2]));
        pixels.push(channel(i[k], ACCENT[1]));
        pixels.push(channel(s[k], ACCENT[0]));
    }

    Frame {
        width: grid.width(),
        height: grid.height(),
        pixels,
    }
}

fn channel(value: f64, accent: f64) -> u8 {
    // Float to int casts saturate, so drift below zero lands on 0.
    (255.0 * accent * value).min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Compartment;

    #[test]
    fn channels_are_reversed_and_accentuated() {
        let mut g = Grid::zeros(1, 2);
        g.set(Compartment::Sane, 0, 0, 0.1);
        g.set(Compartment::Infected, 0, 0, 0.02);
        g.set(Compartment::Rampaging, 0, 0, 0.01);
        g.set(Compartment::Sane, 0, 1, 0.9);

        let f = to_frame(&g);
        // 255*25*0.01 = 63.75, 255*25*0.02 = 127.5, 255*2*0.1 = 51
        assert_eq!(f.pixel(0, 0), [63, 127, 51]);
        assert_eq!(f.pixel(0, 1), [0, 0, 255]);
    }

    #[test]
    fn channels_stay_within_bounds() {
        let mut g = Grid::zeros(2, 2);
        g.layer_mut(Compartment::Sane).copy_from_slice(&[0.0, 0.5, 1.0, 7.0]);
        g.layer_mut(Compartment::Infected).copy_from_slice(&[0.0, 0.01, 1.0, 3.0]);
        g.layer_mut(Compartment::Rampaging).copy_from_slice(&[1e9, 0.0, -0.2, 0.04]);

        let f = to_frame(&g);
        assert_eq!(f.pixel(0, 0), [255, 0, 0]);
        assert_eq!(f.pixel(1, 0), [0, 255, 255]);
        assert_eq!(f.pixel(1, 1), [255, 255, 255]);
    }

    #[test]
    fn rgba_appends_opaque_alpha() {
        let mut g = Grid::zeros(1, 1);
        g.set(Compartment::Sane, 0, 0, 1.0);
        let rgba = to_frame(&g).to_rgba();
        assert_eq!(rgba, vec![0, 0, 255, 255]);
    }
}
