//! Density accumulators.  A render writes into three colour channels
//! and, optionally, an importance channel recording which sampled
//! points contributed.  Every worker gets its own `Histogram`; they
//! are summed after the workers have joined, so no cell is ever
//! written by two threads.

use crate::planes::Pixel;

/// A dense, row-major grid of non-negative weights.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl Channel {
    /// An all-zero channel.
    pub fn new(width: usize, height: usize) -> Channel {
        Channel {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Adds weight to a cell.  The pixel must be inside the channel.
    #[inline]
    pub fn add(&mut self, pixel: Pixel, weight: f64) {
        debug_assert!(pixel.0 < self.width && pixel.1 < self.height);
        self.cells[pixel.1 * self.width + pixel.0] += weight;
    }

    /// The weight in a cell.
    #[inline]
    pub fn get(&self, pixel: Pixel) -> f64 {
        self.cells[pixel.1 * self.width + pixel.0]
    }

    /// One row of cells.
    pub fn row(&self, y: usize) -> &[f64] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// All the cells, row after row.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// The largest weight, or zero for an empty channel.
    pub fn max(&self) -> f64 {
        self.cells.iter().cloned().fold(0.0, f64::max)
    }

    /// Sums another channel of the same size into this one.
    pub fn merge(&mut self, other: &Channel) {
        assert!(self.width == other.width && self.height == other.height);
        for (cell, add) in self.cells.iter_mut().zip(other.cells.iter()) {
            *cell += add;
        }
    }
}

/// The three colour channels, and the optional importance channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// Red.
    pub r: Channel,
    /// Green.
    pub g: Channel,
    /// Blue.
    pub b: Channel,
    /// Density of the sampled points whose orbits were registered.
    pub importance: Option<Channel>,
}

impl Histogram {
    /// An empty histogram.
    pub fn new(width: usize, height: usize, importance: bool) -> Histogram {
        Histogram {
            r: Channel::new(width, height),
            g: Channel::new(width, height),
            b: Channel::new(width, height),
            importance: if importance {
                Some(Channel::new(width, height))
            } else {
                None
            },
        }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.r.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.r.height
    }

    /// Adds a colour sample to all three channels.
    #[inline]
    pub fn add(&mut self, pixel: Pixel, (red, green, blue): (f64, f64, f64)) {
        self.r.add(pixel, red);
        self.g.add(pixel, green);
        self.b.add(pixel, blue);
    }

    /// The maxima of the three colour channels.
    pub fn max(&self) -> (f64, f64, f64) {
        (self.r.max(), self.g.max(), self.b.max())
    }

    /// Sums another histogram into this one.
    pub fn merge(&mut self, other: &Histogram) {
        self.r.merge(&other.r);
        self.g.merge(&other.g);
        self.b.merge(&other.b);
        if let (Some(mine), Some(theirs)) = (self.importance.as_mut(), other.importance.as_ref()) {
            mine.merge(theirs);
        }
    }

    /// Sums a collection of per-worker histograms into a single one.
    pub fn merged<'a, I>(width: usize, height: usize, importance: bool, parts: I) -> Histogram
    where
        I: IntoIterator<Item = &'a Histogram>,
    {
        let mut total = Histogram::new(width, height, importance);
        for part in parts {
            total.merge(part);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_touches_one_cell_in_each_channel() {
        let mut h = Histogram::new(4, 3, false);
        h.add(Pixel(3, 2), (0.5, 0.25, 1.0));
        h.add(Pixel(3, 2), (0.5, 0.25, 1.0));
        assert_eq!(h.r.get(Pixel(3, 2)), 1.0);
        assert_eq!(h.g.get(Pixel(3, 2)), 0.5);
        assert_eq!(h.b.get(Pixel(3, 2)), 2.0);
        assert_eq!(h.r.cells().iter().filter(|&&v| v != 0.0).count(), 1);
        assert_eq!(h.r.row(2)[3], 1.0);
        assert_eq!(h.max(), (1.0, 0.5, 2.0));
    }

    #[test]
    fn merge_sums_cellwise() {
        let mut a = Histogram::new(2, 2, true);
        let mut b = Histogram::new(2, 2, true);
        a.add(Pixel(0, 0), (1.0, 1.0, 1.0));
        b.add(Pixel(0, 0), (2.0, 0.0, 0.0));
        b.add(Pixel(1, 1), (0.0, 3.0, 0.0));
        if let Some(imp) = b.importance.as_mut() {
            imp.add(Pixel(1, 0), 0.5);
        }
        let total = Histogram::merged(2, 2, true, vec![&a, &b]);
        assert_eq!(total.r.get(Pixel(0, 0)), 3.0);
        assert_eq!(total.g.get(Pixel(1, 1)), 3.0);
        assert_eq!(total.importance.unwrap().get(Pixel(1, 0)), 0.5);
    }

    #[test]
    fn empty_channel_max_is_zero() {
        assert_eq!(Channel::new(3, 3).max(), 0.0);
        assert!(Histogram::new(3, 3, false).importance.is_none());
    }
}
