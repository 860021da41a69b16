// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tone mapping.  Raw orbit counts span many orders of magnitude: a
//! handful of cells near the real axis collect most of the density
//! while the interesting filaments collect almost none.  Each channel
//! is pushed through a scaling curve and normalised so that its
//! maximum lands on the exposure target, which lifts the faint
//! structure without clipping the bright.

use crossbeam::thread::ScopedJoinHandle;

use crate::errors::BuddhaError;
use crate::histogram::{Channel, Histogram};

/// The scaling curves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Curve {
    /// `x`
    Linear,
    /// `ln(1 + factor·x)`
    Log,
    /// `sqrt(factor·x)`
    Sqrt,
    /// `1 - e^(-factor·x)`
    Exp,
}

impl Curve {
    /// Applies the curve.
    #[inline]
    pub fn apply(self, x: f64, factor: f64) -> f64 {
        match self {
            Curve::Linear => x,
            Curve::Log => (factor * x).ln_1p(),
            Curve::Sqrt => (x * factor).sqrt(),
            Curve::Exp => 1.0 - (-factor * x).exp(),
        }
    }

    /// Parses the names used on the command line.
    pub fn from_name(name: &str) -> Option<Curve> {
        match name {
            "linear" => Some(Curve::Linear),
            "log" => Some(Curve::Log),
            "sqrt" => Some(Curve::Sqrt),
            "exp" => Some(Curve::Exp),
            _ => None,
        }
    }
}

/// A curve together with its factor and the exposure target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ToneMap {
    /// The scaling curve.
    pub curve: Curve,
    /// Passed to the curve.
    pub factor: f64,
    /// What the channel maximum maps to, before clipping at 1.
    pub exposure: f64,
}

impl ToneMap {
    /// The intensity in [0, 1] of a raw value, given its channel's
    /// maximum.  A channel with nothing in it is black.
    #[inline]
    pub fn value(&self, raw: f64, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        (self.exposure * self.curve.apply(raw, self.factor) / self.curve.apply(max, self.factor))
            .min(1.0)
    }

    /// The 8-bit level of a raw value.
    #[inline]
    pub fn level(&self, raw: f64, max: f64) -> u8 {
        (255.0 * self.value(raw, max)) as u8
    }
}

impl Default for ToneMap {
    fn default() -> ToneMap {
        ToneMap {
            curve: Curve::Exp,
            factor: 1.0,
            exposure: 1.0,
        }
    }
}

/// An RGBA image.  Pixels start fully transparent.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A transparent canvas.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sets an opaque pixel.
    pub fn set_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8) {
        let offset = (y * self.width + x) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&[r, g, b, 255]);
    }

    /// The RGBA bytes of a pixel.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * self.width + x) * 4;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }

    /// The raw bytes, row after row.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

// Tone maps the rows `first..first + band.len() / (width * 4)` into
// `band`, which is that run of rows of the canvas.
fn plot_band(
    band: &mut [u8],
    first: usize,
    histogram: &Histogram,
    tone: &ToneMap,
    (r_max, g_max, b_max): (f64, f64, f64),
) {
    let width = histogram.width();
    for (i, row) in band.chunks_mut(width * 4).enumerate() {
        let y = first + i;
        let (r, g, b) = (histogram.r.row(y), histogram.g.row(y), histogram.b.row(y));
        for x in 0..width {
            // Empty cells stay transparent; that is both the fast path
            // and what gives the image its see-through background.
            if r[x] == 0.0 && g[x] == 0.0 && b[x] == 0.0 {
                continue;
            }
            row[x * 4..x * 4 + 4].copy_from_slice(&[
                tone.level(r[x], r_max),
                tone.level(g[x], g_max),
                tone.level(b[x], b_max),
                255,
            ]);
        }
    }
}

/// Tone maps the three colour channels into an image, splitting the
/// rows between `threads` workers.  Each channel is normalised
/// against its own maximum.
pub fn plot(histogram: &Histogram, tone: &ToneMap, threads: usize) -> Result<Canvas, BuddhaError> {
    let (width, height) = (histogram.width(), histogram.height());
    let maxima = histogram.max();
    info!(
        "plotting {}x{} with maxima r={} g={} b={}",
        width, height, maxima.0, maxima.1, maxima.2
    );

    let mut canvas = Canvas::new(width, height);
    let rows_per_band = (height + threads.max(1) - 1) / threads.max(1);
    if rows_per_band == 0 {
        return Ok(canvas);
    }
    crossbeam::scope(|spawner| {
        let handles: Vec<ScopedJoinHandle<()>> = canvas
            .pixels
            .chunks_mut(rows_per_band * width * 4)
            .enumerate()
            .map(|(i, band)| {
                spawner.spawn(move |_| plot_band(band, i * rows_per_band, histogram, tone, maxima))
            })
            .collect();
        for handle in handles {
            handle.join().map_err(|_| BuddhaError::WorkerPanicked)?;
        }
        Ok(())
    })
    .map_err(|_| BuddhaError::WorkerPanicked)??;
    Ok(canvas)
}

/// Tone maps a single channel into a grey image with the exponential
/// curve.  Used for the importance map.
pub fn plot_channel(channel: &Channel, exposure: f64) -> Canvas {
    let tone = ToneMap {
        curve: Curve::Exp,
        factor: 10.0,
        exposure,
    };
    let max = channel.max();
    let mut canvas = Canvas::new(channel.width(), channel.height());
    for y in 0..channel.height() {
        for (x, &v) in channel.row(y).iter().enumerate() {
            if v == 0.0 {
                continue;
            }
            let level = tone.level(v, max);
            canvas.set_pixel(x, y, level, level, level);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planes::Pixel;

    #[test]
    fn curves() {
        assert_eq!(Curve::Linear.apply(3.0, 7.0), 3.0);
        assert!((Curve::Log.apply(1.0, 1.0) - 2f64.ln()).abs() < 1e-12);
        assert_eq!(Curve::Sqrt.apply(2.0, 8.0), 4.0);
        assert_eq!(Curve::Exp.apply(0.0, 5.0), 0.0);
        assert_eq!(Curve::from_name("sqrt"), Some(Curve::Sqrt));
        assert_eq!(Curve::from_name("cubic"), None);
    }

    #[test]
    fn maximum_maps_to_exposure_and_clips() {
        for &curve in &[Curve::Linear, Curve::Log, Curve::Sqrt, Curve::Exp] {
            let tone = ToneMap { curve, factor: 2.0, exposure: 1.0 };
            assert!((tone.value(50.0, 50.0) - 1.0).abs() < 1e-12);
            let bright = ToneMap { curve, factor: 2.0, exposure: 3.0 };
            assert_eq!(bright.value(50.0, 50.0), 1.0);
        }
    }

    #[test]
    fn curves_lift_faint_values_above_linear() {
        let linear = ToneMap { curve: Curve::Linear, factor: 1.0, exposure: 1.0 };
        for &curve in &[Curve::Log, Curve::Sqrt, Curve::Exp] {
            let tone = ToneMap { curve, factor: 1.0, exposure: 1.0 };
            assert!(tone.value(1.0, 100.0) > linear.value(1.0, 100.0), "{:?}", curve);
        }
    }

    #[test]
    fn single_cell_resolves_to_full_intensity() {
        let mut histogram = Histogram::new(4, 4, false);
        histogram.add(Pixel(1, 2), (1.0, 1.0, 1.0));
        let tone = ToneMap { curve: Curve::Linear, factor: 1.0, exposure: 1.0 };
        let canvas = plot(&histogram, &tone, 3).unwrap();
        assert_eq!(canvas.pixel(1, 2), [255, 255, 255, 255]);
        for y in 0..4 {
            for x in 0..4 {
                if (x, y) != (1, 2) {
                    assert_eq!(canvas.pixel(x, y), [0, 0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn channels_normalise_independently() {
        let mut histogram = Histogram::new(3, 2, false);
        histogram.add(Pixel(0, 0), (10.0, 0.0, 1.0));
        histogram.add(Pixel(2, 1), (5.0, 2.0, 0.0));
        let tone = ToneMap { curve: Curve::Linear, factor: 1.0, exposure: 1.0 };
        let canvas = plot(&histogram, &tone, 1).unwrap();
        assert_eq!(canvas.pixel(0, 0), [255, 0, 255, 255]);
        assert_eq!(canvas.pixel(2, 1), [127, 255, 0, 255]);

        let mut red_only = Histogram::new(1, 1, false);
        red_only.add(Pixel(0, 0), (3.0, 0.0, 0.0));
        let canvas = plot(&red_only, &tone, 1).unwrap();
        assert_eq!(canvas.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn thread_count_does_not_change_the_image() {
        let mut histogram = Histogram::new(7, 5, false);
        for i in 0..7 {
            histogram.add(Pixel(i, i % 5), (i as f64, 1.0, (7 - i) as f64));
        }
        let tone = ToneMap::default();
        let one = plot(&histogram, &tone, 1).unwrap();
        for &threads in &[2, 3, 5, 16] {
            assert_eq!(plot(&histogram, &tone, threads).unwrap(), one);
        }
    }

    #[test]
    fn importance_is_grey() {
        let mut channel = Channel::new(2, 2);
        channel.add(Pixel(1, 1), 0.5);
        let canvas = plot_channel(&channel, 1.0);
        assert_eq!(canvas.pixel(1, 1), [255, 255, 255, 255]);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
    }
}
