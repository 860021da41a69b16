//! Writing orbits into the histogram.  `trace_and_register` is the
//! one entry point the sampling driver needs: it applies the mode's
//! bulb pruning, traces the point, decides whether the orbit is
//! wanted, and writes it with the mode's pattern.

use num::Complex;

use crate::bulb::is_in_bulb;
use crate::fractal::FractalConfig;
use crate::histogram::Histogram;
use crate::line::Line;
use crate::orbit::{trace, Orbit, Outcome, Pattern, Policy, Trace};
use crate::planes::Pixel;

/// What happened to one sampled point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Registration {
    /// The trace, or a `Pruned` outcome with no steps.
    pub trace: Trace,
    /// Whether the orbit was written into the histogram.
    pub registered: bool,
    /// How many cells were incremented.
    pub written: usize,
}

/// Adds every recorded step of an orbit to the histogram, coloured by
/// the orbit gradient at the step's position within the orbit and
/// scaled by `weight`.  Steps that land outside the image are skipped.
/// Returns the number of cells incremented.
pub fn register_points(
    points: &[Complex<f64>],
    config: &FractalConfig,
    histogram: &mut Histogram,
    weight: f64,
) -> usize {
    let n = points.len() as f64;
    let mut written = 0;
    for (i, z) in points.iter().enumerate() {
        if let Some(pixel) = config.mapper.point_to_pixel(z) {
            let color = config.orbit_gradient.interpolate(i as f64 / n);
            histogram.add(pixel, (color.r * weight, color.g * weight, color.b * weight));
            written += 1;
        }
    }
    written
}

/// Joins the in-image steps of an orbit with lines and adds a single
/// colour, chosen by the orbit's length, to every pixel of every
/// line.  The shared endpoint of two consecutive lines is counted
/// once for each.  Returns the number of cells incremented.
pub fn register_paths(points: &[Complex<f64>], config: &FractalConfig, histogram: &mut Histogram) -> usize {
    let color = config.path_coloring.get(points.len(), config.iterations).rgb();
    let mut written = 0;
    let mut last: Option<Pixel> = None;
    for z in points {
        let pixel = match config.mapper.point_to_pixel(z) {
            Some(pixel) => pixel,
            None => continue,
        };
        if let Some(from) = last {
            let line = Line::new((from.0 as i64, from.1 as i64), (pixel.0 as i64, pixel.1 as i64));
            // Both ends are inside the image, and so is everything
            // between them.
            for (x, y) in line.take(config.max_points) {
                histogram.add(Pixel(x as usize, y as usize), color);
                written += 1;
            }
        }
        last = Some(pixel);
    }
    written
}

/// Records where the sampled parameter itself landed, weighted by the
/// share of the iteration cap its orbit used.
fn register_importance(c: Complex<f64>, len: usize, config: &FractalConfig, histogram: &mut Histogram) {
    if let Some(importance) = histogram.importance.as_mut() {
        if let Some(pixel) = config.mapper.point_to_pixel(&c) {
            importance.add(pixel, len as f64 / config.iterations as f64);
        }
    }
}

/// Traces `c` from `z0` under `policy` and, if the policy accepts the
/// orbit, writes it into the histogram.
pub fn trace_and_register(
    z0: Complex<f64>,
    c: Complex<f64>,
    config: &FractalConfig,
    policy: &Policy,
    orbit: &mut Orbit,
    histogram: &mut Histogram,
) -> Registration {
    if policy.prune_bulbs && is_in_bulb(c) {
        return Registration {
            trace: Trace {
                outcome: Outcome::Pruned,
                len: 0,
            },
            registered: false,
            written: 0,
        };
    }

    orbit.reset();
    let traced = trace(z0, c, config, policy, orbit);
    let rejected = Registration {
        trace: traced,
        registered: false,
        written: 0,
    };
    if !policy.accept.accepts(traced.outcome) {
        return rejected;
    }
    if traced.len == 0 || (policy.threshold && traced.len < config.threshold) {
        return rejected;
    }

    let points = orbit.points(traced.len);
    let written = match policy.pattern {
        Pattern::Points => register_points(points, config, histogram, 1.0),
        Pattern::Paths => register_paths(points, config, histogram),
        Pattern::Trapped => {
            let weight = 1.0 / (1.0 + 10.0 * orbit.distance);
            register_points(points, config, histogram, weight)
        }
    };
    register_importance(c, traced.len, config, histogram);

    Registration {
        trace: traced,
        registered: true,
        written,
    }
}
