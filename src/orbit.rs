// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The orbit tracer.  Every render mode runs the same loop: step the
//! map, check for a cycle, check for divergence, and record the
//! projected step.  What differs between modes is captured by a
//! `Policy`: which divergence test to use, whether to skip the known
//! bulbs, which outcomes to accept, and how the accepted orbit is
//! written into the histogram.
//!
//! Cycle detection follows Brent: the current value is saved as a
//! checkpoint whenever the step index crosses a power of two, and
//! every other step is compared against it.  A periodic orbit is
//! caught after at most a couple of checkpoint moves past the point
//! where it settles, instead of burning the whole iteration budget.

use num::Complex;

use crate::fractal::FractalConfig;

/// A reusable buffer for the projected steps of one orbit.  Only the
/// first `len` entries of a `Trace` are meaningful; anything past that
/// is left over from an earlier orbit.
#[derive(Clone, Debug)]
pub struct Orbit {
    points: Vec<Complex<f64>>,
    /// The closest the orbit came to `trap`.
    pub distance: f64,
    /// The point distances are measured to in orbit-trap mode.
    pub trap: Complex<f64>,
}

impl Orbit {
    /// A buffer that can hold `capacity` steps.
    pub fn new(capacity: usize, trap: Complex<f64>) -> Orbit {
        Orbit {
            points: vec![Complex::new(0.0, 0.0); capacity],
            distance: std::f64::INFINITY,
            trap,
        }
    }

    /// A buffer sized for the configuration's iteration cap.
    pub fn for_config(config: &FractalConfig) -> Orbit {
        Orbit::new(config.orbit_capacity(), config.trap)
    }

    /// The number of steps the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// The first `len` recorded steps.
    pub fn points(&self, len: usize) -> &[Complex<f64>] {
        &self.points[..len]
    }

    /// Forgets the previous orbit's trap distance.  The points are
    /// simply overwritten.
    pub fn reset(&mut self) {
        self.distance = std::f64::INFINITY;
    }
}

/// How an orbit ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Diverged at the given step.
    Escaped(usize),
    /// Came back to its checkpoint at the given step.
    Cycled(usize),
    /// Ran out of iterations without diverging.
    Exhausted,
    /// Never traced, because the parameter is inside a known bulb.
    Pruned,
}

impl Outcome {
    /// True for the outcomes that mean "stays bounded".
    pub fn is_bounded(self) -> bool {
        match self {
            Outcome::Cycled(_) | Outcome::Exhausted | Outcome::Pruned => true,
            Outcome::Escaped(_) => false,
        }
    }
}

/// The result of tracing one point: the outcome and the number of
/// steps recorded in the orbit buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Trace {
    /// How the orbit ended.
    pub outcome: Outcome,
    /// How many entries of the orbit buffer are valid.
    pub len: usize,
}

/// What it means for an orbit to diverge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Divergence {
    /// Squared magnitude reaches the configured bailout.
    Bailout,
    /// Both the real and imaginary parts grew by more than this
    /// factor in a single step.  Used by the field-lines mode only;
    /// it is not a magnitude test and the two must not be mixed.
    /// The first step is compared against `z₀`, so from `z₀ = 0` any
    /// parameter with both parts positive diverges at once.
    Ratio(f64),
}

impl Divergence {
    #[inline]
    fn diverged(self, z: Complex<f64>, previous: Complex<f64>, bailout: f64) -> bool {
        match self {
            Divergence::Bailout => z.norm_sqr() >= bailout,
            Divergence::Ratio(g) => z.re / previous.re > g && z.im / previous.im > g,
        }
    }
}

/// Which traced orbits get written into the histogram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Accept {
    /// Orbits that escaped.
    Escaped,
    /// Orbits caught in a cycle.
    Cycled,
    /// Every orbit, however it ended.
    Always,
    /// Orbits that diverged or ran out of iterations, but not cycles.
    Uncycled,
}

impl Accept {
    /// Does this policy take an orbit with the given outcome?
    pub fn accepts(self, outcome: Outcome) -> bool {
        match (self, outcome) {
            (_, Outcome::Pruned) => false,
            (Accept::Always, _) => true,
            (Accept::Escaped, Outcome::Escaped(_)) => true,
            (Accept::Cycled, Outcome::Cycled(_)) => true,
            (Accept::Uncycled, Outcome::Escaped(_)) | (Accept::Uncycled, Outcome::Exhausted) => true,
            _ => false,
        }
    }
}

/// How an accepted orbit is written into the histogram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Pattern {
    /// Every step is a sample, coloured by its position in the orbit.
    Points,
    /// Consecutive steps are joined by lines in a single colour.
    Paths,
    /// Like `Points`, dimmed by the orbit's distance to the trap.
    Trapped,
}

/// Everything that varies between render modes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Policy {
    /// Skip parameters inside the known bulbs without tracing.
    pub prune_bulbs: bool,
    /// The divergence test.
    pub divergence: Divergence,
    /// Which outcomes are registered.
    pub accept: Accept,
    /// How they are registered.
    pub pattern: Pattern,
    /// Whether orbits shorter than the threshold are dropped.
    pub threshold: bool,
    /// Whether the tracer tracks the distance to the trap.
    pub measure_trap: bool,
}

/// The render modes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    /// The Buddhabrot: escaping orbits, point by point.
    Escaped,
    /// The anti-Buddhabrot: orbits caught in cycles, as paths.
    Converged,
    /// Every orbit, point by point, bulbs included.
    Primitive,
    /// Escaping orbits, as paths.
    Path,
    /// Orbits of the ratio test, point by point.
    FieldLines,
    /// Escaping orbits, dimmed by their distance to a trap point.
    OrbitTrap,
}

impl Mode {
    /// All modes, in the order they are listed on the command line.
    pub const ALL: [Mode; 6] = [
        Mode::Escaped,
        Mode::Converged,
        Mode::Primitive,
        Mode::Path,
        Mode::FieldLines,
        Mode::OrbitTrap,
    ];

    /// The name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Escaped => "escaped",
            Mode::Converged => "converged",
            Mode::Primitive => "primitive",
            Mode::Path => "path",
            Mode::FieldLines => "fieldlines",
            Mode::OrbitTrap => "orbittrap",
        }
    }

    /// The inverse of `name`.
    pub fn from_name(name: &str) -> Option<Mode> {
        Mode::ALL.iter().cloned().find(|mode| mode.name() == name)
    }

    /// The policy this mode runs the tracer with.
    pub fn policy(self, config: &FractalConfig) -> Policy {
        let base = Policy {
            prune_bulbs: true,
            divergence: Divergence::Bailout,
            accept: Accept::Escaped,
            pattern: Pattern::Points,
            threshold: true,
            measure_trap: false,
        };
        match self {
            Mode::Escaped => base,
            Mode::Converged => Policy {
                prune_bulbs: false,
                accept: Accept::Cycled,
                pattern: Pattern::Paths,
                ..base
            },
            Mode::Primitive => Policy {
                prune_bulbs: false,
                accept: Accept::Always,
                threshold: false,
                ..base
            },
            Mode::Path => Policy {
                prune_bulbs: false,
                pattern: Pattern::Paths,
                ..base
            },
            Mode::FieldLines => Policy {
                divergence: Divergence::Ratio(config.field_ratio),
                accept: Accept::Uncycled,
                ..base
            },
            Mode::OrbitTrap => Policy {
                pattern: Pattern::Trapped,
                measure_trap: true,
                ..base
            },
        }
    }
}

/// Iterates the configured map from `z0` with parameter `c`, recording
/// each projected step into `orbit` until the orbit diverges, cycles,
/// or runs out of iterations.  The step that diverges or closes the
/// cycle is not recorded, so an orbit that escapes at step `i` leaves
/// exactly `i` points behind.
///
/// A buffer smaller than `config.iterations` cuts the orbit short: it
/// is traced for as many steps as the buffer holds.
pub fn trace(
    z0: Complex<f64>,
    c: Complex<f64>,
    config: &FractalConfig,
    policy: &Policy,
    orbit: &mut Orbit,
) -> Trace {
    let limit = config.iterations.min(orbit.capacity());
    let mut z = z0;
    let mut previous = z0;
    let mut checkpoint = Complex::new(0.0, 0.0);

    for i in 0..limit {
        z = config.kernel.step(z, c, config.coefficient);

        if policy.measure_trap {
            orbit.distance = orbit.distance.min((z - orbit.trap).norm());
        }

        if i > 1 && (i - 1) & i == 0 {
            checkpoint = z;
        } else if z == checkpoint {
            return Trace {
                outcome: Outcome::Cycled(i),
                len: i,
            };
        }

        if policy.divergence.diverged(z, previous, config.bailout) {
            return Trace {
                outcome: Outcome::Escaped(i),
                len: i,
            };
        }

        orbit.points[i] = config.plane.project(z, c);
        previous = z;
    }

    Trace {
        outcome: Outcome::Exhausted,
        len: limit,
    }
}

/// Runs the escape-time loop with no recording at all and returns the
/// step at which the orbit escaped, if it did.  Cheap enough for
/// probing whether a region of the plane is worth sampling.
pub fn escape_time(c: Complex<f64>, config: &FractalConfig) -> Option<usize> {
    let mut z = Complex::new(0.0, 0.0);
    let mut checkpoint = Complex::new(0.0, 0.0);
    for i in 0..config.iterations {
        z = config.kernel.step(z, c, config.coefficient);
        if i > 1 && (i - 1) & i == 0 {
            checkpoint = z;
        } else if z == checkpoint {
            return None;
        }
        if z.norm_sqr() >= config.bailout {
            return Some(i);
        }
    }
    None
}
