#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot (and its relatives) turn the Mandelbrot iteration
//! inside out.  Instead of colouring a parameter `c` by how quickly
//! its orbit escapes, every step of the orbit is itself treated as a
//! coordinate, mapped onto the nearest pixel, and counted.  Summed
//! over millions of sampled parameters the counts form a density
//! image of where orbits travel.
//!
//! Which orbits are counted, and how, is set by a `Mode`:
//!
//! * `escaped`: orbits that leave the bailout radius, the classic image.
//! * `converged`: orbits that fall into a cycle, drawn as paths.
//! * `primitive`: every orbit, escaped or not.
//! * `path`: escaping orbits drawn as connected line segments.
//! * `fieldlines`: orbits whose step ratio blows up, a rough
//!   approximation of the field lines around the set.
//! * `orbittrap`: escaping orbits weighted by how close they pass to a
//!   trap point.
//!
//! The pipeline is `render::Renderer` (sampling on worker threads),
//! `histogram::Histogram` (the accumulated counts) and `plot::plot`
//! (tone mapping into an RGBA canvas).

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate crossbeam;
extern crate itertools;
extern crate num;
extern crate rand;

pub mod bulb;
pub mod errors;
pub mod fractal;
pub mod gradient;
pub mod histogram;
pub mod line;
pub mod orbit;
pub mod planes;
pub mod plot;
pub mod register;
pub mod render;

pub use errors::BuddhaError;
pub use fractal::{FractalConfig, Kernel};
pub use histogram::Histogram;
pub use orbit::Mode;
pub use planes::{ComplexPlane, Plane};
pub use plot::{plot, Canvas, Curve, ToneMap};
pub use render::{RenderStats, Renderer, Sampling};
