// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong before or around a render.  Nothing
//! in here is ever produced by the per-point iteration loop; those
//! outcomes are classifications, not failures.

/// The error type for configuration, setup and worker failures.
#[derive(Debug, Fail, PartialEq)]
pub enum BuddhaError {
    /// A colour literal could not be parsed as `#rgb` or `#rrggbb`.
    #[fail(display = "malformed colour literal: {:?}", _0)]
    MalformedColor(String),

    /// A gradient needs at least one keypoint.
    #[fail(display = "a gradient needs at least one keypoint")]
    EmptyGradient,

    /// Gradient keypoints must be sorted ascending by position.
    #[fail(
        display = "gradient keypoint {} at {} comes before its predecessor at {}",
        index, position, previous
    )]
    UnsortedGradient {
        /// Index of the offending keypoint.
        index: usize,
        /// Its position.
        position: f64,
        /// The position of the keypoint before it.
        previous: f64,
    },

    /// Gradient keypoint positions live in [0, 1].
    #[fail(display = "gradient keypoint position {} is outside [0, 1]", _0)]
    KeypointOutOfRange(f64),

    /// Width or height of zero.
    #[fail(display = "image dimensions {}x{} are empty", _0, _1)]
    InvalidDimensions(usize, usize),

    /// A numeric parameter is outside of what the renderer accepts.
    #[fail(display = "invalid value for {}: {}", _0, _1)]
    InvalidParameter(&'static str, String),

    /// The sampling region's corners are the wrong way round.
    #[fail(display = "{}", _0)]
    InvalidRegion(String),

    /// A worker thread panicked; its partial histogram is lost.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,
}
