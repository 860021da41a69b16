//! Contains the PlaneMapper struct, which describes the relationship
//! between the integral plane of the image, with its origin at 0,0,
//! and the complex plane the orbits travel through, positioned by a
//! zoom factor and a pair of offsets.  Also contains the `Plane`
//! projections that decide which two of an orbit's four coordinates
//! end up on screen.
use num::Complex;

use crate::errors::BuddhaError;

/// Describes the width and height of an integral plane that is
/// assumed to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of a
/// region of the complex plane, treating the real part of each value
/// as the x-component and the imaginary part as the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

impl ComplexPlane {
    /// Checks that the corners are finite and really are left-lower
    /// and right-upper, and that the region's extent is finite.
    pub fn new(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Result<Self, BuddhaError> {
        if !(leftlower.re.is_finite()
            && leftlower.im.is_finite()
            && rightupper.re.is_finite()
            && rightupper.im.is_finite())
        {
            return Err(BuddhaError::InvalidRegion(format!(
                "The region corners {} and {} are not finite.",
                leftlower, rightupper
            )));
        }
        if rightupper.re <= leftlower.re {
            return Err(BuddhaError::InvalidRegion(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            ));
        }
        if rightupper.im <= leftlower.im {
            return Err(BuddhaError::InvalidRegion(
                "The left lower corner is not lower than the right upper corner".to_string(),
            ));
        }
        let region = ComplexPlane(leftlower, rightupper);
        if !(region.width().is_finite() && region.height().is_finite()) {
            return Err(BuddhaError::InvalidRegion(
                "The region is too large to sample.".to_string(),
            ));
        }
        Ok(region)
    }

    /// The width of the region along the real axis.
    pub fn width(&self) -> f64 {
        self.1.re - self.0.re
    }

    /// The height of the region along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.1.im - self.0.im
    }
}

/// Describes the x, y of a pixel that is known to be inside the
/// image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Chooses which two of the four coordinates (Re z, Im z, Re c,
/// Im c) of an orbit step become the real and imaginary parts of the
/// value that gets plotted.  `ZrZi` is the classic Buddhabrot; the
/// others are slices through the four-dimensional object.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Plane {
    /// Re z, Im z
    ZrZi,
    /// Re z, Re c
    ZrCr,
    /// Re z, Im c
    ZrCi,
    /// Im z, Re c
    ZiCr,
    /// Im z, Im c
    ZiCi,
    /// Re c, Im c
    CrCi,
}

impl Plane {
    /// Projects an orbit step into display space.
    #[inline]
    pub fn project(self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        match self {
            Plane::ZrZi => z,
            Plane::ZrCr => Complex::new(z.re, c.re),
            Plane::ZrCi => Complex::new(z.re, c.im),
            Plane::ZiCr => Complex::new(z.im, c.re),
            Plane::ZiCi => Complex::new(z.im, c.im),
            Plane::CrCi => c,
        }
    }

    /// Parses the lowercase names used on the command line.
    pub fn from_name(name: &str) -> Option<Plane> {
        match name {
            "zrzi" => Some(Plane::ZrZi),
            "zrcr" => Some(Plane::ZrCr),
            "zrci" => Some(Plane::ZrCi),
            "zicr" => Some(Plane::ZiCr),
            "zici" => Some(Plane::ZiCi),
            "crci" => Some(Plane::CrCi),
            _ => None,
        }
    }
}

/// Maps display-space complex values onto the pixels of the image.
/// A zoom of 1 fits four units of the complex plane across each axis
/// of the image, and the offsets are added to a value before it is
/// scaled, so an offset of 0.4 moves the image centre to -0.4.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The size of the image.
    pub integral_plane: IntegralPlane,
    offset: Complex<f64>,
    // Pixels per unit along each axis, with the zoom folded in.  The
    // quarter width and height are integer divisions.
    grid_factors: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the image size, the zoom and the offset of
    /// the complex plane.
    pub fn new(
        width: usize,
        height: usize,
        zoom: f64,
        offset: Complex<f64>,
    ) -> Result<PlaneMapper, BuddhaError> {
        if width == 0 || height == 0 {
            return Err(BuddhaError::InvalidDimensions(width, height));
        }
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(BuddhaError::InvalidParameter("zoom", zoom.to_string()));
        }
        let grid_factors = (
            zoom * ((width / 4) as f64),
            zoom * ((height / 4) as f64),
        );
        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            offset,
            grid_factors,
        })
    }

    /// Given a complex number on the display plane, find the pixel it
    /// lands on, or None if it lands outside of the image.
    #[inline]
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let left = self.grid_factors.0 * (point.re + self.offset.re)
            + (self.integral_plane.0 as f64) / 2.0;
        let top = self.grid_factors.1 * (point.im + self.offset.im)
            + (self.integral_plane.1 as f64) / 2.0;
        // Written so that NaN, from an orbit that overflowed, fails.
        if left >= 0.0
            && top >= 0.0
            && left < self.integral_plane.0 as f64
            && top < self.integral_plane.1 as f64
        {
            Some(Pixel(left as usize, top as usize))
        } else {
            None
        }
    }

    /// Given a pixel, return the complex number at its corner.  The
    /// inverse of `point_to_pixel` for points that land exactly on a
    /// pixel corner.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            ((pixel.0 as f64) - (self.integral_plane.0 as f64) / 2.0) / self.grid_factors.0
                - self.offset.re,
            ((pixel.1 as f64) - (self.integral_plane.1 as f64) / 2.0) / self.grid_factors.1
                - self.offset.im,
        )
    }
}
