//! Closed-form membership tests for the largest regions of the
//! Mandelbrot set.  A point inside any of them never escapes, so the
//! point-oriented modes skip it without iterating at all.

use num::Complex;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// True if the point is inside the main cardioid.
#[inline]
pub fn in_cardioid(c: Complex<f64>) -> bool {
    let y = c.im * c.im;
    let q = (c.re - D4) * (c.re - D4) + y;
    q * (q + (c.re - D4)) < D4 * y
}

/// True if the point is inside the period-2 bulb, the disk of radius
/// 1/4 centred on -1.
#[inline]
pub fn in_period2_bulb(c: Complex<f64>) -> bool {
    (c.re + 1.0) * (c.re + 1.0) + c.im * c.im < D16
}

// The three next-largest bulbs, as (centre, radius squared).  These
// are approximations tucked slightly inside the true boundary.
const SATELLITES: [(f64, f64, f64); 3] = [
    // Left of the period-2 bulb.
    (-1.309, 0.0, 0.00345),
    // Top and bottom of the main cardioid.
    (-0.125, 0.744, 0.0088),
    (-0.125, -0.744, 0.0088),
];

/// True if the point is inside one of the smaller satellite bulbs.
#[inline]
pub fn in_satellite_bulb(c: Complex<f64>) -> bool {
    SATELLITES.iter().any(|&(re, im, r2)| {
        let (dre, dim) = (c.re - re, c.im - im);
        dre * dre + dim * dim < r2
    })
}

/// True if the point is known never to escape.  A false answer says
/// nothing; most of the interior of the set is not covered.
#[inline]
pub fn is_in_bulb(c: Complex<f64>) -> bool {
    in_cardioid(c) || in_period2_bulb(c) || in_satellite_bulb(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardioid_interior_is_in_bulb() {
        for &(re, im) in &[(0.0, 0.0), (-0.5, 0.0), (0.2, 0.0), (-0.1, 0.6), (0.0, -0.5)] {
            let c = Complex::new(re, im);
            assert!(in_cardioid(c), "{} should be in the cardioid", c);
            assert!(is_in_bulb(c));
        }
    }

    #[test]
    fn cardioid_cusp_and_outside_are_not() {
        assert!(!in_cardioid(Complex::new(0.25, 0.0)));
        assert!(!in_cardioid(Complex::new(0.3, 0.0)));
        assert!(!is_in_bulb(Complex::new(0.5, 0.5)));
        assert!(!is_in_bulb(Complex::new(-2.0, 0.0)));
        assert!(!is_in_bulb(Complex::new(1.0, 1.0)));
    }

    #[test]
    fn period2_bulb() {
        assert!(in_period2_bulb(Complex::new(-1.0, 0.0)));
        assert!(in_period2_bulb(Complex::new(-1.2, 0.1)));
        assert!(!in_period2_bulb(Complex::new(-1.3, 0.0)));
        assert!(!in_cardioid(Complex::new(-1.0, 0.0)));
    }

    #[test]
    fn satellites() {
        assert!(in_satellite_bulb(Complex::new(-1.309, 0.0)));
        assert!(in_satellite_bulb(Complex::new(-0.125, 0.744)));
        assert!(in_satellite_bulb(Complex::new(-0.125, -0.744)));
        assert!(!in_satellite_bulb(Complex::new(-0.125, 0.0)));
    }
}
