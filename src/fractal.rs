//! The parameters of a render.  Built once, validated once, and then
//! shared read-only by every worker; the only mutable state of a
//! render lives in the workers' histograms and orbit buffers.

use num::Complex;

use crate::errors::BuddhaError;
use crate::gradient::{GradientTable, PathColoring};
use crate::planes::{Plane, PlaneMapper};

/// The map iterated from `z₀`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Kernel {
    /// `z ← k·z² + k·c`, which with `k = 1` is the Mandelbrot map.
    Quadratic,
    /// `z ← z^z + c`.  An experiment; it ignores the coefficient.
    Power,
}

impl Kernel {
    /// One step of the map.
    #[inline]
    pub fn step(self, z: Complex<f64>, c: Complex<f64>, coefficient: Complex<f64>) -> Complex<f64> {
        match self {
            Kernel::Quadratic => coefficient * (z * z) + coefficient * c,
            Kernel::Power => z.powc(z) + c,
        }
    }
}

/// Everything a worker needs to know to trace and register orbits.
#[derive(Clone, Debug)]
pub struct FractalConfig {
    /// Maps display-space values onto image pixels.
    pub mapper: PlaneMapper,
    /// The iteration cap.
    pub iterations: usize,
    /// Squared magnitude at which an orbit has escaped.
    pub bailout: f64,
    /// Orbits shorter than this are noise.
    pub threshold: usize,
    /// Multiplies both terms of the quadratic map.
    pub coefficient: Complex<f64>,
    /// The map to iterate.
    pub kernel: Kernel,
    /// Which coordinates of each step are plotted.
    pub plane: Plane,
    /// Growth ratio past which the field-lines mode calls an orbit
    /// divergent.
    pub field_ratio: f64,
    /// The point orbit-trap mode measures distances to.
    pub trap: Complex<f64>,
    /// Longest line the path modes will draw between two steps.
    pub max_points: usize,
    /// Colours samples along an orbit by their position in it.
    pub orbit_gradient: GradientTable,
    /// Colours whole paths by their length.
    pub path_coloring: PathColoring,
    /// Whether registration also feeds the importance channel.
    pub importance: bool,
}

impl FractalConfig {
    /// A configuration with the usual defaults: bailout 4, no
    /// threshold, unit coefficient, the classic plane, and the image
    /// centred on -0.4.  Parses the default gradient, so a bad literal
    /// surfaces here rather than in a worker.
    pub fn new(width: usize, height: usize, iterations: usize) -> Result<FractalConfig, BuddhaError> {
        if iterations == 0 {
            return Err(BuddhaError::InvalidParameter("iterations", "0".to_string()));
        }
        let orbit_gradient = GradientTable::orbit_default()?;
        Ok(FractalConfig {
            mapper: PlaneMapper::new(width, height, 1.0, Complex::new(0.4, 0.0))?,
            iterations,
            bailout: 4.0,
            threshold: 0,
            coefficient: Complex::new(1.0, 0.0),
            kernel: Kernel::Quadratic,
            plane: Plane::ZrZi,
            field_ratio: 10_000.0,
            trap: Complex::new(0.0, 0.0),
            max_points: width.max(height) * 2,
            path_coloring: PathColoring::Keyed(orbit_gradient.clone()),
            orbit_gradient,
            importance: false,
        })
    }

    /// Replaces the zoom and offset of the view.
    pub fn with_view(mut self, zoom: f64, offset: Complex<f64>) -> Result<FractalConfig, BuddhaError> {
        let size = self.mapper.integral_plane;
        self.mapper = PlaneMapper::new(size.0, size.1, zoom, offset)?;
        Ok(self)
    }

    /// Checks the parameters that can be set directly.
    pub fn validate(&self) -> Result<(), BuddhaError> {
        if self.iterations == 0 {
            return Err(BuddhaError::InvalidParameter("iterations", "0".to_string()));
        }
        if !(self.bailout.is_finite() && self.bailout > 0.0) {
            return Err(BuddhaError::InvalidParameter("bailout", self.bailout.to_string()));
        }
        if self.max_points == 0 {
            return Err(BuddhaError::InvalidParameter("max_points", "0".to_string()));
        }
        Ok(())
    }

    /// Image width.
    pub fn width(&self) -> usize {
        self.mapper.integral_plane.0
    }

    /// Image height.
    pub fn height(&self) -> usize {
        self.mapper.integral_plane.1
    }

    /// How many steps an orbit buffer must hold.
    pub fn orbit_capacity(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = FractalConfig::new(64, 48, 1000).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.width(), 64);
        assert_eq!(config.height(), 48);
        assert_eq!(config.bailout, 4.0);
    }

    #[test]
    fn refuses_nonsense() {
        assert!(FractalConfig::new(0, 48, 1000).is_err());
        assert!(FractalConfig::new(64, 48, 0).is_err());
        let mut config = FractalConfig::new(64, 48, 1000).unwrap();
        config.bailout = -1.0;
        assert!(config.validate().is_err());
        assert!(FractalConfig::new(64, 48, 10).unwrap().with_view(-2.0, Complex::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn quadratic_kernel_with_coefficient() {
        let z = Complex::new(1.0, 1.0);
        let c = Complex::new(0.5, 0.0);
        let one = Complex::new(1.0, 0.0);
        assert_eq!(Kernel::Quadratic.step(z, c, one), Complex::new(0.5, 2.0));
        let two = Complex::new(2.0, 0.0);
        assert_eq!(Kernel::Quadratic.step(z, c, two), Complex::new(1.0, 4.0));
    }
}
