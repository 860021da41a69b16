//! Colours for orbits.  A `GradientTable` holds keypoints sorted by
//! position and blends between neighbours in HCL (the polar form of
//! CIE L*a*b*, D65 white), which keeps the perceived lightness moving
//! evenly between keypoints where an RGB blend would sag.

use std::f64::consts::PI;

use crate::errors::BuddhaError;

/// An sRGB colour with components in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

const WHITE_REF: [f64; 3] = [0.95047, 1.00000, 1.08883];

#[inline]
fn linearize(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn delinearize(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > 6.0 / 29.0 * 6.0 / 29.0 * 6.0 / 29.0 {
        t.cbrt()
    } else {
        t / 3.0 * 29.0 / 6.0 * 29.0 / 6.0 + 4.0 / 29.0
    }
}

#[inline]
fn lab_finv(t: f64) -> f64 {
    if t > 6.0 / 29.0 {
        t * t * t
    } else {
        3.0 * 6.0 / 29.0 * 6.0 / 29.0 * (t - 4.0 / 29.0)
    }
}

// Shortest way round the hue circle, in degrees.
fn interp_angle(a0: f64, a1: f64, t: f64) -> f64 {
    let delta = ((a1 - a0) % 360.0 + 540.0) % 360.0 - 180.0;
    (a0 + t * delta + 360.0) % 360.0
}

impl Color {
    /// Constructor.
    pub fn new(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// Black.
    pub fn black() -> Color {
        Color::new(0.0, 0.0, 0.0)
    }

    /// Parses `#rrggbb` or the short `#rgb` form.
    pub fn from_hex(literal: &str) -> Result<Color, BuddhaError> {
        let malformed = || BuddhaError::MalformedColor(literal.to_string());
        let digits = literal.strip_prefix('#').ok_or_else(malformed)?;
        if !digits.is_ascii() {
            return Err(malformed());
        }
        let channel = |s: &str, scale: f64| {
            u8::from_str_radix(s, 16)
                .map(|v| f64::from(v) / scale)
                .map_err(|_| malformed())
        };
        match digits.len() {
            6 => Ok(Color::new(
                channel(&digits[0..2], 255.0)?,
                channel(&digits[2..4], 255.0)?,
                channel(&digits[4..6], 255.0)?,
            )),
            3 => Ok(Color::new(
                channel(&digits[0..1], 15.0)?,
                channel(&digits[1..2], 15.0)?,
                channel(&digits[2..3], 15.0)?,
            )),
            _ => Err(malformed()),
        }
    }

    /// CIE L*a*b* with L in [0, 1].
    pub fn lab(&self) -> (f64, f64, f64) {
        let (r, g, b) = (linearize(self.r), linearize(self.g), linearize(self.b));
        let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
        let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
        let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;
        let fy = lab_f(y / WHITE_REF[1]);
        (
            1.16 * fy - 0.16,
            5.0 * (lab_f(x / WHITE_REF[0]) - fy),
            2.0 * (fy - lab_f(z / WHITE_REF[2])),
        )
    }

    /// Inverse of `lab`.  The result may be out of gamut.
    pub fn from_lab(l: f64, a: f64, b: f64) -> Color {
        let l2 = (l + 0.16) / 1.16;
        let x = WHITE_REF[0] * lab_finv(l2 + a / 5.0);
        let y = WHITE_REF[1] * lab_finv(l2);
        let z = WHITE_REF[2] * lab_finv(l2 - b / 2.0);
        Color::new(
            delinearize(3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z),
            delinearize(-0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z),
            delinearize(0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z),
        )
    }

    /// Hue in degrees, chroma, and lightness.
    pub fn hcl(&self) -> (f64, f64, f64) {
        let (l, a, b) = self.lab();
        let h = if (b - a).abs() > 1e-4 && a.abs() > 1e-4 {
            (b.atan2(a) * 180.0 / PI + 360.0) % 360.0
        } else {
            0.0
        };
        (h, (a * a + b * b).sqrt(), l)
    }

    /// Inverse of `hcl`.
    pub fn from_hcl(h: f64, c: f64, l: f64) -> Color {
        let h = h * PI / 180.0;
        Color::from_lab(l, c * h.cos(), c * h.sin())
    }

    /// Blends towards `other` in HCL space; `t` of 0 is `self`.
    pub fn blend_hcl(&self, other: &Color, t: f64) -> Color {
        let (mut h1, c1, l1) = self.hcl();
        let (mut h2, c2, l2) = other.hcl();
        // A grey has no hue; borrow the other end's so the blend
        // does not swing through unrelated colours.
        if c1 <= 0.00015 && c2 >= 0.00015 {
            h1 = h2;
        } else if c2 <= 0.00015 && c1 >= 0.00015 {
            h2 = h1;
        }
        Color::from_hcl(interp_angle(h1, h2, t), c1 + t * (c2 - c1), l1 + t * (l2 - l1))
    }

    /// Clamps every component into [0, 1].
    pub fn clamped(&self) -> Color {
        let clamp = |v: f64| num::clamp(v, 0.0, 1.0);
        Color::new(clamp(self.r), clamp(self.g), clamp(self.b))
    }

    /// The components as a triple.
    pub fn rgb(&self) -> (f64, f64, f64) {
        (self.r, self.g, self.b)
    }
}

/// One keypoint of a gradient.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Keypoint {
    /// Colour at this position.
    pub color: Color,
    /// Position in [0, 1].
    pub position: f64,
}

/// Keypoints sorted ascending by position, and the colour to use for
/// queries that fall before the first keypoint.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientTable {
    items: Vec<Keypoint>,
    base: Color,
}

impl GradientTable {
    /// Builds a table, refusing empty or unsorted keypoints and
    /// positions outside [0, 1].
    pub fn new(items: Vec<Keypoint>, base: Color) -> Result<GradientTable, BuddhaError> {
        if items.is_empty() {
            return Err(BuddhaError::EmptyGradient);
        }
        for (index, item) in items.iter().enumerate() {
            if !(0.0..=1.0).contains(&item.position) {
                return Err(BuddhaError::KeypointOutOfRange(item.position));
            }
            if index > 0 && item.position < items[index - 1].position {
                return Err(BuddhaError::UnsortedGradient {
                    index,
                    position: item.position,
                    previous: items[index - 1].position,
                });
            }
        }
        Ok(GradientTable { items, base })
    }

    /// Builds a table from `(hex literal, position)` pairs.
    pub fn from_hex(literals: &[(&str, f64)], base: Color) -> Result<GradientTable, BuddhaError> {
        let items = literals
            .iter()
            .map(|&(hex, position)| {
                Color::from_hex(hex).map(|color| Keypoint { color, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        GradientTable::new(items, base)
    }

    /// The gradient orbits are painted with by default: black, a
    /// short flash of deep red early in the orbit, then a long run
    /// into sky blue.
    pub fn orbit_default() -> Result<GradientTable, BuddhaError> {
        GradientTable::from_hex(
            &[("#000000", 0.0), ("#aa0000", 0.1), ("#000000", 0.15), ("#00afff", 1.0)],
            Color::black(),
        )
    }

    /// The keypoints.
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.items
    }

    /// The colour at position `t`.
    pub fn interpolate(&self, t: f64) -> Color {
        if let Some(last) = self.items.last() {
            if t >= last.position {
                return last.color;
            }
        }
        for pair in self.items.windows(2) {
            let (c1, c2) = (&pair[0], &pair[1]);
            if c1.position > t {
                return self.base;
            }
            if t <= c2.position {
                let span = c2.position - c1.position;
                if span <= 0.0 {
                    return c2.color;
                }
                let t = (t - c1.position) / span;
                return c1.color.blend_hcl(&c2.color, t).clamped();
            }
        }
        self.base
    }
}

/// Picks the single colour a whole path is painted with, from its
/// length and the iteration cap.
#[derive(Clone, Debug, PartialEq)]
pub enum PathColoring {
    /// The same colour whatever the orbit.
    Constant(Color),
    /// Samples a gradient at `n / iterations`.
    Keyed(GradientTable),
    /// Cycles through a palette by `n`, so neighbouring escape times
    /// get clearly different colours.
    Cyclic(Vec<Color>),
}

impl PathColoring {
    /// Black, yellow, blue, green, red, repeating.
    pub fn pedagogical() -> PathColoring {
        PathColoring::Cyclic(vec![
            Color::new(0.0, 0.0, 0.0),
            Color::new(1.0, 240.0 / 255.0, 0.0),
            Color::new(0.0, 0.0, 1.0),
            Color::new(0.0, 1.0, 0.0),
            Color::new(1.0, 0.0, 0.0),
        ])
    }

    /// The colour for an orbit of length `n`.
    pub fn get(&self, n: usize, iterations: usize) -> Color {
        match self {
            PathColoring::Constant(color) => *color,
            PathColoring::Keyed(table) => {
                table.interpolate(n as f64 / (iterations.max(1) as f64))
            }
            PathColoring::Cyclic(palette) if palette.is_empty() => Color::black(),
            PathColoring::Cyclic(palette) => palette[n % palette.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn parses_hex_literals() {
        assert_eq!(Color::from_hex("#ff0000").unwrap(), Color::new(1.0, 0.0, 0.0));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::new(1.0, 1.0, 1.0));
        let c = Color::from_hex("#00afff").unwrap();
        assert!(close(c.g, 175.0 / 255.0, 1e-12));
    }

    #[test]
    fn rejects_malformed_hex_literals() {
        for literal in &["ff0000", "#ff00", "#gg0000", "#ff00001", "", "#é00"] {
            assert_eq!(
                Color::from_hex(literal),
                Err(BuddhaError::MalformedColor(literal.to_string()))
            );
        }
    }

    #[test]
    fn lab_round_trips() {
        let c = Color::new(0.2, 0.6, 0.9);
        let (l, a, b) = c.lab();
        let back = Color::from_lab(l, a, b);
        assert!(close(back.r, c.r, 1e-4) && close(back.g, c.g, 1e-4) && close(back.b, c.b, 1e-4));
        assert!(close(Color::black().lab().0, 0.0, 1e-9));
        assert!(close(Color::new(1.0, 1.0, 1.0).lab().0, 1.0, 1e-4));
    }

    #[test]
    fn black_to_white_midpoint_has_middle_lightness() {
        let table = GradientTable::new(
            vec![
                Keypoint { color: Color::black(), position: 0.0 },
                Keypoint { color: Color::new(1.0, 1.0, 1.0), position: 1.0 },
            ],
            Color::black(),
        )
        .unwrap();
        let mid = table.interpolate(0.5);
        assert!(close(mid.hcl().2, 0.5, 1e-3), "lightness was {}", mid.hcl().2);

        let mut last = -1.0;
        for step in 0..=20 {
            let l = table.interpolate(f64::from(step) / 20.0).hcl().2;
            assert!(l >= last - 1e-9, "lightness fell at step {}", step);
            last = l;
        }
    }

    #[test]
    fn interpolate_edges() {
        let base = Color::new(0.5, 0.5, 0.5);
        let table = GradientTable::from_hex(&[("#ff0000", 0.2), ("#0000ff", 0.8)], base).unwrap();
        assert_eq!(table.interpolate(0.1), base);
        let start = table.interpolate(0.2);
        assert!(close(start.r, 1.0, 1e-4) && close(start.g, 0.0, 1e-4) && close(start.b, 0.0, 1e-4));
        assert_eq!(table.interpolate(0.8), Color::new(0.0, 0.0, 1.0));
        assert_eq!(table.interpolate(1.0), Color::new(0.0, 0.0, 1.0));
        let single = GradientTable::from_hex(&[("#00ff00", 0.5)], base).unwrap();
        assert_eq!(single.interpolate(0.4), base);
        assert_eq!(single.interpolate(0.5), Color::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn refuses_bad_tables() {
        assert_eq!(
            GradientTable::new(vec![], Color::black()),
            Err(BuddhaError::EmptyGradient)
        );
        match GradientTable::from_hex(&[("#000000", 0.5), ("#ffffff", 0.1)], Color::black()) {
            Err(BuddhaError::UnsortedGradient { index: 1, .. }) => {}
            other => panic!("expected an unsorted error, got {:?}", other),
        }
        assert_eq!(
            GradientTable::from_hex(&[("#000000", 1.5)], Color::black()),
            Err(BuddhaError::KeypointOutOfRange(1.5))
        );
        assert!(GradientTable::from_hex(&[("#00000", 0.0)], Color::black()).is_err());
    }

    #[test]
    fn default_orbit_gradient_parses() {
        let table = GradientTable::orbit_default().unwrap();
        assert_eq!(table.keypoints().len(), 4);
        assert_eq!(table.interpolate(1.0), Color::from_hex("#00afff").unwrap());
    }

    #[test]
    fn path_coloring() {
        let red = Color::new(1.0, 0.0, 0.0);
        assert_eq!(PathColoring::Constant(red).get(17, 100), red);
        let palette = PathColoring::pedagogical();
        assert_eq!(palette.get(4, 100), red);
        assert_eq!(palette.get(5, 100), Color::black());
        let keyed = PathColoring::Keyed(GradientTable::orbit_default().unwrap());
        assert_eq!(keyed.get(100, 100), Color::from_hex("#00afff").unwrap());
    }
}
