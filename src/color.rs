use std::ops::{ Add, Sub, Mul };

use crate::feq;

/// An RGB colour.
///
/// Components are nominally in `[0.0, 1.0]` but are left unclamped while
/// shading; light from several sources can sum past `1.0`. Clamping happens
/// only when a colour is quantised for output.
///
/// ```
/// # use whitted::color::Color;
/// let blend = Color::average(&Color::rgb(0.0, 1.0, 1.0), &Color::rgb(1.0, 0.0, 1.0));
/// assert_eq!(blend, Color::rgb(0.5, 0.5, 1.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

/// Builds a colour from the first three elements of a slice; missing
/// elements default to `0.0`.
impl From<&[f64]> for Color {
    fn from(v: &[f64]) -> Color {
        let at = |i: usize| v.get(i).copied().unwrap_or(0.0);

        Color { r: at(0), g: at(1), b: at(2) }
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    /// Component-wise product, used to tint light by a surface colour.
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        Color {
            r: c1.r * c2.r,
            g: c1.g * c2.g,
            b: c1.b * c2.b,
        }
    }

    pub fn average(c1: &Color, c2: &Color) -> Color {
        (*c1 + *c2) * 0.5
    }

    /// Clamps every component into `[0.0, 1.0]`.
    pub fn clamp(&self) -> Color {
        Color {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// Quantises to 8-bit channels, rounding to the nearest step.
    ///
    /// ```
    /// # use whitted::color::Color;
    /// assert_eq!(Color::rgb(1.5, 0.5, -0.5).to_bytes(), [255, 128, 0]);
    /// ```
    pub fn to_bytes(&self) -> [u8; 3] {
        let c = self.clamp();
        let q = |v: f64| (v * 255.0).round() as u8;

        [q(c.r), q(c.g), q(c.b)]
    }

    /// Inverse of `to_bytes` for a channel maximum of `max`.
    pub fn from_bytes(r: u16, g: u16, b: u16, max: u16) -> Color {
        let scale = f64::from(max.max(1));

        Color {
            r: f64::from(r) / scale,
            g: f64::from(g) / scale,
            b: f64::from(b) / scale,
        }
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Color {
        Color {
            r: self.r - other.r,
            g: self.g - other.g,
            b: self.b - other.b,
        }
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Color {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        other * self
    }
}

/// Shorthand for `Color::hadamard`.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        Color::hadamard(&self, &other)
    }
}

#[test]
fn add_and_subtract_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
    assert_eq!(c1 - c2, Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
    assert_eq!(Color::rgb(0.2, 0.3, 0.4) * 2.0, Color::rgb(0.4, 0.6, 0.8));
}

#[test]
fn short_slices_fill_with_zero() {
    let v = [0.25, 0.5];

    assert_eq!(Color::from(&v[..]), Color::rgb(0.25, 0.5, 0.0));
}

#[test]
fn bytes_round_trip_within_one_step() {
    let c = Color::rgb(0.1, 0.47, 0.999);
    let [r, g, b] = c.to_bytes();
    let back = Color::from_bytes(r.into(), g.into(), b.into(), 255);

    assert!((back.r - c.r).abs() <= 1.0 / 255.0);
    assert!((back.g - c.g).abs() <= 1.0 / 255.0);
    assert!((back.b - c.b).abs() <= 1.0 / 255.0);
}
