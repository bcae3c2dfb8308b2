use std::fmt;
use std::ops::{ Add, Sub, Neg, Mul, Div };

use crate::feq;

/// A point or a vector in homogeneous coordinates.
///
/// A `w` of `1.0` marks a point and a `w` of `0.0` marks a vector. Mixing the
/// two in ways that have no geometric meaning (adding two points, subtracting
/// a point from a vector, measuring a point) is a programming error and
/// panics.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Tuple4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64
}

impl PartialEq for Tuple4D {
    fn eq(&self, other: &Tuple4D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z) &&
            feq(self.w, other.w)
    }
}

impl Tuple4D {
    pub fn tuple(x: f64, y: f64, z: f64, w: f64) -> Tuple4D {
        Tuple4D { x, y, z, w }
    }

    pub fn point(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 1.0 }
    }

    pub fn vector(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 0.0 }
    }

    pub fn origin() -> Tuple4D {
        Tuple4D::point(0.0, 0.0, 0.0)
    }

    pub fn is_point(&self) -> bool {
        self.w == 1.0
    }

    pub fn is_vector(&self) -> bool {
        self.w == 0.0
    }

    /// Reads a component by axis index (0 = x, 1 = y, 2 = z).
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Length of a vector.
    ///
    /// Panics when called on a point.
    pub fn magnitude(&self) -> f64 {
        assert!(!self.is_point(), "magnitude is undefined for a point");

        f64::sqrt(
            self.x.powi(2)
            + self.y.powi(2)
            + self.z.powi(2)
            + self.w.powi(2)
        )
    }

    /// Unit vector in the same direction.
    ///
    /// Panics on points and on the zero vector.
    pub fn normalize(&self) -> Tuple4D {
        let mag = self.magnitude();
        assert!(mag > 0.0, "cannot normalize a zero-length vector");

        *self / mag
    }

    pub fn dot(&self, other: &Tuple4D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
            + self.w * other.w
    }

    /// Cross product of two vectors; the `w` components are ignored.
    pub fn cross(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
            w: 0.0
        }
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Tuple4D) -> Tuple4D {
        *self - (*normal * 2.0 * self.dot(normal))
    }

    /// Component-wise minimum, used when growing bounding boxes.
    pub fn min(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
            w: self.w,
        }
    }

    /// Component-wise maximum, used when growing bounding boxes.
    pub fn max(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
            w: self.w,
        }
    }
}

impl fmt::Display for Tuple4D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_point() {
            "point"
        } else if self.is_vector() {
            "vector"
        } else {
            "tuple"
        };

        write!(f, "{}({}, {}, {})", kind, self.x, self.y, self.z)
    }
}

impl Add for Tuple4D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        assert!(!(self.is_point() && other.is_point()),
            "cannot add a point to a point");

        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w
        }
    }
}

impl Sub for Tuple4D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        assert!(!(self.is_vector() && other.is_point()),
            "cannot subtract a point from a vector");

        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w
        }
    }
}

impl Neg for Tuple4D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: -self.w
        }
    }
}

/// Scalar right-multiplication, `t * s`.
impl Mul<f64> for Tuple4D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
            w: self.w * other
        }
    }
}

/// Scalar left-multiplication, `s * t`.
///
/// ```
/// use whitted::tuple::Tuple4D;
///
/// let t = Tuple4D::vector(1.0, 2.0, 3.0);
/// assert_eq!(2.0 * t, Tuple4D::vector(2.0, 4.0, 6.0));
/// ```
impl Mul<Tuple4D> for f64 {
    type Output = Tuple4D;

    fn mul(self, other: Tuple4D) -> Tuple4D {
        other * self
    }
}

impl Div<f64> for Tuple4D {
    type Output = Self;

    fn div(self, other: f64) -> Self {
        self * (1.0 / other)
    }
}

/* Tests */

#[test]
fn add_point_and_vector() {
    let p = Tuple4D::point(3.0, -2.0, 5.0);
    let v = Tuple4D::vector(-2.0, 3.0, 1.0);

    let sum = p + v;
    assert!(sum.is_point());
    assert_eq!(sum, Tuple4D::point(1.0, 1.0, 6.0));
}

#[test]
fn add_vectors() {
    let a = Tuple4D::vector(1.0, 2.0, 3.0);
    let b = Tuple4D::vector(-1.0, 0.5, 2.0);

    let sum = a + b;
    assert!(sum.is_vector());
    assert_eq!(sum, Tuple4D::vector(0.0, 2.5, 5.0));
}

#[test]
#[should_panic(expected = "cannot add a point to a point")]
fn add_points_is_a_type_error() {
    let _ = Tuple4D::point(1.0, 0.0, 0.0) + Tuple4D::point(0.0, 1.0, 0.0);
}

#[test]
fn sub_points() {
    let p1 = Tuple4D::point(3.0, 2.0, 1.0);
    let p2 = Tuple4D::point(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Tuple4D::vector(-2.0, -4.0, -6.0));
}

#[test]
fn sub_vector_from_point() {
    let p = Tuple4D::point(3.0, 2.0, 1.0);
    let v = Tuple4D::vector(5.0, 6.0, 7.0);

    assert_eq!(p - v, Tuple4D::point(-2.0, -4.0, -6.0));
}

#[test]
#[should_panic(expected = "cannot subtract a point from a vector")]
fn sub_point_from_vector_is_a_type_error() {
    let _ = Tuple4D::vector(1.0, 1.0, 1.0) - Tuple4D::point(0.0, 1.0, 0.0);
}

#[test]
fn sub_vectors() {
    let v1 = Tuple4D::vector(3.0, 2.0, 1.0);
    let v2 = Tuple4D::vector(5.0, 6.0, 7.0);

    assert_eq!(v1 - v2, Tuple4D::vector(-2.0, -4.0, -6.0));
}

#[test]
fn neg_tuple() {
    let a = Tuple4D::tuple(1.0, -2.0, 3.0, -4.0);

    assert_eq!(-a, Tuple4D::tuple(-1.0, 2.0, -3.0, 4.0));
}

#[test]
fn mul_and_div_scalar() {
    let a = Tuple4D::tuple(1.0, -2.0, 3.0, -4.0);

    assert_eq!(a * 3.5, Tuple4D::tuple(3.5, -7.0, 10.5, -14.0));
    assert_eq!(a / 2.0, Tuple4D::tuple(0.5, -1.0, 1.5, -2.0));
}

#[test]
fn magnitude_of_vectors() {
    assert_eq!(Tuple4D::vector(1.0, 2.0, 3.0).magnitude(), f64::sqrt(14.0));
    assert_eq!(Tuple4D::vector(-1.0, -2.0, -3.0).magnitude(), f64::sqrt(14.0));
}

#[test]
#[should_panic(expected = "magnitude is undefined for a point")]
fn magnitude_of_point_is_a_type_error() {
    Tuple4D::point(1.0, 2.0, 3.0).magnitude();
}

#[test]
fn normalize_vectors() {
    assert_eq!(Tuple4D::vector(4.0, 0.0, 0.0).normalize(),
        Tuple4D::vector(1.0, 0.0, 0.0));

    let v = Tuple4D::vector(1.0, 2.0, 3.0);
    let root = f64::sqrt(14.0);
    assert_eq!(v.normalize(),
        Tuple4D::vector(1.0 / root, 2.0 / root, 3.0 / root));
}

#[test]
fn normalized_vectors_have_unit_magnitude() {
    let samples = [
        Tuple4D::vector(1.0, 2.0, 3.0),
        Tuple4D::vector(-0.001, 0.0, 0.002),
        Tuple4D::vector(1e6, -3e5, 42.0),
        Tuple4D::vector(0.0, 0.0, -7.5),
    ];

    for v in samples.iter() {
        assert!(crate::feq(v.normalize().magnitude(), 1.0));
    }
}

#[test]
#[should_panic(expected = "zero-length")]
fn normalize_zero_vector_panics() {
    Tuple4D::vector(0.0, 0.0, 0.0).normalize();
}

#[test]
fn dot_and_cross() {
    let a = Tuple4D::vector(1.0, 2.0, 3.0);
    let b = Tuple4D::vector(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
    assert_eq!(a.cross(&b), Tuple4D::vector(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Tuple4D::vector(1.0, -2.0, 1.0));
}

#[test]
fn reflect_45() {
    let v = Tuple4D::vector(1.0, -1.0, 0.0);
    let n = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 1.0, 0.0));
}

#[test]
fn reflect_off_slanted_surface() {
    let v = Tuple4D::vector(0.0, -1.0, 0.0);
    let half = 2.0f64.sqrt() / 2.0;
    let n = Tuple4D::vector(half, half, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 0.0, 0.0));
}
