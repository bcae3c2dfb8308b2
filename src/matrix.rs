use std::fmt;
use std::ops::{ Index, IndexMut, Mul };
use std::convert::From;

use crate::feq;
use crate::tuple::Tuple4D;

/// A 4x4 row-major matrix.
///
/// These matrices encode every transformation in the ray tracer: shape and
/// pattern transforms, the camera's view transform, and the cached inverses
/// used to move rays and points between spaces.
///
/// # Examples
///
/// Chaining transformations (applied right to left):
///
/// ```
/// # use whitted::tuple::Tuple4D;
/// # use whitted::matrix::Matrix4D;
/// let t = Matrix4D::translation(10.0, 5.0, 7.0)
///     * Matrix4D::scaling(5.0, 5.0, 5.0)
///     * Matrix4D::rotation_x(std::f64::consts::PI / 2.0);
/// assert_eq!(t * Tuple4D::point(1.0, 0.0, 1.0),
///     Tuple4D::point(15.0, 0.0, 7.0));
/// ```
#[derive(Copy, Clone, Debug, PartialOrd)]
pub struct Matrix4D {
    data: [f64; 16],
}

/// Matrices are compared element-wise with approximate equality.
impl PartialEq for Matrix4D {
    fn eq(&self, other: &Matrix4D) -> bool {
        self.data.iter().zip(other.data.iter()).all(|(x, y)| feq(*x, *y))
    }
}

impl Default for Matrix4D {
    fn default() -> Matrix4D {
        Matrix4D::identity()
    }
}

impl Matrix4D {
    /// Creates a matrix with every element set to `0.0`.
    pub fn zero() -> Matrix4D {
        Matrix4D { data: [0.0; 16] }
    }

    pub fn identity() -> Matrix4D {
        let mut m = Self::zero();
        for i in 0..4 {
            m[(i, i)] = 1.0;
        }

        m
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut m = Self::identity();
        m[(0, 3)] = x;
        m[(1, 3)] = y;
        m[(2, 3)] = z;

        m
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut m = Self::identity();
        m[(0, 0)] = x;
        m[(1, 1)] = y;
        m[(2, 2)] = z;

        m
    }

    /// Rotation about the X axis by `r` radians.
    ///
    /// ```
    /// # use whitted::tuple::Tuple4D;
    /// # use whitted::matrix::Matrix4D;
    /// let m = Matrix4D::rotation_x(std::f64::consts::PI / 2.0);
    /// assert_eq!(m * Tuple4D::point(0.0, 1.0, 0.0),
    ///     Tuple4D::point(0.0, 0.0, 1.0));
    /// ```
    pub fn rotation_x(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        let mut m = Self::identity();
        m[(1, 1)] =  cos;
        m[(1, 2)] = -sin;
        m[(2, 1)] =  sin;
        m[(2, 2)] =  cos;

        m
    }

    /// Rotation about the Y axis by `r` radians.
    pub fn rotation_y(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        let mut m = Self::identity();
        m[(0, 0)] =  cos;
        m[(0, 2)] =  sin;
        m[(2, 0)] = -sin;
        m[(2, 2)] =  cos;

        m
    }

    /// Rotation about the Z axis by `r` radians.
    pub fn rotation_z(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        let mut m = Self::identity();
        m[(0, 0)] =  cos;
        m[(0, 1)] = -sin;
        m[(1, 0)] =  sin;
        m[(1, 1)] =  cos;

        m
    }

    /// Shearing: each parameter moves one axis in proportion to another, e.g.
    /// `xy` moves x in proportion to y.
    pub fn shearing(xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64)
        -> Matrix4D {
        let mut m = Self::identity();
        m[(0, 1)] = xy;
        m[(0, 2)] = xz;
        m[(1, 0)] = yx;
        m[(1, 2)] = yz;
        m[(2, 0)] = zx;
        m[(2, 1)] = zy;

        m
    }

    /// Orients the world relative to an eye at `from` looking at `to`.
    ///
    /// Note that the view transformation moves the *world*, not the eye.
    pub fn view_transform(from: Tuple4D, to: Tuple4D, up: Tuple4D) -> Matrix4D {
        let forward = (to - from).normalize();
        let left = forward.cross(&up.normalize());
        let true_up = left.cross(&forward);

        let orientation: Matrix4D = [
             left.x,     left.y,     left.z,    0.0,
             true_up.x,  true_up.y,  true_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
             0.0,        0.0,        0.0,       1.0,
        ].into();

        orientation * Matrix4D::translation(-from.x, -from.y, -from.z)
    }

    /// Returns the transpose of this matrix.
    pub fn transposition(&self) -> Matrix4D {
        let mut m = Self::zero();
        for r in 0..4 {
            for c in 0..4 {
                m[(c, r)] = self[(r, c)];
            }
        }

        m
    }

    /// Pairwise 2x2 determinants of the top and bottom row pairs. Both the
    /// determinant and the inverse are assembled from these twelve values.
    fn sub_factors(&self) -> ([f64; 6], [f64; 6]) {
        let m = &self.data;
        let top = [
            m[0] * m[5] - m[1] * m[4],
            m[0] * m[6] - m[2] * m[4],
            m[0] * m[7] - m[3] * m[4],
            m[1] * m[6] - m[2] * m[5],
            m[1] * m[7] - m[3] * m[5],
            m[2] * m[7] - m[3] * m[6],
        ];
        let bottom = [
            m[8]  * m[13] - m[9]  * m[12],
            m[8]  * m[14] - m[10] * m[12],
            m[8]  * m[15] - m[11] * m[12],
            m[9]  * m[14] - m[10] * m[13],
            m[9]  * m[15] - m[11] * m[13],
            m[10] * m[15] - m[11] * m[14],
        ];

        (top, bottom)
    }

    pub fn determinant(&self) -> f64 {
        let (s, c) = self.sub_factors();

        s[0] * c[5] - s[1] * c[4] + s[2] * c[3]
            + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// Calculates the inverse, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Matrix4D> {
        let (s, c) = self.sub_factors();
        let det = s[0] * c[5] - s[1] * c[4] + s[2] * c[3]
            + s[3] * c[2] - s[4] * c[1] + s[5] * c[0];

        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let m = &self.data;
        let inv = 1.0 / det;
        let data = [
            ( m[5]  * c[5] - m[6]  * c[4] + m[7]  * c[3]) * inv,
            (-m[1]  * c[5] + m[2]  * c[4] - m[3]  * c[3]) * inv,
            ( m[13] * s[5] - m[14] * s[4] + m[15] * s[3]) * inv,
            (-m[9]  * s[5] + m[10] * s[4] - m[11] * s[3]) * inv,

            (-m[4]  * c[5] + m[6]  * c[2] - m[7]  * c[1]) * inv,
            ( m[0]  * c[5] - m[2]  * c[2] + m[3]  * c[1]) * inv,
            (-m[12] * s[5] + m[14] * s[2] - m[15] * s[1]) * inv,
            ( m[8]  * s[5] - m[10] * s[2] + m[11] * s[1]) * inv,

            ( m[4]  * c[4] - m[5]  * c[2] + m[7]  * c[0]) * inv,
            (-m[0]  * c[4] + m[1]  * c[2] - m[3]  * c[0]) * inv,
            ( m[12] * s[4] - m[13] * s[2] + m[15] * s[0]) * inv,
            (-m[8]  * s[4] + m[9]  * s[2] - m[11] * s[0]) * inv,

            (-m[4]  * c[3] + m[5]  * c[1] - m[6]  * c[0]) * inv,
            ( m[0]  * c[3] - m[1]  * c[1] + m[2]  * c[0]) * inv,
            (-m[12] * s[3] + m[13] * s[1] - m[14] * s[0]) * inv,
            ( m[8]  * s[3] - m[9]  * s[1] + m[10] * s[0]) * inv,
        ];

        Some(Matrix4D { data })
    }
}

impl From<[f64; 16]> for Matrix4D {
    fn from(data: [f64; 16]) -> Matrix4D {
        Matrix4D { data }
    }
}

impl Index<(usize, usize)> for Matrix4D {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[(index.0 * 4) + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix4D {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[(index.0 * 4) + index.1]
    }
}

/// Matrix product. Not commutative in general.
impl Mul<Matrix4D> for Matrix4D {
    type Output = Matrix4D;

    fn mul(self, other: Matrix4D) -> Matrix4D {
        let mut res = Matrix4D::zero();

        for r in 0..4 {
            for c in 0..4 {
                res[(r, c)] = self[(r, 0)] * other[(0, c)]
                    + self[(r, 1)] * other[(1, c)]
                    + self[(r, 2)] * other[(2, c)]
                    + self[(r, 3)] * other[(3, c)]
            }
        }

        res
    }
}

/// Transforms a tuple, treated as a column vector on the right.
impl Mul<Tuple4D> for Matrix4D {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        let row = |r: usize| self[(r, 0)] * t.x
            + self[(r, 1)] * t.y
            + self[(r, 2)] * t.z
            + self[(r, 3)] * t.w;

        Tuple4D { x: row(0), y: row(1), z: row(2), w: row(3) }
    }
}

impl fmt::Display for Matrix4D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            write!(f, "|")?;
            for c in 0..4 {
                write!(f, " {} |", self[(r, c)])?;
            }

            if r != 3 {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

#[test]
fn multiply_by_identity() {
    let a: Matrix4D = [ 0.0, 1.0,  2.0,  4.0,
                        1.0, 2.0,  4.0,  8.0,
                        2.0, 4.0,  8.0, 16.0,
                        4.0, 8.0, 16.0, 32.0, ].into();

    assert_eq!(a * Matrix4D::identity(), a);
}

#[test]
fn multiply_matrices() {
    let a: Matrix4D = [ 1.0, 2.0, 3.0, 4.0,
                        5.0, 6.0, 7.0, 8.0,
                        9.0, 8.0, 7.0, 6.0,
                        5.0, 4.0, 3.0, 2.0, ].into();
    let b: Matrix4D = [-2.0, 1.0, 2.0,  3.0,
                        3.0, 2.0, 1.0, -1.0,
                        4.0, 3.0, 6.0,  5.0,
                        1.0, 2.0, 7.0,  8.0, ].into();
    let e: Matrix4D = [20.0, 22.0,  50.0,  48.0,
                       44.0, 54.0, 114.0, 108.0,
                       40.0, 58.0, 110.0, 102.0,
                       16.0, 26.0,  46.0,  42.0, ].into();

    assert_eq!(a * b, e);
}

#[test]
fn transpose() {
    let a: Matrix4D = [ 0.0, 9.0, 3.0, 0.0,
                        9.0, 8.0, 0.0, 8.0,
                        1.0, 8.0, 5.0, 3.0,
                        0.0, 0.0, 5.0, 8.0, ].into();
    let t: Matrix4D = [ 0.0, 9.0, 1.0, 0.0,
                        9.0, 8.0, 8.0, 0.0,
                        3.0, 0.0, 5.0, 5.0,
                        0.0, 8.0, 3.0, 8.0, ].into();

    assert_eq!(a.transposition(), t);
    assert_eq!(Matrix4D::identity().transposition(), Matrix4D::identity());
}

#[test]
fn determinant() {
    let a: Matrix4D = [-2.0, -8.0,  3.0,  5.0,
                       -3.0,  1.0,  7.0,  3.0,
                        1.0,  2.0, -9.0,  6.0,
                       -6.0,  7.0,  7.0, -9.0, ].into();

    assert_eq!(a.determinant(), -4071.0);
}

#[test]
fn singular_matrix_has_no_inverse() {
    let a: Matrix4D = [-4.0,  2.0, -2.0, -3.0,
                        9.0,  6.0,  2.0,  6.0,
                        0.0, -5.0,  1.0, -5.0,
                        0.0,  0.0,  0.0,  0.0, ].into();

    assert_eq!(a.determinant(), 0.0);
    assert!(a.inverse().is_none());
}

#[test]
fn inverse() {
    let a: Matrix4D = [-5.0,  2.0,  6.0, -8.0,
                        1.0, -5.0,  1.0,  8.0,
                        7.0,  7.0, -6.0, -7.0,
                        1.0, -3.0,  7.0,  4.0, ].into();
    let e: Matrix4D = [ 0.21805,  0.45113,  0.24060, -0.04511,
                       -0.80827, -1.45677, -0.44361,  0.52068,
                       -0.07895, -0.22368, -0.05263,  0.19737,
                       -0.52256, -0.81391, -0.30075,  0.30639, ].into();

    assert_eq!(a.determinant(), 532.0);
    assert_eq!(a.inverse().unwrap(), e);
}

#[test]
fn inverse_undoes_multiplication() {
    let a: Matrix4D = [ 3.0, -9.0,  7.0,  3.0,
                        3.0, -8.0,  2.0, -9.0,
                       -4.0,  4.0,  4.0,  1.0,
                       -6.0,  5.0, -1.0,  1.0, ].into();
    let b: Matrix4D = [ 8.0,  2.0,  2.0,  2.0,
                        3.0, -1.0,  7.0,  0.0,
                        7.0,  0.0,  5.0,  4.0,
                        6.0, -2.0,  0.0,  5.0, ].into();

    let c = a * b;
    assert_eq!(c * b.inverse().unwrap(), a);
}

#[test]
fn translation_and_inverse() {
    let transform = Matrix4D::translation(5.0, -3.0, 2.0);
    let p = Tuple4D::point(-3.0, 4.0, 5.0);
    let v = Tuple4D::vector(-3.0, 4.0, 5.0);

    assert_eq!(transform * p, Tuple4D::point(2.0, 1.0, 7.0));
    assert_eq!(transform.inverse().unwrap() * p, Tuple4D::point(-8.0, 7.0, 3.0));
    assert_eq!(transform * v, v);
}

#[test]
fn scaling_and_reflection() {
    let transform = Matrix4D::scaling(2.0, 3.0, 4.0);

    assert_eq!(transform * Tuple4D::point(-4.0, 6.0, 8.0),
        Tuple4D::point(-8.0, 18.0, 32.0));
    assert_eq!(transform.inverse().unwrap() * Tuple4D::vector(-4.0, 6.0, 8.0),
        Tuple4D::vector(-2.0, 2.0, 2.0));
    assert_eq!(Matrix4D::scaling(-1.0, 1.0, 1.0) * Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::point(-2.0, 3.0, 4.0));
}

#[test]
fn rotations() {
    use std::f64::consts::PI;
    let half = 2.0f64.sqrt() / 2.0;

    assert_eq!(Matrix4D::rotation_x(PI / 4.0) * Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(0.0, half, half));
    assert_eq!(Matrix4D::rotation_y(PI / 4.0) * Tuple4D::point(0.0, 0.0, 1.0),
        Tuple4D::point(half, 0.0, half));
    assert_eq!(Matrix4D::rotation_z(PI / 2.0) * Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0));
}

#[test]
fn shearing() {
    let p = Tuple4D::point(2.0, 3.0, 4.0);

    assert_eq!(Matrix4D::shearing(1.0, 0.0, 0.0, 0.0, 0.0, 0.0) * p,
        Tuple4D::point(5.0, 3.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 1.0, 0.0, 0.0) * p,
        Tuple4D::point(2.0, 7.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 0.0, 0.0, 1.0) * p,
        Tuple4D::point(2.0, 3.0, 7.0));
}

#[test]
fn default_view() {
    let from = Tuple4D::point(0.0, 0.0, 0.0);
    let to = Tuple4D::point(0.0, 0.0, -1.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(Matrix4D::view_transform(from, to, up), Matrix4D::identity());
}

#[test]
fn view_moves_world() {
    let from = Tuple4D::point(0.0, 0.0, 8.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(Matrix4D::view_transform(from, to, up),
        Matrix4D::translation(0.0, 0.0, -8.0));
}

#[test]
fn arbitrary_view() {
    let from = Tuple4D::point(1.0, 3.0, 2.0);
    let to = Tuple4D::point(4.0, -2.0, 8.0);
    let up = Tuple4D::vector(1.0, 1.0, 0.0);

    let a: Matrix4D = [ -0.50709, 0.50709,  0.67612, -2.36643,
                         0.76772, 0.60609,  0.12122, -2.82843,
                        -0.35857, 0.59761, -0.71714,  0.00000,
                         0.00000, 0.00000,  0.00000,  1.00000, ].into();

    assert_eq!(Matrix4D::view_transform(from, to, up), a);
}
