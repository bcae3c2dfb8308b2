use crate::consts::EPSILON;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::ray::Ray4D;

/// An axis-aligned bounding box.
///
/// A freshly created box is empty, with its minimum at positive infinity and
/// its maximum at negative infinity, so that the first point added becomes
/// both corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub minimum: Tuple4D,
    pub maximum: Tuple4D,
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds::empty()
    }
}

impl Bounds {
    pub fn new(minimum: Tuple4D, maximum: Tuple4D) -> Bounds {
        Bounds { minimum, maximum }
    }

    pub fn empty() -> Bounds {
        Bounds {
            minimum: Tuple4D::point(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            maximum: Tuple4D::point(
                f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY
            ),
        }
    }

    /// A box spanning all of space.
    pub fn infinite() -> Bounds {
        Bounds {
            minimum: Tuple4D::point(
                f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY
            ),
            maximum: Tuple4D::point(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        }
    }

    /// The symmetric box `[-1, 1]` on every axis shared by spheres and cubes.
    pub fn unit() -> Bounds {
        Bounds::new(
            Tuple4D::point(-1.0, -1.0, -1.0),
            Tuple4D::point(1.0, 1.0, 1.0),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.minimum.x > self.maximum.x
            || self.minimum.y > self.maximum.y
            || self.minimum.z > self.maximum.z
    }

    pub fn is_finite(&self) -> bool {
        [self.minimum, self.maximum].iter().all(|p|
            p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
        )
    }

    pub fn add_point(&mut self, p: Tuple4D) {
        self.minimum = self.minimum.min(&p);
        self.maximum = self.maximum.max(&p);
    }

    /// Grows this box to also enclose `other`.
    pub fn merge(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }

        self.add_point(other.minimum);
        self.add_point(other.maximum);
    }

    pub fn contains_point(&self, p: &Tuple4D) -> bool {
        (self.minimum.x..=self.maximum.x).contains(&p.x)
            && (self.minimum.y..=self.maximum.y).contains(&p.y)
            && (self.minimum.z..=self.maximum.z).contains(&p.z)
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.contains_point(&other.minimum) && self.contains_point(&other.maximum)
    }

    /// Transforms all eight corners of the box and bounds the result.
    ///
    /// A box with an infinite extent cannot be transformed corner by corner
    /// (`0 * inf` poisons the arithmetic), so it stays infinite.
    pub fn transform(&self, m: &Matrix4D) -> Bounds {
        if self.is_empty() {
            return *self;
        }

        if !self.is_finite() {
            return Bounds::infinite();
        }

        let (lo, hi) = (self.minimum, self.maximum);
        let mut out = Bounds::empty();

        for &x in [lo.x, hi.x].iter() {
            for &y in [lo.y, hi.y].iter() {
                for &z in [lo.z, hi.z].iter() {
                    out.add_point(*m * Tuple4D::point(x, y, z));
                }
            }
        }

        out
    }

    /// Slab test along a single axis. Returns the entry and exit `t`, smaller
    /// first.
    pub fn check_axis(min: f64, max: f64, origin: f64, direction: f64)
        -> (f64, f64) {
        let tmin_numerator = min - origin;
        let tmax_numerator = max - origin;

        let (tmin, tmax) = if direction.abs() >= EPSILON {
            (tmin_numerator / direction, tmax_numerator / direction)
        } else {
            (tmin_numerator * f64::INFINITY, tmax_numerator * f64::INFINITY)
        };

        if tmin > tmax {
            (tmax, tmin)
        } else {
            (tmin, tmax)
        }
    }

    /// Whether `ray` passes through the box.
    pub fn intersects(&self, ray: &Ray4D) -> bool {
        if self.is_empty() {
            return false;
        }

        let mut tmin = f64::NEG_INFINITY;
        let mut tmax = f64::INFINITY;

        for axis in 0..3 {
            let (t0, t1) = Self::check_axis(
                self.minimum.axis(axis),
                self.maximum.axis(axis),
                ray.origin.axis(axis),
                ray.direction.axis(axis),
            );

            // `inf * 0` shows up as NaN for a ray lying on an infinite slab;
            // NaN never narrows the interval.
            if !t0.is_nan() {
                tmin = tmin.max(t0);
            }
            if !t1.is_nan() {
                tmax = tmax.min(t1);
            }
        }

        tmin <= tmax
    }

    /// Cuts the box in two at the midpoint of its longest axis.
    pub fn split(&self) -> (Bounds, Bounds) {
        let dx = self.maximum.x - self.minimum.x;
        let dy = self.maximum.y - self.minimum.y;
        let dz = self.maximum.z - self.minimum.z;

        let greatest = dx.max(dy).max(dz);

        let (mut x0, mut y0, mut z0) = (self.minimum.x, self.minimum.y, self.minimum.z);
        let (mut x1, mut y1, mut z1) = (self.maximum.x, self.maximum.y, self.maximum.z);

        if greatest == dx {
            x0 = x0 + dx / 2.0;
            x1 = x0;
        } else if greatest == dy {
            y0 = y0 + dy / 2.0;
            y1 = y0;
        } else {
            z0 = z0 + dz / 2.0;
            z1 = z0;
        }

        let mid_min = Tuple4D::point(x0, y0, z0);
        let mid_max = Tuple4D::point(x1, y1, z1);

        (
            Bounds::new(self.minimum, mid_max),
            Bounds::new(mid_min, self.maximum),
        )
    }
}

#[test]
fn empty_box_grows_with_points() {
    let mut b = Bounds::empty();
    assert!(b.is_empty());

    b.add_point(Tuple4D::point(-5.0, 2.0, 0.0));
    b.add_point(Tuple4D::point(7.0, 0.0, -3.0));

    assert_eq!(b.minimum, Tuple4D::point(-5.0, 0.0, -3.0));
    assert_eq!(b.maximum, Tuple4D::point(7.0, 2.0, 0.0));
}

#[test]
fn merging_boxes() {
    let mut a = Bounds::new(
        Tuple4D::point(-5.0, -2.0, 0.0), Tuple4D::point(7.0, 4.0, 4.0)
    );
    let b = Bounds::new(
        Tuple4D::point(8.0, -7.0, -2.0), Tuple4D::point(14.0, 2.0, 8.0)
    );

    a.merge(&b);
    a.merge(&Bounds::empty());

    assert_eq!(a.minimum, Tuple4D::point(-5.0, -7.0, -2.0));
    assert_eq!(a.maximum, Tuple4D::point(14.0, 4.0, 8.0));
}

#[test]
fn containment() {
    let b = Bounds::new(
        Tuple4D::point(5.0, -2.0, 0.0), Tuple4D::point(11.0, 4.0, 7.0)
    );

    assert!(b.contains_point(&Tuple4D::point(5.0, -2.0, 0.0)));
    assert!(b.contains_point(&Tuple4D::point(8.0, 1.0, 3.0)));
    assert!(!b.contains_point(&Tuple4D::point(3.0, 0.0, 3.0)));
    assert!(!b.contains_point(&Tuple4D::point(8.0, 1.0, 8.0)));

    assert!(b.contains_bounds(&Bounds::new(
        Tuple4D::point(6.0, -1.0, 1.0), Tuple4D::point(10.0, 3.0, 6.0)
    )));
    assert!(!b.contains_bounds(&Bounds::new(
        Tuple4D::point(4.0, -3.0, -1.0), Tuple4D::point(10.0, 3.0, 6.0)
    )));
}

#[test]
fn transforming_a_box() {
    use std::f64::consts::PI;

    let b = Bounds::unit();
    let m = Matrix4D::rotation_x(PI / 4.0) * Matrix4D::rotation_y(PI / 4.0);
    let t = b.transform(&m);

    assert_eq!(t.minimum, Tuple4D::point(-1.41421, -1.70711, -1.70711));
    assert_eq!(t.maximum, Tuple4D::point(1.41421, 1.70711, 1.70711));
}

#[test]
fn infinite_box_stays_infinite_when_transformed() {
    let plane = Bounds::new(
        Tuple4D::point(f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY),
        Tuple4D::point(f64::INFINITY, 0.0, f64::INFINITY),
    );
    let t = plane.transform(&Matrix4D::translation(0.0, 3.0, 0.0));

    assert_eq!(t.minimum.y, f64::NEG_INFINITY);
    assert_eq!(t.maximum.y, f64::INFINITY);
}

#[test]
fn ray_box_intersection() {
    let b = Bounds::new(
        Tuple4D::point(5.0, -2.0, 0.0), Tuple4D::point(11.0, 4.0, 7.0)
    );

    let cases = [
        (Tuple4D::point(15.0, 1.0, 2.0), Tuple4D::vector(-1.0, 0.0, 0.0), true),
        (Tuple4D::point(7.0, 6.0, 5.0), Tuple4D::vector(0.0, -1.0, 0.0), true),
        (Tuple4D::point(9.0, -1.0, -8.0), Tuple4D::vector(2.0, 4.0, 6.0), true),
        (Tuple4D::point(8.0, 2.0, 12.0), Tuple4D::vector(0.0, 0.0, -1.0), true),
        (Tuple4D::point(12.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0), false),
        (Tuple4D::point(12.0, 5.0, 4.0), Tuple4D::vector(-1.0, 0.0, 0.0), false),
        (Tuple4D::point(9.0, 5.0, -1.0), Tuple4D::vector(0.0, 0.0, 1.0), false),
    ];

    for (origin, direction, expected) in cases.iter() {
        let r = Ray4D::new(*origin, direction.normalize());
        assert_eq!(b.intersects(&r), *expected, "{} {}", origin, direction);
    }
}

#[test]
fn ray_along_infinite_slab_hits() {
    let plane = Bounds::new(
        Tuple4D::point(f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY),
        Tuple4D::point(f64::INFINITY, 0.0, f64::INFINITY),
    );
    let r = Ray4D::new(
        Tuple4D::point(0.0, 1.0, -5.0), Tuple4D::vector(0.0, -1.0, 1.0)
    );

    assert!(plane.intersects(&r));
}

#[test]
fn splitting_on_the_longest_axis() {
    let b = Bounds::new(
        Tuple4D::point(-1.0, -2.0, -3.0), Tuple4D::point(9.0, 5.5, 3.0)
    );
    let (left, right) = b.split();

    assert_eq!(left.minimum, Tuple4D::point(-1.0, -2.0, -3.0));
    assert_eq!(left.maximum, Tuple4D::point(4.0, 5.5, 3.0));
    assert_eq!(right.minimum, Tuple4D::point(4.0, -2.0, -3.0));
    assert_eq!(right.maximum, Tuple4D::point(9.0, 5.5, 3.0));

    let wide_z = Bounds::new(
        Tuple4D::point(-1.0, -2.0, -3.0), Tuple4D::point(5.0, 3.0, 7.0)
    );
    let (left, right) = wide_z.split();

    assert_eq!(left.maximum, Tuple4D::point(5.0, 3.0, 2.0));
    assert_eq!(right.minimum, Tuple4D::point(-1.0, -2.0, 2.0));
}
