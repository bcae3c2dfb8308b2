//! Object-space math for the primitive shapes.
//!
//! Everything here works on a ray that has already been moved into the
//! shape's own space and returns raw `t` values; `Shape` turns those into
//! intersection records.

use crate::consts::EPSILON;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::bounds::Bounds;

/// Real roots of `ax^2 + bx + c`, smaller first.
///
/// A tangent ray yields two equal roots. Returns `None` when the
/// discriminant is negative.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    let disc = b.powi(2) - 4.0 * a * c;

    if disc < 0.0 {
        return None;
    }

    let root = disc.sqrt();
    let t0 = (-b - root) / (2.0 * a);
    let t1 = (-b + root) / (2.0 * a);

    if t0 > t1 {
        Some((t1, t0))
    } else {
        Some((t0, t1))
    }
}

/// Hits on the unit sphere at the origin.
pub fn sphere_hits(ray: &Ray4D) -> Option<(f64, f64)> {
    let sphere_to_ray = ray.origin - Tuple4D::origin();

    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * ray.direction.dot(&sphere_to_ray);
    let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

    solve_quadratic(a, b, c)
}

/// Hit on the XZ plane. Rays parallel to the plane never hit it.
pub fn plane_hit(ray: &Ray4D) -> Option<f64> {
    if ray.direction.y.abs() <= EPSILON {
        return None;
    }

    Some(-ray.origin.y / ray.direction.y)
}

/// Entry and exit `t` along one axis of the `[-1, 1]` cube.
pub fn check_cube_axis(origin: f64, direction: f64) -> (f64, f64) {
    Bounds::check_axis(-1.0, 1.0, origin, direction)
}

/// Hits on the `[-1, 1]` cube.
pub fn cube_hits(ray: &Ray4D) -> Option<(f64, f64)> {
    let (xtmin, xtmax) = check_cube_axis(ray.origin.x, ray.direction.x);
    let (ytmin, ytmax) = check_cube_axis(ray.origin.y, ray.direction.y);
    let (ztmin, ztmax) = check_cube_axis(ray.origin.z, ray.direction.z);

    let tmin = xtmin.max(ytmin).max(ztmin);
    let tmax = xtmax.min(ytmax).min(ztmax);

    if tmin > tmax {
        None
    } else {
        Some((tmin, tmax))
    }
}

/// The cube normal points along whichever axis the point is furthest out on.
pub fn cube_normal(p: &Tuple4D) -> Tuple4D {
    let xa = p.x.abs();
    let ya = p.y.abs();
    let za = p.z.abs();

    let max_component = xa.max(ya).max(za);
    if max_component == xa {
        Tuple4D::vector(p.x, 0.0, 0.0)
    } else if max_component == ya {
        Tuple4D::vector(0.0, p.y, 0.0)
    } else {
        Tuple4D::vector(0.0, 0.0, p.z)
    }
}

/// Y extent shared by cylinders and cones. Bounds are exclusive; caps are
/// only tested when `closed` is set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub minimum: f64,
    pub maximum: f64,
    pub closed: bool,
}

impl Default for Extent {
    fn default() -> Extent {
        Extent {
            minimum: f64::NEG_INFINITY,
            maximum: f64::INFINITY,
            closed: false,
        }
    }
}

impl Extent {
    pub fn new(minimum: f64, maximum: f64, closed: bool) -> Extent {
        Extent { minimum, maximum, closed }
    }

    fn contains(&self, y: f64) -> bool {
        self.minimum < y && y < self.maximum
    }

    /// Keeps the roots whose hit point lies strictly between the bounds.
    fn push_bounded(&self, ray: &Ray4D, t: f64, out: &mut Vec<f64>) {
        let y = ray.origin.y + t * ray.direction.y;
        if self.contains(y) {
            out.push(t);
        }
    }

    /// Intersects both end caps. `radius` maps a cap's `y` to its radius.
    fn push_caps(&self, ray: &Ray4D, radius: impl Fn(f64) -> f64,
        out: &mut Vec<f64>) {
        if !self.closed || ray.direction.y.abs() < EPSILON {
            return;
        }

        for &y in [self.minimum, self.maximum].iter() {
            let t = (y - ray.origin.y) / ray.direction.y;
            let x = ray.origin.x + t * ray.direction.x;
            let z = ray.origin.z + t * ray.direction.z;

            if x.powi(2) + z.powi(2) <= radius(y).powi(2) {
                out.push(t);
            }
        }
    }
}

/// Hits on the unit-radius cylinder around the Y axis.
pub fn cylinder_hits(ray: &Ray4D, extent: &Extent) -> Vec<f64> {
    let mut ts = Vec::new();
    let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);

    // Parallel to the Y axis: only the caps can be hit.
    if a.abs() >= EPSILON {
        let b = 2.0 * ray.origin.x * ray.direction.x
              + 2.0 * ray.origin.z * ray.direction.z;
        let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;

        if let Some((t0, t1)) = solve_quadratic(a, b, c) {
            extent.push_bounded(ray, t0, &mut ts);
            extent.push_bounded(ray, t1, &mut ts);
        } else {
            return ts;
        }
    }

    extent.push_caps(ray, |_| 1.0, &mut ts);
    ts
}

pub fn cylinder_normal(p: &Tuple4D, extent: &Extent) -> Tuple4D {
    let dist = p.x.powi(2) + p.z.powi(2);

    if dist < 1.0 && p.y >= extent.maximum - EPSILON {
        Tuple4D::vector(0.0, 1.0, 0.0)
    } else if dist < 1.0 && p.y <= extent.minimum + EPSILON {
        Tuple4D::vector(0.0, -1.0, 0.0)
    } else {
        Tuple4D::vector(p.x, 0.0, p.z)
    }
}

/// Hits on the double-napped cone `x^2 + z^2 = y^2`.
///
/// When both `a` and `b` are near zero the body is treated as missed even if
/// a tangential hit exists; caps are still tested.
pub fn cone_hits(ray: &Ray4D, extent: &Extent) -> Vec<f64> {
    let mut ts = Vec::new();

    let a = ray.direction.x.powi(2)
          - ray.direction.y.powi(2)
          + ray.direction.z.powi(2);
    let b = 2.0 * ray.origin.x * ray.direction.x
          - 2.0 * ray.origin.y * ray.direction.y
          + 2.0 * ray.origin.z * ray.direction.z;
    let c = ray.origin.x.powi(2)
          - ray.origin.y.powi(2)
          + ray.origin.z.powi(2);

    if a.abs() < EPSILON {
        if b.abs() >= EPSILON {
            // Parallel to one of the halves: a single hit on the other.
            extent.push_bounded(ray, -c / (2.0 * b), &mut ts);
        }
    } else if let Some((t0, t1)) = solve_quadratic(a, b, c) {
        extent.push_bounded(ray, t0, &mut ts);
        extent.push_bounded(ray, t1, &mut ts);
    } else {
        return ts;
    }

    extent.push_caps(ray, f64::abs, &mut ts);
    ts
}

pub fn cone_normal(p: &Tuple4D, extent: &Extent) -> Tuple4D {
    let dist = p.x.powi(2) + p.z.powi(2);

    if dist < extent.maximum.powi(2) && p.y >= extent.maximum - EPSILON {
        Tuple4D::vector(0.0, 1.0, 0.0)
    } else if dist < extent.minimum.powi(2) && p.y <= extent.minimum + EPSILON {
        Tuple4D::vector(0.0, -1.0, 0.0)
    } else if dist < EPSILON * EPSILON {
        // The apex has no surface normal; point along the axis instead.
        Tuple4D::vector(0.0, 1.0, 0.0)
    } else {
        let mut y = dist.sqrt();
        if p.y > 0.0 {
            y = -y;
        }

        Tuple4D::vector(p.x, y, p.z)
    }
}

/// A flat triangle with its edges and face normal precomputed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub p1: Tuple4D,
    pub p2: Tuple4D,
    pub p3: Tuple4D,

    pub e1: Tuple4D,
    pub e2: Tuple4D,
    pub normal: Tuple4D,
}

impl TriangleInfo {
    /// Panics when the points are collinear, as the face normal is then
    /// undefined.
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> TriangleInfo {
        let e1 = p2 - p1;
        let e2 = p3 - p1;
        let normal = e2.cross(&e1).normalize();

        TriangleInfo { p1, p2, p3, e1, e2, normal }
    }

    /// Like `new`, but returns `None` for a zero-area triangle.
    pub fn try_new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D)
        -> Option<TriangleInfo> {
        let area = (p3 - p1).cross(&(p2 - p1)).magnitude();

        if area <= 0.0 || !area.is_finite() {
            None
        } else {
            Some(TriangleInfo::new(p1, p2, p3))
        }
    }

    /// Moller-Trumbore. Returns `(t, u, v)` where `u` and `v` are the
    /// barycentric weights of `p2` and `p3`.
    pub fn intersect(&self, ray: &Ray4D) -> Option<(f64, f64, f64)> {
        let dir_cross_e2 = ray.direction.cross(&self.e2);
        let determinant = self.e1.dot(&dir_cross_e2);

        if determinant.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / determinant;
        let p1_to_origin = ray.origin - self.p1;
        let u = f * p1_to_origin.dot(&dir_cross_e2);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let origin_cross_e1 = p1_to_origin.cross(&self.e1);
        let v = f * ray.direction.dot(&origin_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.e2.dot(&origin_cross_e1);
        Some((t, u, v))
    }

    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        b.add_point(self.p1);
        b.add_point(self.p2);
        b.add_point(self.p3);

        b
    }
}

/// A triangle whose normal is interpolated from per-vertex normals.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SmoothTriangleInfo {
    pub triangle: TriangleInfo,

    pub n1: Tuple4D,
    pub n2: Tuple4D,
    pub n3: Tuple4D,
}

impl SmoothTriangleInfo {
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D,
        n1: Tuple4D, n2: Tuple4D, n3: Tuple4D) -> SmoothTriangleInfo {
        SmoothTriangleInfo {
            triangle: TriangleInfo::new(p1, p2, p3),
            n1, n2, n3,
        }
    }

    pub fn normal_at(&self, u: f64, v: f64) -> Tuple4D {
        self.n2 * u + self.n3 * v + self.n1 * (1.0 - u - v)
    }
}

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray4D {
    Ray4D::new(
        Tuple4D::point(origin.0, origin.1, origin.2),
        Tuple4D::vector(direction.0, direction.1, direction.2),
    )
}

#[test]
fn quadratic_roots_are_ordered() {
    assert_eq!(solve_quadratic(1.0, 0.0, -4.0), Some((-2.0, 2.0)));
    assert_eq!(solve_quadratic(-1.0, 0.0, 4.0), Some((-2.0, 2.0)));
    assert_eq!(solve_quadratic(1.0, -10.0, 25.0), Some((5.0, 5.0)));
    assert_eq!(solve_quadratic(1.0, 0.0, 4.0), None);
}

#[test]
fn ray_through_sphere() {
    assert_eq!(sphere_hits(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))),
        Some((4.0, 6.0)));
    assert_eq!(sphere_hits(&ray((0.0, 1.0, -5.0), (0.0, 0.0, 1.0))),
        Some((5.0, 5.0)));
    assert_eq!(sphere_hits(&ray((0.0, 2.0, -5.0), (0.0, 0.0, 1.0))), None);
    assert_eq!(sphere_hits(&ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))),
        Some((-1.0, 1.0)));
}

#[test]
fn plane_parallel_and_coplanar_rays_miss() {
    assert_eq!(plane_hit(&ray((0.0, 10.0, 0.0), (0.0, 0.0, 1.0))), None);
    assert_eq!(plane_hit(&ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))), None);
    assert_eq!(plane_hit(&ray((0.0, 1.0, 0.0), (0.0, -1.0, 0.0))), Some(1.0));
    assert_eq!(plane_hit(&ray((0.0, -1.0, 0.0), (0.0, 1.0, 0.0))), Some(1.0));
}

#[test]
fn ray_through_cube() {
    let cases = [
        ((5.0, 0.5, 0.0), (-1.0, 0.0, 0.0), 4.0, 6.0),
        ((-5.0, 0.5, 0.0), (1.0, 0.0, 0.0), 4.0, 6.0),
        ((0.5, 5.0, 0.0), (0.0, -1.0, 0.0), 4.0, 6.0),
        ((0.5, 0.0, -5.0), (0.0, 0.0, 1.0), 4.0, 6.0),
        ((0.0, 0.5, 0.0), (0.0, 0.0, 1.0), -1.0, 1.0),
    ];

    for &(o, d, t1, t2) in cases.iter() {
        assert_eq!(cube_hits(&ray(o, d)), Some((t1, t2)));
    }

    assert_eq!(cube_hits(&ray((-2.0, 0.0, 0.0), (0.2673, 0.5345, 0.8018))),
        None);
    assert_eq!(cube_hits(&ray((2.0, 0.0, 2.0), (0.0, 0.0, -1.0))), None);
}

#[test]
fn cube_normals() {
    assert_eq!(cube_normal(&Tuple4D::point(1.0, 0.5, -0.8)),
        Tuple4D::vector(1.0, 0.0, 0.0));
    assert_eq!(cube_normal(&Tuple4D::point(-0.4, 0.3, -1.0)),
        Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(cube_normal(&Tuple4D::point(1.0, 1.0, 1.0)),
        Tuple4D::vector(1.0, 0.0, 0.0));
}

#[test]
fn cylinder_hits_and_misses() {
    let unbounded = Extent::default();

    assert!(cylinder_hits(&ray((1.0, 0.0, 0.0), (0.0, 1.0, 0.0)), &unbounded)
        .is_empty());
    assert_eq!(cylinder_hits(&ray((1.0, 0.0, -5.0), (0.0, 0.0, 1.0)),
        &unbounded), vec![5.0, 5.0]);
    assert_eq!(cylinder_hits(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)),
        &unbounded), vec![4.0, 6.0]);
}

#[test]
fn bounded_cylinder_excludes_ends() {
    let extent = Extent::new(1.0, 2.0, false);
    let cases = [
        ((0.0, 1.5, 0.0), (0.1, 1.0, 0.0), 0),
        ((0.0, 3.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 2.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.5, -2.0), (0.0, 0.0, 1.0), 2),
    ];

    for &(o, (dx, dy, dz), count) in cases.iter() {
        let d = Tuple4D::vector(dx, dy, dz).normalize();
        let r = ray(o, (d.x, d.y, d.z));
        assert_eq!(cylinder_hits(&r, &extent).len(), count);
    }
}

#[test]
fn capped_cylinder_hits_caps() {
    let extent = Extent::new(1.0, 2.0, true);
    let cases = [
        ((0.0, 3.0, 0.0), (0.0, -1.0, 0.0)),
        ((0.0, 3.0, -2.0), (0.0, -1.0, 2.0)),
        ((0.0, 0.0, -2.0), (0.0, 1.0, 2.0)),
    ];

    for &(o, (dx, dy, dz)) in cases.iter() {
        let d = Tuple4D::vector(dx, dy, dz).normalize();
        assert_eq!(cylinder_hits(&ray(o, (d.x, d.y, d.z)), &extent).len(), 2);
    }
}

#[test]
fn cylinder_normals_on_body_and_caps() {
    let extent = Extent::new(1.0, 2.0, true);

    assert_eq!(cylinder_normal(&Tuple4D::point(0.0, 5.0, -1.0), &Extent::default()),
        Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(cylinder_normal(&Tuple4D::point(0.5, 1.0, 0.0), &extent),
        Tuple4D::vector(0.0, -1.0, 0.0));
    assert_eq!(cylinder_normal(&Tuple4D::point(0.0, 2.0, 0.5), &extent),
        Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn cone_double_root_and_slants() {
    let unbounded = Extent::default();

    let ts = cone_hits(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)), &unbounded);
    assert_eq!(ts.len(), 2);
    assert!(crate::feq(ts[0], 5.0) && crate::feq(ts[1], 5.0));

    let d = Tuple4D::vector(1.0, 1.0, 1.0).normalize();
    let ts = cone_hits(&ray((0.0, 0.0, -5.0), (d.x, d.y, d.z)), &unbounded);
    assert!(crate::feq(ts[0], 8.66025) && crate::feq(ts[1], 8.66025));

    let d = Tuple4D::vector(-0.5, -1.0, 1.0).normalize();
    let ts = cone_hits(&ray((1.0, 1.0, -5.0), (d.x, d.y, d.z)), &unbounded);
    assert!(crate::feq(ts[0], 4.55006) && crate::feq(ts[1], 49.44994));
}

#[test]
fn cone_ray_parallel_to_one_half() {
    let d = Tuple4D::vector(0.0, 1.0, 1.0).normalize();
    let ts = cone_hits(&ray((0.0, 0.0, -1.0), (d.x, d.y, d.z)), &Extent::default());

    assert_eq!(ts.len(), 1);
    assert!(crate::feq(ts[0], 0.35355));
}

#[test]
fn capped_cone_hits_caps() {
    let extent = Extent::new(-0.5, 0.5, true);
    let cases = [
        ((0.0, 0.0, -5.0), (0.0, 1.0, 0.0), 0),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 1.0), 2),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 0.0), 4),
    ];

    for &(o, (dx, dy, dz), count) in cases.iter() {
        let d = Tuple4D::vector(dx, dy, dz).normalize();
        assert_eq!(cone_hits(&ray(o, (d.x, d.y, d.z)), &extent).len(), count);
    }
}

#[test]
fn cone_normals() {
    let unbounded = Extent::default();

    assert_eq!(cone_normal(&Tuple4D::point(0.0, 0.0, 0.0), &unbounded),
        Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(cone_normal(&Tuple4D::point(1.0, 1.0, 1.0), &unbounded),
        Tuple4D::vector(1.0, -(2.0f64.sqrt()), 1.0));
    assert_eq!(cone_normal(&Tuple4D::point(-1.0, -1.0, 0.0), &unbounded),
        Tuple4D::vector(-1.0, 1.0, 0.0));
}

#[test]
fn triangle_precomputes_edges_and_normal() {
    let t = TriangleInfo::new(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    );

    assert_eq!(t.e1, Tuple4D::vector(-1.0, -1.0, 0.0));
    assert_eq!(t.e2, Tuple4D::vector(1.0, -1.0, 0.0));
    assert_eq!(t.normal, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn triangle_edges_and_parallel_rays() {
    let t = TriangleInfo::new(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    );

    assert_eq!(t.intersect(&ray((0.0, -1.0, -2.0), (0.0, 1.0, 0.0))), None);
    assert_eq!(t.intersect(&ray((1.0, 1.0, -2.0), (0.0, 0.0, 1.0))), None);
    assert_eq!(t.intersect(&ray((-1.0, 1.0, -2.0), (0.0, 0.0, 1.0))), None);
    assert_eq!(t.intersect(&ray((0.0, -1.0, -2.0), (0.0, 0.0, 1.0))), None);

    let (t_hit, _, _) = t.intersect(&ray((0.0, 0.5, -2.0), (0.0, 0.0, 1.0)))
        .expect("ray should strike the triangle");
    assert_eq!(t_hit, 2.0);
}

#[test]
fn smooth_triangle_interpolates_normal() {
    let st = SmoothTriangleInfo::new(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
        Tuple4D::vector(-1.0, 0.0, 0.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
    );

    let (_, u, v) = st.triangle.intersect(&ray((-0.2, 0.3, -2.0), (0.0, 0.0, 1.0)))
        .expect("ray should strike the triangle");
    assert!(crate::feq(u, 0.45) && crate::feq(v, 0.25));

    assert_eq!(st.normal_at(0.45, 0.25).normalize(),
        Tuple4D::vector(-0.5547, 0.83205, 0.0));
}
