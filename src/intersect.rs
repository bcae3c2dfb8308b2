use std::cmp::Ordering;
use std::ops::Index;

use crate::consts::EPSILON;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::shape::Shape;

/// A ray hitting a shape at offset `t` along the ray.
///
/// `uv` carries the barycentric weights of a triangle hit; smooth triangles
/// need them to interpolate their normal.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
    pub uv: Option<(f64, f64)>,
}

/// Two intersections are equal when their offsets match and they point at
/// the *same* shape, not merely an equal one.
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what, uv: None }
    }

    pub fn new_uv(t: f64, what: &'a Shape, u: f64, v: f64) -> Intersection<'a> {
        Intersection { t, what, uv: Some((u, v)) }
    }
}

/// Intersection records for one ray, always sorted by ascending `t`.
///
/// Non-finite offsets are dropped on construction.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    intersections: Vec<Intersection<'a>>,
}

impl<'a> From<Vec<Intersection<'a>>> for Intersections<'a> {
    fn from(mut intersections: Vec<Intersection<'a>>) -> Intersections<'a> {
        intersections.retain(|i| i.t.is_finite());
        intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal)
        );

        Intersections { intersections }
    }
}

impl<'a> Index<usize> for Intersections<'a> {
    type Output = Intersection<'a>;

    fn index(&self, i: usize) -> &Intersection<'a> {
        &self.intersections[i]
    }
}

impl<'a> Intersections<'a> {
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    /// Merges several record lists into one sorted list.
    pub fn aggregate(all: Vec<Intersections<'a>>) -> Intersections<'a> {
        let merged: Vec<Intersection<'a>> = all.into_iter()
            .flat_map(|is| is.intersections)
            .collect();

        merged.into()
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intersection<'a>> {
        self.intersections.iter()
    }

    /// The nearest record at or beyond `EPSILON`. Anything closer is treated
    /// as the surface the ray just left.
    pub fn hit(&self) -> Option<Intersection<'a>> {
        self.intersections.iter().find(|i| i.t >= EPSILON).copied()
    }

    /// Keeps the records `keep` accepts, preserving order.
    pub(crate) fn filter<F>(self, mut keep: F) -> Intersections<'a>
        where F: FnMut(&Intersection<'a>) -> bool {
        Intersections {
            intersections: self.intersections.into_iter()
                .filter(|i| keep(i))
                .collect(),
        }
    }
}

/// Everything shading needs to know about a single hit.
#[derive(Clone, Debug)]
pub struct IntersectionComputation<'a> {
    pub t: f64,
    pub obj: &'a Shape,

    pub point: Tuple4D,

    /// Just above the surface, where shadow and reflection rays start.
    pub over_point: Tuple4D,

    /// Just below the surface, where refraction rays start.
    pub under_point: Tuple4D,

    pub eyev: Tuple4D,

    /// Surface normal, flipped to face the eye when the hit is inside.
    pub normalv: Tuple4D,
    pub reflectv: Tuple4D,
    pub inside: bool,

    /// Refractive index of the medium being left.
    pub n1: f64,

    /// Refractive index of the medium being entered.
    pub n2: f64,
}

impl<'a> IntersectionComputation<'a> {
    /// Precomputes the shading state for `hit`.
    ///
    /// `is` is the full record list the hit was chosen from; without it the
    /// refractive indices default to those of a vacuum.
    pub fn new(r: &Ray4D, hit: &Intersection<'a>, is: Option<&Intersections<'a>>)
        -> IntersectionComputation<'a> {
        let t = hit.t;
        let obj = hit.what;
        let point = r.position(t);
        let eyev = -r.direction;
        let mut normalv = obj.normal_at(point, hit);

        let inside = normalv.dot(&eyev) < 0.0;
        if inside {
            normalv = -normalv;
        }

        let over_point = point + normalv * EPSILON;
        let under_point = point - normalv * EPSILON;
        let reflectv = r.direction.reflect(&normalv);

        let (n1, n2) = match is {
            Some(xs) => Self::refraction_indices(hit, xs),
            None => (1.0, 1.0),
        };

        IntersectionComputation {
            t, obj,
            point, over_point, under_point,
            eyev, normalv, reflectv,
            inside,
            n1, n2,
        }
    }

    /// Walks the records up to the hit, tracking which shapes the ray is
    /// currently inside.
    fn refraction_indices(hit: &Intersection<'a>, is: &Intersections<'a>)
        -> (f64, f64) {
        let top = |containers: &[&Shape]| containers.last()
            .map_or(1.0, |s| s.material.refractive_index);

        let mut containers: Vec<&'a Shape> = Vec::new();

        for i in is.iter() {
            let n1 = top(&containers);

            match containers.iter().position(|&s| std::ptr::eq(s, i.what)) {
                Some(j) => { containers.remove(j); },
                None => containers.push(i.what),
            }

            if i == hit {
                return (n1, top(&containers));
            }
        }

        (1.0, 1.0)
    }

    /// Schlick's approximation of the fraction of light reflected at the hit.
    pub fn schlick(&self) -> f64 {
        let mut cos = self.eyev.dot(&self.normalv);

        // Total internal reflection is only possible leaving a denser medium.
        if self.n1 > self.n2 {
            let n = self.n1 / self.n2;
            let sin2_t = n.powi(2) * (1.0 - cos.powi(2));

            if sin2_t > 1.0 {
                return 1.0;
            }

            cos = (1.0 - sin2_t).sqrt();
        }

        let r0 = ((self.n1 - self.n2) / (self.n1 + self.n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).powi(5)
    }
}

#[cfg(test)]
use crate::matrix::Matrix4D;

#[cfg(test)]
fn glass_sphere() -> Shape {
    Shape::sphere().with_material(crate::light::Material {
        refractive_index: 1.5,
        ..crate::light::Material::glass()
    })
}

#[test]
fn aggregate_sorts_records() {
    let s = Shape::sphere();
    let xs = Intersections::aggregate(vec![
        vec![Intersection::new(5.0, &s), Intersection::new(-3.0, &s)].into(),
        vec![Intersection::new(7.0, &s), Intersection::new(2.0, &s)].into(),
    ]);

    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![-3.0, 2.0, 5.0, 7.0]);
}

#[test]
fn hit_is_lowest_non_negative() {
    let s = Shape::sphere();

    let xs: Intersections = vec![
        Intersection::new(2.0, &s), Intersection::new(1.0, &s),
    ].into();
    assert_eq!(xs.hit(), Some(Intersection::new(1.0, &s)));

    let xs: Intersections = vec![
        Intersection::new(-1.0, &s), Intersection::new(1.0, &s),
    ].into();
    assert_eq!(xs.hit(), Some(Intersection::new(1.0, &s)));

    let xs: Intersections = vec![
        Intersection::new(-2.0, &s), Intersection::new(-1.0, &s),
    ].into();
    assert_eq!(xs.hit(), None);

    let xs: Intersections = vec![
        Intersection::new(5.0, &s), Intersection::new(7.0, &s),
        Intersection::new(-3.0, &s), Intersection::new(2.0, &s),
    ].into();
    assert_eq!(xs.hit(), Some(Intersection::new(2.0, &s)));
}

#[test]
fn hit_skips_records_within_epsilon() {
    let s = Shape::sphere();
    let xs: Intersections = vec![
        Intersection::new(EPSILON / 2.0, &s), Intersection::new(3.0, &s),
    ].into();

    assert_eq!(xs.hit(), Some(Intersection::new(3.0, &s)));
}

#[test]
fn comps_outside_and_inside() {
    let s = Shape::sphere();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let comps = IntersectionComputation::new(&r, &Intersection::new(4.0, &s), None);
    assert!(!comps.inside);
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    let comps = IntersectionComputation::new(&r, &Intersection::new(1.0, &s), None);
    assert!(comps.inside);
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn over_and_under_points_straddle_surface() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 1.0));
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let comps = IntersectionComputation::new(&r, &Intersection::new(5.0, &s), None);

    assert!(comps.over_point.z < -EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
    assert!(comps.under_point.z > EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn reflection_vector() {
    let s = Shape::plane();
    let half = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 1.0, -1.0),
                       Tuple4D::vector(0.0, -half, half));
    let i = Intersection::new(2.0f64.sqrt(), &s);
    let comps = IntersectionComputation::new(&r, &i, None);

    assert_eq!(comps.reflectv, Tuple4D::vector(0.0, half, half));
}

#[test]
fn n1_and_n2_at_each_boundary() {
    let mut a = glass_sphere().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    a.material.refractive_index = 1.5;
    let mut b = glass_sphere().with_transform(Matrix4D::translation(0.0, 0.0, -0.25));
    b.material.refractive_index = 2.0;
    let mut c = glass_sphere().with_transform(Matrix4D::translation(0.0, 0.0, 0.25));
    c.material.refractive_index = 2.5;

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -4.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let xs: Intersections = vec![
        Intersection::new(2.0, &a),
        Intersection::new(2.75, &b),
        Intersection::new(3.25, &c),
        Intersection::new(4.75, &b),
        Intersection::new(5.25, &c),
        Intersection::new(6.0, &a),
    ].into();

    let expected = [
        (1.0, 1.5), (1.5, 2.0), (2.0, 2.5), (2.5, 2.5), (2.5, 1.5), (1.5, 1.0),
    ];

    for (i, &(n1, n2)) in expected.iter().enumerate() {
        let comps = IntersectionComputation::new(&r, &xs[i], Some(&xs));
        assert_eq!((comps.n1, comps.n2), (n1, n2), "boundary {}", i);
    }
}

#[test]
fn schlick_under_total_internal_reflection() {
    let s = glass_sphere();
    let half = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, half),
                       Tuple4D::vector(0.0, 1.0, 0.0));
    let xs: Intersections = vec![
        Intersection::new(-half, &s), Intersection::new(half, &s),
    ].into();

    let comps = IntersectionComputation::new(&r, &xs[1], Some(&xs));
    assert_eq!(comps.schlick(), 1.0);
}

#[test]
fn schlick_perpendicular_and_small_angle() {
    let s = glass_sphere();

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs: Intersections = vec![
        Intersection::new(-1.0, &s), Intersection::new(1.0, &s),
    ].into();
    let comps = IntersectionComputation::new(&r, &xs[1], Some(&xs));
    assert!(crate::feq(comps.schlick(), 0.04));

    let r = Ray4D::new(Tuple4D::point(0.0, 0.99, -2.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let xs: Intersections = vec![Intersection::new(1.8589, &s)].into();
    let comps = IntersectionComputation::new(&r, &xs[0], Some(&xs));
    assert!(crate::feq(comps.schlick(), 0.48873));
}
