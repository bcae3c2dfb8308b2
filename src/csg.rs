use std::fmt;

use serde::{ Deserialize, Serialize };

use crate::intersect::Intersections;
use crate::shape::Shape;

/// The boolean combinator of a CSG shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CsgOperation {
    Union,
    Intersection,
    Difference,
}

impl fmt::Display for CsgOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CsgOperation::Union => "union",
            CsgOperation::Intersection => "intersection",
            CsgOperation::Difference => "difference",
        };

        write!(f, "{}", name)
    }
}

impl CsgOperation {
    /// Whether a hit on one operand survives the operation.
    ///
    /// `left_hit` is true when the hit belongs to the left operand;
    /// `inside_left` and `inside_right` describe where the ray is at the
    /// moment of the hit, before the hit itself is counted.
    pub fn intersection_allowed(&self, left_hit: bool, inside_left: bool,
        inside_right: bool) -> bool {
        match self {
            CsgOperation::Union
                => (left_hit && !inside_right) || (!left_hit && !inside_left),
            CsgOperation::Intersection
                => (left_hit && inside_right) || (!left_hit && inside_left),
            CsgOperation::Difference
                => (left_hit && !inside_right) || (!left_hit && inside_left),
        }
    }

    /// Keeps the records of a sorted, merged list that lie on the surface of
    /// the combined solid. `left` is the left operand; anything it does not
    /// include is treated as a right-hand hit.
    pub fn filter_intersections<'a>(&self, left: &Shape, xs: Intersections<'a>)
        -> Intersections<'a> {
        let mut inside_left = false;
        let mut inside_right = false;

        xs.filter(|i| {
            let left_hit = left.includes(i.what);
            let allowed = self.intersection_allowed(
                left_hit, inside_left, inside_right
            );

            if left_hit {
                inside_left = !inside_left;
            } else {
                inside_right = !inside_right;
            }

            allowed
        })
    }
}

#[cfg(test)]
use crate::intersect::Intersection;
#[cfg(test)]
use crate::matrix::Matrix4D;
#[cfg(test)]
use crate::ray::Ray4D;
#[cfg(test)]
use crate::tuple::Tuple4D;

#[test]
fn operation_truth_tables() {
    let cases = [
        (true, true, true),
        (true, true, false),
        (true, false, true),
        (true, false, false),
        (false, true, true),
        (false, true, false),
        (false, false, true),
        (false, false, false),
    ];

    let union = [false, true, false, true, false, false, true, true];
    let intersection = [true, false, true, false, true, true, false, false];
    let difference = [false, true, false, true, true, true, false, false];

    for (i, &(lhit, inl, inr)) in cases.iter().enumerate() {
        assert_eq!(CsgOperation::Union.intersection_allowed(lhit, inl, inr),
            union[i], "union {:?}", cases[i]);
        assert_eq!(
            CsgOperation::Intersection.intersection_allowed(lhit, inl, inr),
            intersection[i], "intersection {:?}", cases[i]
        );
        assert_eq!(
            CsgOperation::Difference.intersection_allowed(lhit, inl, inr),
            difference[i], "difference {:?}", cases[i]
        );
    }
}

#[test]
fn filtering_a_list_of_intersections() {
    let expected = [
        (CsgOperation::Union, 0, 3),
        (CsgOperation::Intersection, 1, 2),
        (CsgOperation::Difference, 0, 1),
    ];

    for &(op, x0, x1) in expected.iter() {
        let c = Shape::csg(op, Shape::sphere(), Shape::cube());
        let (s1, s2) = c.operands().unwrap();

        let xs: Intersections = vec![
            Intersection::new(1.0, s1),
            Intersection::new(2.0, s2),
            Intersection::new(3.0, s1),
            Intersection::new(4.0, s2),
        ].into();
        let all = xs.clone();

        let result = op.filter_intersections(s1, xs);
        assert_eq!(result.len(), 2, "{}", op);
        assert_eq!(result[0], all[x0], "{}", op);
        assert_eq!(result[1], all[x1], "{}", op);
    }
}

#[test]
fn ray_misses_csg_object() {
    let c = Shape::csg_union(Shape::sphere(), Shape::cube());
    let r = Ray4D::new(Tuple4D::point(0.0, 2.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(c.intersect(&r).is_empty());
}

#[test]
fn ray_hits_csg_union() {
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 0.5));
    let c = Shape::csg_union(Shape::sphere(), s2);
    let (s1, s2) = c.operands().unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = c.intersect(&r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0], Intersection::new(4.0, s1));
    assert_eq!(xs[1], Intersection::new(6.5, s2));
}

#[test]
fn csg_difference_keeps_left_outside_right() {
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 0.5));
    let c = Shape::csg_difference(Shape::sphere(), s2);
    let (s1, s2) = c.operands().unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = c.intersect(&r);

    // The entry on the left sphere, then the entry on the right sphere,
    // which is where the carved-out region begins.
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0], Intersection::new(4.0, s1));
    assert_eq!(xs[1], Intersection::new(4.5, s2));
}

#[test]
fn csg_intersection_keeps_overlap() {
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 0.5));
    let c = Shape::csg_intersection(Shape::sphere(), s2);
    let (s1, s2) = c.operands().unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = c.intersect(&r);

    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0], Intersection::new(4.5, s2));
    assert_eq!(xs[1], Intersection::new(6.0, s1));
}
