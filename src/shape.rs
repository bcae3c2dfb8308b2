use std::fmt;

use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::light::Material;
use crate::matrix::Matrix4D;
use crate::bounds::Bounds;
use crate::csg::CsgOperation;
use crate::intersect::{ Intersection, Intersections };
use crate::consts::EPSILON;
use crate::geometry::{
    self, Extent, TriangleInfo, SmoothTriangleInfo,
};

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeType {
    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The XZ plane, stretching indefinitely along X and Z.
    Plane,

    /// A cube spanning `[-1, 1]` on every axis.
    Cube,

    /// A unit-radius cylinder around the Y axis.
    Cylinder(Extent),

    /// A double-napped cone around the Y axis, its apex at the origin.
    Cone(Extent),

    Triangle(TriangleInfo),

    SmoothTriangle(SmoothTriangleInfo),

    /// A group of shapes. Can include other groups of shapes.
    Group(Vec<Shape>),

    /// Two shapes combined by a boolean operation.
    Csg(CsgOperation, Box<Shape>, Box<Shape>),
}

/// A node in the shape tree.
///
/// Every shape caches the inverse of its own transform for ray conversion,
/// plus the inverse of its *full* transform (the product of every ancestor's
/// transform with its own) for world/object conversion of points and
/// normals. The full transform is pushed down the tree whenever a shape is
/// adopted or a container's transform changes, so a child never needs a
/// pointer back to its parent.
///
/// ```text
/// Group(transform: A)
///     > Group(transform: B)          full: AB
///         > Sphere(transform: C)     full: ABC
/// ```
#[derive(Clone, Debug)]
pub struct Shape {
    pub material: Material,

    /// Whether the shape blocks light from reaching other surfaces.
    pub casts_shadow: bool,

    ty: ShapeType,

    transform: Matrix4D,
    inverse: Matrix4D,

    world_inverse: Matrix4D,
    world_inverse_transpose: Matrix4D,

    bounds: Bounds,
}

/// Shapes compare by value: type, transform and material. Where a shape sits
/// in a tree does not matter.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.transform == other.transform
            && self.material == other.material
            && self.casts_shadow == other.casts_shadow
    }
}

impl Shape {
    fn new(ty: ShapeType) -> Shape {
        let mut shape = Shape {
            material: Material::default(),
            casts_shadow: true,
            ty,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
            world_inverse: Matrix4D::identity(),
            world_inverse_transpose: Matrix4D::identity(),
            bounds: Bounds::empty(),
        };

        shape.bounds = shape.compute_bounds();
        shape
    }

    /// Creates a unit sphere with identity transform and default material.
    pub fn sphere() -> Shape {
        Self::new(ShapeType::Sphere)
    }

    pub fn plane() -> Shape {
        Self::new(ShapeType::Plane)
    }

    pub fn cube() -> Shape {
        Self::new(ShapeType::Cube)
    }

    /// Creates an infinitely long cylinder with no end caps.
    pub fn cylinder() -> Shape {
        Self::new(ShapeType::Cylinder(Extent::default()))
    }

    /// Creates a cylinder truncated to `minimum < y < maximum`, left open.
    pub fn bounded_cylinder(minimum: f64, maximum: f64) -> Shape {
        Self::new(ShapeType::Cylinder(Extent::new(minimum, maximum, false)))
    }

    pub fn capped_cylinder(minimum: f64, maximum: f64) -> Shape {
        Self::new(ShapeType::Cylinder(Extent::new(minimum, maximum, true)))
    }

    /// Creates an infinite double-napped cone.
    pub fn cone() -> Shape {
        Self::new(ShapeType::Cone(Extent::default()))
    }

    pub fn bounded_cone(minimum: f64, maximum: f64) -> Shape {
        Self::new(ShapeType::Cone(Extent::new(minimum, maximum, false)))
    }

    pub fn capped_cone(minimum: f64, maximum: f64) -> Shape {
        Self::new(ShapeType::Cone(Extent::new(minimum, maximum, true)))
    }

    /// Creates a triangle, defined by three points in space.
    pub fn triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> Shape {
        Self::new(ShapeType::Triangle(TriangleInfo::new(p1, p2, p3)))
    }

    /// Creates a "smooth" triangle with normals at each vertex.
    pub fn smooth_triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D,
        n1: Tuple4D, n2: Tuple4D, n3: Tuple4D) -> Shape {
        Self::new(ShapeType::SmoothTriangle(
            SmoothTriangleInfo::new(p1, p2, p3, n1, n2, n3)
        ))
    }

    pub(crate) fn from_triangle(info: TriangleInfo) -> Shape {
        Self::new(ShapeType::Triangle(info))
    }

    pub(crate) fn from_smooth_triangle(info: SmoothTriangleInfo) -> Shape {
        Self::new(ShapeType::SmoothTriangle(info))
    }

    /// Creates an empty group.
    pub fn group() -> Shape {
        Self::new(ShapeType::Group(Vec::new()))
    }

    /// Creates a group holding `children`.
    pub fn group_of(children: Vec<Shape>) -> Shape {
        let mut g = Self::group();
        for child in children {
            g.add_child(child);
        }

        g
    }

    pub fn csg(op: CsgOperation, left: Shape, right: Shape) -> Shape {
        let mut c = Self::new(
            ShapeType::Csg(op, Box::new(left), Box::new(right))
        );

        c.propagate_world_transform(Matrix4D::identity());
        c
    }

    pub fn csg_union(left: Shape, right: Shape) -> Shape {
        Self::csg(CsgOperation::Union, left, right)
    }

    pub fn csg_intersection(left: Shape, right: Shape) -> Shape {
        Self::csg(CsgOperation::Intersection, left, right)
    }

    pub fn csg_difference(left: Shape, right: Shape) -> Shape {
        Self::csg(CsgOperation::Difference, left, right)
    }

    pub fn ty(&self) -> &ShapeType {
        &self.ty
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the transform and refreshes every cached matrix in this subtree.
    ///
    /// Only root shapes can be re-transformed; children are reachable
    /// through shared references alone once adopted.
    ///
    /// Panics if `transform` is singular.
    pub fn set_transform(&mut self, transform: Matrix4D) {
        self.inverse = transform.inverse()
            .expect("shape transforms must be invertible");
        self.transform = transform;

        self.propagate_world_transform(Matrix4D::identity());
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Shape {
        self.set_transform(transform);
        self
    }

    /// Sets the material on this shape and, for containers, on every shape
    /// beneath it.
    pub fn set_material(&mut self, material: Material) {
        match self.ty {
            ShapeType::Group(ref mut children) => {
                for child in children.iter_mut() {
                    child.set_material(material.clone());
                }
            },
            ShapeType::Csg(_, ref mut left, ref mut right) => {
                left.set_material(material.clone());
                right.set_material(material.clone());
            },
            _ => (),
        }

        self.material = material;
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.set_material(material);
        self
    }

    pub fn with_shadow(mut self, casts_shadow: bool) -> Shape {
        self.casts_shadow = casts_shadow;
        self
    }

    /// Pushes the product of all ancestor transforms down the subtree.
    ///
    /// `parent_inverse` is the inverse of that product; the inverses are
    /// chained rather than recomputed so a deep tree never inverts a long
    /// matrix product.
    fn propagate_world_transform(&mut self, parent_inverse: Matrix4D) {
        self.world_inverse = self.inverse * parent_inverse;
        self.world_inverse_transpose = self.world_inverse.transposition();

        let world_inverse = self.world_inverse;
        match self.ty {
            ShapeType::Group(ref mut children) => {
                for child in children.iter_mut() {
                    child.propagate_world_transform(world_inverse);
                }
            },
            ShapeType::Csg(_, ref mut left, ref mut right) => {
                left.propagate_world_transform(world_inverse);
                right.propagate_world_transform(world_inverse);
            },
            _ => (),
        }
    }

    /// Moves `child` into this group.
    ///
    /// Panics if `self` is not a group.
    pub fn add_child(&mut self, mut child: Shape) {
        child.propagate_world_transform(self.world_inverse);

        match self.ty {
            ShapeType::Group(ref mut children) => {
                self.bounds.merge(&child.parent_space_bounds());
                children.push(child);
            },
            _ => panic!("cannot add a child to a non-group shape"),
        }
    }

    /// The shapes directly inside this group, if it is one.
    pub fn children(&self) -> Option<&[Shape]> {
        match self.ty {
            ShapeType::Group(ref children) => Some(children.as_slice()),
            _ => None,
        }
    }

    /// The operation and operands of a CSG shape.
    pub fn operands(&self) -> Option<(&Shape, &Shape)> {
        match self.ty {
            ShapeType::Csg(_, ref left, ref right) => Some((&**left, &**right)),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<CsgOperation> {
        match self.ty {
            ShapeType::Csg(op, _, _) => Some(op),
            _ => None,
        }
    }

    /// Whether `other` is this very shape or lives somewhere beneath it.
    ///
    /// Membership is by identity, not by value.
    pub fn includes(&self, other: &Shape) -> bool {
        match self.ty {
            ShapeType::Group(ref children)
                => children.iter().any(|c| c.includes(other)),
            ShapeType::Csg(_, ref left, ref right)
                => left.includes(other) || right.includes(other),
            _ => std::ptr::eq(self, other),
        }
    }

    /// Bounds in object space.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Bounds in the space of whatever contains this shape.
    pub fn parent_space_bounds(&self) -> Bounds {
        self.bounds.transform(&self.transform)
    }

    fn compute_bounds(&self) -> Bounds {
        match self.ty {
            ShapeType::Sphere | ShapeType::Cube => Bounds::unit(),
            ShapeType::Plane => Bounds::new(
                Tuple4D::point(f64::NEG_INFINITY, 0.0, f64::NEG_INFINITY),
                Tuple4D::point(f64::INFINITY, 0.0, f64::INFINITY),
            ),
            ShapeType::Cylinder(ref e) => Bounds::new(
                Tuple4D::point(-1.0, e.minimum, -1.0),
                Tuple4D::point(1.0, e.maximum, 1.0),
            ),
            ShapeType::Cone(ref e) => {
                let limit = e.minimum.abs().max(e.maximum.abs());
                Bounds::new(
                    Tuple4D::point(-limit, e.minimum, -limit),
                    Tuple4D::point(limit, e.maximum, limit),
                )
            },
            ShapeType::Triangle(ref ti) => ti.bounds(),
            ShapeType::SmoothTriangle(ref sti) => sti.triangle.bounds(),
            ShapeType::Group(ref children) => {
                let mut b = Bounds::empty();
                for child in children.iter() {
                    b.merge(&child.parent_space_bounds());
                }

                b
            },
            ShapeType::Csg(_, ref left, ref right) => {
                let mut b = left.parent_space_bounds();
                b.merge(&right.parent_space_bounds());
                b
            },
        }
    }

    /// Converts a world-space point into this shape's object space.
    pub fn world_to_object(&self, point: Tuple4D) -> Tuple4D {
        self.world_inverse * point
    }

    /// Converts an object-space normal into a normalized world-space one.
    pub fn normal_to_world(&self, normal: Tuple4D) -> Tuple4D {
        let mut n = self.world_inverse_transpose * normal;
        n.w = 0.0;
        n.normalize()
    }

    /// Intersects a world (or parent) space ray with this shape.
    pub fn intersect(&self, ray: &Ray4D) -> Intersections {
        self.local_intersect(&ray.transform(&self.inverse))
    }

    /// The world-space surface normal at `world_point`.
    ///
    /// `hit` supplies the barycentric coordinates smooth triangles need.
    pub fn normal_at(&self, world_point: Tuple4D, hit: &Intersection)
        -> Tuple4D {
        let local_point = self.world_to_object(world_point);
        let local_normal = self.local_normal_at(&local_point, hit);

        self.normal_to_world(local_normal)
    }

    /// Whether anything shadow-casting in this subtree lies on `ray` between
    /// `EPSILON` and `distance`.
    pub fn has_intersection_before(&self, ray: &Ray4D, distance: f64) -> bool {
        if !self.casts_shadow {
            return false;
        }

        let local = ray.transform(&self.inverse);
        let in_range = |t: f64| t >= EPSILON && t < distance;

        match self.ty {
            ShapeType::Group(ref children) => {
                self.bounds.intersects(&local)
                    && children.iter()
                        .any(|c| c.has_intersection_before(&local, distance))
            },

            // The surviving surface of a CSG depends on both operands, so
            // the whole filtered list is needed.
            ShapeType::Csg(..) => self.local_intersect(&local).iter()
                .any(|i| i.what.casts_shadow && in_range(i.t)),

            _ => self.local_intersect(&local).iter().any(|i| in_range(i.t)),
        }
    }

    /// Intersects a ray already in object space.
    pub(crate) fn local_intersect(&self, ray: &Ray4D) -> Intersections {
        let hits = |ts: Vec<f64>| Intersections::from(
            ts.into_iter()
                .map(|t| Intersection::new(t, self))
                .collect::<Vec<_>>()
        );

        match self.ty {
            ShapeType::Sphere => match geometry::sphere_hits(ray) {
                Some((t0, t1)) => hits(vec![t0, t1]),
                None => Intersections::new(),
            },
            ShapeType::Plane => match geometry::plane_hit(ray) {
                Some(t) => hits(vec![t]),
                None => Intersections::new(),
            },
            ShapeType::Cube => match geometry::cube_hits(ray) {
                Some((t0, t1)) => hits(vec![t0, t1]),
                None => Intersections::new(),
            },
            ShapeType::Cylinder(ref e) => hits(geometry::cylinder_hits(ray, e)),
            ShapeType::Cone(ref e) => hits(geometry::cone_hits(ray, e)),
            ShapeType::Triangle(ref ti) => match ti.intersect(ray) {
                Some((t, _, _)) => hits(vec![t]),
                None => Intersections::new(),
            },
            ShapeType::SmoothTriangle(ref sti) => {
                match sti.triangle.intersect(ray) {
                    Some((t, u, v))
                        => vec![Intersection::new_uv(t, self, u, v)].into(),
                    None => Intersections::new(),
                }
            },
            ShapeType::Group(ref children) => {
                self.intersect_group(children, ray)
            },
            ShapeType::Csg(op, ref left, ref right) => {
                self.intersect_csg(op, left, right, ray)
            },
        }
    }

    fn intersect_group<'a>(&'a self, children: &'a [Shape], ray: &Ray4D)
        -> Intersections<'a> {
        // Nothing inside can be hit if the box around it is missed.
        if children.is_empty() || !self.bounds.intersects(ray) {
            return Intersections::new();
        }

        Intersections::aggregate(
            children.iter().map(|c| c.intersect(ray)).collect()
        )
    }

    fn intersect_csg<'a>(&'a self, op: CsgOperation, left: &'a Shape,
        right: &'a Shape, ray: &Ray4D) -> Intersections<'a> {
        if !self.bounds.intersects(ray) {
            return Intersections::new();
        }

        let all = Intersections::aggregate(
            vec![left.intersect(ray), right.intersect(ray)]
        );

        op.filter_intersections(left, all)
    }

    /// Obtains the object-space normal at an object-space point.
    fn local_normal_at(&self, at: &Tuple4D, hit: &Intersection) -> Tuple4D {
        match self.ty {
            ShapeType::Sphere => Tuple4D { w: 0.0, ..*at },
            ShapeType::Plane => Tuple4D::vector(0.0, 1.0, 0.0),
            ShapeType::Cube => geometry::cube_normal(at),
            ShapeType::Cylinder(ref e) => geometry::cylinder_normal(at, e),
            ShapeType::Cone(ref e) => geometry::cone_normal(at, e),
            ShapeType::Triangle(ref ti) => ti.normal,
            ShapeType::SmoothTriangle(ref sti) => match hit.uv {
                Some((u, v)) => sti.normal_at(u, v),
                None => sti.triangle.normal,
            },

            // Records only ever point at primitives.
            ShapeType::Group(_) | ShapeType::Csg(..) => unreachable!(
                "normals are never computed on groups or CSG shapes"
            ),
        }
    }

    /// Subdivides groups into a bounding volume hierarchy.
    ///
    /// A group with more than `threshold` children is split at the midplane
    /// of its longest axis: children that fit entirely on one side move into
    /// a new sub-group, children straddling the plane stay put. Every child
    /// (and both operands of a CSG shape) is then divided in turn.
    pub fn divide(&mut self, threshold: usize) {
        if self.children().map_or(false, |c| c.len() > threshold) {
            self.partition_into_subgroups();
        }

        match self.ty {
            ShapeType::Group(ref mut children) => {
                for child in children.iter_mut() {
                    child.divide(threshold);
                }
            },
            ShapeType::Csg(_, ref mut left, ref mut right) => {
                left.divide(threshold);
                right.divide(threshold);
            },
            _ => (),
        }
    }

    /// Splits the box around the children with finite bounds, so planes and
    /// other unbounded children do not stop the rest being partitioned. The
    /// unbounded ones always stay in this group.
    fn partition_into_subgroups(&mut self) {
        let children = match self.ty {
            ShapeType::Group(ref mut children) => std::mem::take(children),
            _ => return,
        };
        let total = children.len();

        let mut finite = Bounds::empty();
        for b in children.iter().map(Shape::parent_space_bounds) {
            if b.is_finite() {
                finite.merge(&b);
            }
        }
        let (left_bounds, right_bounds) = finite.split();

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut remaining = Vec::new();

        for child in children {
            let b = child.parent_space_bounds();
            if left_bounds.contains_bounds(&b) {
                left.push(child);
            } else if right_bounds.contains_bounds(&b) {
                right.push(child);
            } else {
                remaining.push(child);
            }
        }

        // A flat box puts everything on one side; splitting again would
        // never terminate.
        if left.len() == total || right.len() == total {
            remaining = if left.is_empty() { right } else { left };
            left = Vec::new();
            right = Vec::new();
        }

        self.bounds = Bounds::empty();
        for child in remaining {
            self.add_child(child);
        }
        if !left.is_empty() {
            self.add_child(Shape::group_of(left));
        }
        if !right.is_empty() {
            self.add_child(Shape::group_of(right));
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn extent(f: &mut fmt::Formatter, name: &str, e: &Extent) -> fmt::Result {
            write!(f, "{} [{}, {}]{}", name, e.minimum, e.maximum,
                if e.closed { " closed" } else { "" })
        }

        match self.ty {
            ShapeType::Sphere => write!(f, "sphere"),
            ShapeType::Plane => write!(f, "plane"),
            ShapeType::Cube => write!(f, "cube"),
            ShapeType::Cylinder(ref e) => extent(f, "cylinder", e),
            ShapeType::Cone(ref e) => extent(f, "cone", e),
            ShapeType::Triangle(ref ti)
                => write!(f, "triangle {} {} {}", ti.p1, ti.p2, ti.p3),
            ShapeType::SmoothTriangle(ref sti) => write!(f,
                "smooth triangle {} {} {}",
                sti.triangle.p1, sti.triangle.p2, sti.triangle.p3
            ),
            ShapeType::Group(ref children) => {
                write!(f, "group [")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, "]")
            },
            ShapeType::Csg(op, ref left, ref right)
                => write!(f, "{} ({}, {})", op, left, right),
        }
    }
}

#[cfg(test)]
use std::f64::consts::PI;

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray4D {
    Ray4D::new(
        Tuple4D::point(origin.0, origin.1, origin.2),
        Tuple4D::vector(direction.0, direction.1, direction.2),
    )
}

#[cfg(test)]
fn ts(xs: &Intersections) -> Vec<f64> {
    xs.iter().map(|i| i.t).collect()
}

#[test]
fn ray_intersects_sphere_at_two_points() {
    let s = Shape::sphere();
    let xs = s.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)));

    assert_eq!(ts(&xs), vec![4.0, 6.0]);
    assert!(std::ptr::eq(xs[0].what, &s));
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = Shape::sphere();
    let xs = s.intersect(&ray((0.0, 1.0, -5.0), (0.0, 0.0, 1.0)));

    assert_eq!(ts(&xs), vec![5.0, 5.0]);
}

#[test]
fn sphere_is_behind_ray() {
    let s = Shape::sphere();
    let xs = s.intersect(&ray((0.0, 0.0, 5.0), (0.0, 0.0, 1.0)));

    assert_eq!(ts(&xs), vec![-6.0, -4.0]);
}

#[test]
fn intersecting_scaled_and_translated_spheres() {
    let s = Shape::sphere().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    let xs = s.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)));
    assert_eq!(ts(&xs), vec![3.0, 7.0]);

    let s = Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let xs = s.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)));
    assert!(xs.is_empty());
}

#[test]
#[should_panic]
fn singular_transform_panics() {
    Shape::sphere().with_transform(Matrix4D::scaling(0.0, 1.0, 1.0));
}

#[test]
fn plane_intersections() {
    let p = Shape::plane();

    assert!(p.intersect(&ray((0.0, 10.0, 0.0), (0.0, 0.0, 1.0))).is_empty());
    assert!(p.intersect(&ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))).is_empty());

    let above = p.intersect(&ray((0.0, 1.0, 0.0), (0.0, -1.0, 0.0)));
    assert_eq!(ts(&above), vec![1.0]);

    let below = p.intersect(&ray((0.0, -1.0, 0.0), (0.0, 1.0, 0.0)));
    assert_eq!(ts(&below), vec![1.0]);
}

#[test]
fn normal_on_plane_is_constant() {
    let p = Shape::plane();
    let i = Intersection::new(0.0, &p);

    for point in [(0.0, 0.0, 0.0), (10.0, 0.0, -10.0), (-5.0, 0.0, 150.0)].iter() {
        let n = p.normal_at(Tuple4D::point(point.0, point.1, point.2), &i);
        assert_eq!(n, Tuple4D::vector(0.0, 1.0, 0.0));
    }
}

#[test]
fn normal_on_sphere() {
    let s = Shape::sphere();
    let i = Intersection::new(0.0, &s);
    let k = 3.0f64.sqrt() / 3.0;

    assert_eq!(s.normal_at(Tuple4D::point(1.0, 0.0, 0.0), &i),
        Tuple4D::vector(1.0, 0.0, 0.0));
    assert_eq!(s.normal_at(Tuple4D::point(0.0, 1.0, 0.0), &i),
        Tuple4D::vector(0.0, 1.0, 0.0));

    let n = s.normal_at(Tuple4D::point(k, k, k), &i);
    assert_eq!(n, Tuple4D::vector(k, k, k));
    assert_eq!(n, n.normalize());
}

#[test]
fn normal_on_translated_sphere() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(0.0, 1.0, 0.0));
    let n = s.normal_at(
        Tuple4D::point(0.0, 1.70711, -0.70711), &Intersection::new(0.0, &s)
    );

    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));
}

#[test]
fn normal_on_transformed_sphere() {
    let s = Shape::sphere().with_transform(
        Matrix4D::scaling(1.0, 0.5, 1.0) * Matrix4D::rotation_z(PI / 5.0)
    );
    let half = 2.0f64.sqrt() / 2.0;
    let n = s.normal_at(
        Tuple4D::point(0.0, half, -half), &Intersection::new(0.0, &s)
    );

    assert_eq!(n, Tuple4D::vector(0.0, 0.97014, -0.24254));
}

#[test]
fn ray_intersects_cube() {
    let c = Shape::cube();

    let xs = c.intersect(&ray((5.0, 0.5, 0.0), (-1.0, 0.0, 0.0)));
    assert_eq!(ts(&xs), vec![4.0, 6.0]);

    let xs = c.intersect(&ray((0.0, 0.5, 0.0), (0.0, 0.0, 1.0)));
    assert_eq!(ts(&xs), vec![-1.0, 1.0]);

    let xs = c.intersect(&ray((-2.0, 0.0, 0.0), (0.2673, 0.5345, 0.8018)));
    assert!(xs.is_empty());
}

#[test]
fn creating_a_shape_group() {
    let g = Shape::group();

    assert_eq!(*g.transform(), Matrix4D::identity());
    assert_eq!(g.children().map(|c| c.len()), Some(0));
    assert!(g.bounds().is_empty());
}

#[test]
fn adding_a_child_to_a_group() {
    let mut g = Shape::group();
    let s = Shape::sphere();

    g.add_child(s.clone());

    let children = g.children().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0], s);
    assert!(g.includes(&children[0]));
    assert!(!g.includes(&s));
}

#[test]
#[should_panic]
fn adding_a_child_to_a_sphere_panics() {
    let mut s = Shape::sphere();
    s.add_child(Shape::cube());
}

#[test]
fn intersecting_ray_with_empty_group() {
    let g = Shape::group();
    assert!(g.intersect(&ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))).is_empty());
}

#[test]
fn intersecting_ray_with_nonempty_group() {
    let g = Shape::group_of(vec![
        Shape::sphere(),
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, -3.0)),
        Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)),
    ]);

    let xs = g.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)));
    let children = g.children().unwrap();

    assert_eq!(xs.len(), 4);
    assert!(std::ptr::eq(&children[1], xs[0].what));
    assert!(std::ptr::eq(&children[1], xs[1].what));
    assert!(std::ptr::eq(&children[0], xs[2].what));
    assert!(std::ptr::eq(&children[0], xs[3].what));
}

#[test]
fn intersecting_a_transformed_group() {
    let mut g = Shape::group();
    g.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    g.add_child(Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)));

    let xs = g.intersect(&ray((10.0, 0.0, -10.0), (0.0, 0.0, 1.0)));
    assert_eq!(xs.len(), 2);
}

#[test]
fn group_bounds_contain_transformed_children() {
    let s = Shape::sphere().with_transform(
        Matrix4D::translation(2.0, 5.0, -3.0) * Matrix4D::scaling(2.0, 2.0, 2.0)
    );
    let c = Shape::bounded_cylinder(-2.0, 2.0).with_transform(
        Matrix4D::translation(-4.0, -1.0, 4.0) * Matrix4D::scaling(0.5, 1.0, 0.5)
    );
    let g = Shape::group_of(vec![s, c]);

    assert_eq!(g.bounds().minimum, Tuple4D::point(-4.5, -3.0, -5.0));
    assert_eq!(g.bounds().maximum, Tuple4D::point(4.0, 7.0, 4.5));
}

#[test]
fn primitive_bounds() {
    let cone = Shape::bounded_cone(-5.0, 3.0);
    assert_eq!(cone.bounds().minimum, Tuple4D::point(-5.0, -5.0, -5.0));
    assert_eq!(cone.bounds().maximum, Tuple4D::point(5.0, 3.0, 5.0));

    let t = Shape::triangle(
        Tuple4D::point(-3.0, 7.0, 2.0),
        Tuple4D::point(6.0, 2.0, -4.0),
        Tuple4D::point(2.0, -1.0, -1.0),
    );
    assert_eq!(t.bounds().minimum, Tuple4D::point(-3.0, -1.0, -4.0));
    assert_eq!(t.bounds().maximum, Tuple4D::point(6.0, 7.0, 2.0));

    let p = Shape::plane().bounds();
    assert_eq!(p.minimum.x, f64::NEG_INFINITY);
    assert_eq!(p.maximum.z, f64::INFINITY);
    assert_eq!(p.minimum.y, 0.0);
}

#[test]
fn ray_missing_group_bounds_skips_children() {
    let g = Shape::group_of(vec![
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 10.0)),
    ]);

    assert!(g.intersect(&ray((0.0, 5.0, -5.0), (0.0, 0.0, 1.0))).is_empty());
    assert_eq!(g.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))).len(), 2);
}

#[test]
fn converting_a_point_from_world_to_object_space() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let g2 = Shape::group_of(vec![s])
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    let g1 = Shape::group_of(vec![g2])
        .with_transform(Matrix4D::rotation_y(PI / 2.0));

    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let p = s.world_to_object(Tuple4D::point(-2.0, 0.0, -10.0));

    assert_eq!(p, Tuple4D::point(0.0, 0.0, -1.0));
}

#[test]
fn converting_a_normal_from_object_to_world_space() {
    let mut g1 = Shape::group();
    g1.set_transform(Matrix4D::rotation_y(PI / 2.0));

    let mut g2 = Shape::group();
    g2.set_transform(Matrix4D::scaling(1.0, 2.0, 3.0));
    g2.add_child(Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)));

    g1.add_child(g2);

    let k = 3.0f64.sqrt() / 3.0;
    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let n = s.normal_to_world(Tuple4D::vector(k, k, k));

    assert_eq!(n, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn finding_the_normal_on_a_child_object() {
    let mut g2 = Shape::group();
    g2.set_transform(Matrix4D::scaling(1.0, 2.0, 3.0));
    g2.add_child(Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)));

    let mut g1 = Shape::group();
    g1.add_child(g2);

    // Transforming the outer group after adoption still reaches the leaf.
    g1.set_transform(Matrix4D::rotation_y(PI / 2.0));

    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let n = s.normal_at(
        Tuple4D::point(1.7321, 1.1547, -5.5774), &Intersection::new(0.0, s)
    );

    assert_eq!(n, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn triangle_normal_is_constant() {
    let t = Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    );
    let i = Intersection::new(0.0, &t);

    for p in [(0.0, 0.5, 0.0), (-0.5, 0.75, 0.0), (0.5, 0.25, 0.0)].iter() {
        assert_eq!(t.normal_at(Tuple4D::point(p.0, p.1, p.2), &i),
            Tuple4D::vector(0.0, 0.0, -1.0));
    }
}

#[test]
fn ray_strikes_a_triangle() {
    let t = Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    );

    let xs = t.intersect(&ray((0.0, 0.5, -2.0), (0.0, 0.0, 1.0)));
    assert_eq!(xs.len(), 1);
    assert!(crate::feq(xs[0].t, 2.0));
    assert_eq!(xs[0].uv, None);
}

#[test]
fn smooth_triangle_records_uv_and_interpolates_normal() {
    let s = Shape::smooth_triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
        Tuple4D::vector(-1.0, 0.0, 0.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
    );

    let xs = s.intersect(&ray((-0.2, 0.3, -2.0), (0.0, 0.0, 1.0)));
    let (u, v) = xs[0].uv.unwrap();
    assert!(crate::feq(u, 0.45));
    assert!(crate::feq(v, 0.25));

    let i = Intersection::new_uv(1.0, &s, 0.45, 0.25);
    assert_eq!(s.normal_at(Tuple4D::origin(), &i),
        Tuple4D::vector(-0.5547, 0.83205, 0.0));
}

#[test]
fn setting_a_group_material_reaches_children() {
    let mut g = Shape::group_of(vec![Shape::sphere(), Shape::cube()]);
    let m = Material { ambient: 1.0, ..Default::default() };

    g.set_material(m.clone());

    for child in g.children().unwrap() {
        assert_eq!(child.material, m);
    }
}

#[test]
fn shadow_queries_respect_distance_and_flag() {
    let s = Shape::sphere();
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));

    assert!(s.has_intersection_before(&r, 10.0));
    assert!(!s.has_intersection_before(&r, 3.0));

    let s = Shape::sphere().with_shadow(false);
    assert!(!s.has_intersection_before(&r, 10.0));

    let g = Shape::group_of(vec![Shape::sphere().with_shadow(false), Shape::cube()]);
    assert!(g.has_intersection_before(&r, 10.0));
}

#[test]
fn csg_shape_holds_operands_and_bounds() {
    let c = Shape::csg_union(
        Shape::sphere(),
        Shape::cube().with_transform(Matrix4D::translation(2.0, 3.0, 4.0)),
    );
    let (left, right) = c.operands().unwrap();

    assert_eq!(c.operation(), Some(CsgOperation::Union));
    assert_eq!(*left, Shape::sphere());
    assert!(c.includes(right));
    assert_eq!(c.bounds().minimum, Tuple4D::point(-1.0, -1.0, -1.0));
    assert_eq!(c.bounds().maximum, Tuple4D::point(3.0, 4.0, 5.0));
}

#[test]
fn dividing_a_group_partitions_its_children() {
    let s1 = Shape::sphere().with_transform(Matrix4D::translation(-2.0, -2.0, 0.0));
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(-2.0, 2.0, 0.0));
    let s3 = Shape::sphere().with_transform(Matrix4D::scaling(4.0, 4.0, 4.0));
    let mut g = Shape::group_of(vec![s1.clone(), s2.clone(), s3.clone()]);

    g.divide(1);

    let children = g.children().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], s3);

    let sub = children[1].children().unwrap();
    assert_eq!(sub.len(), 2);

    let left = sub[0].children().unwrap();
    let right = sub[1].children().unwrap();
    assert_eq!(left, &[s1][..]);
    assert_eq!(right, &[s2][..]);
}

#[test]
fn dividing_around_an_unbounded_child() {
    let floor = Shape::plane();
    let s1 = Shape::sphere().with_transform(Matrix4D::translation(-2.0, 0.0, 0.0));
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(2.0, 0.0, 0.0));
    let mut g = Shape::group_of(vec![floor.clone(), s1.clone(), s2.clone()]);

    g.divide(2);

    let children = g.children().unwrap();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], floor);
    assert_eq!(children[1].children().unwrap(), &[s1][..]);
    assert_eq!(children[2].children().unwrap(), &[s2][..]);
}

#[test]
fn dividing_a_small_group_leaves_it_alone() {
    let s1 = Shape::sphere().with_transform(Matrix4D::translation(-2.0, 0.0, 0.0));
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(2.0, 1.0, 0.0));
    let mut g = Shape::group_of(vec![s1.clone(), s2.clone()]);

    g.divide(2);
    assert_eq!(g.children().unwrap(), &[s1, s2][..]);
}

#[test]
fn dividing_coincident_children_terminates() {
    let mut g = Shape::group_of(vec![Shape::sphere(), Shape::sphere(), Shape::sphere()]);

    g.divide(1);
    assert_eq!(g.children().unwrap().len(), 3);
}

#[test]
fn divided_group_still_intersects_the_same() {
    let mut g = Shape::group();
    for i in 0..10 {
        let x = i as f64 * 3.0 - 15.0;
        g.add_child(Shape::sphere().with_transform(Matrix4D::translation(x, 0.0, 0.0)));
    }
    let r = ray((-50.0, 0.0, 0.0), (1.0, 0.0, 0.0));
    let before = ts(&g.intersect(&r));

    g.divide(2);
    assert_eq!(ts(&g.intersect(&r)), before);
    assert_eq!(before.len(), 20);
}

#[test]
fn display_describes_the_tree() {
    let g = Shape::group_of(vec![
        Shape::sphere(),
        Shape::csg_difference(Shape::cube(), Shape::capped_cylinder(0.0, 1.0)),
    ]);

    assert_eq!(format!("{}", g),
        "group [sphere, difference (cube, cylinder [0, 1] closed)]");
}
