use crate::feq;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::shape::Shape;

#[derive(Clone, Debug, PartialEq)]
pub enum PatternType {
    /// A single colour everywhere.
    Solid(Color),

    /// Alternates between two colours with `floor(x)`.
    Stripe(Color, Color),

    /// Linear blend from the first colour to the second across each unit of X.
    Gradient(Color, Color),

    /// Concentric rings in the XZ plane.
    Ring(Color, Color),

    /// A 3-D checkerboard of unit cubes.
    Checkers(Color, Color),

    /// The average of two nested patterns, each under its own transform.
    Blended(Box<Pattern>, Box<Pattern>),
}

/// A colour generator over points in pattern space.
///
/// Every pattern carries its own transform, independent of the shape it is
/// applied to. A world-space point reaches pattern space by passing through
/// the shape's parent chain, then the shape, then the pattern's inverse.
///
/// ```
/// # use whitted::pattern::Pattern;
/// # use whitted::color::Color;
/// # use whitted::tuple::Tuple4D;
/// let p = Pattern::stripe(Color::white(), Color::black());
/// assert_eq!(p.color_at(Tuple4D::point(1.5, 0.0, 0.0)), Color::black());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub ty: PatternType,

    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Pattern {
    fn new(ty: PatternType) -> Pattern {
        Pattern {
            ty,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    pub fn solid(c: Color) -> Pattern {
        Self::new(PatternType::Solid(c))
    }

    pub fn stripe(a: Color, b: Color) -> Pattern {
        Self::new(PatternType::Stripe(a, b))
    }

    pub fn gradient(a: Color, b: Color) -> Pattern {
        Self::new(PatternType::Gradient(a, b))
    }

    pub fn ring(a: Color, b: Color) -> Pattern {
        Self::new(PatternType::Ring(a, b))
    }

    pub fn checkers(a: Color, b: Color) -> Pattern {
        Self::new(PatternType::Checkers(a, b))
    }

    pub fn blended(a: Pattern, b: Pattern) -> Pattern {
        Self::new(PatternType::Blended(Box::new(a), Box::new(b)))
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the transform and recomputes the cached inverse.
    ///
    /// Panics if `transform` is singular.
    pub fn set_transform(&mut self, transform: Matrix4D) {
        self.inverse = transform.inverse()
            .expect("pattern transforms must be invertible");
        self.transform = transform;
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Pattern {
        self.set_transform(transform);
        self
    }

    /// Colour at a point already in this pattern's space.
    pub fn color_at(&self, p: Tuple4D) -> Color {
        let alternate = |a: &Color, b: &Color, v: f64| {
            if feq(v.floor().rem_euclid(2.0), 0.0) { *a } else { *b }
        };

        match self.ty {
            PatternType::Solid(c) => c,
            PatternType::Stripe(ref a, ref b) => alternate(a, b, p.x),
            PatternType::Gradient(a, b) => a + (b - a) * (p.x - p.x.floor()),
            PatternType::Ring(ref a, ref b)
                => alternate(a, b, (p.x.powi(2) + p.z.powi(2)).sqrt()),
            PatternType::Checkers(ref a, ref b)
                => alternate(a, b, p.x.floor() + p.y.floor() + p.z.floor()),
            PatternType::Blended(ref l, ref r) => Color::average(
                &l.color_at_object(p),
                &r.color_at_object(p),
            ),
        }
    }

    /// Colour at a point in the space of whatever this pattern is attached
    /// to; the pattern's own transform is applied first.
    pub fn color_at_object(&self, object_point: Tuple4D) -> Color {
        self.color_at(self.inverse * object_point)
    }

    /// Colour at a world-space point on `shape`.
    pub fn color_at_shape(&self, shape: &Shape, world_point: Tuple4D) -> Color {
        self.color_at_object(shape.world_to_object(world_point))
    }
}

#[cfg(test)]
fn white() -> Color {
    Color::white()
}

#[cfg(test)]
fn black() -> Color {
    Color::black()
}

#[test]
fn stripe_alternates_along_x_only() {
    let pattern = Pattern::stripe(white(), black());

    assert_eq!(pattern.color_at(Tuple4D::point(0.0, 1.0, 0.0)), white());
    assert_eq!(pattern.color_at(Tuple4D::point(0.0, 0.0, 2.0)), white());
    assert_eq!(pattern.color_at(Tuple4D::point(0.9, 0.0, 0.0)), white());
    assert_eq!(pattern.color_at(Tuple4D::point(1.0, 0.0, 0.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(-0.1, 0.0, 0.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(-1.0, 0.0, 0.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(-1.1, 0.0, 0.0)), white());
}

#[test]
fn gradient_interpolates() {
    let pattern = Pattern::gradient(white(), black());

    assert_eq!(pattern.color_at(Tuple4D::point(0.25, 0.0, 0.0)),
        Color::rgb(0.75, 0.75, 0.75));
    assert_eq!(pattern.color_at(Tuple4D::point(0.75, 0.0, 0.0)),
        Color::rgb(0.25, 0.25, 0.25));
}

#[test]
fn ring_extends_in_x_and_z() {
    let pattern = Pattern::ring(white(), black());

    assert_eq!(pattern.color_at(Tuple4D::point(0.0, 0.0, 0.0)), white());
    assert_eq!(pattern.color_at(Tuple4D::point(1.0, 0.0, 0.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(0.0, 0.0, 1.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(0.708, 0.0, 0.708)), black());
}

#[test]
fn checkers_repeat_in_every_dimension() {
    let pattern = Pattern::checkers(white(), black());

    assert_eq!(pattern.color_at(Tuple4D::point(0.99, 0.0, 0.0)), white());
    assert_eq!(pattern.color_at(Tuple4D::point(1.01, 0.0, 0.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(0.0, 1.01, 0.0)), black());
    assert_eq!(pattern.color_at(Tuple4D::point(0.0, 0.0, 1.01)), black());
}

#[test]
fn blended_averages_nested_patterns() {
    let a = Pattern::solid(white());
    let b = Pattern::stripe(black(), white())
        .with_transform(Matrix4D::scaling(2.0, 1.0, 1.0));
    let pattern = Pattern::blended(a, b);

    // 1.5 falls in the first stripe once scaled down by 2.
    assert_eq!(pattern.color_at(Tuple4D::point(1.5, 0.0, 0.0)),
        Color::rgb(0.5, 0.5, 0.5));
    assert_eq!(pattern.color_at(Tuple4D::point(2.5, 0.0, 0.0)), white());
}

#[test]
fn pattern_follows_object_and_pattern_transforms() {
    let shape = Shape::sphere().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    let pattern = Pattern::stripe(white(), black())
        .with_transform(Matrix4D::translation(0.5, 0.0, 0.0));

    assert_eq!(pattern.color_at_shape(&shape, Tuple4D::point(2.5, 0.0, 0.0)),
        white());
    assert_eq!(pattern.color_at_shape(&shape, Tuple4D::point(3.5, 0.0, 0.0)),
        black());
}
