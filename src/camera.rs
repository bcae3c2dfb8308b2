use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::color::Color;
use crate::world::World;
use crate::canvas::Canvas;

/// Maps canvas pixels to rays in world space.
///
/// The canvas sits one unit in front of the eye. `transform` orients the
/// world relative to the camera (typically a view transformation); its
/// inverse is cached so pixel rays never invert a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    hsize: usize,
    vsize: usize,

    /// The angle describing "how much" the camera can see.
    field_of_view: f64,

    half_width: f64,
    half_height: f64,
    pixel_size: f64,

    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Camera {
    /// Panics if `transform` is singular.
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64,
        transform: Matrix4D) -> Camera {
        let half_view = (field_of_view / 2.0).tan();
        let aspect = (hsize as f64) / (vsize as f64);

        let (half_width, half_height) = if aspect >= 1.0 {
            (half_view, half_view / aspect)
        } else {
            (half_view * aspect, half_view)
        };

        let pixel_size = half_width * 2.0 / (hsize as f64);
        let inverse = transform.inverse()
            .expect("camera transforms must be invertible");

        Camera {
            hsize,
            vsize,
            field_of_view,
            half_width,
            half_height,
            pixel_size,
            transform,
            inverse,
        }
    }

    pub fn hsize(&self) -> usize {
        self.hsize
    }

    pub fn vsize(&self) -> usize {
        self.vsize
    }

    pub fn field_of_view(&self) -> f64 {
        self.field_of_view
    }

    /// The width of one pixel on the canvas, in world units.
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Panics if `transform` is singular.
    pub fn set_transform(&mut self, transform: Matrix4D) {
        self.inverse = transform.inverse()
            .expect("camera transforms must be invertible");
        self.transform = transform;
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Camera {
        self.set_transform(transform);
        self
    }

    /// The ray from the eye through the center of pixel `(px, py)`.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray4D {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The camera looks toward -z, so +x is to the *left*.
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        let pixel = self.inverse * Tuple4D::point(world_x, world_y, -1.0);
        let origin = self.inverse * Tuple4D::origin();
        let direction = (pixel - origin).normalize();

        Ray4D::new(origin, direction)
    }

    /// Traces a single pixel through `w`.
    pub fn color_at_pixel(&self, w: &World, px: usize, py: usize, depth: usize)
        -> Color {
        w.color_at(&self.ray_for_pixel(px, py), depth)
    }

    /// Renders `w` on the calling thread, row by row.
    pub fn render(&self, w: &World, depth: usize) -> Canvas {
        let mut image = Canvas::new(self.hsize, self.vsize);

        for y in 0..self.vsize {
            for x in 0..self.hsize {
                let color = self.color_at_pixel(w, x, y, depth);
                image.write_pixel(x, y, &color);
            }
        }

        image
    }
}

#[cfg(test)]
use std::f64::consts::PI;

#[test]
fn pixel_size_for_either_orientation() {
    let c = Camera::new(200, 125, PI / 2.0, Matrix4D::identity());
    assert!(crate::feq(c.pixel_size(), 0.01));

    let c = Camera::new(125, 200, PI / 2.0, Matrix4D::identity());
    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, PI / 2.0, Matrix4D::identity());
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, PI / 2.0, Matrix4D::identity());
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let c = Camera::new(201, 101, PI / 2.0, Matrix4D::identity())
        .with_transform(
            Matrix4D::rotation_y(PI / 4.0) * Matrix4D::translation(0.0, -2.0, 5.0)
        );
    let r = c.ray_for_pixel(100, 50);
    let half = 2.0f64.sqrt() / 2.0;

    assert_eq!(r.origin, Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction, Tuple4D::vector(half, 0.0, -half));
}

#[test]
fn ray_for_pixel_is_pure() {
    let c = Camera::new(11, 7, PI / 3.0, Matrix4D::translation(1.0, 2.0, 3.0));
    assert_eq!(c.ray_for_pixel(3, 4), c.ray_for_pixel(3, 4));
}

#[test]
#[should_panic]
fn singular_camera_transform_panics() {
    Camera::new(10, 10, PI / 2.0, Matrix4D::zero());
}

#[test]
fn render_world_with_camera() {
    let w = World::default();

    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);
    let c = Camera::new(11, 11, PI / 2.0, Matrix4D::view_transform(from, to, up));

    let image = c.render(&w, crate::consts::MAX_RECURSION_DEPTH);
    assert_eq!(image.read_pixel(5, 5), Some(Color::rgb(0.38066, 0.47583, 0.2855)));
}
