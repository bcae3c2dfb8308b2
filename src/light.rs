use crate::color::Color;
use crate::pattern::Pattern;
use crate::tuple::Tuple4D;
use crate::shape::Shape;

/// A point light: a colour emitted from a single position.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Tuple4D,
}

impl PointLight {
    /// Creates a point light. `position` is coerced to a point.
    pub fn new(intensity: Color, mut position: Tuple4D) -> PointLight {
        position.w = 1.0;

        PointLight { intensity, position }
    }
}

/// Surface properties for the Phong reflection model, plus the optical
/// parameters used for reflection and refraction.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub transparency: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::white(),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            transparency: 0.0,
            refractive_index: 1.0,
        }
    }
}

impl Material {
    /// A clear, fully transparent material with the refractive index of
    /// glass.
    pub fn glass() -> Material {
        Material {
            transparency: 1.0,
            refractive_index: crate::consts::GLASS_RI,
            ..Default::default()
        }
    }

    /// Surface colour at a world-space point on `obj`.
    pub fn color_at(&self, obj: &Shape, point: Tuple4D) -> Color {
        match self.pattern {
            Some(ref pattern) => pattern.color_at_shape(obj, point),
            None => self.color,
        }
    }
}

/// The Phong contribution of a single light at a point.
///
/// Ambient light is always present; diffuse and specular terms are dropped
/// when the point is shadowed from `light`.
pub fn lighting(m: &Material, obj: &Shape, light: &PointLight,
    point: Tuple4D, eyev: Tuple4D, normalv: Tuple4D, in_shadow: bool) -> Color {
    let effective_color = m.color_at(obj, point) * light.intensity;
    let ambient = effective_color * m.ambient;

    if in_shadow {
        return ambient;
    }

    let lightv = (light.position - point).normalize();

    // Light on the far side of the surface.
    let light_dot_normal = lightv.dot(&normalv);
    if light_dot_normal < 0.0 {
        return ambient;
    }

    let diffuse = effective_color * m.diffuse * light_dot_normal;

    let reflectv = (-lightv).reflect(&normalv);
    let reflect_dot_eye = reflectv.dot(&eyev);

    let specular = if reflect_dot_eye <= 0.0 {
        Color::black()
    } else {
        light.intensity * m.specular * reflect_dot_eye.powf(m.shininess)
    };

    ambient + diffuse + specular
}

#[cfg(test)]
fn white_light(x: f64, y: f64, z: f64) -> PointLight {
    PointLight::new(Color::white(), Tuple4D::point(x, y, z))
}

#[test]
fn eye_between_light_and_surface() {
    let m = Material::default();
    let s = Shape::sphere();
    let position = Tuple4D::origin();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 0.0, -10.0);

    let res = lighting(&m, &s, &light, position, eyev, normalv, false);
    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_offset_45_degrees() {
    let m = Material::default();
    let s = Shape::sphere();
    let half = 2.0f64.sqrt() / 2.0;

    let eyev = Tuple4D::vector(0.0, half, -half);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 0.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::origin(), eyev, normalv, false);
    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn light_offset_45_degrees() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 10.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::origin(), eyev, normalv, false);
    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_in_path_of_reflection() {
    let m = Material::default();
    let s = Shape::sphere();
    let half = 2.0f64.sqrt() / 2.0;

    let eyev = Tuple4D::vector(0.0, -half, -half);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 10.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::origin(), eyev, normalv, false);
    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn light_behind_surface() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 0.0, 10.0);

    let res = lighting(&m, &s, &light, Tuple4D::origin(), eyev, normalv, false);
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn surface_in_shadow_keeps_ambient_only() {
    let m = Material::default();
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 0.0, -10.0);

    let res = lighting(&m, &s, &light, Tuple4D::origin(), eyev, normalv, true);
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_with_stripe_pattern() {
    let m = Material {
        pattern: Some(Pattern::stripe(Color::white(), Color::black())),
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,
        ..Default::default()
    };
    let s = Shape::sphere();

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = white_light(0.0, 0.0, -10.0);

    assert_eq!(
        lighting(&m, &s, &light, Tuple4D::point(0.9, 0.0, 0.0),
            eyev, normalv, false),
        Color::white()
    );
    assert_eq!(
        lighting(&m, &s, &light, Tuple4D::point(1.1, 0.0, 0.0),
            eyev, normalv, false),
        Color::black()
    );
}
