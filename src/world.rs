use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::light::{ PointLight, Material, lighting };
use crate::shape::Shape;
use crate::intersect::{ Intersections, IntersectionComputation };

/// Everything a ray can see: shapes, the lights falling on them and the
/// colour returned by rays that escape.
///
/// A world is built up front and only read while rendering, so it can be
/// shared by reference across render threads.
#[derive(Clone, Debug)]
pub struct World {
    pub objects: Vec<Shape>,
    pub lights: Vec<PointLight>,
    pub background: Color,
}

/// Two concentric spheres lit from the upper left, the standard fixture for
/// shading tests.
impl Default for World {
    fn default() -> World {
        let light = PointLight::new(
            Color::rgb(1.0, 1.0, 1.0),
            Tuple4D::point(-10.0, 10.0, -10.0)
        );

        let s1 = Shape::sphere().with_material(Material {
            color: Color::rgb(0.8, 1.0, 0.6),
            diffuse: 0.7,
            specular: 0.2,
            ..Default::default()
        });

        let s2 = Shape::sphere()
            .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5));

        World {
            objects: vec![s1, s2],
            lights: vec![light],
            background: Color::black(),
        }
    }
}

impl World {
    pub fn new() -> World {
        Default::default()
    }

    /// A world with no objects, no lights and a black background.
    pub fn empty() -> World {
        World {
            objects: Vec::new(),
            lights: Vec::new(),
            background: Color::black(),
        }
    }

    pub fn add_object(&mut self, shape: Shape) {
        self.objects.push(shape);
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Subdivides every group in the world; see `Shape::divide`.
    pub fn divide(&mut self, threshold: usize) {
        for obj in self.objects.iter_mut() {
            obj.divide(threshold);
        }
    }

    /// Intersects a ray against all objects, sorted by `t`.
    pub fn intersect(&self, r: &Ray4D) -> Intersections {
        Intersections::aggregate(
            self.objects.iter().map(|obj| obj.intersect(r)).collect()
        )
    }

    /// Whether anything casting a shadow sits between `p` and `light`.
    pub fn is_shadowed(&self, light: &PointLight, p: Tuple4D) -> bool {
        let v = light.position - p;
        let distance = v.magnitude();
        let r = Ray4D::new(p, v.normalize());

        self.objects.iter().any(|obj| obj.has_intersection_before(&r, distance))
    }

    /// The colour at a precomputed hit: direct light from every source plus
    /// whatever reflection and refraction contribute.
    pub fn shade_hit(&self, comps: &IntersectionComputation, remaining: usize)
        -> Color {
        let m = &comps.obj.material;

        let surface = self.lights.iter().fold(Color::black(), |acc, light| {
            acc + lighting(m, comps.obj, light,
                comps.over_point, comps.eyev, comps.normalv,
                self.is_shadowed(light, comps.over_point))
        });

        let reflected = self.reflected_color(comps, remaining);
        let refracted = self.refracted_color(comps, remaining);

        if m.reflective > 0.0 && m.transparency > 0.0 {
            let reflectance = comps.schlick();
            surface + reflected * reflectance + refracted * (1.0 - reflectance)
        } else {
            surface + reflected + refracted
        }
    }

    /// The colour seen along `r`. `remaining` bounds how many more times the
    /// ray may bounce or bend.
    pub fn color_at(&self, r: &Ray4D, remaining: usize) -> Color {
        let xs = self.intersect(r);

        match xs.hit() {
            None => self.background,
            Some(hit) => {
                let comps = IntersectionComputation::new(r, &hit, Some(&xs));
                self.shade_hit(&comps, remaining)
            },
        }
    }

    pub fn reflected_color(&self, comps: &IntersectionComputation,
        remaining: usize) -> Color {
        let reflective = comps.obj.material.reflective;
        if remaining == 0 || reflective == 0.0 {
            return Color::black();
        }

        let r = Ray4D::new(comps.over_point, comps.reflectv);
        self.color_at(&r, remaining - 1) * reflective
    }

    pub fn refracted_color(&self, comps: &IntersectionComputation,
        remaining: usize) -> Color {
        let transparency = comps.obj.material.transparency;
        if remaining == 0 || transparency == 0.0 {
            return Color::black();
        }

        // Snell's law, solved for the angle of the transmitted ray.
        let n_ratio = comps.n1 / comps.n2;
        let cos_i = comps.eyev.dot(&comps.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));

        // Total internal reflection.
        if sin2_t > 1.0 {
            return Color::black();
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        let direction = comps.normalv * (n_ratio * cos_i - cos_t)
            - comps.eyev * n_ratio;

        let r = Ray4D::new(comps.under_point, direction);
        self.color_at(&r, remaining - 1) * transparency
    }
}

#[cfg(test)]
use crate::intersect::Intersection;
#[cfg(test)]
use crate::consts::MAX_RECURSION_DEPTH;

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray4D {
    Ray4D::new(
        Tuple4D::point(origin.0, origin.1, origin.2),
        Tuple4D::vector(direction.0, direction.1, direction.2),
    )
}

#[test]
fn intersect_default_world_with_ray() {
    let w = World::default();
    let xs = w.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)));

    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![4.0, 4.5, 5.5, 6.0]);
}

#[test]
fn shading_a_cone_at_its_apex() {
    let mut w = World::empty();
    w.add_light(PointLight::new(Color::white(), Tuple4D::point(-10.0, 10.0, -10.0)));
    w.add_object(Shape::cone());

    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let ts: Vec<f64> = w.intersect(&r).iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![5.0, 5.0]);

    let c = w.color_at(&r, MAX_RECURSION_DEPTH);
    assert!([c.r, c.g, c.b].iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn shade_intersection_from_outside() {
    let w = World::default();
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));

    let i = Intersection::new(4.0, &w.objects[0]);
    let comps = IntersectionComputation::new(&r, &i, None);

    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_intersection_in_shadow() {
    let mut w = World::empty();
    w.add_light(PointLight::new(Color::white(), Tuple4D::point(0.0, 0.0, -10.0)));
    w.add_object(Shape::sphere());
    w.add_object(Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 10.0)));

    let r = ray((0.0, 0.0, 5.0), (0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i, None);

    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH), Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn every_light_contributes() {
    let mut w = World::default();
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let single = w.color_at(&r, MAX_RECURSION_DEPTH);

    let light = w.lights[0];
    w.add_light(light);
    let double = w.color_at(&r, MAX_RECURSION_DEPTH);

    assert_eq!(double, single * 2.0);
}

#[test]
fn color_when_ray_misses() {
    let w = World::default();
    assert_eq!(w.color_at(&ray((0.0, 0.0, -5.0), (0.0, 1.0, 0.0)), MAX_RECURSION_DEPTH),
        Color::black());

    let w = World { background: Color::rgb(0.2, 0.3, 0.4), ..World::default() };
    assert_eq!(w.color_at(&ray((0.0, 0.0, -5.0), (0.0, 1.0, 0.0)), MAX_RECURSION_DEPTH),
        Color::rgb(0.2, 0.3, 0.4));
}

#[test]
fn color_when_ray_hits() {
    let w = World::default();
    assert_eq!(w.color_at(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)), MAX_RECURSION_DEPTH),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn color_with_intersection_behind_ray() {
    let mut w = World::default();
    w.objects[0].material.ambient = 1.0;
    w.objects[1].material.ambient = 1.0;

    let c = w.color_at(&ray((0.0, 0.0, 0.75), (0.0, 0.0, -1.0)), MAX_RECURSION_DEPTH);
    assert_eq!(c, w.objects[1].material.color);
}

#[test]
fn shadows_in_the_default_world() {
    let w = World::default();
    let light = &w.lights[0];

    assert!(!w.is_shadowed(light, Tuple4D::point(0.0, 10.0, 0.0)));
    assert!(w.is_shadowed(light, Tuple4D::point(10.0, -10.0, 10.0)));
    assert!(!w.is_shadowed(light, Tuple4D::point(-20.0, 20.0, -20.0)));
    assert!(!w.is_shadowed(light, Tuple4D::point(-2.0, 2.0, -2.0)));
}

#[test]
fn shapes_can_opt_out_of_shadows() {
    let mut w = World::default();
    for obj in w.objects.iter_mut() {
        obj.casts_shadow = false;
    }

    assert!(!w.is_shadowed(&w.lights[0], Tuple4D::point(10.0, -10.0, 10.0)));
}

#[test]
fn reflected_color_for_nonreflective_material() {
    let mut w = World::default();
    w.objects[1].material.ambient = 1.0;

    let r = ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i, None);

    assert_eq!(w.reflected_color(&comps, MAX_RECURSION_DEPTH), Color::black());
}

#[cfg(test)]
fn world_with_reflective_floor() -> World {
    let mut w = World::default();
    w.add_object(Shape::plane()
        .with_material(Material { reflective: 0.5, ..Default::default() })
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)));

    w
}

#[test]
fn reflected_color_for_reflective_material() {
    let w = world_with_reflective_floor();
    let half = 2.0f64.sqrt() / 2.0;

    let r = ray((0.0, 0.0, -3.0), (0.0, -half, half));
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i, None);

    assert_eq!(w.reflected_color(&comps, MAX_RECURSION_DEPTH),
        Color::rgb(0.19032, 0.2379, 0.14274));
    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH),
        Color::rgb(0.87677, 0.92436, 0.82918));
    assert_eq!(w.reflected_color(&comps, 0), Color::black());
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    let mut w = World::empty();
    w.add_light(PointLight::new(Color::white(), Tuple4D::origin()));

    let mirror = Material { reflective: 1.0, ..Default::default() };
    w.add_object(Shape::plane()
        .with_material(mirror.clone())
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)));
    w.add_object(Shape::plane()
        .with_material(mirror)
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0)));

    let c = w.color_at(&ray((0.0, 0.0, 0.0), (0.0, 1.0, 0.0)), MAX_RECURSION_DEPTH);
    assert!(c.r > 0.0);
}

#[test]
fn refracted_color_of_opaque_surface_or_exhausted_depth() {
    let mut w = World::default();
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));

    {
        let xs = w.intersect(&r);
        let comps = IntersectionComputation::new(&r, &xs[0], Some(&xs));
        assert_eq!(w.refracted_color(&comps, MAX_RECURSION_DEPTH), Color::black());
    }

    w.objects[0].material.transparency = 1.0;
    w.objects[0].material.refractive_index = 1.5;

    let xs = w.intersect(&r);
    let comps = IntersectionComputation::new(&r, &xs[0], Some(&xs));
    assert_eq!(w.refracted_color(&comps, 0), Color::black());
}

#[test]
fn refracted_color_under_total_internal_reflection() {
    let mut w = World::default();
    w.objects[0].material.transparency = 1.0;
    w.objects[0].material.refractive_index = 1.5;

    let half = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, half), (0.0, 1.0, 0.0));
    let xs: Intersections = vec![
        Intersection::new(-half, &w.objects[0]),
        Intersection::new(half, &w.objects[0]),
    ].into();

    let comps = IntersectionComputation::new(&r, &xs[1], Some(&xs));
    assert_eq!(w.refracted_color(&comps, MAX_RECURSION_DEPTH), Color::black());
}

#[cfg(test)]
fn world_with_glass_floor(reflective: f64) -> World {
    let mut w = World::default();

    w.add_object(Shape::plane()
        .with_material(Material {
            reflective,
            transparency: 0.5,
            refractive_index: 1.5,
            ..Default::default()
        })
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)));

    w.add_object(Shape::sphere()
        .with_material(Material {
            color: Color::rgb(1.0, 0.0, 0.0),
            ambient: 0.5,
            ..Default::default()
        })
        .with_transform(Matrix4D::translation(0.0, -3.5, -0.5)));

    w
}

#[test]
fn shade_hit_with_transparent_material() {
    let w = world_with_glass_floor(0.0);
    let half = 2.0f64.sqrt() / 2.0;

    let r = ray((0.0, 0.0, -3.0), (0.0, -half, half));
    let xs: Intersections = vec![
        Intersection::new(2.0f64.sqrt(), &w.objects[2]),
    ].into();
    let comps = IntersectionComputation::new(&r, &xs[0], Some(&xs));

    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH),
        Color::rgb(0.93642, 0.68642, 0.68642));
}

#[test]
fn shade_hit_with_reflective_transparent_material() {
    let w = world_with_glass_floor(0.5);
    let half = 2.0f64.sqrt() / 2.0;

    let r = ray((0.0, 0.0, -3.0), (0.0, -half, half));
    let xs: Intersections = vec![
        Intersection::new(2.0f64.sqrt(), &w.objects[2]),
    ].into();
    let comps = IntersectionComputation::new(&r, &xs[0], Some(&xs));

    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH),
        Color::rgb(0.93391, 0.69643, 0.69243));
}

#[test]
fn dividing_the_world_keeps_its_image() {
    let mut w = World::empty();
    w.add_light(PointLight::new(Color::white(), Tuple4D::point(-10.0, 10.0, -10.0)));

    let mut g = Shape::group();
    for i in 0..8 {
        let x = i as f64 * 2.5 - 10.0;
        g.add_child(Shape::sphere().with_transform(Matrix4D::translation(x, 0.0, 0.0)));
    }
    w.add_object(g);

    let r = ray((-5.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let before = w.color_at(&r, MAX_RECURSION_DEPTH);

    w.divide(2);
    assert_eq!(w.color_at(&r, MAX_RECURSION_DEPTH), before);
}
