//! Scene description files.
//!
//! A scene is a JSON document naming a camera, lights, shapes and optional
//! render settings:
//!
//! ```json
//! {
//!     "camera": {
//!         "width": 320, "height": 200, "field_of_view": 1.0472,
//!         "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0]
//!     },
//!     "lights": [ { "position": [-10, 10, -10], "intensity": [1, 1, 1] } ],
//!     "shapes": [
//!         {
//!             "type": "sphere",
//!             "transform": [ { "scale": [0.5, 0.5, 0.5] }, { "translate": [0, 1, 0] } ],
//!             "material": { "color": [1, 0.2, 1], "reflective": 0.3 }
//!         }
//!     ],
//!     "render": { "threads": 4, "order": "hilbert" }
//! }
//! ```
//!
//! Transforms are listed in the order they apply to the shape. OBJ paths
//! are relative to the scene file.

use std::fs;
use std::f64::consts::PI;
use std::path::{ Path, PathBuf };

use log::{ debug, warn };
use serde::Deserialize;

use crate::consts::EPSILON;
use crate::error::{ Error, Result };
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::color::Color;
use crate::pattern::Pattern;
use crate::light::{ Material, PointLight };
use crate::geometry::{ SmoothTriangleInfo, TriangleInfo };
use crate::shape::Shape;
use crate::csg::CsgOperation;
use crate::obj::ObjParser;
use crate::world::World;
use crate::camera::Camera;
use crate::parallel::RenderSettings;

/// Everything needed to render one image.
pub struct Scene {
    pub world: World,
    pub camera: Camera,
    pub settings: RenderSettings,
}

impl Scene {
    /// Builds a scene from JSON text. `base` is the directory OBJ paths are
    /// resolved against.
    pub fn parse(text: &str, base: &Path) -> Result<Scene> {
        let json: SceneJson = serde_json::from_str(text)?;
        json.build(base)
    }

    /// Reads and builds the scene file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        Scene::parse(&text, base)
    }

    /// Splits large groups using `settings.divide_threshold`, if it is set.
    pub fn subdivide(&mut self) {
        let threshold = self.settings.divide_threshold;
        if threshold > 0 {
            debug!("subdividing groups larger than {}", threshold);
            self.world.divide(threshold);
        }
    }
}

type Triple = [f64; 3];

fn point(p: Triple) -> Tuple4D {
    Tuple4D::point(p[0], p[1], p[2])
}

fn vector(v: Triple) -> Tuple4D {
    Tuple4D::vector(v[0], v[1], v[2])
}

fn color(c: Triple) -> Color {
    Color::rgb(c[0], c[1], c[2])
}

fn invalid<T>(message: String) -> Result<T> {
    Err(Error::Scene(message))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneJson {
    camera: CameraJson,

    #[serde(default)]
    lights: Vec<LightJson>,

    #[serde(default)]
    shapes: Vec<ShapeJson>,

    background: Option<Triple>,

    #[serde(default)]
    render: RenderSettings,
}

impl SceneJson {
    fn build(self, base: &Path) -> Result<Scene> {
        let camera = self.camera.build()?;

        let mut world = World::empty();
        if let Some(background) = self.background {
            world.background = color(background);
        }

        if self.lights.is_empty() {
            warn!("scene has no lights; only the background will show");
        }
        for light in self.lights {
            world.add_light(PointLight::new(color(light.intensity), point(light.position)));
        }

        for shape in self.shapes {
            world.add_object(shape.build(base)?);
        }

        debug!("built scene: {} shapes, {} lights, {}x{} camera",
            world.objects.len(), world.lights.len(), camera.hsize(), camera.vsize());

        Ok(Scene { world, camera, settings: self.render })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CameraJson {
    width: usize,
    height: usize,

    /// Radians.
    field_of_view: f64,

    from: Triple,
    to: Triple,
    up: Triple,
}

impl CameraJson {
    fn build(&self) -> Result<Camera> {
        if self.width == 0 || self.height == 0 {
            return invalid(format!("camera size {}x{} is empty", self.width, self.height));
        }

        if !(self.field_of_view > 0.0 && self.field_of_view < PI) {
            return invalid(format!("field of view {} is outside (0, pi)", self.field_of_view));
        }

        let (from, to, up) = (point(self.from), point(self.to), vector(self.up));
        let forward = to - from;

        // `view_transform` normalizes both of these.
        if forward.magnitude() < EPSILON || up.magnitude() < EPSILON {
            return invalid("camera needs distinct from/to points and a non-zero up vector".into());
        }
        if forward.normalize().cross(&up.normalize()).magnitude() < EPSILON {
            return invalid("camera up vector is parallel to the view direction".into());
        }

        let view = Matrix4D::view_transform(from, to, up);
        if view.inverse().is_none() {
            return invalid("camera view transform is singular".into());
        }

        Ok(Camera::new(self.width, self.height, self.field_of_view, view))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LightJson {
    position: Triple,
    intensity: Triple,
}

/// One step of a transform list.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformJson {
    Translate(Triple),
    Scale(Triple),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),

    /// xy, xz, yx, yz, zx, zy.
    Shear([f64; 6]),

    /// Row-major.
    Matrix([f64; 16]),
}

impl TransformJson {
    fn matrix(&self) -> Matrix4D {
        match *self {
            TransformJson::Translate(t) => Matrix4D::translation(t[0], t[1], t[2]),
            TransformJson::Scale(s) => Matrix4D::scaling(s[0], s[1], s[2]),
            TransformJson::RotateX(r) => Matrix4D::rotation_x(r),
            TransformJson::RotateY(r) => Matrix4D::rotation_y(r),
            TransformJson::RotateZ(r) => Matrix4D::rotation_z(r),
            TransformJson::Shear(s) => Matrix4D::shearing(s[0], s[1], s[2], s[3], s[4], s[5]),
            TransformJson::Matrix(m) => m.into(),
        }
    }
}

/// Folds a transform list into one matrix; the first entry applies first.
fn compose(steps: &[TransformJson], what: &str) -> Result<Matrix4D> {
    let m = steps.iter()
        .fold(Matrix4D::identity(), |m, step| step.matrix() * m);

    match m.inverse() {
        Some(_) => Ok(m),
        None => invalid(format!("{} transform is not invertible", what)),
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialJson {
    color: Option<Triple>,
    pattern: Option<PatternJson>,

    ambient: Option<f64>,
    diffuse: Option<f64>,
    specular: Option<f64>,
    shininess: Option<f64>,

    reflective: Option<f64>,
    transparency: Option<f64>,
    refractive_index: Option<f64>,
}

impl MaterialJson {
    fn build(self) -> Result<Material> {
        let mut m = Material::default();

        if let Some(c) = self.color {
            m.color = color(c);
        }
        if let Some(pattern) = self.pattern {
            m.pattern = Some(pattern.build()?);
        }

        let scalars = [
            (self.ambient, &mut m.ambient, "ambient"),
            (self.diffuse, &mut m.diffuse, "diffuse"),
            (self.specular, &mut m.specular, "specular"),
            (self.shininess, &mut m.shininess, "shininess"),
            (self.reflective, &mut m.reflective, "reflective"),
            (self.transparency, &mut m.transparency, "transparency"),
        ];
        for (value, slot, name) in scalars {
            if let Some(v) = value {
                if !(v >= 0.0 && v.is_finite()) {
                    return invalid(format!("material {} must be a non-negative number, got {}", name, v));
                }
                *slot = v;
            }
        }

        if let Some(ri) = self.refractive_index {
            if !(ri > 0.0 && ri.is_finite()) {
                return invalid(format!("refractive index must be positive, got {}", ri));
            }
            m.refractive_index = ri;
        }

        Ok(m)
    }
}

#[derive(Deserialize)]
struct PatternJson {
    #[serde(flatten)]
    kind: PatternKindJson,

    #[serde(default)]
    transform: Vec<TransformJson>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PatternKindJson {
    Solid { color: Triple },
    Stripe { a: Triple, b: Triple },
    Gradient { a: Triple, b: Triple },
    Ring { a: Triple, b: Triple },
    Checkers { a: Triple, b: Triple },
    Blended { a: Box<PatternJson>, b: Box<PatternJson> },
}

impl PatternJson {
    fn build(self) -> Result<Pattern> {
        let pattern = match self.kind {
            PatternKindJson::Solid { color: c } => Pattern::solid(color(c)),
            PatternKindJson::Stripe { a, b } => Pattern::stripe(color(a), color(b)),
            PatternKindJson::Gradient { a, b } => Pattern::gradient(color(a), color(b)),
            PatternKindJson::Ring { a, b } => Pattern::ring(color(a), color(b)),
            PatternKindJson::Checkers { a, b } => Pattern::checkers(color(a), color(b)),
            PatternKindJson::Blended { a, b } => Pattern::blended(a.build()?, b.build()?),
        };

        Ok(pattern.with_transform(compose(&self.transform, "pattern")?))
    }
}

fn yes() -> bool {
    true
}

#[derive(Deserialize)]
struct ShapeJson {
    #[serde(flatten)]
    kind: ShapeKindJson,

    #[serde(default)]
    transform: Vec<TransformJson>,

    /// On a group or CSG shape this replaces the material of every shape
    /// inside it.
    material: Option<MaterialJson>,

    #[serde(default = "yes")]
    casts_shadow: bool,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ShapeKindJson {
    Sphere,
    Plane,
    Cube,

    /// Missing bounds extend to infinity.
    Cylinder {
        minimum: Option<f64>,
        maximum: Option<f64>,
        #[serde(default)]
        closed: bool,
    },

    Cone {
        minimum: Option<f64>,
        maximum: Option<f64>,
        #[serde(default)]
        closed: bool,
    },

    Triangle {
        points: [Triple; 3],
    },

    SmoothTriangle {
        points: [Triple; 3],
        normals: [Triple; 3],
    },

    Group {
        #[serde(default)]
        children: Vec<ShapeJson>,
    },

    Csg {
        operation: CsgOperation,
        left: Box<ShapeJson>,
        right: Box<ShapeJson>,
    },

    /// A Wavefront OBJ model, loaded as one group.
    Obj {
        file: PathBuf,
    },
}

fn extent(minimum: Option<f64>, maximum: Option<f64>) -> Result<(f64, f64)> {
    let minimum = minimum.unwrap_or(f64::NEG_INFINITY);
    let maximum = maximum.unwrap_or(f64::INFINITY);

    if minimum.is_nan() || maximum.is_nan() || minimum > maximum {
        return invalid(format!("extent [{}, {}] is empty", minimum, maximum));
    }

    Ok((minimum, maximum))
}

fn triangle(points: [Triple; 3]) -> Result<TriangleInfo> {
    match TriangleInfo::try_new(point(points[0]), point(points[1]), point(points[2])) {
        Some(info) => Ok(info),
        None => invalid(format!("triangle {:?} has no area", points)),
    }
}

impl ShapeJson {
    fn build(self, base: &Path) -> Result<Shape> {
        let mut shape = match self.kind {
            ShapeKindJson::Sphere => Shape::sphere(),
            ShapeKindJson::Plane => Shape::plane(),
            ShapeKindJson::Cube => Shape::cube(),

            ShapeKindJson::Cylinder { minimum, maximum, closed } => {
                let (min, max) = extent(minimum, maximum)?;
                if closed {
                    Shape::capped_cylinder(min, max)
                } else {
                    Shape::bounded_cylinder(min, max)
                }
            },

            ShapeKindJson::Cone { minimum, maximum, closed } => {
                let (min, max) = extent(minimum, maximum)?;
                if closed {
                    Shape::capped_cone(min, max)
                } else {
                    Shape::bounded_cone(min, max)
                }
            },

            ShapeKindJson::Triangle { points } => Shape::from_triangle(triangle(points)?),

            ShapeKindJson::SmoothTriangle { points, normals } => {
                Shape::from_smooth_triangle(SmoothTriangleInfo {
                    triangle: triangle(points)?,
                    n1: vector(normals[0]),
                    n2: vector(normals[1]),
                    n3: vector(normals[2]),
                })
            },

            ShapeKindJson::Group { children } => {
                let children = children.into_iter()
                    .map(|child| child.build(base))
                    .collect::<Result<Vec<Shape>>>()?;

                Shape::group_of(children)
            },

            ShapeKindJson::Csg { operation, left, right } => {
                Shape::csg(operation, left.build(base)?, right.build(base)?)
            },

            ShapeKindJson::Obj { file } => {
                let path = base.join(file);
                let model = ObjParser::load(&path).map_err(|e| match e {
                    Error::Io(io) => Error::Scene(
                        format!("cannot read OBJ file {}: {}", path.display(), io)
                    ),
                    other => other,
                })?;

                debug!("loaded {} ({} vertices)", path.display(), model.vertices.len());
                model.into_group()
            },
        };

        if let Some(material) = self.material {
            shape.set_material(material.build()?);
        }

        shape.set_transform(compose(&self.transform, "shape")?);
        Ok(shape.with_shadow(self.casts_shadow))
    }
}

#[cfg(test)]
use crate::shape::ShapeType;

#[cfg(test)]
fn scene(shapes: &str) -> Result<Scene> {
    let text = format!(r#"{{
        "camera": {{
            "width": 11, "height": 11, "field_of_view": 1.5707963267948966,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0]
        }},
        "lights": [ {{ "position": [-10, 10, -10], "intensity": [1, 1, 1] }} ],
        "shapes": {}
    }}"#, shapes);

    Scene::parse(&text, Path::new("."))
}

#[cfg(test)]
fn only_shape(shapes: &str) -> Shape {
    scene(shapes).unwrap().world.objects.remove(0)
}

#[cfg(test)]
fn scene_error(shapes: &str) -> bool {
    matches!(scene(shapes), Err(Error::Scene(_)))
}

#[test]
fn default_world_from_json() {
    let s = scene(r#"[
        {
            "type": "sphere",
            "material": { "color": [0.8, 1.0, 0.6], "diffuse": 0.7, "specular": 0.2 }
        },
        { "type": "sphere", "transform": [ { "scale": [0.5, 0.5, 0.5] } ] }
    ]"#).unwrap();

    assert_eq!(s.world.objects.len(), 2);
    assert_eq!(s.world.lights.len(), 1);
    assert_eq!(s.settings, RenderSettings::default());

    let c = s.camera.color_at_pixel(&s.world, 5, 5, s.settings.max_depth);
    assert_eq!(c, Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn transforms_apply_in_listed_order() {
    let shape = only_shape(r#"[ {
        "type": "cube",
        "transform": [ { "scale": [2, 2, 2] }, { "translate": [1, 0, 0] } ]
    } ]"#);

    let expected = Matrix4D::translation(1.0, 0.0, 0.0) * Matrix4D::scaling(2.0, 2.0, 2.0);
    assert_eq!(*shape.transform(), expected);
}

#[test]
fn material_and_pattern_fields() {
    let shape = only_shape(r#"[ {
        "type": "plane",
        "casts_shadow": false,
        "material": {
            "reflective": 0.5,
            "refractive_index": 1.5,
            "pattern": {
                "type": "checkers", "a": [1, 1, 1], "b": [0, 0, 0],
                "transform": [ { "scale": [0.1, 0.1, 0.1] } ]
            }
        }
    } ]"#);

    assert!(!shape.casts_shadow);
    assert_eq!(shape.material.reflective, 0.5);
    assert_eq!(shape.material.refractive_index, 1.5);
    assert_eq!(shape.material.diffuse, Material::default().diffuse);

    let pattern = shape.material.pattern.unwrap();
    assert_eq!(*pattern.transform(), Matrix4D::scaling(0.1, 0.1, 0.1));
}

#[test]
fn groups_and_csg() {
    let shape = only_shape(r#"[ {
        "type": "group",
        "children": [
            { "type": "cylinder", "minimum": 0, "maximum": 1, "closed": true },
            {
                "type": "csg", "operation": "difference",
                "left": { "type": "cube" },
                "right": { "type": "sphere", "transform": [ { "scale": [1.3, 1.3, 1.3] } ] }
            }
        ]
    } ]"#);

    let children = shape.children().unwrap();
    assert_eq!(children.len(), 2);
    assert!(matches!(children[0].ty(), ShapeType::Cylinder(e) if e.closed && e.maximum == 1.0));
    assert_eq!(children[1].operation(), Some(CsgOperation::Difference));
}

#[test]
fn open_ended_cylinders() {
    let shape = only_shape(r#"[ { "type": "cylinder" } ]"#);

    match shape.ty() {
        ShapeType::Cylinder(e) => {
            assert_eq!(e.minimum, f64::NEG_INFINITY);
            assert_eq!(e.maximum, f64::INFINITY);
            assert!(!e.closed);
        },
        other => panic!("expected a cylinder, found {:?}", other),
    }
}

#[test]
fn render_section_overrides_defaults() {
    let text = r#"{
        "camera": {
            "width": 4, "height": 3, "field_of_view": 1.0,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0]
        },
        "background": [0.1, 0.2, 0.3],
        "render": { "threads": 2, "order": "hilbert", "divide_threshold": 0 }
    }"#;
    let s = Scene::parse(text, Path::new(".")).unwrap();

    assert_eq!(s.settings.threads, 2);
    assert_eq!(s.settings.order, crate::work::WorkOrder::Hilbert);
    assert_eq!(s.settings.divide_threshold, 0);
    assert_eq!(s.world.background, Color::rgb(0.1, 0.2, 0.3));
    assert!(s.world.lights.is_empty());
}

#[test]
fn invalid_scenes_are_rejected() {
    assert!(scene_error(r#"[ { "type": "sphere", "transform": [ { "scale": [0, 1, 1] } ] } ]"#));
    assert!(scene_error(r#"[ { "type": "cone", "minimum": 2, "maximum": 1 } ]"#));
    assert!(scene_error(r#"[ { "type": "triangle", "points": [[0, 0, 0], [1, 0, 0], [2, 0, 0]] } ]"#));
    assert!(scene_error(r#"[ { "type": "sphere", "material": { "ambient": -1 } } ]"#));
    assert!(scene_error(r#"[ { "type": "sphere", "material": { "refractive_index": 0 } } ]"#));
    assert!(scene_error(r#"[ { "type": "obj", "file": "no/such/model.obj" } ]"#));

    assert!(matches!(scene(r#"[ { "type": "torus" } ]"#), Err(Error::Json(_))));
    assert!(matches!(scene(r#"[ { "type": "sphere", "material": { "colour": [1, 1, 1] } } ]"#),
        Err(Error::Json(_))));
}

#[test]
fn invalid_cameras_are_rejected() {
    let camera = |fields: &str| Scene::parse(
        &format!(r#"{{ "camera": {{ {} }} }}"#, fields), Path::new(".")
    );

    assert!(camera(r#""width": 10, "height": 10, "field_of_view": 1.0,
        "from": [0, 0, 0], "to": [0, 0, 1], "up": [0, 1, 0]"#).is_ok());

    let bad = [
        r#""width": 0, "height": 10, "field_of_view": 1.0,
            "from": [0, 0, 0], "to": [0, 0, 1], "up": [0, 1, 0]"#,
        r#""width": 10, "height": 10, "field_of_view": 4.0,
            "from": [0, 0, 0], "to": [0, 0, 1], "up": [0, 1, 0]"#,
        r#""width": 10, "height": 10, "field_of_view": 1.0,
            "from": [0, 0, 0], "to": [0, 0, 0], "up": [0, 1, 0]"#,
        r#""width": 10, "height": 10, "field_of_view": 1.0,
            "from": [0, 0, 0], "to": [0, 1, 0], "up": [0, 1, 0]"#,
    ];
    for fields in bad.iter() {
        assert!(matches!(camera(*fields), Err(Error::Scene(_))), "{}", fields);
    }
}
