use std::f64::consts::PI;
use std::path::Path;
use std::thread;

use whitted::Error;
use whitted::tuple::Tuple4D;
use whitted::matrix::Matrix4D;
use whitted::color::Color;
use whitted::ray::Ray4D;
use whitted::shape::Shape;
use whitted::world::World;
use whitted::camera::Camera;
use whitted::canvas::Canvas;
use whitted::scene::Scene;
use whitted::work::WorkOrder;
use whitted::parallel::{ RenderSettings, Renderer };
use whitted::consts::MAX_RECURSION_DEPTH;

const SHOWCASE: &str = r#"{
    "camera": {
        "width": 40, "height": 30, "field_of_view": 1.0472,
        "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0]
    },
    "lights": [
        { "position": [-10, 10, -10], "intensity": [0.8, 0.8, 0.8] },
        { "position": [5, 8, -6], "intensity": [0.3, 0.3, 0.3] }
    ],
    "shapes": [
        {
            "type": "plane",
            "material": {
                "reflective": 0.3, "specular": 0,
                "pattern": { "type": "checkers", "a": [1, 1, 1], "b": [0.1, 0.1, 0.1] }
            }
        },
        {
            "type": "sphere",
            "transform": [ { "translate": [-0.5, 1, 0.5] } ],
            "material": {
                "color": [0.1, 0.1, 0.2], "transparency": 0.9, "reflective": 0.9,
                "refractive_index": 1.5, "diffuse": 0.1
            }
        },
        {
            "type": "csg", "operation": "difference",
            "left": { "type": "cube" },
            "right": { "type": "sphere", "transform": [ { "scale": [1.3, 1.3, 1.3] } ] },
            "transform": [ { "scale": [0.4, 0.4, 0.4] }, { "rotate_y": 0.5 }, { "translate": [1.5, 0.4, -0.5] } ],
            "material": { "color": [1, 0.4, 0.2] }
        },
        {
            "type": "group",
            "transform": [ { "translate": [-2, 0, 1] } ],
            "children": [
                { "type": "cylinder", "minimum": 0, "maximum": 0.8, "closed": true,
                  "transform": [ { "scale": [0.2, 1, 0.2] } ] },
                { "type": "cone", "minimum": -1, "maximum": 0, "closed": true,
                  "transform": [ { "scale": [0.3, 0.4, 0.3] }, { "translate": [0, 1.2, 0] } ] },
                { "type": "triangle", "points": [[0.5, 0, 0], [1, 0, 0], [0.75, 0.6, 0]] }
            ]
        }
    ]
}"#;

fn settings(threads: usize, order: WorkOrder) -> RenderSettings {
    RenderSettings { threads, order, pin_threads: false, ..RenderSettings::default() }
}

fn same_bits(a: &Canvas, b: &Canvas) -> bool {
    a.width == b.width && a.height == b.height
        && a.pixels().iter().zip(b.pixels().iter()).all(|(p, q)| {
            p.r.to_bits() == q.r.to_bits()
                && p.g.to_bits() == q.g.to_bits()
                && p.b.to_bits() == q.b.to_bits()
        })
}

fn book_camera(size: usize) -> Camera {
    Camera::new(size, size, PI / 2.0, Matrix4D::view_transform(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ))
}

#[test]
fn phong_pixel_end_to_end() {
    let image = Renderer::new(settings(4, WorkOrder::Hilbert))
        .render(&World::default(), &book_camera(11))
        .unwrap();

    assert_eq!(image.read_pixel(5, 5), Some(Color::rgb(0.38066, 0.47583, 0.2855)));
}

#[test]
fn thread_count_and_order_never_change_the_image() {
    let scene = Scene::parse(SHOWCASE, Path::new(".")).unwrap();
    let reference = scene.camera.render(&scene.world, MAX_RECURSION_DEPTH);

    for &threads in [1, 3, 8].iter() {
        for &order in [WorkOrder::Scanline, WorkOrder::Hilbert].iter() {
            let image = Renderer::new(settings(threads, order))
                .render(&scene.world, &scene.camera)
                .unwrap();

            assert!(same_bits(&image, &reference), "{} threads, {} order", threads, order);
        }
    }
}

#[test]
fn subdividing_keeps_the_image() {
    let mut world = World::default();
    let mut spheres = Shape::group();
    for i in 0..30 {
        let x = (i % 6) as f64 - 2.5;
        let y = (i / 6) as f64 - 2.0;
        spheres.add_child(Shape::sphere().with_transform(
            Matrix4D::translation(x, y, 3.0) * Matrix4D::scaling(0.3, 0.3, 0.3)
        ));
    }
    world.add_object(spheres);

    let camera = book_camera(24);
    let before = camera.render(&world, MAX_RECURSION_DEPTH);

    world.divide(4);
    let after = Renderer::new(settings(3, WorkOrder::Scanline))
        .render(&world, &camera)
        .unwrap();

    assert_eq!(before, after);
}

#[test]
fn ppm_round_trip() {
    let scene = Scene::parse(SHOWCASE, Path::new(".")).unwrap();
    let image = Renderer::new(scene.settings.clone())
        .render(&scene.world, &scene.camera)
        .unwrap();

    for &binary in [false, true].iter() {
        let mut bytes = Vec::new();
        if binary {
            image.write_ppm_binary(&mut bytes).unwrap();
        } else {
            image.write_ppm(&mut bytes).unwrap();
        }

        let back = Canvas::read_ppm(&mut bytes.as_slice()).unwrap();
        assert_eq!((back.width, back.height), (image.width, image.height));

        for (p, q) in image.pixels().iter().zip(back.pixels().iter()) {
            let p = p.clamp();
            assert!((p.r - q.r).abs() <= 1.0 / 255.0);
            assert!((p.g - q.g).abs() <= 1.0 / 255.0);
            assert!((p.b - q.b).abs() <= 1.0 / 255.0);
        }
    }
}

#[test]
fn concurrent_renders_agree() {
    let scene = Scene::parse(SHOWCASE, Path::new(".")).unwrap();
    let reference = scene.camera.render(&scene.world, MAX_RECURSION_DEPTH);

    let images: Vec<Canvas> = thread::scope(|scope| {
        let handles: Vec<_> = [(2, WorkOrder::Scanline), (3, WorkOrder::Hilbert), (4, WorkOrder::Scanline)]
            .iter()
            .map(|&(threads, order)| {
                let (world, camera) = (&scene.world, &scene.camera);
                scope.spawn(move || Renderer::new(settings(threads, order)).render(world, camera))
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
    });

    assert!(images.iter().all(|image| same_bits(image, &reference)));
}

#[test]
fn scene_groups_are_bounded_by_their_children() {
    let scene = Scene::parse(r#"{
        "camera": {
            "width": 4, "height": 4, "field_of_view": 1.0,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0]
        },
        "shapes": [ {
            "type": "group",
            "children": [
                { "type": "sphere",
                  "transform": [ { "scale": [2, 2, 2] }, { "translate": [2, 5, -3] } ] },
                { "type": "cylinder", "minimum": -2, "maximum": 2,
                  "transform": [ { "scale": [0.5, 1, 0.5] }, { "translate": [-4, -1, 4] } ] }
            ]
        } ]
    }"#, Path::new(".")).unwrap();

    let b = scene.world.objects[0].bounds();
    assert_eq!(b.minimum, Tuple4D::point(-4.5, -3.0, -5.0));
    assert_eq!(b.maximum, Tuple4D::point(4.0, 7.0, 4.5));
}

#[test]
fn scene_csg_difference_hits_only_the_left_surface() {
    let scene = Scene::parse(r#"{
        "camera": {
            "width": 4, "height": 4, "field_of_view": 1.0,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0]
        },
        "shapes": [ {
            "type": "csg", "operation": "difference",
            "left": { "type": "sphere" },
            "right": { "type": "sphere", "transform": [ { "translate": [0, 0, 0.5] } ] }
        } ]
    }"#, Path::new(".")).unwrap();

    let c = &scene.world.objects[0];
    let (left, right) = c.operands().unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = scene.world.intersect(&r);

    assert_eq!(xs.len(), 2);
    assert!(whitted::feq(xs[0].t, 4.0));
    assert!(std::ptr::eq(xs[0].what, left));
    assert!(whitted::feq(xs[1].t, 4.5));
    assert!(std::ptr::eq(xs[1].what, right));
}

#[test]
fn cancelled_render_reports_cancellation() {
    let renderer = Renderer::new(settings(2, WorkOrder::Hilbert));
    renderer.cancel_token().cancel();

    let result = renderer.render(&World::default(), &book_camera(16));
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn cancelling_a_running_render() {
    let scene = Scene::parse(SHOWCASE, Path::new(".")).unwrap();
    let camera = Camera::new(400, 300, scene.camera.field_of_view(), *scene.camera.transform());

    let renderer = Renderer::new(settings(1, WorkOrder::Scanline));
    let token = renderer.cancel_token();

    let result = thread::scope(|scope| {
        let running = scope.spawn(|| renderer.render(&scene.world, &camera));
        token.cancel();
        running.join().unwrap()
    });

    // Whether the worker had started or not, it stops at the next unit.
    assert!(matches!(result, Err(Error::Cancelled)));
}
