//! The multi-threaded renderer.
//!
//! Work units are queued up front on an `mpsc` channel whose sender is then
//! dropped, so a worker knows the render is over when `recv` fails. Finished
//! units travel back on a second channel and only the calling thread ever
//! touches the canvas.

use std::thread;
use std::time::Instant;
use std::sync::mpsc;
use std::sync::{ Arc, Mutex, PoisonError };
use std::sync::atomic::{ AtomicBool, Ordering };

use core_affinity::CoreId;
use log::{ debug, info, warn };
use serde::{ Deserialize, Serialize };

use crate::error::{ Error, Result };
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::work::{ WorkOrder, WorkUnit };
use crate::consts::{ DEFAULT_DIVIDE_THRESHOLD, MAX_RECURSION_DEPTH };

/// How a render is carried out. Every field has a default, so a scene file
/// only needs to name the ones it changes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Worker thread count.
    pub threads: usize,

    pub order: WorkOrder,

    /// Reflection and refraction bounces per primary ray.
    pub max_depth: usize,

    /// Pin each worker to a core where the platform allows it.
    pub pin_threads: bool,

    /// Groups with more children than this are subdivided before rendering.
    /// Zero leaves the scene as built.
    pub divide_threshold: usize,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings {
            threads: default_threads(),
            order: WorkOrder::Scanline,
            max_depth: MAX_RECURSION_DEPTH,
            pin_threads: true,
            divide_threshold: DEFAULT_DIVIDE_THRESHOLD,
        }
    }
}

fn default_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Stops a render in progress.
///
/// Workers look at the token before taking each unit, so a cancelled render
/// finishes the units already in flight and then returns
/// [`Error::Cancelled`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A unit of work with its colours filled in.
struct RenderedUnit {
    pixels: Vec<(usize, usize)>,
    colors: Vec<Color>,
}

pub struct Renderer {
    settings: RenderSettings,
    cancel: CancelToken,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Renderer {
        Renderer { settings, cancel: CancelToken::new() }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// A handle that cancels renders started by this renderer. Cancellation
    /// sticks: later renders fail too.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Renders `world` as seen by `camera` on a pool of worker threads.
    ///
    /// The image is identical to `camera.render(world, max_depth)`, whatever
    /// the thread count or work order.
    pub fn render(&self, world: &World, camera: &Camera) -> Result<Canvas> {
        let (hsize, vsize) = (camera.hsize(), camera.vsize());
        let threads = self.settings.threads.max(1);
        let depth = self.settings.max_depth;
        let started = Instant::now();

        let units = self.settings.order.units(hsize, vsize, threads);
        info!("rendering {}x{} as {} {} units on {} threads",
            hsize, vsize, units.len(), self.settings.order, threads);

        let (work_tx, work_rx) = mpsc::channel::<WorkUnit>();
        for unit in units {
            // `work_rx` is still held right here, so sending cannot fail.
            work_tx.send(unit).expect("work queue receiver dropped early");
        }
        drop(work_tx);

        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, result_rx) = mpsc::channel::<RenderedUnit>();

        let cores = if self.settings.pin_threads {
            let cores = core_affinity::get_core_ids().unwrap_or_default();
            if cores.is_empty() {
                warn!("could not list CPU cores, worker threads will not be pinned");
            }
            cores
        } else {
            Vec::new()
        };

        let mut canvas = Canvas::new(hsize, vsize);

        thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(threads);

            for index in 0..threads {
                let job = Job {
                    index,
                    world,
                    camera,
                    depth,
                    core: pick_core(&cores, index),
                    work: Arc::clone(&work_rx),
                    results: result_tx.clone(),
                    cancel: self.cancel.clone(),
                };

                let handle = thread::Builder::new()
                    .name(format!("whitted-worker-{}", index))
                    .spawn_scoped(scope, move || job.run())?;
                handles.push(handle);
            }

            // Workers hold the only senders now; the loop below ends when
            // the last of them exits.
            drop(result_tx);

            for unit in result_rx.iter() {
                for (&(x, y), color) in unit.pixels.iter().zip(unit.colors.iter()) {
                    canvas.write_pixel(x, y, color);
                }
            }

            let mut outcome = Ok(());
            for (index, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() && outcome.is_ok() {
                    outcome = Err(Error::WorkerPanicked(index));
                }
            }
            outcome
        })?;

        if self.cancel.is_cancelled() {
            info!("render cancelled after {:.2?}", started.elapsed());
            return Err(Error::Cancelled);
        }

        info!("render finished in {:.2?}", started.elapsed());
        Ok(canvas)
    }
}

fn pick_core(cores: &[CoreId], index: usize) -> Option<CoreId> {
    if cores.is_empty() {
        None
    } else {
        Some(cores[index % cores.len()])
    }
}

/// Everything one worker thread needs.
struct Job<'a> {
    index: usize,
    world: &'a World,
    camera: &'a Camera,
    depth: usize,
    core: Option<CoreId>,
    work: Arc<Mutex<mpsc::Receiver<WorkUnit>>>,
    results: mpsc::Sender<RenderedUnit>,
    cancel: CancelToken,
}

impl<'a> Job<'a> {
    fn run(self) {
        if let Some(core) = self.core {
            if !core_affinity::set_for_current(core) {
                warn!("worker {} could not be pinned to core {}", self.index, core.id);
            }
        }

        let mut rendered = 0;

        loop {
            if self.cancel.is_cancelled() {
                debug!("worker {} saw cancellation", self.index);
                break;
            }

            // The guard is dropped before tracing so other workers can pull.
            let next = self.work.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();

            let unit = match next {
                Ok(unit) => unit,
                Err(_) => break,
            };

            let colors = unit.pixels.iter()
                .map(|&(x, y)| self.camera.color_at_pixel(self.world, x, y, self.depth))
                .collect();

            rendered += 1;

            let done = RenderedUnit { pixels: unit.pixels, colors };
            if self.results.send(done).is_err() {
                break;
            }
        }

        debug!("worker {} finished after {} units", self.index, rendered);
    }
}

#[cfg(test)]
use crate::tuple::Tuple4D;

#[cfg(test)]
use crate::matrix::Matrix4D;

#[cfg(test)]
fn book_camera(hsize: usize, vsize: usize) -> Camera {
    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    Camera::new(hsize, vsize, std::f64::consts::PI / 2.0,
        Matrix4D::view_transform(from, to, up))
}

#[cfg(test)]
fn settings(threads: usize, order: WorkOrder) -> RenderSettings {
    RenderSettings { threads, order, pin_threads: false, ..RenderSettings::default() }
}

#[cfg(test)]
fn same_bits(a: &Canvas, b: &Canvas) -> bool {
    a.width == b.width && a.height == b.height
        && a.pixels().iter().zip(b.pixels().iter()).all(|(p, q)| {
            p.r.to_bits() == q.r.to_bits()
                && p.g.to_bits() == q.g.to_bits()
                && p.b.to_bits() == q.b.to_bits()
        })
}

#[test]
fn default_settings() {
    let s = RenderSettings::default();

    assert!(s.threads >= 1);
    assert_eq!(s.order, WorkOrder::Scanline);
    assert_eq!(s.max_depth, MAX_RECURSION_DEPTH);
    assert_eq!(s.divide_threshold, DEFAULT_DIVIDE_THRESHOLD);
}

#[test]
fn settings_fill_in_missing_fields() {
    let s: RenderSettings = serde_json::from_str(r#"{ "threads": 3, "order": "hilbert" }"#)
        .unwrap();

    assert_eq!(s.threads, 3);
    assert_eq!(s.order, WorkOrder::Hilbert);
    assert_eq!(s.max_depth, MAX_RECURSION_DEPTH);

    assert!(serde_json::from_str::<RenderSettings>(r#"{ "thread": 3 }"#).is_err());
}

#[test]
fn threaded_render_matches_single_threaded() {
    let w = World::default();
    let c = book_camera(23, 17);
    let expected = c.render(&w, MAX_RECURSION_DEPTH);

    for &threads in [1, 2, 4, 7].iter() {
        for &order in [WorkOrder::Scanline, WorkOrder::Hilbert].iter() {
            let image = Renderer::new(settings(threads, order)).render(&w, &c).unwrap();
            assert!(same_bits(&image, &expected), "{} threads, {}", threads, order);
        }
    }
}

#[test]
fn threaded_render_center_pixel() {
    let w = World::default();
    let c = book_camera(11, 11);

    let image = Renderer::new(settings(3, WorkOrder::Scanline)).render(&w, &c).unwrap();
    assert_eq!(image.read_pixel(5, 5), Some(Color::rgb(0.38066, 0.47583, 0.2855)));
}

#[test]
fn more_threads_than_pixels() {
    let w = World::default();
    let c = book_camera(2, 2);

    let image = Renderer::new(settings(16, WorkOrder::Hilbert)).render(&w, &c).unwrap();
    assert!(same_bits(&image, &c.render(&w, MAX_RECURSION_DEPTH)));
}

#[test]
fn zero_threads_still_renders() {
    let w = World::default();
    let c = book_camera(5, 3);

    let image = Renderer::new(settings(0, WorkOrder::Scanline)).render(&w, &c).unwrap();
    assert_eq!(image.width, 5);
    assert_eq!(image.height, 3);
}

#[test]
fn cancelled_render_fails() {
    let w = World::default();
    let c = book_camera(8, 8);

    let renderer = Renderer::new(settings(2, WorkOrder::Scanline));
    let token = renderer.cancel_token();
    assert!(!token.is_cancelled());

    token.cancel();
    assert!(renderer.cancel_token().is_cancelled());
    assert!(matches!(renderer.render(&w, &c), Err(Error::Cancelled)));
}
