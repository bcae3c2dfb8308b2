use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use whitted::parallel::RenderSettings;
use whitted::work::WorkOrder;

/// Command line arguments. Render options given here override the scene
/// file's `render` section.
#[derive(Debug, Parser)]
#[clap(name = "whitted", version, about = "A Whitted-style ray tracer")]
pub struct Args {
    /// Scene description (JSON)
    pub scene: PathBuf,

    /// Where to write the PPM image
    #[clap(short, long, default_value = "out.ppm")]
    pub output: PathBuf,

    /// Number of worker threads
    #[clap(short, long)]
    pub threads: Option<usize>,

    /// Pixel visiting order: scanline or hilbert
    #[clap(long)]
    pub order: Option<WorkOrder>,

    /// Maximum reflection/refraction depth
    #[clap(short, long)]
    pub depth: Option<usize>,

    /// Subdivide groups with more children than this (0 disables)
    #[clap(long)]
    pub divide: Option<usize>,

    /// Write binary (P6) instead of ASCII (P3) PPM
    #[clap(short, long)]
    pub binary: bool,

    /// Do not pin worker threads to cores
    #[clap(long)]
    pub no_pin: bool,

    /// Logging level: off, error, warn, info, debug or trace
    #[clap(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl Args {
    pub fn apply(&self, settings: &mut RenderSettings) {
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(order) = self.order {
            settings.order = order;
        }
        if let Some(depth) = self.depth {
            settings.max_depth = depth;
        }
        if let Some(divide) = self.divide {
            settings.divide_threshold = divide;
        }
        if self.no_pin {
            settings.pin_threads = false;
        }
    }
}
