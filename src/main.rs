use std::process;

use clap::Parser;
use log::{ error, info };

use whitted::Result;
use whitted::parallel::Renderer;
use whitted::scene::Scene;

mod cli;
mod logger;

use cli::Args;
use logger::init_logger;

fn run(args: &Args) -> Result<()> {
    let mut scene = Scene::load(&args.scene)?;
    args.apply(&mut scene.settings);
    scene.subdivide();

    let renderer = Renderer::new(scene.settings.clone());
    let canvas = renderer.render(&scene.world, &scene.camera)?;

    canvas.save(&args.output, args.binary)?;
    info!("saved render to {}", args.output.display());

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.log_level);

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
