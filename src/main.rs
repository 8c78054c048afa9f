mod render;

use anyhow::{Context, Result};
use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use snake_evo::{PersistError, Session, TrainerConfig};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

const FRAME: Duration = Duration::from_millis(16);

/// Evolve snake-playing policies with a genetic algorithm.
///
/// Keys: Up/Down speed (Shift for big steps), S save, L load, T train/test,
/// E evolve now, Esc quit.
#[derive(Debug, Parser)]
#[command(name = "snake-evo", version)]
struct Args {
    /// JSON config file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    save_path: Option<PathBuf>,
    #[arg(long)]
    population: Option<usize>,
    /// Start by evaluating the saved policy.
    #[arg(long)]
    load: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = build_config(&args)?;
    let mut session = Session::new(config).context("invalid configuration")?;
    if args.load {
        report_load(session.load_best());
    }

    let (width, height) = render::frame_size(session.config());
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let window = WindowBuilder::new()
        .with_title("Snake Evolution")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut pixels = {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(width, height, surface)?
    };
    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            render::draw(pixels.frame_mut(), &session);
            if let Err(e) = pixels.render() {
                error!(error = %e, "render failed");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape) || input.close_requested() || input.destroyed() {
                *control_flow = ControlFlow::Exit;
                return;
            }

            let coarse = input.held_shift();
            if input.key_pressed(VirtualKeyCode::Up) {
                session.speed_up(coarse);
            }
            if input.key_pressed(VirtualKeyCode::Down) {
                session.slow_down(coarse);
            }
            if input.key_pressed(VirtualKeyCode::S) {
                if let Err(e) = session.save_best() {
                    error!(error = %e, "save failed");
                }
            }
            if input.key_pressed(VirtualKeyCode::L) {
                report_load(session.load_best());
            }
            if input.key_pressed(VirtualKeyCode::T) {
                session.toggle_mode();
            }
            if input.key_pressed(VirtualKeyCode::E) {
                session.evolve_now();
            }

            if last_tick.elapsed() >= FRAME {
                session.tick();
                last_tick = Instant::now();
            }
            window.request_redraw();
        }
    });
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn build_config(args: &Args) -> Result<TrainerConfig> {
    let mut config = match &args.config {
        Some(path) => TrainerConfig::from_json_file(path)?,
        None => TrainerConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    if let Some(path) = &args.save_path {
        config.save_path = path.clone();
    }
    if let Some(size) = args.population {
        config.population_size = size;
    }
    Ok(config)
}

/// A missing or unreadable save is not fatal; the session already logged it
/// and carries on with its current state.
fn report_load(result: Result<(), PersistError>) {
    if result.is_ok() {
        info!("evaluating loaded policy");
    }
}
