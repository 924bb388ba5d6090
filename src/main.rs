use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use particle_backdrop::cli::Cli;
use particle_backdrop::core::SystemClock;
use particle_backdrop::window::{RedrawFrames, WindowContainer};
use particle_backdrop::{Backdrop, BackdropConfig, Simulation};

type WindowBackdrop = Backdrop<WindowContainer, RedrawFrames, SystemClock>;

fn scene_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

// === Application ===

struct App {
    config: BackdropConfig,
    seed: Option<u64>,
    initial_size: (u32, u32),
    window: Option<Arc<Window>>,
    frames: Option<RedrawFrames>,
    backdrop: Option<WindowBackdrop>,
}

impl App {
    fn new(config: BackdropConfig, seed: Option<u64>, initial_size: (u32, u32)) -> Self {
        Self {
            config,
            seed,
            initial_size,
            window: None,
            frames: None,
            backdrop: None,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(backdrop) = &mut self.backdrop {
            backdrop.stop();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.initial_size;
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Particle Backdrop")
                .with_transparent(true)
                .with_inner_size(winit::dpi::LogicalSize::new(width, height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let container = WindowContainer::new(window.clone(), &self.config);
        let frames = RedrawFrames::new(window.clone());
        let mut backdrop = Backdrop::new(self.config.clone(), frames.clone(), SystemClock::new());

        if let Err(e) = backdrop.start(container, &mut scene_rng(self.seed)) {
            log::error!("Failed to start backdrop: {}", e);
            event_loop.exit();
            return;
        }

        self.window = Some(window);
        self.frames = Some(frames);
        self.backdrop = Some(backdrop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(backdrop) = &mut self.backdrop {
                    backdrop.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(frames), Some(backdrop)) = (&self.frames, &mut self.backdrop) {
                    if let Some(request) = frames.take_pending() {
                        backdrop.on_frame(request);
                    }
                }
            }
            _ => {}
        }
    }
}

fn run_headless(cli: &Cli, config: BackdropConfig) -> anyhow::Result<()> {
    let mut simulation = Simulation::start(config, cli.width, cli.height, &mut scene_rng(cli.seed))
        .context("starting headless backdrop")?;

    let rendered = simulation.run(cli.frames, Duration::from_millis(cli.frame_ms));
    log::info!("Simulated {} frames", rendered);

    if let Some(snapshot) = simulation.snapshot() {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    simulation.stop();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BackdropConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BackdropConfig::default(),
    };

    if cli.headless {
        return run_headless(&cli, config);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, cli.seed, (cli.width, cli.height));

    log::info!("Particle Backdrop - Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
