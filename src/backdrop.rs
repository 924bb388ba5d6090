use std::time::Duration;

use rand::Rng;

use crate::config::BackdropConfig;
use crate::core::{Container, FpsMeter, FrameInfo, FrameRequest, FrameScheduler, TimeSource, Viewport};
use crate::error::{BackdropError, Result};
use crate::render::RenderSurface;
use crate::scene::Scene;

const FPS_UPDATE_INTERVAL: f32 = 1.0;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Running,
    Stopped,
}

/// Everything that only exists while the animation runs
struct Running<C: Container> {
    container: C,
    surface: C::Surface,
    scene: Scene,
    started_at: Duration,
    last_time: f32,
    pending: Option<FrameRequest>,
}

enum Stage<C: Container> {
    Uninitialized,
    Running(Box<Running<C>>),
    Stopped,
}

/// Animated particle background bound to one container
///
/// `Uninitialized -> Running -> Stopped`, each transition taken once.
/// Dropping a running backdrop stops it.
pub struct Backdrop<C: Container, F: FrameScheduler, T: TimeSource> {
    config: BackdropConfig,
    frames: F,
    clock: T,
    stage: Stage<C>,
    frame_count: u64,
    fps: FpsMeter,
}

impl<C: Container, F: FrameScheduler, T: TimeSource> Backdrop<C, F, T> {
    pub fn new(config: BackdropConfig, frames: F, clock: T) -> Self {
        Self {
            config,
            frames,
            clock,
            stage: Stage::Uninitialized,
            frame_count: 0,
            fps: FpsMeter::new(FPS_UPDATE_INTERVAL),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.stage {
            Stage::Uninitialized => Lifecycle::Uninitialized,
            Stage::Running(_) => Lifecycle::Running,
            Stage::Stopped => Lifecycle::Stopped,
        }
    }

    /// Build the scene inside `container` and render the first frame
    ///
    /// The first frame schedules the next, so the loop is running on return.
    /// Nothing stays mounted if this fails.
    pub fn start<R: Rng + ?Sized>(&mut self, mut container: C, rng: &mut R) -> Result<()> {
        if !matches!(self.stage, Stage::Uninitialized) {
            return Err(BackdropError::InvalidTransition {
                operation: "start",
                state: self.lifecycle(),
            });
        }

        self.config.validate()?;

        let viewport = container.viewport();
        let mut surface = container.mount_surface(viewport)?;

        let aspect = viewport.aspect().unwrap_or(1.0);
        let mut scene = Scene::generate(&self.config, aspect, rng);
        if let Err(e) = scene.upload(&mut surface) {
            surface.dispose();
            container.unmount_surface(surface);
            return Err(e);
        }

        log::info!(
            "Backdrop started: {}x{}, {} particles, {} shapes",
            viewport.width,
            viewport.height,
            scene.particles.len(),
            scene.shapes.len()
        );

        self.stage = Stage::Running(Box::new(Running {
            container,
            surface,
            scene,
            started_at: self.clock.now(),
            last_time: 0.0,
            pending: None,
        }));
        self.run_frame();
        Ok(())
    }

    /// Frame callback; returns whether a frame was rendered
    ///
    /// Only the currently pending request renders. Anything else (a frame
    /// that fired after `stop`, or a stale handle) is dropped.
    pub fn on_frame(&mut self, request: FrameRequest) -> bool {
        let current = match &self.stage {
            Stage::Running(live) => live.pending == Some(request),
            _ => {
                log::debug!("Frame request {:?} arrived while {:?}", request, self.lifecycle());
                return false;
            }
        };

        if !current {
            log::warn!("Ignoring stale frame request {:?}", request);
            return false;
        }
        self.run_frame()
    }

    fn run_frame(&mut self) -> bool {
        let Stage::Running(live) = &mut self.stage else {
            return false;
        };

        // Chain the next callback before doing any work
        live.pending = Some(self.frames.request_frame());

        let time = self.clock.now().saturating_sub(live.started_at).as_secs_f32();
        let frame = FrameInfo::new(self.frame_count, time, time - live.last_time);
        live.last_time = time;

        live.scene.advance(frame.time);
        if let Err(e) = live.surface.render(&live.scene) {
            log::error!("Render error on frame {}: {}", frame.number, e);
        }

        self.frame_count += 1;
        if let Some(fps) = self.fps.tick(frame.delta) {
            log::debug!("FPS: {:.1}", fps);
        }
        true
    }

    /// Match camera aspect and surface size to a new viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        let Stage::Running(live) = &mut self.stage else {
            log::debug!("Resize to {}x{} ignored: not running", width, height);
            return;
        };

        let viewport = Viewport::new(width, height);
        let Some(aspect) = viewport.aspect() else {
            return;
        };

        live.scene.camera.set_aspect(aspect);
        live.surface.resize(viewport);
    }

    /// Cancel the loop and release every resource
    ///
    /// Order: pending frame, scene resources, surface, container.
    /// Safe to call in any state; only the first call on a running
    /// backdrop does anything.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.stage, Stage::Stopped) {
            Stage::Running(live) => {
                let Running {
                    mut container,
                    mut surface,
                    mut scene,
                    pending,
                    ..
                } = *live;

                if let Some(request) = pending {
                    self.frames.cancel_frame(request);
                }
                scene.release(&mut surface);
                surface.dispose();
                container.unmount_surface(surface);
                drop(container);

                log::info!("Backdrop stopped after {} frames", self.frame_count);
            }
            Stage::Uninitialized => self.stage = Stage::Uninitialized,
            Stage::Stopped => {}
        }
    }

    /// Frames rendered since start
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Request the host is expected to deliver next
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        match &self.stage {
            Stage::Running(live) => live.pending,
            _ => None,
        }
    }

    /// Seconds since start, as the next frame would see it
    pub fn elapsed(&self) -> Option<f32> {
        match &self.stage {
            Stage::Running(live) => {
                Some(self.clock.now().saturating_sub(live.started_at).as_secs_f32())
            }
            _ => None,
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.stage {
            Stage::Running(live) => Some(&live.scene),
            _ => None,
        }
    }

    pub fn surface(&self) -> Option<&C::Surface> {
        match &self.stage {
            Stage::Running(live) => Some(&live.surface),
            _ => None,
        }
    }

    pub fn container(&self) -> Option<&C> {
        match &self.stage {
            Stage::Running(live) => Some(&live.container),
            _ => None,
        }
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }
}

impl<C: Container, F: FrameScheduler, T: TimeSource> Drop for Backdrop<C, F, T> {
    fn drop(&mut self) {
        self.stop();
    }
}
