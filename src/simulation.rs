use std::time::Duration;

use rand::Rng;

use crate::backdrop::Backdrop;
use crate::config::BackdropConfig;
use crate::core::{Container, ManualClock, ManualFrames};
use crate::error::Result;
use crate::render::HeadlessContainer;
use crate::scene::SceneSnapshot;

pub type HeadlessBackdrop = Backdrop<HeadlessContainer, ManualFrames, ManualClock>;

/// Backdrop on the headless host, driven one refresh at a time
pub struct Simulation {
    backdrop: HeadlessBackdrop,
    container: HeadlessContainer,
    frames: ManualFrames,
    clock: ManualClock,
}

impl Simulation {
    /// Start a backdrop in a fresh `width`x`height` container
    pub fn start<R: Rng + ?Sized>(
        config: BackdropConfig,
        width: u32,
        height: u32,
        rng: &mut R,
    ) -> Result<Self> {
        Self::start_in(config, HeadlessContainer::new(width, height), rng)
    }

    /// Start a backdrop in an existing container
    pub fn start_in<R: Rng + ?Sized>(
        config: BackdropConfig,
        container: HeadlessContainer,
        rng: &mut R,
    ) -> Result<Self> {
        let frames = ManualFrames::new();
        let clock = ManualClock::new();
        let mut backdrop = Backdrop::new(config, frames.clone(), clock.clone());
        backdrop.start(container.clone(), rng)?;

        Ok(Self {
            backdrop,
            container,
            frames,
            clock,
        })
    }

    /// Let `interval` pass, then deliver the pending frame if there is one
    pub fn step(&mut self, interval: Duration) -> bool {
        self.clock.advance(interval);
        match self.frames.take_pending() {
            Some(request) => self.backdrop.on_frame(request),
            None => false,
        }
    }

    /// Step `count` times; returns how many frames rendered
    pub fn run(&mut self, count: u64, interval: Duration) -> u64 {
        (0..count).filter(|_| self.step(interval)).count() as u64
    }

    /// Resize the container and notify the backdrop, as a window resize would
    pub fn resize(&mut self, width: u32, height: u32) {
        self.container.set_viewport(width, height);
        let viewport = self.container.viewport();
        self.backdrop.resize(viewport.width, viewport.height);
    }

    pub fn stop(&mut self) {
        self.backdrop.stop();
    }

    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.backdrop.scene().map(|scene| scene.snapshot())
    }

    pub fn backdrop(&self) -> &HeadlessBackdrop {
        &self.backdrop
    }

    pub fn backdrop_mut(&mut self) -> &mut HeadlessBackdrop {
        &mut self.backdrop
    }

    pub fn container(&self) -> &HeadlessContainer {
        &self.container
    }

    pub fn frames(&self) -> &ManualFrames {
        &self.frames
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }
}
