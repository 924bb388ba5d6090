use crate::error::Result;
use crate::render::RenderSurface;

/// Viewport dimensions in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; `None` for a degenerate viewport
    pub fn aspect(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }

    /// Minimised windows report a zero dimension
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Mount point for the render surface
///
/// Owns the place a surface is displayed in: a window for the windowed
/// host, an in-memory node for the headless one.
pub trait Container {
    type Surface: RenderSurface;

    /// Current viewport of the container
    fn viewport(&self) -> Viewport;

    /// Create a surface of the given size and attach it
    ///
    /// Fails only when the host cannot render at all.
    fn mount_surface(&mut self, viewport: Viewport) -> Result<Self::Surface>;

    /// Detach a surface previously returned by `mount_surface`
    fn unmount_surface(&mut self, surface: Self::Surface);

    /// Number of surfaces currently attached
    fn child_count(&self) -> usize;
}
