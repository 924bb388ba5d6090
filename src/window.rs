use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use winit::window::Window as WinitWindow;

use crate::config::BackdropConfig;
use crate::core::{Container, FrameRequest, FrameScheduler, Viewport};
use crate::error::Result;
use crate::render::GpuSurface;

/// winit window acting as the backdrop's mount point
pub struct WindowContainer {
    inner: Arc<WinitWindow>,
    instance: wgpu::Instance,
    clear_color: [f64; 4],
    antialias: bool,
    mounted: usize,
}

impl WindowContainer {
    pub fn new(window: Arc<WinitWindow>, config: &BackdropConfig) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        Self {
            inner: window,
            instance,
            clear_color: config.clear_color,
            antialias: config.antialias,
            mounted: 0,
        }
    }
}

impl Container for WindowContainer {
    type Surface = GpuSurface;

    fn viewport(&self) -> Viewport {
        let size = self.inner.inner_size();
        Viewport::new(size.width, size.height)
    }

    fn mount_surface(&mut self, viewport: Viewport) -> Result<GpuSurface> {
        let surface = GpuSurface::new(
            &self.instance,
            Arc::clone(&self.inner),
            viewport,
            self.clear_color,
            self.antialias,
        )?;
        self.mounted += 1;
        Ok(surface)
    }

    fn unmount_surface(&mut self, surface: GpuSurface) {
        drop(surface);
        self.mounted = self.mounted.saturating_sub(1);
    }

    fn child_count(&self) -> usize {
        self.mounted
    }
}

/// Frame scheduler backed by `Window::request_redraw`
///
/// winit cannot withdraw a redraw request, so cancelling only forgets the
/// handle; the event loop then finds nothing to deliver. Clones share the
/// pending slot: the backdrop requests, the event loop takes.
#[derive(Clone)]
pub struct RedrawFrames {
    window: Arc<WinitWindow>,
    next_id: Rc<Cell<u64>>,
    pending: Rc<Cell<Option<FrameRequest>>>,
}

impl RedrawFrames {
    pub fn new(window: Arc<WinitWindow>) -> Self {
        Self {
            window,
            next_id: Rc::new(Cell::new(0)),
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// Request to deliver on `RedrawRequested`, if any
    pub fn take_pending(&self) -> Option<FrameRequest> {
        self.pending.take()
    }
}

impl FrameScheduler for RedrawFrames {
    fn request_frame(&mut self) -> FrameRequest {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let request = FrameRequest(id);
        self.pending.set(Some(request));
        self.window.request_redraw();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending.get() == Some(request) {
            self.pending.set(None);
        }
    }
}
