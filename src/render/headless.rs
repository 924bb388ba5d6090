use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

use super::{GeometryId, Material, MaterialId, RenderSurface};
use crate::core::{Container, Viewport};
use crate::error::{BackdropError, Result};
use crate::scene::{Geometry, Scene};

#[derive(Debug, Clone, Copy)]
struct Child {
    id: u64,
    viewport: Viewport,
}

#[derive(Debug)]
struct ContainerState {
    viewport: Viewport,
    children: Vec<Child>,
    next_id: u64,
    frames_presented: u64,
    leaked_resources: usize,
    can_render: bool,
    resource_limit: Option<usize>,
}

/// In-memory mount point
///
/// Stands in for a window when there is no display: the `--headless` mode
/// and the test suite. Clones share one node.
#[derive(Debug, Clone)]
pub struct HeadlessContainer {
    state: Rc<RefCell<ContainerState>>,
}

impl HeadlessContainer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(ContainerState {
                viewport: Viewport::new(width, height),
                children: Vec::new(),
                next_id: 0,
                frames_presented: 0,
                leaked_resources: 0,
                can_render: true,
                resource_limit: None,
            })),
        }
    }

    /// Container whose host has no rendering capability
    pub fn without_renderer(width: u32, height: u32) -> Self {
        let container = Self::new(width, height);
        container.state.borrow_mut().can_render = false;
        container
    }

    /// Cap the number of live resources each surface may hold
    pub fn with_resource_limit(self, limit: usize) -> Self {
        self.state.borrow_mut().resource_limit = Some(limit);
        self
    }

    /// Change the viewport, as a window resize would
    pub fn set_viewport(&self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Viewport::new(width, height);
    }

    /// Internal size of each attached surface, in mount order
    pub fn child_viewports(&self) -> Vec<Viewport> {
        self.state.borrow().children.iter().map(|c| c.viewport).collect()
    }

    /// Frames rendered by all surfaces ever mounted here
    pub fn frames_presented(&self) -> u64 {
        self.state.borrow().frames_presented
    }

    /// Resources still alive in surfaces at the moment they were unmounted
    pub fn leaked_resources(&self) -> usize {
        self.state.borrow().leaked_resources
    }
}

impl Container for HeadlessContainer {
    type Surface = HeadlessSurface;

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn mount_surface(&mut self, viewport: Viewport) -> Result<HeadlessSurface> {
        let mut state = self.state.borrow_mut();
        if !state.can_render {
            return Err(BackdropError::Adapter(
                "headless container has no rendering capability".into(),
            ));
        }

        state.next_id += 1;
        let id = state.next_id;
        state.children.push(Child { id, viewport });

        Ok(HeadlessSurface {
            id,
            viewport,
            container: Rc::clone(&self.state),
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            resource_limit: state.resource_limit,
            frames_rendered: 0,
            disposed: false,
        })
    }

    fn unmount_surface(&mut self, surface: HeadlessSurface) {
        let mut state = self.state.borrow_mut();
        state.leaked_resources += surface.live_resources();
        state.children.retain(|c| c.id != surface.id);
    }

    fn child_count(&self) -> usize {
        self.state.borrow().children.len()
    }
}

/// Surface that does the bookkeeping of a GPU surface without drawing
#[derive(Debug)]
pub struct HeadlessSurface {
    id: u64,
    viewport: Viewport,
    container: Rc<RefCell<ContainerState>>,
    geometries: SlotMap<GeometryId, usize>,
    materials: SlotMap<MaterialId, Material>,
    resource_limit: Option<usize>,
    frames_rendered: u64,
    disposed: bool,
}

impl HeadlessSurface {
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Vertex count of a live geometry
    pub fn geometry_vertices(&self, id: GeometryId) -> Option<usize> {
        self.geometries.get(id).copied()
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    fn reserve(&self) -> Result<()> {
        if self.disposed {
            return Err(BackdropError::Surface(wgpu::SurfaceError::Lost));
        }
        match self.resource_limit {
            Some(limit) if self.live_resources() >= limit => {
                Err(BackdropError::Surface(wgpu::SurfaceError::OutOfMemory))
            }
            _ => Ok(()),
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.viewport = viewport;

        let mut container = self.container.borrow_mut();
        if let Some(child) = container.children.iter_mut().find(|c| c.id == self.id) {
            child.viewport = viewport;
        }
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId> {
        self.reserve()?;
        Ok(self.geometries.insert(geometry.vertex_count()))
    }

    fn create_material(&mut self, material: &Material) -> Result<MaterialId> {
        self.reserve()?;
        Ok(self.materials.insert(*material))
    }

    fn release_geometry(&mut self, id: GeometryId) {
        self.geometries.remove(id);
    }

    fn release_material(&mut self, id: MaterialId) {
        self.materials.remove(id);
    }

    fn live_resources(&self) -> usize {
        self.geometries.len() + self.materials.len()
    }

    fn render(&mut self, scene: &Scene) -> Result<()> {
        if self.disposed {
            return Err(BackdropError::Surface(wgpu::SurfaceError::Lost));
        }
        for drawable in scene.drawables() {
            if !self.geometries.contains_key(drawable.mesh.geometry)
                || !self.materials.contains_key(drawable.mesh.material)
            {
                log::warn!("Drawable references a released resource");
            }
        }

        self.frames_rendered += 1;
        self.container.borrow_mut().frames_presented += 1;
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.geometries.is_empty() || !self.materials.is_empty() {
            log::warn!(
                "Disposing surface with {} live resources",
                self.live_resources()
            );
        }
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_and_unmount_track_children() {
        let mut container = HeadlessContainer::new(800, 600);
        assert_eq!(container.child_count(), 0);

        let surface = container.mount_surface(container.viewport()).unwrap();
        assert_eq!(container.child_count(), 1);
        assert_eq!(container.child_viewports(), vec![Viewport::new(800, 600)]);

        container.unmount_surface(surface);
        assert_eq!(container.child_count(), 0);
    }

    #[test]
    fn no_renderer_fails_to_mount() {
        let mut container = HeadlessContainer::without_renderer(800, 600);
        let err = container.mount_surface(container.viewport()).unwrap_err();
        assert!(matches!(err, BackdropError::Adapter(_)));
        assert_eq!(container.child_count(), 0);
    }

    #[test]
    fn resources_are_counted() {
        let mut container = HeadlessContainer::new(4, 4);
        let mut surface = container.mount_surface(container.viewport()).unwrap();

        let geometry = surface.create_geometry(&Geometry::wire_cube(1.0)).unwrap();
        let material = surface
            .create_material(&Material::Wireframe { color: [1.0; 3], opacity: 0.3 })
            .unwrap();
        assert_eq!(surface.live_resources(), 2);
        assert_eq!(surface.geometry_vertices(geometry), Some(24));

        surface.release_geometry(geometry);
        surface.release_material(material);
        surface.release_material(material); // Already gone
        assert_eq!(surface.live_resources(), 0);
    }

    #[test]
    fn resource_limit_refuses_allocation() {
        let mut container = HeadlessContainer::new(4, 4).with_resource_limit(1);
        let mut surface = container.mount_surface(container.viewport()).unwrap();

        surface.create_geometry(&Geometry::wire_cube(1.0)).unwrap();
        let err = surface
            .create_material(&Material::Sprites { size: 0.8, opacity: 0.8 })
            .unwrap_err();
        assert!(matches!(err, BackdropError::Surface(_)));
    }

    #[test]
    fn resize_updates_child_record_and_ignores_zero() {
        let mut container = HeadlessContainer::new(800, 600);
        let mut surface = container.mount_surface(container.viewport()).unwrap();

        surface.resize(Viewport::new(1024, 768));
        assert_eq!(container.child_viewports(), vec![Viewport::new(1024, 768)]);

        surface.resize(Viewport::new(0, 768));
        assert_eq!(surface.viewport(), Viewport::new(1024, 768));
    }

    #[test]
    fn disposed_surface_refuses_work() {
        let mut container = HeadlessContainer::new(4, 4);
        let mut surface = container.mount_surface(container.viewport()).unwrap();
        surface.dispose();

        assert!(surface.is_disposed());
        assert!(surface.create_geometry(&Geometry::wire_cube(1.0)).is_err());
    }
}
