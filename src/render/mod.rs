mod gpu_surface;
mod headless;

pub use gpu_surface::GpuSurface;
pub use headless::{HeadlessContainer, HeadlessSurface};

use crate::core::Viewport;
use crate::error::Result;
use crate::scene::{Geometry, Scene};

slotmap::new_key_type! {
    /// Vertex buffer owned by a render surface
    pub struct GeometryId;
    /// Shading parameters owned by a render surface
    pub struct MaterialId;
}

/// How an object is shaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Additive, vertex-coloured, camera-facing sprites
    Sprites { size: f32, opacity: f32 },
    /// Alpha-blended lines in a flat colour
    Wireframe { color: [f32; 3], opacity: f32 },
}

/// Target the scene is drawn into
///
/// Every geometry and material created here must be handed back through
/// the matching `release_*` call before `dispose`.
pub trait RenderSurface {
    /// Internal pixel dimensions
    fn viewport(&self) -> Viewport;

    fn resize(&mut self, viewport: Viewport);

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId>;

    fn create_material(&mut self, material: &Material) -> Result<MaterialId>;

    /// Unknown ids are ignored
    fn release_geometry(&mut self, id: GeometryId);

    /// Unknown ids are ignored
    fn release_material(&mut self, id: MaterialId);

    /// Geometries plus materials not yet released
    fn live_resources(&self) -> usize;

    /// Draw one frame from the scene's uploaded objects
    fn render(&mut self, scene: &Scene) -> Result<()>;

    /// Release the surface itself; the surface is unusable afterwards
    fn dispose(&mut self);
}
