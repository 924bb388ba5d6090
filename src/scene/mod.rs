//! Scene graph of the animated background: one particle field, a fixed set
//! of floating wireframe shapes and the camera looking at them.

mod camera;
mod geometry;
mod particles;
mod shapes;

pub use camera::Camera;
pub use geometry::{Geometry, Topology};
pub use particles::ParticleField;
pub use shapes::{FloatingShape, ShapeKind};

use glam::Mat4;
use rand::Rng;
use serde::Serialize;

use crate::config::BackdropConfig;
use crate::error::Result;
use crate::render::{GeometryId, Material, MaterialId, RenderSurface};

/// GPU resources owned by one scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandles {
    pub geometry: GeometryId,
    pub material: MaterialId,
}

/// One object as the renderer sees it
#[derive(Debug, Clone, Copy)]
pub struct Drawable {
    pub mesh: MeshHandles,
    pub model: Mat4,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub particles: ParticleField,
    pub shapes: Vec<FloatingShape>,
    pub camera: Camera,
}

impl Scene {
    /// Build a scene from the injected random source
    ///
    /// Counts are fixed here for the lifetime of the scene.
    pub fn generate<R: Rng + ?Sized>(config: &BackdropConfig, aspect: f32, rng: &mut R) -> Self {
        let particles = ParticleField::generate(config, rng);
        let shapes = (0..config.shape_count)
            .map(|_| FloatingShape::generate(config, rng))
            .collect();

        Self {
            particles,
            shapes,
            camera: Camera::new(config, aspect),
        }
    }

    /// Apply the per-frame update for `time` seconds since start
    pub fn advance(&mut self, time: f32) {
        self.particles.advance(time);
        for shape in &mut self.shapes {
            shape.advance(time);
        }
        self.camera.orbit(time);
    }

    /// Number of renderable objects
    pub fn object_count(&self) -> usize {
        1 + self.shapes.len()
    }

    /// Allocate geometry and material for every object
    ///
    /// All or nothing: on failure everything allocated so far is released.
    pub fn upload<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> Result<()> {
        if let Err(e) = self.try_upload(surface) {
            self.release(surface);
            return Err(e);
        }
        log::debug!("Uploaded {} scene objects", self.object_count());
        Ok(())
    }

    fn try_upload<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> Result<()> {
        let geometry = self.particles.geometry();
        let material = self.particles.material();
        self.particles.mesh = Some(upload_mesh(surface, &geometry, &material)?);

        for shape in &mut self.shapes {
            let geometry = shape.kind.geometry();
            shape.mesh = Some(upload_mesh(surface, &geometry, &shape.material())?);
        }
        Ok(())
    }

    /// Free the geometry and material of every object
    pub fn release<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        let meshes = std::iter::once(&mut self.particles.mesh)
            .chain(self.shapes.iter_mut().map(|shape| &mut shape.mesh));

        for mesh in meshes {
            if let Some(handles) = mesh.take() {
                surface.release_geometry(handles.geometry);
                surface.release_material(handles.material);
            }
        }
    }

    /// Uploaded objects in draw order: particles first, then shapes
    pub fn drawables(&self) -> impl Iterator<Item = Drawable> + '_ {
        let particles = self.particles.mesh.map(|mesh| Drawable {
            mesh,
            model: self.particles.model_matrix(),
        });
        let shapes = self.shapes.iter().filter_map(|shape| {
            shape.mesh.map(|mesh| Drawable {
                mesh,
                model: shape.model_matrix(),
            })
        });
        particles.into_iter().chain(shapes)
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            particle_count: self.particles.len(),
            particle_rotation: self.particles.rotation.to_array(),
            camera_position: self.camera.position.to_array(),
            camera_aspect: self.camera.aspect,
            shapes: self
                .shapes
                .iter()
                .map(|shape| ShapeSnapshot {
                    kind: shape.kind,
                    position: shape.position.to_array(),
                    base_y: shape.base_y,
                    rotation: shape.rotation.to_array(),
                    scale: shape.scale,
                })
                .collect(),
        }
    }
}

fn upload_mesh<S: RenderSurface + ?Sized>(
    surface: &mut S,
    geometry: &Geometry,
    material: &Material,
) -> Result<MeshHandles> {
    let geometry = surface.create_geometry(geometry)?;
    match surface.create_material(material) {
        Ok(material) => Ok(MeshHandles { geometry, material }),
        Err(e) => {
            surface.release_geometry(geometry);
            Err(e)
        }
    }
}

/// Serialisable view of the animated state
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub particle_count: usize,
    pub particle_rotation: [f32; 3],
    pub camera_position: [f32; 3],
    pub camera_aspect: f32,
    pub shapes: Vec<ShapeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapeSnapshot {
    pub kind: ShapeKind,
    pub position: [f32; 3],
    pub base_y: f32,
    pub rotation: [f32; 3],
    pub scale: f32,
}
