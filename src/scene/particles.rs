use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use super::geometry::Geometry;
use super::MeshHandles;
use crate::config::BackdropConfig;
use crate::render::Material;

/// Red, green, blue ranges of the blue/purple particle palette
const PALETTE: [(f32, f32); 3] = [(0.3, 0.8), (0.2, 0.5), (0.3, 1.0)];

/// Point cloud spinning slowly around the origin
///
/// Point data never changes after creation; only the whole-field rotation does.
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    spin: [f32; 2],
    size: f32,
    opacity: f32,
    /// Euler XYZ rotation in radians
    pub rotation: Vec3,
    pub(crate) mesh: Option<MeshHandles>,
}

impl ParticleField {
    /// Scatter `particle_count` points uniformly in the configured cube
    pub fn generate<R: Rng + ?Sized>(config: &BackdropConfig, rng: &mut R) -> Self {
        let extent = config.particle_extent;
        let mut positions = Vec::with_capacity(config.particle_count);
        let mut colors = Vec::with_capacity(config.particle_count);

        for _ in 0..config.particle_count {
            positions.push([
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
            ]);
            colors.push(PALETTE.map(|(lo, hi)| rng.gen_range(lo..=hi)));
        }

        Self {
            positions,
            colors,
            spin: config.field_spin,
            size: config.particle_size,
            opacity: config.particle_opacity,
            rotation: Vec3::ZERO,
            mesh: None,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// Field rotation after `time` seconds; depends on nothing else
    pub fn rotation_at(&self, time: f32) -> Vec3 {
        Vec3::new(time * self.spin[0], time * self.spin[1], 0.0)
    }

    pub fn advance(&mut self, time: f32) {
        self.rotation = self.rotation_at(time);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_quat(Quat::from_euler(
            glam::EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ))
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::points(self.positions.clone(), self.colors.clone())
    }

    pub fn material(&self) -> Material {
        Material::Sprites {
            size: self.size,
            opacity: self.opacity,
        }
    }
}
