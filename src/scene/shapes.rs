use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use serde::Serialize;

use super::geometry::Geometry;
use super::MeshHandles;
use crate::config::BackdropConfig;
use crate::math::hsl_to_rgb;
use crate::render::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShapeKind {
    Cube,
    Sphere,
    Torus,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Cube, ShapeKind::Sphere, ShapeKind::Torus];

    pub fn geometry(self) -> Geometry {
        match self {
            ShapeKind::Cube => Geometry::wire_cube(1.0),
            ShapeKind::Sphere => Geometry::wire_sphere(0.5, 16, 16),
            ShapeKind::Torus => Geometry::wire_torus(0.5, 0.2, 8, 16),
        }
    }
}

/// Wireframe solid that spins and bobs in place
#[derive(Debug, Clone)]
pub struct FloatingShape {
    pub kind: ShapeKind,
    pub position: Vec3,
    /// Height the bobbing oscillates around
    pub base_y: f32,
    pub scale: f32,
    /// Euler XYZ rotation in radians
    pub rotation: Vec3,
    /// Added to `rotation` once per frame
    pub rotation_speed: Vec3,
    pub phase: f32,
    pub color: [f32; 3],
    opacity: f32,
    float_frequency: f32,
    float_amplitude: f32,
    pub(crate) mesh: Option<MeshHandles>,
}

impl FloatingShape {
    pub fn generate<R: Rng + ?Sized>(config: &BackdropConfig, rng: &mut R) -> Self {
        let kind = ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())];
        let extent = config.shape_extent;
        let position = Vec3::new(
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
        );
        let [min_scale, max_scale] = config.shape_scale;
        let scale = rng.gen_range(min_scale..=max_scale);
        let max_speed = config.max_rotation_speed;
        let rotation_speed = Vec3::new(
            rng.gen_range(0.0..=max_speed),
            rng.gen_range(0.0..=max_speed),
            rng.gen_range(0.0..=max_speed),
        );
        let phase = rng.gen_range(0.0..TAU);
        let color = hsl_to_rgb(rng.gen_range(0.6..=0.9), 0.7, 0.6);

        Self {
            kind,
            position,
            base_y: position.y,
            scale,
            rotation: Vec3::ZERO,
            rotation_speed,
            phase,
            color,
            opacity: config.shape_opacity,
            float_frequency: config.float_frequency,
            float_amplitude: config.float_amplitude,
            mesh: None,
        }
    }

    /// Vertical offset from `base_y` at `time` seconds
    pub fn float_offset(&self, time: f32) -> f32 {
        (time * self.float_frequency + self.phase).sin() * self.float_amplitude
    }

    pub fn advance(&mut self, time: f32) {
        self.rotation += self.rotation_speed;
        self.position.y = self.base_y + self.float_offset(time);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(
                glam::EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            ),
            self.position,
        )
    }

    pub fn material(&self) -> Material {
        Material::Wireframe {
            color: self.color,
            opacity: self.opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn shapes(seed: u64, n: usize) -> Vec<FloatingShape> {
        let config = BackdropConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| FloatingShape::generate(&config, &mut rng)).collect()
    }

    #[test]
    fn attributes_within_ranges() {
        for shape in shapes(3, 200) {
            for c in shape.position.to_array() {
                assert!((-20.0..=20.0).contains(&c));
            }
            assert!((0.4..=1.0).contains(&shape.scale));
            for s in shape.rotation_speed.to_array() {
                assert!((0.0..=0.02).contains(&s));
            }
            assert!((0.0..TAU).contains(&shape.phase));
            assert_eq!(shape.base_y, shape.position.y);
        }
    }

    #[test]
    fn every_kind_appears() {
        let kinds: Vec<_> = shapes(5, 60).iter().map(|s| s.kind).collect();
        for kind in ShapeKind::ALL {
            assert!(kinds.contains(&kind), "{:?} never generated", kind);
        }
    }

    #[test]
    fn rotation_accumulates_per_frame() {
        let mut shape = shapes(9, 1).remove(0);
        for frame in 0..10 {
            shape.advance(frame as f32 / 60.0);
        }
        let expected = shape.rotation_speed * 10.0;
        assert!((shape.rotation - expected).length() < 1e-5);
    }

    #[test]
    fn bobbing_is_bounded() {
        let mut shape = shapes(13, 1).remove(0);
        let base = shape.base_y;

        for frame in 0..10_000 {
            shape.advance(frame as f32 * 0.016);
            assert!((shape.position.y - base).abs() <= 1.2 + 1e-4);
        }
    }

    #[test]
    fn bobbing_follows_phase() {
        let mut shape = shapes(21, 1).remove(0);
        shape.advance(0.0);
        let expected = shape.base_y + shape.phase.sin() * 1.2;
        assert!((shape.position.y - expected).abs() < 1e-5);
    }
}
