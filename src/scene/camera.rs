use glam::{Mat4, Vec3};

use crate::config::BackdropConfig;

/// Perspective camera drifting on a small orbit in front of the origin
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    orbit_amplitude: [f32; 2],
    orbit_rate: [f32; 2],
}

impl Camera {
    pub fn new(config: &BackdropConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
            fov_y: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
            orbit_amplitude: config.orbit_amplitude,
            orbit_rate: config.orbit_rate,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Move along the orbit for `time` seconds and re-aim at the origin
    pub fn orbit(&mut self, time: f32) {
        self.position.x = (time * self.orbit_rate[0]).sin() * self.orbit_amplitude[0];
        self.position.y = (time * self.orbit_rate[1]).cos() * self.orbit_amplitude[1];
        self.look_at(Vec3::ZERO);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&BackdropConfig::default(), 800.0 / 600.0)
    }

    #[test]
    fn starts_on_z_axis() {
        let camera = camera();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 15.0));
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn orbit_at_zero_sits_above_axis() {
        let mut camera = camera();
        camera.orbit(0.0);
        assert!(camera.position.x.abs() < 1e-6);
        assert!((camera.position.y - 1.0).abs() < 1e-6);
        assert_eq!(camera.position.z, 15.0);
    }

    #[test]
    fn orbit_stays_within_amplitude() {
        let mut camera = camera();
        for step in 0..1000 {
            camera.orbit(step as f32 * 0.37);
            assert!(camera.position.x.abs() <= 2.0 + 1e-5);
            assert!(camera.position.y.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn always_faces_origin() {
        let mut camera = camera();
        camera.orbit(12.5);

        // Origin sits straight ahead in view space
        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-4 && origin.y.abs() < 1e-4);
        assert!((origin.z + camera.position.length()).abs() < 1e-4);

        // and projects to the centre of the screen
        let clip = camera.projection_matrix()
            * camera.view_matrix()
            * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
    }
}
