use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BackdropError, Result};

/// Tunables for the animated background
///
/// Every field has a default, so a config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// Number of points in the particle field
    pub particle_count: usize,
    /// Particle position components lie in `[-extent, extent]`
    pub particle_extent: f32,
    /// World-space sprite size
    pub particle_size: f32,
    pub particle_opacity: f32,
    /// Field rotation rate around (x, y) in rad/s
    pub field_spin: [f32; 2],

    /// Number of floating wireframe shapes
    pub shape_count: usize,
    /// Shape position components lie in `[-extent, extent]`
    pub shape_extent: f32,
    pub shape_scale: [f32; 2],
    /// Upper bound of the per-axis rotation speed, rad/frame
    pub max_rotation_speed: f32,
    pub shape_opacity: f32,
    /// Angular rate of the vertical bobbing, rad/s
    pub float_frequency: f32,
    /// Half-range of the vertical bobbing
    pub float_amplitude: f32,

    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_distance: f32,
    /// Orbit amplitudes along (x, y)
    pub orbit_amplitude: [f32; 2],
    /// Orbit angular rates along (x, y), rad/s
    pub orbit_rate: [f32; 2],

    /// RGBA clear colour, transparent by default
    pub clear_color: [f64; 4],
    /// Multisample the window surface when the adapter supports it
    pub antialias: bool,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            particle_count: 2000,
            particle_extent: 30.0,
            particle_size: 0.8,
            particle_opacity: 0.8,
            field_spin: [0.05, 0.1],

            shape_count: 15,
            shape_extent: 20.0,
            shape_scale: [0.4, 1.0],
            max_rotation_speed: 0.02,
            shape_opacity: 0.3,
            float_frequency: 0.5,
            float_amplitude: 1.2,

            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_distance: 15.0,
            orbit_amplitude: [2.0, 1.0],
            orbit_rate: [0.1, 0.08],

            clear_color: [0.0, 0.0, 0.0, 0.0],
            antialias: true,
        }
    }
}

impl BackdropConfig {
    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scene cannot be generated or projected from
    pub fn validate(&self) -> Result<()> {
        check(non_negative(self.particle_extent), "particle_extent", NON_NEGATIVE)?;
        check(non_negative(self.particle_size), "particle_size", NON_NEGATIVE)?;
        check(unit(self.particle_opacity), "particle_opacity", UNIT)?;
        check(self.field_spin.iter().all(|v| v.is_finite()), "field_spin", FINITE)?;

        check(non_negative(self.shape_extent), "shape_extent", NON_NEGATIVE)?;
        let [min_scale, max_scale] = self.shape_scale;
        check(
            positive(min_scale) && max_scale.is_finite() && min_scale <= max_scale,
            "shape_scale",
            "must be a positive [min, max] range",
        )?;
        check(non_negative(self.max_rotation_speed), "max_rotation_speed", NON_NEGATIVE)?;
        check(unit(self.shape_opacity), "shape_opacity", UNIT)?;
        check(self.float_frequency.is_finite(), "float_frequency", FINITE)?;
        check(non_negative(self.float_amplitude), "float_amplitude", NON_NEGATIVE)?;

        check(
            self.fov_degrees > 0.0 && self.fov_degrees < 180.0,
            "fov_degrees",
            "must lie in (0, 180)",
        )?;
        check(positive(self.near), "near", "must be positive")?;
        check(
            self.far.is_finite() && self.far > self.near,
            "far",
            "must be greater than near",
        )?;
        check(self.camera_distance.is_finite(), "camera_distance", FINITE)?;
        check(self.orbit_amplitude.iter().all(|v| v.is_finite()), "orbit_amplitude", FINITE)?;
        check(self.orbit_rate.iter().all(|v| v.is_finite()), "orbit_rate", FINITE)?;
        Ok(())
    }
}

const FINITE: &str = "must be finite";
const NON_NEGATIVE: &str = "must be finite and non-negative";
const UNIT: &str = "must lie in [0, 1]";

fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(BackdropError::InvalidConfig { field, reason })
    }
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}
