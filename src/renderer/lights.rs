use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Scene-wide directional light. `direction` is the way the light travels,
/// from the light into the scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    #[serde(default = "DirectionalLight::default_direction")]
    pub direction: [f32; 3],
    #[serde(default = "DirectionalLight::default_color")]
    pub color: [f32; 3],
    #[serde(default = "DirectionalLight::default_intensity")]
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Self::default_direction(),
            color: Self::default_color(),
            intensity: Self::default_intensity(),
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.to_array(),
            color: color.to_array(),
            intensity,
        }
    }

    /// Unit travel direction, or zero if the configured vector is degenerate.
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction).normalize_or_zero()
    }

    pub fn color(&self) -> Vec3 {
        Vec3::from_array(self.color)
    }

    fn default_direction() -> [f32; 3] {
        [0.0, -1.0, -1.0]
    }

    fn default_color() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }

    const fn default_intensity() -> f32 {
        1.0
    }
}
