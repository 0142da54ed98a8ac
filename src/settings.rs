use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::lights::DirectionalLight;
use crate::renderer::shadows::DEFAULT_SPLIT_LAMBDA;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub projection: ProjectionSettings,
    #[serde(default)]
    pub shadows: ShadowSettings,
    #[serde(default)]
    pub light: DirectionalLight,
    #[serde(default)]
    pub resolution: Resolution,
}

impl EngineSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<EngineSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded engine settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default engine settings.",
                        path, err
                    );
                    EngineSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Engine settings file {:?} not found. Using default settings.",
                    path
                );
                EngineSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default engine settings.",
                    path, err
                );
                EngineSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        let projection = &mut self.projection;
        if !(projection.fov_y_degrees > 0.0 && projection.fov_y_degrees < 180.0) {
            warn!("Field of view must be within (0, 180) degrees. Using default value.");
            projection.fov_y_degrees = ProjectionSettings::default_fov_y_degrees();
        }

        if !(projection.near > 0.0 && projection.far > projection.near) {
            warn!("Clip planes must satisfy 0 < near < far. Using default clip planes.");
            projection.near = ProjectionSettings::default_near();
            projection.far = ProjectionSettings::default_far();
        }

        if !(0.0..=1.0).contains(&self.shadows.split_lambda) {
            warn!("Cascade split lambda must be within [0, 1]. Using default value.");
            self.shadows.split_lambda = ShadowSettings::default_split_lambda();
        }

        if self.shadows.map_size == 0 {
            warn!("Shadow map size must be greater than zero. Using default value.");
            self.shadows.map_size = ShadowSettings::default_map_size();
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.light.direction() == glam::Vec3::ZERO {
            warn!("Light direction must not be zero. Using default direction.");
            self.light.direction = DirectionalLight::default().direction;
        }

        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSettings {
    #[serde(default = "ProjectionSettings::default_fov_y_degrees")]
    pub fov_y_degrees: f32,
    #[serde(default = "ProjectionSettings::default_near")]
    pub near: f32,
    #[serde(default = "ProjectionSettings::default_far")]
    pub far: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: Self::default_fov_y_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

impl ProjectionSettings {
    const fn default_fov_y_degrees() -> f32 {
        60.0
    }

    const fn default_near() -> f32 {
        0.01
    }

    const fn default_far() -> f32 {
        1000.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowSettings {
    #[serde(default = "ShadowSettings::default_split_lambda")]
    pub split_lambda: f32,
    #[serde(default = "ShadowSettings::default_map_size")]
    pub map_size: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            split_lambda: Self::default_split_lambda(),
            map_size: Self::default_map_size(),
        }
    }
}

impl ShadowSettings {
    const fn default_split_lambda() -> f32 {
        DEFAULT_SPLIT_LAMBDA
    }

    const fn default_map_size() -> u32 {
        4096
    }
}
