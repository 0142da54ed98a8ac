pub mod error;
pub mod renderer;
pub mod scene;
pub mod settings;

use std::path::Path;
use std::time::Instant;

use error::EngineError;
use glam::Vec3;
use scene::{Model, Scene, SceneLoader, Transform};
use settings::EngineSettings;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Imports a glTF model, bakes its animations and fits the shadow cascades
/// for the default camera. Returns the scene holding the baked model.
pub fn run(model_path: &Path, settings: &EngineSettings) -> Result<Scene, EngineError> {
    let model_id = model_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    let started = Instant::now();
    let imported = SceneLoader::load_gltf(model_path)?;
    let model = Model::from_import(model_id.clone(), &imported)?;
    log::info!(
        "Baked '{}' in {:.2?}: {} meshes, {} bones",
        model_id,
        started.elapsed(),
        model.meshes().len(),
        model.bones().len()
    );
    for (index, animation) in model.animations().iter().enumerate() {
        log::info!(
            "  [{}] '{}': {} frames, duration {:.3}",
            index,
            animation.name,
            animation.frame_count(),
            animation.duration
        );
    }

    let mut scene = Scene::new(
        settings,
        settings.resolution.width,
        settings.resolution.height,
    );
    scene.add_model(model);
    scene.spawn(&model_id, &model_id, Transform::IDENTITY)?;

    scene.camera_mut().set_position(Vec3::new(0.0, 1.0, 5.0));
    scene.update_shadows()?;
    for (index, cascade) in scene.shadows().cascades().iter().enumerate() {
        log::info!("Cascade {}: split depth {:.3}", index, cascade.split_depth);
    }

    Ok(scene)
}
