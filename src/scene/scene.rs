// scene/scene.rs - entities, loaded models and per-frame shadow state
use std::collections::HashMap;

use glam::{Mat4, Vec3};
use hecs::World;

use super::animation::{AnimationPlayer, DEFAULT_BONE_PALETTE};
use super::components::*;
use crate::error::{SceneError, ShadowError};
use crate::renderer::lights::DirectionalLight;
use crate::renderer::shadows::{CameraFrustum, ShadowCascades};
use crate::scene::{Camera, Model, Projection, Transform};
use crate::settings::EngineSettings;

pub struct Scene {
    pub world: World,
    models: HashMap<String, Model>,
    camera: Camera,
    projection: Projection,
    light: DirectionalLight,
    shadows: ShadowCascades,
}

impl Scene {
    pub fn new(settings: &EngineSettings, width: u32, height: u32) -> Self {
        let projection = Projection::new(
            settings.projection.fov_y_degrees.to_radians(),
            width,
            height,
            settings.projection.near,
            settings.projection.far,
        );

        Self {
            world: World::new(),
            models: HashMap::new(),
            camera: Camera::default(),
            projection,
            light: settings.light,
            shadows: ShadowCascades::new(settings.shadows.split_lambda),
        }
    }

    /// Registers a fully baked model, replacing any model with the same id.
    pub fn add_model(&mut self, model: Model) -> Option<Model> {
        self.models.insert(model.id().to_string(), model)
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Spawns an instance of a registered model. Animated models start on
    /// their first clip at frame 0.
    pub fn spawn(
        &mut self,
        name: &str,
        model_id: &str,
        transform: Transform,
    ) -> Result<hecs::Entity, SceneError> {
        let model = self
            .models
            .get(model_id)
            .ok_or_else(|| SceneError::UnknownModel(model_id.to_string()))?;

        let mut builder = hecs::EntityBuilder::new();
        builder.add(Name::new(name));
        builder.add(ModelComponent(model_id.to_string()));
        builder.add(TransformComponent(transform));
        if model.is_animated() {
            builder.add(AnimationPlayer::new(0));
        }

        let entity = self.world.spawn(builder.build());
        log::debug!("Spawned '{}' ({}) as {:?}", name, model_id, entity);
        Ok(entity)
    }

    /// Switches an entity to another clip of its model, restarting at frame 0.
    pub fn play_animation(&mut self, entity: hecs::Entity, clip_index: usize) -> bool {
        let Ok(model_id) = self.world.get::<&ModelComponent>(entity).map(|m| m.0.clone()) else {
            return false;
        };
        let clip_exists = self
            .models
            .get(&model_id)
            .is_some_and(|model| model.animation(clip_index).is_some());
        if !clip_exists {
            log::warn!("Model '{}' has no animation {}", model_id, clip_index);
            return false;
        }

        match self.world.get::<&mut AnimationPlayer>(entity) {
            Ok(mut player) => {
                player.set_animation(clip_index);
                true
            }
            Err(_) => false,
        }
    }

    /// Advances every animated entity by one baked frame.
    pub fn tick_animations(&mut self) {
        for (_, (model_ref, player)) in self
            .world
            .query_mut::<(&ModelComponent, &mut AnimationPlayer)>()
        {
            let Some(animation) = self
                .models
                .get(&model_ref.0)
                .and_then(|model| model.animation(player.clip_index))
            else {
                continue;
            };
            player.next_frame(animation);
        }
    }

    /// Bone palette to upload for an entity: its current baked frame, or the
    /// all-zero default palette when it is not animated.
    pub fn bone_palette(&self, entity: hecs::Entity) -> Vec<[[f32; 4]; 4]> {
        let frame = self
            .world
            .get::<&ModelComponent>(entity)
            .ok()
            .zip(self.world.get::<&AnimationPlayer>(entity).ok())
            .and_then(|(model_ref, player)| {
                let animation = self.models.get(&model_ref.0)?.animation(player.clip_index)?;
                player.current_frame(animation).map(|frame| frame.to_raw())
            });

        frame.unwrap_or_else(|| DEFAULT_BONE_PALETTE.to_vec())
    }

    pub fn model_matrix(&self, entity: hecs::Entity) -> Option<Mat4> {
        self.world
            .get::<&TransformComponent>(entity)
            .ok()
            .map(|transform| transform.0.matrix())
    }

    pub fn camera_frustum(&self) -> CameraFrustum {
        CameraFrustum {
            view: self.camera.view(),
            projection: self.projection.matrix(),
            near: self.projection.near,
            far: self.projection.far,
        }
    }

    /// Refits the shadow cascades to the current camera and light. Call once
    /// per frame before the shadow pass.
    pub fn update_shadows(&mut self) -> Result<(), ShadowError> {
        let frustum = self.camera_frustum();
        self.shadows
            .update(&frustum, self.light.direction(), Vec3::Y)
    }

    pub fn shadows(&self) -> &ShadowCascades {
        &self.shadows
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    pub fn light(&self) -> &DirectionalLight {
        &self.light
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.light = light;
    }
}
