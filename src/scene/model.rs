use crate::error::SceneError;
use crate::scene::animation::{Animation, ClipSource};
use crate::scene::baker::AnimationBaker;
use crate::scene::bones::{BoneReference, BoneTable, VertexInfluence};
use crate::scene::node::NodeTree;

/// A mesh as handed over by an importer: its vertex count and the bones that
/// deform it.
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub vertex_count: usize,
    pub bones: Vec<BoneReference>,
}

/// Everything the engine keeps from an imported asset.
#[derive(Debug, Clone)]
pub struct ImportedScene {
    pub hierarchy: NodeTree,
    pub meshes: Vec<ImportedMesh>,
    pub clips: Vec<ClipSource>,
}

#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    pub name: String,
    pub influences: Vec<VertexInfluence>,
}

/// A loaded model with its skinning data and fully baked animations.
#[derive(Debug, Clone)]
pub struct Model {
    id: String,
    meshes: Vec<SkinnedMesh>,
    bones: BoneTable,
    animations: Vec<Animation>,
}

impl Model {
    /// Extracts the bone table from every mesh, then bakes every clip.
    ///
    /// Bone owners are validated against the hierarchy for every model.
    /// Baking completes before the model is returned and only runs when the
    /// scene has clips.
    pub fn from_import(id: impl Into<String>, scene: &ImportedScene) -> Result<Self, SceneError> {
        let id = id.into();
        let mut bones = BoneTable::new();

        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| {
                Ok(SkinnedMesh {
                    name: mesh.name.clone(),
                    influences: bones.extract_mesh(mesh.vertex_count, &mesh.bones)?,
                })
            })
            .collect::<Result<Vec<_>, SceneError>>()?;

        let ownership = bones.ownership(&scene.hierarchy)?;
        let animations = if scene.clips.is_empty() {
            Vec::new()
        } else {
            AnimationBaker::with_ownership(&scene.hierarchy, &bones, ownership)?
                .bake_all(&scene.clips)
        };

        log::info!(
            "Model '{}': {} meshes, {} bones, {} animations",
            id,
            meshes.len(),
            bones.len(),
            animations.len()
        );

        Ok(Self {
            id,
            meshes,
            bones,
            animations,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn meshes(&self) -> &[SkinnedMesh] {
        &self.meshes
    }

    pub fn bones(&self) -> &BoneTable {
        &self.bones
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn animation(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }

    pub fn find_animation(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|animation| animation.name == name)
    }

    pub fn is_animated(&self) -> bool {
        !self.animations.is_empty()
    }
}
