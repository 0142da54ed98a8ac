// scene/mod.rs

pub mod animation;
pub mod baker;
pub mod bones;
pub mod camera;
pub mod components;
pub mod loader;
pub mod model;
pub mod node;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use animation::{
    AnimatedFrame, Animation, AnimationPlayer, ClipSource, KeyframeChannel, DEFAULT_BONE_PALETTE,
};
pub use baker::AnimationBaker;
pub use bones::{Bone, BoneReference, BoneTable, VertexInfluence, VertexWeight, MAX_BONES, MAX_WEIGHTS};
pub use camera::{Camera, Projection};
pub use loader::SceneLoader;
pub use model::{ImportedMesh, ImportedScene, Model, SkinnedMesh};
pub use node::{IndexedNode, Node, NodeId, NodeTree, RawNode};
pub use scene::Scene;
pub use transform::Transform;

pub use components::{ModelComponent, Name, TransformComponent};
