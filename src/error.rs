use thiserror::Error;

/// Errors raised while importing a model, building its hierarchy or baking
/// its animations.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("model uses {count} bones but at most {max} are supported")]
    TooManyBones { count: usize, max: usize },

    #[error("node name '{0}' owns a bone but appears more than once in the hierarchy")]
    DuplicateBoneOwner(String),

    #[error("node {0} is reachable through more than one parent")]
    CyclicHierarchy(usize),

    #[error("node index {0} is out of range")]
    InvalidNodeIndex(usize),

    #[error("root node '{0}' has a non-invertible transform")]
    SingularRootTransform(String),

    #[error("scene has no root node")]
    EmptyHierarchy,

    #[error("animation '{clip}' has a channel for node '{node}' without keyframe data")]
    MissingKeyframes { clip: String, node: String },

    #[error("model '{0}' is not registered in the scene")]
    UnknownModel(String),

    #[error("failed to import glTF: {0}")]
    Import(#[from] gltf::Error),
}

/// Errors raised while fitting cascaded shadow frustums.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShadowError {
    #[error("invalid clip range: near {near}, far {far}")]
    InvalidClipRange { near: f32, far: f32 },

    #[error("invalid split range [{start}, {end}]")]
    InvalidSplitRange { start: f32, end: f32 },

    #[error("camera view-projection matrix is not invertible")]
    DegenerateFrustum,

    #[error("light direction has zero length")]
    ZeroLightDirection,
}

/// Top-level error for the headless bake tool.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Shadow(#[from] ShadowError),
}
