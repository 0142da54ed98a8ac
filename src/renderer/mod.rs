pub mod lights;
pub mod shadows;

pub use lights::DirectionalLight;
pub use shadows::{
    cascade_splits, fit_cascade, CameraFrustum, CascadeFit, CascadeShadow, CascadeShadowRaw,
    ShadowCascades, CASCADE_COUNT,
};
