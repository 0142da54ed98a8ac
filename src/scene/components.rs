// scene/components.rs
// Pure hecs components

use crate::scene::Transform;

/// Placement of an entity in the world.
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// Id of the [`Model`](crate::scene::Model) an entity draws.
#[derive(Debug, Clone)]
pub struct ModelComponent(pub String);

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
