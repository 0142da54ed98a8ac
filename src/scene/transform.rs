use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Composes `translate · rotate · scale`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    /// Builds a transform from optional components. A missing component keeps
    /// its identity value.
    pub fn from_parts(t: Option<Vec3>, r: Option<Quat>, s: Option<Vec3>) -> Self {
        Self::from_trs(
            t.unwrap_or(Vec3::ZERO),
            r.unwrap_or(Quat::IDENTITY),
            s.unwrap_or(Vec3::ONE),
        )
    }
}
