use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec2, Vec3};

/// First-person camera: a position plus pitch (x) and yaw (y) in radians.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    position: Vec3,
    rotation: Vec2,
    view: Mat4,
}

impl Camera {
    pub fn new(position: Vec3, rotation: Vec2) -> Self {
        let mut camera = Self {
            position,
            rotation,
            view: Mat4::IDENTITY,
        };
        camera.recalculate();
        camera
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate();
    }

    pub fn set_rotation(&mut self, pitch: f32, yaw: f32) {
        self.rotation = Vec2::new(pitch, yaw);
        self.recalculate();
    }

    /// Pitch is clamped so the camera never turns upside down, yaw wraps.
    pub fn add_rotation(&mut self, pitch: f32, yaw: f32) {
        self.rotation.x = (self.rotation.x + pitch).clamp(-FRAC_PI_2, FRAC_PI_2);
        self.rotation.y = (self.rotation.y + yaw).rem_euclid(TAU);
        self.recalculate();
    }

    /// Horizontal direction the camera faces.
    fn forward(&self) -> Vec3 {
        Vec3::new(self.rotation.y.sin(), 0.0, -self.rotation.y.cos())
    }

    /// Camera +X axis in world space, flattened onto the ground plane.
    fn right(&self) -> Vec3 {
        let right = self.view.row(0).truncate();
        Vec3::new(right.x, 0.0, right.z)
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward() * distance;
        self.recalculate();
    }

    pub fn move_backwards(&mut self, distance: f32) {
        self.position -= self.forward() * distance;
        self.recalculate();
    }

    pub fn move_left(&mut self, distance: f32) {
        self.position -= self.right() * distance;
        self.recalculate();
    }

    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right() * distance;
        self.recalculate();
    }

    pub fn move_up(&mut self, distance: f32) {
        self.position.y += distance;
        self.recalculate();
    }

    pub fn move_down(&mut self, distance: f32) {
        self.position.y -= distance;
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.view = Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_translation(-self.position);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec2::ZERO)
    }
}

/// Perspective projection with a `[0, 1]` depth range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(fov_y_radians: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        let mut projection = Self {
            fov_y_radians,
            aspect: 1.0,
            near,
            far,
        };
        projection.resize(width, height);
        projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_radians: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}
