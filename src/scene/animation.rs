use glam::{Mat4, Quat, Vec3};

use crate::scene::bones::MAX_BONES;
use crate::scene::transform::Transform;

/// Palette used for entities that are not animated.
pub const DEFAULT_BONE_PALETTE: [[[f32; 4]; 4]; MAX_BONES] = [[[0.0; 4]; 4]; MAX_BONES];

/// Keyframes of one node for one clip. Time is the key ordinal; the three
/// tracks may have different lengths, including zero.
#[derive(Debug, Clone, Default)]
pub struct KeyframeChannel {
    pub node_name: String,
    pub positions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub scales: Vec<Vec3>,
}

impl KeyframeChannel {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Self::default()
        }
    }

    /// Longest of the three tracks.
    pub fn key_count(&self) -> usize {
        self.positions
            .len()
            .max(self.scales.len())
            .max(self.rotations.len())
    }

    /// Local transform at `frame`.
    ///
    /// Each track is sampled on its own at `min(frame, len - 1)` and the key
    /// is used as is, without blending neighbours. An empty track contributes
    /// its identity component.
    pub fn sample(&self, frame: usize) -> Mat4 {
        Transform::from_parts(
            step_key(&self.positions, frame),
            step_key(&self.rotations, frame),
            step_key(&self.scales, frame),
        )
        .matrix()
    }
}

fn step_key<T: Copy>(keys: &[T], frame: usize) -> Option<T> {
    keys.get(frame.min(keys.len().checked_sub(1)?)).copied()
}

/// An animation clip as imported, before baking.
#[derive(Debug, Clone, Default)]
pub struct ClipSource {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<KeyframeChannel>,
}

impl ClipSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: KeyframeChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Number of baked frames: the longest track over all channels.
    pub fn frame_count(&self) -> usize {
        self.channels
            .iter()
            .map(KeyframeChannel::key_count)
            .max()
            .unwrap_or(0)
    }
}

/// One baked instant of a clip: a full palette indexed by bone id.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedFrame {
    bone_matrices: Box<[Mat4; MAX_BONES]>,
}

impl Default for AnimatedFrame {
    fn default() -> Self {
        Self::identity()
    }
}

impl AnimatedFrame {
    pub fn identity() -> Self {
        Self {
            bone_matrices: Box::new([Mat4::IDENTITY; MAX_BONES]),
        }
    }

    pub fn bone_matrices(&self) -> &[Mat4; MAX_BONES] {
        &self.bone_matrices
    }

    pub fn bone_matrix(&self, id: usize) -> Option<Mat4> {
        self.bone_matrices.get(id).copied()
    }

    pub(crate) fn set_bone_matrix(&mut self, id: usize, matrix: Mat4) {
        self.bone_matrices[id] = matrix;
    }

    /// Column-major palette ready for a storage or uniform buffer.
    pub fn to_raw(&self) -> Vec<[[f32; 4]; 4]> {
        self.bone_matrices
            .iter()
            .map(Mat4::to_cols_array_2d)
            .collect()
    }
}

/// A baked clip. `duration` is informational; playback is frame based.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    pub frames: Vec<AnimatedFrame>,
}

impl Animation {
    pub fn frame(&self, index: usize) -> Option<&AnimatedFrame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Per-entity playback state: which clip and which baked frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationPlayer {
    pub clip_index: usize,
    pub frame_index: usize,
}

impl AnimationPlayer {
    pub fn new(clip_index: usize) -> Self {
        Self {
            clip_index,
            frame_index: 0,
        }
    }

    pub fn set_animation(&mut self, clip_index: usize) {
        self.clip_index = clip_index;
        self.frame_index = 0;
    }

    /// Moves one frame forward, wrapping to frame 0 after the last one.
    pub fn next_frame(&mut self, animation: &Animation) {
        let next = self.frame_index + 1;
        self.frame_index = if next >= animation.frame_count() {
            0
        } else {
            next
        };
    }

    pub fn current_frame<'a>(&self, animation: &'a Animation) -> Option<&'a AnimatedFrame> {
        animation.frame(self.frame_index)
    }
}
