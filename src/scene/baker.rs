use glam::Mat4;

use crate::error::SceneError;
use crate::scene::animation::{AnimatedFrame, Animation, ClipSource, KeyframeChannel};
use crate::scene::bones::{BoneOwnership, BoneTable};
use crate::scene::node::NodeTree;

/// Turns keyframe clips into flat per-frame bone palettes.
///
/// Each frame walks the hierarchy once, replacing the local transform of
/// animated nodes with their sampled keys, and writes
/// `inverse(root) · G_node · offset` into the slot of every bone the node
/// owns. Slots of bones that no node owns stay at identity.
pub struct AnimationBaker<'a> {
    tree: &'a NodeTree,
    bones: &'a BoneTable,
    ownership: BoneOwnership,
    global_inverse: Mat4,
}

impl<'a> AnimationBaker<'a> {
    pub fn new(tree: &'a NodeTree, bones: &'a BoneTable) -> Result<Self, SceneError> {
        let ownership = bones.ownership(tree)?;
        Self::with_ownership(tree, bones, ownership)
    }

    /// Like [`AnimationBaker::new`] with an ownership map the caller already
    /// validated against `tree`.
    pub fn with_ownership(
        tree: &'a NodeTree,
        bones: &'a BoneTable,
        ownership: BoneOwnership,
    ) -> Result<Self, SceneError> {
        let root = tree.root();
        let determinant = root.local_transform.determinant();
        if !determinant.is_finite() || determinant == 0.0 {
            return Err(SceneError::SingularRootTransform(root.name.clone()));
        }
        let global_inverse = root.local_transform.inverse();

        Ok(Self {
            tree,
            bones,
            ownership,
            global_inverse,
        })
    }

    pub fn bake_all(&self, clips: &[ClipSource]) -> Vec<Animation> {
        clips.iter().map(|clip| self.bake(clip)).collect()
    }

    pub fn bake(&self, clip: &ClipSource) -> Animation {
        let frame_count = clip.frame_count();
        let channels = self.channels_by_node(clip);

        let frames = (0..frame_count)
            .map(|frame| self.bake_frame(&channels, frame))
            .collect();

        log::debug!(
            "Baked clip '{}': {} frames from {} channels",
            clip.name,
            frame_count,
            clip.channels.len()
        );

        Animation {
            name: clip.name.clone(),
            duration: clip.duration,
            frames,
        }
    }

    /// Resolves channels to nodes by name. The first channel naming a node
    /// wins.
    fn channels_by_node<'c>(&self, clip: &'c ClipSource) -> Vec<Option<&'c KeyframeChannel>> {
        let mut channels = vec![None; self.tree.len()];

        for channel in &clip.channels {
            let mut matched = false;
            for node in self.tree.find_all(&channel.node_name) {
                matched = true;
                if channels[node].is_none() {
                    channels[node] = Some(channel);
                }
            }

            if !matched {
                log::warn!(
                    "Animation '{}' has a channel for unknown node '{}'",
                    clip.name,
                    channel.node_name
                );
            }
        }

        channels
    }

    fn bake_frame(&self, channels: &[Option<&KeyframeChannel>], frame: usize) -> AnimatedFrame {
        let mut animated = AnimatedFrame::identity();

        self.tree.traverse(
            |id, node| match channels[id] {
                Some(channel) => channel.sample(frame),
                None => node.local_transform,
            },
            |id, _, global| {
                for &bone_id in self.ownership.bones_of(id) {
                    if let Some(bone) = self.bones.get(bone_id) {
                        animated.set_bone_matrix(bone_id, self.global_inverse * global * bone.offset);
                    }
                }
            },
        );

        animated
    }
}
