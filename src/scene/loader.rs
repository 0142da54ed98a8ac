// scene/loader.rs - glTF import into the engine's hierarchy, bone and clip data
use std::collections::HashMap;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use crate::error::SceneError;
use crate::scene::animation::{ClipSource, KeyframeChannel};
use crate::scene::bones::{BoneReference, VertexWeight};
use crate::scene::model::{ImportedMesh, ImportedScene};
use crate::scene::node::{IndexedNode, NodeTree};

const SYNTHETIC_ROOT_NAME: &str = "RootNode";

pub struct SceneLoader;

impl SceneLoader {
    /// Reads a `.gltf` or `.glb` file. Images are never decoded.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<ImportedScene, SceneError> {
        let path = path.as_ref();
        log::info!("=== Loading glTF: {:?} ===", path);

        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)?;

        Self::from_document(&document, &buffers)
    }

    pub fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Result<ImportedScene, SceneError> {
        log::info!(
            "Document info: {} nodes, {} meshes, {} skins, {} animations",
            document.nodes().len(),
            document.meshes().len(),
            document.skins().len(),
            document.animations().len()
        );

        let hierarchy = Self::load_hierarchy(document)?;
        log::info!("Loaded hierarchy with {} nodes", hierarchy.len());

        let meshes = Self::load_meshes(document, buffers)?;
        log::info!("Loaded {} mesh primitives", meshes.len());

        let clips = Self::load_animations(document, buffers)?;
        if clips.is_empty() {
            log::info!("No animations in glTF document");
        } else {
            log::info!("Loaded {} animation clips", clips.len());
        }

        Ok(ImportedScene {
            hierarchy,
            meshes,
            clips,
        })
    }

    fn node_name(node: &gltf::Node) -> String {
        node.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Node_{}", node.index()))
    }

    /// Builds the node tree of the default scene. Several root nodes are
    /// gathered under an identity root so the model has a single root.
    fn load_hierarchy(document: &gltf::Document) -> Result<NodeTree, SceneError> {
        let mut nodes: Vec<IndexedNode> = document
            .nodes()
            .map(|node| IndexedNode {
                name: Self::node_name(&node),
                transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
                children: node.children().map(|child| child.index()).collect(),
            })
            .collect();

        let roots: Vec<usize> = match document
            .default_scene()
            .or_else(|| document.scenes().next())
        {
            Some(scene) => scene.nodes().map(|node| node.index()).collect(),
            None => {
                let mut has_parent = vec![false; nodes.len()];
                for node in &nodes {
                    for &child in &node.children {
                        if let Some(flag) = has_parent.get_mut(child) {
                            *flag = true;
                        }
                    }
                }
                (0..nodes.len()).filter(|&index| !has_parent[index]).collect()
            }
        };

        let root = if roots.is_empty() {
            return Err(SceneError::EmptyHierarchy);
        } else if roots.len() == 1 {
            roots[0]
        } else {
            log::debug!(
                "Scene has {} root nodes, adding '{}'",
                roots.len(),
                SYNTHETIC_ROOT_NAME
            );
            nodes.push(IndexedNode {
                name: SYNTHETIC_ROOT_NAME.to_string(),
                transform: Mat4::IDENTITY,
                children: roots,
            });
            nodes.len() - 1
        };

        NodeTree::from_indexed(&nodes, root)
    }

    /// One imported mesh per primitive of every mesh-carrying node. Bones come
    /// from the node's skin: joint name, inverse bind matrix as offset, and
    /// the JOINTS_0/WEIGHTS_0 influences regrouped per joint.
    fn load_meshes(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Vec<ImportedMesh>, SceneError> {
        let mut meshes = Vec::new();

        for node in document.nodes() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let mesh_name = mesh.name().map(str::to_string).unwrap_or_else(|| Self::node_name(&node));

            let skin_joints = match node.skin() {
                Some(skin) => Self::load_skin_joints(&skin, buffers),
                None => Vec::new(),
            };

            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()].0));
                let vertex_count = reader
                    .read_positions()
                    .map(|positions| positions.count())
                    .unwrap_or(0);

                let mut bones: Vec<BoneReference> = skin_joints
                    .iter()
                    .map(|(name, offset)| BoneReference {
                        name: name.clone(),
                        offset: *offset,
                        weights: Vec::new(),
                    })
                    .collect();

                if let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) {
                    for (vertex_id, (joint_set, weight_set)) in
                        joints.into_u16().zip(weights.into_f32()).enumerate()
                    {
                        for (&joint, &weight) in joint_set.iter().zip(weight_set.iter()) {
                            if weight <= 0.0 {
                                continue;
                            }
                            match bones.get_mut(joint as usize) {
                                Some(bone) => bone.weights.push(VertexWeight {
                                    vertex_id: vertex_id as u32,
                                    weight,
                                }),
                                None => log::warn!(
                                    "Mesh '{}' vertex {} references joint {} outside its skin",
                                    mesh_name,
                                    vertex_id,
                                    joint
                                ),
                            }
                        }
                    }
                }

                log::debug!(
                    "  Mesh '{}' primitive {}: {} vertices, {} bones",
                    mesh_name,
                    primitive.index(),
                    vertex_count,
                    bones.len()
                );

                meshes.push(ImportedMesh {
                    name: format!("{}/{}", mesh_name, primitive.index()),
                    vertex_count,
                    bones,
                });
            }
        }

        Ok(meshes)
    }

    fn load_skin_joints(skin: &gltf::Skin, buffers: &[gltf::buffer::Data]) -> Vec<(String, Mat4)> {
        let reader = skin.reader(|buffer| Some(&buffers[buffer.index()].0));
        let inverse_binds: Vec<Mat4> = reader
            .read_inverse_bind_matrices()
            .map(|matrices| matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect())
            .unwrap_or_default();

        skin.joints()
            .enumerate()
            .map(|(index, joint)| {
                let offset = inverse_binds.get(index).copied().unwrap_or(Mat4::IDENTITY);
                (Self::node_name(&joint), offset)
            })
            .collect()
    }

    /// Cubic spline outputs store (in-tangent, value, out-tangent) per key;
    /// only the value is kept.
    fn key_values<T: Copy>(values: Vec<T>, interpolation: gltf::animation::Interpolation) -> Vec<T> {
        match interpolation {
            gltf::animation::Interpolation::CubicSpline => {
                values.chunks_exact(3).map(|key| key[1]).collect()
            }
            gltf::animation::Interpolation::Step | gltf::animation::Interpolation::Linear => values,
        }
    }

    /// Groups every clip's channels per target node. Key times only feed the
    /// clip duration; baking treats the key ordinal as time.
    fn load_animations(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Vec<ClipSource>, SceneError> {
        let mut clips = Vec::with_capacity(document.animations().len());

        for (animation_index, animation) in document.animations().enumerate() {
            let clip_name = animation
                .name()
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("Animation_{}", animation_index));
            let mut clip = ClipSource::new(clip_name.clone());
            let mut channel_slots: HashMap<usize, usize> = HashMap::new();

            for (channel_index, channel) in animation.channels().enumerate() {
                if channel.target().property() == gltf::animation::Property::MorphTargetWeights {
                    log::warn!(
                        "Skipping morph target animation '{}' channel {} (not supported)",
                        clip_name,
                        channel_index
                    );
                    continue;
                }

                let target = channel.target().node();
                let node_name = Self::node_name(&target);
                let reader = channel.reader(|buffer| Some(&buffers[buffer.index()].0));

                let missing = || SceneError::MissingKeyframes {
                    clip: clip_name.clone(),
                    node: node_name.clone(),
                };
                let inputs = reader.read_inputs().ok_or_else(missing)?;
                let outputs = reader.read_outputs().ok_or_else(missing)?;

                clip.duration = inputs.fold(clip.duration, f32::max);
                let interpolation = channel.sampler().interpolation();

                let slot = *channel_slots.entry(target.index()).or_insert_with(|| {
                    clip.channels.push(KeyframeChannel::new(node_name.clone()));
                    clip.channels.len() - 1
                });
                let keyframes = &mut clip.channels[slot];

                match outputs {
                    ReadOutputs::Translations(iter) => {
                        keyframes.positions =
                            Self::key_values(iter.map(Vec3::from).collect(), interpolation);
                    }
                    ReadOutputs::Rotations(rotations) => {
                        let values = rotations
                            .into_f32()
                            .map(|r| Quat::from_xyzw(r[0], r[1], r[2], r[3]))
                            .collect();
                        keyframes.rotations = Self::key_values(values, interpolation);
                    }
                    ReadOutputs::Scales(iter) => {
                        keyframes.scales =
                            Self::key_values(iter.map(Vec3::from).collect(), interpolation);
                    }
                    ReadOutputs::MorphTargetWeights(_) => {}
                }
            }

            log::debug!(
                "  Animation '{}': {} node channels, duration {:.3}s",
                clip.name,
                clip.channels.len(),
                clip.duration
            );
            clips.push(clip);
        }

        Ok(clips)
    }
}
