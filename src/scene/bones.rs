use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::SceneError;
use crate::scene::node::{NodeId, NodeTree};

/// Size of every bone palette, and the most bones a model may use.
pub const MAX_BONES: usize = 150;
/// Bone influences stored per vertex.
pub const MAX_WEIGHTS: usize = 4;

/// One skinning influence. `offset` maps mesh (bind) space into bone space.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub id: usize,
    pub name: String,
    pub offset: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex_id: u32,
    pub weight: f32,
}

/// A bone as referenced by one mesh, with the vertices it influences.
#[derive(Debug, Clone)]
pub struct BoneReference {
    pub name: String,
    pub offset: Mat4,
    pub weights: Vec<VertexWeight>,
}

/// Per-vertex skinning attributes, laid out for a vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexInfluence {
    pub bone_ids: [u32; MAX_WEIGHTS],
    pub weights: [f32; MAX_WEIGHTS],
}

/// Model-wide bone id space. Ids are dense, start at 0 and follow discovery
/// order across all meshes; a bone shared by several meshes keeps one id.
#[derive(Debug, Clone, Default)]
pub struct BoneTable {
    bones: Vec<Bone>,
    by_name: HashMap<String, usize>,
}

impl BoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the bone named `name`, registering it if needed.
    pub fn register(&mut self, name: &str, offset: Mat4) -> Result<usize, SceneError> {
        if let Some(id) = self.id_of(name) {
            return Ok(id);
        }

        let id = self.bones.len();
        if id >= MAX_BONES {
            return Err(SceneError::TooManyBones {
                count: id + 1,
                max: MAX_BONES,
            });
        }

        self.bones.push(Bone {
            id,
            name: name.to_string(),
            offset,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Registers the bones referenced by one mesh and returns its per-vertex
    /// influences.
    ///
    /// At most [`MAX_WEIGHTS`] influences are kept per vertex, in the order
    /// the bones were listed. Weights are taken as authored, never
    /// renormalised. Unused slots are padded with bone 0 and weight 0.
    pub fn extract_mesh(
        &mut self,
        vertex_count: usize,
        bones: &[BoneReference],
    ) -> Result<Vec<VertexInfluence>, SceneError> {
        let mut per_vertex: Vec<Vec<(u32, f32)>> = vec![Vec::new(); vertex_count];

        for bone in bones {
            let id = self.register(&bone.name, bone.offset)? as u32;
            for weight in &bone.weights {
                match per_vertex.get_mut(weight.vertex_id as usize) {
                    Some(list) => list.push((id, weight.weight)),
                    None => log::warn!(
                        "Bone '{}' weights vertex {} but the mesh has {} vertices",
                        bone.name,
                        weight.vertex_id,
                        vertex_count
                    ),
                }
            }
        }

        let truncated = per_vertex
            .iter()
            .filter(|list| list.len() > MAX_WEIGHTS)
            .count();
        if truncated > 0 {
            log::warn!(
                "{} vertices have more than {} bone influences - keeping the first {}",
                truncated,
                MAX_WEIGHTS,
                MAX_WEIGHTS
            );
        }

        Ok(per_vertex
            .iter()
            .map(|list| {
                let mut influence = VertexInfluence::zeroed();
                for (slot, &(id, weight)) in list.iter().take(MAX_WEIGHTS).enumerate() {
                    influence.bone_ids[slot] = id;
                    influence.weights[slot] = weight;
                }
                influence
            })
            .collect())
    }

    pub fn get(&self, id: usize) -> Option<&Bone> {
        self.bones.get(id)
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Maps every node to the bones it owns.
    ///
    /// A bone's owner is the node with the same name. Names that own a bone
    /// must be unique in the hierarchy; a bone with no matching node is
    /// skipped and its palette slot stays at identity.
    pub fn ownership(&self, tree: &NodeTree) -> Result<BoneOwnership, SceneError> {
        let mut owned = vec![Vec::new(); tree.len()];

        for bone in &self.bones {
            let mut owners = tree.find_all(&bone.name);
            match (owners.next(), owners.next()) {
                (Some(node), None) => owned[node].push(bone.id),
                (Some(_), Some(_)) => {
                    return Err(SceneError::DuplicateBoneOwner(bone.name.clone()));
                }
                (None, _) => log::warn!(
                    "Bone '{}' (id {}) has no node in the hierarchy",
                    bone.name,
                    bone.id
                ),
            }
        }

        Ok(BoneOwnership { owned })
    }
}

/// Bones owned by each node, indexed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct BoneOwnership {
    owned: Vec<Vec<usize>>,
}

impl BoneOwnership {
    pub fn bones_of(&self, node: NodeId) -> &[usize] {
        self.owned.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::RawNode;
    use glam::Vec3;

    fn bone(name: &str, weights: &[(u32, f32)]) -> BoneReference {
        BoneReference {
            name: name.to_string(),
            offset: Mat4::from_translation(Vec3::X),
            weights: weights
                .iter()
                .map(|&(vertex_id, weight)| VertexWeight { vertex_id, weight })
                .collect(),
        }
    }

    #[test]
    fn shared_bones_keep_one_id_across_meshes() {
        let mut table = BoneTable::new();
        table
            .extract_mesh(2, &[bone("hip", &[(0, 1.0)]), bone("knee", &[(1, 1.0)])])
            .unwrap();
        let influences = table
            .extract_mesh(1, &[bone("knee", &[(0, 0.5)]), bone("foot", &[(0, 0.5)])])
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.id_of("hip"), Some(0));
        assert_eq!(table.id_of("knee"), Some(1));
        assert_eq!(table.id_of("foot"), Some(2));
        assert_eq!(influences[0].bone_ids, [1, 2, 0, 0]);
        assert_eq!(influences[0].weights, [0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn influences_are_padded_and_not_renormalised() {
        let mut table = BoneTable::new();
        let influences = table
            .extract_mesh(2, &[bone("a", &[(0, 0.25)]), bone("b", &[(0, 0.25)])])
            .unwrap();

        assert_eq!(influences[0].weights, [0.25, 0.25, 0.0, 0.0]);
        assert_eq!(influences[1], VertexInfluence::zeroed());
    }

    #[test]
    fn extra_influences_are_dropped() {
        let mut table = BoneTable::new();
        let bones: Vec<_> = (0..6)
            .map(|i| bone(&format!("b{i}"), &[(0, 0.1)]))
            .collect();
        let influences = table.extract_mesh(1, &bones).unwrap();
        assert_eq!(influences[0].bone_ids, [0, 1, 2, 3]);
    }

    #[test]
    fn exceeding_capacity_fails() {
        let mut table = BoneTable::new();
        for i in 0..MAX_BONES {
            table.register(&format!("bone{i}"), Mat4::IDENTITY).unwrap();
        }
        let result = table.register("one_too_many", Mat4::IDENTITY);
        assert!(matches!(
            result,
            Err(SceneError::TooManyBones { count, max }) if count == MAX_BONES + 1 && max == MAX_BONES
        ));
        assert!(table.register("bone3", Mat4::IDENTITY).is_ok());
    }

    #[test]
    fn ownership_maps_nodes_to_bones() {
        let tree = NodeTree::build(
            &RawNode::new("root", Mat4::IDENTITY).with_child(RawNode::new("arm", Mat4::IDENTITY)),
        );
        let mut table = BoneTable::new();
        table.register("arm", Mat4::IDENTITY).unwrap();
        table.register("ghost", Mat4::IDENTITY).unwrap();

        let ownership = table.ownership(&tree).unwrap();
        let arm = tree.find("arm").unwrap();
        assert_eq!(ownership.bones_of(arm), &[0]);
        assert!(ownership.bones_of(NodeTree::ROOT).is_empty());
    }

    #[test]
    fn duplicate_owner_names_are_rejected() {
        let tree = NodeTree::build(
            &RawNode::new("root", Mat4::IDENTITY)
                .with_child(RawNode::new("arm", Mat4::IDENTITY))
                .with_child(RawNode::new("arm", Mat4::IDENTITY)),
        );
        let mut table = BoneTable::new();
        table.register("arm", Mat4::IDENTITY).unwrap();

        assert!(matches!(
            table.ownership(&tree),
            Err(SceneError::DuplicateBoneOwner(name)) if name == "arm"
        ));
    }
}
