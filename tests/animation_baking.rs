use game3d::error::SceneError;
use game3d::scene::{
    BoneReference, ClipSource, ImportedMesh, ImportedScene, KeyframeChannel, Model, NodeTree,
    RawNode, VertexWeight, MAX_BONES,
};
use glam::{Mat4, Quat, Vec3};

const EPSILON: f32 = 1e-5;

fn bone(name: &str, offset: Mat4, vertex_id: u32) -> BoneReference {
    BoneReference {
        name: name.to_string(),
        offset,
        weights: vec![VertexWeight {
            vertex_id,
            weight: 1.0,
        }],
    }
}

fn two_level(root_local: Mat4, child_local: Mat4) -> NodeTree {
    NodeTree::build(
        &RawNode::new("root", root_local).with_child(RawNode::new("child", child_local)),
    )
}

fn assert_mat_eq(actual: Mat4, expected: Mat4) {
    assert!(
        actual.abs_diff_eq(expected, EPSILON),
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn model_without_clips_has_no_animations() {
    let scene = ImportedScene {
        hierarchy: two_level(Mat4::IDENTITY, Mat4::IDENTITY),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 1,
            bones: vec![bone("child", Mat4::IDENTITY, 0)],
        }],
        clips: Vec::new(),
    };

    let model = Model::from_import("static", &scene).unwrap();
    assert!(model.animations().is_empty());
    assert!(!model.is_animated());
    assert_eq!(model.bones().len(), 1);
}

#[test]
fn single_key_clip_bakes_one_frame() {
    let scene = ImportedScene {
        hierarchy: two_level(Mat4::IDENTITY, Mat4::IDENTITY),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 1,
            bones: vec![bone("child", Mat4::IDENTITY, 0)],
        }],
        clips: vec![ClipSource::new("pose").with_channel(KeyframeChannel {
            positions: vec![Vec3::new(0.0, 2.0, 0.0)],
            rotations: vec![Quat::IDENTITY],
            scales: vec![Vec3::ONE],
            ..KeyframeChannel::new("child")
        })],
    };

    let model = Model::from_import("posed", &scene).unwrap();
    let animation = &model.animations()[0];
    assert_eq!(animation.frame_count(), 1);
    assert_mat_eq(
        animation.frame(0).unwrap().bone_matrices()[0],
        Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
    );
}

#[test]
fn child_bone_combines_root_and_keyframe_with_offset() {
    let root_local = Mat4::from_rotation_translation(
        Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        Vec3::new(0.0, 0.0, 3.0),
    );
    let offset = Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));
    let keys = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)];

    let scene = ImportedScene {
        hierarchy: two_level(root_local, Mat4::IDENTITY),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 1,
            bones: vec![bone("child", offset, 0)],
        }],
        clips: vec![ClipSource::new("slide").with_channel(KeyframeChannel {
            positions: keys.to_vec(),
            ..KeyframeChannel::new("child")
        })],
    };

    let model = Model::from_import("slider", &scene).unwrap();
    let animation = &model.animations()[0];
    assert_eq!(animation.frame_count(), keys.len());

    for (frame, key) in keys.iter().enumerate() {
        let child_local = Mat4::from_translation(*key);
        let expected = root_local.inverse() * (root_local * child_local) * offset;
        assert_mat_eq(animation.frame(frame).unwrap().bone_matrices()[0], expected);
    }
}

#[test]
fn animated_root_moves_its_descendants() {
    let root_local = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0));
    let child_local = Mat4::from_translation(Vec3::X);
    let scene = ImportedScene {
        hierarchy: two_level(root_local, child_local),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 2,
            bones: vec![
                bone("root", Mat4::IDENTITY, 0),
                bone("child", Mat4::IDENTITY, 1),
            ],
        }],
        clips: vec![ClipSource::new("lift").with_channel(KeyframeChannel {
            positions: vec![Vec3::ZERO, Vec3::Y],
            ..KeyframeChannel::new("root")
        })],
    };

    let model = Model::from_import("lifter", &scene).unwrap();
    let frame = model.animations()[0].frame(1).unwrap();
    let root_animated = Mat4::from_translation(Vec3::Y);

    assert_mat_eq(frame.bone_matrices()[0], root_local.inverse() * root_animated);
    assert_mat_eq(
        frame.bone_matrices()[1],
        root_local.inverse() * root_animated * child_local,
    );
}

#[test]
fn rotation_only_channel_keeps_rest_translation_at_origin() {
    let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let scene = ImportedScene {
        hierarchy: two_level(Mat4::IDENTITY, Mat4::from_translation(Vec3::X)),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 1,
            bones: vec![bone("child", Mat4::IDENTITY, 0)],
        }],
        clips: vec![ClipSource::new("spin").with_channel(KeyframeChannel {
            rotations: vec![Quat::IDENTITY, quarter],
            ..KeyframeChannel::new("child")
        })],
    };

    let model = Model::from_import("spinner", &scene).unwrap();
    let animation = &model.animations()[0];
    assert_eq!(animation.frame_count(), 2);

    // Sampled channels replace the whole local transform.
    let matrix = animation.frame(1).unwrap().bone_matrices()[0];
    assert_mat_eq(matrix, Mat4::from_quat(quarter));
    assert!(matrix.transform_point3(Vec3::X).abs_diff_eq(Vec3::Y, EPSILON));
}

#[test]
fn unused_palette_slots_are_identity() {
    let scene = ImportedScene {
        hierarchy: two_level(Mat4::IDENTITY, Mat4::IDENTITY),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 1,
            bones: vec![bone("child", Mat4::IDENTITY, 0)],
        }],
        clips: vec![ClipSource::new("idle").with_channel(KeyframeChannel {
            positions: vec![Vec3::Z],
            ..KeyframeChannel::new("child")
        })],
    };

    let model = Model::from_import("idle", &scene).unwrap();
    let frame = model.animations()[0].frame(0).unwrap();
    assert_eq!(frame.bone_matrices().len(), MAX_BONES);
    assert!(frame.bone_matrices()[1..]
        .iter()
        .all(|m| *m == Mat4::IDENTITY));
}

#[test]
fn bone_ids_are_shared_across_meshes() {
    let scene = ImportedScene {
        hierarchy: two_level(Mat4::IDENTITY, Mat4::IDENTITY),
        meshes: vec![
            ImportedMesh {
                name: "body".into(),
                vertex_count: 2,
                bones: vec![bone("root", Mat4::IDENTITY, 0), bone("child", Mat4::IDENTITY, 1)],
            },
            ImportedMesh {
                name: "armor".into(),
                vertex_count: 1,
                bones: vec![bone("child", Mat4::IDENTITY, 0)],
            },
        ],
        clips: Vec::new(),
    };

    let model = Model::from_import("knight", &scene).unwrap();
    assert_eq!(model.bones().len(), 2);
    assert_eq!(model.meshes()[1].influences[0].bone_ids, [1, 0, 0, 0]);
    assert_eq!(model.meshes()[1].influences[0].weights, [1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn too_many_bones_is_rejected() {
    let bones = (0..=MAX_BONES)
        .map(|i| bone(&format!("bone_{i}"), Mat4::IDENTITY, 0))
        .collect();
    let scene = ImportedScene {
        hierarchy: two_level(Mat4::IDENTITY, Mat4::IDENTITY),
        meshes: vec![ImportedMesh {
            name: "mesh".into(),
            vertex_count: 1,
            bones,
        }],
        clips: Vec::new(),
    };

    assert!(matches!(
        Model::from_import("crowd", &scene),
        Err(SceneError::TooManyBones { count, max }) if count == MAX_BONES + 1 && max == MAX_BONES
    ));
}
