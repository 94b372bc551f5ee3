//! Bind-pose evaluation and rigid skinning.
//!
//! Each bone contributes a local affine transform built from its bind-pose
//! Euler rotation and translation; world transforms chain through parents
//! that appear earlier in the bone array. Vertices attach rigidly to a
//! single bone.

use glam::{DMat4, DQuat, DVec3};

use crate::model::{Bone, Mesh};

const IDENTITY_TOLERANCE: f64 = 1e-8;

/// Quaternion from XYZ-order Euler angles (radians), matching the
/// convention baked into the model format.
fn bind_quat(rot: [f64; 3]) -> DQuat {
    let (sx, cx) = (rot[0] * 0.5).sin_cos();
    let (sy, cy) = (rot[1] * 0.5).sin_cos();
    let (sz, cz) = (rot[2] * 0.5).sin_cos();
    DQuat::from_xyzw(
        sx * cy * cz - cx * sy * sz,
        cx * sy * cz + sx * cy * sz,
        cx * cy * sz - sx * sy * cz,
        cx * cy * cz + sx * sy * sz,
    )
}

/// Computes a world transform per bone. Dummy bones stay at identity, and
/// a parent index is honored only when it refers to an earlier bone.
pub fn build_world_transforms(bones: &[Bone]) -> Vec<DMat4> {
    let mut worlds = vec![DMat4::IDENTITY; bones.len()];
    for (i, bone) in bones.iter().enumerate() {
        if bone.is_dummy {
            continue;
        }
        let local = DMat4::from_rotation_translation(
            bind_quat(bone.bind_rotation),
            DVec3::from_array(bone.bind_position),
        );
        let parent = bone.parent;
        worlds[i] = if parent >= 0 && (parent as usize) < i {
            worlds[parent as usize] * local
        } else {
            local
        };
    }
    worlds
}

fn all_identity(worlds: &[DMat4]) -> bool {
    worlds
        .iter()
        .all(|w| w.abs_diff_eq(DMat4::IDENTITY, IDENTITY_TOLERANCE))
}

/// Applies the bind pose to every mesh in place. Vertices whose bone
/// index is out of range are left untouched, and the whole pass is
/// skipped when the skeleton collapses to identity.
pub fn apply_bind_pose(meshes: &mut [Mesh], bones: &[Bone]) {
    let worlds = build_world_transforms(bones);
    if worlds.is_empty() || all_identity(&worlds) {
        return;
    }

    for mesh in meshes {
        for (vert, &node) in mesh.verts.iter_mut().zip(&mesh.nodes) {
            if node < 0 || node as usize >= worlds.len() {
                continue;
            }
            let p = worlds[node as usize].transform_point3(DVec3::new(
                vert[0] as f64,
                vert[1] as f64,
                vert[2] as f64,
            ));
            *vert = [p.x as f32, p.y as f32, p.z as f32];
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    fn bone(parent: i32, pos: [f64; 3], rot: [f64; 3]) -> Bone {
        Bone {
            parent,
            is_dummy: false,
            bind_position: pos,
            bind_rotation: rot,
        }
    }

    fn mesh_with_vertex(v: [f32; 3], node: i16) -> Mesh {
        Mesh {
            verts: vec![v],
            nodes: vec![node],
            ..Default::default()
        }
    }

    #[test]
    fn chain_of_three_bones_lands_on_expected_point() {
        // Root translates +1 on x, child rotates 90 degrees about z, the
        // leaf translates +1 on x again: its origin ends up at (1, 1, 0).
        let bones = vec![
            bone(-1, [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
            bone(0, [0.0, 0.0, 0.0], [0.0, 0.0, FRAC_PI_2]),
            bone(1, [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        ];
        let mut meshes = vec![mesh_with_vertex([0.0, 0.0, 0.0], 2)];
        apply_bind_pose(&mut meshes, &bones);
        let v = meshes[0].verts[0];
        assert!((v[0] - 1.0).abs() < 1e-5, "x = {}", v[0]);
        assert!((v[1] - 1.0).abs() < 1e-5, "y = {}", v[1]);
        assert!(v[2].abs() < 1e-5, "z = {}", v[2]);
    }

    #[test]
    fn identity_skeleton_leaves_vertices_alone() {
        let bones = vec![bone(-1, [0.0; 3], [0.0; 3])];
        let mut meshes = vec![mesh_with_vertex([3.0, 4.0, 5.0], 0)];
        apply_bind_pose(&mut meshes, &bones);
        assert_eq!(meshes[0].verts[0], [3.0, 4.0, 5.0]);
    }

    #[test]
    fn out_of_range_bone_index_is_ignored() {
        let bones = vec![bone(-1, [10.0, 0.0, 0.0], [0.0; 3])];
        let mut meshes = vec![mesh_with_vertex([1.0, 2.0, 3.0], 7)];
        apply_bind_pose(&mut meshes, &bones);
        assert_eq!(meshes[0].verts[0], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn dummy_bones_contribute_identity() {
        let bones = vec![
            Bone {
                parent: -1,
                is_dummy: true,
                ..Default::default()
            },
            bone(0, [2.0, 0.0, 0.0], [0.0; 3]),
        ];
        let worlds = build_world_transforms(&bones);
        assert_eq!(worlds[0], DMat4::IDENTITY);
        let p = worlds[1].transform_point3(DVec3::ZERO);
        assert!((p.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn forward_parent_reference_is_not_chained() {
        // Parent index pointing at a later bone is treated as a root.
        let bones = vec![bone(1, [1.0, 0.0, 0.0], [0.0; 3]), bone(-1, [5.0, 0.0, 0.0], [0.0; 3])];
        let worlds = build_world_transforms(&bones);
        let p = worlds[0].transform_point3(DVec3::ZERO);
        assert!((p.x - 1.0).abs() < 1e-9);
    }
}
