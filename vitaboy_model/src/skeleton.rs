//! Bone hierarchy runtime: builds an indexed bone tree from a
//! `SkeletonDescription`, propagates world-space transforms, and deforms a
//! skinned mesh.
use glam::{Quat, Vec3};
use log::warn;

use vitaboy_format::record::{MeshDescription, SkeletonDescription};

/// A bone augmented with resolved hierarchy indices and world-space
/// transform. Stored in a flat arena (`Skeleton::bones`) to avoid circular
/// ownership between parent and child references.
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub local_position: Vec3,
    pub local_rotation: Quat,
    pub world_position: Vec3,
    pub world_rotation: Quat,
}

/// An indexed bone hierarchy built from a `SkeletonDescription`.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub name: String,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    /// Materialize a runtime skeleton from its description. An unresolved
    /// parent name leaves the bone parentless rather than failing the
    /// build, rather than failing outright.
    pub fn build(description: &SkeletonDescription) -> Self {
        let mut bones: Vec<Bone> = description
            .bones
            .iter()
            .map(|b| Bone {
                name: b.name.clone(),
                parent: None,
                children: Vec::new(),
                local_position: b.position,
                local_rotation: b.rotation,
                world_position: Vec3::ZERO,
                world_rotation: Quat::IDENTITY,
            })
            .collect();

        for (i, bone_desc) in description.bones.iter().enumerate() {
            if bone_desc.parent_name.is_empty() {
                continue;
            }
            match description
                .bones
                .iter()
                .position(|b| b.name == bone_desc.parent_name)
            {
                Some(parent_index) if parent_index != i => {
                    bones[i].parent = Some(parent_index);
                    bones[parent_index].children.push(i);
                }
                _ => {
                    warn!(
                        "skeleton {:?}: bone {:?} has unresolved parent {:?}; treating as root",
                        description.name, bone_desc.name, bone_desc.parent_name
                    );
                }
            }
        }

        let root_count = bones.iter().filter(|b| b.parent.is_none()).count();
        if root_count > 1 {
            warn!(
                "skeleton {:?} has {} root bones; propagation will treat each independently",
                description.name, root_count
            );
        }

        Self {
            name: description.name.clone(),
            bones,
        }
    }

    /// Look up a bone's index by name.
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Propagate world-space transforms from every root bone down to its
    /// descendants. A skeleton with no bones is a no-op.
    pub fn propagate(&mut self) {
        let roots: Vec<usize> = self
            .bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
            .collect();

        for root in roots {
            self.bones[root].world_position = self.bones[root].local_position;
            self.bones[root].world_rotation = self.bones[root].local_rotation;
            self.propagate_children(root);
        }
    }

    fn propagate_children(&mut self, index: usize) {
        let children = self.bones[index].children.clone();
        for child in children {
            let parent_position = self.bones[index].world_position;
            let parent_rotation = self.bones[index].world_rotation;
            let local_position = self.bones[child].local_position;
            let local_rotation = self.bones[child].local_rotation;

            self.bones[child].world_position =
                parent_position + parent_rotation * local_position;
            self.bones[child].world_rotation = parent_rotation * local_rotation;

            self.propagate_children(child);
        }
    }

    /// Deform `mesh`'s rest-pose positions/normals into world space using
    /// this skeleton's current transforms, using the two-phase (bound +
    /// blended) model.
    pub fn deform_mesh(&self, mesh: &MeshDescription) -> (Vec<Vec3>, Vec<Vec3>) {
        let mut positions = mesh.positions.clone();
        let mut normals = mesh.normals.clone();
        let num_uvs = mesh.uvs.len();

        for binding in &mesh.bindings {
            let Some(bone_name) = mesh.bone_names.get(binding.bone_index as usize) else {
                warn!(
                    "mesh {:?}: binding references out-of-range bone index {}",
                    mesh.name, binding.bone_index
                );
                continue;
            };
            let Some(bone_index) = self.find_bone(bone_name) else {
                warn!(
                    "mesh {:?}: binding references unknown bone {:?}",
                    mesh.name, bone_name
                );
                continue;
            };
            let bone = &self.bones[bone_index];

            apply_phase(
                &mesh.positions,
                &mesh.normals,
                &mut positions,
                &mut normals,
                binding.first_bound_vertex,
                binding.bound_vertex_count,
                bone,
            );

            if binding.blended_vertex_count > 0 {
                apply_phase(
                    &mesh.positions,
                    &mesh.normals,
                    &mut positions,
                    &mut normals,
                    num_uvs as i32 + binding.first_blended_vertex,
                    binding.blended_vertex_count,
                    bone,
                );
            }
        }

        for (i, blend) in mesh.blend_bindings.iter().enumerate() {
            let source = num_uvs + i;
            let target = blend.target_index as usize;
            if source >= positions.len() || target >= positions.len() {
                warn!(
                    "mesh {:?}: blend binding {} references out-of-range vertex",
                    mesh.name, i
                );
                continue;
            }

            if blend.weight >= 1.0 {
                positions[target] = positions[source];
                normals[target] = normals[source];
            } else {
                let w = blend.weight;
                positions[target] = positions[target] * (1.0 - w) + positions[source] * w;
                let blended_normal = normals[target] * (1.0 - w) + normals[source] * w;
                normals[target] = normalize_or_up(blended_normal);
            }
        }

        (positions, normals)
    }
}

fn apply_phase(
    rest_positions: &[Vec3],
    rest_normals: &[Vec3],
    out_positions: &mut [Vec3],
    out_normals: &mut [Vec3],
    first_vertex: i32,
    vertex_count: i32,
    bone: &Bone,
) {
    let first = first_vertex.max(0) as usize;
    let count = vertex_count.max(0) as usize;
    for v in first..(first + count).min(rest_positions.len()) {
        out_positions[v] = bone.world_position + bone.world_rotation * rest_positions[v];
        out_normals[v] = normalize_or_up(bone.world_rotation * rest_normals[v]);
    }
}

fn normalize_or_up(v: Vec3) -> Vec3 {
    if v.length() < 1e-4 {
        Vec3::Y
    } else {
        v.normalize()
    }
}
