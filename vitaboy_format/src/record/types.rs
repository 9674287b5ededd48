//! The structured record data model.
use std::collections::BTreeMap;

use glam::{Quat, Vec2, Vec3};

/// An ordered multiset of string key/value pairs. Keys are not required to
/// be unique; insertion order is preserved on round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag(pub Vec<(String, String)>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneDescription {
    pub name: String,
    /// Empty for the root bone.
    pub parent_name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub can_translate: bool,
    pub can_rotate: bool,
    pub can_blend: bool,
    pub can_wiggle: bool,
    pub wiggle_power: f32,
    pub properties: PropertyBag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonDescription {
    pub name: String,
    pub bones: Vec<BoneDescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinDescription {
    pub name: String,
    pub bone_name: String,
    pub flags: i32,
    pub mesh_name: String,
    pub properties: PropertyBag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuitDescription {
    pub name: String,
    pub suit_type: i32,
    pub properties: PropertyBag,
    pub skins: Vec<SkinDescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionDescription {
    pub bone_name: String,
    pub frames: i32,
    pub duration_ms: f32,
    pub has_translation: bool,
    pub has_rotation: bool,
    pub translations_offset: i32,
    pub rotations_offset: i32,
    pub properties: PropertyBag,
    /// Time-based cues keyed by frame index.
    pub time_properties: BTreeMap<i32, PropertyBag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillDescription {
    pub name: String,
    pub animation_file: String,
    pub duration_ms: f32,
    pub distance: f32,
    pub is_moving: bool,
    pub num_translations: i32,
    pub num_rotations: i32,
    pub motions: Vec<MotionDescription>,
    pub translations: Vec<Vec3>,
    pub rotations: Vec<Quat>,
}

/// A container of zero or more skeletons, suits, and skills.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterFile {
    pub skeletons: Vec<SkeletonDescription>,
    pub suits: Vec<SuitDescription>,
    pub skills: Vec<SkillDescription>,
}

/// Maps a bone (by index into `MeshDescription::bone_names`) to the vertex
/// ranges it controls in the bound and blended sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneBinding {
    pub bone_index: i32,
    pub first_bound_vertex: i32,
    pub bound_vertex_count: i32,
    pub first_blended_vertex: i32,
    pub blended_vertex_count: i32,
}

/// A secondary-bone influence on a bound vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendBinding {
    pub target_index: i32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshDescription {
    pub name: String,
    pub texture_name: String,
    pub bone_names: Vec<String>,
    pub faces: Vec<[i32; 3]>,
    pub bindings: Vec<BoneBinding>,
    pub uvs: Vec<Vec2>,
    pub blend_bindings: Vec<BlendBinding>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}
