//! Free-form diagnostic text report: a human-readable summary of a
//! character file or mesh, with no corresponding parser.
use std::fmt::Write as _;

use crate::record::{CharacterFile, MeshDescription};

impl CharacterFile {
    /// Render a short summary: skeleton/bone counts, suit/skin counts, and
    /// skill/motion counts.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "CharacterFile: {} skeleton(s), {} suit(s), {} skill(s)",
            self.skeletons.len(),
            self.suits.len(),
            self.skills.len()
        );

        for skeleton in &self.skeletons {
            let _ = writeln!(
                out,
                "  skeleton {:?}: {} bone(s)",
                skeleton.name,
                skeleton.bones.len()
            );
            for bone in &skeleton.bones {
                let parent = if bone.parent_name.is_empty() {
                    "<root>"
                } else {
                    &bone.parent_name
                };
                let _ = writeln!(out, "    bone {:?} <- {}", bone.name, parent);
            }
        }

        for suit in &self.suits {
            let _ = writeln!(
                out,
                "  suit {:?} (type {}): {} skin(s)",
                suit.name,
                suit.suit_type,
                suit.skins.len()
            );
        }

        for skill in &self.skills {
            let _ = writeln!(
                out,
                "  skill {:?} ({}): {} motion(s), {} translation(s), {} rotation(s)",
                skill.name,
                skill.animation_file,
                skill.motions.len(),
                skill.translations.len(),
                skill.rotations.len()
            );
        }

        out
    }
}

impl MeshDescription {
    /// Render face/vertex/binding counts.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Mesh {:?} (texture {:?})", self.name, self.texture_name);
        let _ = writeln!(
            out,
            "  {} bone(s), {} face(s), {} binding(s), {} uv(s), {} blend binding(s), {} vertex/normal pair(s)",
            self.bone_names.len(),
            self.faces.len(),
            self.bindings.len(),
            self.uvs.len(),
            self.blend_bindings.len(),
            self.positions.len()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SkeletonDescription;

    #[test]
    fn report_mentions_skeleton_and_bone_counts() {
        let file = CharacterFile {
            skeletons: vec![SkeletonDescription {
                name: "default".into(),
                bones: vec![],
            }],
            suits: vec![],
            skills: vec![],
        };
        let text = file.report();
        assert!(text.contains("1 skeleton(s)"));
        assert!(text.contains("\"default\""));
    }
}
