//! The CFP keyframe stream: a translation delta-stream followed by a
//! rotation delta-stream, each decoded through [`crate::delta`].
//!
//! Coordinate-handedness conversion happens only at this boundary:
//! translation Z and quaternion W are negated on both read and write.
use glam::{Quat, Vec3};

use crate::delta;
use crate::error::FormatError;
use crate::io::BinaryReader;
use crate::record::SkillDescription;

/// Decode `bytes` into `skill.translations`/`skill.rotations`, sized from
/// `skill.num_translations`/`skill.num_rotations`.
///
/// The stream is parsed once per `Skill`; callers bound to the same skill
/// (e.g. two `Practice`s) must not call this a second time on the same
/// instance — re-populating is only meaningful after an explicit clone.
pub fn populate_keyframes(skill: &mut SkillDescription, bytes: &[u8]) -> Result<(), FormatError> {
    let mut reader = BinaryReader::new(bytes);

    skill.translations = if skill.num_translations > 0 {
        let n = skill.num_translations as usize;
        let flat = delta::decompress(&mut reader, n, 3)?;
        (0..n)
            .map(|i| Vec3::new(flat[i * 3], flat[i * 3 + 1], -flat[i * 3 + 2]))
            .collect()
    } else {
        Vec::new()
    };

    skill.rotations = if skill.num_rotations > 0 {
        let n = skill.num_rotations as usize;
        let flat = delta::decompress(&mut reader, n, 4)?;
        (0..n)
            .map(|i| Quat::from_xyzw(flat[i * 4], flat[i * 4 + 1], flat[i * 4 + 2], -flat[i * 4 + 3]))
            .collect()
    } else {
        Vec::new()
    };

    Ok(())
}

/// Encode `skill.translations`/`skill.rotations` back into a CFP stream.
pub fn write_keyframe_stream(skill: &SkillDescription) -> Vec<u8> {
    let mut bytes = Vec::new();

    if !skill.translations.is_empty() {
        let n = skill.translations.len();
        let mut flat = Vec::with_capacity(n * 3);
        for t in &skill.translations {
            flat.push(t.x);
            flat.push(t.y);
            flat.push(-t.z);
        }
        bytes.extend(delta::compress(&flat, n, 3));
    }

    if !skill.rotations.is_empty() {
        let n = skill.rotations.len();
        let mut flat = Vec::with_capacity(n * 4);
        for q in &skill.rotations {
            flat.push(q.x);
            flat.push(q.y);
            flat.push(q.z);
            flat.push(-q.w);
        }
        bytes.extend(delta::compress(&flat, n, 4));
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_skill(num_translations: i32, num_rotations: i32) -> SkillDescription {
        SkillDescription {
            name: "wave".into(),
            animation_file: "wave.cfp".into(),
            duration_ms: 1000.0,
            distance: 0.0,
            is_moving: false,
            num_translations,
            num_rotations,
            motions: Vec::new(),
            translations: Vec::new(),
            rotations: Vec::new(),
        }
    }

    #[test]
    fn round_trip_negates_z_and_w_at_the_boundary() {
        let mut skill = blank_skill(2, 2);
        skill.translations = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.5, 0.25)];
        skill.rotations = vec![Quat::IDENTITY, Quat::from_xyzw(0.1, 0.2, 0.3, 0.9)];

        let bytes = write_keyframe_stream(&skill);
        let mut reloaded = blank_skill(2, 2);
        populate_keyframes(&mut reloaded, &bytes).unwrap();

        for (a, b) in skill.translations.iter().zip(&reloaded.translations) {
            approx::assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
            approx::assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
            approx::assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
        }
        for (a, b) in skill.rotations.iter().zip(&reloaded.rotations) {
            approx::assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
            approx::assert_relative_eq!(a.w, b.w, epsilon = 1e-4);
        }
    }

    #[test]
    fn zero_counts_produce_empty_buffers_and_no_bytes() {
        let skill = blank_skill(0, 0);
        let bytes = write_keyframe_stream(&skill);
        assert!(bytes.is_empty());

        let mut reloaded = blank_skill(0, 0);
        populate_keyframes(&mut reloaded, &bytes).unwrap();
        assert!(reloaded.translations.is_empty());
        assert!(reloaded.rotations.is_empty());
    }

    #[test]
    fn truncated_stream_surfaces_an_error() {
        let mut skill = blank_skill(4, 0);
        assert!(populate_keyframes(&mut skill, &[]).is_err());
    }
}
