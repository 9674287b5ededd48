//! Structured character-record codec (component C3).
//!
//! The skeleton/suit/skill record layout is parsed and emitted once against
//! the [`crate::io::RecordReader`]/[`crate::io::RecordWriter`] traits and
//! instantiated for both the text and binary file variants.
mod types;

pub use types::*;

use std::collections::BTreeMap;

use crate::error::FormatError;
use crate::io::{BinaryReader, BinaryWriter, RecordReader, RecordWriter, TextReader, TextWriter};

fn read_props_block<R: RecordReader>(reader: &mut R) -> Result<PropertyBag, FormatError> {
    let count = reader.read_int()?.max(0);
    let mut bag = PropertyBag::new();
    for _ in 0..count {
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        bag.push(key, value);
    }
    Ok(bag)
}

fn write_props_block<W: RecordWriter>(writer: &mut W, bag: &PropertyBag) {
    writer.write_int(bag.len() as i32);
    for (key, value) in bag.iter() {
        writer.write_string(key);
        writer.write_string(value);
    }
}

fn read_optional_props<R: RecordReader>(reader: &mut R) -> Result<PropertyBag, FormatError> {
    if reader.read_bool()? {
        read_props_block(reader)
    } else {
        Ok(PropertyBag::new())
    }
}

fn write_optional_props<W: RecordWriter>(writer: &mut W, bag: &PropertyBag) {
    let has_props = !bag.is_empty();
    writer.write_bool(has_props);
    if has_props {
        write_props_block(writer, bag);
    }
}

fn read_time_properties<R: RecordReader>(
    reader: &mut R,
) -> Result<BTreeMap<i32, PropertyBag>, FormatError> {
    let mut map = BTreeMap::new();
    if reader.read_bool()? {
        let count = reader.read_int()?.max(0);
        for _ in 0..count {
            let key = reader.read_int()?;
            let props = read_props_block(reader)?;
            map.insert(key, props);
        }
    }
    Ok(map)
}

fn write_time_properties<W: RecordWriter>(writer: &mut W, map: &BTreeMap<i32, PropertyBag>) {
    let has_time_props = !map.is_empty();
    writer.write_bool(has_time_props);
    if has_time_props {
        writer.write_int(map.len() as i32);
        for (key, props) in map {
            writer.write_int(*key);
            write_props_block(writer, props);
        }
    }
}

fn read_bone<R: RecordReader>(reader: &mut R) -> Result<BoneDescription, FormatError> {
    let name = reader.read_string()?;
    let parent_name = reader.read_string()?;
    let properties = read_optional_props(reader)?;
    let position = reader.read_vec3()?;
    let rotation = reader.read_quat()?;
    let can_translate = reader.read_bool()?;
    let can_rotate = reader.read_bool()?;
    let can_blend = reader.read_bool()?;
    let can_wiggle = reader.read_bool()?;
    let wiggle_power = reader.read_float()?;
    Ok(BoneDescription {
        name,
        parent_name,
        position,
        rotation,
        can_translate,
        can_rotate,
        can_blend,
        can_wiggle,
        wiggle_power,
        properties,
    })
}

fn write_bone<W: RecordWriter>(writer: &mut W, bone: &BoneDescription) {
    writer.write_string(&bone.name);
    writer.write_string(&bone.parent_name);
    write_optional_props(writer, &bone.properties);
    writer.write_vec3(bone.position);
    writer.write_quat(bone.rotation);
    writer.write_bool(bone.can_translate);
    writer.write_bool(bone.can_rotate);
    writer.write_bool(bone.can_blend);
    writer.write_bool(bone.can_wiggle);
    writer.write_float(bone.wiggle_power);
}

fn read_skeleton<R: RecordReader>(reader: &mut R) -> Result<SkeletonDescription, FormatError> {
    let name = reader.read_string()?;
    let bone_count = reader.read_int()?.max(0);
    let mut bones = Vec::with_capacity(bone_count as usize);
    for _ in 0..bone_count {
        bones.push(read_bone(reader)?);
    }
    Ok(SkeletonDescription { name, bones })
}

fn write_skeleton<W: RecordWriter>(writer: &mut W, skeleton: &SkeletonDescription) {
    writer.write_string(&skeleton.name);
    writer.write_int(skeleton.bones.len() as i32);
    for bone in &skeleton.bones {
        write_bone(writer, bone);
    }
}

fn read_skin<R: RecordReader>(reader: &mut R) -> Result<SkinDescription, FormatError> {
    let name = reader.read_string()?;
    let bone_name = reader.read_string()?;
    let flags = reader.read_int()?;
    let mesh_name = reader.read_string()?;
    let properties = read_optional_props(reader)?;
    Ok(SkinDescription {
        name,
        bone_name,
        flags,
        mesh_name,
        properties,
    })
}

fn write_skin<W: RecordWriter>(writer: &mut W, skin: &SkinDescription) {
    writer.write_string(&skin.name);
    writer.write_string(&skin.bone_name);
    writer.write_int(skin.flags);
    writer.write_string(&skin.mesh_name);
    write_optional_props(writer, &skin.properties);
}

fn read_suit<R: RecordReader>(reader: &mut R) -> Result<SuitDescription, FormatError> {
    let name = reader.read_string()?;
    let suit_type = reader.read_int()?;
    let properties = read_optional_props(reader)?;
    let skin_count = reader.read_int()?.max(0);
    let mut skins = Vec::with_capacity(skin_count as usize);
    for _ in 0..skin_count {
        skins.push(read_skin(reader)?);
    }
    Ok(SuitDescription {
        name,
        suit_type,
        properties,
        skins,
    })
}

fn write_suit<W: RecordWriter>(writer: &mut W, suit: &SuitDescription) {
    writer.write_string(&suit.name);
    writer.write_int(suit.suit_type);
    write_optional_props(writer, &suit.properties);
    writer.write_int(suit.skins.len() as i32);
    for skin in &suit.skins {
        write_skin(writer, skin);
    }
}

fn read_motion<R: RecordReader>(reader: &mut R) -> Result<MotionDescription, FormatError> {
    let bone_name = reader.read_string()?;
    let frames = reader.read_int()?;
    let duration_ms = reader.read_float()?;
    let has_translation = reader.read_bool()?;
    let has_rotation = reader.read_bool()?;
    let translations_offset = reader.read_int()?;
    let rotations_offset = reader.read_int()?;
    let properties = read_optional_props(reader)?;
    let time_properties = read_time_properties(reader)?;
    Ok(MotionDescription {
        bone_name,
        frames,
        duration_ms,
        has_translation,
        has_rotation,
        translations_offset,
        rotations_offset,
        properties,
        time_properties,
    })
}

fn write_motion<W: RecordWriter>(writer: &mut W, motion: &MotionDescription) {
    writer.write_string(&motion.bone_name);
    writer.write_int(motion.frames);
    writer.write_float(motion.duration_ms);
    writer.write_bool(motion.has_translation);
    writer.write_bool(motion.has_rotation);
    writer.write_int(motion.translations_offset);
    writer.write_int(motion.rotations_offset);
    write_optional_props(writer, &motion.properties);
    write_time_properties(writer, &motion.time_properties);
}

fn read_skill<R: RecordReader>(reader: &mut R) -> Result<SkillDescription, FormatError> {
    let name = reader.read_string()?;
    let animation_file = reader.read_string()?;
    let duration_ms = reader.read_float()?;
    let distance = reader.read_float()?;
    let is_moving = reader.read_bool()?;
    let num_translations = reader.read_int()?;
    let num_rotations = reader.read_int()?;
    let motion_count = reader.read_int()?.max(0);
    let mut motions = Vec::with_capacity(motion_count as usize);
    for _ in 0..motion_count {
        motions.push(read_motion(reader)?);
    }
    Ok(SkillDescription {
        name,
        animation_file,
        duration_ms,
        distance,
        is_moving,
        num_translations,
        num_rotations,
        motions,
        // Keyframe buffers live in the separate CFP stream named by
        // `animation_file`; see `crate::keyframe::populate_keyframes`.
        translations: Vec::new(),
        rotations: Vec::new(),
    })
}

fn write_skill<W: RecordWriter>(writer: &mut W, skill: &SkillDescription) {
    writer.write_string(&skill.name);
    writer.write_string(&skill.animation_file);
    writer.write_float(skill.duration_ms);
    writer.write_float(skill.distance);
    writer.write_bool(skill.is_moving);
    writer.write_int(skill.num_translations);
    writer.write_int(skill.num_rotations);
    writer.write_int(skill.motions.len() as i32);
    for motion in &skill.motions {
        write_motion(writer, motion);
    }
}

/// Parse a `CharacterFile` body (skeletons, then suits, then skills) from
/// `reader`. Shared verbatim between the text and binary variants.
pub fn parse_character_record<R: RecordReader>(
    reader: &mut R,
) -> Result<CharacterFile, FormatError> {
    let skeleton_count = reader.read_int()?.max(0);
    let mut skeletons = Vec::with_capacity(skeleton_count as usize);
    for _ in 0..skeleton_count {
        skeletons.push(read_skeleton(reader)?);
    }

    let suit_count = reader.read_int()?.max(0);
    let mut suits = Vec::with_capacity(suit_count as usize);
    for _ in 0..suit_count {
        suits.push(read_suit(reader)?);
    }

    let skill_count = reader.read_int()?.max(0);
    let mut skills = Vec::with_capacity(skill_count as usize);
    for _ in 0..skill_count {
        skills.push(read_skill(reader)?);
    }

    Ok(CharacterFile {
        skeletons,
        suits,
        skills,
    })
}

pub fn write_character_record<W: RecordWriter>(writer: &mut W, file: &CharacterFile) {
    writer.write_int(file.skeletons.len() as i32);
    for skeleton in &file.skeletons {
        write_skeleton(writer, skeleton);
    }

    writer.write_int(file.suits.len() as i32);
    for suit in &file.suits {
        write_suit(writer, suit);
    }

    writer.write_int(file.skills.len() as i32);
    for skill in &file.skills {
        write_skill(writer, skill);
    }
}

/// Parse a text character file: a free-text header line, a version marker
/// line (ignored beyond framing — both `300` and `version 300` are valid),
/// then the structured record.
pub fn parse_character_file_text(content: &str) -> Result<CharacterFile, FormatError> {
    let mut lines: Vec<&str> = content.lines().collect();
    if !lines.is_empty() {
        lines.remove(0); // header
    }
    if !lines.is_empty() {
        lines.remove(0); // version marker
    }
    let body = lines.join("\n");
    let mut reader = TextReader::new(&body);
    parse_character_record(&mut reader)
}

/// Emit a text character file with the canonical header and `version 300`
/// marker.
pub fn write_character_file_text(file: &CharacterFile) -> String {
    let mut writer = TextWriter::new();
    writer.write_string("// VitaBoy character file");
    writer.write_string("version 300");
    write_character_record(&mut writer, file);
    writer.into_string()
}

/// Parse a binary character file: the structured record with no leading
/// version field.
pub fn parse_character_file_binary(bytes: &[u8]) -> Result<CharacterFile, FormatError> {
    let mut reader = BinaryReader::new(bytes);
    parse_character_record(&mut reader)
}

pub fn write_character_file_binary(file: &CharacterFile) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    write_character_record(&mut writer, file);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use glam::{Quat, Vec3};

    fn sample_file() -> CharacterFile {
        let mut props = PropertyBag::new();
        props.push("category", "head");

        let root = BoneDescription {
            name: "ROOT".into(),
            parent_name: "".into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            can_translate: true,
            can_rotate: true,
            can_blend: false,
            can_wiggle: false,
            wiggle_power: 0.0,
            properties: PropertyBag::new(),
        };
        let head = BoneDescription {
            name: "HEAD".into(),
            parent_name: "ROOT".into(),
            position: Vec3::new(0.0, 1.0, 0.0),
            rotation: Quat::IDENTITY,
            can_translate: false,
            can_rotate: true,
            can_blend: true,
            can_wiggle: true,
            wiggle_power: 0.5,
            properties: props,
        };

        CharacterFile {
            skeletons: vec![SkeletonDescription {
                name: "default".into(),
                bones: vec![root, head],
            }],
            suits: vec![],
            skills: vec![],
        }
    }

    #[test]
    fn binary_round_trip_is_bit_exact_in_structure() {
        let file = sample_file();
        let bytes = write_character_file_binary(&file);
        let parsed = parse_character_file_binary(&bytes).unwrap();
        assert_eq!(file, parsed);
    }

    #[test]
    fn text_round_trip_preserves_structure() {
        let file = sample_file();
        let text = write_character_file_text(&file);
        let parsed = parse_character_file_text(&text).unwrap();
        assert_eq!(file, parsed);
    }

    #[test]
    fn text_parser_accepts_bare_numeric_version() {
        let text = "header\n300\n0\n0\n0\n";
        let parsed = parse_character_file_text(text).unwrap();
        assert!(parsed.skeletons.is_empty());
    }

    #[test]
    fn empty_character_file_round_trips() {
        let file = CharacterFile::default();
        let bytes = write_character_file_binary(&file);
        assert_eq!(parse_character_file_binary(&bytes).unwrap(), file);
    }

    #[test]
    fn property_bag_preserves_non_unique_keys_and_order() {
        let mut bag = PropertyBag::new();
        bag.push("a", "1");
        bag.push("a", "2");
        bag.push("b", "3");

        let mut writer = BinaryWriter::new();
        write_props_block(&mut writer, &bag);
        let bytes = writer.into_bytes();
        let mut reader = BinaryReader::new(&bytes);
        let parsed = read_props_block(&mut reader).unwrap();
        assert_eq!(parsed.0, bag.0);
    }
}
