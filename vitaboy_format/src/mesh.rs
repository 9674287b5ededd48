//! Mesh record codec (component C3, mesh half).
//!
//! Shares the same record layout across the text and binary mesh file
//! variants, parameterized over [`RecordReader`]/[`RecordWriter`] exactly
//! like [`crate::record`].
use crate::error::FormatError;
use crate::io::{BinaryReader, BinaryWriter, RecordReader, RecordWriter, TextReader, TextWriter};
use crate::record::{BlendBinding, BoneBinding, MeshDescription};

/// Blend weights are stored on disk as fixed-point integers; this scale
/// maps the integer range onto `[0.0, 1.0]`.
const FIXED_POINT_SCALE: f32 = 32768.0;

pub fn parse_mesh_record<R: RecordReader>(reader: &mut R) -> Result<MeshDescription, FormatError> {
    let name = reader.read_string()?;
    let texture_name = reader.read_string()?;

    let bone_name_count = reader.read_int()?.max(0);
    let mut bone_names = Vec::with_capacity(bone_name_count as usize);
    for _ in 0..bone_name_count {
        bone_names.push(reader.read_string()?);
    }

    let face_count = reader.read_int()?.max(0);
    let mut faces = Vec::with_capacity(face_count as usize);
    for _ in 0..face_count {
        faces.push(reader.read_face()?);
    }

    let binding_count = reader.read_int()?.max(0);
    let mut bindings = Vec::with_capacity(binding_count as usize);
    for _ in 0..binding_count {
        let f = reader.read_bone_binding_fields()?;
        bindings.push(BoneBinding {
            bone_index: f[0],
            first_bound_vertex: f[1],
            bound_vertex_count: f[2],
            first_blended_vertex: f[3],
            blended_vertex_count: f[4],
        });
    }

    let uv_count = reader.read_int()?.max(0);
    let mut uvs = Vec::with_capacity(uv_count as usize);
    for _ in 0..uv_count {
        uvs.push(reader.read_vec2()?);
    }

    let blend_count = reader.read_int()?.max(0);
    let mut blend_bindings = Vec::with_capacity(blend_count as usize);
    for _ in 0..blend_count {
        let f = reader.read_blend_binding_fields()?;
        blend_bindings.push(BlendBinding {
            target_index: f[0],
            weight: f[1] as f32 / FIXED_POINT_SCALE,
        });
    }

    let vertex_count = reader.read_int()?.max(0);
    let mut positions = Vec::with_capacity(vertex_count as usize);
    let mut normals = Vec::with_capacity(vertex_count as usize);
    for _ in 0..vertex_count {
        let (position, normal) = reader.read_vertex_normal()?;
        positions.push(position);
        normals.push(normal);
    }

    Ok(MeshDescription {
        name,
        texture_name,
        bone_names,
        faces,
        bindings,
        uvs,
        blend_bindings,
        positions,
        normals,
    })
}

pub fn write_mesh_record<W: RecordWriter>(writer: &mut W, mesh: &MeshDescription) {
    writer.write_string(&mesh.name);
    writer.write_string(&mesh.texture_name);

    writer.write_int(mesh.bone_names.len() as i32);
    for bone_name in &mesh.bone_names {
        writer.write_string(bone_name);
    }

    writer.write_int(mesh.faces.len() as i32);
    for face in &mesh.faces {
        writer.write_face(*face);
    }

    writer.write_int(mesh.bindings.len() as i32);
    for binding in &mesh.bindings {
        writer.write_bone_binding_fields([
            binding.bone_index,
            binding.first_bound_vertex,
            binding.bound_vertex_count,
            binding.first_blended_vertex,
            binding.blended_vertex_count,
        ]);
    }

    writer.write_int(mesh.uvs.len() as i32);
    for uv in &mesh.uvs {
        writer.write_vec2(*uv);
    }

    writer.write_int(mesh.blend_bindings.len() as i32);
    for blend in &mesh.blend_bindings {
        writer.write_blend_binding_fields([
            blend.target_index,
            (blend.weight * FIXED_POINT_SCALE).round() as i32,
        ]);
    }

    writer.write_int(mesh.positions.len() as i32);
    for (position, normal) in mesh.positions.iter().zip(&mesh.normals) {
        writer.write_vertex_normal(*position, *normal);
    }
}

/// Parse a text mesh file. Some producers emit a leading numeric version
/// line before the mesh name; others omit it entirely. Tolerate both by
/// peeking the first logical line and skipping it only if it parses as a
/// bare integer.
pub fn parse_mesh_file_text(content: &str) -> Result<MeshDescription, FormatError> {
    let mut reader = TextReader::new(content);
    if let Some(line) = reader.peek_logical_line() {
        if line.parse::<i32>().is_ok() {
            reader.skip_logical_line();
        }
    }
    parse_mesh_record(&mut reader)
}

/// Emit a text mesh file with no leading version line (the mesh name is the
/// first logical line).
pub fn write_mesh_file_text(mesh: &MeshDescription) -> String {
    let mut writer = TextWriter::new();
    write_mesh_record(&mut writer, mesh);
    writer.into_string()
}

pub fn parse_mesh_file_binary(bytes: &[u8]) -> Result<MeshDescription, FormatError> {
    let mut reader = BinaryReader::new(bytes);
    parse_mesh_record(&mut reader)
}

pub fn write_mesh_file_binary(mesh: &MeshDescription) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    write_mesh_record(&mut writer, mesh);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use glam::{Vec2, Vec3};

    fn sample_mesh() -> MeshDescription {
        MeshDescription {
            name: "head_mesh".into(),
            texture_name: "head.bmp".into(),
            bone_names: vec!["HEAD".into()],
            faces: vec![[0, 1, 2]],
            bindings: vec![BoneBinding {
                bone_index: 0,
                first_bound_vertex: 0,
                bound_vertex_count: 3,
                first_blended_vertex: 0,
                blended_vertex_count: 1,
            }],
            uvs: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            blend_bindings: vec![BlendBinding {
                target_index: 1,
                weight: 0.5,
            }],
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
            ],
            normals: vec![
                Vec3::Y,
                Vec3::Y,
                Vec3::Y,
                Vec3::Y,
            ],
        }
    }

    #[test]
    fn binary_round_trip() {
        let mesh = sample_mesh();
        let bytes = write_mesh_file_binary(&mesh);
        let parsed = parse_mesh_file_binary(&bytes).unwrap();
        assert_eq!(mesh, parsed);
    }

    #[test]
    fn text_round_trip() {
        let mesh = sample_mesh();
        let text = write_mesh_file_text(&mesh);
        let parsed = parse_mesh_file_text(&text).unwrap();
        assert_eq!(mesh, parsed);
    }

    #[test]
    fn text_parser_tolerates_leading_version_line() {
        let mesh = sample_mesh();
        let text = format!("7\n{}", write_mesh_file_text(&mesh));
        let parsed = parse_mesh_file_text(&text).unwrap();
        assert_eq!(mesh, parsed);
    }

    #[test]
    fn fixed_point_weight_round_trips_within_one_unit() {
        let mut mesh = sample_mesh();
        mesh.blend_bindings[0].weight = 0.33333;
        let bytes = write_mesh_file_binary(&mesh);
        let parsed = parse_mesh_file_binary(&bytes).unwrap();
        assert!((parsed.blend_bindings[0].weight - 0.33333).abs() < 1.0 / FIXED_POINT_SCALE);
    }
}
