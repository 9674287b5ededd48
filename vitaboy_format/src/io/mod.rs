//! Unified text/binary reader and writer abstraction (component C1).
//!
//! The structured codec in [`crate::record`] and [`crate::mesh`] is written
//! once against [`RecordReader`]/[`RecordWriter`] and instantiated against
//! either a [`TextReader`]/[`TextWriter`] or a
//! [`BinaryReader`]/[`BinaryWriter`].
mod binary;
mod text;

pub use binary::{BinaryReader, BinaryWriter};
pub use text::{TextReader, TextWriter};

use glam::{Quat, Vec2, Vec3};

use crate::error::FormatError;

/// Capability set shared by the text and binary readers.
///
/// The text implementation is permissive: malformed atoms recover to a
/// default (`0`, `0.0`, `false`) rather than returning `Err`, per the
/// format's error-handling policy. The binary implementation fails with
/// [`FormatError::TruncatedBinary`] when the underlying buffer is
/// exhausted. Both are expressed through the same fallible signature so
/// callers at the file-load boundary see one `Result`-based API regardless
/// of which reader backs it.
pub trait RecordReader {
    fn read_string(&mut self) -> Result<String, FormatError>;
    fn read_int(&mut self) -> Result<i32, FormatError>;
    fn read_float(&mut self) -> Result<f32, FormatError>;
    fn read_bool(&mut self) -> Result<bool, FormatError>;
    fn read_vec2(&mut self) -> Result<Vec2, FormatError>;
    fn read_vec3(&mut self) -> Result<Vec3, FormatError>;
    fn read_quat(&mut self) -> Result<Quat, FormatError>;

    /// A mesh face: three vertex indices. Text stores all three on one
    /// line; binary reads three atomic ints.
    fn read_face(&mut self) -> Result<[i32; 3], FormatError> {
        Ok([self.read_int()?, self.read_int()?, self.read_int()?])
    }

    /// A `BoneBinding`: bone index, first/count for the bound and blended
    /// vertex ranges.
    fn read_bone_binding_fields(&mut self) -> Result<[i32; 5], FormatError> {
        Ok([
            self.read_int()?,
            self.read_int()?,
            self.read_int()?,
            self.read_int()?,
            self.read_int()?,
        ])
    }

    /// A `BlendBinding`: target vertex index and fixed-point weight.
    fn read_blend_binding_fields(&mut self) -> Result<[i32; 2], FormatError> {
        Ok([self.read_int()?, self.read_int()?])
    }

    /// A bound-section vertex: position followed by normal.
    fn read_vertex_normal(&mut self) -> Result<(Vec3, Vec3), FormatError> {
        Ok((self.read_vec3()?, self.read_vec3()?))
    }
}

/// Capability set shared by the text and binary writers. Writes never fail:
/// both implementations grow an in-memory buffer.
pub trait RecordWriter {
    fn write_string(&mut self, value: &str);
    fn write_int(&mut self, value: i32);
    fn write_float(&mut self, value: f32);
    fn write_bool(&mut self, value: bool);
    fn write_vec2(&mut self, value: Vec2);
    fn write_vec3(&mut self, value: Vec3);
    fn write_quat(&mut self, value: Quat);

    fn write_face(&mut self, face: [i32; 3]) {
        self.write_int(face[0]);
        self.write_int(face[1]);
        self.write_int(face[2]);
    }

    fn write_bone_binding_fields(&mut self, fields: [i32; 5]) {
        for f in fields {
            self.write_int(f);
        }
    }

    fn write_blend_binding_fields(&mut self, fields: [i32; 2]) {
        self.write_int(fields[0]);
        self.write_int(fields[1]);
    }

    fn write_vertex_normal(&mut self, position: Vec3, normal: Vec3) {
        self.write_vec3(position);
        self.write_vec3(normal);
    }
}
