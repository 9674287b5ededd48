use glam::{Quat, Vec2, Vec3};
use log::trace;

use crate::error::FormatError;

use super::{RecordReader, RecordWriter};

/// Cursor-based reader over a little-endian binary buffer.
///
/// `read_string` reads a one-byte length prefix, or — if that byte is
/// `0xFF` — a four-byte little-endian length that follows, then decodes the
/// payload as Latin-1 (each byte maps 1:1 onto the Unicode code point of
/// the same value).
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.data.len() {
            return Err(FormatError::TruncatedBinary);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, FormatError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, FormatError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32, FormatError> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_f32_le(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        self.take(n)
    }
}

impl RecordReader for BinaryReader<'_> {
    fn read_string(&mut self) -> Result<String, FormatError> {
        let len = self.read_u8()?;
        let len = if len == 255 {
            self.read_u32_le()? as usize
        } else {
            len as usize
        };
        trace!(
            "reading string of length {len} at offset {} ({} bytes remaining)",
            self.position(),
            self.remaining()
        );
        let bytes = self.take(len)?;
        // Latin-1 decode: every byte is its own code point.
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    fn read_int(&mut self) -> Result<i32, FormatError> {
        self.read_i32_le()
    }

    fn read_float(&mut self) -> Result<f32, FormatError> {
        self.read_f32_le()
    }

    fn read_bool(&mut self) -> Result<bool, FormatError> {
        Ok(self.read_i32_le()? != 0)
    }

    fn read_vec2(&mut self) -> Result<Vec2, FormatError> {
        Ok(Vec2::new(self.read_f32_le()?, self.read_f32_le()?))
    }

    fn read_vec3(&mut self) -> Result<Vec3, FormatError> {
        Ok(Vec3::new(
            self.read_f32_le()?,
            self.read_f32_le()?,
            self.read_f32_le()?,
        ))
    }

    fn read_quat(&mut self) -> Result<Quat, FormatError> {
        Ok(Quat::from_xyzw(
            self.read_f32_le()?,
            self.read_f32_le()?,
            self.read_f32_le()?,
            self.read_f32_le()?,
        ))
    }
}

/// Growable little-endian binary writer. `Vec<u8>` already doubles its
/// capacity on growth, so no manual doubling logic is needed on top.
#[derive(Default)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, value: i32) {
        self.write_u32_le(value as u32);
    }

    pub fn write_f32_le(&mut self, value: f32) {
        self.write_u32_le(value.to_bits());
    }
}

impl RecordWriter for BinaryWriter {
    fn write_string(&mut self, value: &str) {
        // Encode as Latin-1: take the low byte of each scalar value. Values
        // produced by our own reader are always in range since they came
        // from single bytes originally.
        let bytes: Vec<u8> = value.chars().map(|c| c as u32 as u8).collect();
        if bytes.len() < 255 {
            self.write_u8(bytes.len() as u8);
        } else {
            self.write_u8(255);
            self.write_u32_le(bytes.len() as u32);
        }
        self.write_bytes(&bytes);
    }

    fn write_int(&mut self, value: i32) {
        self.write_i32_le(value);
    }

    fn write_float(&mut self, value: f32) {
        self.write_f32_le(value);
    }

    fn write_bool(&mut self, value: bool) {
        self.write_u32_le(if value { 1 } else { 0 });
    }

    fn write_vec2(&mut self, value: Vec2) {
        self.write_f32_le(value.x);
        self.write_f32_le(value.y);
    }

    fn write_vec3(&mut self, value: Vec3) {
        self.write_f32_le(value.x);
        self.write_f32_le(value.y);
        self.write_f32_le(value.z);
    }

    fn write_quat(&mut self, value: Quat) {
        self.write_f32_le(value.x);
        self.write_f32_le(value.y);
        self.write_f32_le(value.z);
        self.write_f32_le(value.w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_round_trips() {
        let mut writer = BinaryWriter::new();
        writer.write_string("HEAD");
        let bytes = writer.into_bytes();
        assert_eq!(bytes[0], 4);

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_string().unwrap(), "HEAD");
    }

    #[test]
    fn long_string_uses_sentinel_length() {
        let long = "x".repeat(300);
        let mut writer = BinaryWriter::new();
        writer.write_string(&long);
        let bytes = writer.into_bytes();
        assert_eq!(bytes[0], 255);

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_string().unwrap(), long);
    }

    #[test]
    fn truncated_buffer_errors() {
        let mut reader = BinaryReader::new(&[1, 2, 3]);
        assert!(matches!(
            reader.read_u32_le(),
            Err(FormatError::TruncatedBinary)
        ));
    }

    #[test]
    fn bool_is_nonzero_u32() {
        let mut writer = BinaryWriter::new();
        writer.write_bool(true);
        writer.write_bool(false);
        let bytes = writer.into_bytes();
        let mut reader = BinaryReader::new(&bytes);
        assert!(reader.read_bool().unwrap());
        assert!(!reader.read_bool().unwrap());
    }
}
