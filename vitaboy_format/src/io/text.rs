use glam::{Quat, Vec2, Vec3};

use crate::error::FormatError;

use super::{RecordReader, RecordWriter};

/// Line-oriented reader over a UTF-8 text character/mesh file.
///
/// Blank lines and lines whose first non-whitespace characters are `//` are
/// skipped when fetching the next logical line. Malformed numeric or
/// boolean atoms recover to `0`/`0.0`/`false` rather than failing the parse
/// — the text formats ship with hand-edited content and must tolerate it.
pub struct TextReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> TextReader<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().collect(),
            pos: 0,
        }
    }

    fn is_logical(line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with("//")
    }

    /// Advance past and return the next logical (non-blank, non-comment)
    /// line, or `""` if the input is exhausted.
    fn next_logical_line(&mut self) -> &'a str {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            if Self::is_logical(line) {
                return line.trim();
            }
        }
        ""
    }

    /// Look at the next logical line without consuming it. Used to tolerate
    /// the optional version line ambiguity in the text mesh format.
    pub fn peek_logical_line(&self) -> Option<&'a str> {
        let mut i = self.pos;
        while i < self.lines.len() {
            let line = self.lines[i];
            if Self::is_logical(line) {
                return Some(line.trim());
            }
            i += 1;
        }
        None
    }

    /// Consume the next logical line unconditionally (used after a
    /// successful `peek_logical_line` check).
    pub fn skip_logical_line(&mut self) {
        self.next_logical_line();
    }

    fn next_tokens(&mut self) -> Vec<&'a str> {
        self.next_logical_line().split_whitespace().collect()
    }

    fn parse_int_token(token: &str) -> i32 {
        token.trim().parse::<i32>().unwrap_or(0)
    }

    fn parse_float_token(token: &str) -> f32 {
        token.trim().parse::<f32>().unwrap_or(0.0)
    }
}

impl RecordReader for TextReader<'_> {
    fn read_string(&mut self) -> Result<String, FormatError> {
        Ok(self.next_logical_line().to_string())
    }

    fn read_int(&mut self) -> Result<i32, FormatError> {
        Ok(Self::parse_int_token(self.next_logical_line()))
    }

    fn read_float(&mut self) -> Result<f32, FormatError> {
        Ok(Self::parse_float_token(self.next_logical_line()))
    }

    fn read_bool(&mut self) -> Result<bool, FormatError> {
        let line = self.next_logical_line().trim().to_lowercase();
        Ok(line == "1" || line == "true" || line == "yes")
    }

    fn read_vec2(&mut self) -> Result<Vec2, FormatError> {
        let line = self.next_logical_line().replace('|', " ");
        let mut tokens = line.split_whitespace();
        let x = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        let y = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        Ok(Vec2::new(x, y))
    }

    fn read_vec3(&mut self) -> Result<Vec3, FormatError> {
        let line = self.next_logical_line().replace('|', " ");
        let mut tokens = line.split_whitespace();
        let x = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        let y = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        let z = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        Ok(Vec3::new(x, y, z))
    }

    fn read_quat(&mut self) -> Result<Quat, FormatError> {
        let line = self.next_logical_line().replace('|', " ");
        let mut tokens = line.split_whitespace();
        let x = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        let y = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        let z = tokens.next().map(Self::parse_float_token).unwrap_or(0.0);
        let w = tokens.next().map(Self::parse_float_token).unwrap_or(1.0);
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    fn read_face(&mut self) -> Result<[i32; 3], FormatError> {
        let tokens = self.next_tokens();
        Ok([
            tokens.first().copied().map(Self::parse_int_token).unwrap_or(0),
            tokens.get(1).copied().map(Self::parse_int_token).unwrap_or(0),
            tokens.get(2).copied().map(Self::parse_int_token).unwrap_or(0),
        ])
    }

    fn read_bone_binding_fields(&mut self) -> Result<[i32; 5], FormatError> {
        let tokens = self.next_tokens();
        let mut out = [0i32; 5];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = tokens.get(i).copied().map(Self::parse_int_token).unwrap_or(0);
        }
        Ok(out)
    }

    fn read_blend_binding_fields(&mut self) -> Result<[i32; 2], FormatError> {
        let tokens = self.next_tokens();
        let mut out = [0i32; 2];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = tokens.get(i).copied().map(Self::parse_int_token).unwrap_or(0);
        }
        Ok(out)
    }

    fn read_vertex_normal(&mut self) -> Result<(Vec3, Vec3), FormatError> {
        let tokens = self.next_tokens();
        let get = |i: usize| tokens.get(i).copied().map(Self::parse_float_token).unwrap_or(0.0);
        let position = Vec3::new(get(0), get(1), get(2));
        let normal = Vec3::new(get(3), get(4), get(5));
        Ok((position, normal))
    }
}

/// Line-oriented writer producing the text variant of a character/mesh
/// file.
#[derive(Default)]
pub struct TextWriter {
    buffer: String,
}

impl TextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    fn push_line(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }
}

impl RecordWriter for TextWriter {
    fn write_string(&mut self, value: &str) {
        self.push_line(value);
    }

    fn write_int(&mut self, value: i32) {
        self.push_line(&value.to_string());
    }

    fn write_float(&mut self, value: f32) {
        self.push_line(&value.to_string());
    }

    fn write_bool(&mut self, value: bool) {
        self.push_line(if value { "1" } else { "0" });
    }

    fn write_vec2(&mut self, value: Vec2) {
        self.push_line(&format!("{} {}", value.x, value.y));
    }

    fn write_vec3(&mut self, value: Vec3) {
        self.push_line(&format!("| {} {} {} |", value.x, value.y, value.z));
    }

    fn write_quat(&mut self, value: Quat) {
        self.push_line(&format!(
            "| {} {} {} {} |",
            value.x, value.y, value.z, value.w
        ));
    }

    fn write_face(&mut self, face: [i32; 3]) {
        self.push_line(&format!("{} {} {}", face[0], face[1], face[2]));
    }

    fn write_bone_binding_fields(&mut self, fields: [i32; 5]) {
        self.push_line(
            &fields
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        );
    }

    fn write_blend_binding_fields(&mut self, fields: [i32; 2]) {
        self.push_line(&format!("{} {}", fields[0], fields[1]));
    }

    fn write_vertex_normal(&mut self, position: Vec3, normal: Vec3) {
        self.push_line(&format!(
            "{} {} {} {} {} {}",
            position.x, position.y, position.z, normal.x, normal.y, normal.z
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let mut reader = TextReader::new("// a comment\n\n  \n42\n");
        assert_eq!(reader.read_int().unwrap(), 42);
    }

    #[test]
    fn read_bool_accepts_expected_spellings() {
        for (line, expected) in [("1", true), ("true", true), ("YES", true), ("0", false), ("nope", false)] {
            let mut reader = TextReader::new(line);
            assert_eq!(reader.read_bool().unwrap(), expected);
        }
    }

    #[test]
    fn malformed_number_recovers_to_zero() {
        let mut reader = TextReader::new("not_a_number\n");
        assert_eq!(reader.read_int().unwrap(), 0);
        let mut reader = TextReader::new("not_a_float\n");
        assert_eq!(reader.read_float().unwrap(), 0.0);
    }

    #[test]
    fn vec3_strips_pipes() {
        let mut reader = TextReader::new("| 1.0 2.0 3.0 |\n");
        assert_eq!(reader.read_vec3().unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn quat_round_trips_through_writer() {
        let mut writer = TextWriter::new();
        writer.write_quat(Quat::from_xyzw(0.1, 0.2, 0.3, 0.9));
        let text = writer.into_string();
        let mut reader = TextReader::new(&text);
        let q = reader.read_quat().unwrap();
        assert!((q.x - 0.1).abs() < 1e-6);
        assert!((q.w - 0.9).abs() < 1e-6);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut reader = TextReader::new("300\nrest\n");
        assert_eq!(reader.peek_logical_line(), Some("300"));
        assert_eq!(reader.read_int().unwrap(), 300);
        assert_eq!(reader.read_string().unwrap(), "rest");
    }
}
