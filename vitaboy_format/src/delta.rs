//! Delta-compressed keyframe float streams (component C2).
//!
//! Encodes/decodes interleaved `(N, D)` float arrays using a fixed 253-entry
//! quartic lookup table plus two escape codes (absolute jump, repeat run).
use std::sync::OnceLock;

use crate::error::FormatError;
use crate::io::BinaryReader;

const TABLE_LEN: usize = 253;
const SPREAD: f32 = 0.1;

const CODE_REPEAT: u8 = 254;
const CODE_ABSOLUTE: u8 = 255;
const CODE_RESERVED: u8 = 253;

static TABLE: OnceLock<[f32; TABLE_LEN]> = OnceLock::new();

fn build_table() -> [f32; TABLE_LEN] {
    let mut table = [0.0f32; TABLE_LEN];
    for (i, entry) in table.iter_mut().enumerate() {
        let v = 2.0 * (i as f32 / (TABLE_LEN as f32 - 1.0)) - 1.0;
        *entry = v.signum() * v.powi(4) * SPREAD;
    }
    table
}

/// The process-wide, lazily-initialized quartic delta table. Idempotent:
/// concurrent first calls all compute the same values, so the usual
/// double-checked `OnceLock` race is harmless.
pub fn delta_table() -> &'static [f32; TABLE_LEN] {
    TABLE.get_or_init(build_table)
}

/// Decode an interleaved `(N, D)` float array from `reader`.
///
/// Dimensions are stored major (all of dimension 0, then all of dimension
/// 1, ...); the output is interleaved so sample `i` of dimension `d` lands
/// at `out[d + i * D]`. The accumulator and any pending repeat count
/// deliberately carry across dimension boundaries, matching the reference
/// decoder (in practice every dimension starts with an absolute jump, so
/// the carry is unobservable).
pub fn decompress(reader: &mut BinaryReader, n: usize, d: usize) -> Result<Vec<f32>, FormatError> {
    let table = delta_table();
    let mut out = vec![0.0f32; n * d];
    let mut accumulator = 0.0f32;
    let mut repeat_remaining: u32 = 0;

    for dim in 0..d {
        for i in 0..n {
            if repeat_remaining > 0 {
                repeat_remaining -= 1;
            } else {
                match reader.read_u8()? {
                    CODE_RESERVED => return Err(FormatError::ReservedDeltaCode),
                    CODE_REPEAT => {
                        repeat_remaining = reader.read_u16_le()? as u32;
                    }
                    CODE_ABSOLUTE => {
                        accumulator = reader.read_f32_le()?;
                    }
                    code => {
                        accumulator += table[code as usize];
                    }
                }
            }
            out[dim + i * d] = accumulator;
        }
    }

    Ok(out)
}

/// Encode an interleaved `(N, D)` float array into a CFP-style byte stream.
///
/// The first sample of every dimension is always an absolute jump. Runs of
/// samples that stay within tolerance of the current accumulator are
/// collapsed into a single repeat escape rather than one delta code per
/// sample.
pub fn compress(data: &[f32], n: usize, d: usize) -> Vec<u8> {
    let table = delta_table();
    let mut writer = crate::io::BinaryWriter::new();

    for dim in 0..d {
        if n == 0 {
            continue;
        }

        let mut accumulator = data[dim];
        writer.write_u8(CODE_ABSOLUTE);
        writer.write_f32_le(accumulator);

        let mut pending_repeat: Option<u16> = None;

        for i in 1..n {
            let target = data[dim + i * d];
            let diff = target - accumulator;
            let tolerance = if pending_repeat.is_some() { 1e-5 } else { 1e-6 };

            if diff.abs() <= tolerance {
                pending_repeat = Some(match pending_repeat {
                    None => 0,
                    Some(k) if k == u16::MAX => {
                        writer.write_u8(CODE_REPEAT);
                        writer.write_u16_le(k);
                        0
                    }
                    Some(k) => k + 1,
                });
                continue;
            }

            if let Some(k) = pending_repeat.take() {
                writer.write_u8(CODE_REPEAT);
                writer.write_u16_le(k);
            }

            if diff < table[0] || diff > table[TABLE_LEN - 1] {
                writer.write_u8(CODE_ABSOLUTE);
                writer.write_f32_le(target);
                accumulator = target;
            } else {
                let mut best_code = 0usize;
                let mut best_err = f32::INFINITY;
                for (code, &entry) in table.iter().enumerate() {
                    let err = (target - (accumulator + entry)).abs();
                    if err < best_err {
                        best_err = err;
                        best_code = code;
                    }
                }
                writer.write_u8(best_code as u8);
                accumulator += table[best_code];
            }
        }

        if let Some(k) = pending_repeat.take() {
            writer.write_u8(CODE_REPEAT);
            writer.write_u16_le(k);
        }
    }

    writer.into_bytes()
}
