use thiserror::Error;

/// Errors surfaced by the structured codec.
///
/// Content-level anomalies (unknown bones, missing keyframes, out-of-range
/// mesh bone indices) are intentionally *not* represented here: those are
/// recovered from silently at the call site and only logged, since legacy
/// content routinely contains them and must still load.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("binary reader ran past the end of the buffer")]
    TruncatedBinary,

    #[error("bitmap does not start with the 'BM' magic bytes")]
    BadBmpMagic,

    #[error("unsupported bitmap bit depth {0} (expected 8, 24, or 32)")]
    BadBmpDepth(u16),

    #[error("unsupported bitmap compression {0}")]
    BadBmpCompression(u32),

    #[error("delta stream used reserved code 253")]
    ReservedDeltaCode,
}
