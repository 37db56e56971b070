use thiserror::Error;

/// Failures surfaced by the `Result`-returning entry points.
///
/// Plain `verify()` never errors; it reports a mismatch as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid header magic {found:#010x} (expected {expected:#010x})", expected = crate::header::MAGIC)]
    InvalidMagic { found: u32 },

    #[error("checksum mismatch: stored {stored:#018x}, computed {computed:#018x}")]
    ChecksumMismatch { stored: u64, computed: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
