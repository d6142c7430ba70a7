/// Payload extraction error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The script does not start with `OP_RETURN`.
    #[error("script is not marked as data (missing leading OP_RETURN)")]
    NotMarked,
    /// The byte stream does not follow the length/checksum framing.
    #[error("corrupt encoding: {0}")]
    CorruptEncoding(#[from] EncodingError),
}

/// Reasons a byte stream fails [`crate::decode_application_encoding`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("need at least {expected} header bytes, got {got}")]
    TooShort { expected: usize, got: usize },
    #[error("declared payload length {declared} exceeds the {available} bytes available")]
    LengthOverflow { declared: usize, available: usize },
    #[error("crc32 mismatch: header says {expected:#010x}, payload hashes to {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}
