//! Length and checksum framed payloads spread over many scripts.
//!
//! Layout: `len: u32 LE | crc32: u32 LE | payload[len] | padding`. Uploaders
//! split the framed bytes across fixed size script fragments, so the last
//! fragment usually carries padding after the payload, which is ignored here.

use crate::error::EncodingError;

const HEADER_LEN: usize = 8;

/// Unpacks a framed payload, verifying its declared length and CRC32 (IEEE).
pub fn decode_application_encoding(data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    if data.len() < HEADER_LEN {
        return Err(EncodingError::TooShort {
            expected: HEADER_LEN,
            got: data.len(),
        });
    }

    let (header, body) = data.split_at(HEADER_LEN);
    let declared = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let payload = body.get(..declared).ok_or(EncodingError::LengthOverflow {
        declared,
        available: body.len(),
    })?;

    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(EncodingError::ChecksumMismatch { expected, actual });
    }

    Ok(payload.to_vec())
}

/// Frames `payload` so that [`decode_application_encoding`] returns it unchanged.
///
/// # Panics
///
/// Panics if the payload is longer than `u32::MAX` bytes.
pub fn encode_application_encoding(payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).expect("payload length must fit into u32; qed");
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out.extend_from_slice(payload);
    out
}
