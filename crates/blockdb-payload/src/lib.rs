//! Extraction of auxiliary payload bytes embedded in Bitcoin scripts.
//!
//! Data has been stuffed into the chain in many ways: `OP_RETURN` outputs,
//! fake public keys inside multisig outputs, literal bytes that happen to
//! decode as opcodes, oversized pushes in unlocking scripts. The functions in
//! this crate pull those bytes back out of a single script, and the
//! `concat_across_*` helpers reassemble payloads that were split over many
//! inputs or outputs.
//!
//! Every script byte is either framing (a push opcode and its length prefix),
//! a push operand, or a literal byte. [`extract_pushdata_bytes`] and
//! [`extract_non_push_bytes`] select the latter two kinds and never overlap.

mod encoding;
mod error;
mod segment;


use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::{Script, TxIn, TxOut};

pub use encoding::{decode_application_encoding, encode_application_encoding};
pub use error::{EncodingError, PayloadError};
pub use segment::{Segment, Segments, script_segments};

/// Payload result type.
pub type Result<T> = std::result::Result<T, PayloadError>;

/// Returns the bytes pushed after a leading `OP_RETURN`, concatenated in push order.
pub fn extract_marked_payload(script: &Script) -> Result<Vec<u8>> {
    match script.as_bytes().split_first() {
        Some((&first, rest)) if first == OP_RETURN.to_u8() => {
            Ok(extract_pushdata_bytes(Script::from_bytes(rest)))
        }
        _ => Err(PayloadError::NotMarked),
    }
}

/// Returns every byte that is not part of a push operand or its framing.
///
/// This captures content hidden as literal opcode bytes, plus the raw tail of
/// a script whose final push is truncated.
pub fn extract_non_push_bytes(script: &Script) -> Vec<u8> {
    let mut out = Vec::new();
    for segment in script_segments(script) {
        match segment {
            Segment::Opcode(byte) => out.push(byte),
            Segment::Trailing(bytes) => out.extend_from_slice(bytes),
            Segment::Push(_) => {}
        }
    }
    out
}

/// Returns only the pushed operand bytes, in script order.
pub fn extract_pushdata_bytes(script: &Script) -> Vec<u8> {
    let mut out = Vec::new();
    for segment in script_segments(script) {
        if let Segment::Push(bytes) = segment {
            out.extend_from_slice(bytes);
        }
    }
    out
}

/// Applies `extractor` to every locking script and concatenates the results.
///
/// Scripts the extractor rejects are skipped; if every script is rejected the
/// result is empty.
pub fn concat_across_outputs<F, E>(outputs: &[TxOut], extractor: F) -> Vec<u8>
where
    F: Fn(&Script) -> std::result::Result<Vec<u8>, E>,
    E: std::fmt::Display,
{
    concat_scripts(
        outputs.iter().map(|output| output.script_pubkey.as_script()),
        extractor,
    )
}

/// Applies `extractor` to every unlocking script and concatenates the results.
///
/// Same skip policy as [`concat_across_outputs`].
pub fn concat_across_inputs<F, E>(inputs: &[TxIn], extractor: F) -> Vec<u8>
where
    F: Fn(&Script) -> std::result::Result<Vec<u8>, E>,
    E: std::fmt::Display,
{
    concat_scripts(
        inputs.iter().map(|input| input.script_sig.as_script()),
        extractor,
    )
}

fn concat_scripts<'a, F, E>(scripts: impl Iterator<Item = &'a Script>, extractor: F) -> Vec<u8>
where
    F: Fn(&Script) -> std::result::Result<Vec<u8>, E>,
    E: std::fmt::Display,
{
    let mut out = Vec::new();
    for (index, script) in scripts.enumerate() {
        match extractor(script) {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(err) => {
                tracing::trace!(index, %err, "Skipping script during payload aggregation");
            }
        }
    }
    out
}

/// Adapts an infallible extractor to the signature expected by the
/// `concat_across_*` helpers.
pub fn infallible(
    extractor: fn(&Script) -> Vec<u8>,
) -> impl Fn(&Script) -> std::result::Result<Vec<u8>, std::convert::Infallible> {
    move |script| Ok(extractor(script))
}
