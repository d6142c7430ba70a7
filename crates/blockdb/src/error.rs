//! Error types for the block index.

use crate::spend_index::SpentOutputRecord;
use bitcoin::{BlockHash, OutPoint, ScriptBuf, Txid};
use blockdb_payload::PayloadError;
use std::path::PathBuf;

/// Errors returned while building the indexes or answering lookups.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No block with this hash was indexed.
    #[error("Block not found: {0}")]
    BlockNotFound(BlockHash),

    /// No transaction with this txid was indexed.
    #[error("Transaction not found: {0}")]
    TxNotFound(Txid),

    /// No spend is recorded for this output.
    #[error("Spend record not found: {0}")]
    SpendRecordNotFound(OutPoint),

    /// Output index past the end of the transaction's outputs.
    #[error("Output #{index} not found in transaction {txid}")]
    OutputNotFound { txid: Txid, index: usize },

    /// Input index past the end of the transaction's inputs.
    #[error("Input #{index} not found in transaction {txid}")]
    InputNotFound { txid: Txid, index: usize },

    /// A block file could not be decoded. Aborts index construction.
    #[error("Malformed block file {} at offset {offset}: {reason}", path.display())]
    MalformedFile {
        path: PathBuf,
        offset: u64,
        reason: String,
    },

    /// Fee computation could not resolve the output spent by an input.
    #[error("Predecessor {previous_output} of input #{input_index} in {txid} not found")]
    PredecessorNotFound {
        txid: Txid,
        input_index: usize,
        previous_output: OutPoint,
    },

    /// Input or output values of a transaction do not fit a signed 64-bit fee.
    #[error("Fee of {0} overflows")]
    FeeOverflow(Txid),

    /// Two different inputs claim the same output. Aborts index construction.
    #[error("Output {outpoint} spent twice: by {first} and by {second}")]
    DuplicateSpend {
        outpoint: OutPoint,
        first: SpentOutputRecord,
        second: SpentOutputRecord,
    },

    /// The output exists but no input spends it.
    #[error("Output {0} is unspent")]
    Unspent(OutPoint),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The address resolver does not know how to handle this locking script.
    #[error("Unrecognized script type: {0:?}")]
    UnrecognizedScriptType(ScriptBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error reports a missing block, transaction, spend record,
    /// input or output.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BlockNotFound(_)
                | Self::TxNotFound(_)
                | Self::SpendRecordNotFound(_)
                | Self::OutputNotFound { .. }
                | Self::InputNotFound { .. }
        )
    }
}
