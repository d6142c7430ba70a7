//! Block and transaction location index.

use crate::blk_file::BlockFile;
use crate::scan::{ScannedBlock, scan_file};
use crate::{Error, Result};
use bitcoin::{BlockHash, Txid};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Where a block lives in the block file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    /// Index of the block file, `N` in `blkN.dat`.
    pub file_index: u32,
    /// Offset of the block payload, just past the record header.
    pub offset: u64,
    /// Size of the block payload in bytes.
    pub size: u32,
    /// Block header timestamp.
    pub timestamp: u32,
    /// Number of transactions in the block.
    pub tx_count: u32,
}

/// Where a transaction lives: its block and position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxLocation {
    pub block_hash: BlockHash,
    pub index_in_block: u32,
    pub file_index: u32,
}

/// Immutable hash → location maps for blocks and transactions.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LocationIndex {
    blocks: HashMap<BlockHash, BlockLocation>,
    txs: HashMap<Txid, TxLocation>,
}

impl LocationIndex {
    /// Scans `files` in order and records every block and transaction.
    ///
    /// Fails with [`Error::MalformedFile`] on the first file that cannot be decoded.
    pub fn build(files: &[BlockFile], magic: [u8; 4]) -> Result<Self> {
        let mut builder = LocationIndexBuilder::default();
        for file in files {
            for block in scan_file(file, magic)? {
                builder.insert_block(&block);
            }
        }
        Ok(builder.finish())
    }

    pub fn block_location(&self, hash: &BlockHash) -> Result<BlockLocation> {
        self.blocks
            .get(hash)
            .copied()
            .ok_or(Error::BlockNotFound(*hash))
    }

    pub fn tx_location(&self, txid: &Txid) -> Result<TxLocation> {
        self.txs.get(txid).copied().ok_or(Error::TxNotFound(*txid))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }
}

/// Incremental construction of a [`LocationIndex`].
///
/// Blocks must be inserted in global file order: on duplicate hashes the first
/// occurrence wins.
#[derive(Debug, Default)]
pub struct LocationIndexBuilder {
    blocks: HashMap<BlockHash, BlockLocation>,
    txs: HashMap<Txid, TxLocation>,
}

impl LocationIndexBuilder {
    /// Records a scanned block and its transactions.
    ///
    /// Returns `false` if a block with the same hash was already recorded, in
    /// which case nothing is inserted.
    pub fn insert_block(&mut self, block: &ScannedBlock) -> bool {
        match self.blocks.entry(block.hash) {
            Entry::Occupied(entry) => {
                tracing::warn!(
                    block_hash = %block.hash,
                    first_file = entry.get().file_index,
                    duplicate_file = block.location.file_index,
                    "Duplicate block in block files, keeping the first copy"
                );
                return false;
            }
            Entry::Vacant(entry) => {
                entry.insert(block.location);
            }
        }

        for (index_in_block, tx) in block.txs.iter().enumerate() {
            let location = TxLocation {
                block_hash: block.hash,
                index_in_block: index_in_block as u32,
                file_index: block.location.file_index,
            };
            match self.txs.entry(tx.txid) {
                Entry::Vacant(entry) => {
                    entry.insert(location);
                }
                Entry::Occupied(entry) => {
                    tracing::warn!(
                        txid = %tx.txid,
                        first_block = %entry.get().block_hash,
                        duplicate_block = %block.hash,
                        "Duplicate txid, keeping the first occurrence"
                    );
                }
            }
        }

        true
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }

    pub fn finish(self) -> LocationIndex {
        LocationIndex {
            blocks: self.blocks,
            txs: self.txs,
        }
    }
}
