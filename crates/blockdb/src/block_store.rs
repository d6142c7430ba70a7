use crate::blk_file::{decode_block, read_record_payload};
use crate::config::IndexConfig;
use crate::location_index::BlockLocation;
use crate::{Error, Result};
use bitcoin::{Block, Transaction};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reads indexed blocks back from the block files.
#[derive(Debug)]
pub struct BlockStore {
    config: IndexConfig,
    reads: AtomicU64,
}

impl BlockStore {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            reads: AtomicU64::new(0),
        }
    }

    /// Path of the block file with the given index.
    pub fn file_path(&self, file_index: u32) -> PathBuf {
        self.config.block_file_path(file_index)
    }

    /// Reads and decodes the block payload at `location`.
    pub fn read_block(&self, location: &BlockLocation) -> Result<Block> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let path = self.file_path(location.file_index);
        let data = read_record_payload(&path, location.offset, location.size)?;
        decode_block(&path, location.offset, &data)
    }

    /// Reads the transaction at position `index` of the block at `location`.
    pub fn read_transaction(&self, location: &BlockLocation, index: usize) -> Result<Transaction> {
        let mut block = self.read_block(location)?;
        if index >= block.txdata.len() {
            return Err(Error::MalformedFile {
                path: self.file_path(location.file_index),
                offset: location.offset,
                reason: format!(
                    "block has {} transactions, index {index} was recorded",
                    block.txdata.len()
                ),
            });
        }
        Ok(block.txdata.swap_remove(index))
    }

    /// Number of block reads performed so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}
