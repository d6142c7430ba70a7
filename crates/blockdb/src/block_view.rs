use crate::db::BlockDb;
use crate::location_index::{BlockLocation, TxLocation};
use crate::tx_view::TxView;
use bitcoin::{Block, BlockHash, Txid};
use std::fmt;

/// A decoded block together with its location.
pub struct BlockView<'a> {
    db: &'a BlockDb,
    hash: BlockHash,
    location: BlockLocation,
    block: Block,
}

impl fmt::Debug for BlockView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockView")
            .field("hash", &self.hash)
            .field("location", &self.location)
            .finish()
    }
}

impl<'a> BlockView<'a> {
    pub(crate) fn new(db: &'a BlockDb, location: BlockLocation, block: Block) -> Self {
        Self {
            db,
            hash: block.block_hash(),
            location,
            block,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    pub fn location(&self) -> &BlockLocation {
        &self.location
    }

    pub fn timestamp(&self) -> u32 {
        self.block.header.time
    }

    pub fn file_index(&self) -> u32 {
        self.location.file_index
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Transaction hashes in block order.
    pub fn tx_hashes(&self) -> Vec<Txid> {
        self.block.txdata.iter().map(|tx| tx.compute_txid()).collect()
    }

    /// Returns a view of the transaction at position `index`.
    pub fn tx(&self, index: usize) -> Option<TxView<'a>> {
        let tx = self.block.txdata.get(index)?;
        Some(TxView::new(self.db, self.tx_location(index), tx.clone()))
    }

    /// Views of all transactions in block order.
    pub fn txs(&self) -> impl Iterator<Item = TxView<'a>> + '_ {
        self.block
            .txdata
            .iter()
            .enumerate()
            .map(|(index, tx)| TxView::new(self.db, self.tx_location(index), tx.clone()))
    }

    fn tx_location(&self, index: usize) -> TxLocation {
        TxLocation {
            block_hash: self.hash,
            index_in_block: index as u32,
            file_index: self.location.file_index,
        }
    }
}
