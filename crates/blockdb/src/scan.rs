//! Index construction pass.
//!
//! Every block file is reduced to a list of [`ScannedBlock`] summaries, which
//! are merged into the location and spend indexes strictly in file order. The
//! decoding of a batch of files can run in parallel; merging never does.

use crate::blk_file::{BlockFile, BlockFileReader, decode_block};
use crate::config::IndexConfig;
use crate::location_index::{BlockLocation, LocationIndex, LocationIndexBuilder};
use crate::spend_index::{SpendIndex, SpendIndexBuilder};
use crate::Result;
use bitcoin::{Block, BlockHash, OutPoint, Txid};
use rayon::prelude::*;
use std::time::Instant;

/// What the index pass needs to remember about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTx {
    pub txid: Txid,
    pub previous_outputs: Vec<OutPoint>,
}

/// What the index pass needs to remember about a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedBlock {
    pub hash: BlockHash,
    pub location: BlockLocation,
    pub txs: Vec<ScannedTx>,
}

impl ScannedBlock {
    fn new(file_index: u32, offset: u64, size: u32, block: &Block) -> Self {
        let txs = block
            .txdata
            .iter()
            .map(|tx| ScannedTx {
                txid: tx.compute_txid(),
                previous_outputs: tx.input.iter().map(|input| input.previous_output).collect(),
            })
            .collect::<Vec<_>>();

        Self {
            hash: block.block_hash(),
            location: BlockLocation {
                file_index,
                offset,
                size,
                timestamp: block.header.time,
                tx_count: txs.len() as u32,
            },
            txs,
        }
    }
}

/// Decodes every block of `file` into a summary, in file order.
pub fn scan_file(file: &BlockFile, magic: [u8; 4]) -> Result<Vec<ScannedBlock>> {
    let mut blocks = Vec::new();
    for record in BlockFileReader::open(file, magic)? {
        let record = record?;
        let block = decode_block(&file.path, record.offset, &record.data)?;
        blocks.push(ScannedBlock::new(
            file.index,
            record.offset,
            record.data.len() as u32,
            &block,
        ));
    }

    tracing::debug!(
        file = %file.path.display(),
        blocks = blocks.len(),
        "Scanned block file"
    );

    Ok(blocks)
}

/// Builds both indexes over `files` in a single pass.
pub fn build_indexes(
    config: &IndexConfig,
    files: &[BlockFile],
) -> Result<(LocationIndex, SpendIndex)> {
    let mut scan = IndexScan::new(config.coinbase_sentinel, files.len());
    let magic = config.magic();

    tracing::info!(
        files = files.len(),
        parallel = config.parallel_scan,
        batch_size = config.scan_batch_size,
        "Starting block file scan"
    );

    if config.parallel_scan {
        for batch in files.chunks(config.scan_batch_size.max(1)) {
            let scanned = batch
                .par_iter()
                .map(|file| scan_file(file, magic))
                .collect::<Vec<_>>();
            // Failures are merged in file order too.
            for blocks in scanned {
                scan.merge_file(blocks?)?;
            }
        }
    } else {
        for file in files {
            scan.merge_file(scan_file(file, magic)?)?;
        }
    }

    Ok(scan.finish())
}

struct IndexScan {
    locations: LocationIndexBuilder,
    spends: SpendIndexBuilder,
    total_files: usize,
    processed_files: usize,
    start_time: Instant,
}

impl IndexScan {
    fn new(coinbase_sentinel: Txid, total_files: usize) -> Self {
        Self {
            locations: LocationIndexBuilder::default(),
            spends: SpendIndexBuilder::new(coinbase_sentinel),
            total_files,
            processed_files: 0,
            start_time: Instant::now(),
        }
    }

    fn merge_file(&mut self, blocks: Vec<ScannedBlock>) -> Result<()> {
        for block in &blocks {
            // A stale copy of an indexed block carries no new spends.
            if !self.locations.insert_block(block) {
                continue;
            }
            for tx in &block.txs {
                self.spends
                    .record_transaction(tx.txid, tx.previous_outputs.iter().copied())?;
            }
        }

        self.processed_files += 1;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        tracing::info!(
            processed = self.processed_files,
            total = self.total_files,
            blocks = self.locations.block_count(),
            txs = self.locations.tx_count(),
            elapsed_secs = format!("{elapsed:.1}"),
            "Indexing progress"
        );

        Ok(())
    }

    fn finish(self) -> (LocationIndex, SpendIndex) {
        let locations = self.locations.finish();
        let spends = self.spends.finish();

        tracing::info!(
            files = self.total_files,
            blocks = locations.block_count(),
            txs = locations.tx_count(),
            spent_outputs = spends.len(),
            duration_secs = self.start_time.elapsed().as_secs(),
            "Block file scan complete"
        );

        (locations, spends)
    }
}
