//! Random-access index over bitcoind block files.
//!
//! [`BlockDb::open`] scans a directory of `blkNNNNN.dat` files once and builds:
//! - a location index from block hash and txid to the position in the file set
//! - a spend index from every spent output to the input consuming it
//!
//! Lookups then decode only the block they need. [`TxView`] answers fee,
//! spender and embedded payload questions for a single transaction.

mod address;
mod amount;
mod blk_file;
mod block_store;
mod block_view;
mod config;
mod db;
mod error;
mod location_index;
mod scan;
mod spend_index;
mod tx_view;

pub use address::{AddressResolver, StandardAddressResolver};
pub use amount::{SATOSHIS_PER_BITCOIN, Satoshis};
pub use blk_file::{
    BlockFile, BlockFileReader, RECORD_HEADER_SIZE, RawBlockRecord, discover_block_files,
};
pub use block_store::BlockStore;
pub use block_view::BlockView;
pub use config::{DEFAULT_SCAN_BATCH_SIZE, IndexConfig};
pub use db::BlockDb;
pub use error::Error;
pub use location_index::{BlockLocation, LocationIndex, LocationIndexBuilder, TxLocation};
pub use scan::{ScannedBlock, ScannedTx, build_indexes, scan_file};
pub use spend_index::{SpendIndex, SpendIndexBuilder, SpentOutputKey, SpentOutputRecord};
pub use tx_view::{FeeState, TxView};

pub use blockdb_payload::PayloadError;

/// Block database result type.
pub type Result<T> = std::result::Result<T, Error>;
