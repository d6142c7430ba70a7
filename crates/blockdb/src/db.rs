use crate::address::{AddressResolver, StandardAddressResolver};
use crate::blk_file::discover_block_files;
use crate::block_store::BlockStore;
use crate::block_view::BlockView;
use crate::config::IndexConfig;
use crate::location_index::{LocationIndex, TxLocation};
use crate::scan::build_indexes;
use crate::spend_index::{SpendIndex, SpentOutputRecord};
use crate::tx_view::TxView;
use crate::Result;
use bitcoin::{BlockHash, OutPoint, Transaction, Txid};
use std::fmt;

/// Read-only database over a set of block files.
///
/// Owns both indexes, built once when the database is opened, and hands out
/// [`BlockView`]s and [`TxView`]s borrowing from it.
pub struct BlockDb {
    config: IndexConfig,
    locations: LocationIndex,
    spends: SpendIndex,
    store: BlockStore,
    resolver: Box<dyn AddressResolver>,
}

impl fmt::Debug for BlockDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDb")
            .field("blocks_dir", &self.config.blocks_dir)
            .field("blocks", &self.locations.block_count())
            .field("txs", &self.locations.tx_count())
            .field("spent_outputs", &self.spends.len())
            .finish()
    }
}

impl BlockDb {
    /// Scans every block file of `config.blocks_dir` and builds the indexes.
    pub fn open(config: IndexConfig) -> Result<Self> {
        config.validate()?;

        let files = discover_block_files(&config)?;
        tracing::info!(
            blocks_dir = %config.blocks_dir.display(),
            files = files.len(),
            network = %config.network,
            "Opening block database"
        );

        let (locations, spends) = build_indexes(&config, &files)?;

        Ok(Self::from_parts(config, locations, spends))
    }

    /// Assembles a database from indexes built elsewhere.
    pub fn from_parts(config: IndexConfig, locations: LocationIndex, spends: SpendIndex) -> Self {
        let resolver = Box::new(StandardAddressResolver::new(config.network));
        Self {
            store: BlockStore::new(config.clone()),
            config,
            locations,
            spends,
            resolver,
        }
    }

    /// Replaces the address resolver used by [`TxView::output_addresses`].
    pub fn with_address_resolver(mut self, resolver: impl AddressResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn block(&self, hash: &BlockHash) -> Result<BlockView<'_>> {
        let location = self.locations.block_location(hash)?;
        let block = self.store.read_block(&location)?;
        Ok(BlockView::new(self, location, block))
    }

    pub fn tx(&self, txid: &Txid) -> Result<TxView<'_>> {
        let location = self.locations.tx_location(txid)?;
        let tx = self.read_transaction(&location)?;
        Ok(TxView::new(self, location, tx))
    }

    /// Returns the decoded transaction without wrapping it in a view.
    pub fn transaction(&self, txid: &Txid) -> Result<Transaction> {
        let location = self.locations.tx_location(txid)?;
        self.read_transaction(&location)
    }

    fn read_transaction(&self, location: &TxLocation) -> Result<Transaction> {
        let block_location = self.locations.block_location(&location.block_hash)?;
        self.store
            .read_transaction(&block_location, location.index_in_block as usize)
    }

    /// Returns the input spending `outpoint`.
    pub fn spent_output(&self, outpoint: &OutPoint) -> Result<SpentOutputRecord> {
        self.spends.lookup(outpoint)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn locations(&self) -> &LocationIndex {
        &self.locations
    }

    pub fn spends(&self) -> &SpendIndex {
        &self.spends
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn address_resolver(&self) -> &dyn AddressResolver {
        self.resolver.as_ref()
    }
}
