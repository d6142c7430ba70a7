//! Index configuration.

use crate::{Error, Result};
use bitcoin::hashes::Hash;
use bitcoin::{Network, Txid};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of block files decoded concurrently in a parallel scan.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 16;

/// Configuration of the block index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IndexConfig {
    /// Directory holding the block files, e.g. `~/.bitcoin/blocks`.
    pub blocks_dir: PathBuf,
    /// File name prefix of the block files, `blk` for bitcoind.
    pub file_prefix: String,
    /// Network the block files belong to. Determines the record magic and the
    /// address encoding.
    pub network: Network,
    /// Previous-output txid that marks an input as coinbase.
    pub coinbase_sentinel: Txid,
    /// Decode block files in parallel batches during the index scan.
    ///
    /// Results are still merged in file order.
    pub parallel_scan: bool,
    /// Number of files per parallel batch.
    pub scan_batch_size: usize,
    /// Stop the scan after this many files.
    pub max_files: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            blocks_dir: PathBuf::from("blocks"),
            file_prefix: "blk".to_string(),
            network: Network::Bitcoin,
            coinbase_sentinel: Txid::all_zeros(),
            parallel_scan: false,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            max_files: None,
        }
    }
}

impl IndexConfig {
    /// Constructs a new instance of [`IndexConfig`] with default options.
    pub fn new(blocks_dir: impl Into<PathBuf>, network: Network) -> Self {
        Self {
            blocks_dir: blocks_dir.into(),
            network,
            ..Default::default()
        }
    }

    /// Loads the config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects option combinations the scan cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.file_prefix.is_empty() {
            return Err(Error::Config("file-prefix must not be empty".to_string()));
        }
        if self.scan_batch_size == 0 {
            return Err(Error::Config(
                "scan-batch-size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Magic bytes that open every block record of this network.
    pub fn magic(&self) -> [u8; 4] {
        self.network.magic().to_bytes()
    }

    /// File name of the block file with the given index, e.g. `blk00042.dat`.
    pub fn block_file_name(&self, file_index: u32) -> String {
        format!("{}{file_index:05}.dat", self.file_prefix)
    }

    /// Full path of the block file with the given index.
    pub fn block_file_path(&self, file_index: u32) -> PathBuf {
        self.blocks_dir.join(self.block_file_name(file_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::new("/data/blocks", Network::Bitcoin);
        assert_eq!(config.coinbase_sentinel, Txid::all_zeros());
        assert_eq!(config.magic(), [0xf9, 0xbe, 0xb4, 0xd9]);
        assert_eq!(config.block_file_name(42), "blk00042.dat");
        assert_eq!(
            config.block_file_path(0),
            PathBuf::from("/data/blocks/blk00000.dat")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "blocks-dir": "/srv/blocks", "network": "regtest", "parallel-scan": true }"#,
        )
        .unwrap();

        let config = IndexConfig::from_json_file(&path).unwrap();
        assert_eq!(config.blocks_dir, PathBuf::from("/srv/blocks"));
        assert_eq!(config.network, Network::Regtest);
        assert!(config.parallel_scan);
        assert_eq!(config.scan_batch_size, DEFAULT_SCAN_BATCH_SIZE);
        assert_eq!(config.file_prefix, "blk");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "scan-batch-size": 0 }"#).unwrap();

        assert!(matches!(
            IndexConfig::from_json_file(&path),
            Err(Error::Config(_))
        ));
    }
}
