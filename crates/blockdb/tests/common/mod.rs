//! Fixtures writing bitcoind style block files into a temporary directory.

#![allow(dead_code)]

use bitcoin::block::{Header, Version};
use bitcoin::consensus::serialize;
use bitcoin::hashes::Hash;
use bitcoin::{
    Amount, Block, BlockHash, CompactTarget, Network, OutPoint, ScriptBuf, Sequence, Transaction,
    TxIn, TxMerkleNode, TxOut, Txid, Witness, absolute, transaction,
};
use blockdb::{BlockDb, IndexConfig};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Mainnet blocks 0 to 3.
pub const MAINNET_BLOCKS: [&str; 4] = [
    "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000",
    "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc6649ffff001d01e362990101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d0104ffffffff0100f2052a0100000043410496b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52da7589379515d4e0a604f8141781e62294721166bf621e73a82cbf2342c858eeac00000000",
    "010000004860eb18bf1b1620e37e9490fc8a427514416fd75159ab86688e9a8300000000d5fdcc541e25de1c7a5addedf24858b8bb665c9f36ef744ee42c316022c90f9bb0bc6649ffff001d08d2bd610101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d010bffffffff0100f2052a010000004341047211a824f55b505228e4c3d5194c1fcfaa15a456abdf37f9b9d97a4040afc073dee6c89064984f03385237d92167c13e236446b417ab79a0fcae412ae3316b77ac00000000",
    "01000000bddd99ccfda39da1b108ce1a5d70038d0a967bacb68b6b63065f626a0000000044f672226090d85db9a9f2fbfe5f0f9609b387af7be5b7fbb7a1767c831c9e995dbe6649ffff001d05e0ed6d0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0704ffff001d010effffffff0100f2052a0100000043410494b9d3e76c5b1629ecf97fff95d7a4bbdac87cc26099ada28066c6ff1eb9191223cd897194a08d0c2726c5747f1db49e8cf90e75dc3e3550ae9b30086f3cd5aaac00000000",
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn mainnet_blocks() -> Vec<Block> {
    MAINNET_BLOCKS
        .iter()
        .map(|raw| bitcoin::consensus::deserialize(&hex::decode(raw).unwrap()).unwrap())
        .collect()
}

/// Framed record: magic, little-endian size, payload.
pub fn record(magic: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = magic.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Writes `blocks` as `blk{index:05}.dat`, followed by a zero filled tail.
pub fn write_block_file(dir: &Path, index: u32, magic: [u8; 4], blocks: &[Block]) {
    let mut bytes = Vec::new();
    for block in blocks {
        bytes.extend(record(magic, &serialize(block)));
    }
    bytes.extend([0u8; 128]);
    write_raw_file(dir, index, &bytes);
}

pub fn write_raw_file(dir: &Path, index: u32, bytes: &[u8]) {
    let path = dir.join(format!("blk{index:05}.dat"));
    File::create(path).unwrap().write_all(bytes).unwrap();
}

pub fn regtest_config(dir: &Path) -> IndexConfig {
    IndexConfig::new(dir, Network::Regtest)
}

/// Writes one block file per entry of `files` and opens the database.
pub fn open_db(files: &[Vec<Block>]) -> (TempDir, BlockDb) {
    open_db_with(files, |_| {})
}

pub fn open_db_with(
    files: &[Vec<Block>],
    configure: impl FnOnce(&mut IndexConfig),
) -> (TempDir, BlockDb) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut config = regtest_config(dir.path());
    configure(&mut config);
    for (index, blocks) in files.iter().enumerate() {
        write_block_file(dir.path(), index as u32, config.magic(), blocks);
    }
    let db = BlockDb::open(config).unwrap();
    (dir, db)
}

pub fn p2pkh_script(tag: u8) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&bitcoin::PubkeyHash::from_byte_array([tag; 20]))
}

pub fn output(value: u64, script_pubkey: ScriptBuf) -> TxOut {
    TxOut {
        value: Amount::from_sat(value),
        script_pubkey,
    }
}

pub fn input(previous_output: OutPoint, script_sig: ScriptBuf) -> TxIn {
    TxIn {
        previous_output,
        script_sig,
        sequence: Sequence::MAX,
        witness: Witness::new(),
    }
}

pub fn transaction(input: Vec<TxIn>, output: Vec<TxOut>) -> Transaction {
    Transaction {
        version: transaction::Version::ONE,
        lock_time: absolute::LockTime::ZERO,
        input,
        output,
    }
}

/// A coinbase paying `value` to a P2PKH script. `height` keeps coinbases unique.
pub fn coinbase(height: u32, value: u64) -> Transaction {
    let script_sig = bitcoin::script::Builder::new()
        .push_int(height as i64)
        .into_script();
    transaction(
        vec![input(OutPoint::null(), script_sig)],
        vec![output(value, p2pkh_script(height as u8))],
    )
}

/// Spends every outpoint of `inputs` into outputs of the given values.
pub fn spend(inputs: &[OutPoint], values: &[u64]) -> Transaction {
    transaction(
        inputs
            .iter()
            .map(|outpoint| input(*outpoint, ScriptBuf::from_bytes(vec![0x01, 0x2a])))
            .collect(),
        values
            .iter()
            .enumerate()
            .map(|(index, value)| output(*value, p2pkh_script(0x80 + index as u8)))
            .collect(),
    )
}

/// Builds a linked sequence of blocks.
pub struct ChainBuilder {
    prev_blockhash: Option<BlockHash>,
    time: u32,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            prev_blockhash: None,
            time: 1_296_688_602,
        }
    }

    pub fn block(&mut self, txdata: Vec<Transaction>) -> Block {
        self.time += 600;
        let mut block = Block {
            header: Header {
                version: Version::ONE,
                prev_blockhash: self.prev_blockhash.unwrap_or_else(BlockHash::all_zeros),
                merkle_root: TxMerkleNode::all_zeros(),
                time: self.time,
                bits: CompactTarget::from_consensus(0x1d00ffff),
                nonce: 0,
            },
            txdata,
        };
        block.header.merkle_root = block.compute_merkle_root().unwrap();
        self.prev_blockhash = Some(block.block_hash());
        block
    }
}

pub fn outpoint(tx: &Transaction, vout: u32) -> OutPoint {
    OutPoint::new(tx.compute_txid(), vout)
}

pub fn unknown_txid() -> Txid {
    Txid::from_byte_array([0xab; 32])
}
