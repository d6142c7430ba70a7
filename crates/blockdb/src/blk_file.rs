//! Reading bitcoind style `blkNNNNN.dat` block files.
//!
//! Each file is a sequence of records:
//! - Magic bytes: 4 bytes (network specific, `f9beb4d9` for mainnet)
//! - Block size: 4 bytes (little-endian)
//! - Block data: consensus encoded block
//!
//! bitcoind preallocates files in chunks, so the tail of the newest file is
//! usually zero filled. A record starting with a zero magic ends the file.

use crate::config::IndexConfig;
use crate::{Error, Result};
use bitcoin::Block;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Upper bound on a single record payload. Anything larger is a corrupt size field.
const MAX_RECORD_SIZE: u32 = 32 * 1024 * 1024;

/// Size of the magic + length header in front of every block.
pub const RECORD_HEADER_SIZE: u64 = 8;

/// A block file on disk, identified by its position in the file sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFile {
    pub index: u32,
    pub path: PathBuf,
}

/// Lists the block files of `config.blocks_dir` in file order.
///
/// Enumeration stops at the first missing index or at `config.max_files`.
pub fn discover_block_files(config: &IndexConfig) -> Result<Vec<BlockFile>> {
    if !config.blocks_dir.is_dir() {
        return Err(Error::Config(format!(
            "blocks directory {} does not exist",
            config.blocks_dir.display()
        )));
    }

    let limit = config.max_files.unwrap_or(usize::MAX);
    let mut files = Vec::new();
    let mut index = 0u32;
    while files.len() < limit {
        let path = config.block_file_path(index);
        if !path.is_file() {
            break;
        }
        files.push(BlockFile { index, path });
        index += 1;
    }

    Ok(files)
}

/// One framed block as found in a block file.
#[derive(Debug, Clone)]
pub struct RawBlockRecord {
    /// Offset of the block payload, just past the record header.
    pub offset: u64,
    /// Consensus encoded block.
    pub data: Vec<u8>,
}

/// Sequential reader over the records of one block file.
pub struct BlockFileReader {
    path: PathBuf,
    reader: BufReader<File>,
    magic: [u8; 4],
    position: u64,
    finished: bool,
}

impl BlockFileReader {
    pub fn open(file: &BlockFile, magic: [u8; 4]) -> Result<Self> {
        let reader = BufReader::new(File::open(&file.path)?);
        Ok(Self {
            path: file.path.clone(),
            reader,
            magic,
            position: 0,
            finished: false,
        })
    }

    /// Reads the next record, `None` once the end of the data is reached.
    pub fn next_record(&mut self) -> Result<Option<RawBlockRecord>> {
        if self.finished {
            return Ok(None);
        }

        let record_start = self.position;

        let mut magic = [0u8; 4];
        let read = self.read_up_to(&mut magic)?;
        if read == 0 || magic[..read].iter().all(|b| *b == 0) {
            self.finished = true;
            return Ok(None);
        }
        if read < magic.len() {
            return Err(self.malformed(record_start, "truncated record header"));
        }
        if magic != self.magic {
            return Err(self.malformed(
                record_start,
                format!("unexpected magic {magic:02x?}, expected {:02x?}", self.magic),
            ));
        }

        let mut size = [0u8; 4];
        if self.read_up_to(&mut size)? < size.len() {
            return Err(self.malformed(record_start, "truncated record header"));
        }
        let size = u32::from_le_bytes(size);
        if size > MAX_RECORD_SIZE {
            return Err(self.malformed(record_start, format!("record size {size} too large")));
        }

        let offset = record_start + RECORD_HEADER_SIZE;
        let mut data = vec![0u8; size as usize];
        if self.read_up_to(&mut data)? < data.len() {
            return Err(self.malformed(
                record_start,
                format!("truncated block payload, expected {size} bytes"),
            ));
        }

        Ok(Some(RawBlockRecord { offset, data }))
    }

    /// Fills as much of `buf` as the file allows, returning the number of bytes read.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    fn malformed(&mut self, offset: u64, reason: impl Into<String>) -> Error {
        self.finished = true;
        Error::MalformedFile {
            path: self.path.clone(),
            offset,
            reason: reason.into(),
        }
    }
}

impl Iterator for BlockFileReader {
    type Item = Result<RawBlockRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Reads `size` payload bytes at `offset` of the file at `path`.
pub fn read_record_payload(path: &Path, offset: u64, size: u32) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut data = vec![0u8; size as usize];
    file.read_exact(&mut data)?;
    Ok(data)
}

/// Decodes a block payload read from `path` at `offset`.
pub fn decode_block(path: &Path, offset: u64, data: &[u8]) -> Result<Block> {
    bitcoin::consensus::deserialize(data).map_err(|err| Error::MalformedFile {
        path: path.to_path_buf(),
        offset,
        reason: format!("undecodable block: {err}"),
    })
}
