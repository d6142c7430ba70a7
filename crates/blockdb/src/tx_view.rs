//! Per-transaction query surface.

use crate::amount::Satoshis;
use crate::block_view::BlockView;
use crate::db::BlockDb;
use crate::location_index::TxLocation;
use crate::{Error, Result};
use bitcoin::{Address, Amount, BlockHash, OutPoint, Transaction, TxIn, TxOut, Txid};
use blockdb_payload::{
    PayloadError, concat_across_inputs, concat_across_outputs, decode_application_encoding,
    extract_marked_payload, extract_non_push_bytes, extract_pushdata_bytes, infallible,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Memoized fee of a [`TxView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeState {
    /// `fee()` has not been called yet.
    NotComputed,
    /// The fee, cached for the lifetime of the view.
    Computed(Satoshis),
    /// The last attempt failed. The next call tries again.
    Failed,
}

/// A decoded transaction together with its location and the database it
/// came from.
pub struct TxView<'a> {
    db: &'a BlockDb,
    txid: Txid,
    location: TxLocation,
    tx: Transaction,
    fee: Mutex<FeeState>,
}

impl fmt::Debug for TxView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxView")
            .field("txid", &self.txid)
            .field("location", &self.location)
            .field("fee", &*self.fee.lock())
            .finish()
    }
}

impl<'a> TxView<'a> {
    pub(crate) fn new(db: &'a BlockDb, location: TxLocation, tx: Transaction) -> Self {
        Self {
            db,
            txid: tx.compute_txid(),
            location,
            tx,
            fee: Mutex::new(FeeState::NotComputed),
        }
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn location(&self) -> &TxLocation {
        &self.location
    }

    pub fn block_hash(&self) -> BlockHash {
        self.location.block_hash
    }

    pub fn index_in_block(&self) -> u32 {
        self.location.index_in_block
    }

    pub fn file_index(&self) -> u32 {
        self.location.file_index
    }

    /// File name of the block file holding this transaction, e.g. `blk00042.dat`.
    pub fn block_file_name(&self) -> String {
        self.db.config().block_file_name(self.location.file_index)
    }

    /// Loads the block containing this transaction.
    pub fn block(&self) -> Result<BlockView<'a>> {
        self.db.block(&self.location.block_hash)
    }

    /// Whether every input spends the coinbase sentinel.
    pub fn is_coinbase(&self) -> bool {
        let sentinel = self.db.config().coinbase_sentinel;
        !self.tx.input.is_empty()
            && self
                .tx
                .input
                .iter()
                .all(|input| input.previous_output.txid == sentinel)
    }

    pub fn input(&self, index: usize) -> Result<&TxIn> {
        self.tx.input.get(index).ok_or(Error::InputNotFound {
            txid: self.txid,
            index,
        })
    }

    pub fn output(&self, index: usize) -> Result<&TxOut> {
        self.tx.output.get(index).ok_or(Error::OutputNotFound {
            txid: self.txid,
            index,
        })
    }

    /// Current state of the fee cache.
    pub fn fee_state(&self) -> FeeState {
        *self.fee.lock()
    }

    /// Returns the sum of the spent output values minus the sum of this
    /// transaction's output values.
    ///
    /// Coinbase inputs contribute nothing, so the fee of a coinbase
    /// transaction is negative. The first successful result is cached and
    /// returned by later calls without touching the block files. Concurrent
    /// callers wait for the one computing.
    ///
    /// Fails with [`Error::FeeOverflow`] if a value or a sum leaves the `i64` range.
    pub fn fee(&self) -> Result<Satoshis> {
        let mut state = self.fee.lock();
        if let FeeState::Computed(fee) = *state {
            return Ok(fee);
        }

        match self.compute_fee() {
            Ok(fee) => {
                *state = FeeState::Computed(fee);
                Ok(fee)
            }
            Err(err) => {
                *state = FeeState::Failed;
                Err(err)
            }
        }
    }

    fn compute_fee(&self) -> Result<Satoshis> {
        let sentinel = self.db.config().coinbase_sentinel;
        let mut predecessors: HashMap<Txid, Transaction> = HashMap::new();
        let overflow = || Error::FeeOverflow(self.txid);
        let mut input_value = Satoshis::ZERO;

        for (input_index, input) in self.tx.input.iter().enumerate() {
            let previous_output = input.previous_output;
            if previous_output.txid == sentinel {
                continue;
            }

            let predecessor_not_found = || Error::PredecessorNotFound {
                txid: self.txid,
                input_index,
                previous_output,
            };

            let predecessor = match predecessors.entry(previous_output.txid) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let tx = match self.db.transaction(&previous_output.txid) {
                        Ok(tx) => tx,
                        Err(Error::TxNotFound(_)) => return Err(predecessor_not_found()),
                        Err(err) => return Err(err),
                    };
                    entry.insert(tx)
                }
            };

            let spent = predecessor
                .output
                .get(previous_output.vout as usize)
                .ok_or_else(predecessor_not_found)?;
            input_value = accumulate(input_value, spent.value).ok_or_else(overflow)?;
        }

        let output_value = self
            .tx
            .output
            .iter()
            .try_fold(Satoshis::ZERO, |total, output| accumulate(total, output.value))
            .ok_or_else(overflow)?;

        input_value.checked_sub(output_value).ok_or_else(overflow)
    }

    /// Returns the transaction spending output `output_index`.
    pub fn spending_tx(&self, output_index: usize) -> Result<TxView<'a>> {
        self.output(output_index)?;
        let outpoint = OutPoint::new(self.txid, output_index as u32);
        let spender = match self.db.spent_output(&outpoint) {
            Ok(spender) => spender,
            Err(Error::SpendRecordNotFound(_)) => return Err(Error::Unspent(outpoint)),
            Err(err) => return Err(err),
        };
        self.db.tx(&spender.txid)
    }

    /// Index of the output with the highest value, the lowest index among
    /// equal values. `None` if there are no outputs.
    pub fn find_max_value_output_index(&self) -> Option<usize> {
        let mut max: Option<(usize, Amount)> = None;
        for (index, output) in self.tx.output.iter().enumerate() {
            match max {
                Some((_, value)) if output.value <= value => {}
                _ => max = Some((index, output.value)),
            }
        }
        max.map(|(index, _)| index)
    }

    /// Heuristic for data-carrying transactions: all outputs but one hold
    /// exactly one satoshi.
    pub fn has_dust_pattern(&self) -> bool {
        let dust = self
            .tx
            .output
            .iter()
            .filter(|output| output.value == Amount::ONE_SAT)
            .count();
        dust > 0 && dust == self.tx.output.len() - 1
    }

    pub fn output_addresses(&self, index: usize) -> Result<Vec<Address>> {
        let output = self.output(index)?;
        self.db.address_resolver().addresses(&output.script_pubkey)
    }

    /// Addresses of every output, in output order. Fails on the first
    /// unrecognized script.
    pub fn all_output_addresses(&self) -> Result<Vec<Vec<Address>>> {
        let resolver = self.db.address_resolver();
        self.tx
            .output
            .iter()
            .map(|output| resolver.addresses(&output.script_pubkey))
            .collect()
    }

    pub fn marked_payload_from_output(&self, index: usize) -> Result<Vec<u8>> {
        let output = self.output(index)?;
        Ok(extract_marked_payload(&output.script_pubkey)?)
    }

    pub fn concat_marked_payloads_from_outputs(&self) -> Vec<u8> {
        concat_across_outputs(&self.tx.output, extract_marked_payload)
    }

    pub fn non_push_bytes_from_input(&self, index: usize) -> Result<Vec<u8>> {
        Ok(extract_non_push_bytes(&self.input(index)?.script_sig))
    }

    pub fn non_push_bytes_from_output(&self, index: usize) -> Result<Vec<u8>> {
        Ok(extract_non_push_bytes(&self.output(index)?.script_pubkey))
    }

    pub fn concat_non_push_bytes_from_inputs(&self) -> Vec<u8> {
        concat_across_inputs(&self.tx.input, infallible(extract_non_push_bytes))
    }

    pub fn concat_non_push_bytes_from_outputs(&self) -> Vec<u8> {
        concat_across_outputs(&self.tx.output, infallible(extract_non_push_bytes))
    }

    pub fn pushdata_from_input(&self, index: usize) -> Result<Vec<u8>> {
        Ok(extract_pushdata_bytes(&self.input(index)?.script_sig))
    }

    pub fn pushdata_from_output(&self, index: usize) -> Result<Vec<u8>> {
        Ok(extract_pushdata_bytes(&self.output(index)?.script_pubkey))
    }

    pub fn concat_pushdata_from_inputs(&self) -> Vec<u8> {
        concat_across_inputs(&self.tx.input, infallible(extract_pushdata_bytes))
    }

    pub fn concat_pushdata_from_outputs(&self) -> Vec<u8> {
        concat_across_outputs(&self.tx.output, infallible(extract_pushdata_bytes))
    }

    /// Decodes a length and checksum framed payload spread over the non-push
    /// bytes of all outputs.
    pub fn application_payload_from_outputs(&self) -> Result<Vec<u8>> {
        let data = self.concat_non_push_bytes_from_outputs();
        decode_application_encoding(&data)
            .map_err(|err| Error::Payload(PayloadError::CorruptEncoding(err)))
    }

    /// Raw concatenation of every unlocking script.
    pub fn concat_unlocking_scripts(&self) -> Vec<u8> {
        self.tx
            .input
            .iter()
            .flat_map(|input| input.script_sig.as_bytes())
            .copied()
            .collect()
    }
}

fn accumulate(total: Satoshis, amount: Amount) -> Option<Satoshis> {
    total.checked_add(Satoshis::try_from(amount).ok()?)
}
