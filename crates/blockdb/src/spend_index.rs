//! Spent output index.
//!
//! This maps an output outpoint (txid + vout) to the input spending it.

use crate::{Error, Result};
use bitcoin::{OutPoint, Transaction, Txid};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Identifies one output: (transaction hash, output index).
pub type SpentOutputKey = OutPoint;

/// The input that consumes an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpentOutputRecord {
    /// Spending transaction.
    pub txid: Txid,
    /// Index of the consuming input within the spending transaction.
    pub input_index: u32,
}

impl fmt::Display for SpentOutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.input_index)
    }
}

/// Immutable map from spent outputs to their spenders.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SpendIndex {
    spends: HashMap<SpentOutputKey, SpentOutputRecord>,
}

impl SpendIndex {
    /// Builds the index over `transactions`, in the given order.
    pub fn build<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
        coinbase_sentinel: Txid,
    ) -> Result<Self> {
        let mut builder = SpendIndexBuilder::new(coinbase_sentinel);
        for tx in transactions {
            builder.record_transaction(
                tx.compute_txid(),
                tx.input.iter().map(|input| input.previous_output),
            )?;
        }
        Ok(builder.finish())
    }

    /// Returns the input spending `key`.
    pub fn lookup(&self, key: &SpentOutputKey) -> Result<SpentOutputRecord> {
        self.spends
            .get(key)
            .copied()
            .ok_or(Error::SpendRecordNotFound(*key))
    }

    pub fn len(&self) -> usize {
        self.spends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spends.is_empty()
    }
}

/// Incremental construction of a [`SpendIndex`].
///
/// Inputs must be fed in global file order.
#[derive(Debug)]
pub struct SpendIndexBuilder {
    coinbase_sentinel: Txid,
    spends: HashMap<SpentOutputKey, SpentOutputRecord>,
}

impl SpendIndexBuilder {
    pub fn new(coinbase_sentinel: Txid) -> Self {
        Self {
            coinbase_sentinel,
            spends: HashMap::new(),
        }
    }

    /// Records every input of the transaction `txid`.
    pub fn record_transaction(
        &mut self,
        txid: Txid,
        previous_outputs: impl IntoIterator<Item = OutPoint>,
    ) -> Result<()> {
        for (input_index, previous_output) in previous_outputs.into_iter().enumerate() {
            self.record_input(
                previous_output,
                SpentOutputRecord {
                    txid,
                    input_index: input_index as u32,
                },
            )?;
        }
        Ok(())
    }

    /// Records that `spender` consumes `previous_output`.
    ///
    /// Coinbase inputs are ignored. Recording the same spender again is a
    /// no-op, a different spender is a [`Error::DuplicateSpend`].
    pub fn record_input(
        &mut self,
        previous_output: OutPoint,
        spender: SpentOutputRecord,
    ) -> Result<()> {
        if previous_output.txid == self.coinbase_sentinel {
            return Ok(());
        }

        match self.spends.entry(previous_output) {
            Entry::Vacant(entry) => {
                entry.insert(spender);
                Ok(())
            }
            Entry::Occupied(entry) if *entry.get() == spender => Ok(()),
            Entry::Occupied(entry) => Err(Error::DuplicateSpend {
                outpoint: previous_output,
                first: *entry.get(),
                second: spender,
            }),
        }
    }

    pub fn finish(self) -> SpendIndex {
        SpendIndex {
            spends: self.spends,
        }
    }
}
