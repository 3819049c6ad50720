//! Atomic batches: several independently signed transactions that the
//! ledger commits all-or-nothing.
//!
//! Inner transactions are frozen, batch-keyed, signed, and serialized
//! before they enter the batch; the batch itself is then a perfectly
//! ordinary transaction over those opaque bytes.

use crate::error::{CodecError, Error, Result};
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireReader, WireWriter};

/// Commits a list of inner transactions atomically.
pub type BatchTransaction = Transaction<BatchTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTransactionData {
    /// Serialized inner transactions, in commit order.
    inner: Vec<Vec<u8>>,
}

impl TransactionData for BatchTransactionData {
    fn service(&self) -> Service {
        Service::Util
    }

    fn variant_tag(&self) -> u8 {
        tag::BATCH
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_seq(&self.inner, |w, bytes| w.put_bytes(bytes));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::BATCH {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let inner = r.read_seq("inner transactions", |r| r.read_bytes("inner transaction"))?;
        Ok(BatchTransactionData { inner })
    }

    fn validate(&self) -> Result<()> {
        if self.inner.is_empty() {
            return Err(Error::argument("batch requires at least one inner transaction"));
        }
        Ok(())
    }
}

impl BatchTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// Appends a frozen, batch-keyed inner transaction.
    pub fn add_inner_transaction<D: TransactionData>(
        &mut self,
        transaction: &Transaction<D>,
    ) -> Result<&mut Self> {
        if !transaction.is_frozen() {
            return Err(Error::not_ready("inner transaction must be frozen before batching"));
        }
        if transaction.batch_key().is_none() {
            return Err(Error::not_ready(
                "inner transaction must carry a batch key to be batchable",
            ));
        }
        let bytes = transaction.to_bytes()?;
        self.data_mut()?.inner.push(bytes);
        Ok(self)
    }

    /// The serialized inner transactions, in commit order.
    pub fn inner_transaction_bytes(&self) -> &[Vec<u8>] {
        &self.data().inner
    }
}
