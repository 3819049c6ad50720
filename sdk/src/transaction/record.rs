//! The durable account of what a transaction did.
//!
//! Where the receipt says *whether* it worked, the record says *what
//! happened*: the fee actually charged, the consensus timestamp, and every
//! balance the transaction touched.

use crate::error::CodecError;
use crate::hbar::Hbar;
use crate::ids::{AccountId, Timestamp, TransactionId};
use crate::transaction::receipt::TransactionReceipt;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

/// One balance change in a record's transfer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// The account whose balance moved.
    pub account_id: AccountId,
    /// Signed amount; negative is a debit.
    pub amount: Hbar,
}

impl WireEncode for Transfer {
    fn encode(&self, w: &mut WireWriter) {
        self.account_id.encode(w);
        w.put_i64(self.amount.to_tinybars());
    }
}

impl WireDecode for Transfer {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(Transfer {
            account_id: AccountId::decode(r)?,
            amount: Hbar::from_tinybars(r.read_i64("transfer amount")?),
        })
    }
}

/// Full post-consensus record of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// The receipt embedded in the record.
    pub receipt: TransactionReceipt,
    /// SHA-384 hash of the submitted signed transaction.
    pub transaction_hash: Vec<u8>,
    /// When consensus placed the transaction.
    pub consensus_timestamp: Timestamp,
    /// The recorded transaction's id.
    pub transaction_id: TransactionId,
    /// The transaction's memo.
    pub memo: String,
    /// The fee the network actually charged.
    pub transaction_fee: Hbar,
    /// Every hbar balance change, fees included; nets to zero.
    pub transfers: Vec<Transfer>,
}

impl WireEncode for TransactionRecord {
    fn encode(&self, w: &mut WireWriter) {
        self.receipt.encode(w);
        w.put_bytes(&self.transaction_hash);
        self.consensus_timestamp.encode(w);
        self.transaction_id.encode(w);
        w.put_str(&self.memo);
        w.put_i64(self.transaction_fee.to_tinybars());
        w.put_seq(&self.transfers, |w, t| t.encode(w));
    }
}

impl WireDecode for TransactionRecord {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        let mut receipt = TransactionReceipt::decode(r)?;
        let transaction_hash = r.read_bytes("transaction hash")?;
        let consensus_timestamp = Timestamp::decode(r)?;
        let transaction_id = TransactionId::decode(r)?;
        let memo = r.read_str("record memo")?;
        let transaction_fee = Hbar::from_tinybars(r.read_i64("charged fee")?);
        let transfers = r.read_seq("transfer list", Transfer::decode)?;
        receipt.transaction_id = Some(transaction_id);
        Ok(TransactionRecord {
            receipt,
            transaction_hash,
            consensus_timestamp,
            transaction_id,
            memo,
            transaction_fee,
            transfers,
        })
    }
}
