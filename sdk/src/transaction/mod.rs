//! # Transaction Framework
//!
//! Everything between "the caller set some fields" and "signed bytes a node
//! will accept": canonical body assembly, freeze semantics, multi-node
//! fan-out, in-place signature collection, chunking, and the serialization
//! round-trip.
//!
//! The framework is one generic [`Transaction<D>`]; each variant is a plain
//! data struct implementing [`TransactionData`] plus a type alias and its
//! fluent setters. Variants never touch wire envelopes or the execution
//! engine themselves.

pub mod account;
pub mod base;
pub mod batch;
pub mod contract;
pub mod ethereum;
pub mod file;
pub mod freeze;
pub mod receipt;
pub mod record;
pub mod response;
pub mod schedule;
pub mod token;
pub mod topic;
pub mod transfer;
pub mod wrapped;

use std::time::Duration;

use crate::error::{CodecError, Result};
use crate::hbar::Hbar;
use crate::ids::{AccountId, LedgerId, TransactionId};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

pub use account::{
    AccountAllowanceDeleteTransaction, AccountCreateTransaction, AccountDeleteTransaction,
};
pub use base::{SignaturePair, Transaction};
pub use batch::BatchTransaction;
pub use contract::ContractExecuteTransaction;
pub use ethereum::EthereumTransaction;
pub use file::{FileAppendTransaction, FileCreateTransaction};
pub use freeze::{FreezeTransaction, FreezeType};
pub use receipt::{ExchangeRate, TransactionReceipt};
pub use record::{TransactionRecord, Transfer};
pub use response::TransactionResponse;
pub use schedule::ScheduleCreateTransaction;
pub use token::{TokenFreezeTransaction, TokenUnfreezeTransaction};
pub use topic::{TopicCreateTransaction, TopicMessageSubmitTransaction};
pub use transfer::TransferTransaction;
pub use wrapped::{AnyTransaction, AnyTransactionData, SchedulableTransactionBody};

// ---------------------------------------------------------------------------
// Variant tags
// ---------------------------------------------------------------------------

/// On-wire variant tags, shared by the typed decoders and the tagged union.
pub(crate) mod tag {
    pub const TRANSFER: u8 = 1;
    pub const ACCOUNT_CREATE: u8 = 2;
    pub const ACCOUNT_DELETE: u8 = 3;
    pub const ACCOUNT_ALLOWANCE_DELETE: u8 = 4;
    pub const FILE_CREATE: u8 = 5;
    pub const FILE_APPEND: u8 = 6;
    pub const TOPIC_CREATE: u8 = 7;
    pub const TOPIC_MESSAGE_SUBMIT: u8 = 8;
    pub const TOKEN_FREEZE: u8 = 9;
    pub const TOKEN_UNFREEZE: u8 = 10;
    pub const CONTRACT_EXECUTE: u8 = 11;
    pub const ETHEREUM: u8 = 12;
    pub const FREEZE: u8 = 13;
    pub const SCHEDULE_CREATE: u8 = 14;
    pub const BATCH: u8 = 15;
}

// ---------------------------------------------------------------------------
// The variant capability
// ---------------------------------------------------------------------------

/// What a transaction variant must provide for the framework to carry it.
///
/// The framework owns ids, fees, node fan-out, signatures, and chunk math;
/// a variant only names its service, encodes/decodes its own fields, and
/// validates them.
pub trait TransactionData: Clone + Send + Sync + 'static {
    /// The ledger service this variant routes to.
    fn service(&self) -> Service;

    /// The on-wire variant tag (one of [`tag`]).
    fn variant_tag(&self) -> u8;

    /// Appends the variant's fields to a body being built.
    fn encode_fields(&self, w: &mut WireWriter);

    /// Decodes the fields of a body whose tag was already read.
    ///
    /// A concrete variant rejects any tag but its own; the tagged union
    /// dispatches on it.
    fn decode_for_tag(tag: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError>;

    /// Pre-freeze validation of the variant's own fields.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Validates every entity-id checksum in the variant against a ledger.
    fn validate_checksums(&self, _ledger_id: &LedgerId) -> Result<()> {
        Ok(())
    }

    // --- chunking hooks, overridden only by chunked variants ---

    /// `Some(payload length)` when this variant splits into chunks.
    fn chunk_payload_len(&self) -> Option<usize> {
        None
    }

    /// A copy of this data carrying only one chunk's slice of the payload,
    /// stamped with `info`.
    fn for_chunk(&self, _info: ChunkInfo, _chunk_size: usize) -> Self {
        self.clone()
    }

    /// Reassembles full data from per-chunk decodes: folds `tail` payloads
    /// into `self` and drops per-chunk framing.
    fn finish_from_chunks(&mut self, _tail: Vec<Self>) {}
}

/// Marker for variants whose payload splits into multiple transactions.
/// Gates the chunk-size setters and `execute_all`.
pub trait ChunkedTransactionData: TransactionData {}

// ---------------------------------------------------------------------------
// Shared body types
// ---------------------------------------------------------------------------

/// Position of one chunk inside a chunked submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    /// The first chunk's transaction id; chains the pieces together.
    pub initial_transaction_id: TransactionId,
    /// 1-based chunk number.
    pub number: u32,
    /// Total chunk count.
    pub total: u32,
}

impl WireEncode for ChunkInfo {
    fn encode(&self, w: &mut WireWriter) {
        self.initial_transaction_id.encode(w);
        w.put_u32(self.number);
        w.put_u32(self.total);
    }
}

impl WireDecode for ChunkInfo {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        let initial_transaction_id = TransactionId::decode(r)?;
        let number = r.read_u32("chunk number")?;
        let total = r.read_u32("chunk total")?;
        if number == 0 || number > total {
            return Err(CodecError::MalformedField("chunk number"));
        }
        Ok(ChunkInfo { initial_transaction_id, number, total })
    }
}

/// A cap on the custom fees one payer will accept for this transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomFeeLimit {
    /// The account whose custom-fee exposure is being limited.
    pub payer: AccountId,
    /// The most that account will pay.
    pub max: Hbar,
}

impl WireEncode for CustomFeeLimit {
    fn encode(&self, w: &mut WireWriter) {
        self.payer.encode(w);
        w.put_i64(self.max.to_tinybars());
    }
}

impl WireDecode for CustomFeeLimit {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        let payer = AccountId::decode(r)?;
        let max = Hbar::from_tinybars(r.read_i64("custom fee limit")?);
        Ok(CustomFeeLimit { payer, max })
    }
}

/// Number of chunks `payload_len` splits into at `chunk_size`. An empty
/// payload is still one (empty) chunk.
pub(crate) fn chunk_count(payload_len: usize, chunk_size: usize) -> usize {
    if payload_len == 0 {
        1
    } else {
        payload_len.div_ceil(chunk_size)
    }
}

/// Default transaction valid duration, re-exported for the variants that
/// want to advertise it.
pub(crate) const fn default_valid_duration() -> Duration {
    crate::config::DEFAULT_TRANSACTION_VALID_DURATION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_boundaries() {
        assert_eq!(chunk_count(0, 4096), 1);
        assert_eq!(chunk_count(1, 4096), 1);
        assert_eq!(chunk_count(4096, 4096), 1);
        assert_eq!(chunk_count(4097, 4096), 2);
        assert_eq!(chunk_count(12 * 1024, 4096), 3);
    }

    #[test]
    fn chunk_info_rejects_out_of_range_number() {
        let id = TransactionId::generate(AccountId::new(7));
        let mut w = WireWriter::new();
        id.encode(&mut w);
        w.put_u32(4);
        w.put_u32(3);
        let bytes = w.finish();
        let mut r = WireReader::new(&bytes);
        assert!(ChunkInfo::decode(&mut r).is_err());
    }
}
