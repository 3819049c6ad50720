//! Record polling. Free, same patience as the receipt query.

use crate::error::{Error, Result};
use crate::execute::{classify_receipt_poll, RetryDecision};
use crate::ids::TransactionId;
use crate::query::{tag, Query, QueryData};
use crate::transaction::TransactionRecord;
use crate::wire::{ResponseEnvelope, Service, WireDecode, WireEncode, WireWriter};

/// Polls for a transaction's full record.
pub type TransactionRecordQuery = Query<TransactionRecordQueryData>;

#[derive(Debug, Clone, Default)]
pub struct TransactionRecordQueryData {
    transaction_id: Option<TransactionId>,
    include_children: bool,
    include_duplicates: bool,
}

impl QueryData for TransactionRecordQueryData {
    type Response = TransactionRecord;

    fn service(&self) -> Service {
        Service::Network
    }

    fn variant_tag(&self) -> u8 {
        tag::TRANSACTION_RECORD
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.transaction_id.as_ref(), |w, id| id.encode(w));
        w.put_bool(self.include_children);
        w.put_bool(self.include_duplicates);
    }

    fn decode_response(&self, body: &[u8]) -> Result<Self::Response> {
        Ok(TransactionRecord::from_wire_bytes(body)?)
    }

    fn is_free(&self) -> bool {
        true
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision {
        classify_receipt_poll(response.precheck)
    }

    fn validate(&self) -> Result<()> {
        if self.transaction_id.is_none() {
            return Err(Error::argument("record query requires a transaction id"));
        }
        Ok(())
    }
}

impl TransactionRecordQuery {
    pub fn new() -> Self {
        Query::default()
    }

    /// The transaction whose record to poll for.
    pub fn set_transaction_id(&mut self, id: TransactionId) -> &mut Self {
        self.data_mut().transaction_id = Some(id);
        self
    }

    /// Also return records of child transactions the ledger spawned.
    pub fn set_include_children(&mut self, include: bool) -> &mut Self {
        self.data_mut().include_children = include;
        self
    }

    /// Also return records of duplicate submissions.
    pub fn set_include_duplicates(&mut self, include: bool) -> &mut Self {
        self.data_mut().include_duplicates = include;
        self
    }
}
