//! Receipt polling. Free, and deliberately patient.
//!
//! Right after submission the network genuinely does not know the
//! transaction yet, so "not found" is the *expected* first answer. This
//! query classifies those as retries — on the outer pre-check and on the
//! status inside the receipt itself — and only returns once the receipt is
//! terminal.

use crate::error::{Error, Result};
use crate::execute::{classify_receipt_poll, RetryDecision};
use crate::ids::TransactionId;
use crate::query::{tag, Query, QueryData};
use crate::transaction::TransactionReceipt;
use crate::wire::{ResponseEnvelope, Service, Status, WireDecode, WireEncode, WireWriter};

/// Polls for a transaction's receipt until it reaches a terminal status.
pub type TransactionReceiptQuery = Query<TransactionReceiptQueryData>;

#[derive(Debug, Clone, Default)]
pub struct TransactionReceiptQueryData {
    transaction_id: Option<TransactionId>,
    include_children: bool,
    include_duplicates: bool,
}

impl QueryData for TransactionReceiptQueryData {
    type Response = TransactionReceipt;

    fn service(&self) -> Service {
        Service::Network
    }

    fn variant_tag(&self) -> u8 {
        tag::TRANSACTION_RECEIPT
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.transaction_id.as_ref(), |w, id| id.encode(w));
        w.put_bool(self.include_children);
        w.put_bool(self.include_duplicates);
    }

    fn decode_response(&self, body: &[u8]) -> Result<Self::Response> {
        let mut receipt = TransactionReceipt::from_wire_bytes(body)?;
        // Stamp the queried id back in so a later status failure can name
        // the transaction it is about.
        receipt.transaction_id = self.transaction_id;
        Ok(receipt)
    }

    fn is_free(&self) -> bool {
        true
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision {
        match classify_receipt_poll(response.precheck) {
            RetryDecision::Success => {}
            other => return other,
        }
        // The outer answer is fine; the receipt inside may still say the
        // network has not reached a verdict.
        match TransactionReceipt::from_wire_bytes(&response.body) {
            Ok(receipt) => match receipt.status {
                Status::Unknown | Status::ReceiptNotFound => {
                    RetryDecision::RetrySameNode(receipt.status)
                }
                _ => RetryDecision::Success,
            },
            // Undecodable body: let map_response surface the codec error.
            Err(_) => RetryDecision::Success,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.transaction_id.is_none() {
            return Err(Error::argument("receipt query requires a transaction id"));
        }
        Ok(())
    }
}

impl TransactionReceiptQuery {
    pub fn new() -> Self {
        Query::default()
    }

    /// The transaction whose receipt to poll for.
    pub fn set_transaction_id(&mut self, id: TransactionId) -> &mut Self {
        self.data_mut().transaction_id = Some(id);
        self
    }

    /// Also return receipts of child transactions the ledger spawned.
    pub fn set_include_children(&mut self, include: bool) -> &mut Self {
        self.data_mut().include_children = include;
        self
    }

    /// Also return receipts of duplicate submissions.
    pub fn set_include_duplicates(&mut self, include: bool) -> &mut Self {
        self.data_mut().include_duplicates = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AccountId;
    use crate::wire::WireEncode;

    fn envelope_with_receipt(precheck: Status, receipt_status: Status) -> ResponseEnvelope {
        let receipt = TransactionReceipt { status: receipt_status, ..Default::default() };
        ResponseEnvelope { precheck, cost: 0, body: receipt.to_wire_bytes() }
    }

    #[test]
    fn requires_a_transaction_id() {
        assert!(TransactionReceiptQueryData::default().validate().is_err());
    }

    #[test]
    fn not_found_precheck_retries() {
        let data = TransactionReceiptQueryData::default();
        let env = ResponseEnvelope::ack(Status::ReceiptNotFound);
        assert_eq!(
            data.classify(&env),
            RetryDecision::RetrySameNode(Status::ReceiptNotFound)
        );
    }

    #[test]
    fn unknown_inner_status_retries() {
        let data = TransactionReceiptQueryData::default();
        let env = envelope_with_receipt(Status::Ok, Status::Unknown);
        assert_eq!(data.classify(&env), RetryDecision::RetrySameNode(Status::Unknown));
    }

    #[test]
    fn terminal_failure_is_an_answer_not_a_retry() {
        let data = TransactionReceiptQueryData::default();
        let env = envelope_with_receipt(Status::Ok, Status::InsufficientPayerBalance);
        assert_eq!(data.classify(&env), RetryDecision::Success);
    }

    #[test]
    fn decode_stamps_the_queried_id() {
        let id = TransactionId::generate(AccountId::new(7));
        let mut query = TransactionReceiptQuery::new();
        query.set_transaction_id(id);

        let receipt = TransactionReceipt { status: Status::Success, ..Default::default() };
        let decoded = query.data().decode_response(&receipt.to_wire_bytes()).unwrap();
        assert_eq!(decoded.transaction_id, Some(id));
    }
}
