//! The acknowledgement a node hands back at submit time.
//!
//! A response proves a node *accepted* the transaction, nothing more.
//! Consensus happens later; [`TransactionResponse::get_receipt`] is how the
//! caller finds out what consensus decided.

use crate::client::Client;
use crate::error::Result;
use crate::ids::{AccountId, TransactionId};
use crate::query::{TransactionReceiptQuery, TransactionRecordQuery};
use crate::transaction::receipt::TransactionReceipt;
use crate::transaction::record::TransactionRecord;

/// Where and as-what a transaction entered the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    /// The id the accepted copy carried.
    pub transaction_id: TransactionId,
    /// The node that accepted it.
    pub node_account_id: AccountId,
    /// SHA-384 hash of the accepted signed-transaction bytes.
    pub transaction_hash: Vec<u8>,
}

impl TransactionResponse {
    /// Polls for the receipt and fails on a non-success status.
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        let receipt = TransactionReceiptQuery::new()
            .set_transaction_id(self.transaction_id)
            .set_node_account_ids(vec![self.node_account_id])
            .execute(client)
            .await?;
        receipt.validate_status()?;
        Ok(receipt)
    }

    /// Polls for the full record, insisting on a successful receipt first.
    pub async fn get_record(&self, client: &Client) -> Result<TransactionRecord> {
        self.get_receipt(client).await?;
        TransactionRecordQuery::new()
            .set_transaction_id(self.transaction_id)
            .set_node_account_ids(vec![self.node_account_id])
            .execute(client)
            .await
    }
}
