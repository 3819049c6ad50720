//! # Query Framework
//!
//! Reads follow a two-phase protocol. Phase one asks a node what the answer
//! will cost (`COST_ANSWER`); phase two pays that much — an embedded, signed
//! transfer from the operator to the answering node — and asks again
//! (`ANSWER_ONLY`). Free queries (balances, receipts, records) skip straight
//! to phase two with no payment attached.
//!
//! Both phases ride the same execution engine as transactions: same node
//! rotation, same backoff, same cancellation. The only query-specific policy
//! is classification — receipt and record polling treat "not found yet" as
//! a retry where every other query treats it as an answer.

mod account_balance;
mod account_info;
mod base;
mod file_contents;
mod network_version;
mod transaction_receipt;
mod transaction_record;

pub use account_balance::{AccountBalance, AccountBalanceQuery, AccountBalanceQueryData};
pub use account_info::{AccountInfo, AccountInfoQuery, AccountInfoQueryData};
pub use base::Query;
pub use file_contents::{FileContents, FileContentsQuery, FileContentsQueryData};
pub use network_version::{
    NetworkVersionInfo, NetworkVersionInfoQuery, NetworkVersionInfoQueryData, SemanticVersion,
};
pub use transaction_receipt::{TransactionReceiptQuery, TransactionReceiptQueryData};
pub use transaction_record::{TransactionRecordQuery, TransactionRecordQueryData};

use crate::error::Result;
use crate::execute::{classify_precheck, RetryDecision};
use crate::ids::{LedgerId, TransactionId};
use crate::wire::{ResponseEnvelope, Service, WireWriter};

/// On-wire query variant tags.
pub(crate) mod tag {
    pub const ACCOUNT_BALANCE: u8 = 1;
    pub const ACCOUNT_INFO: u8 = 2;
    pub const FILE_CONTENTS: u8 = 3;
    pub const TRANSACTION_RECEIPT: u8 = 4;
    pub const TRANSACTION_RECORD: u8 = 5;
    pub const NETWORK_VERSION_INFO: u8 = 6;
}

/// Query header response modes.
pub(crate) mod response_type {
    /// Phase one: answer with the cost only.
    pub const COST_ANSWER: u8 = 0;
    /// Phase two: answer with the payload (payment attached if required).
    pub const ANSWER_ONLY: u8 = 1;
}

/// The capability each query variant provides to the generic [`Query`].
pub trait QueryData: Clone + Send + Sync {
    /// What a completed query yields.
    type Response: Send;

    /// The service this query routes to.
    fn service(&self) -> Service;

    /// The on-wire variant tag (one of [`tag`]).
    fn variant_tag(&self) -> u8;

    /// Appends the variant's request fields after the header.
    fn encode_fields(&self, w: &mut WireWriter);

    /// Decodes the variant's response body.
    fn decode_response(&self, body: &[u8]) -> Result<Self::Response>;

    /// Free queries skip the cost probe and carry no payment.
    fn is_free(&self) -> bool {
        false
    }

    /// The transaction this query is about, for error reporting and
    /// polling. `None` for entity queries.
    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    /// Classifies one response envelope. Polling queries override this to
    /// treat "not known yet" as a retry.
    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision {
        classify_precheck(response.precheck)
    }

    /// Pre-flight validation of the variant's own fields.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Entity-id checksum validation against the client's ledger.
    fn validate_checksums(&self, _ledger_id: &LedgerId) -> Result<()> {
        Ok(())
    }
}
