//! Ledger status codes.
//!
//! Every response — pre-check header and receipt alike — carries one of
//! these. The numeric values are part of the wire contract and never change;
//! new codes are only ever appended. This table is the subset the core SDK
//! reacts to, plus a catch-all for codes minted after this build.

use std::fmt;

/// A typed ledger status code.
///
/// Classification (retry same node / rotate / fatal) does *not* live here —
/// that policy belongs to the execution engine. `Status` is the vocabulary,
/// not the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Status {
    /// The request passed pre-check and was accepted for consensus.
    Ok,
    /// Terminal success recorded in a receipt.
    Success,
    /// The node is overloaded; try again shortly.
    Busy,
    /// The node's platform layer is up but not yet serving.
    PlatformNotActive,
    /// Catch-all transient platform failure.
    PlatformTransactionNotCreated,
    /// The transaction's valid window has already closed.
    TransactionExpired,
    /// The transaction's valid-start is in the future.
    InvalidTransactionStart,
    /// A transaction with this id was already submitted.
    DuplicateTransaction,
    /// A signature does not verify against the body bytes.
    InvalidSignature,
    /// The payer's signature set does not satisfy its key.
    InvalidPayerSignature,
    /// An account id in the request does not exist or is malformed.
    InvalidAccountId,
    /// The payer account does not exist.
    PayerAccountNotFound,
    /// This copy was addressed to a different node.
    InvalidNodeAccount,
    /// The declared fee cap is below the estimated fee.
    InsufficientTxFee,
    /// The payer cannot cover the fee.
    InsufficientPayerBalance,
    /// Query payment was missing or too small.
    InsufficientQueryFee,
    /// The memo exceeds the ledger limit.
    MemoTooLong,
    /// Transaction id malformed or inconsistent.
    InvalidTransactionId,
    /// A file id in the request does not exist or is malformed.
    InvalidFileId,
    /// A token id in the request does not exist or is malformed.
    InvalidTokenId,
    /// A topic id in the request does not exist or is malformed.
    InvalidTopicId,
    /// A contract id in the request does not exist or is malformed.
    InvalidContractId,
    /// A schedule id in the request does not exist or is malformed.
    InvalidScheduleId,
    /// Chunk number/total inconsistent with the initial transaction.
    InvalidChunkNumber,
    /// A chunked transaction's chunk exceeded the per-chunk limit.
    InvalidChunkTransactionId,
    /// The receipt for the requested transaction is not (yet) known.
    ReceiptNotFound,
    /// The record for the requested transaction is not (yet) known.
    RecordNotFound,
    /// The network does not know this transaction (yet).
    Unknown,
    /// Hbar transfer list does not net to zero.
    InvalidAccountAmounts,
    /// Contract execution reverted.
    ContractRevertExecuted,
    /// The ledger id in the request does not match the node's ledger.
    InvalidLedgerId,
    /// A status code this build does not know by name.
    Unrecognized(u32),
}

impl Status {
    /// The on-wire numeric code.
    pub const fn code(self) -> u32 {
        match self {
            Status::Ok => 0,
            Status::Success => 22,
            Status::Busy => 2,
            Status::PlatformNotActive => 14,
            Status::PlatformTransactionNotCreated => 13,
            Status::TransactionExpired => 4,
            Status::InvalidTransactionStart => 5,
            Status::DuplicateTransaction => 11,
            Status::InvalidSignature => 7,
            Status::InvalidPayerSignature => 20,
            Status::InvalidAccountId => 15,
            Status::PayerAccountNotFound => 10,
            Status::InvalidNodeAccount => 3,
            Status::InsufficientTxFee => 9,
            Status::InsufficientPayerBalance => 10_001,
            Status::InsufficientQueryFee => 10_002,
            Status::MemoTooLong => 8,
            Status::InvalidTransactionId => 45,
            Status::InvalidFileId => 38,
            Status::InvalidTokenId => 167,
            Status::InvalidTopicId => 150,
            Status::InvalidContractId => 16,
            Status::InvalidScheduleId => 201,
            Status::InvalidChunkNumber => 211,
            Status::InvalidChunkTransactionId => 212,
            Status::ReceiptNotFound => 281,
            Status::RecordNotFound => 282,
            Status::Unknown => 21,
            Status::InvalidAccountAmounts => 48,
            Status::ContractRevertExecuted => 33,
            Status::InvalidLedgerId => 300,
            Status::Unrecognized(code) => code,
        }
    }

    /// Reconstructs a status from its wire code. Codes this build does not
    /// know come back as [`Status::Unrecognized`] instead of failing the
    /// decode — new server codes must not brick old clients.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Status::Ok,
            22 => Status::Success,
            2 => Status::Busy,
            14 => Status::PlatformNotActive,
            13 => Status::PlatformTransactionNotCreated,
            4 => Status::TransactionExpired,
            5 => Status::InvalidTransactionStart,
            11 => Status::DuplicateTransaction,
            7 => Status::InvalidSignature,
            20 => Status::InvalidPayerSignature,
            15 => Status::InvalidAccountId,
            10 => Status::PayerAccountNotFound,
            3 => Status::InvalidNodeAccount,
            9 => Status::InsufficientTxFee,
            10_001 => Status::InsufficientPayerBalance,
            10_002 => Status::InsufficientQueryFee,
            8 => Status::MemoTooLong,
            45 => Status::InvalidTransactionId,
            38 => Status::InvalidFileId,
            167 => Status::InvalidTokenId,
            150 => Status::InvalidTopicId,
            16 => Status::InvalidContractId,
            201 => Status::InvalidScheduleId,
            211 => Status::InvalidChunkNumber,
            212 => Status::InvalidChunkTransactionId,
            281 => Status::ReceiptNotFound,
            282 => Status::RecordNotFound,
            21 => Status::Unknown,
            48 => Status::InvalidAccountAmounts,
            33 => Status::ContractRevertExecuted,
            300 => Status::InvalidLedgerId,
            other => Status::Unrecognized(other),
        }
    }

    /// `true` for the two codes that mean "nothing went wrong".
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unrecognized(code) => write!(f, "UNRECOGNIZED({code})"),
            other => {
                let name = match other {
                    Status::Ok => "OK",
                    Status::Success => "SUCCESS",
                    Status::Busy => "BUSY",
                    Status::PlatformNotActive => "PLATFORM_NOT_ACTIVE",
                    Status::PlatformTransactionNotCreated => "PLATFORM_TRANSACTION_NOT_CREATED",
                    Status::TransactionExpired => "TRANSACTION_EXPIRED",
                    Status::InvalidTransactionStart => "INVALID_TRANSACTION_START",
                    Status::DuplicateTransaction => "DUPLICATE_TRANSACTION",
                    Status::InvalidSignature => "INVALID_SIGNATURE",
                    Status::InvalidPayerSignature => "INVALID_PAYER_SIGNATURE",
                    Status::InvalidAccountId => "INVALID_ACCOUNT_ID",
                    Status::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
                    Status::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
                    Status::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
                    Status::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
                    Status::InsufficientQueryFee => "INSUFFICIENT_QUERY_FEE",
                    Status::MemoTooLong => "MEMO_TOO_LONG",
                    Status::InvalidTransactionId => "INVALID_TRANSACTION_ID",
                    Status::InvalidFileId => "INVALID_FILE_ID",
                    Status::InvalidTokenId => "INVALID_TOKEN_ID",
                    Status::InvalidTopicId => "INVALID_TOPIC_ID",
                    Status::InvalidContractId => "INVALID_CONTRACT_ID",
                    Status::InvalidScheduleId => "INVALID_SCHEDULE_ID",
                    Status::InvalidChunkNumber => "INVALID_CHUNK_NUMBER",
                    Status::InvalidChunkTransactionId => "INVALID_CHUNK_TRANSACTION_ID",
                    Status::ReceiptNotFound => "RECEIPT_NOT_FOUND",
                    Status::RecordNotFound => "RECORD_NOT_FOUND",
                    Status::Unknown => "UNKNOWN",
                    Status::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
                    Status::ContractRevertExecuted => "CONTRACT_REVERT_EXECUTED",
                    Status::InvalidLedgerId => "INVALID_LEDGER_ID",
                    Status::Unrecognized(_) => unreachable!(),
                };
                f.write_str(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        for status in [
            Status::Ok,
            Status::Success,
            Status::Busy,
            Status::TransactionExpired,
            Status::InvalidSignature,
            Status::ReceiptNotFound,
            Status::InvalidLedgerId,
        ] {
            assert_eq!(Status::from_code(status.code()), status);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        let status = Status::from_code(987_654);
        assert_eq!(status, Status::Unrecognized(987_654));
        assert_eq!(status.code(), 987_654);
        assert_eq!(status.to_string(), "UNRECOGNIZED(987654)");
    }

    #[test]
    fn success_predicate() {
        assert!(Status::Ok.is_success());
        assert!(Status::Success.is_success());
        assert!(!Status::Busy.is_success());
        assert!(!Status::Unrecognized(0xDEAD).is_success());
    }
}
