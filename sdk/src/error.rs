//! # Error Taxonomy
//!
//! Every fallible public API in the SDK returns [`Error`]. The variants are
//! organized by *cause*, not by the module that raised them, so callers can
//! match on what went wrong rather than where:
//!
//! - [`Error::Argument`] — the caller handed us something invalid. Raised
//!   synchronously, before any network traffic.
//! - [`Error::NotReady`] — a precondition is unmet (executing an unfrozen
//!   transaction with no client, signing before freeze, empty fan-out).
//! - [`Error::Transport`] — a network round-trip failed. The execution engine
//!   absorbs these by rotating nodes; you only see one if every attempt died.
//! - [`Error::Precheck`] — a node rejected the request before consensus with
//!   a typed status code. The retryable subset never surfaces.
//! - [`Error::ReceiptStatus`] — the network *committed* the transaction but
//!   the receipt carries a non-success status. The money moved (or didn't);
//!   either way the fee was charged.
//! - [`Error::Config`] — the client and the network disagree (ledger
//!   mismatch, checksum validation failure).
//! - [`Error::Cancelled`] / [`Error::Timeout`] — the caller pulled the plug,
//!   or the overall deadline did.
//!
//! Leaf modules with their own small failure domains keep a dedicated enum
//! ([`CodecError`], [`crate::crypto::KeyError`], [`crate::ethereum::RlpError`])
//! and convert into [`Error`] via `From`.

use std::time::Duration;

use crate::ids::TransactionId;
use crate::wire::Status;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The unified SDK error type. See the module docs for the taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied data violates an invariant: malformed identifier,
    /// negative amount where non-negative is required, mutation after freeze.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// A precondition for the requested operation is unmet.
    #[error("operation not ready: {0}")]
    NotReady(String),

    /// The network round-trip itself failed (connect refused, TLS failure,
    /// per-attempt deadline exceeded, protocol violation).
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A node rejected the request pre-consensus with a fatal status code.
    #[error("transaction `{}` failed pre-check with status `{status}`", fmt_tx_id(.transaction_id))]
    Precheck {
        /// The status the node answered with.
        status: Status,
        /// The transaction the node rejected, when the request carried one.
        transaction_id: Option<TransactionId>,
    },

    /// The transaction reached consensus but its receipt reports failure.
    /// The request is committed; retrying would be a *new* transaction.
    #[error("receipt for transaction `{}` carries failing status `{status}`", fmt_tx_id(.transaction_id))]
    ReceiptStatus {
        /// Terminal status recorded in the receipt.
        status: Status,
        /// The committed transaction.
        transaction_id: Option<TransactionId>,
    },

    /// A query's probed cost exceeds the configured payment cap. Carries both
    /// numbers so the caller can decide whether to raise the cap and retry.
    #[error("query cost of {cost} exceeds the configured maximum payment of {max}")]
    MaxQueryPaymentExceeded {
        /// The cost the network quoted for the query.
        cost: crate::hbar::Hbar,
        /// The cap in effect (per-query or client-wide).
        max: crate::hbar::Hbar,
    },

    /// Client/network configuration is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// An entity-id checksum did not match the client's ledger.
    #[error("checksum `{actual}` for entity `{entity}` does not match expected `{expected}`")]
    ChecksumMismatch {
        /// The entity whose checksum failed validation.
        entity: String,
        /// Checksum computed for the client's ledger.
        expected: String,
        /// Checksum the caller supplied.
        actual: String,
    },

    /// Every allowed attempt was spent without a terminal answer.
    #[error("exhausted {attempts} attempts; last failure: {last_error}")]
    MaxAttemptsExceeded {
        /// Number of submits performed.
        attempts: usize,
        /// The failure observed on the final attempt.
        last_error: Box<Error>,
    },

    /// The overall request deadline elapsed before a terminal answer.
    #[error("request deadline of {:?} elapsed", .0)]
    Timeout(Duration),

    /// The execution was cancelled externally (client closed).
    #[error("request cancelled")]
    Cancelled,

    /// Wire-format encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Key material could not be parsed or used.
    #[error(transparent)]
    Key(#[from] crate::crypto::KeyError),

    /// RLP encoding or decoding of an Ethereum transaction failed.
    #[error(transparent)]
    Rlp(#[from] crate::ethereum::RlpError),
}

impl Error {
    /// Shorthand for an [`Error::Argument`] from anything displayable.
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::Argument(msg.into())
    }

    /// Shorthand for an [`Error::NotReady`].
    pub(crate) fn not_ready(msg: impl Into<String>) -> Self {
        Error::NotReady(msg.into())
    }
}

// ---------------------------------------------------------------------------
// Transport Errors
// ---------------------------------------------------------------------------

/// Failure of a single network round-trip to a single node.
///
/// These are *engine fuel*, not caller-facing failures: the execution engine
/// classifies each one, quarantines the node, and rotates. A `TransportError`
/// only escapes wrapped in [`Error::MaxAttemptsExceeded`] or after the
/// overall deadline is gone.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The node could not be reached or the connection dropped mid-flight.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// The per-attempt deadline elapsed before the node answered.
    #[error("per-attempt deadline of {:?} elapsed", .0)]
    DeadlineExceeded(Duration),

    /// TLS negotiation or certificate verification failed.
    #[error("tls failure: {0}")]
    Tls(String),

    /// The node answered with bytes that are not a valid protocol frame.
    #[error("protocol violation from node: {0}")]
    Protocol(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Unavailable(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Codec Errors
// ---------------------------------------------------------------------------

/// Failures from the deterministic wire codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The buffer ended before the field being read was complete.
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    /// Input remained after the outermost message was fully decoded.
    #[error("{0} trailing bytes after message end")]
    TrailingBytes(usize),

    /// A tag byte selected a variant that does not exist.
    #[error("unknown {kind} tag {tag}")]
    UnknownTag {
        /// What the tag was selecting (variant family).
        kind: &'static str,
        /// The offending tag value.
        tag: u8,
    },

    /// A length prefix exceeded the maximum frame size.
    #[error("declared length {0} exceeds frame limit")]
    LengthOverflow(usize),

    /// A byte field failed a domain check (bad UTF-8, wrong key length, …).
    #[error("malformed field {0}")]
    MalformedField(&'static str),
}

fn fmt_tx_id(id: &Option<TransactionId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<none>".to_string(),
    }
}
