//! # SDK Configuration & Constants
//!
//! Every magic number in the SDK lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these are *client-side* policy defaults (backoffs, deadlines,
//! fee caps). The ledger does not care what you set them to; your users will.

use std::time::Duration;

use crate::hbar::Hbar;

// ---------------------------------------------------------------------------
// Wire Protocol
// ---------------------------------------------------------------------------

/// Protocol magic bytes used in the wire preamble. Every Meridian RPC frame
/// starts with these 4 bytes so endpoints can quickly reject stray traffic
/// without parsing further.
pub const PROTOCOL_MAGIC: u32 = 0x4D52444E; // "MRDN"

/// Wire protocol version. Bumped when the frame layout changes; the ledger
/// rejects versions it does not speak.
pub const WIRE_PROTOCOL_VERSION: u16 = 1;

/// Maximum frame size we will read off a channel. Anything larger is a
/// protocol violation, not a big transaction.
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Default RPC port for plaintext node endpoints.
pub const DEFAULT_PLAIN_PORT: u16 = 50211;

/// Default RPC port for TLS node endpoints.
pub const DEFAULT_TLS_PORT: u16 = 50212;

// ---------------------------------------------------------------------------
// Retry & Backoff
// ---------------------------------------------------------------------------

/// Initial quarantine applied to a node after its first failed attempt.
/// Doubles on each consecutive failure.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Ceiling for node quarantine. A node that keeps failing waits this long
/// between chances, never longer.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Maximum attempts a single execute will make before giving up. Counts
/// every submit, to any node.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Overall wall-clock budget for one execute call, cost probes included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-attempt network deadline. One submit gets at most this long before
/// the engine cuts it loose and moves on.
pub const DEFAULT_GRPC_DEADLINE: Duration = Duration::from_secs(10);

/// How long a channel may take to finish the TCP/TLS handshake before the
/// attempt is written off as unreachable.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Fees & Payments
// ---------------------------------------------------------------------------

/// Default cap on the transaction fee a client is willing to pay when the
/// caller sets nothing. 2 hbar covers every routine operation with room to
/// spare; anything costlier deserves an explicit opt-in.
pub const DEFAULT_MAX_TRANSACTION_FEE: Hbar = Hbar::from_tinybars(200_000_000);

/// Default cap on automatic query payments. Queries above this fail fast
/// with the probed cost so the caller can decide.
pub const DEFAULT_MAX_QUERY_PAYMENT: Hbar = Hbar::from_tinybars(100_000_000);

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// How long a transaction stays valid after its valid-start instant.
/// The ledger enforces an upper bound of 180 s; 120 s leaves slack for
/// retries without flirting with the limit.
pub const DEFAULT_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Upper bound on the memo field, enforced before anything hits the wire.
pub const MAX_MEMO_LENGTH: usize = 100;

/// Default payload slice carried by one chunk of a chunked transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default ceiling on the number of chunks a chunked transaction may emit.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Valid-start timestamps are backdated by a random amount in this range so
/// that modest client clock skew cannot push a transaction into the future
/// from the ledger's point of view.
pub const TRANSACTION_ID_BACKDATE_MIN: Duration = Duration::from_secs(5);
pub const TRANSACTION_ID_BACKDATE_MAX: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Number of nodes a request fans out to when the caller didn't pick any:
/// one third of the network, rounded up.
pub fn default_nodes_for_request(network_size: usize) -> usize {
    (network_size + 3 - 1) / 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_magic_is_valid_ascii() {
        // The magic bytes should decode to a readable 4-char ASCII tag.
        let bytes = PROTOCOL_MAGIC.to_be_bytes();
        assert!(bytes.iter().all(|b| b.is_ascii_alphanumeric()));
        assert_eq!(&bytes, b"MRDN");
    }

    #[test]
    fn backoff_bounds_are_ordered() {
        assert!(DEFAULT_MIN_BACKOFF < DEFAULT_MAX_BACKOFF);
        assert!(DEFAULT_MIN_BACKOFF >= Duration::from_millis(1));
    }

    #[test]
    fn deadlines_are_ordered() {
        // A single attempt must never be allowed to eat the whole request
        // budget, otherwise retries are fiction.
        assert!(DEFAULT_GRPC_DEADLINE < DEFAULT_REQUEST_TIMEOUT);
        assert!(CONNECT_TIMEOUT <= DEFAULT_GRPC_DEADLINE);
    }

    #[test]
    fn backdate_range_is_sane() {
        assert!(TRANSACTION_ID_BACKDATE_MIN < TRANSACTION_ID_BACKDATE_MAX);
        assert!(TRANSACTION_ID_BACKDATE_MAX < DEFAULT_TRANSACTION_VALID_DURATION);
    }

    #[test]
    fn default_fee_caps_are_positive() {
        assert!(DEFAULT_MAX_TRANSACTION_FEE.to_tinybars() > 0);
        assert!(DEFAULT_MAX_QUERY_PAYMENT.to_tinybars() > 0);
    }

    #[test]
    fn node_fanout_is_a_third_rounded_up() {
        assert_eq!(default_nodes_for_request(1), 1);
        assert_eq!(default_nodes_for_request(3), 1);
        assert_eq!(default_nodes_for_request(4), 2);
        assert_eq!(default_nodes_for_request(10), 4);
        assert_eq!(default_nodes_for_request(30), 10);
    }
}
