//! # Ethereum Interop
//!
//! The ledger executes raw, already-signed Ethereum transactions on its EVM
//! surface. This module parses the three supported envelopes — legacy,
//! EIP-1559 (`0x02`) and EIP-7702 (`0x04`) — far enough to validate them and
//! re-encode them byte-exactly; the signature inside is the network's
//! problem, not ours.

mod data;
mod rlp;

pub use data::{AccessEntry, Authorization, EthereumData};
pub use rlp::{RlpError, RlpItem};
