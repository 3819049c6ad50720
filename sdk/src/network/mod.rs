//! # Network Layer
//!
//! Everything between the execution engine and a TCP socket: backoff math,
//! the address book, the framed (optionally TLS) channel, per-node health
//! state, and the pool manager that hands out healthy peers.

pub mod address_book;
pub mod backoff;
pub mod channel;
pub mod manager;
pub mod node;

pub use address_book::{Endpoint, NodeAddress, NodeAddressBook};
pub use backoff::Backoff;
pub use channel::{ChannelSecurity, NodeChannel, TlsPolicy};
pub use manager::{
    local_addresses, mainnet_addresses, previewnet_addresses, testnet_addresses, NetworkManager,
};
pub use node::Node;
