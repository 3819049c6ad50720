//! # Wire Layer
//!
//! The binary vocabulary of the Meridian RPC protocol: the deterministic
//! codec every signed byte goes through, the service routing tags, the
//! status-code table, and the request/response envelopes.
//!
//! Nothing in here talks to a socket — framing and transport live in
//! [`crate::network`]. Keeping the codec transport-free is what lets the
//! offline-signing path (serialize, sign elsewhere, submit later) share
//! every byte with the online path.

pub mod codec;
pub mod envelope;
pub mod service;
pub mod status;

pub use codec::{WireDecode, WireEncode, WireReader, WireWriter};
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use service::{RequestKind, Service};
pub use status::Status;
