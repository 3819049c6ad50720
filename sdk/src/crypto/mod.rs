//! # Keys & Signatures
//!
//! Ed25519 and ECDSA secp256k1 key material, the recursive [`Key`] structure
//! entities are controlled by, and the [`Signer`] capability the transaction
//! layer consumes. Don't roll your own; the vetted crates underneath do the
//! actual math.

pub mod key;
pub mod private_key;
pub mod public_key;
pub mod signer;

pub use key::{Key, KeyList};
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signer::{Operator, Signer};

/// Errors from key parsing and signature verification.
///
/// Intentionally vague about *why* something failed — leaking details about
/// key material through error messages is a classic footgun.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Secret bytes had the wrong length or were not a valid scalar.
    #[error("invalid private key bytes")]
    InvalidPrivateKey,

    /// Public bytes did not decode to a point on the right curve.
    #[error("invalid public key bytes")]
    InvalidPublicKey,

    /// A signature failed to parse or verify.
    #[error("signature verification failed")]
    InvalidSignature,
}
