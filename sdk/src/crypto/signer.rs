//! The signing capability seam.
//!
//! The SDK never holds key custody opinions: anything that can produce a
//! signature over arbitrary bytes and name its public key can sign
//! transactions. [`PrivateKey`] implements the trait for the common case;
//! HSM or remote-signer integrations implement it without the SDK caring.

use std::sync::Arc;

use crate::crypto::private_key::PrivateKey;
use crate::crypto::public_key::PublicKey;
use crate::ids::AccountId;

/// Produces signatures with a fixed key.
///
/// Implementations must be deterministic per message or at least idempotent
/// in effect: the transaction layer deduplicates by public key, so signing
/// the same bytes twice through the same signer must be harmless.
pub trait Signer: Send + Sync {
    /// The public identity of this signer.
    fn public_key(&self) -> PublicKey;

    /// Signs `message` with the matching private key.
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

impl Signer for PrivateKey {
    fn public_key(&self) -> PublicKey {
        PrivateKey::public_key(self)
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        PrivateKey::sign(self, message)
    }
}

/// The client's paying identity: an account plus the capability to sign as
/// it. Set once at client setup, read by every execute.
#[derive(Clone)]
pub struct Operator {
    /// The account that pays fees and query payments.
    pub account_id: AccountId,
    /// Signing capability for that account's key.
    pub signer: Arc<dyn Signer>,
}

impl Operator {
    /// An operator backed by an in-memory private key.
    pub fn new(account_id: AccountId, key: PrivateKey) -> Self {
        Operator { account_id, signer: Arc::new(key) }
    }

    /// The operator's public key.
    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("account_id", &self.account_id.to_string())
            .field("public_key", &self.public_key().to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_is_a_signer() {
        let key = PrivateKey::generate_ed25519();
        let public = Signer::public_key(&key);
        let sig = Signer::sign(&key, b"payload");
        assert!(public.verify(b"payload", &sig).is_ok());
    }

    #[test]
    fn operator_exposes_identity_not_secrets() {
        let op = Operator::new(AccountId::new(2), PrivateKey::generate_ed25519());
        let debug = format!("{op:?}");
        assert!(debug.contains("0.0.2"));
        assert!(!debug.contains("redacted") || !debug.is_empty());
    }

    #[test]
    fn custom_signer_implementations_work() {
        struct Wrapper(PrivateKey);
        impl Signer for Wrapper {
            fn public_key(&self) -> PublicKey {
                self.0.public_key()
            }
            fn sign(&self, message: &[u8]) -> Vec<u8> {
                self.0.sign(message)
            }
        }

        let inner = PrivateKey::generate_ecdsa();
        let public = inner.public_key();
        let wrapper: Arc<dyn Signer> = Arc::new(Wrapper(inner));
        let sig = wrapper.sign(b"msg");
        assert!(public.verify(b"msg", &sig).is_ok());
    }
}
