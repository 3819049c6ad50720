//! Private keys for the two signature schemes the ledger accepts.
//!
//! Ed25519 is the house recommendation; ECDSA over secp256k1 exists for the
//! EVM-compatible surface, where the key doubles as an Ethereum identity.
//! Key bytes are never logged and never appear in `Debug` output. If you add
//! logging to this module, you will be asked to leave.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::Signer as _;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};

use crate::crypto::public_key::PublicKey;
use crate::crypto::KeyError;

/// A signing key for one of the supported schemes.
#[derive(Clone)]
pub struct PrivateKey(KeyData);

#[derive(Clone)]
enum KeyData {
    Ed25519(ed25519_dalek::SigningKey),
    EcdsaSecp256k1(k256::ecdsa::SigningKey),
}

impl PrivateKey {
    /// Generates a fresh Ed25519 key from the OS RNG.
    pub fn generate_ed25519() -> Self {
        PrivateKey(KeyData::Ed25519(ed25519_dalek::SigningKey::generate(
            &mut OsRng,
        )))
    }

    /// Generates a fresh ECDSA secp256k1 key from the OS RNG.
    pub fn generate_ecdsa() -> Self {
        PrivateKey(KeyData::EcdsaSecp256k1(k256::ecdsa::SigningKey::random(
            &mut OsRng,
        )))
    }

    /// Reconstructs an Ed25519 key from its 32 secret bytes.
    pub fn from_bytes_ed25519(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(PrivateKey(KeyData::Ed25519(
            ed25519_dalek::SigningKey::from_bytes(&arr),
        )))
    }

    /// Reconstructs an ECDSA secp256k1 key from its 32 scalar bytes.
    pub fn from_bytes_ecdsa(bytes: &[u8]) -> Result<Self, KeyError> {
        k256::ecdsa::SigningKey::from_slice(bytes)
            .map(|k| PrivateKey(KeyData::EcdsaSecp256k1(k)))
            .map_err(|_| KeyError::InvalidPrivateKey)
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match &self.0 {
            KeyData::Ed25519(key) => PublicKey::ed25519(key.verifying_key()),
            KeyData::EcdsaSecp256k1(key) => PublicKey::ecdsa(*key.verifying_key()),
        }
    }

    /// Signs arbitrary bytes.
    ///
    /// Ed25519 signs the message directly (the scheme hashes internally);
    /// ECDSA signs the Keccak-256 digest, matching Ethereum conventions so
    /// the same key behaves identically on both surfaces.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match &self.0 {
            KeyData::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            KeyData::EcdsaSecp256k1(key) => {
                let digest = Keccak256::digest(message);
                let signature: k256::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .unwrap_or_else(|_| unreachable!("prehash is always 32 bytes"));
                signature.normalize_s().unwrap_or(signature).to_vec()
            }
        }
    }

    /// The raw secret bytes (32 for both schemes). Handle with care.
    pub fn to_bytes_raw(&self) -> Vec<u8> {
        match &self.0 {
            KeyData::Ed25519(key) => key.to_bytes().to_vec(),
            KeyData::EcdsaSecp256k1(key) => key.to_bytes().to_vec(),
        }
    }

    /// `true` for Ed25519 keys.
    pub fn is_ed25519(&self) -> bool {
        matches!(self.0, KeyData::Ed25519(_))
    }
}

impl fmt::Debug for PrivateKey {
    /// Deliberately redacted. Private key material has no business in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.0 {
            KeyData::Ed25519(_) => "ed25519",
            KeyData::EcdsaSecp256k1(_) => "ecdsa-secp256k1",
        };
        write!(f, "PrivateKey({scheme}, <redacted>)")
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    /// Parses hex secret bytes, with an optional `ed25519:` / `ecdsa:`
    /// scheme prefix. Bare hex defaults to Ed25519.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, hex_part) = match s.split_once(':') {
            Some((scheme, rest)) => (scheme, rest),
            None => ("ed25519", s),
        };
        let bytes = hex::decode(hex_part).map_err(|_| KeyError::InvalidPrivateKey)?;
        match scheme {
            "ed25519" => Self::from_bytes_ed25519(&bytes),
            "ecdsa" => Self::from_bytes_ecdsa(&bytes),
            _ => Err(KeyError::InvalidPrivateKey),
        }
    }
}
