//! Public keys: the identity half of a signature capability.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::Verifier as _;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use sha3::{Digest, Keccak256};

use crate::crypto::KeyError;
use crate::error::CodecError;
use crate::ids::EvmAddress;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

const TAG_ED25519: u8 = 1;
const TAG_ECDSA: u8 = 2;

/// A public key for one of the supported schemes.
///
/// Raw forms: 32 bytes for Ed25519, 33 bytes (SEC1 compressed) for ECDSA
/// secp256k1. The raw bytes are what prefixes a signature in a signature
/// map, so equality and hashing go through them.
#[derive(Clone, Copy)]
pub struct PublicKey(KeyData);

#[derive(Clone, Copy)]
enum KeyData {
    Ed25519(ed25519_dalek::VerifyingKey),
    EcdsaSecp256k1(k256::ecdsa::VerifyingKey),
}

impl PublicKey {
    pub(crate) fn ed25519(key: ed25519_dalek::VerifyingKey) -> Self {
        PublicKey(KeyData::Ed25519(key))
    }

    pub(crate) fn ecdsa(key: k256::ecdsa::VerifyingKey) -> Self {
        PublicKey(KeyData::EcdsaSecp256k1(key))
    }

    /// Reconstructs a key from raw bytes, selecting the scheme by length:
    /// 32 bytes is Ed25519, 33 is compressed secp256k1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            32 => {
                let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
                ed25519_dalek::VerifyingKey::from_bytes(&arr)
                    .map(Self::ed25519)
                    .map_err(|_| KeyError::InvalidPublicKey)
            }
            33 => k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                .map(Self::ecdsa)
                .map_err(|_| KeyError::InvalidPublicKey),
            _ => Err(KeyError::InvalidPublicKey),
        }
    }

    /// The raw bytes (32 or 33 depending on scheme).
    pub fn to_bytes_raw(&self) -> Vec<u8> {
        match &self.0 {
            KeyData::Ed25519(key) => key.to_bytes().to_vec(),
            KeyData::EcdsaSecp256k1(key) => key.to_sec1_bytes().to_vec(),
        }
    }

    /// Verifies `signature` over `message`, using the scheme's convention
    /// (direct for Ed25519, Keccak-256 prehash for ECDSA).
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), KeyError> {
        match &self.0 {
            KeyData::Ed25519(key) => {
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| KeyError::InvalidSignature)?;
                key.verify(message, &sig).map_err(|_| KeyError::InvalidSignature)
            }
            KeyData::EcdsaSecp256k1(key) => {
                let sig = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| KeyError::InvalidSignature)?;
                let digest = Keccak256::digest(message);
                key.verify_prehash(&digest, &sig)
                    .map_err(|_| KeyError::InvalidSignature)
            }
        }
    }

    /// The EVM address derived from this key: the last 20 bytes of the
    /// Keccak-256 of the uncompressed point. Only ECDSA keys have one.
    pub fn to_evm_address(&self) -> Option<EvmAddress> {
        match &self.0 {
            KeyData::Ed25519(_) => None,
            KeyData::EcdsaSecp256k1(key) => {
                let uncompressed = key.to_encoded_point(false);
                // Skip the 0x04 point-format byte.
                let digest = Keccak256::digest(&uncompressed.as_bytes()[1..]);
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&digest[12..]);
                Some(EvmAddress::from_bytes(addr))
            }
        }
    }

    /// `true` for Ed25519 keys.
    pub fn is_ed25519(&self) -> bool {
        matches!(self.0, KeyData::Ed25519(_))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes_raw() == other.to_bytes_raw()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes_raw().hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes_raw()))
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }
}

impl WireEncode for PublicKey {
    fn encode(&self, w: &mut WireWriter) {
        let tag = match self.0 {
            KeyData::Ed25519(_) => TAG_ED25519,
            KeyData::EcdsaSecp256k1(_) => TAG_ECDSA,
        };
        w.put_u8(tag);
        w.put_bytes(&self.to_bytes_raw());
    }
}

impl WireDecode for PublicKey {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let tag = r.read_u8("public key scheme")?;
        let bytes = r.read_bytes("public key bytes")?;
        let key = PublicKey::from_bytes(&bytes)
            .map_err(|_| CodecError::MalformedField("public key bytes"))?;
        let matches_tag = match (tag, &key.0) {
            (TAG_ED25519, KeyData::Ed25519(_)) => true,
            (TAG_ECDSA, KeyData::EcdsaSecp256k1(_)) => true,
            _ => false,
        };
        if !matches_tag {
            return Err(CodecError::UnknownTag { kind: "public key scheme", tag });
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    #[test]
    fn raw_bytes_round_trip() {
        let ed = PrivateKey::generate_ed25519().public_key();
        assert_eq!(PublicKey::from_bytes(&ed.to_bytes_raw()).unwrap(), ed);
        assert_eq!(ed.to_bytes_raw().len(), 32);

        let ec = PrivateKey::generate_ecdsa().public_key();
        assert_eq!(PublicKey::from_bytes(&ec.to_bytes_raw()).unwrap(), ec);
        assert_eq!(ec.to_bytes_raw().len(), 33);
    }

    #[test]
    fn hex_round_trip() {
        let key = PrivateKey::generate_ed25519().public_key();
        let parsed: PublicKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn wire_round_trip() {
        for key in [
            PrivateKey::generate_ed25519().public_key(),
            PrivateKey::generate_ecdsa().public_key(),
        ] {
            assert_eq!(PublicKey::from_wire_bytes(&key.to_wire_bytes()).unwrap(), key);
        }
    }

    #[test]
    fn evm_address_only_for_ecdsa() {
        assert!(PrivateKey::generate_ed25519().public_key().to_evm_address().is_none());
        let addr = PrivateKey::generate_ecdsa().public_key().to_evm_address();
        assert!(addr.is_some());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(PublicKey::from_bytes(&[0u8; 31]).is_err());
        assert!(PublicKey::from_bytes(&[0xFFu8; 33]).is_err());
    }
}
