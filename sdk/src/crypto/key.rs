//! The recursive key structure controlling an entity.
//!
//! An entity's key is either a primitive public key, a list requiring every
//! member, or a threshold list requiring at least `t` members. Lists nest
//! arbitrarily, so satisfaction is a recursive question: given the set of
//! public keys that actually signed, does this structure approve?

use std::collections::HashSet;

use crate::crypto::public_key::PublicKey;
use crate::error::CodecError;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

const TAG_SINGLE: u8 = 1;
const TAG_LIST: u8 = 2;

/// A key structure: primitive, all-of list, or t-of-n threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// A single public key; satisfied by a matching signature.
    Single(PublicKey),
    /// A (possibly threshold) list of nested keys.
    List(KeyList),
}

impl Key {
    /// Recursively decides whether the keys in `signers` satisfy this
    /// structure. `signers` holds raw public-key bytes.
    pub fn is_satisfied_by(&self, signers: &HashSet<Vec<u8>>) -> bool {
        match self {
            Key::Single(key) => signers.contains(&key.to_bytes_raw()),
            Key::List(list) => {
                let satisfied = list
                    .keys
                    .iter()
                    .filter(|k| k.is_satisfied_by(signers))
                    .count();
                match list.threshold {
                    Some(t) => satisfied >= t as usize,
                    None => !list.keys.is_empty() && satisfied == list.keys.len(),
                }
            }
        }
    }
}

impl From<PublicKey> for Key {
    fn from(key: PublicKey) -> Self {
        Key::Single(key)
    }
}

impl From<KeyList> for Key {
    fn from(list: KeyList) -> Self {
        Key::List(list)
    }
}

impl WireEncode for Key {
    fn encode(&self, w: &mut WireWriter) {
        match self {
            Key::Single(key) => {
                w.put_u8(TAG_SINGLE);
                key.encode(w);
            }
            Key::List(list) => {
                w.put_u8(TAG_LIST);
                w.put_option(list.threshold.as_ref(), |w, t| w.put_u32(*t));
                w.put_seq(&list.keys, |w, k| k.encode(w));
            }
        }
    }
}

impl WireDecode for Key {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        match r.read_u8("key tag")? {
            TAG_SINGLE => Ok(Key::Single(PublicKey::decode(r)?)),
            TAG_LIST => {
                let threshold = r.read_option("key threshold", |r| r.read_u32("key threshold"))?;
                let keys = r.read_seq("key list", Key::decode)?;
                Ok(Key::List(KeyList { keys, threshold }))
            }
            tag => Err(CodecError::UnknownTag { kind: "key", tag }),
        }
    }
}

/// A list of nested keys, optionally with a satisfaction threshold.
///
/// `threshold: None` means all members must sign; `Some(t)` means at least
/// `t` must.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyList {
    /// Member keys, each itself a full [`Key`].
    pub keys: Vec<Key>,
    /// Minimum satisfied members, or `None` for all-of.
    pub threshold: Option<u32>,
}

impl KeyList {
    /// An all-of list over the given keys.
    pub fn of(keys: impl IntoIterator<Item = Key>) -> Self {
        KeyList { keys: keys.into_iter().collect(), threshold: None }
    }

    /// A t-of-n threshold list over the given keys.
    pub fn with_threshold(threshold: u32, keys: impl IntoIterator<Item = Key>) -> Self {
        KeyList { keys: keys.into_iter().collect(), threshold: Some(threshold) }
    }
}

impl WireEncode for KeyList {
    fn encode(&self, w: &mut WireWriter) {
        w.put_option(self.threshold.as_ref(), |w, t| w.put_u32(*t));
        w.put_seq(&self.keys, |w, k| k.encode(w));
    }
}

impl WireDecode for KeyList {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let threshold = r.read_option("key threshold", |r| r.read_u32("key threshold"))?;
        let keys = r.read_seq("key list", Key::decode)?;
        Ok(KeyList { keys, threshold })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn signer_set(keys: &[&PublicKey]) -> HashSet<Vec<u8>> {
        keys.iter().map(|k| k.to_bytes_raw()).collect()
    }

    #[test]
    fn single_key_satisfaction() {
        let a = PrivateKey::generate_ed25519().public_key();
        let b = PrivateKey::generate_ed25519().public_key();
        let key = Key::from(a);
        assert!(key.is_satisfied_by(&signer_set(&[&a])));
        assert!(!key.is_satisfied_by(&signer_set(&[&b])));
    }

    #[test]
    fn all_of_list_requires_every_member() {
        let a = PrivateKey::generate_ed25519().public_key();
        let b = PrivateKey::generate_ed25519().public_key();
        let list = Key::from(KeyList::of([a.into(), b.into()]));

        assert!(list.is_satisfied_by(&signer_set(&[&a, &b])));
        assert!(!list.is_satisfied_by(&signer_set(&[&a])));
    }

    #[test]
    fn threshold_list_requires_at_least_t() {
        let a = PrivateKey::generate_ed25519().public_key();
        let b = PrivateKey::generate_ed25519().public_key();
        let c = PrivateKey::generate_ed25519().public_key();
        let key = Key::from(KeyList::with_threshold(2, [a.into(), b.into(), c.into()]));

        assert!(!key.is_satisfied_by(&signer_set(&[&a])));
        assert!(key.is_satisfied_by(&signer_set(&[&a, &c])));
        assert!(key.is_satisfied_by(&signer_set(&[&a, &b, &c])));
    }

    #[test]
    fn nested_structures_recurse() {
        let a = PrivateKey::generate_ed25519().public_key();
        let b = PrivateKey::generate_ed25519().public_key();
        let c = PrivateKey::generate_ecdsa().public_key();
        // (a AND b) OR c, spelled as 1-of-[all-of[a,b], c].
        let inner = KeyList::of([a.into(), b.into()]);
        let key = Key::from(KeyList::with_threshold(1, [inner.into(), c.into()]));

        assert!(key.is_satisfied_by(&signer_set(&[&c])));
        assert!(key.is_satisfied_by(&signer_set(&[&a, &b])));
        assert!(!key.is_satisfied_by(&signer_set(&[&a])));
    }

    #[test]
    fn empty_all_of_list_is_never_satisfied() {
        let key = Key::from(KeyList::default());
        assert!(!key.is_satisfied_by(&HashSet::new()));
    }

    #[test]
    fn wire_round_trip() {
        let a = PrivateKey::generate_ed25519().public_key();
        let b = PrivateKey::generate_ecdsa().public_key();
        let key = Key::from(KeyList::with_threshold(
            1,
            [Key::from(a), Key::from(KeyList::of([b.into()]))],
        ));
        let bytes = key.to_wire_bytes();
        assert_eq!(Key::from_wire_bytes(&bytes).unwrap(), key);
    }
}
