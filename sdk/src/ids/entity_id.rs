//! Entity identifiers: the `(shard, realm, num)` triple.
//!
//! Accounts, tokens, files, contracts, topics, and schedules all share the
//! same dotted-triple shape; what differs is which ledger tables the number
//! indexes into. Each kind gets its own newtype so the APIs cannot mix them
//! up, with identical parsing, checksum, and wire behavior generated by the
//! `entity_id!` macro below.
//!
//! Checksums ride along on parsed ids but never participate in equality or
//! hashing — `0.0.123` and `0.0.123-vfmkw` are the same entity.

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Error};
use crate::ids::checksum::Checksum;
use crate::ids::evm_address::EvmAddress;
use crate::ids::ledger_id::LedgerId;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

/// Splits `"1.2.3"` or `"1.2.3-abcde"` into the triple and optional checksum.
fn parse_triple(s: &str, kind: &str) -> Result<(u64, u64, u64, Option<Checksum>), Error> {
    let (address, checksum) = match s.split_once('-') {
        Some((addr, sum)) => (addr, Some(sum.parse::<Checksum>()?)),
        None => (s, None),
    };
    let mut parts = address.splitn(3, '.');
    let parse_part = |part: Option<&str>| -> Result<u64, Error> {
        part.and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| Error::argument(format!("`{s}` is not a valid {kind} id")))
    };
    let shard = parse_part(parts.next())?;
    let realm = parse_part(parts.next())?;
    let num = parse_part(parts.next())?;
    Ok((shard, realm, num, checksum))
}

macro_rules! entity_id {
    ($(#[$docs:meta])* $name:ident, $kind:literal) => {
        $(#[$docs])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            /// Shard the entity lives in.
            pub shard: u64,
            /// Realm within the shard.
            pub realm: u64,
            /// Entity number within the realm.
            pub num: u64,
            /// Checksum captured at parse time, if the input carried one.
            /// Excluded from equality; validated on demand.
            checksum: Option<Checksum>,
        }

        impl $name {
            /// An id in shard 0, realm 0.
            pub const fn new(num: u64) -> Self {
                Self { shard: 0, realm: 0, num, checksum: None }
            }

            /// An id with explicit shard and realm.
            pub const fn from_parts(shard: u64, realm: u64, num: u64) -> Self {
                Self { shard, realm, num, checksum: None }
            }

            /// The checksum carried from parsing, if any.
            pub fn checksum(&self) -> Option<Checksum> {
                self.checksum
            }

            /// The dotted form suffixed with the checksum for `ledger_id`.
            pub fn to_string_with_checksum(&self, ledger_id: &LedgerId) -> String {
                let address = self.to_string();
                let sum = Checksum::generate(ledger_id, &address);
                format!("{address}-{sum}")
            }

            /// Verifies the carried checksum against `ledger_id`. Ids without
            /// a checksum always pass; a mismatch is a configuration error.
            pub fn validate_checksum(&self, ledger_id: &LedgerId) -> Result<(), Error> {
                let Some(actual) = self.checksum else { return Ok(()) };
                let expected = Checksum::generate(ledger_id, &self.to_string());
                if expected == actual {
                    Ok(())
                } else {
                    Err(Error::ChecksumMismatch {
                        entity: self.to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    })
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                (self.shard, self.realm, self.num) == (other.shard, other.realm, other.num)
            }
        }

        impl Eq for $name {}

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                (self.shard, self.realm, self.num).hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                (self.shard, self.realm, self.num).cmp(&(other.shard, other.realm, other.num))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (shard, realm, num, checksum) = parse_triple(s, $kind)?;
                Ok(Self { shard, realm, num, checksum })
            }
        }

        impl WireEncode for $name {
            fn encode(&self, w: &mut WireWriter) {
                w.put_u64(self.shard);
                w.put_u64(self.realm);
                w.put_u64(self.num);
            }
        }

        impl WireDecode for $name {
            fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
                let shard = r.read_u64(concat!($kind, " shard"))?;
                let realm = r.read_u64(concat!($kind, " realm"))?;
                let num = r.read_u64(concat!($kind, " num"))?;
                Ok(Self { shard, realm, num, checksum: None })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

entity_id! {
    /// A fungible or non-fungible token class.
    TokenId, "token"
}

entity_id! {
    /// A file in the on-ledger file store.
    FileId, "file"
}

entity_id! {
    /// A deployed smart contract.
    ContractId, "contract"
}

entity_id! {
    /// A consensus topic.
    TopicId, "topic"
}

entity_id! {
    /// A scheduled transaction entity.
    ScheduleId, "schedule"
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An account (or node peer identity), optionally aliased by an EVM address.
///
/// Aliased accounts print as `shard.realm.0x<40 hex>`; the numeric and
/// aliased forms never compare equal because the ledger resolves the alias
/// server-side.
#[derive(Debug, Clone, Copy)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
    /// EVM alias standing in for `num` when set.
    pub alias: Option<EvmAddress>,
    checksum: Option<Checksum>,
}

impl AccountId {
    /// An account in shard 0, realm 0.
    pub const fn new(num: u64) -> Self {
        AccountId { shard: 0, realm: 0, num, alias: None, checksum: None }
    }

    /// An account with explicit shard and realm.
    pub const fn from_parts(shard: u64, realm: u64, num: u64) -> Self {
        AccountId { shard, realm, num, alias: None, checksum: None }
    }

    /// An account identified by an EVM alias.
    pub const fn from_evm_address(shard: u64, realm: u64, alias: EvmAddress) -> Self {
        AccountId { shard, realm, num: 0, alias: Some(alias), checksum: None }
    }

    /// The checksum carried from parsing, if any.
    pub fn checksum(&self) -> Option<Checksum> {
        self.checksum
    }

    /// The dotted form suffixed with the checksum for `ledger_id`.
    /// Aliased accounts have no checksum form; they return the plain string.
    pub fn to_string_with_checksum(&self, ledger_id: &LedgerId) -> String {
        if self.alias.is_some() {
            return self.to_string();
        }
        let address = self.to_string();
        let sum = Checksum::generate(ledger_id, &address);
        format!("{address}-{sum}")
    }

    /// Verifies the carried checksum against `ledger_id`.
    pub fn validate_checksum(&self, ledger_id: &LedgerId) -> Result<(), Error> {
        let Some(actual) = self.checksum else { return Ok(()) };
        let expected = Checksum::generate(ledger_id, &self.to_string());
        if expected == actual {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                entity: self.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }
}

impl PartialEq for AccountId {
    fn eq(&self, other: &Self) -> bool {
        (self.shard, self.realm, self.num, self.alias)
            == (other.shard, other.realm, other.num, other.alias)
    }
}

impl Eq for AccountId {}

impl std::hash::Hash for AccountId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.shard, self.realm, self.num).hash(state);
        if let Some(alias) = &self.alias {
            alias.as_bytes().hash(state);
        }
    }
}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.shard, self.realm, self.num, self.alias.map(|a| *a.as_bytes()))
            .cmp(&(other.shard, other.realm, other.num, other.alias.map(|a| *a.as_bytes())))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{}.{}", self.shard, self.realm, alias),
            None => write!(f, "{}.{}.{}", self.shard, self.realm, self.num),
        }
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // An aliased form has an EVM address as the third segment.
        let mut parts = s.splitn(3, '.');
        if let (Some(shard), Some(realm), Some(last)) = (parts.next(), parts.next(), parts.next())
        {
            if last.starts_with("0x") || (last.len() == 40 && last.bytes().all(|b| b.is_ascii_hexdigit())) {
                let shard = shard
                    .parse::<u64>()
                    .map_err(|_| Error::argument(format!("`{s}` is not a valid account id")))?;
                let realm = realm
                    .parse::<u64>()
                    .map_err(|_| Error::argument(format!("`{s}` is not a valid account id")))?;
                let alias: EvmAddress = last.parse()?;
                return Ok(AccountId::from_evm_address(shard, realm, alias));
            }
        }
        let (shard, realm, num, checksum) = parse_triple(s, "account")?;
        Ok(AccountId { shard, realm, num, alias: None, checksum })
    }
}

impl WireEncode for AccountId {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u64(self.shard);
        w.put_u64(self.realm);
        w.put_u64(self.num);
        w.put_option(self.alias.as_ref(), |w, a| w.put_bytes(a.as_bytes()));
    }
}

impl WireDecode for AccountId {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let shard = r.read_u64("account shard")?;
        let realm = r.read_u64("account realm")?;
        let num = r.read_u64("account num")?;
        let alias = r.read_option("account alias", |r| {
            let bytes = r.read_bytes("account alias")?;
            EvmAddress::try_from_slice(&bytes)
                .map_err(|_| CodecError::MalformedField("account alias"))
        })?;
        Ok(AccountId { shard, realm, num, alias, checksum: None })
    }
}

impl serde::Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use serde::Deserialize;
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
