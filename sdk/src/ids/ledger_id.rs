//! The ledger identifier: which Meridian network an id or client belongs to.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Identifies one ledger (network). The well-known networks use single-byte
/// ids; custom ledgers may use anything non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerId(Vec<u8>);

impl LedgerId {
    /// The production network.
    pub fn mainnet() -> Self {
        LedgerId(vec![0x00])
    }

    /// The stable test network.
    pub fn testnet() -> Self {
        LedgerId(vec![0x01])
    }

    /// The preview (bleeding-edge) test network.
    pub fn previewnet() -> Self {
        LedgerId(vec![0x02])
    }

    /// A ledger id from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        LedgerId(bytes)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [0x00] => f.write_str("mainnet"),
            [0x01] => f.write_str("testnet"),
            [0x02] => f.write_str("previewnet"),
            other => f.write_str(&hex::encode(other)),
        }
    }
}

impl FromStr for LedgerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::mainnet()),
            "testnet" => Ok(Self::testnet()),
            "previewnet" => Ok(Self::previewnet()),
            other => {
                let bytes = hex::decode(other)
                    .map_err(|_| Error::argument(format!("`{other}` is not a ledger id")))?;
                if bytes.is_empty() {
                    return Err(Error::argument("ledger id must not be empty"));
                }
                Ok(LedgerId(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_names_round_trip() {
        for name in ["mainnet", "testnet", "previewnet"] {
            let id: LedgerId = name.parse().unwrap();
            assert_eq!(id.to_string(), name);
        }
    }

    #[test]
    fn custom_ledger_displays_hex() {
        let id: LedgerId = "deadbeef".parse().unwrap();
        assert_eq!(id.as_bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(id.to_string(), "deadbeef");
    }

    #[test]
    fn empty_and_garbage_are_rejected() {
        assert!("".parse::<LedgerId>().is_err());
        assert!("zz".parse::<LedgerId>().is_err());
    }
}
