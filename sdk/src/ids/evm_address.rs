//! 20-byte EVM-style addresses, used as account aliases and contract
//! addresses on the EVM-compatible surface of the ledger.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A 20-byte EVM address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmAddress([u8; 20]);

impl EvmAddress {
    /// Wraps raw address bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        EvmAddress(bytes)
    }

    /// Parses from a byte slice; must be exactly 20 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| Error::argument(format!("evm address must be 20 bytes, got {}", bytes.len())))?;
        Ok(EvmAddress(arr))
    }

    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for EvmAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_part)
            .map_err(|_| Error::argument(format!("`{s}` is not hex")))?;
        Self::try_from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_prefix() {
        let raw = "00112233445566778899aabbccddeeff00112233";
        let a: EvmAddress = raw.parse().unwrap();
        let b: EvmAddress = format!("0x{raw}").parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), format!("0x{raw}"));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!("0x1234".parse::<EvmAddress>().is_err());
        assert!(EvmAddress::try_from_slice(&[0u8; 19]).is_err());
        assert!(EvmAddress::try_from_slice(&[0u8; 21]).is_err());
    }
}
