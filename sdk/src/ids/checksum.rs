//! Entity-id checksums.
//!
//! A checksum is five lowercase letters derived from the dotted id string
//! *and* the ledger id, so `0.0.123-vfmkw` is only valid on mainnet. The
//! construction is a pair of small weighted digit sums folded with the
//! ledger-id hash, reduced into base 26. Cheap to compute, catches
//! transposed digits and wrong-network copy/paste alike.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::ids::LedgerId;

const P3: u64 = 26 * 26 * 26;
const P5: u64 = 26 * 26 * 26 * 26 * 26;
const WEIGHT: u64 = 31;
const MULTIPLIER: u64 = 1_000_003;

/// Five-letter checksum over an entity id and a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 5]);

impl Checksum {
    /// Computes the checksum for a dotted entity address (e.g. `"0.0.123"`)
    /// on the given ledger.
    pub fn generate(ledger_id: &LedgerId, address: &str) -> Self {
        // Digits of the address, with '.' mapped into the 11th digit value.
        let digits: Vec<u64> = address
            .bytes()
            .map(|b| if b == b'.' { 10 } else { u64::from(b - b'0') })
            .collect();

        // Ledger id bytes padded with six zero bytes.
        let mut s = 0u64; // weighted digit sum, mod 26^3
        let mut s0 = 0u64; // even-position digit sum, mod 11
        let mut s1 = 0u64; // odd-position digit sum, mod 11
        for (i, &d) in digits.iter().enumerate() {
            s = (WEIGHT * s + d) % P3;
            if i % 2 == 0 {
                s0 = (s0 + d) % 11;
            } else {
                s1 = (s1 + d) % 11;
            }
        }

        let mut sh = 0u64; // ledger hash, mod 26^5
        for &b in ledger_id.as_bytes().iter().chain([0u8; 6].iter()) {
            sh = (WEIGHT * sh + u64::from(b)) % P5;
        }

        let len = address.len() as u64;
        let mut c = (((len % 5) * 11 + s0) * 11 + s1) % P5;
        c = (c * P3 + s + sh) % P5;
        c = (c * MULTIPLIER) % P5;

        let mut letters = [0u8; 5];
        for slot in letters.iter_mut().rev() {
            *slot = b'a' + (c % 26) as u8;
            c /= 26;
        }
        Checksum(letters)
    }

    /// The checksum as a `str`.
    pub fn as_str(&self) -> &str {
        // Construction only ever produces 'a'..='z'.
        std::str::from_utf8(&self.0).unwrap_or("?????")
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || !bytes.iter().all(|b| b.is_ascii_lowercase()) {
            return Err(Error::argument(format!(
                "`{s}` is not a checksum (expected 5 lowercase letters)"
            )));
        }
        let mut letters = [0u8; 5];
        letters.copy_from_slice(bytes);
        Ok(Checksum(letters))
    }
}
