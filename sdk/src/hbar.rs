//! # Hbar
//!
//! The Meridian native currency, stored as a signed 64-bit count of
//! *tinybars* — the smallest on-ledger unit. All unit conversions are pure
//! integer arithmetic; anything that would overflow fails closed rather than
//! silently wrapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Denominations of the Meridian currency.
///
/// The ledger only ever sees tinybars; the rest exist for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HbarUnit {
    /// The atomic unit. 1 hbar = 100,000,000 tinybar.
    Tinybar,
    /// 100 tinybar.
    Microbar,
    /// 100,000 tinybar.
    Millibar,
    /// The display unit. 100,000,000 tinybar.
    Hbar,
    /// 1,000 hbar.
    Kilobar,
    /// 1,000,000 hbar.
    Megabar,
    /// 1,000,000,000 hbar.
    Gigabar,
}

impl HbarUnit {
    /// Number of tinybars in one of this unit.
    pub const fn tinybars(self) -> i64 {
        match self {
            HbarUnit::Tinybar => 1,
            HbarUnit::Microbar => 100,
            HbarUnit::Millibar => 100_000,
            HbarUnit::Hbar => 100_000_000,
            HbarUnit::Kilobar => 100_000_000_000,
            HbarUnit::Megabar => 100_000_000_000_000,
            HbarUnit::Gigabar => 100_000_000_000_000_000,
        }
    }

    /// Conventional symbol for the unit.
    pub const fn symbol(self) -> &'static str {
        match self {
            HbarUnit::Tinybar => "tℏ",
            HbarUnit::Microbar => "μℏ",
            HbarUnit::Millibar => "mℏ",
            HbarUnit::Hbar => "ℏ",
            HbarUnit::Kilobar => "kℏ",
            HbarUnit::Megabar => "Mℏ",
            HbarUnit::Gigabar => "Gℏ",
        }
    }
}

impl fmt::Display for HbarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A quantity of the native currency.
///
/// Internally an `i64` tinybar count. Negative values are legal — debits in
/// a transfer list are negative by construction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hbar(i64);

impl Hbar {
    /// Zero hbar.
    pub const ZERO: Hbar = Hbar(0);

    /// The largest representable amount.
    pub const MAX: Hbar = Hbar(i64::MAX);

    /// Constructs from a raw tinybar count.
    pub const fn from_tinybars(tinybars: i64) -> Self {
        Hbar(tinybars)
    }

    /// Constructs from a whole number of a given unit.
    ///
    /// Fails closed on overflow: `Hbar::from_unit(i64::MAX, Gigabar)` is an
    /// argument error, not a wrapped number.
    pub fn from_unit(amount: i64, unit: HbarUnit) -> Result<Self, Error> {
        amount
            .checked_mul(unit.tinybars())
            .map(Hbar)
            .ok_or_else(|| Error::argument(format!("{amount} {unit} overflows tinybar range")))
    }

    /// Constructs from a whole hbar count. Fails closed on overflow.
    pub fn new(hbars: i64) -> Result<Self, Error> {
        Self::from_unit(hbars, HbarUnit::Hbar)
    }

    /// The raw tinybar count.
    pub const fn to_tinybars(self) -> i64 {
        self.0
    }

    /// Converts to a (possibly truncating) whole count of `unit`.
    pub const fn to_unit(self, unit: HbarUnit) -> i64 {
        self.0 / unit.tinybars()
    }

    /// `true` when the amount is negative.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// The arithmetic negation. Saturates at the extremes.
    pub const fn negated(self) -> Self {
        Hbar(self.0.saturating_neg())
    }

    /// Checked addition; fails closed on overflow.
    pub fn checked_add(self, other: Hbar) -> Result<Self, Error> {
        self.0
            .checked_add(other.0)
            .map(Hbar)
            .ok_or_else(|| Error::argument("hbar addition overflows".to_string()))
    }
}

impl fmt::Display for Hbar {
    /// Whole-hbar amounts display in hbar (`"2 ℏ"`), fractional amounts in
    /// tinybar (`"150 tℏ"`) so no precision is ever lost in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_hbar = HbarUnit::Hbar.tinybars();
        if self.0 % per_hbar == 0 {
            write!(f, "{} {}", self.0 / per_hbar, HbarUnit::Hbar)
        } else {
            write!(f, "{} {}", self.0, HbarUnit::Tinybar)
        }
    }
}

impl FromStr for Hbar {
    type Err = Error;

    /// Parses `"5"` (whole hbar) or `"5 tℏ"` / `"5 ℏ"` / `"5 mℏ"` forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, unit) = match s.split_once(char::is_whitespace) {
            None => (s, HbarUnit::Hbar),
            Some((n, u)) => {
                let unit = match u.trim() {
                    "tℏ" => HbarUnit::Tinybar,
                    "μℏ" => HbarUnit::Microbar,
                    "mℏ" => HbarUnit::Millibar,
                    "ℏ" => HbarUnit::Hbar,
                    "kℏ" => HbarUnit::Kilobar,
                    "Mℏ" => HbarUnit::Megabar,
                    "Gℏ" => HbarUnit::Gigabar,
                    other => return Err(Error::argument(format!("unknown hbar unit `{other}`"))),
                };
                (n, unit)
            }
        };
        let amount: i64 = number
            .parse()
            .map_err(|_| Error::argument(format!("`{number}` is not a whole hbar amount")))?;
        Hbar::from_unit(amount, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions_are_exact() {
        let two = Hbar::new(2).unwrap();
        assert_eq!(two.to_tinybars(), 200_000_000);
        assert_eq!(two.to_unit(HbarUnit::Millibar), 2_000);
        assert_eq!(two.to_unit(HbarUnit::Tinybar), 200_000_000);
    }

    #[test]
    fn overflow_fails_closed() {
        assert!(Hbar::from_unit(i64::MAX, HbarUnit::Gigabar).is_err());
        assert!(Hbar::from_unit(i64::MAX / 2, HbarUnit::Hbar).is_err());
        assert!(Hbar::MAX.checked_add(Hbar::from_tinybars(1)).is_err());
    }

    #[test]
    fn negative_amounts_are_legal() {
        let debit = Hbar::new(-10).unwrap();
        assert!(debit.is_negative());
        assert_eq!(debit.negated(), Hbar::new(10).unwrap());
    }

    #[test]
    fn display_picks_lossless_unit() {
        assert_eq!(Hbar::new(3).unwrap().to_string(), "3 ℏ");
        assert_eq!(Hbar::from_tinybars(150).to_string(), "150 tℏ");
        assert_eq!(Hbar::ZERO.to_string(), "0 ℏ");
    }

    #[test]
    fn parse_round_trip() {
        assert_eq!("5".parse::<Hbar>().unwrap(), Hbar::new(5).unwrap());
        assert_eq!(
            "250 tℏ".parse::<Hbar>().unwrap(),
            Hbar::from_tinybars(250)
        );
        assert!("five".parse::<Hbar>().is_err());
        assert!("5 parsecs".parse::<Hbar>().is_err());
    }

    #[test]
    fn ordering_follows_tinybars() {
        assert!(Hbar::from_tinybars(1) < Hbar::new(1).unwrap());
        assert!(Hbar::new(-1).unwrap() < Hbar::ZERO);
    }
}
