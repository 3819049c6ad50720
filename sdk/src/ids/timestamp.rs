//! Ledger timestamps: seconds + nanoseconds since the Unix epoch.
//!
//! The wire format is a signed 64-bit second count and a 32-bit nanosecond
//! remainder, matching what the ledger records at consensus. `chrono` is the
//! boundary type for callers; internally everything stays integral so
//! encodings are exact.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::CodecError;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

/// An instant on the ledger clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch. Signed: the ledger predates
    /// nothing, but arithmetic intermediate values can go negative.
    pub seconds: i64,
    /// Nanosecond remainder, `0..=999_999_999`.
    pub nanos: i32,
}

impl Timestamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// This instant shifted later by `d`.
    pub fn plus(self, d: Duration) -> Self {
        let mut seconds = self.seconds.saturating_add(d.as_secs() as i64);
        let mut nanos = self.nanos + d.subsec_nanos() as i32;
        if nanos >= 1_000_000_000 {
            nanos -= 1_000_000_000;
            seconds = seconds.saturating_add(1);
        }
        Timestamp { seconds, nanos }
    }

    /// This instant shifted earlier by `d`.
    pub fn minus(self, d: Duration) -> Self {
        let mut seconds = self.seconds.saturating_sub(d.as_secs() as i64);
        let mut nanos = self.nanos - d.subsec_nanos() as i32;
        if nanos < 0 {
            nanos += 1_000_000_000;
            seconds = seconds.saturating_sub(1);
        }
        Timestamp { seconds, nanos }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos() as i32,
        }
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        Utc.timestamp_opt(ts.seconds, ts.nanos.max(0) as u32)
            .single()
            .unwrap_or_default()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl WireEncode for Timestamp {
    fn encode(&self, w: &mut WireWriter) {
        w.put_i64(self.seconds);
        w.put_i32(self.nanos);
    }
}

impl WireDecode for Timestamp {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let seconds = r.read_i64("timestamp seconds")?;
        let nanos = r.read_i32("timestamp nanos")?;
        if !(0..1_000_000_000).contains(&nanos) {
            return Err(CodecError::MalformedField("timestamp nanos"));
        }
        Ok(Timestamp { seconds, nanos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_carries_nanos() {
        let ts = Timestamp { seconds: 10, nanos: 900_000_000 };
        let later = ts.plus(Duration::from_millis(200));
        assert_eq!(later, Timestamp { seconds: 11, nanos: 100_000_000 });
    }

    #[test]
    fn minus_borrows_nanos() {
        let ts = Timestamp { seconds: 10, nanos: 100_000_000 };
        let earlier = ts.minus(Duration::from_millis(200));
        assert_eq!(earlier, Timestamp { seconds: 9, nanos: 900_000_000 });
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Timestamp { seconds: 5, nanos: 999_999_999 };
        let b = Timestamp { seconds: 6, nanos: 0 };
        assert!(a < b);
    }

    #[test]
    fn display_pads_nanos() {
        let ts = Timestamp { seconds: 1_699_999_999, nanos: 42 };
        assert_eq!(ts.to_string(), "1699999999.000000042");
    }

    #[test]
    fn wire_round_trip() {
        let ts = Timestamp { seconds: 1_699_999_999, nanos: 123_456_789 };
        let bytes = ts.to_wire_bytes();
        assert_eq!(Timestamp::from_wire_bytes(&bytes).unwrap(), ts);
    }

    #[test]
    fn wire_rejects_out_of_range_nanos() {
        let mut w = WireWriter::new();
        w.put_i64(0);
        w.put_i32(1_000_000_000);
        assert!(Timestamp::from_wire_bytes(&w.finish()).is_err());
    }

    #[test]
    fn chrono_round_trip() {
        let now = Timestamp::now();
        let dt: DateTime<Utc> = now.into();
        let back: Timestamp = dt.into();
        assert_eq!(now, back);
    }
}
