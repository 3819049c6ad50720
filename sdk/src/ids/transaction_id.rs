//! Transaction identifiers.
//!
//! A transaction id is `(payer, valid-start)` plus a nonce and a scheduled
//! flag. The pair must be unique per submission; the ledger uses it for
//! deduplication, receipt lookup, and chunk chaining. `valid-start` is
//! backdated by a small random amount at generation so a client whose clock
//! runs a few seconds fast does not mint ids the network considers to be
//! from the future.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::config::{TRANSACTION_ID_BACKDATE_MAX, TRANSACTION_ID_BACKDATE_MIN};
use crate::error::{CodecError, Error};
use crate::ids::entity_id::AccountId;
use crate::ids::timestamp::Timestamp;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

/// Uniquely identifies one transaction submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    /// The account paying the fee.
    pub account_id: AccountId,
    /// Instant from which the transaction's validity window runs.
    pub valid_start: Timestamp,
    /// Disambiguates internal child transactions; `None` on the wire is 0.
    pub nonce: Option<i32>,
    /// Set on the inner id of a scheduled transaction.
    pub scheduled: bool,
}

impl TransactionId {
    /// Generates a fresh id for `payer` with a jitter-backdated valid-start.
    pub fn generate(payer: AccountId) -> Self {
        let jitter_ms = rand::thread_rng().gen_range(
            TRANSACTION_ID_BACKDATE_MIN.as_millis() as u64
                ..=TRANSACTION_ID_BACKDATE_MAX.as_millis() as u64,
        );
        TransactionId {
            account_id: payer,
            valid_start: Timestamp::now().minus(Duration::from_millis(jitter_ms)),
            nonce: None,
            scheduled: false,
        }
    }

    /// An id with an explicit valid-start. Used by tests and by chunked
    /// transactions, which need strictly increasing starts.
    pub fn with_valid_start(payer: AccountId, valid_start: Timestamp) -> Self {
        TransactionId { account_id: payer, valid_start, nonce: None, scheduled: false }
    }
}

impl fmt::Display for TransactionId {
    /// `payer@seconds.nanos`, plus `?scheduled` and/or `/nonce` suffixes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)?;
        if self.scheduled {
            write!(f, "?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{nonce}")?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::argument(format!("`{s}` is not a valid transaction id"));

        let (rest, nonce) = match s.rsplit_once('/') {
            Some((rest, n)) => (rest, Some(n.parse::<i32>().map_err(|_| bad())?)),
            None => (s, None),
        };
        let (rest, scheduled) = match rest.strip_suffix("?scheduled") {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let (account, start) = rest.split_once('@').ok_or_else(bad)?;
        let account_id: AccountId = account.parse()?;
        let (secs, nanos) = start.split_once('.').ok_or_else(bad)?;
        let valid_start = Timestamp {
            seconds: secs.parse().map_err(|_| bad())?,
            nanos: nanos.parse().map_err(|_| bad())?,
        };
        Ok(TransactionId { account_id, valid_start, nonce, scheduled })
    }
}

impl WireEncode for TransactionId {
    fn encode(&self, w: &mut WireWriter) {
        self.account_id.encode(w);
        self.valid_start.encode(w);
        w.put_i32(self.nonce.unwrap_or(0));
        w.put_bool(self.scheduled);
    }
}

impl WireDecode for TransactionId {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let account_id = AccountId::decode(r)?;
        let valid_start = Timestamp::decode(r)?;
        let nonce = match r.read_i32("transaction nonce")? {
            0 => None,
            n => Some(n),
        };
        let scheduled = r.read_bool("scheduled flag")?;
        Ok(TransactionId { account_id, valid_start, nonce, scheduled })
    }
}
