//! What the network admits to after consensus.
//!
//! A receipt is the cheap, short-lived answer: the terminal status plus
//! whatever entity the transaction created. Receipts are free to query and
//! the network only retains them briefly; anything needing a durable audit
//! trail wants the record instead.

use crate::error::{CodecError, Error, Result};
use crate::ids::{
    AccountId, ContractId, FileId, ScheduleId, TokenId, TopicId, TransactionId,
};
use crate::wire::{Status, WireDecode, WireEncode, WireReader, WireWriter};

/// One half of the ledger's hbar/cent conversion pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate {
    /// Hbar side of the ratio.
    pub hbar_equivalent: i32,
    /// USD-cent side of the ratio.
    pub cent_equivalent: i32,
    /// Seconds-since-epoch at which this rate expires.
    pub expiration_seconds: u64,
}

impl ExchangeRate {
    /// The rate as cents per hbar.
    pub fn cents_per_hbar(&self) -> f64 {
        f64::from(self.cent_equivalent) / f64::from(self.hbar_equivalent)
    }
}

impl WireEncode for ExchangeRate {
    fn encode(&self, w: &mut WireWriter) {
        w.put_i32(self.hbar_equivalent);
        w.put_i32(self.cent_equivalent);
        w.put_u64(self.expiration_seconds);
    }
}

impl WireDecode for ExchangeRate {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(ExchangeRate {
            hbar_equivalent: r.read_i32("hbar equivalent")?,
            cent_equivalent: r.read_i32("cent equivalent")?,
            expiration_seconds: r.read_u64("rate expiration")?,
        })
    }
}

/// The post-consensus summary of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// The id this receipt answers for, when known to the caller.
    pub transaction_id: Option<TransactionId>,
    /// Terminal consensus status.
    pub status: Status,
    /// Account created, if the transaction created one.
    pub account_id: Option<AccountId>,
    /// File created, if any.
    pub file_id: Option<FileId>,
    /// Contract created, if any.
    pub contract_id: Option<ContractId>,
    /// Topic created, if any.
    pub topic_id: Option<TopicId>,
    /// Token created, if any.
    pub token_id: Option<TokenId>,
    /// Schedule created, if any.
    pub schedule_id: Option<ScheduleId>,
    /// Consensus sequence number of a submitted topic message.
    pub topic_sequence_number: u64,
    /// Running hash of the topic after the submitted message.
    pub topic_running_hash: Vec<u8>,
    /// NFT serial numbers minted by this transaction.
    pub serial_numbers: Vec<u64>,
    /// Active and next exchange rates at consensus time.
    pub exchange_rate: Option<ExchangeRate>,
    /// Next exchange rate, paired with [`Self::exchange_rate`].
    pub next_exchange_rate: Option<ExchangeRate>,
    /// Id of the inner transaction a schedule triggered.
    pub scheduled_transaction_id: Option<TransactionId>,
}

impl TransactionReceipt {
    /// Promotes a non-success status to [`Error::ReceiptStatus`].
    ///
    /// The transaction is committed either way; this is how "committed but
    /// failed" stops looking like success in a `?` chain.
    pub fn validate_status(&self) -> Result<&Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::ReceiptStatus {
                status: self.status,
                transaction_id: self.transaction_id,
            })
        }
    }
}

impl WireEncode for TransactionReceipt {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u32(self.status.code());
        w.put_option(self.account_id.as_ref(), |w, id| id.encode(w));
        w.put_option(self.file_id.as_ref(), |w, id| id.encode(w));
        w.put_option(self.contract_id.as_ref(), |w, id| id.encode(w));
        w.put_option(self.topic_id.as_ref(), |w, id| id.encode(w));
        w.put_option(self.token_id.as_ref(), |w, id| id.encode(w));
        w.put_option(self.schedule_id.as_ref(), |w, id| id.encode(w));
        w.put_u64(self.topic_sequence_number);
        w.put_bytes(&self.topic_running_hash);
        w.put_seq(&self.serial_numbers, |w, n| w.put_u64(*n));
        w.put_option(self.exchange_rate.as_ref(), |w, rate| rate.encode(w));
        w.put_option(self.next_exchange_rate.as_ref(), |w, rate| rate.encode(w));
        w.put_option(self.scheduled_transaction_id.as_ref(), |w, id| id.encode(w));
    }
}

impl WireDecode for TransactionReceipt {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(TransactionReceipt {
            // The wire form never carries the queried id; the receipt query
            // stamps it back in so errors can name the transaction.
            transaction_id: None,
            status: Status::from_code(r.read_u32("receipt status")?),
            account_id: r.read_option("created account", AccountId::decode)?,
            file_id: r.read_option("created file", FileId::decode)?,
            contract_id: r.read_option("created contract", ContractId::decode)?,
            topic_id: r.read_option("created topic", TopicId::decode)?,
            token_id: r.read_option("created token", TokenId::decode)?,
            schedule_id: r.read_option("created schedule", ScheduleId::decode)?,
            topic_sequence_number: r.read_u64("topic sequence number")?,
            topic_running_hash: r.read_bytes("topic running hash")?,
            serial_numbers: r.read_seq("serial numbers", |r| r.read_u64("serial"))?,
            exchange_rate: r.read_option("exchange rate", ExchangeRate::decode)?,
            next_exchange_rate: r.read_option("next exchange rate", ExchangeRate::decode)?,
            scheduled_transaction_id: r
                .read_option("scheduled transaction id", TransactionId::decode)?,
        })
    }
}

impl Default for TransactionReceipt {
    fn default() -> Self {
        TransactionReceipt {
            transaction_id: None,
            status: Status::Unknown,
            account_id: None,
            file_id: None,
            contract_id: None,
            topic_id: None,
            token_id: None,
            schedule_id: None,
            topic_sequence_number: 0,
            topic_running_hash: Vec::new(),
            serial_numbers: Vec::new(),
            exchange_rate: None,
            next_exchange_rate: None,
            scheduled_transaction_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_receipt() -> TransactionReceipt {
        TransactionReceipt {
            status: Status::Success,
            account_id: Some(AccountId::new(1001)),
            topic_sequence_number: 7,
            topic_running_hash: vec![0xAB; 48],
            serial_numbers: vec![1, 2, 3],
            exchange_rate: Some(ExchangeRate {
                hbar_equivalent: 30_000,
                cent_equivalent: 154_271,
                expiration_seconds: 1_766_000_000,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn validate_status_passes_success() {
        success_receipt().validate_status().unwrap();
    }

    #[test]
    fn validate_status_promotes_failure() {
        let receipt = TransactionReceipt {
            status: Status::InsufficientPayerBalance,
            transaction_id: Some(TransactionId::generate(AccountId::new(7))),
            ..Default::default()
        };
        let err = receipt.validate_status().unwrap_err();
        match err {
            Error::ReceiptStatus { status, transaction_id } => {
                assert_eq!(status, Status::InsufficientPayerBalance);
                assert!(transaction_id.is_some());
            }
            other => panic!("wrong error: {other}"),
        }
    }

    #[test]
    fn receipt_round_trips() {
        let receipt = success_receipt();
        let bytes = receipt.to_wire_bytes();
        let decoded = TransactionReceipt::from_wire_bytes(&bytes).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn unrecognized_status_survives_decoding() {
        let receipt = TransactionReceipt {
            status: Status::Unrecognized(40_404),
            ..Default::default()
        };
        let bytes = receipt.to_wire_bytes();
        let decoded = TransactionReceipt::from_wire_bytes(&bytes).unwrap();
        assert_eq!(decoded.status, Status::Unrecognized(40_404));
        assert!(decoded.validate_status().is_err());
    }

    #[test]
    fn exchange_rate_arithmetic() {
        let rate = ExchangeRate {
            hbar_equivalent: 30_000,
            cent_equivalent: 150_000,
            expiration_seconds: 0,
        };
        assert!((rate.cents_per_hbar() - 5.0).abs() < f64::EPSILON);
    }
}
