//! Scheduled transactions: lodge a transaction now, execute it once its
//! signature requirements are met (or at an expiration time).

use crate::crypto::Key;
use crate::error::{CodecError, Error, Result};
use crate::ids::{AccountId, LedgerId, Timestamp};
use crate::transaction::wrapped::SchedulableTransactionBody;
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Creates a schedule wrapping one future transaction.
pub type ScheduleCreateTransaction = Transaction<ScheduleCreateTransactionData>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleCreateTransactionData {
    scheduled: Option<Box<SchedulableTransactionBody>>,
    admin_key: Option<Key>,
    payer_account_id: Option<AccountId>,
    schedule_memo: String,
    expiration_time: Option<Timestamp>,
    wait_for_expiry: bool,
}

impl TransactionData for ScheduleCreateTransactionData {
    fn service(&self) -> Service {
        Service::Schedule
    }

    fn variant_tag(&self) -> u8 {
        tag::SCHEDULE_CREATE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.scheduled.as_deref(), |w, body| body.encode(w));
        w.put_option(self.admin_key.as_ref(), |w, k| k.encode(w));
        w.put_option(self.payer_account_id.as_ref(), |w, id| id.encode(w));
        w.put_str(&self.schedule_memo);
        w.put_option(self.expiration_time.as_ref(), |w, t| t.encode(w));
        w.put_bool(self.wait_for_expiry);
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::SCHEDULE_CREATE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let scheduled = r
            .read_option("scheduled body", SchedulableTransactionBody::decode)?
            .map(Box::new);
        let admin_key = r.read_option("admin key", Key::decode)?;
        let payer_account_id = r.read_option("payer account", AccountId::decode)?;
        let schedule_memo = r.read_str("schedule memo")?;
        let expiration_time = r.read_option("expiration time", Timestamp::decode)?;
        let wait_for_expiry = r.read_bool("wait for expiry")?;
        Ok(ScheduleCreateTransactionData {
            scheduled,
            admin_key,
            payer_account_id,
            schedule_memo,
            expiration_time,
            wait_for_expiry,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.scheduled.is_none() {
            return Err(Error::argument("schedule create requires a scheduled transaction"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.payer_account_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl ScheduleCreateTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The transaction to execute later, reduced to its schedulable body.
    pub fn set_scheduled_transaction<D>(&mut self, transaction: &Transaction<D>) -> Result<&mut Self>
    where
        D: TransactionData + Into<crate::transaction::AnyTransactionData>,
    {
        let body = SchedulableTransactionBody::from_transaction(transaction)?;
        self.data_mut()?.scheduled = Some(Box::new(body));
        Ok(self)
    }

    /// A pre-built schedulable body.
    pub fn set_scheduled_body(&mut self, body: SchedulableTransactionBody) -> Result<&mut Self> {
        self.data_mut()?.scheduled = Some(Box::new(body));
        Ok(self)
    }

    /// Key allowed to delete the schedule before execution.
    pub fn set_admin_key(&mut self, key: Key) -> Result<&mut Self> {
        self.data_mut()?.admin_key = Some(key);
        Ok(self)
    }

    /// Who pays for the scheduled transaction when it fires; defaults to
    /// the schedule's creator.
    pub fn set_payer_account_id(&mut self, id: AccountId) -> Result<&mut Self> {
        self.data_mut()?.payer_account_id = Some(id);
        Ok(self)
    }

    /// The schedule's memo.
    pub fn set_schedule_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.data_mut()?.schedule_memo = memo.into();
        Ok(self)
    }

    /// When the schedule gives up waiting for signatures.
    pub fn set_expiration_time(&mut self, time: Timestamp) -> Result<&mut Self> {
        self.data_mut()?.expiration_time = Some(time);
        Ok(self)
    }

    /// Execute at expiration rather than as soon as signatures suffice.
    pub fn set_wait_for_expiry(&mut self, wait: bool) -> Result<&mut Self> {
        self.data_mut()?.wait_for_expiry = wait;
        Ok(self)
    }

    /// The scheduled body, if set.
    pub fn scheduled_body(&self) -> Option<&SchedulableTransactionBody> {
        self.data().scheduled.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hbar::Hbar;
    use crate::transaction::TransferTransaction;

    #[test]
    fn requires_a_scheduled_transaction() {
        let data = ScheduleCreateTransactionData::default();
        assert!(data.validate().is_err());
    }

    #[test]
    fn wraps_a_transfer_and_round_trips() {
        let mut inner = TransferTransaction::new();
        inner
            .hbar_transfer(AccountId::new(7), Hbar::new(-1).unwrap())
            .unwrap()
            .hbar_transfer(AccountId::new(8), Hbar::new(1).unwrap())
            .unwrap();

        let mut tx = ScheduleCreateTransaction::new();
        tx.set_scheduled_transaction(&inner)
            .unwrap()
            .set_schedule_memo("payday")
            .unwrap()
            .set_wait_for_expiry(true)
            .unwrap();
        tx.data().validate().unwrap();

        let mut w = WireWriter::new();
        tx.data().encode_fields(&mut w);
        let bytes = w.finish();
        let mut r = WireReader::new(&bytes);
        let decoded =
            ScheduleCreateTransactionData::decode_for_tag(tag::SCHEDULE_CREATE, &mut r).unwrap();
        r.expect_end().unwrap();
        assert_eq!(&decoded, tx.data());
    }
}
