//! Full account metadata lookup. Paid.

use std::time::Duration;

use crate::crypto::Key;
use crate::error::{CodecError, Error, Result};
use crate::hbar::Hbar;
use crate::ids::{AccountId, EvmAddress, LedgerId};
use crate::query::{tag, Query, QueryData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Looks up everything the ledger knows about an account.
pub type AccountInfoQuery = Query<AccountInfoQueryData>;

#[derive(Debug, Clone, Default)]
pub struct AccountInfoQueryData {
    account_id: Option<AccountId>,
}

/// The answer: the account's on-ledger state.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    /// The queried account.
    pub account_id: AccountId,
    /// The key controlling the account.
    pub key: Key,
    /// Current hbar balance.
    pub balance: Hbar,
    /// Whether incoming transfers need this account's signature.
    pub receiver_signature_required: bool,
    /// Auto-renew interval.
    pub auto_renew_period: Duration,
    /// The account's memo.
    pub account_memo: String,
    /// EVM address alias, when one exists.
    pub alias: Option<EvmAddress>,
}

impl WireEncode for AccountInfo {
    fn encode(&self, w: &mut WireWriter) {
        self.account_id.encode(w);
        self.key.encode(w);
        w.put_i64(self.balance.to_tinybars());
        w.put_bool(self.receiver_signature_required);
        w.put_u64(self.auto_renew_period.as_secs());
        w.put_str(&self.account_memo);
        w.put_option(self.alias.as_ref(), |w, alias| w.put_bytes(alias.as_bytes()));
    }
}

impl WireDecode for AccountInfo {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        let account_id = AccountId::decode(r)?;
        let key = Key::decode(r)?;
        let balance = Hbar::from_tinybars(r.read_i64("account balance")?);
        let receiver_signature_required = r.read_bool("receiver signature flag")?;
        let auto_renew_period = Duration::from_secs(r.read_u64("auto renew period")?);
        let account_memo = r.read_str("account memo")?;
        let alias = r
            .read_option("alias", |r| r.read_bytes("alias bytes"))?
            .map(|b| EvmAddress::try_from_slice(&b).map_err(|_| CodecError::MalformedField("alias")))
            .transpose()?;
        Ok(AccountInfo {
            account_id,
            key,
            balance,
            receiver_signature_required,
            auto_renew_period,
            account_memo,
            alias,
        })
    }
}

impl QueryData for AccountInfoQueryData {
    type Response = AccountInfo;

    fn service(&self) -> Service {
        Service::Crypto
    }

    fn variant_tag(&self) -> u8 {
        tag::ACCOUNT_INFO
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.account_id.as_ref(), |w, id| id.encode(w));
    }

    fn decode_response(&self, body: &[u8]) -> Result<Self::Response> {
        Ok(AccountInfo::from_wire_bytes(body)?)
    }

    fn validate(&self) -> Result<()> {
        if self.account_id.is_none() {
            return Err(Error::argument("account info query requires an account id"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.account_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl AccountInfoQuery {
    pub fn new() -> Self {
        Query::default()
    }

    /// The account to look up.
    pub fn set_account_id(&mut self, id: AccountId) -> &mut Self {
        self.data_mut().account_id = Some(id);
        self
    }
}
