//! Account balance lookup. Free: no payment, no cost probe.

use crate::error::{CodecError, Error, Result};
use crate::hbar::Hbar;
use crate::ids::{AccountId, LedgerId, TokenId};
use crate::query::{tag, Query, QueryData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Looks up an account's hbar and token balances.
pub type AccountBalanceQuery = Query<AccountBalanceQueryData>;

#[derive(Debug, Clone, Default)]
pub struct AccountBalanceQueryData {
    account_id: Option<AccountId>,
}

/// The answer: hbars plus whatever tokens the account holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    /// The queried account.
    pub account_id: AccountId,
    /// Spendable hbar balance.
    pub hbars: Hbar,
    /// Token holdings as `(token, amount)` pairs.
    pub token_balances: Vec<(TokenId, u64)>,
}

impl WireEncode for AccountBalance {
    fn encode(&self, w: &mut WireWriter) {
        self.account_id.encode(w);
        w.put_i64(self.hbars.to_tinybars());
        w.put_seq(&self.token_balances, |w, (token, amount)| {
            token.encode(w);
            w.put_u64(*amount);
        });
    }
}

impl WireDecode for AccountBalance {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(AccountBalance {
            account_id: AccountId::decode(r)?,
            hbars: Hbar::from_tinybars(r.read_i64("hbar balance")?),
            token_balances: r.read_seq("token balances", |r| {
                Ok((TokenId::decode(r)?, r.read_u64("token amount")?))
            })?,
        })
    }
}

impl QueryData for AccountBalanceQueryData {
    type Response = AccountBalance;

    fn service(&self) -> Service {
        Service::Crypto
    }

    fn variant_tag(&self) -> u8 {
        tag::ACCOUNT_BALANCE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.account_id.as_ref(), |w, id| id.encode(w));
    }

    fn decode_response(&self, body: &[u8]) -> Result<Self::Response> {
        Ok(AccountBalance::from_wire_bytes(body)?)
    }

    fn is_free(&self) -> bool {
        true
    }

    fn validate(&self) -> Result<()> {
        if self.account_id.is_none() {
            return Err(Error::argument("account balance query requires an account id"));
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

impl AccountBalanceQuery {
    pub fn new() -> Self {
        Query::default()
    }

    /// The account to look up.
    pub fn set_account_id(&mut self, id: AccountId) -> &mut Self {
        self.data_mut().account_id = Some(id);
        self
    }

    /// The configured target account.
    pub fn account_id(&self) -> Option<AccountId> {
        self.data().account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_an_account_id() {
        assert!(AccountBalanceQueryData::default().validate().is_err());
    }

    #[test]
    fn is_free() {
        assert!(AccountBalanceQueryData::default().is_free());
    }

    #[test]
    fn response_round_trips() {
        let balance = AccountBalance {
            account_id: AccountId::new(1001),
            hbars: Hbar::from_tinybars(123_456_789),
            token_balances: vec![(TokenId::new(2002), 500), (TokenId::new(2003), 0)],
        };
        let bytes = balance.to_wire_bytes();
        assert_eq!(AccountBalance::from_wire_bytes(&bytes).unwrap(), balance);
    }
}
