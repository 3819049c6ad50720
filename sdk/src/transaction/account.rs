//! Account lifecycle transactions: create, delete, and allowance removal.

use std::time::Duration;

use crate::crypto::Key;
use crate::error::{CodecError, Error, Result};
use crate::hbar::Hbar;
use crate::ids::{AccountId, EvmAddress, LedgerId, TokenId};
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

const DEFAULT_AUTO_RENEW_PERIOD: Duration = Duration::from_secs(90 * 24 * 60 * 60);

// ---------------------------------------------------------------------------
// AccountCreate
// ---------------------------------------------------------------------------

/// Creates a new account.
pub type AccountCreateTransaction = Transaction<AccountCreateTransactionData>;

#[derive(Debug, Clone, PartialEq)]
pub struct AccountCreateTransactionData {
    key: Option<Key>,
    initial_balance: Hbar,
    receiver_signature_required: bool,
    auto_renew_period: Duration,
    account_memo: String,
    alias: Option<EvmAddress>,
}

impl Default for AccountCreateTransactionData {
    fn default() -> Self {
        AccountCreateTransactionData {
            key: None,
            initial_balance: Hbar::ZERO,
            receiver_signature_required: false,
            auto_renew_period: DEFAULT_AUTO_RENEW_PERIOD,
            account_memo: String::new(),
            alias: None,
        }
    }
}

impl TransactionData for AccountCreateTransactionData {
    fn service(&self) -> Service {
        Service::Crypto
    }

    fn variant_tag(&self) -> u8 {
        tag::ACCOUNT_CREATE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.key.as_ref(), |w, key| key.encode(w));
        w.put_i64(self.initial_balance.to_tinybars());
        w.put_bool(self.receiver_signature_required);
        w.put_u64(self.auto_renew_period.as_secs());
        w.put_str(&self.account_memo);
        w.put_option(self.alias.as_ref(), |w, alias| w.put_bytes(alias.as_bytes()));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::ACCOUNT_CREATE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let key = r.read_option("account key", Key::decode)?;
        let initial_balance = Hbar::from_tinybars(r.read_i64("initial balance")?);
        let receiver_signature_required = r.read_bool("receiver signature required")?;
        let auto_renew_period = Duration::from_secs(r.read_u64("auto renew period")?);
        let account_memo = r.read_str("account memo")?;
        let alias = r
            .read_option("alias", |r| r.read_bytes("alias bytes"))?
            .map(|b| EvmAddress::try_from_slice(&b).map_err(|_| CodecError::MalformedField("alias")))
            .transpose()?;
        Ok(AccountCreateTransactionData {
            key,
            initial_balance,
            receiver_signature_required,
            auto_renew_period,
            account_memo,
            alias,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.key.is_none() && self.alias.is_none() {
            return Err(Error::argument("account create requires a key or an alias"));
        }
        if self.initial_balance.is_negative() {
            return Err(Error::argument("initial balance cannot be negative"));
        }
        Ok(())
    }
}

impl AccountCreateTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The key controlling the new account.
    pub fn set_key(&mut self, key: Key) -> Result<&mut Self> {
        self.data_mut()?.key = Some(key);
        Ok(self)
    }

    /// Hbar transferred into the account at creation.
    pub fn set_initial_balance(&mut self, balance: Hbar) -> Result<&mut Self> {
        self.data_mut()?.initial_balance = balance;
        Ok(self)
    }

    /// Whether incoming transfers require the account's signature.
    pub fn set_receiver_signature_required(&mut self, required: bool) -> Result<&mut Self> {
        self.data_mut()?.receiver_signature_required = required;
        Ok(self)
    }

    /// The auto-renew period (default 90 days).
    pub fn set_auto_renew_period(&mut self, period: Duration) -> Result<&mut Self> {
        self.data_mut()?.auto_renew_period = period;
        Ok(self)
    }

    /// The account's own memo (distinct from the transaction memo).
    pub fn set_account_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.data_mut()?.account_memo = memo.into();
        Ok(self)
    }

    /// An EVM address alias for the account.
    pub fn set_alias(&mut self, alias: EvmAddress) -> Result<&mut Self> {
        self.data_mut()?.alias = Some(alias);
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// AccountDelete
// ---------------------------------------------------------------------------

/// Deletes an account, sweeping its balance to another.
pub type AccountDeleteTransaction = Transaction<AccountDeleteTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDeleteTransactionData {
    account_id: Option<AccountId>,
    transfer_account_id: Option<AccountId>,
}

impl TransactionData for AccountDeleteTransactionData {
    fn service(&self) -> Service {
        Service::Crypto
    }

    fn variant_tag(&self) -> u8 {
        tag::ACCOUNT_DELETE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.account_id.as_ref(), |w, id| id.encode(w));
        w.put_option(self.transfer_account_id.as_ref(), |w, id| id.encode(w));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::ACCOUNT_DELETE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let account_id = r.read_option("account id", AccountId::decode)?;
        let transfer_account_id = r.read_option("transfer account id", AccountId::decode)?;
        Ok(AccountDeleteTransactionData { account_id, transfer_account_id })
    }

    fn validate(&self) -> Result<()> {
        if self.account_id.is_none() {
            return Err(Error::argument("account delete requires an account id"));
        }
        if self.transfer_account_id.is_none() {
            return Err(Error::argument("account delete requires a transfer account id"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.account_id {
            id.validate_checksum(ledger_id)?;
        }
        if let Some(id) = &self.transfer_account_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl AccountDeleteTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The account being deleted.
    pub fn set_account_id(&mut self, id: AccountId) -> Result<&mut Self> {
        self.data_mut()?.account_id = Some(id);
        Ok(self)
    }

    /// Where the deleted account's remaining balance goes.
    pub fn set_transfer_account_id(&mut self, id: AccountId) -> Result<&mut Self> {
        self.data_mut()?.transfer_account_id = Some(id);
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// AccountAllowanceDelete
// ---------------------------------------------------------------------------

/// Removes previously granted NFT allowances.
pub type AccountAllowanceDeleteTransaction = Transaction<AccountAllowanceDeleteTransactionData>;

/// One allowance removal: all the listed serials of one token, for one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftRemoveAllowance {
    pub token_id: TokenId,
    pub owner: AccountId,
    pub serials: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountAllowanceDeleteTransactionData {
    nft_allowances: Vec<NftRemoveAllowance>,
}

impl AccountAllowanceDeleteTransactionData {
    /// The pending removals.
    pub fn nft_allowances(&self) -> &[NftRemoveAllowance] {
        &self.nft_allowances
    }
}

impl TransactionData for AccountAllowanceDeleteTransactionData {
    fn service(&self) -> Service {
        Service::Crypto
    }

    fn variant_tag(&self) -> u8 {
        tag::ACCOUNT_ALLOWANCE_DELETE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_seq(&self.nft_allowances, |w, a| {
            a.token_id.encode(w);
            a.owner.encode(w);
            w.put_seq(&a.serials, |w, s| w.put_u64(*s));
        });
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::ACCOUNT_ALLOWANCE_DELETE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let nft_allowances = r.read_seq("nft allowances", |r| {
            let token_id = TokenId::decode(r)?;
            let owner = AccountId::decode(r)?;
            let serials = r.read_seq("serials", |r| r.read_u64("serial"))?;
            Ok(NftRemoveAllowance { token_id, owner, serials })
        })?;
        Ok(AccountAllowanceDeleteTransactionData { nft_allowances })
    }

    fn validate(&self) -> Result<()> {
        if self.nft_allowances.is_empty() {
            return Err(Error::argument("allowance delete requires at least one allowance"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        for allowance in &self.nft_allowances {
            allowance.token_id.validate_checksum(ledger_id)?;
            allowance.owner.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl AccountAllowanceDeleteTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// Revokes the allowance over the listed serials of `token_id` granted
    /// by `owner`.
    pub fn delete_all_token_nft_allowances(
        &mut self,
        token_id: TokenId,
        owner: AccountId,
        serials: Vec<u64>,
    ) -> Result<&mut Self> {
        self.data_mut()?
            .nft_allowances
            .push(NftRemoveAllowance { token_id, owner, serials });
        Ok(self)
    }

    /// The pending removals.
    pub fn nft_allowances(&self) -> &[NftRemoveAllowance] {
        &self.data().nft_allowances
    }
}
