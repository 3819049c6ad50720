//! Value transfers: hbar, fungible tokens, and NFTs in one transaction.
//!
//! Entries net as they are added: two adjustments for the same
//! `(account, approved)` pair merge, and a pair whose net adjustment reaches
//! zero disappears from the list entirely. The ledger sees only the netted
//! form.

use crate::error::{CodecError, Error, Result};
use crate::hbar::Hbar;
use crate::ids::{AccountId, LedgerId, TokenId};
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Moves hbar, tokens, and NFTs between accounts atomically.
pub type TransferTransaction = Transaction<TransferTransactionData>;

/// One netted hbar adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HbarTransfer {
    /// The adjusted account.
    pub account_id: AccountId,
    /// Signed adjustment; the whole list sums to zero.
    pub amount: Hbar,
    /// Whether this spends an approved allowance.
    pub approved: bool,
}

/// One netted fungible-token adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub token_id: TokenId,
    pub account_id: AccountId,
    /// Signed adjustment in the token's smallest denomination.
    pub amount: i64,
    pub approved: bool,
    /// When set, the ledger rejects the transfer if the token's actual
    /// decimals differ.
    pub expected_decimals: Option<u32>,
}

/// One NFT changing hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NftTransfer {
    pub token_id: TokenId,
    pub serial: u64,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub approved: bool,
}

/// The transfer lists, netted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferTransactionData {
    hbar_transfers: Vec<HbarTransfer>,
    token_transfers: Vec<TokenTransfer>,
    nft_transfers: Vec<NftTransfer>,
}

impl TransferTransactionData {
    fn add_hbar(&mut self, account_id: AccountId, amount: Hbar, approved: bool) -> Result<()> {
        if let Some(existing) = self
            .hbar_transfers
            .iter_mut()
            .find(|t| t.account_id == account_id && t.approved == approved)
        {
            existing.amount = existing.amount.checked_add(amount)?;
            if existing.amount == Hbar::ZERO {
                self.hbar_transfers
                    .retain(|t| !(t.account_id == account_id && t.approved == approved));
            }
            return Ok(());
        }
        if amount != Hbar::ZERO {
            self.hbar_transfers.push(HbarTransfer { account_id, amount, approved });
        }
        Ok(())
    }

    fn add_token(
        &mut self,
        token_id: TokenId,
        account_id: AccountId,
        amount: i64,
        approved: bool,
        expected_decimals: Option<u32>,
    ) -> Result<()> {
        // All entries for one token must agree on expected decimals.
        if let Some(decimals) = expected_decimals {
            let conflict = self.token_transfers.iter().any(|t| {
                t.token_id == token_id
                    && t.expected_decimals.is_some_and(|d| d != decimals)
            });
            if conflict {
                return Err(Error::argument(format!(
                    "conflicting expected decimals for token {token_id}"
                )));
            }
        }

        if let Some(existing) = self.token_transfers.iter_mut().find(|t| {
            t.token_id == token_id && t.account_id == account_id && t.approved == approved
        }) {
            existing.amount = existing
                .amount
                .checked_add(amount)
                .ok_or_else(|| Error::argument("token transfer amount overflow"))?;
            if expected_decimals.is_some() {
                existing.expected_decimals = expected_decimals;
            }
            if existing.amount == 0 {
                self.token_transfers.retain(|t| {
                    !(t.token_id == token_id
                        && t.account_id == account_id
                        && t.approved == approved)
                });
            }
            return Ok(());
        }
        if amount != 0 {
            self.token_transfers.push(TokenTransfer {
                token_id,
                account_id,
                amount,
                approved,
                expected_decimals,
            });
        }
        Ok(())
    }

    /// The netted hbar list.
    pub fn hbar_transfers(&self) -> &[HbarTransfer] {
        &self.hbar_transfers
    }

    /// The netted fungible-token list.
    pub fn token_transfers(&self) -> &[TokenTransfer] {
        &self.token_transfers
    }

    /// The NFT list.
    pub fn nft_transfers(&self) -> &[NftTransfer] {
        &self.nft_transfers
    }
}

impl TransactionData for TransferTransactionData {
    fn service(&self) -> Service {
        Service::Crypto
    }

    fn variant_tag(&self) -> u8 {
        tag::TRANSFER
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_seq(&self.hbar_transfers, |w, t| {
            t.account_id.encode(w);
            w.put_i64(t.amount.to_tinybars());
            w.put_bool(t.approved);
        });
        w.put_seq(&self.token_transfers, |w, t| {
            t.token_id.encode(w);
            t.account_id.encode(w);
            w.put_i64(t.amount);
            w.put_bool(t.approved);
            w.put_option(t.expected_decimals.as_ref(), |w, d| w.put_u32(*d));
        });
        w.put_seq(&self.nft_transfers, |w, t| {
            t.token_id.encode(w);
            w.put_u64(t.serial);
            t.sender.encode(w);
            t.receiver.encode(w);
            w.put_bool(t.approved);
        });
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::TRANSFER {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let hbar_transfers = r.read_seq("hbar transfers", |r| {
            let account_id = AccountId::decode(r)?;
            let amount = Hbar::from_tinybars(r.read_i64("hbar amount")?);
            let approved = r.read_bool("approved")?;
            Ok(HbarTransfer { account_id, amount, approved })
        })?;
        let token_transfers = r.read_seq("token transfers", |r| {
            let token_id = TokenId::decode(r)?;
            let account_id = AccountId::decode(r)?;
            let amount = r.read_i64("token amount")?;
            let approved = r.read_bool("approved")?;
            let expected_decimals = r.read_option("expected decimals", |r| r.read_u32("decimals"))?;
            Ok(TokenTransfer { token_id, account_id, amount, approved, expected_decimals })
        })?;
        let nft_transfers = r.read_seq("nft transfers", |r| {
            let token_id = TokenId::decode(r)?;
            let serial = r.read_u64("nft serial")?;
            let sender = AccountId::decode(r)?;
            let receiver = AccountId::decode(r)?;
            let approved = r.read_bool("approved")?;
            Ok(NftTransfer { token_id, serial, sender, receiver, approved })
        })?;
        Ok(TransferTransactionData { hbar_transfers, token_transfers, nft_transfers })
    }

    fn validate(&self) -> Result<()> {
        if self.hbar_transfers.is_empty()
            && self.token_transfers.is_empty()
            && self.nft_transfers.is_empty()
        {
            return Err(Error::argument("transfer transaction has no transfers"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        for t in &self.hbar_transfers {
            t.account_id.validate_checksum(ledger_id)?;
        }
        for t in &self.token_transfers {
            t.token_id.validate_checksum(ledger_id)?;
            t.account_id.validate_checksum(ledger_id)?;
        }
        for t in &self.nft_transfers {
            t.token_id.validate_checksum(ledger_id)?;
            t.sender.validate_checksum(ledger_id)?;
            t.receiver.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl TransferTransaction {
    /// An empty transfer.
    pub fn new() -> Self {
        Transaction::default()
    }

    /// Adjusts `account_id` by `amount` (negative sends, positive receives).
    pub fn hbar_transfer(&mut self, account_id: AccountId, amount: Hbar) -> Result<&mut Self> {
        self.data_mut()?.add_hbar(account_id, amount, false)?;
        Ok(self)
    }

    /// Like [`Self::hbar_transfer`], spending an approved allowance.
    pub fn approved_hbar_transfer(
        &mut self,
        account_id: AccountId,
        amount: Hbar,
    ) -> Result<&mut Self> {
        self.data_mut()?.add_hbar(account_id, amount, true)?;
        Ok(self)
    }

    /// Adjusts a fungible-token balance.
    pub fn token_transfer(
        &mut self,
        token_id: TokenId,
        account_id: AccountId,
        amount: i64,
    ) -> Result<&mut Self> {
        self.data_mut()?.add_token(token_id, account_id, amount, false, None)?;
        Ok(self)
    }

    /// Token transfer that asserts the token's decimals.
    pub fn token_transfer_with_decimals(
        &mut self,
        token_id: TokenId,
        account_id: AccountId,
        amount: i64,
        expected_decimals: u32,
    ) -> Result<&mut Self> {
        self.data_mut()?
            .add_token(token_id, account_id, amount, false, Some(expected_decimals))?;
        Ok(self)
    }

    /// Token transfer spending an approved allowance.
    pub fn approved_token_transfer(
        &mut self,
        token_id: TokenId,
        account_id: AccountId,
        amount: i64,
    ) -> Result<&mut Self> {
        self.data_mut()?.add_token(token_id, account_id, amount, true, None)?;
        Ok(self)
    }

    /// Moves one NFT from `sender` to `receiver`.
    pub fn nft_transfer(
        &mut self,
        token_id: TokenId,
        serial: u64,
        sender: AccountId,
        receiver: AccountId,
    ) -> Result<&mut Self> {
        self.data_mut()?.nft_transfers.push(NftTransfer {
            token_id,
            serial,
            sender,
            receiver,
            approved: false,
        });
        Ok(self)
    }

    /// NFT transfer spending an approved allowance.
    pub fn approved_nft_transfer(
        &mut self,
        token_id: TokenId,
        serial: u64,
        sender: AccountId,
        receiver: AccountId,
    ) -> Result<&mut Self> {
        self.data_mut()?.nft_transfers.push(NftTransfer {
            token_id,
            serial,
            sender,
            receiver,
            approved: true,
        });
        Ok(self)
    }

    /// The netted hbar list.
    pub fn hbar_transfers(&self) -> &[HbarTransfer] {
        self.data().hbar_transfers()
    }

    /// The netted fungible-token list.
    pub fn token_transfers(&self) -> &[TokenTransfer] {
        self.data().token_transfers()
    }

    /// The NFT list.
    pub fn nft_transfers(&self) -> &[NftTransfer] {
        self.data().nft_transfers()
    }
}
