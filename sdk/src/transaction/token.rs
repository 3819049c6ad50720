//! Token freeze / unfreeze: blocking and unblocking one account's use of
//! one token.

use crate::error::{CodecError, Error, Result};
use crate::ids::{AccountId, LedgerId, TokenId};
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Freezes an account's ability to send or receive a token.
pub type TokenFreezeTransaction = Transaction<TokenFreezeTransactionData>;

/// Reverses a token freeze.
pub type TokenUnfreezeTransaction = Transaction<TokenUnfreezeTransactionData>;

macro_rules! token_account_pair {
    ($data:ident, $variant_tag:expr, $what:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $data {
            token_id: Option<TokenId>,
            account_id: Option<AccountId>,
        }

        impl TransactionData for $data {
            fn service(&self) -> Service {
                Service::Token
            }

            fn variant_tag(&self) -> u8 {
                $variant_tag
            }

            fn encode_fields(&self, w: &mut WireWriter) {
                w.put_option(self.token_id.as_ref(), |w, id| id.encode(w));
                w.put_option(self.account_id.as_ref(), |w, id| id.encode(w));
            }

            fn decode_for_tag(
                tag_byte: u8,
                r: &mut WireReader<'_>,
            ) -> std::result::Result<Self, CodecError> {
                if tag_byte != $variant_tag {
                    return Err(CodecError::UnknownTag {
                        kind: "transaction variant",
                        tag: tag_byte,
                    });
                }
                let token_id = r.read_option("token id", TokenId::decode)?;
                let account_id = r.read_option("account id", AccountId::decode)?;
                Ok($data { token_id, account_id })
            }

            fn validate(&self) -> Result<()> {
                if self.token_id.is_none() {
                    return Err(Error::argument(concat!($what, " requires a token id")));
                }
                if self.account_id.is_none() {
                    return Err(Error::argument(concat!($what, " requires an account id")));
                }
                Ok(())
            }

            fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
                if let Some(id) = &self.token_id {
                    id.validate_checksum(ledger_id)?;
                }
                if let Some(id) = &self.account_id {
                    id.validate_checksum(ledger_id)?;
                }
                Ok(())
            }
        }

        impl Transaction<$data> {
            pub fn new() -> Self {
                Transaction::default()
            }

            /// The token being (un)frozen.
            pub fn set_token_id(&mut self, id: TokenId) -> Result<&mut Self> {
                self.data_mut()?.token_id = Some(id);
                Ok(self)
            }

            /// The account being (un)frozen.
            pub fn set_account_id(&mut self, id: AccountId) -> Result<&mut Self> {
                self.data_mut()?.account_id = Some(id);
                Ok(self)
            }

            pub fn token_id(&self) -> Option<TokenId> {
                self.data().token_id
            }

            pub fn account_id(&self) -> Option<AccountId> {
                self.data().account_id
            }
        }
    };
}

token_account_pair!(TokenFreezeTransactionData, tag::TOKEN_FREEZE, "token freeze");
token_account_pair!(TokenUnfreezeTransactionData, tag::TOKEN_UNFREEZE, "token unfreeze");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_and_unfreeze_carry_distinct_tags() {
        let freeze = TokenFreezeTransactionData::default();
        let unfreeze = TokenUnfreezeTransactionData::default();
        assert_ne!(freeze.variant_tag(), unfreeze.variant_tag());
    }

    #[test]
    fn unfreeze_decoder_rejects_freeze_tag() {
        let mut tx = TokenFreezeTransaction::new();
        tx.set_token_id(TokenId::new(100)).unwrap();
        tx.set_account_id(AccountId::new(7)).unwrap();
        let mut w = WireWriter::new();
        tx.data().encode_fields(&mut w);
        let bytes = w.finish();

        let mut r = WireReader::new(&bytes);
        assert!(TokenUnfreezeTransactionData::decode_for_tag(tag::TOKEN_FREEZE, &mut r).is_err());
    }

    #[test]
    fn validation_requires_both_ids() {
        let mut data = TokenFreezeTransactionData::default();
        assert!(data.validate().is_err());
        data.token_id = Some(TokenId::new(100));
        assert!(data.validate().is_err());
        data.account_id = Some(AccountId::new(7));
        data.validate().unwrap();
    }

    #[test]
    fn fields_round_trip() {
        let mut tx = TokenUnfreezeTransaction::new();
        tx.set_token_id(TokenId::new(200)).unwrap();
        tx.set_account_id(AccountId::new(9)).unwrap();

        let mut w = WireWriter::new();
        tx.data().encode_fields(&mut w);
        let bytes = w.finish();
        let mut r = WireReader::new(&bytes);
        let decoded =
            TokenUnfreezeTransactionData::decode_for_tag(tag::TOKEN_UNFREEZE, &mut r).unwrap();
        assert_eq!(&decoded, tx.data());
    }
}
