//! The tagged union over every transaction variant.
//!
//! [`AnyTransactionData`] is how a transaction travels *as data*: parsed
//! back from bytes without knowing its variant up front, embedded in a
//! schedule, or inspected generically. [`SchedulableTransactionBody`] is the
//! reduced shape a schedule carries: variant fields plus fee and memo, with
//! no payer, no node, and no transaction id.

use crate::error::{CodecError, Error, Result};
use crate::hbar::Hbar;
use crate::ids::LedgerId;
use crate::transaction::account::{
    AccountAllowanceDeleteTransactionData, AccountCreateTransactionData,
    AccountDeleteTransactionData,
};
use crate::transaction::batch::BatchTransactionData;
use crate::transaction::contract::ContractExecuteTransactionData;
use crate::transaction::ethereum::EthereumTransactionData;
use crate::transaction::file::{FileAppendTransactionData, FileCreateTransactionData};
use crate::transaction::freeze::FreezeTransactionData;
use crate::transaction::schedule::ScheduleCreateTransactionData;
use crate::transaction::token::{TokenFreezeTransactionData, TokenUnfreezeTransactionData};
use crate::transaction::topic::{TopicCreateTransactionData, TopicMessageSubmitTransactionData};
use crate::transaction::transfer::TransferTransactionData;
use crate::transaction::{tag, ChunkInfo, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// A transaction whose variant is only known at runtime.
pub type AnyTransaction = Transaction<AnyTransactionData>;

macro_rules! any_transaction_data {
    ($( $variant:ident($data:ty) = $tag:path ),+ $(,)?) => {
        /// Every transaction variant, as one value.
        #[derive(Debug, Clone, PartialEq)]
        pub enum AnyTransactionData {
            $( $variant($data), )+
        }

        $(
            impl From<$data> for AnyTransactionData {
                fn from(data: $data) -> Self {
                    AnyTransactionData::$variant(data)
                }
            }
        )+

        impl TransactionData for AnyTransactionData {
            fn service(&self) -> Service {
                match self { $( AnyTransactionData::$variant(d) => d.service(), )+ }
            }

            fn variant_tag(&self) -> u8 {
                match self { $( AnyTransactionData::$variant(d) => d.variant_tag(), )+ }
            }

            fn encode_fields(&self, w: &mut WireWriter) {
                match self { $( AnyTransactionData::$variant(d) => d.encode_fields(w), )+ }
            }

            fn decode_for_tag(
                tag_byte: u8,
                r: &mut WireReader<'_>,
            ) -> std::result::Result<Self, CodecError> {
                match tag_byte {
                    $(
                        t if t == $tag => Ok(AnyTransactionData::$variant(
                            <$data>::decode_for_tag(tag_byte, r)?,
                        )),
                    )+
                    other => Err(CodecError::UnknownTag {
                        kind: "transaction variant",
                        tag: other,
                    }),
                }
            }

            fn validate(&self) -> Result<()> {
                match self { $( AnyTransactionData::$variant(d) => d.validate(), )+ }
            }

            fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
                match self {
                    $( AnyTransactionData::$variant(d) => d.validate_checksums(ledger_id), )+
                }
            }

            fn chunk_payload_len(&self) -> Option<usize> {
                match self { $( AnyTransactionData::$variant(d) => d.chunk_payload_len(), )+ }
            }

            fn for_chunk(&self, info: ChunkInfo, chunk_size: usize) -> Self {
                match self {
                    $(
                        AnyTransactionData::$variant(d) => {
                            AnyTransactionData::$variant(d.for_chunk(info, chunk_size))
                        }
                    )+
                }
            }

            fn finish_from_chunks(&mut self, tail: Vec<Self>) {
                match self {
                    $(
                        AnyTransactionData::$variant(d) => {
                            let tail = tail
                                .into_iter()
                                .filter_map(|part| match part {
                                    AnyTransactionData::$variant(p) => Some(p),
                                    // A mixed-variant chain is malformed;
                                    // foreign parts are dropped.
                                    _ => None,
                                })
                                .collect();
                            d.finish_from_chunks(tail);
                        }
                    )+
                }
            }
        }

        impl AnyTransactionData {
            /// Human-readable variant name, for logs and errors.
            pub fn variant_name(&self) -> &'static str {
                match self { $( AnyTransactionData::$variant(_) => stringify!($variant), )+ }
            }
        }
    };
}

any_transaction_data! {
    Transfer(TransferTransactionData) = tag::TRANSFER,
    AccountCreate(AccountCreateTransactionData) = tag::ACCOUNT_CREATE,
    AccountDelete(AccountDeleteTransactionData) = tag::ACCOUNT_DELETE,
    AccountAllowanceDelete(AccountAllowanceDeleteTransactionData) = tag::ACCOUNT_ALLOWANCE_DELETE,
    FileCreate(FileCreateTransactionData) = tag::FILE_CREATE,
    FileAppend(FileAppendTransactionData) = tag::FILE_APPEND,
    TopicCreate(TopicCreateTransactionData) = tag::TOPIC_CREATE,
    TopicMessageSubmit(TopicMessageSubmitTransactionData) = tag::TOPIC_MESSAGE_SUBMIT,
    TokenFreeze(TokenFreezeTransactionData) = tag::TOKEN_FREEZE,
    TokenUnfreeze(TokenUnfreezeTransactionData) = tag::TOKEN_UNFREEZE,
    ContractExecute(ContractExecuteTransactionData) = tag::CONTRACT_EXECUTE,
    Ethereum(EthereumTransactionData) = tag::ETHEREUM,
    Freeze(FreezeTransactionData) = tag::FREEZE,
    ScheduleCreate(ScheduleCreateTransactionData) = tag::SCHEDULE_CREATE,
    Batch(BatchTransactionData) = tag::BATCH,
}

impl AnyTransactionData {
    /// Whether this variant may be embedded in a schedule.
    ///
    /// Schedules and batches cannot nest, and a chunked variant is only
    /// schedulable as a single chunk (the schedule carries one body).
    pub fn is_schedulable(&self) -> bool {
        !matches!(
            self,
            AnyTransactionData::ScheduleCreate(_) | AnyTransactionData::Batch(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Schedulable body
// ---------------------------------------------------------------------------

/// The payer-less, node-less, id-less shape of a transaction carried inside
/// a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulableTransactionBody {
    /// The variant fields.
    pub data: AnyTransactionData,
    /// Fee cap for the eventual execution.
    pub max_transaction_fee: Hbar,
    /// The scheduled transaction's memo.
    pub memo: String,
}

impl SchedulableTransactionBody {
    /// Reduces a transaction to its schedulable body.
    ///
    /// Every schedulable variant maps to *itself*: a token unfreeze
    /// schedules a token unfreeze, an allowance delete schedules an
    /// allowance delete.
    pub fn from_transaction<D>(transaction: &Transaction<D>) -> Result<Self>
    where
        D: TransactionData + Into<AnyTransactionData>,
    {
        let data: AnyTransactionData = transaction.data().clone().into();
        if !data.is_schedulable() {
            return Err(Error::argument(format!(
                "a {} transaction cannot be scheduled",
                data.variant_name()
            )));
        }
        if data.chunk_payload_len().is_some() && transaction.planned_chunk_count() > 1 {
            return Err(Error::argument(
                "a multi-chunk transaction cannot be scheduled",
            ));
        }
        Ok(SchedulableTransactionBody {
            data,
            max_transaction_fee: transaction
                .max_transaction_fee()
                .unwrap_or(crate::config::DEFAULT_MAX_TRANSACTION_FEE),
            memo: transaction.transaction_memo().to_string(),
        })
    }
}

impl WireEncode for SchedulableTransactionBody {
    fn encode(&self, w: &mut WireWriter) {
        w.put_i64(self.max_transaction_fee.to_tinybars());
        w.put_str(&self.memo);
        w.put_u8(self.data.variant_tag());
        self.data.encode_fields(w);
    }
}

impl WireDecode for SchedulableTransactionBody {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        let max_transaction_fee = Hbar::from_tinybars(r.read_i64("schedulable fee")?);
        let memo = r.read_str("schedulable memo")?;
        let tag_byte = r.read_u8("schedulable variant tag")?;
        let data = AnyTransactionData::decode_for_tag(tag_byte, r)?;
        Ok(SchedulableTransactionBody { data, max_transaction_fee, memo })
    }
}
