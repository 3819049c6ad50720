//! Consensus topics: creation and (chunked) message submission.

use std::time::Duration;

use crate::crypto::Key;
use crate::error::{CodecError, Error, Result};
use crate::ids::{AccountId, LedgerId, TopicId};
use crate::transaction::{
    tag, ChunkInfo, ChunkedTransactionData, Transaction, TransactionData,
};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

const DEFAULT_AUTO_RENEW_PERIOD: Duration = Duration::from_secs(90 * 24 * 60 * 60);

// ---------------------------------------------------------------------------
// TopicCreate
// ---------------------------------------------------------------------------

/// Creates a consensus topic.
pub type TopicCreateTransaction = Transaction<TopicCreateTransactionData>;

#[derive(Debug, Clone, PartialEq)]
pub struct TopicCreateTransactionData {
    topic_memo: String,
    admin_key: Option<Key>,
    submit_key: Option<Key>,
    auto_renew_period: Duration,
    auto_renew_account_id: Option<AccountId>,
}

impl Default for TopicCreateTransactionData {
    fn default() -> Self {
        TopicCreateTransactionData {
            topic_memo: String::new(),
            admin_key: None,
            submit_key: None,
            auto_renew_period: DEFAULT_AUTO_RENEW_PERIOD,
            auto_renew_account_id: None,
        }
    }
}

impl TransactionData for TopicCreateTransactionData {
    fn service(&self) -> Service {
        Service::Consensus
    }

    fn variant_tag(&self) -> u8 {
        tag::TOPIC_CREATE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_str(&self.topic_memo);
        w.put_option(self.admin_key.as_ref(), |w, k| k.encode(w));
        w.put_option(self.submit_key.as_ref(), |w, k| k.encode(w));
        w.put_u64(self.auto_renew_period.as_secs());
        w.put_option(self.auto_renew_account_id.as_ref(), |w, id| id.encode(w));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::TOPIC_CREATE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let topic_memo = r.read_str("topic memo")?;
        let admin_key = r.read_option("admin key", Key::decode)?;
        let submit_key = r.read_option("submit key", Key::decode)?;
        let auto_renew_period = Duration::from_secs(r.read_u64("auto renew period")?);
        let auto_renew_account_id = r.read_option("auto renew account", AccountId::decode)?;
        Ok(TopicCreateTransactionData {
            topic_memo,
            admin_key,
            submit_key,
            auto_renew_period,
            auto_renew_account_id,
        })
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.auto_renew_account_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl TopicCreateTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The topic's memo.
    pub fn set_topic_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.data_mut()?.topic_memo = memo.into();
        Ok(self)
    }

    /// Key allowed to update or delete the topic.
    pub fn set_admin_key(&mut self, key: Key) -> Result<&mut Self> {
        self.data_mut()?.admin_key = Some(key);
        Ok(self)
    }

    /// Key required on submitted messages; open topic when unset.
    pub fn set_submit_key(&mut self, key: Key) -> Result<&mut Self> {
        self.data_mut()?.submit_key = Some(key);
        Ok(self)
    }

    pub fn set_auto_renew_period(&mut self, period: Duration) -> Result<&mut Self> {
        self.data_mut()?.auto_renew_period = period;
        Ok(self)
    }

    pub fn set_auto_renew_account_id(&mut self, id: AccountId) -> Result<&mut Self> {
        self.data_mut()?.auto_renew_account_id = Some(id);
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// TopicMessageSubmit (chunked)
// ---------------------------------------------------------------------------

/// Publishes a message to a topic, splitting large messages into chained
/// chunks the mirror side reassembles.
pub type TopicMessageSubmitTransaction = Transaction<TopicMessageSubmitTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicMessageSubmitTransactionData {
    topic_id: Option<TopicId>,
    message: Vec<u8>,
    chunk_info: Option<ChunkInfo>,
}

impl TransactionData for TopicMessageSubmitTransactionData {
    fn service(&self) -> Service {
        Service::Consensus
    }

    fn variant_tag(&self) -> u8 {
        tag::TOPIC_MESSAGE_SUBMIT
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.topic_id.as_ref(), |w, id| id.encode(w));
        w.put_bytes(&self.message);
        w.put_option(self.chunk_info.as_ref(), |w, info| info.encode(w));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::TOPIC_MESSAGE_SUBMIT {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let topic_id = r.read_option("topic id", TopicId::decode)?;
        let message = r.read_bytes("message")?;
        let chunk_info = r.read_option("chunk info", ChunkInfo::decode)?;
        Ok(TopicMessageSubmitTransactionData { topic_id, message, chunk_info })
    }

    fn validate(&self) -> Result<()> {
        if self.topic_id.is_none() {
            return Err(Error::argument("message submit requires a topic id"));
        }
        if self.message.is_empty() {
            return Err(Error::argument("message submit requires a message"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.topic_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }

    fn chunk_payload_len(&self) -> Option<usize> {
        Some(self.message.len())
    }

    fn for_chunk(&self, info: ChunkInfo, chunk_size: usize) -> Self {
        let start = (info.number as usize - 1) * chunk_size;
        let end = (start + chunk_size).min(self.message.len());
        TopicMessageSubmitTransactionData {
            topic_id: self.topic_id,
            message: self.message[start..end].to_vec(),
            chunk_info: Some(info),
        }
    }

    fn finish_from_chunks(&mut self, tail: Vec<Self>) {
        self.chunk_info = None;
        for part in tail {
            self.message.extend_from_slice(&part.message);
        }
    }
}

impl ChunkedTransactionData for TopicMessageSubmitTransactionData {}

impl TopicMessageSubmitTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The destination topic.
    pub fn set_topic_id(&mut self, id: TopicId) -> Result<&mut Self> {
        self.data_mut()?.topic_id = Some(id);
        Ok(self)
    }

    /// The full message; split into chunks automatically at freeze.
    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut()?.message = message.into();
        Ok(self)
    }

    /// The full (unchunked) message.
    pub fn message(&self) -> &[u8] {
        &self.data().message
    }
}
