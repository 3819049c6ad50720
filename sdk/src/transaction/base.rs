//! The generic transaction: assembly, freeze, signing, fan-out, execution.
//!
//! Lifecycle is mutable → frozen → executed. Freezing resolves every default
//! (id, node list, fee) and materializes one serialized body per
//! `(chunk, node)` pair; from then on the body bytes are the signature
//! pre-image and never change, except through explicit id regeneration which
//! rebuilds bodies and re-signs via the registered signer capabilities.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha384};
use tracing::debug;

use crate::client::Client;
use crate::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS, DEFAULT_MAX_TRANSACTION_FEE,
    DEFAULT_TRANSACTION_VALID_DURATION, MAX_MEMO_LENGTH,
};
use crate::crypto::{Key, Operator, PrivateKey, PublicKey, Signer};
use crate::error::{CodecError, Error, Result};
use crate::execute::classify::{classify_precheck, RetryDecision};
use crate::execute::engine::{self, Execute, ExecuteParams};
use crate::hbar::Hbar;
use crate::ids::{AccountId, TransactionId};
use crate::network::NetworkManager;
use crate::transaction::response::TransactionResponse;
use crate::transaction::{chunk_count, ChunkInfo, CustomFeeLimit, TransactionData};
use crate::transaction::ChunkedTransactionData;
use crate::wire::{
    RequestKind, ResponseEnvelope, Service, WireDecode, WireEncode, WireReader, WireWriter,
};

// ---------------------------------------------------------------------------
// Signature map entries
// ---------------------------------------------------------------------------

/// One collected signature: the signing identity plus the signature over the
/// copy's body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePair {
    /// Public key of the signer.
    pub public_key: PublicKey,
    /// Raw signature over the body bytes.
    pub signature: Vec<u8>,
}

impl WireEncode for SignaturePair {
    fn encode(&self, w: &mut WireWriter) {
        self.public_key.encode(w);
        w.put_bytes(&self.signature);
    }
}

impl WireDecode for SignaturePair {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        let public_key = PublicKey::decode(r)?;
        let signature = r.read_bytes("signature")?;
        Ok(SignaturePair { public_key, signature })
    }
}

/// One frozen serialized copy, addressed to exactly one node.
#[derive(Debug, Clone)]
struct SignedCopy {
    node_account_id: AccountId,
    body_bytes: Vec<u8>,
    signatures: Vec<SignaturePair>,
}

impl SignedCopy {
    /// The outer (submittable) bytes: body plus signature map.
    fn outer_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.put_bytes(&self.body_bytes);
        w.put_seq(&self.signatures, |w, pair| pair.encode(w));
        w.finish()
    }
}

/// All copies of one logical transaction (one chunk).
#[derive(Debug, Clone)]
struct FrozenChunk {
    transaction_id: TransactionId,
    copies: Vec<SignedCopy>,
}

// ---------------------------------------------------------------------------
// Body codec
// ---------------------------------------------------------------------------

fn encode_body<D: TransactionData>(
    data: &D,
    transaction_id: TransactionId,
    node_account_id: AccountId,
    fee: Hbar,
    valid_duration: Duration,
    memo: &str,
    batch_key: Option<&Key>,
    custom_fee_limits: &[CustomFeeLimit],
) -> Vec<u8> {
    let mut w = WireWriter::new();
    transaction_id.encode(&mut w);
    node_account_id.encode(&mut w);
    w.put_i64(fee.to_tinybars());
    w.put_u64(valid_duration.as_secs());
    w.put_str(memo);
    w.put_option(batch_key, |w, key| key.encode(w));
    w.put_seq(custom_fee_limits, |w, limit| limit.encode(w));
    w.put_u8(data.variant_tag());
    data.encode_fields(&mut w);
    w.finish()
}

/// A body parsed back out of its bytes.
struct DecodedBody<D> {
    transaction_id: TransactionId,
    node_account_id: AccountId,
    fee: Hbar,
    valid_duration: Duration,
    memo: String,
    batch_key: Option<Key>,
    custom_fee_limits: Vec<CustomFeeLimit>,
    data: D,
}

fn decode_body<D: TransactionData>(bytes: &[u8]) -> std::result::Result<DecodedBody<D>, CodecError> {
    let mut r = WireReader::new(bytes);
    let transaction_id = TransactionId::decode(&mut r)?;
    let node_account_id = AccountId::decode(&mut r)?;
    let fee = Hbar::from_tinybars(r.read_i64("max fee")?);
    let valid_duration = Duration::from_secs(r.read_u64("valid duration")?);
    let memo = r.read_str("memo")?;
    let batch_key = r.read_option("batch key", Key::decode)?;
    let custom_fee_limits = r.read_seq("custom fee limits", CustomFeeLimit::decode)?;
    let tag = r.read_u8("variant tag")?;
    let data = D::decode_for_tag(tag, &mut r)?;
    r.expect_end()?;
    Ok(DecodedBody {
        transaction_id,
        node_account_id,
        fee,
        valid_duration,
        memo,
        batch_key,
        custom_fee_limits,
        data,
    })
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A transaction of variant `D`, from assembly through execution.
pub struct Transaction<D: TransactionData> {
    data: D,
    node_account_ids: Option<Vec<AccountId>>,
    transaction_id: Option<TransactionId>,
    max_transaction_fee: Option<Hbar>,
    transaction_valid_duration: Duration,
    memo: String,
    batch_key: Option<Key>,
    custom_fee_limits: Vec<CustomFeeLimit>,
    chunk_size: usize,
    max_chunks: usize,
    regenerate_transaction_id: Option<bool>,
    max_attempts: Option<usize>,
    grpc_deadline: Option<Duration>,
    // Frozen state: empty means not frozen.
    chunks: Vec<FrozenChunk>,
    frozen_fee: Hbar,
    signers: Vec<Arc<dyn Signer>>,
}

impl<D: TransactionData + Default> Default for Transaction<D> {
    fn default() -> Self {
        Transaction::from_data(D::default())
    }
}

impl<D: TransactionData> Transaction<D> {
    /// A transaction over pre-built variant data.
    pub fn from_data(data: D) -> Self {
        Transaction {
            data,
            node_account_ids: None,
            transaction_id: None,
            max_transaction_fee: None,
            transaction_valid_duration: DEFAULT_TRANSACTION_VALID_DURATION,
            memo: String::new(),
            batch_key: None,
            custom_fee_limits: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            regenerate_transaction_id: None,
            max_attempts: None,
            grpc_deadline: None,
            chunks: Vec::new(),
            frozen_fee: DEFAULT_MAX_TRANSACTION_FEE,
            signers: Vec::new(),
        }
    }

    // --- accessors ---

    /// The variant data.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Whether the transaction has been frozen.
    pub fn is_frozen(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// The explicit node fan-out, if one was set or frozen in.
    pub fn node_account_ids(&self) -> Option<Vec<AccountId>> {
        if let Some(first) = self.chunks.first() {
            return Some(first.copies.iter().map(|c| c.node_account_id).collect());
        }
        self.node_account_ids.clone()
    }

    /// The transaction id, once set or frozen in.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.chunks
            .first()
            .map(|c| c.transaction_id)
            .or(self.transaction_id)
    }

    /// The explicit max fee, if any.
    pub fn max_transaction_fee(&self) -> Option<Hbar> {
        self.max_transaction_fee
    }

    /// The transaction's validity window.
    pub fn transaction_valid_duration(&self) -> Duration {
        self.transaction_valid_duration
    }

    /// The transaction memo.
    pub fn transaction_memo(&self) -> &str {
        &self.memo
    }

    /// The batch key, if this transaction was marked batchable.
    pub fn batch_key(&self) -> Option<&Key> {
        self.batch_key.as_ref()
    }

    /// Custom fee limits carried in the body.
    pub fn custom_fee_limits(&self) -> &[CustomFeeLimit] {
        &self.custom_fee_limits
    }

    /// How many chunks this transaction splits into, frozen or not.
    pub(crate) fn planned_chunk_count(&self) -> usize {
        if self.is_frozen() {
            return self.chunks.len();
        }
        self.data
            .chunk_payload_len()
            .map_or(1, |len| chunk_count(len, self.chunk_size))
    }

    // --- setters (all rejected once frozen) ---

    fn require_not_frozen(&self) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::argument("transaction is frozen and can no longer change"));
        }
        Ok(())
    }

    fn require_frozen(&self) -> Result<()> {
        if !self.is_frozen() {
            return Err(Error::not_ready("transaction must be frozen first"));
        }
        Ok(())
    }

    pub(crate) fn data_mut(&mut self) -> Result<&mut D> {
        self.require_not_frozen()?;
        Ok(&mut self.data)
    }

    /// Pins the node fan-out explicitly.
    pub fn set_node_account_ids(&mut self, ids: Vec<AccountId>) -> Result<&mut Self> {
        self.require_not_frozen()?;
        if ids.is_empty() {
            return Err(Error::argument("node account id list cannot be empty"));
        }
        self.node_account_ids = Some(ids);
        Ok(self)
    }

    /// Sets an explicit transaction id instead of generating from the
    /// operator at freeze.
    pub fn set_transaction_id(&mut self, id: TransactionId) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.transaction_id = Some(id);
        Ok(self)
    }

    /// Caps the fee for this transaction, overriding the client default.
    pub fn set_max_transaction_fee(&mut self, fee: Hbar) -> Result<&mut Self> {
        self.require_not_frozen()?;
        if fee.is_negative() {
            return Err(Error::argument("max transaction fee cannot be negative"));
        }
        self.max_transaction_fee = Some(fee);
        Ok(self)
    }

    /// Sets the validity window measured from the id's valid-start.
    pub fn set_transaction_valid_duration(&mut self, duration: Duration) -> Result<&mut Self> {
        self.require_not_frozen()?;
        if duration.is_zero() {
            return Err(Error::argument("valid duration cannot be zero"));
        }
        self.transaction_valid_duration = duration;
        Ok(self)
    }

    /// Sets the transaction memo (at most 100 bytes).
    pub fn set_transaction_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.require_not_frozen()?;
        let memo = memo.into();
        if memo.len() > MAX_MEMO_LENGTH {
            return Err(Error::argument(format!(
                "memo is {} bytes, maximum is {MAX_MEMO_LENGTH}",
                memo.len()
            )));
        }
        self.memo = memo;
        Ok(self)
    }

    /// Marks this transaction batchable under the given key.
    pub fn set_batch_key(&mut self, key: Key) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.batch_key = Some(key);
        Ok(self)
    }

    /// Adds a custom fee limit for one payer.
    pub fn add_custom_fee_limit(&mut self, limit: CustomFeeLimit) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.custom_fee_limits.push(limit);
        Ok(self)
    }

    /// Overrides the client's expired-id regeneration policy.
    pub fn set_regenerate_transaction_id(&mut self, regenerate: bool) -> &mut Self {
        self.regenerate_transaction_id = Some(regenerate);
        self
    }

    /// Overrides the client's attempt budget for this transaction.
    pub fn set_max_attempts(&mut self, attempts: usize) -> &mut Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Overrides the client's per-attempt network deadline.
    pub fn set_grpc_deadline(&mut self, deadline: Duration) -> &mut Self {
        self.grpc_deadline = Some(deadline);
        self
    }

    // --- freeze ---

    /// Freezes with everything explicit: requires a transaction id and a
    /// node list to have been set.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        self.freeze_with_parts(None, None, DEFAULT_MAX_TRANSACTION_FEE)
    }

    /// Freezes, filling defaults from the client: operator-generated id,
    /// healthy-node fan-out, default max fee.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        self.freeze_with_parts(
            client.operator().as_ref(),
            Some(client.network()),
            client.default_max_transaction_fee(),
        )
    }

    fn freeze_with_parts(
        &mut self,
        operator: Option<&Operator>,
        network: Option<&NetworkManager>,
        default_fee: Hbar,
    ) -> Result<&mut Self> {
        if self.is_frozen() {
            return Ok(self);
        }
        self.data.validate()?;

        let transaction_id = match self.transaction_id {
            Some(id) => id,
            None => {
                let operator = operator.ok_or_else(|| {
                    Error::not_ready("transaction id or client operator required to freeze")
                })?;
                TransactionId::generate(operator.account_id)
            }
        };

        let node_ids = match &self.node_account_ids {
            Some(ids) => ids.clone(),
            None => {
                let network = network.ok_or_else(|| {
                    Error::not_ready("node account ids or a client required to freeze")
                })?;
                let pool = network.node_ids().len();
                network.fan_out_node_ids(crate::config::default_nodes_for_request(pool))?
            }
        };

        let fee = self.max_transaction_fee.unwrap_or(default_fee);
        let total = match self.data.chunk_payload_len() {
            None => 1,
            Some(len) => {
                let total = chunk_count(len, self.chunk_size);
                if total > self.max_chunks {
                    return Err(Error::argument(format!(
                        "payload needs {total} chunks, maximum is {}",
                        self.max_chunks
                    )));
                }
                total
            }
        };

        self.frozen_fee = fee;
        self.chunks = self.build_chunks(transaction_id, &node_ids, total);
        debug!(
            transaction_id = %transaction_id,
            nodes = node_ids.len(),
            chunks = total,
            "transaction frozen"
        );
        Ok(self)
    }

    /// Builds the full `(chunk, node)` body matrix for the given initial id.
    fn build_chunks(
        &self,
        initial_id: TransactionId,
        node_ids: &[AccountId],
        total: usize,
    ) -> Vec<FrozenChunk> {
        let chunked = self.data.chunk_payload_len().is_some();
        (0..total)
            .map(|i| {
                // Successive chunks get strictly increasing valid-starts.
                let id = TransactionId::with_valid_start(
                    initial_id.account_id,
                    initial_id.valid_start.plus(Duration::from_nanos(i as u64)),
                );
                let data = if chunked {
                    let info = ChunkInfo {
                        initial_transaction_id: initial_id,
                        number: (i + 1) as u32,
                        total: total as u32,
                    };
                    self.data.for_chunk(info, self.chunk_size)
                } else {
                    self.data.clone()
                };
                let copies = node_ids
                    .iter()
                    .map(|&node_id| SignedCopy {
                        node_account_id: node_id,
                        body_bytes: encode_body(
                            &data,
                            id,
                            node_id,
                            self.frozen_fee,
                            self.transaction_valid_duration,
                            &self.memo,
                            self.batch_key.as_ref(),
                            &self.custom_fee_limits,
                        ),
                        signatures: Vec::new(),
                    })
                    .collect();
                FrozenChunk { transaction_id: id, copies }
            })
            .collect()
    }

    // --- signing ---

    /// Signs every copy with an in-memory key.
    pub fn sign(&mut self, key: PrivateKey) -> Result<&mut Self> {
        self.sign_with(Arc::new(key))
    }

    /// Signs every copy through a signer capability. Idempotent per
    /// `(copy, public key)`; the capability is retained so regeneration can
    /// re-sign rebuilt bodies.
    pub fn sign_with(&mut self, signer: Arc<dyn Signer>) -> Result<&mut Self> {
        self.require_frozen()?;
        let public_key = signer.public_key();
        if !self
            .signers
            .iter()
            .any(|s| s.public_key() == public_key)
        {
            self.signers.push(Arc::clone(&signer));
        }
        for chunk in &mut self.chunks {
            for copy in &mut chunk.copies {
                if copy.signatures.iter().any(|p| p.public_key == public_key) {
                    continue;
                }
                let signature = signer.sign(&copy.body_bytes);
                copy.signatures.push(SignaturePair { public_key, signature });
            }
        }
        Ok(self)
    }

    /// Signs with the client's operator key.
    pub fn sign_with_operator(&mut self, client: &Client) -> Result<&mut Self> {
        let operator = client
            .operator()
            .ok_or_else(|| Error::not_ready("client has no operator to sign with"))?;
        self.sign_with(operator.signer)
    }

    /// Attaches an externally produced signature.
    ///
    /// Only valid for a single-chunk, single-node transaction: a raw
    /// signature covers exactly one body and cannot be replayed across the
    /// fan-out.
    pub fn add_signature(&mut self, public_key: PublicKey, signature: Vec<u8>) -> Result<&mut Self> {
        self.require_frozen()?;
        if self.chunks.len() != 1 || self.chunks[0].copies.len() != 1 {
            return Err(Error::argument(
                "add_signature requires exactly one chunk and one node",
            ));
        }
        let copy = &mut self.chunks[0].copies[0];
        if !copy.signatures.iter().any(|p| p.public_key == public_key) {
            copy.signatures.push(SignaturePair { public_key, signature });
        }
        Ok(self)
    }

    /// The collected signatures per node, for the first (or only) chunk.
    pub fn signatures(&self) -> Result<HashMap<AccountId, Vec<SignaturePair>>> {
        self.require_frozen()?;
        Ok(self.chunks[0]
            .copies
            .iter()
            .map(|c| (c.node_account_id, c.signatures.clone()))
            .collect())
    }

    // --- hashes ---

    /// SHA-384 of the submittable bytes; single-node transactions only.
    pub fn transaction_hash(&self) -> Result<Vec<u8>> {
        self.require_frozen()?;
        if self.chunks[0].copies.len() != 1 {
            return Err(Error::argument(
                "transaction_hash requires a single-node transaction; use transaction_hash_per_node",
            ));
        }
        Ok(hash_of(&self.chunks[0].copies[0].outer_bytes()))
    }

    /// SHA-384 of the submittable bytes for every node in the fan-out.
    pub fn transaction_hash_per_node(&self) -> Result<HashMap<AccountId, Vec<u8>>> {
        self.require_frozen()?;
        Ok(self.chunks[0]
            .copies
            .iter()
            .map(|c| (c.node_account_id, hash_of(&c.outer_bytes())))
            .collect())
    }

    // --- regeneration ---

    /// Rebuilds chunk `index` (and everything chained to it, when `index`
    /// is 0) with a fresh transaction id, then re-signs through the
    /// registered signer capabilities.
    ///
    /// Externally attached raw signatures cannot be recomputed and are
    /// dropped.
    fn regenerate_chunk_id(&mut self, index: usize) -> Result<()> {
        self.require_frozen()?;
        let payer = self.chunks[index].transaction_id.account_id;
        let node_ids: Vec<AccountId> =
            self.chunks[index].copies.iter().map(|c| c.node_account_id).collect();
        let total = self.chunks.len();
        let new_id = TransactionId::generate(payer);

        if index == 0 {
            // Nothing chained to the old id has been submitted yet, so the
            // initial id moves with chunk 0 and every body follows.
            self.chunks = self.build_chunks(new_id, &node_ids, total);
        } else {
            let initial = self.chunks[0].transaction_id;
            let data = if self.data.chunk_payload_len().is_some() {
                let info = ChunkInfo {
                    initial_transaction_id: initial,
                    number: (index + 1) as u32,
                    total: total as u32,
                };
                self.data.for_chunk(info, self.chunk_size)
            } else {
                self.data.clone()
            };
            let copies = node_ids
                .iter()
                .map(|&node_id| SignedCopy {
                    node_account_id: node_id,
                    body_bytes: encode_body(
                        &data,
                        new_id,
                        node_id,
                        self.frozen_fee,
                        self.transaction_valid_duration,
                        &self.memo,
                        self.batch_key.as_ref(),
                        &self.custom_fee_limits,
                    ),
                    signatures: Vec::new(),
                })
                .collect();
            self.chunks[index] = FrozenChunk { transaction_id: new_id, copies };
        }

        let signers: Vec<Arc<dyn Signer>> = self.signers.clone();
        for signer in signers {
            // Re-signs every copy that lost its signatures above.
            self.sign_with(signer)?;
        }
        Ok(())
    }

    // --- serialization round-trip ---

    /// Serializes the frozen transaction, signatures included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.require_frozen()?;
        let mut entries = Vec::new();
        for chunk in &self.chunks {
            for copy in &chunk.copies {
                entries.push(copy.outer_bytes());
            }
        }
        let mut w = WireWriter::new();
        w.put_seq(&entries, |w, outer| w.put_bytes(outer));
        Ok(w.finish())
    }

    /// Reconstructs a frozen transaction from [`Self::to_bytes`] output.
    ///
    /// Variant identity, chunk structure, node fan-out, and the full
    /// signature maps all survive the round trip.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new(bytes);
        let entries = r.read_seq("transaction entries", |r| r.read_bytes("outer bytes"))?;
        r.expect_end()?;
        if entries.is_empty() {
            return Err(Error::argument("serialized transaction has no entries"));
        }

        // Group copies into chunks by transaction id, in order of first
        // appearance.
        let mut chunks: Vec<FrozenChunk> = Vec::new();
        let mut chunk_data: Vec<D> = Vec::new();
        let mut header: Option<DecodedBody<D>> = None;
        for outer in &entries {
            let mut r = WireReader::new(outer);
            let body_bytes = r.read_bytes("body bytes")?;
            let signatures = r.read_seq("signature map", SignaturePair::decode)?;
            r.expect_end()?;
            let body = decode_body::<D>(&body_bytes)?;

            let copy = SignedCopy {
                node_account_id: body.node_account_id,
                body_bytes,
                signatures,
            };
            match chunks.iter_mut().find(|c| c.transaction_id == body.transaction_id) {
                Some(chunk) => chunk.copies.push(copy),
                None => {
                    chunks.push(FrozenChunk {
                        transaction_id: body.transaction_id,
                        copies: vec![copy],
                    });
                    chunk_data.push(body.data.clone());
                }
            }
            if header.is_none() {
                header = Some(body);
            }
        }
        let header = header.ok_or_else(|| Error::argument("serialized transaction is empty"))?;

        let mut data = chunk_data.remove(0);
        data.finish_from_chunks(chunk_data);

        let mut transaction = Transaction::from_data(data);
        transaction.transaction_valid_duration = header.valid_duration;
        transaction.memo = header.memo;
        transaction.batch_key = header.batch_key;
        transaction.custom_fee_limits = header.custom_fee_limits;
        transaction.max_transaction_fee = Some(header.fee);
        transaction.frozen_fee = header.fee;
        transaction.chunks = chunks;
        Ok(transaction)
    }

    // --- execution ---

    /// Submits the transaction, executing every chunk in order, and returns
    /// the first chunk's response.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse> {
        self.execute_with_timeout(client, client.request_timeout()).await
    }

    /// [`Self::execute`] with an explicit overall deadline.
    pub async fn execute_with_timeout(
        &mut self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionResponse> {
        let responses = self.execute_chunks(client, timeout, false).await?;
        responses
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_ready("transaction produced no chunks"))
    }

    /// Prepares (freeze, checksum validation, operator signature) and runs
    /// every chunk sequentially. With `collect_receipts`, waits for and
    /// validates each chunk's receipt before moving on.
    pub(crate) async fn execute_chunks(
        &mut self,
        client: &Client,
        timeout: Duration,
        collect_receipts: bool,
    ) -> Result<Vec<TransactionResponse>> {
        self.freeze_with(client)?;
        if client.auto_validate_checksums() {
            if let Some(ledger_id) = client.ledger_id() {
                self.data.validate_checksums(&ledger_id)?;
            }
        }
        if client.operator().is_some() {
            self.sign_with_operator(client)?;
        }

        let params = ExecuteParams {
            network: client.network(),
            max_attempts: self.max_attempts.unwrap_or_else(|| client.max_attempts()),
            min_backoff: client.min_backoff(),
            max_backoff: client.max_backoff(),
            grpc_deadline: self.grpc_deadline.unwrap_or_else(|| client.grpc_deadline()),
            timeout,
            cancel: client.cancel_token(),
            regenerate_transaction_id: self
                .regenerate_transaction_id
                .unwrap_or_else(|| client.default_regenerate_transaction_id()),
        };

        let total = self.chunks.len();
        let mut responses = Vec::with_capacity(total);
        for index in 0..total {
            let mut executor = ChunkExecutor { transaction: self, chunk_index: index };
            let response = engine::execute(&mut executor, &params).await?;
            if collect_receipts {
                response.get_receipt(client).await?;
            }
            responses.push(response);
        }
        Ok(responses)
    }
}

impl<D: ChunkedTransactionData> Transaction<D> {
    /// The payload bytes carried per chunk (default 4096).
    pub fn set_chunk_size(&mut self, size: usize) -> Result<&mut Self> {
        self.require_not_frozen()?;
        if size == 0 {
            return Err(Error::argument("chunk size cannot be zero"));
        }
        self.chunk_size = size;
        Ok(self)
    }

    /// The most chunks this transaction may split into (default 20).
    pub fn set_max_chunks(&mut self, max: usize) -> Result<&mut Self> {
        self.require_not_frozen()?;
        if max == 0 {
            return Err(Error::argument("max chunks cannot be zero"));
        }
        self.max_chunks = max;
        Ok(self)
    }

    /// Chunk count this transaction will (or did) split into.
    pub fn chunk_count(&self) -> usize {
        self.planned_chunk_count()
    }

    /// Transaction ids per chunk; frozen transactions only.
    pub fn chunk_transaction_ids(&self) -> Result<Vec<TransactionId>> {
        self.require_frozen()?;
        Ok(self.chunks.iter().map(|c| c.transaction_id).collect())
    }

    /// Executes every chunk in order, collecting and validating each
    /// chunk's receipt before submitting the next.
    pub async fn execute_all(&mut self, client: &Client) -> Result<Vec<TransactionResponse>> {
        self.execute_chunks(client, client.request_timeout(), true).await
    }
}

fn hash_of(outer_bytes: &[u8]) -> Vec<u8> {
    Sha384::digest(outer_bytes).to_vec()
}

// ---------------------------------------------------------------------------
// Engine adapter
// ---------------------------------------------------------------------------

/// One chunk of one transaction, as the execution engine drives it.
struct ChunkExecutor<'a, D: TransactionData> {
    transaction: &'a mut Transaction<D>,
    chunk_index: usize,
}

impl<D: TransactionData> ChunkExecutor<'_, D> {
    fn chunk(&self) -> &FrozenChunk {
        &self.transaction.chunks[self.chunk_index]
    }
}

impl<D: TransactionData> Execute for ChunkExecutor<'_, D> {
    type Response = TransactionResponse;

    fn service(&self) -> Service {
        self.transaction.data.service()
    }

    fn kind(&self) -> RequestKind {
        RequestKind::Transaction
    }

    fn node_account_ids(&self) -> Option<Vec<AccountId>> {
        Some(self.chunk().copies.iter().map(|c| c.node_account_id).collect())
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.chunk().transaction_id)
    }

    fn request_bytes(&self, node_id: AccountId) -> Result<Vec<u8>> {
        self.chunk()
            .copies
            .iter()
            .find(|c| c.node_account_id == node_id)
            .map(SignedCopy::outer_bytes)
            .ok_or_else(|| Error::not_ready("no copy frozen for the selected node"))
    }

    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision {
        classify_precheck(response.precheck)
    }

    fn map_response(
        &self,
        node_id: AccountId,
        _response: ResponseEnvelope,
    ) -> Result<TransactionResponse> {
        let copy = self
            .chunk()
            .copies
            .iter()
            .find(|c| c.node_account_id == node_id)
            .ok_or_else(|| Error::not_ready("no copy frozen for the responding node"))?;
        Ok(TransactionResponse {
            transaction_id: self.chunk().transaction_id,
            node_account_id: node_id,
            transaction_hash: hash_of(&copy.outer_bytes()),
        })
    }

    fn regenerate_transaction_id(&mut self) -> Result<bool> {
        self.transaction.regenerate_chunk_id(self.chunk_index)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Timestamp;
    use crate::transaction::transfer::TransferTransaction;

    fn frozen_transfer() -> TransferTransaction {
        let mut tx = TransferTransaction::new();
        tx.hbar_transfer(AccountId::new(7), Hbar::new(-1).unwrap())
            .unwrap()
            .hbar_transfer(AccountId::new(8), Hbar::new(1).unwrap())
            .unwrap()
            .set_transaction_id(TransactionId::with_valid_start(
                AccountId::new(7),
                Timestamp { seconds: 1_700_000_000, nanos: 42 },
            ))
            .unwrap()
            .set_node_account_ids(vec![AccountId::new(3), AccountId::new(4)])
            .unwrap()
            .freeze()
            .unwrap();
        tx
    }

    #[test]
    fn freeze_requires_id_and_nodes() {
        let mut tx = TransferTransaction::new();
        assert!(matches!(tx.freeze(), Err(Error::NotReady(_))));

        tx.set_transaction_id(TransactionId::generate(AccountId::new(7))).unwrap();
        assert!(matches!(tx.freeze(), Err(Error::NotReady(_))));

        tx.set_node_account_ids(vec![AccountId::new(3)]).unwrap();
        tx.freeze().unwrap();
        assert!(tx.is_frozen());
    }

    #[test]
    fn freeze_is_idempotent() {
        let mut tx = frozen_transfer();
        let before = tx.to_bytes().unwrap();
        tx.freeze().unwrap();
        assert_eq!(tx.to_bytes().unwrap(), before);
    }

    #[test]
    fn setters_fail_after_freeze_without_mutating() {
        let mut tx = frozen_transfer();
        let before = tx.to_bytes().unwrap();

        assert!(matches!(tx.set_transaction_memo("late"), Err(Error::Argument(_))));
        assert!(matches!(
            tx.set_max_transaction_fee(Hbar::new(5).unwrap()),
            Err(Error::Argument(_))
        ));
        assert!(matches!(
            tx.hbar_transfer(AccountId::new(9), Hbar::ZERO),
            Err(Error::Argument(_))
        ));
        assert_eq!(tx.to_bytes().unwrap(), before);
    }

    #[test]
    fn fan_out_copies_have_distinct_bodies() {
        let tx = frozen_transfer();
        let chunk = &tx.chunks[0];
        assert_eq!(chunk.copies.len(), 2);
        assert_ne!(chunk.copies[0].body_bytes, chunk.copies[1].body_bytes);
        // Same logical id in both bodies.
        let a = decode_body::<crate::transaction::transfer::TransferTransactionData>(
            &chunk.copies[0].body_bytes,
        )
        .unwrap();
        let b = decode_body::<crate::transaction::transfer::TransferTransactionData>(
            &chunk.copies[1].body_bytes,
        )
        .unwrap();
        assert_eq!(a.transaction_id, b.transaction_id);
        assert_ne!(a.node_account_id, b.node_account_id);
    }

    #[test]
    fn signing_is_idempotent_per_key() {
        let mut tx = frozen_transfer();
        let key = PrivateKey::generate_ed25519();
        tx.sign(key.clone()).unwrap();
        tx.sign(key.clone()).unwrap();
        for copy in &tx.chunks[0].copies {
            assert_eq!(copy.signatures.len(), 1);
        }
        let second = PrivateKey::generate_ed25519();
        tx.sign(second).unwrap();
        for copy in &tx.chunks[0].copies {
            assert_eq!(copy.signatures.len(), 2);
        }
    }

    #[test]
    fn signatures_verify_against_body_bytes() {
        let mut tx = frozen_transfer();
        let key = PrivateKey::generate_ed25519();
        tx.sign(key).unwrap();
        for copy in &tx.chunks[0].copies {
            let pair = &copy.signatures[0];
            pair.public_key.verify(&copy.body_bytes, &pair.signature).unwrap();
            // Not transferable to the other copy's bytes.
        }
        let (a, b) = (&tx.chunks[0].copies[0], &tx.chunks[0].copies[1]);
        assert!(a.signatures[0]
            .public_key
            .verify(&b.body_bytes, &a.signatures[0].signature)
            .is_err());
    }

    #[test]
    fn sign_requires_frozen() {
        let mut tx = TransferTransaction::new();
        let key = PrivateKey::generate_ed25519();
        assert!(matches!(tx.sign(key), Err(Error::NotReady(_))));
    }

    #[test]
    fn add_signature_requires_single_node() {
        let mut tx = frozen_transfer();
        let key = PrivateKey::generate_ed25519();
        let sig = vec![0u8; 64];
        assert!(matches!(
            tx.add_signature(key.public_key(), sig),
            Err(Error::Argument(_))
        ));
    }

    #[test]
    fn round_trip_preserves_everything() {
        let mut tx = frozen_transfer();
        let key = PrivateKey::generate_ed25519();
        tx.sign(key).unwrap();

        let bytes = tx.to_bytes().unwrap();
        let parsed = TransferTransaction::from_bytes(&bytes).unwrap();

        assert!(parsed.is_frozen());
        assert_eq!(parsed.transaction_id(), tx.transaction_id());
        assert_eq!(parsed.node_account_ids(), tx.node_account_ids());
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
        let sigs = parsed.signatures().unwrap();
        assert!(sigs.values().all(|v| v.len() == 1));
    }

    #[test]
    fn round_trip_through_any_transaction() {
        let mut tx = frozen_transfer();
        tx.sign(PrivateKey::generate_ed25519()).unwrap();
        let bytes = tx.to_bytes().unwrap();

        let any = crate::transaction::AnyTransaction::from_bytes(&bytes).unwrap();
        assert_eq!(any.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn transaction_hash_per_node_covers_fan_out() {
        let mut tx = frozen_transfer();
        tx.sign(PrivateKey::generate_ed25519()).unwrap();

        assert!(tx.transaction_hash().is_err());
        let hashes = tx.transaction_hash_per_node().unwrap();
        assert_eq!(hashes.len(), 2);
        for hash in hashes.values() {
            assert_eq!(hash.len(), 48);
        }
        let mut values: Vec<_> = hashes.values().collect();
        values.dedup();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn regeneration_changes_id_and_resigns() {
        let mut tx = frozen_transfer();
        let key = PrivateKey::generate_ed25519();
        tx.sign(key).unwrap();
        let old_id = tx.transaction_id().unwrap();

        tx.regenerate_chunk_id(0).unwrap();
        let new_id = tx.transaction_id().unwrap();
        assert_ne!(old_id, new_id);
        for copy in &tx.chunks[0].copies {
            assert_eq!(copy.signatures.len(), 1);
            copy.signatures[0]
                .public_key
                .verify(&copy.body_bytes, &copy.signatures[0].signature)
                .unwrap();
        }
    }

    #[test]
    fn regeneration_drops_raw_signatures() {
        let mut tx = TransferTransaction::new();
        tx.hbar_transfer(AccountId::new(7), Hbar::new(-1).unwrap())
            .unwrap()
            .hbar_transfer(AccountId::new(8), Hbar::new(1).unwrap())
            .unwrap()
            .set_transaction_id(TransactionId::generate(AccountId::new(7)))
            .unwrap()
            .set_node_account_ids(vec![AccountId::new(3)])
            .unwrap()
            .freeze()
            .unwrap();

        let raw_key = PrivateKey::generate_ed25519();
        let sig = raw_key.sign(&tx.chunks[0].copies[0].body_bytes);
        tx.add_signature(raw_key.public_key(), sig).unwrap();
        assert_eq!(tx.chunks[0].copies[0].signatures.len(), 1);

        tx.regenerate_chunk_id(0).unwrap();
        // The raw signature cannot be recomputed for new bytes.
        assert!(tx.chunks[0].copies[0].signatures.is_empty());
    }
}
