//! The generic query driver: cost probe, payment, answer.

use std::time::Duration;

use tracing::debug;

use crate::client::Client;
use crate::crypto::Operator;
use crate::error::{Error, Result};
use crate::execute::{self, Execute, ExecuteParams, RetryDecision};
use crate::hbar::Hbar;
use crate::ids::{AccountId, TransactionId};
use crate::query::{response_type, QueryData};
use crate::transaction::TransferTransaction;
use crate::wire::{RequestKind, ResponseEnvelope, Service, WireWriter};

/// A query of variant `D`, with its execution knobs.
///
/// Unlike transactions, queries are never frozen: every setter stays
/// available until [`Query::execute`] and nothing is signed except the
/// embedded payment transfer.
#[derive(Debug, Clone)]
pub struct Query<D: QueryData> {
    data: D,
    node_account_ids: Option<Vec<AccountId>>,
    payment_amount: Option<Hbar>,
    max_payment_amount: Option<Hbar>,
    cached_cost: Option<Hbar>,
    max_attempts: Option<usize>,
    grpc_deadline: Option<Duration>,
}

impl<D: QueryData + Default> Default for Query<D> {
    fn default() -> Self {
        Query::from_data(D::default())
    }
}

impl<D: QueryData> Query<D> {
    /// Wraps prepared variant data.
    pub fn from_data(data: D) -> Self {
        Query {
            data,
            node_account_ids: None,
            payment_amount: None,
            max_payment_amount: None,
            cached_cost: None,
            max_attempts: None,
            grpc_deadline: None,
        }
    }

    /// The variant data.
    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Restricts the query to the given nodes instead of letting the
    /// engine pick healthy ones.
    pub fn set_node_account_ids(&mut self, ids: Vec<AccountId>) -> &mut Self {
        self.node_account_ids = Some(ids);
        self
    }

    /// Pays exactly this much, skipping the cost probe.
    pub fn set_payment_amount(&mut self, amount: Hbar) -> &mut Self {
        self.payment_amount = Some(amount);
        self
    }

    /// Per-query cap on what the probe may commit to; defaults to the
    /// client-wide maximum.
    pub fn set_max_payment_amount(&mut self, max: Hbar) -> &mut Self {
        self.max_payment_amount = Some(max);
        self
    }

    /// Per-query attempt budget override.
    pub fn set_max_attempts(&mut self, max: usize) -> &mut Self {
        self.max_attempts = Some(max);
        self
    }

    /// Per-query per-attempt deadline override.
    pub fn set_grpc_deadline(&mut self, deadline: Duration) -> &mut Self {
        self.grpc_deadline = Some(deadline);
        self
    }

    fn params<'a>(&self, client: &'a Client, timeout: Duration) -> ExecuteParams<'a> {
        ExecuteParams {
            network: client.network(),
            max_attempts: self.max_attempts.unwrap_or_else(|| client.max_attempts()),
            min_backoff: client.min_backoff(),
            max_backoff: client.max_backoff(),
            grpc_deadline: self.grpc_deadline.unwrap_or_else(|| client.grpc_deadline()),
            timeout,
            cancel: client.cancel_token(),
            // Query payments are freshly generated per attempt; the expired
            // path never applies to the query itself.
            regenerate_transaction_id: false,
        }
    }

    /// Asks a node what the answer will cost. Cached: a second call (and
    /// the paid phase after any call) costs no further round-trip.
    pub async fn get_cost(&mut self, client: &Client) -> Result<Hbar> {
        if self.data.is_free() {
            return Ok(Hbar::ZERO);
        }
        if let Some(cost) = self.cached_cost {
            return Ok(cost);
        }
        self.data.validate()?;
        let params = self.params(client, client.request_timeout());
        let mut probe = CostProbe {
            data: &self.data,
            node_account_ids: self.node_account_ids.clone(),
        };
        let tinybars = execute::execute(&mut probe, &params).await?;
        let cost = Hbar::from_tinybars(tinybars as i64);
        debug!(cost = %cost, "query cost probed");
        self.cached_cost = Some(cost);
        Ok(cost)
    }

    /// Runs the query to completion under the client's request timeout.
    pub async fn execute(&mut self, client: &Client) -> Result<D::Response> {
        self.execute_with_timeout(client, client.request_timeout()).await
    }

    /// [`Self::execute`] with an explicit overall deadline.
    pub async fn execute_with_timeout(
        &mut self,
        client: &Client,
        timeout: Duration,
    ) -> Result<D::Response> {
        self.data.validate()?;
        if client.auto_validate_checksums() {
            if let Some(ledger_id) = client.ledger_id() {
                self.data.validate_checksums(&ledger_id)?;
            }
        }

        let payment = if self.data.is_free() {
            None
        } else {
            let amount = match self.payment_amount {
                Some(amount) => amount,
                None => {
                    let cost = self.get_cost(client).await?;
                    let max = self
                        .max_payment_amount
                        .unwrap_or_else(|| client.default_max_query_payment());
                    if cost > max {
                        return Err(Error::MaxQueryPaymentExceeded { cost, max });
                    }
                    cost
                }
            };
            let operator = client
                .operator()
                .ok_or_else(|| Error::not_ready("paid query requires a client operator"))?;
            Some(PaymentSource { operator, amount })
        };

        let params = self.params(client, timeout);
        let mut executor = AnswerExecutor {
            data: &self.data,
            node_account_ids: self.node_account_ids.clone(),
            payment,
        };
        execute::execute(&mut executor, &params).await
    }
}

/// Who pays for a paid query, and how much.
struct PaymentSource {
    operator: Operator,
    amount: Hbar,
}

impl PaymentSource {
    /// A frozen, signed operator → node transfer covering the query cost.
    ///
    /// Built fresh per attempt so each target node gets a payment addressed
    /// to *it* — payments, like transaction copies, are not transferable
    /// between nodes.
    fn payment_bytes(&self, node_id: AccountId) -> Result<Vec<u8>> {
        let mut payment = TransferTransaction::new();
        payment
            .hbar_transfer(self.operator.account_id, self.amount.negated())?
            .hbar_transfer(node_id, self.amount)?
            .set_transaction_id(TransactionId::generate(self.operator.account_id))?
            .set_node_account_ids(vec![node_id])?
            .freeze()?;
        payment.sign_with(self.operator.signer.clone())?;
        payment.to_bytes()
    }
}

fn encode_query(
    mode: u8,
    payment: Option<&[u8]>,
    tag: u8,
    fields: impl FnOnce(&mut WireWriter),
) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.put_u8(mode);
    w.put_option(payment, |w, bytes| w.put_bytes(bytes));
    w.put_u8(tag);
    fields(&mut w);
    w.finish()
}

// ---------------------------------------------------------------------------
// Engine adapters
// ---------------------------------------------------------------------------

/// Phase one: `COST_ANSWER`, yielding tinybars.
struct CostProbe<'a, D: QueryData> {
    data: &'a D,
    node_account_ids: Option<Vec<AccountId>>,
}

impl<D: QueryData> Execute for CostProbe<'_, D> {
    type Response = u64;

    fn service(&self) -> Service {
        self.data.service()
    }

    fn kind(&self) -> RequestKind {
        RequestKind::Query
    }

    fn node_account_ids(&self) -> Option<Vec<AccountId>> {
        self.node_account_ids.clone()
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.data.transaction_id()
    }

    fn request_bytes(&self, _node_id: AccountId) -> Result<Vec<u8>> {
        Ok(encode_query(
            response_type::COST_ANSWER,
            None,
            self.data.variant_tag(),
            |w| self.data.encode_fields(w),
        ))
    }

    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision {
        self.data.classify(response)
    }

    fn map_response(
        &self,
        _node_id: AccountId,
        response: ResponseEnvelope,
    ) -> Result<Self::Response> {
        Ok(response.cost)
    }
}

/// Phase two: `ANSWER_ONLY`, optionally paid.
struct AnswerExecutor<'a, D: QueryData> {
    data: &'a D,
    node_account_ids: Option<Vec<AccountId>>,
    payment: Option<PaymentSource>,
}

impl<D: QueryData> Execute for AnswerExecutor<'_, D> {
    type Response = D::Response;

    fn service(&self) -> Service {
        self.data.service()
    }

    fn kind(&self) -> RequestKind {
        RequestKind::Query
    }

    fn node_account_ids(&self) -> Option<Vec<AccountId>> {
        self.node_account_ids.clone()
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.data.transaction_id()
    }

    fn request_bytes(&self, node_id: AccountId) -> Result<Vec<u8>> {
        let payment = self
            .payment
            .as_ref()
            .map(|source| source.payment_bytes(node_id))
            .transpose()?;
        Ok(encode_query(
            response_type::ANSWER_ONLY,
            payment.as_deref(),
            self.data.variant_tag(),
            |w| self.data.encode_fields(w),
        ))
    }

    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision {
        self.data.classify(response)
    }

    fn map_response(
        &self,
        _node_id: AccountId,
        response: ResponseEnvelope,
    ) -> Result<Self::Response> {
        self.data.decode_response(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::transaction::TransferTransaction as Transfer;
    use crate::wire::WireReader;

    #[test]
    fn payment_is_addressed_to_the_target_node() {
        let key = PrivateKey::generate_ed25519();
        let source = PaymentSource {
            operator: Operator::new(AccountId::new(1800), key),
            amount: Hbar::from_tinybars(25_000),
        };
        let bytes = source.payment_bytes(AccountId::new(4)).unwrap();
        let payment = Transfer::from_bytes(&bytes).unwrap();
        assert_eq!(payment.node_account_ids(), Some(vec![AccountId::new(4)]));
        // One signature, the operator's, already attached.
        let sigs = payment.signatures().unwrap();
        assert_eq!(sigs[&AccountId::new(4)].len(), 1);
    }

    #[test]
    fn distinct_nodes_get_distinct_payments() {
        let key = PrivateKey::generate_ed25519();
        let source = PaymentSource {
            operator: Operator::new(AccountId::new(1800), key),
            amount: Hbar::from_tinybars(25_000),
        };
        let a = source.payment_bytes(AccountId::new(3)).unwrap();
        let b = source.payment_bytes(AccountId::new(4)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn query_header_layout_is_stable() {
        let bytes = encode_query(response_type::ANSWER_ONLY, None, 9, |w| w.put_u64(77));
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_u8("mode").unwrap(), response_type::ANSWER_ONLY);
        assert_eq!(r.read_option("payment", |r| r.read_bytes("payment")).unwrap(), None);
        assert_eq!(r.read_u8("tag").unwrap(), 9);
        assert_eq!(r.read_u64("field").unwrap(), 77);
        r.expect_end().unwrap();
    }
}
