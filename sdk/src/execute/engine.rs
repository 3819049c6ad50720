//! The generic execution engine.
//!
//! One loop drives every request — transaction or query, paid or free —
//! through attempt, classification, backoff, and rotation until a terminal
//! outcome. The request itself is abstracted behind [`Execute`]: build the
//! wire bytes for one node, classify one response, map the final answer.
//! Nothing request-specific leaks into the loop.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::execute::cancel::CancelToken;
use crate::execute::classify::RetryDecision;
use crate::ids::{AccountId, TransactionId};
use crate::network::backoff::retry_delay;
use crate::network::NetworkManager;
use crate::wire::{RequestKind, ResponseEnvelope, Service};

/// One executable request, as the engine sees it.
pub trait Execute: Send {
    /// What a completed run yields.
    type Response: Send;

    /// The service this request routes to.
    fn service(&self) -> Service;

    /// Transaction or query submission.
    fn kind(&self) -> RequestKind;

    /// The explicit node fan-out (frozen transactions), or `None` to let
    /// the engine pick healthy nodes itself.
    fn node_account_ids(&self) -> Option<Vec<AccountId>>;

    /// The transaction id to report in errors, if the request has one.
    fn transaction_id(&self) -> Option<TransactionId>;

    /// The exact wire payload for the copy addressed to `node_id`.
    fn request_bytes(&self, node_id: AccountId) -> Result<Vec<u8>>;

    /// Classifies one response envelope.
    fn classify(&self, response: &ResponseEnvelope) -> RetryDecision;

    /// Maps a successful envelope into the caller-visible response.
    fn map_response(
        &self,
        node_id: AccountId,
        response: ResponseEnvelope,
    ) -> Result<Self::Response>;

    /// Rebuilds the transaction id after `TRANSACTION_EXPIRED`. Returns
    /// `false` when the request cannot regenerate (queries, chunk tails).
    fn regenerate_transaction_id(&mut self) -> Result<bool> {
        Ok(false)
    }
}

/// Engine knobs, resolved from client defaults and per-request overrides
/// before the loop starts.
#[derive(Clone)]
pub struct ExecuteParams<'a> {
    /// Node pool to draw from and report health to.
    pub network: &'a NetworkManager,
    /// Total submit budget across all nodes.
    pub max_attempts: usize,
    /// Engine-side same-node retry sleep floor.
    pub min_backoff: Duration,
    /// Engine-side same-node retry sleep ceiling.
    pub max_backoff: Duration,
    /// Per-attempt network deadline.
    pub grpc_deadline: Duration,
    /// Overall wall-clock budget for the whole run.
    pub timeout: Duration,
    /// Cancellation scope.
    pub cancel: CancelToken,
    /// Whether `TRANSACTION_EXPIRED` may regenerate the id and retry.
    pub regenerate_transaction_id: bool,
}

/// Drives `executable` to a terminal outcome.
pub async fn execute<E: Execute>(
    executable: &mut E,
    params: &ExecuteParams<'_>,
) -> Result<E::Response> {
    let deadline = Instant::now() + params.timeout;
    let service = executable.service();
    let kind = executable.kind();

    // A frozen transaction brings its own fan-out; everything else asks the
    // pool for the healthiest peers.
    let node_ids = match executable.node_account_ids() {
        Some(ids) if !ids.is_empty() => ids,
        _ => {
            params
                .network
                .select_node_ids(params.max_attempts, deadline)
                .await?
        }
    };

    let mut cursor = 0usize;
    let mut consecutive_retries = 0u32;
    let mut attempts_used = 0usize;
    let mut missing_in_a_row = 0usize;
    let mut last_error: Option<Error> = None;

    while attempts_used < params.max_attempts {
        if Instant::now() >= deadline {
            return Err(timeout_error(params.timeout, last_error));
        }
        if params.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let node_id = node_ids[cursor % node_ids.len()];
        let Some(node) = params.network.node_for(&node_id) else {
            // The address book was swapped under us and this peer is gone.
            cursor += 1;
            missing_in_a_row += 1;
            if missing_in_a_row >= node_ids.len() {
                return Err(Error::Config(
                    "every node this request was frozen for has left the network".into(),
                ));
            }
            continue;
        };
        missing_in_a_row = 0;

        if !node.is_healthy() {
            // Prefer rotating to a healthy candidate; only sleep when the
            // whole fan-out is quarantined.
            let any_other_healthy = node_ids.iter().any(|id| {
                *id != node_id
                    && params.network.node_for(id).is_some_and(|n| n.is_healthy())
            });
            if any_other_healthy {
                cursor += 1;
                continue;
            }
            let wake = node.next_eligible().min(deadline);
            debug!(node = %node_id, "all candidates quarantined, waiting");
            tokio::select! {
                _ = params.cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep_until(wake) => {}
            }
            continue;
        }

        let payload = executable.request_bytes(node_id)?;
        let attempt_deadline = deadline.min(Instant::now() + params.grpc_deadline);
        node.mark_used();
        attempts_used += 1;
        debug!(node = %node_id, attempt = attempts_used, ?service, "submitting");

        let submit = async {
            match kind {
                RequestKind::Transaction => {
                    node.submit_transaction(service, payload, attempt_deadline).await
                }
                RequestKind::Query => {
                    node.submit_query(service, payload, attempt_deadline).await
                }
            }
        };
        let outcome = tokio::select! {
            _ = params.cancel.cancelled() => return Err(Error::Cancelled),
            outcome = submit => outcome,
        };

        match outcome {
            Err(transport) => {
                warn!(node = %node_id, error = %transport, "transport failure, rotating");
                node.mark_unhealthy();
                last_error = Some(Error::Transport(transport));
                cursor += 1;
                consecutive_retries = 0;
            }
            Ok(response) => match executable.classify(&response) {
                RetryDecision::Success => {
                    node.mark_healthy();
                    return executable.map_response(node_id, response);
                }
                RetryDecision::RetrySameNode(status) => {
                    let delay = retry_delay(
                        params.min_backoff,
                        params.max_backoff,
                        consecutive_retries,
                    );
                    debug!(node = %node_id, %status, ?delay, "transient status, retrying in place");
                    consecutive_retries += 1;
                    last_error = Some(Error::Precheck {
                        status,
                        transaction_id: executable.transaction_id(),
                    });
                    let wake = (Instant::now() + delay).min(deadline);
                    tokio::select! {
                        _ = params.cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep_until(wake) => {}
                    }
                }
                RetryDecision::RotateNode(status) => {
                    warn!(node = %node_id, %status, "server error, rotating");
                    node.mark_unhealthy();
                    last_error = Some(Error::Precheck {
                        status,
                        transaction_id: executable.transaction_id(),
                    });
                    cursor += 1;
                    consecutive_retries = 0;
                }
                RetryDecision::RequestError(status) => {
                    return Err(Error::Precheck {
                        status,
                        transaction_id: executable.transaction_id(),
                    });
                }
                RetryDecision::Expired => {
                    let regenerated =
                        params.regenerate_transaction_id && executable.regenerate_transaction_id()?;
                    if regenerated {
                        debug!(node = %node_id, "transaction expired, id regenerated");
                        last_error = Some(Error::Precheck {
                            status: crate::wire::Status::TransactionExpired,
                            transaction_id: executable.transaction_id(),
                        });
                        // Resubmit immediately with the fresh id.
                        continue;
                    }
                    return Err(Error::Precheck {
                        status: crate::wire::Status::TransactionExpired,
                        transaction_id: executable.transaction_id(),
                    });
                }
            },
        }
    }

    Err(Error::MaxAttemptsExceeded {
        attempts: attempts_used,
        last_error: Box::new(
            last_error.unwrap_or(Error::Timeout(params.timeout)),
        ),
    })
}

fn timeout_error(timeout: Duration, last_error: Option<Error>) -> Error {
    match last_error {
        // Prefer surfacing what actually went wrong over a bare timeout.
        Some(err) => Error::MaxAttemptsExceeded { attempts: 0, last_error: Box::new(err) },
        None => Error::Timeout(timeout),
    }
}
