//! One addressable peer: identity, channel, and health bookkeeping.
//!
//! The execution engine reports every attempt's outcome here; the node turns
//! that into an exponential quarantine (`next_eligible`) the selector
//! honors. Health state lives under the node's own lock; the channel is an
//! `Arc` swapped wholesale on TLS-mode or certificate changes so in-flight
//! submits finish on the connection they started with.

use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

use crate::config::{DEFAULT_PLAIN_PORT, DEFAULT_TLS_PORT};
use crate::error::TransportError;
use crate::ids::AccountId;
use crate::network::address_book::Endpoint;
use crate::network::backoff::Backoff;
use crate::network::channel::{ChannelSecurity, NodeChannel, TlsPolicy};
use crate::wire::{RequestKind, ResponseEnvelope, Service};

/// Health counters and quarantine state for one node.
#[derive(Debug)]
struct NodeHealth {
    backoff: Backoff,
    last_attempt: Option<Instant>,
    next_eligible: Instant,
    use_count: u64,
    success_count: u64,
    failure_count: u64,
}

/// A network peer the SDK can submit to.
pub struct Node {
    account_id: AccountId,
    channel: RwLock<Arc<NodeChannel>>,
    health: Mutex<NodeHealth>,
    verify_certificates: Mutex<bool>,
    cert_hash: Mutex<Option<Vec<u8>>>,
}

impl Node {
    /// A node with a fresh (lazily-connecting) plaintext or TLS channel.
    pub fn new(
        account_id: AccountId,
        endpoint: Endpoint,
        min_backoff: Duration,
        max_backoff: Duration,
        security: ChannelSecurity,
    ) -> Self {
        Node {
            account_id,
            channel: RwLock::new(Arc::new(NodeChannel::new(endpoint, security))),
            health: Mutex::new(NodeHealth {
                backoff: Backoff::new(min_backoff, max_backoff),
                last_attempt: None,
                next_eligible: Instant::now(),
                use_count: 0,
                success_count: 0,
                failure_count: 0,
            }),
            verify_certificates: Mutex::new(true),
            cert_hash: Mutex::new(None),
        }
    }

    /// The peer identity.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The endpoint the current channel dials.
    pub fn endpoint(&self) -> Endpoint {
        self.channel.read().endpoint().clone()
    }

    /// `true` when the quarantine window has passed.
    pub fn is_healthy(&self) -> bool {
        Instant::now() >= self.health.lock().next_eligible
    }

    /// When this node becomes eligible again.
    pub fn next_eligible(&self) -> Instant {
        self.health.lock().next_eligible
    }

    /// How long until the node is eligible; zero when healthy.
    pub fn time_until_eligible(&self) -> Duration {
        self.health.lock().next_eligible.saturating_duration_since(Instant::now())
    }

    /// The delay the next failure would impose. Selection sorts by this.
    pub fn current_backoff(&self) -> Duration {
        self.health.lock().backoff.current()
    }

    /// How many submits this node has received.
    pub fn use_count(&self) -> u64 {
        self.health.lock().use_count
    }

    pub fn success_count(&self) -> u64 {
        self.health.lock().success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.health.lock().failure_count
    }

    /// Records that a submit is being attempted now.
    pub fn mark_used(&self) {
        let mut health = self.health.lock();
        health.use_count += 1;
        health.last_attempt = Some(Instant::now());
    }

    /// Records a successful attempt: resets backoff, lifts quarantine.
    pub fn mark_healthy(&self) {
        let mut health = self.health.lock();
        let was_quarantined = health.backoff.current() > health.backoff.min();
        health.success_count += 1;
        health.backoff.reset();
        health.next_eligible = Instant::now();
        if was_quarantined {
            info!(node = %self.account_id, "node recovered");
        }
    }

    /// Records a failed attempt: quarantines for the current backoff and
    /// doubles it for next time.
    pub fn mark_unhealthy(&self) {
        let mut health = self.health.lock();
        health.failure_count += 1;
        let delay = health.backoff.record_failure();
        health.next_eligible = Instant::now() + delay;
        info!(node = %self.account_id, backoff = ?delay, "node quarantined");
    }

    /// Tightens the backoff bounds (client-wide configuration).
    pub fn set_backoff_bounds(&self, min: Duration, max: Duration) {
        self.health.lock().backoff.set_bounds(min, max);
    }

    /// `true` when the channel is TLS.
    pub fn is_secure(&self) -> bool {
        matches!(self.channel.read().security(), ChannelSecurity::Tls(_))
    }

    /// Updates the pinned certificate hash; rebuilds the channel when the
    /// node is currently secure and the hash actually changed.
    pub async fn set_cert_hash(&self, hash: Option<Vec<u8>>) {
        {
            let mut stored = self.cert_hash.lock();
            if *stored == hash {
                return;
            }
            *stored = hash;
        }
        if self.is_secure() {
            self.to_secure().await;
        }
    }

    /// Whether to fall back to system trust when no hash is pinned.
    pub fn set_verify_certificates(&self, verify: bool) {
        *self.verify_certificates.lock() = verify;
    }

    /// Rebuilds the channel with TLS, moving default plaintext ports to the
    /// TLS port. Invalidates the old channel.
    pub async fn to_secure(&self) {
        let policy = TlsPolicy {
            pinned_cert_hash: self.cert_hash.lock().clone(),
            verify_certificates: *self.verify_certificates.lock(),
        };
        let mut endpoint = self.endpoint();
        if endpoint.port == DEFAULT_PLAIN_PORT {
            endpoint.port = DEFAULT_TLS_PORT;
        }
        self.replace_channel(endpoint, ChannelSecurity::Tls(policy)).await;
    }

    /// Rebuilds the channel without TLS, moving default TLS ports back to
    /// the plaintext port. Invalidates the old channel.
    pub async fn to_insecure(&self) {
        let mut endpoint = self.endpoint();
        if endpoint.port == DEFAULT_TLS_PORT {
            endpoint.port = DEFAULT_PLAIN_PORT;
        }
        self.replace_channel(endpoint, ChannelSecurity::Plain).await;
    }

    async fn replace_channel(&self, endpoint: Endpoint, security: ChannelSecurity) {
        let old = {
            let mut guard = self.channel.write();
            std::mem::replace(&mut *guard, Arc::new(NodeChannel::new(endpoint, security)))
        };
        old.close().await;
    }

    /// Submits transaction bytes to this node's service endpoint.
    pub async fn submit_transaction(
        &self,
        service: Service,
        payload: Vec<u8>,
        deadline: Instant,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.submit(service, RequestKind::Transaction, payload, deadline).await
    }

    /// Submits query bytes to this node's service endpoint.
    pub async fn submit_query(
        &self,
        service: Service,
        payload: Vec<u8>,
        deadline: Instant,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.submit(service, RequestKind::Query, payload, deadline).await
    }

    async fn submit(
        &self,
        service: Service,
        kind: RequestKind,
        payload: Vec<u8>,
        deadline: Instant,
    ) -> Result<ResponseEnvelope, TransportError> {
        // Clone the Arc so a concurrent channel rebuild can't invalidate the
        // connection under us mid-submit.
        let channel = Arc::clone(&self.channel.read());
        channel.submit(service, kind, payload, deadline).await
    }

    /// Closes the channel. Idempotent.
    pub async fn close(&self) {
        let channel = Arc::clone(&self.channel.read());
        channel.close().await;
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("account_id", &self.account_id.to_string())
            .field("endpoint", &self.endpoint().to_string())
            .field("healthy", &self.is_healthy())
            .field("use_count", &self.use_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF};

    fn test_node() -> Node {
        Node::new(
            AccountId::new(3),
            Endpoint::new("127.0.0.1", 50211),
            DEFAULT_MIN_BACKOFF,
            DEFAULT_MAX_BACKOFF,
            ChannelSecurity::Plain,
        )
    }

    #[test]
    fn fresh_node_is_healthy() {
        let node = test_node();
        assert!(node.is_healthy());
        assert_eq!(node.time_until_eligible(), Duration::ZERO);
    }

    #[test]
    fn failure_quarantines_with_growing_backoff() {
        let node = test_node();
        node.mark_used();
        node.mark_unhealthy();
        assert!(!node.is_healthy());
        let first = node.time_until_eligible();
        assert!(first > Duration::ZERO && first <= DEFAULT_MIN_BACKOFF);

        node.mark_used();
        node.mark_unhealthy();
        let second = node.time_until_eligible();
        // Second quarantine is the doubled delay.
        assert!(second > first);
        assert_eq!(node.failure_count(), 2);
    }

    #[test]
    fn success_resets_quarantine() {
        let node = test_node();
        for _ in 0..4 {
            node.mark_used();
            node.mark_unhealthy();
        }
        node.mark_used();
        node.mark_healthy();
        assert!(node.is_healthy());
        assert_eq!(node.current_backoff(), DEFAULT_MIN_BACKOFF);
        assert_eq!(node.success_count(), 1);
        assert_eq!(node.use_count(), 5);
    }

    #[test]
    fn backoff_cap_holds_after_many_failures() {
        let node = test_node();
        for _ in 0..20 {
            node.mark_used();
            node.mark_unhealthy();
        }
        assert!(node.time_until_eligible() <= DEFAULT_MAX_BACKOFF);
    }

    #[tokio::test]
    async fn secure_toggle_switches_default_port() {
        let node = test_node();
        assert!(!node.is_secure());

        node.to_secure().await;
        assert!(node.is_secure());
        assert_eq!(node.endpoint().port, DEFAULT_TLS_PORT);

        node.to_insecure().await;
        assert!(!node.is_secure());
        assert_eq!(node.endpoint().port, DEFAULT_PLAIN_PORT);
    }

    #[tokio::test]
    async fn cert_hash_change_rebuilds_only_secure_channels() {
        let node = test_node();
        node.set_cert_hash(Some(vec![1; 48])).await;
        // Still plaintext; the hash is stored for a later to_secure.
        assert!(!node.is_secure());

        node.to_secure().await;
        match node.channel.read().security() {
            ChannelSecurity::Tls(policy) => {
                assert_eq!(policy.pinned_cert_hash, Some(vec![1; 48]));
            }
            ChannelSecurity::Plain => panic!("expected tls"),
        };
    }
}
