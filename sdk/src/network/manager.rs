//! The node pool: healthy-node selection and atomic reconfiguration.
//!
//! The manager owns every [`Node`] keyed by peer identity. Multiple
//! endpoints may serve the same peer; submits round-robin within the peer.
//! All map mutations (address-book swap, TLS walk, ledger change) hold the
//! single write lock; selection takes a snapshot and never holds the lock
//! across a sleep or a submit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::{DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF, DEFAULT_PLAIN_PORT};
use crate::error::Error;
use crate::ids::{AccountId, LedgerId};
use crate::network::address_book::{Endpoint, NodeAddressBook};
use crate::network::channel::ChannelSecurity;
use crate::network::node::Node;

/// All endpoints serving one peer identity, with a round-robin cursor.
struct Peer {
    nodes: Vec<Arc<Node>>,
    cursor: AtomicUsize,
}

impl Peer {
    fn pick(&self) -> Arc<Node> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        Arc::clone(&self.nodes[i % self.nodes.len()])
    }
}

/// The healthy-node selector and address-book owner.
pub struct NetworkManager {
    peers: RwLock<HashMap<AccountId, Peer>>,
    ledger_id: RwLock<Option<LedgerId>>,
    transport_security: AtomicBool,
    verify_certificates: AtomicBool,
    min_backoff: Mutex<Duration>,
    max_backoff: Mutex<Duration>,
    tiebreak: Mutex<StdRng>,
    closed: AtomicBool,
}

impl NetworkManager {
    /// A manager over an explicit `endpoint → peer-id` map.
    pub fn from_addresses(addresses: &HashMap<String, AccountId>) -> Result<Self, Error> {
        let manager = NetworkManager {
            peers: RwLock::new(HashMap::new()),
            ledger_id: RwLock::new(None),
            transport_security: AtomicBool::new(false),
            verify_certificates: AtomicBool::new(true),
            min_backoff: Mutex::new(DEFAULT_MIN_BACKOFF),
            max_backoff: Mutex::new(DEFAULT_MAX_BACKOFF),
            tiebreak: Mutex::new(StdRng::from_entropy()),
            closed: AtomicBool::new(false),
        };
        let parsed = Self::parse_addresses(addresses)?;
        *manager.peers.write() = manager.build_peers(parsed, &HashMap::new());
        Ok(manager)
    }

    /// Seeds the selection tiebreak for deterministic tests.
    pub fn set_tiebreak_seed(&self, seed: u64) {
        *self.tiebreak.lock() = StdRng::seed_from_u64(seed);
    }

    /// The peer ids currently in the pool, in no particular order.
    pub fn node_ids(&self) -> Vec<AccountId> {
        self.peers.read().keys().copied().collect()
    }

    /// The current `endpoint → peer-id` view of the pool.
    pub fn addresses(&self) -> HashMap<String, AccountId> {
        let peers = self.peers.read();
        let mut out = HashMap::new();
        for (id, peer) in peers.iter() {
            for node in &peer.nodes {
                out.insert(node.endpoint().to_string(), *id);
            }
        }
        out
    }

    /// One node for the given peer, round-robin across its endpoints.
    pub fn node_for(&self, account_id: &AccountId) -> Option<Arc<Node>> {
        self.peers.read().get(account_id).map(Peer::pick)
    }

    /// The configured ledger id, if any.
    pub fn ledger_id(&self) -> Option<LedgerId> {
        self.ledger_id.read().clone()
    }

    /// Whether channels are TLS.
    pub fn is_transport_security(&self) -> bool {
        self.transport_security.load(Ordering::Relaxed)
    }

    /// Returns up to `limit` distinct healthy peer ids, most-healthy-first.
    ///
    /// Ordering: current backoff ascending, then use count ascending, then a
    /// random tiebreak (seedable via [`Self::set_tiebreak_seed`]). When no
    /// node is healthy, sleeps until the earliest `next_eligible`, bounded
    /// by `deadline`.
    pub async fn select_node_ids(
        &self,
        limit: usize,
        deadline: Instant,
    ) -> Result<Vec<AccountId>, Error> {
        loop {
            // Snapshot one node per peer; the lock is not held past here.
            let snapshot: Vec<Arc<Node>> = {
                let peers = self.peers.read();
                peers.values().map(Peer::pick).collect()
            };
            if snapshot.is_empty() {
                return Err(Error::Config("network has no nodes".into()));
            }

            let mut healthy: Vec<(Duration, u64, u64, AccountId)> = {
                let mut rng = self.tiebreak.lock();
                snapshot
                    .iter()
                    .filter(|n| n.is_healthy())
                    .map(|n| {
                        (
                            n.current_backoff(),
                            n.use_count(),
                            rng.gen::<u64>(),
                            n.account_id(),
                        )
                    })
                    .collect()
            };

            if !healthy.is_empty() {
                healthy.sort();
                let k = limit.clamp(1, healthy.len());
                return Ok(healthy.into_iter().take(k).map(|(_, _, _, id)| id).collect());
            }

            // Everyone is quarantined: wait out the earliest readmission,
            // but never past the request deadline.
            let earliest = snapshot
                .iter()
                .map(|n| n.next_eligible())
                .min()
                .unwrap_or_else(Instant::now);
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout(Duration::ZERO));
            }
            let wake = earliest.min(deadline);
            warn!(wait = ?wake.saturating_duration_since(now), "no healthy nodes, waiting");
            tokio::time::sleep_until(wake).await;
            if Instant::now() >= deadline && wake == deadline {
                return Err(Error::Timeout(deadline.saturating_duration_since(now)));
            }
        }
    }

    /// Picks up to `limit` distinct peer ids for a transaction fan-out,
    /// without waiting.
    ///
    /// Same ordering as [`Self::select_node_ids`], but quarantined peers are
    /// admitted (last) when nothing healthy is available: a frozen
    /// transaction needs *some* node list now, and the engine re-checks
    /// health per attempt anyway.
    pub fn fan_out_node_ids(&self, limit: usize) -> Result<Vec<AccountId>, Error> {
        let snapshot: Vec<Arc<Node>> = {
            let peers = self.peers.read();
            peers.values().map(Peer::pick).collect()
        };
        if snapshot.is_empty() {
            return Err(Error::Config("network has no nodes".into()));
        }

        let mut ranked: Vec<(bool, Duration, u64, u64, AccountId)> = {
            let mut rng = self.tiebreak.lock();
            snapshot
                .iter()
                .map(|n| {
                    (
                        !n.is_healthy(),
                        n.current_backoff(),
                        n.use_count(),
                        rng.gen::<u64>(),
                        n.account_id(),
                    )
                })
                .collect()
        };
        ranked.sort();
        let k = limit.clamp(1, ranked.len());
        Ok(ranked.into_iter().take(k).map(|(_, _, _, _, id)| id).collect())
    }

    /// Atomically replaces the address book.
    ///
    /// Nodes whose `(peer-id, endpoint)` persists are reused so their health
    /// history survives; vanished nodes are closed exactly once; new nodes
    /// come up in the current TLS mode.
    pub async fn set_network(&self, addresses: &HashMap<String, AccountId>) -> Result<(), Error> {
        let parsed = Self::parse_addresses(addresses)?;

        let removed: Vec<Arc<Node>> = {
            // Build the replacement in scratch, reusing surviving nodes,
            // then swap under one write lock.
            let mut peers = self.peers.write();
            let new_map = self.build_peers(parsed, &peers);

            let mut removed = Vec::new();
            for (id, peer) in peers.iter() {
                for node in &peer.nodes {
                    let survives = new_map
                        .get(id)
                        .is_some_and(|p| p.nodes.iter().any(|n| Arc::ptr_eq(n, node)));
                    if !survives {
                        removed.push(Arc::clone(node));
                    }
                }
            }
            *peers = new_map;
            removed
        };

        info!(removed = removed.len(), "address book swapped");
        join_all(removed.iter().map(|n| n.close())).await;
        Ok(())
    }

    /// Replaces the network from a published address book, carrying over
    /// certificate hashes for TLS pinning.
    pub async fn set_network_from_address_book(
        &self,
        book: &NodeAddressBook,
    ) -> Result<(), Error> {
        let mut addresses = HashMap::new();
        for address in &book.node_addresses {
            for endpoint in &address.endpoints {
                addresses.insert(endpoint.to_string(), address.account_id);
            }
        }
        self.set_network(&addresses).await?;
        self.refresh_cert_hashes(book).await;
        Ok(())
    }

    /// Converts every node to TLS or plaintext, rebuilding channels.
    pub async fn set_transport_security(&self, secure: bool) {
        self.transport_security.store(secure, Ordering::Relaxed);
        let nodes = self.all_nodes();
        if secure {
            join_all(nodes.iter().map(|n| n.to_secure())).await;
        } else {
            join_all(nodes.iter().map(|n| n.to_insecure())).await;
        }
        info!(secure, nodes = nodes.len(), "transport security updated");
    }

    /// Whether unpinned TLS connections verify against system roots.
    pub fn set_verify_certificates(&self, verify: bool) {
        self.verify_certificates.store(verify, Ordering::Relaxed);
        for node in self.all_nodes() {
            node.set_verify_certificates(verify);
        }
    }

    /// Sets the ledger id (used for checksum validation) and, when an
    /// address book is supplied, refreshes per-node certificate hashes.
    pub async fn set_ledger_id(&self, ledger_id: Option<LedgerId>, book: Option<&NodeAddressBook>) {
        self.store_ledger_id(ledger_id);
        if let Some(book) = book {
            self.refresh_cert_hashes(book).await;
        }
    }

    /// Sets the ledger id without touching certificate state.
    pub(crate) fn store_ledger_id(&self, ledger_id: Option<LedgerId>) {
        *self.ledger_id.write() = ledger_id;
    }

    /// The configured quarantine floor.
    pub fn min_backoff(&self) -> Duration {
        *self.min_backoff.lock()
    }

    /// The configured quarantine ceiling.
    pub fn max_backoff(&self) -> Duration {
        *self.max_backoff.lock()
    }

    /// Tightens every node's backoff bounds.
    pub fn set_backoff_bounds(&self, min: Duration, max: Duration) {
        *self.min_backoff.lock() = min;
        *self.max_backoff.lock() = max;
        for node in self.all_nodes() {
            node.set_backoff_bounds(min, max);
        }
    }

    /// Closes every node. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let nodes = self.all_nodes();
        join_all(nodes.iter().map(|n| n.close())).await;
        info!(nodes = nodes.len(), "network closed");
    }

    fn all_nodes(&self) -> Vec<Arc<Node>> {
        self.peers
            .read()
            .values()
            .flat_map(|p| p.nodes.iter().cloned())
            .collect()
    }

    async fn refresh_cert_hashes(&self, book: &NodeAddressBook) {
        for node in self.all_nodes() {
            let hash = book
                .address_for(&node.account_id())
                .and_then(|a| a.cert_hash.clone());
            node.set_cert_hash(hash).await;
        }
    }

    fn parse_addresses(
        addresses: &HashMap<String, AccountId>,
    ) -> Result<Vec<(Endpoint, AccountId)>, Error> {
        let mut parsed = Vec::with_capacity(addresses.len());
        for (endpoint, id) in addresses {
            parsed.push((endpoint.parse::<Endpoint>()?, *id));
        }
        Ok(parsed)
    }

    fn build_peers(
        &self,
        parsed: Vec<(Endpoint, AccountId)>,
        existing: &HashMap<AccountId, Peer>,
    ) -> HashMap<AccountId, Peer> {
        let min = *self.min_backoff.lock();
        let max = *self.max_backoff.lock();
        let security = if self.transport_security.load(Ordering::Relaxed) {
            ChannelSecurity::Tls(Default::default())
        } else {
            ChannelSecurity::Plain
        };

        let mut map: HashMap<AccountId, Peer> = HashMap::new();
        for (endpoint, id) in parsed {
            let reused = existing.get(&id).and_then(|peer| {
                peer.nodes
                    .iter()
                    .find(|n| n.endpoint() == endpoint)
                    .cloned()
            });
            let node = reused.unwrap_or_else(|| {
                Arc::new(Node::new(id, endpoint, min, max, security.clone()))
            });
            map.entry(id)
                .or_insert_with(|| Peer { nodes: Vec::new(), cursor: AtomicUsize::new(0) })
                .nodes
                .push(node);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

fn preset(hosts: &[(&str, u64)]) -> HashMap<String, AccountId> {
    hosts
        .iter()
        .map(|(host, num)| {
            (
                format!("{host}:{DEFAULT_PLAIN_PORT}"),
                AccountId::new(*num),
            )
        })
        .collect()
}

/// The production network's well-known nodes.
pub fn mainnet_addresses() -> HashMap<String, AccountId> {
    preset(&[
        ("node0.mainnet.meridian.network", 3),
        ("node1.mainnet.meridian.network", 4),
        ("node2.mainnet.meridian.network", 5),
        ("node3.mainnet.meridian.network", 6),
        ("node4.mainnet.meridian.network", 7),
        ("node5.mainnet.meridian.network", 8),
        ("node6.mainnet.meridian.network", 9),
    ])
}

/// The stable test network.
pub fn testnet_addresses() -> HashMap<String, AccountId> {
    preset(&[
        ("node0.testnet.meridian.network", 3),
        ("node1.testnet.meridian.network", 4),
        ("node2.testnet.meridian.network", 5),
        ("node3.testnet.meridian.network", 6),
    ])
}

/// The preview test network.
pub fn previewnet_addresses() -> HashMap<String, AccountId> {
    preset(&[
        ("node0.previewnet.meridian.network", 3),
        ("node1.previewnet.meridian.network", 4),
        ("node2.previewnet.meridian.network", 5),
        ("node3.previewnet.meridian.network", 6),
    ])
}

/// A single-node network on localhost.
pub fn local_addresses() -> HashMap<String, AccountId> {
    preset(&[("127.0.0.1", 3)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_node_manager() -> NetworkManager {
        let mut addresses = HashMap::new();
        addresses.insert("127.0.0.1:50211".to_string(), AccountId::new(3));
        addresses.insert("127.0.0.2:50211".to_string(), AccountId::new(4));
        addresses.insert("127.0.0.3:50211".to_string(), AccountId::new(5));
        NetworkManager::from_addresses(&addresses).unwrap()
    }

    #[tokio::test]
    async fn selects_up_to_limit_healthy_nodes() {
        let manager = three_node_manager();
        manager.set_tiebreak_seed(7);
        let deadline = Instant::now() + Duration::from_secs(1);

        let two = manager.select_node_ids(2, deadline).await.unwrap();
        assert_eq!(two.len(), 2);
        let all = manager.select_node_ids(10, deadline).await.unwrap();
        assert_eq!(all.len(), 3);
        // Distinct peers.
        let mut dedup = all.clone();
        dedup.dedup();
        assert_eq!(dedup.len(), 3);
    }

    #[tokio::test]
    async fn quarantined_nodes_are_not_selected() {
        let manager = three_node_manager();
        manager.set_tiebreak_seed(7);
        let bad = manager.node_for(&AccountId::new(4)).unwrap();
        bad.mark_used();
        bad.mark_unhealthy();

        let deadline = Instant::now() + Duration::from_secs(1);
        let selected = manager.select_node_ids(10, deadline).await.unwrap();
        assert_eq!(selected.len(), 2);
        assert!(!selected.contains(&AccountId::new(4)));
    }

    #[tokio::test]
    async fn selection_prefers_less_used_nodes() {
        let manager = three_node_manager();
        manager.set_tiebreak_seed(7);
        // Burn use-count on two of the three.
        for id in [3u64, 4] {
            let node = manager.node_for(&AccountId::new(id)).unwrap();
            for _ in 0..5 {
                node.mark_used();
            }
            node.mark_healthy();
        }
        let deadline = Instant::now() + Duration::from_secs(1);
        let selected = manager.select_node_ids(1, deadline).await.unwrap();
        assert_eq!(selected[0], AccountId::new(5));
    }

    #[tokio::test]
    async fn waits_for_readmission_when_all_quarantined() {
        let manager = three_node_manager();
        for id in [3u64, 4, 5] {
            let node = manager.node_for(&AccountId::new(id)).unwrap();
            node.mark_used();
            node.mark_unhealthy();
        }
        let start = Instant::now();
        let deadline = start + Duration::from_secs(5);
        let selected = manager.select_node_ids(1, deadline).await.unwrap();
        assert_eq!(selected.len(), 1);
        // Had to wait out at least (roughly) the minimum backoff.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn selection_times_out_when_nothing_recovers() {
        let manager = three_node_manager();
        for id in [3u64, 4, 5] {
            let node = manager.node_for(&AccountId::new(id)).unwrap();
            // Push next_eligible far out.
            for _ in 0..10 {
                node.mark_used();
                node.mark_unhealthy();
            }
        }
        let deadline = Instant::now() + Duration::from_millis(100);
        let result = manager.select_node_ids(1, deadline).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn set_network_preserves_surviving_node_health() {
        let manager = three_node_manager();
        let node3 = manager.node_for(&AccountId::new(3)).unwrap();
        node3.mark_used();
        node3.mark_healthy();

        // Drop 0.0.4, add 0.0.6.
        let mut addresses = HashMap::new();
        addresses.insert("127.0.0.1:50211".to_string(), AccountId::new(3));
        addresses.insert("127.0.0.3:50211".to_string(), AccountId::new(5));
        addresses.insert("127.0.0.6:50211".to_string(), AccountId::new(6));
        manager.set_network(&addresses).await.unwrap();

        let ids = manager.node_ids();
        assert!(ids.contains(&AccountId::new(6)));
        assert!(!ids.contains(&AccountId::new(4)));
        // Health history preserved via node reuse.
        let node3_after = manager.node_for(&AccountId::new(3)).unwrap();
        assert!(Arc::ptr_eq(&node3, &node3_after));
        assert_eq!(node3_after.success_count(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let manager = three_node_manager();
        manager.close().await;
        manager.close().await;
    }

    #[test]
    fn presets_are_well_formed() {
        for addresses in [
            mainnet_addresses(),
            testnet_addresses(),
            previewnet_addresses(),
            local_addresses(),
        ] {
            assert!(!addresses.is_empty());
            for endpoint in addresses.keys() {
                endpoint.parse::<Endpoint>().unwrap();
            }
        }
    }
}
