//! # The Client
//!
//! One `Client` per target network, long-lived, shared by reference across
//! tasks. It owns the node pool, the paying operator, and every policy
//! default an execute call falls back to: fee caps, payment caps, attempt
//! budgets, backoff bounds, deadlines. Individual transactions and queries
//! override any of them per request.
//!
//! Construction is cheap and lazy — no connection is opened until the first
//! request wants one. `close` cancels in-flight work and shuts every channel;
//! it is idempotent and safe to race.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tracing::info;

use crate::config::{
    DEFAULT_GRPC_DEADLINE, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_QUERY_PAYMENT,
    DEFAULT_MAX_TRANSACTION_FEE, DEFAULT_MIN_BACKOFF, DEFAULT_REQUEST_TIMEOUT,
};
use crate::crypto::{Operator, PrivateKey};
use crate::error::{Error, Result};
use crate::execute::{CancelSource, CancelToken};
use crate::hbar::Hbar;
use crate::ids::{AccountId, LedgerId};
use crate::network::{
    local_addresses, mainnet_addresses, previewnet_addresses, testnet_addresses, NetworkManager,
    NodeAddressBook,
};

/// Connection to one ledger network plus the client-wide execution policy.
pub struct Client {
    network: NetworkManager,
    operator: RwLock<Option<Operator>>,
    max_transaction_fee: Mutex<Hbar>,
    max_query_payment: Mutex<Hbar>,
    request_timeout: Mutex<Duration>,
    grpc_deadline: Mutex<Duration>,
    max_attempts: AtomicUsize,
    regenerate_transaction_id: AtomicBool,
    auto_validate_checksums: AtomicBool,
    mirror_endpoints: RwLock<Vec<String>>,
    cancel: CancelSource,
}

impl Client {
    fn with_network(network: NetworkManager, ledger_id: Option<LedgerId>) -> Self {
        network.store_ledger_id(ledger_id);
        Client {
            network,
            operator: RwLock::new(None),
            max_transaction_fee: Mutex::new(DEFAULT_MAX_TRANSACTION_FEE),
            max_query_payment: Mutex::new(DEFAULT_MAX_QUERY_PAYMENT),
            request_timeout: Mutex::new(DEFAULT_REQUEST_TIMEOUT),
            grpc_deadline: Mutex::new(DEFAULT_GRPC_DEADLINE),
            max_attempts: AtomicUsize::new(DEFAULT_MAX_ATTEMPTS),
            regenerate_transaction_id: AtomicBool::new(true),
            auto_validate_checksums: AtomicBool::new(false),
            mirror_endpoints: RwLock::new(Vec::new()),
            cancel: CancelSource::new(),
        }
    }

    // --- constructors ---

    /// A client for a named network: `mainnet`, `testnet`, `previewnet` or
    /// `local`.
    pub fn for_name(name: &str) -> Result<Self> {
        match name {
            "mainnet" => Self::for_mainnet(),
            "testnet" => Self::for_testnet(),
            "previewnet" => Self::for_previewnet(),
            "local" => Self::for_local_node(),
            other => Err(Error::Config(format!("unknown network name `{other}`"))),
        }
    }

    /// A client for the production network.
    pub fn for_mainnet() -> Result<Self> {
        let network = NetworkManager::from_addresses(&mainnet_addresses())?;
        Ok(Self::with_network(network, Some(LedgerId::mainnet())))
    }

    /// A client for the stable test network.
    pub fn for_testnet() -> Result<Self> {
        let network = NetworkManager::from_addresses(&testnet_addresses())?;
        Ok(Self::with_network(network, Some(LedgerId::testnet())))
    }

    /// A client for the preview test network.
    pub fn for_previewnet() -> Result<Self> {
        let network = NetworkManager::from_addresses(&previewnet_addresses())?;
        Ok(Self::with_network(network, Some(LedgerId::previewnet())))
    }

    /// A client for a single node on localhost.
    pub fn for_local_node() -> Result<Self> {
        let network = NetworkManager::from_addresses(&local_addresses())?;
        Ok(Self::with_network(network, None))
    }

    /// A client over an explicit `endpoint → node-account-id` map. No
    /// ledger id is assumed; set one for checksum validation.
    pub fn for_network(addresses: HashMap<String, AccountId>) -> Result<Self> {
        let network = NetworkManager::from_addresses(&addresses)?;
        Ok(Self::with_network(network, None))
    }

    /// A client from a JSON configuration:
    ///
    /// ```json
    /// {
    ///   "network": "testnet",
    ///   "operator": { "accountId": "0.0.1800", "privateKey": "302e…" },
    ///   "mirrorNetwork": ["mirror.testnet.meridian.network:443"]
    /// }
    /// ```
    ///
    /// `network` may also be an explicit `endpoint → account-id` map.
    pub fn from_config(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("client config json: {e}")))?;

        let client = match config.network {
            NetworkConfig::Named(name) => Self::for_name(&name)?,
            NetworkConfig::Map(map) => {
                let mut addresses = HashMap::new();
                for (endpoint, id) in map {
                    addresses.insert(endpoint, id.parse::<AccountId>()?);
                }
                Self::for_network(addresses)?
            }
        };

        if let Some(operator) = config.operator {
            let account_id = operator.account_id.parse::<AccountId>()?;
            let key = operator.private_key.parse::<PrivateKey>()?;
            client.set_operator(Operator::new(account_id, key));
        }
        *client.mirror_endpoints.write() = config.mirror_network;
        Ok(client)
    }

    // --- operator ---

    /// Installs (or replaces) the paying operator.
    pub fn set_operator(&self, operator: Operator) {
        info!(operator = %operator.account_id, "operator set");
        *self.operator.write() = Some(operator);
    }

    /// The current operator, if one is set.
    pub fn operator(&self) -> Option<Operator> {
        self.operator.read().clone()
    }

    // --- network ---

    /// The node pool.
    pub fn network(&self) -> &NetworkManager {
        &self.network
    }

    /// Atomically replaces the address book, preserving surviving nodes'
    /// health history.
    pub async fn set_network(&self, addresses: HashMap<String, AccountId>) -> Result<()> {
        self.network.set_network(&addresses).await
    }

    /// Replaces the network from a published address book.
    pub async fn set_network_from_address_book(&self, book: &NodeAddressBook) -> Result<()> {
        self.network.set_network_from_address_book(book).await
    }

    /// Switches every node channel to TLS or plaintext.
    pub async fn set_transport_security(&self, secure: bool) {
        self.network.set_transport_security(secure).await;
    }

    /// Sets the ledger id used for checksum validation; with an address
    /// book, also refreshes per-node certificate pins.
    pub async fn set_ledger_id(
        &self,
        ledger_id: Option<LedgerId>,
        book: Option<&NodeAddressBook>,
    ) {
        self.network.set_ledger_id(ledger_id, book).await;
    }

    /// The ledger this client validates checksums against.
    pub fn ledger_id(&self) -> Option<LedgerId> {
        self.network.ledger_id()
    }

    /// Mirror endpoints from configuration. Held for the caller; the core
    /// SDK opens no mirror connections.
    pub fn mirror_network(&self) -> Vec<String> {
        self.mirror_endpoints.read().clone()
    }

    /// Replaces the configured mirror endpoints.
    pub fn set_mirror_network(&self, endpoints: Vec<String>) {
        *self.mirror_endpoints.write() = endpoints;
    }

    // --- execution policy ---

    /// Default fee cap for transactions that set none.
    pub fn default_max_transaction_fee(&self) -> Hbar {
        *self.max_transaction_fee.lock()
    }

    /// Sets the client-wide fee cap. Rejects non-positive amounts.
    pub fn set_default_max_transaction_fee(&self, fee: Hbar) -> Result<()> {
        if fee.to_tinybars() <= 0 {
            return Err(Error::argument("max transaction fee must be positive"));
        }
        *self.max_transaction_fee.lock() = fee;
        Ok(())
    }

    /// Default cap on automatic query payments.
    pub fn default_max_query_payment(&self) -> Hbar {
        *self.max_query_payment.lock()
    }

    /// Sets the client-wide query payment cap. Rejects negative amounts.
    pub fn set_default_max_query_payment(&self, max: Hbar) -> Result<()> {
        if max.is_negative() {
            return Err(Error::argument("max query payment cannot be negative"));
        }
        *self.max_query_payment.lock() = max;
        Ok(())
    }

    /// Overall wall-clock budget per execute call.
    pub fn request_timeout(&self) -> Duration {
        *self.request_timeout.lock()
    }

    pub fn set_request_timeout(&self, timeout: Duration) {
        *self.request_timeout.lock() = timeout;
    }

    /// Per-attempt network deadline.
    pub fn grpc_deadline(&self) -> Duration {
        *self.grpc_deadline.lock()
    }

    pub fn set_grpc_deadline(&self, deadline: Duration) {
        *self.grpc_deadline.lock() = deadline;
    }

    /// Submit budget per execute call.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts.load(Ordering::Relaxed)
    }

    pub fn set_max_attempts(&self, max: usize) -> Result<()> {
        if max == 0 {
            return Err(Error::argument("max attempts cannot be zero"));
        }
        self.max_attempts.store(max, Ordering::Relaxed);
        Ok(())
    }

    /// Engine retry / node quarantine floor.
    pub fn min_backoff(&self) -> Duration {
        self.network.min_backoff()
    }

    /// Engine retry / node quarantine ceiling.
    pub fn max_backoff(&self) -> Duration {
        self.network.max_backoff()
    }

    /// Sets both backoff bounds, on the client and on every node.
    pub fn set_backoff(&self, min: Duration, max: Duration) -> Result<()> {
        if min.is_zero() || min > max {
            return Err(Error::argument("backoff bounds must satisfy 0 < min <= max"));
        }
        self.network.set_backoff_bounds(min, max);
        Ok(())
    }

    /// Whether expired transaction ids regenerate and retry by default.
    pub fn default_regenerate_transaction_id(&self) -> bool {
        self.regenerate_transaction_id.load(Ordering::Relaxed)
    }

    pub fn set_default_regenerate_transaction_id(&self, regenerate: bool) {
        self.regenerate_transaction_id.store(regenerate, Ordering::Relaxed);
    }

    /// Whether entity-id checksums are validated against the ledger before
    /// every execute.
    pub fn auto_validate_checksums(&self) -> bool {
        self.auto_validate_checksums.load(Ordering::Relaxed)
    }

    pub fn set_auto_validate_checksums(&self, validate: bool) {
        self.auto_validate_checksums.store(validate, Ordering::Relaxed);
    }

    // --- lifecycle ---

    /// A token that fires when this client closes.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.token()
    }

    /// Cancels in-flight requests and closes every node channel.
    /// Idempotent.
    pub async fn close(&self) {
        self.cancel.cancel();
        self.network.close().await;
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("nodes", &self.network.node_ids().len())
            .field("ledger_id", &self.ledger_id())
            .field("operator", &*self.operator.read())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// JSON configuration
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    network: NetworkConfig,
    #[serde(default)]
    operator: Option<OperatorConfig>,
    #[serde(default)]
    mirror_network: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NetworkConfig {
    Named(String),
    Map(HashMap<String, String>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperatorConfig {
    account_id: String,
    private_key: String,
}
