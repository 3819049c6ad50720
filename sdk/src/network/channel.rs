//! The per-node RPC channel: TCP (optionally TLS) plus length framing.
//!
//! A channel connects lazily on first submit and stays up until an I/O
//! error, a deadline, a TLS-mode change, or an explicit close tears it down.
//! Framing is a 4-byte little-endian length prefix around one envelope; the
//! envelope bytes themselves come from [`crate::wire`].
//!
//! TLS verification policy, in order of preference:
//! 1. A pinned certificate hash (SHA-384 of the peer cert DER) when the
//!    address book supplies one — the connection is refused unless the
//!    presented cert hashes to exactly that value.
//! 2. System trust via the bundled webpki roots when `verify_certificates`
//!    is on.
//! 3. Accept-any when it is off — for custom and local test networks whose
//!    certs are self-signed.

use std::sync::Arc;
use std::time::SystemTime;

use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName};
use sha2::{Digest, Sha384};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::MAX_FRAME_SIZE;
use crate::error::TransportError;
use crate::network::address_book::Endpoint;
use crate::wire::{RequestEnvelope, RequestKind, ResponseEnvelope, Service, WireDecode, WireEncode};

/// How a channel secures (or doesn't) its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSecurity {
    /// Plaintext TCP.
    Plain,
    /// TLS with the given verification policy.
    Tls(TlsPolicy),
}

/// TLS verification policy for one node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsPolicy {
    /// SHA-384 of the expected peer certificate DER.
    pub pinned_cert_hash: Option<Vec<u8>>,
    /// Without a pin: `true` verifies against system roots, `false`
    /// accepts any certificate.
    pub verify_certificates: bool,
}

trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

type Conn = Box<dyn Stream>;

/// A lazily-connected framed channel to one endpoint.
pub struct NodeChannel {
    endpoint: Endpoint,
    security: ChannelSecurity,
    conn: Mutex<Option<Conn>>,
}

impl NodeChannel {
    /// A channel that will connect on first use.
    pub fn new(endpoint: Endpoint, security: ChannelSecurity) -> Self {
        NodeChannel { endpoint, security, conn: Mutex::new(None) }
    }

    /// The endpoint this channel dials.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The security mode this channel was built with.
    pub fn security(&self) -> &ChannelSecurity {
        &self.security
    }

    /// Sends one request and reads one response, bounded by `deadline`.
    ///
    /// On any failure the connection is dropped so the next submit starts
    /// from a clean dial.
    pub async fn submit(
        &self,
        service: Service,
        kind: RequestKind,
        payload: Vec<u8>,
        deadline: Instant,
    ) -> Result<ResponseEnvelope, TransportError> {
        let mut guard = self.conn.lock().await;

        let result = tokio::time::timeout_at(deadline, async {
            if guard.is_none() {
                *guard = Some(self.connect().await?);
                debug!(endpoint = %self.endpoint, "channel connected");
            }
            let stream = guard.as_mut().unwrap_or_else(|| unreachable!("just connected"));

            let request = RequestEnvelope { service, kind, payload };
            write_frame(stream, &request.to_wire_bytes()).await?;
            let frame = read_frame(stream).await?;
            ResponseEnvelope::from_wire_bytes(&frame)
                .map_err(|e| TransportError::Protocol(e.to_string()))
        })
        .await;

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                *guard = None;
                Err(err)
            }
            Err(_) => {
                *guard = None;
                Err(TransportError::DeadlineExceeded(
                    deadline.saturating_duration_since(Instant::now()),
                ))
            }
        }
    }

    /// Drops the connection if one is up. Idempotent.
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        if guard.take().is_some() {
            debug!(endpoint = %self.endpoint, "channel closed");
        }
    }

    async fn connect(&self) -> Result<Conn, TransportError> {
        let addr = (self.endpoint.host.as_str(), self.endpoint.port);
        let tcp = TcpStream::connect(addr).await?;
        tcp.set_nodelay(true).ok();

        match &self.security {
            ChannelSecurity::Plain => Ok(Box::new(tcp)),
            ChannelSecurity::Tls(policy) => {
                let config = tls_config(policy);
                let server_name = ServerName::try_from(self.endpoint.host.as_str())
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                let connector = tokio_rustls::TlsConnector::from(config);
                let tls = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                Ok(Box::new(tls))
            }
        }
    }
}

impl std::fmt::Debug for NodeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeChannel")
            .field("endpoint", &self.endpoint.to_string())
            .field("security", &self.security)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

async fn write_frame<S: Stream + ?Sized>(stream: &mut S, bytes: &[u8]) -> Result<(), TransportError> {
    stream.write_all(&(bytes.len() as u32).to_le_bytes()).await?;
    stream.write_all(bytes).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_frame<S: Stream + ?Sized>(stream: &mut S) -> Result<Vec<u8>, TransportError> {
    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::Protocol(format!(
            "frame of {len} bytes exceeds limit"
        )));
    }
    let mut frame = vec![0u8; len];
    stream.read_exact(&mut frame).await?;
    Ok(frame)
}

// ---------------------------------------------------------------------------
// TLS verifiers
// ---------------------------------------------------------------------------

fn tls_config(policy: &TlsPolicy) -> Arc<ClientConfig> {
    let builder = ClientConfig::builder().with_safe_defaults();
    let config = match (&policy.pinned_cert_hash, policy.verify_certificates) {
        (Some(hash), _) => builder
            .with_custom_certificate_verifier(Arc::new(PinnedCertVerifier {
                expected_sha384: hash.clone(),
            }))
            .with_no_client_auth(),
        (None, true) => {
            let mut roots = RootCertStore::empty();
            roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
                OwnedTrustAnchor::from_subject_spki_name_constraints(
                    ta.subject,
                    ta.spki,
                    ta.name_constraints,
                )
            }));
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        (None, false) => builder
            .with_custom_certificate_verifier(Arc::new(AcceptAnyVerifier))
            .with_no_client_auth(),
    };
    Arc::new(config)
}

/// Accepts exactly the certificate whose DER hashes (SHA-384) to the pin.
struct PinnedCertVerifier {
    expected_sha384: Vec<u8>,
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let actual = Sha384::digest(&end_entity.0);
        if actual.as_slice() == self.expected_sha384.as_slice() {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::General(
                "peer certificate does not match pinned hash".into(),
            ))
        }
    }
}

/// Accepts anything. Only reachable when the caller explicitly turned
/// certificate verification off for a custom network.
struct AcceptAnyVerifier;

impl ServerCertVerifier for AcceptAnyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Status;

    async fn scripted_listener(
        reply: ResponseEnvelope,
    ) -> (std::net::SocketAddr, tokio::task::JoinHandle<RequestEnvelope>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut len_bytes = [0u8; 4];
            socket.read_exact(&mut len_bytes).await.unwrap();
            let mut frame = vec![0u8; u32::from_le_bytes(len_bytes) as usize];
            socket.read_exact(&mut frame).await.unwrap();
            let request = RequestEnvelope::from_wire_bytes(&frame).unwrap();

            let bytes = reply.to_wire_bytes();
            socket.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
            socket.write_all(&bytes).await.unwrap();
            request
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn submit_round_trip_plaintext() {
        let reply = ResponseEnvelope { precheck: Status::Ok, cost: 7, body: vec![9] };
        let (addr, server) = scripted_listener(reply.clone()).await;

        let channel = NodeChannel::new(
            Endpoint::new(addr.ip().to_string(), addr.port()),
            ChannelSecurity::Plain,
        );
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        let response = channel
            .submit(Service::Crypto, RequestKind::Transaction, vec![1, 2, 3], deadline)
            .await
            .unwrap();
        assert_eq!(response, reply);

        let request = server.await.unwrap();
        assert_eq!(request.service, Service::Crypto);
        assert_eq!(request.payload, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        // Port 1 on localhost is essentially guaranteed closed.
        let channel = NodeChannel::new(Endpoint::new("127.0.0.1", 1), ChannelSecurity::Plain);
        let deadline = Instant::now() + std::time::Duration::from_secs(2);
        let err = channel
            .submit(Service::Crypto, RequestKind::Query, vec![], deadline)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Unavailable(_) | TransportError::DeadlineExceeded(_)
        ));
    }

    #[tokio::test]
    async fn deadline_cuts_off_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept, then say nothing.
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });

        let channel = NodeChannel::new(
            Endpoint::new(addr.ip().to_string(), addr.port()),
            ChannelSecurity::Plain,
        );
        let deadline = Instant::now() + std::time::Duration::from_millis(200);
        let err = channel
            .submit(Service::Crypto, RequestKind::Query, vec![], deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let channel = NodeChannel::new(Endpoint::new("127.0.0.1", 1), ChannelSecurity::Plain);
        channel.close().await;
        channel.close().await;
    }
}
