//! End-to-end tests against an in-process scripted ledger.
//!
//! Each test spins up one or more TCP listeners that speak the real wire
//! protocol — length-framed request/response envelopes — and replies from a
//! per-node script. That exercises the full client stack exactly as a live
//! network would see it: freeze, signing, node selection, retry and
//! rotation, chunking, query payments, and receipt polling, all the way
//! down to bytes on a socket.
//!
//! Each test owns its listeners and its client. No shared state, no test
//! ordering dependencies.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use meridian_sdk::wire::{
    RequestEnvelope, RequestKind, ResponseEnvelope, WireDecode, WireEncode, WireReader, WireWriter,
};
use tracing_subscriber::EnvFilter;
use meridian_sdk::{
    AccountId, Client, Error, FileContents, FileContentsQuery, FileId, Hbar, Operator, PrivateKey,
    Status, TopicId, TopicMessageSubmitTransaction, Transaction, TransactionReceipt,
    TransferTransaction,
};

// ---------------------------------------------------------------------------
// Scripted ledger node
// ---------------------------------------------------------------------------

/// One scripted move of a fake node.
enum Reply {
    /// Send this envelope back.
    Respond(ResponseEnvelope),
    /// Read the request, then drop the connection without answering.
    Hangup,
}

fn ok_ack() -> Reply {
    Reply::Respond(ResponseEnvelope::ack(Status::Ok))
}

fn receipt_reply(status: Status) -> Reply {
    let receipt = TransactionReceipt { status, ..TransactionReceipt::default() };
    Reply::Respond(ResponseEnvelope { precheck: Status::Ok, cost: 0, body: receipt.to_wire_bytes() })
}

/// A fake ledger node: accepts framed requests, logs them, and answers from
/// a script. Once the script runs dry every request gets a plain `OK` ack.
struct ScriptedNode {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RequestEnvelope>>>,
    script: Arc<Mutex<VecDeque<Reply>>>,
    disconnects: Arc<AtomicUsize>,
}

impl ScriptedNode {
    async fn start(script: Vec<Reply>) -> ScriptedNode {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<RequestEnvelope>>> = Arc::new(Mutex::new(Vec::new()));
        let script: Arc<Mutex<VecDeque<Reply>>> = Arc::new(Mutex::new(script.into()));
        let disconnects = Arc::new(AtomicUsize::new(0));

        let task_requests = Arc::clone(&requests);
        let task_script = Arc::clone(&script);
        let task_disconnects = Arc::clone(&disconnects);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { return };
                loop {
                    let mut len_bytes = [0u8; 4];
                    if socket.read_exact(&mut len_bytes).await.is_err() {
                        // Peer closed the channel.
                        task_disconnects.fetch_add(1, Ordering::SeqCst);
                        break;
                    }
                    let mut frame = vec![0u8; u32::from_le_bytes(len_bytes) as usize];
                    socket.read_exact(&mut frame).await.unwrap();
                    let request = RequestEnvelope::from_wire_bytes(&frame).unwrap();
                    task_requests.lock().push(request);

                    let reply = task_script.lock().pop_front().unwrap_or_else(ok_ack);
                    match reply {
                        Reply::Respond(envelope) => {
                            let bytes = envelope.to_wire_bytes();
                            socket.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
                            socket.write_all(&bytes).await.unwrap();
                        }
                        Reply::Hangup => break,
                    }
                }
            }
        });

        ScriptedNode { addr, requests, script, disconnects }
    }

    fn address(&self) -> String {
        self.addr.to_string()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().clone()
    }

    fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn push(&self, reply: Reply) {
        self.script.lock().push_back(reply);
    }
}

/// A client over the given scripted nodes, with an operator and fast
/// backoff so retry tests finish quickly.
///
/// Run with `RUST_LOG=meridian_sdk=debug` to watch the engine think.
fn client_for(nodes: &[(&ScriptedNode, u64)]) -> Client {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut addresses = HashMap::new();
    for (node, id) in nodes {
        addresses.insert(node.address(), AccountId::new(*id));
    }
    let client = Client::for_network(addresses).unwrap();
    client.set_backoff(Duration::from_millis(5), Duration::from_millis(20)).unwrap();
    client.set_operator(Operator::new(AccountId::new(1800), PrivateKey::generate_ed25519()));
    client
}

/// A one-hbar transfer frozen for the given fan-out.
fn transfer_for(client: &Client, node_ids: Vec<AccountId>) -> TransferTransaction {
    let mut transaction = TransferTransaction::new();
    transaction
        .hbar_transfer(AccountId::new(1800), Hbar::new(-1).unwrap())
        .unwrap()
        .hbar_transfer(AccountId::new(2000), Hbar::new(1).unwrap())
        .unwrap()
        .set_node_account_ids(node_ids)
        .unwrap()
        .freeze_with(client)
        .unwrap();
    transaction
}

/// Rebuilds a transaction from the outer bytes of one submitted copy.
fn transaction_from_payload<D>(payload: &[u8]) -> Transaction<D>
where
    D: meridian_sdk::transaction::TransactionData,
{
    let mut w = WireWriter::new();
    w.put_seq(&[payload.to_vec()], |w, outer| w.put_bytes(outer));
    Transaction::from_bytes(&w.finish()).unwrap()
}

// ---------------------------------------------------------------------------
// Retry and rotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn busy_node_is_retried_in_place() {
    let node = ScriptedNode::start(vec![
        Reply::Respond(ResponseEnvelope::ack(Status::Busy)),
        Reply::Respond(ResponseEnvelope::ack(Status::Busy)),
        ok_ack(),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let response = transaction.execute(&client).await.unwrap();

    assert_eq!(response.node_account_id, AccountId::new(3));
    // Two BUSY replies, then the ack: three submissions to the same node.
    assert_eq!(node.request_count(), 3);
    let requests = node.requests();
    assert!(requests.iter().all(|r| r.kind == RequestKind::Transaction));
    assert_eq!(requests[0].payload, requests[1].payload);
}

#[tokio::test]
async fn transport_failure_rotates_to_the_next_node() {
    let flaky = ScriptedNode::start(vec![Reply::Hangup]).await;
    let healthy = ScriptedNode::start(vec![]).await;
    let client = client_for(&[(&flaky, 3), (&healthy, 4)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3), AccountId::new(4)]);
    let response = transaction.execute(&client).await.unwrap();

    assert_eq!(response.node_account_id, AccountId::new(4));
    assert_eq!(flaky.request_count(), 1);
    assert_eq!(healthy.request_count(), 1);
}

#[tokio::test]
async fn request_errors_are_terminal() {
    let node =
        ScriptedNode::start(vec![Reply::Respond(ResponseEnvelope::ack(Status::InvalidSignature))])
            .await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let err = transaction.execute(&client).await.unwrap_err();

    assert!(matches!(err, Error::Precheck { status: Status::InvalidSignature, .. }));
    // No retry budget spent on a request the node already judged invalid.
    assert_eq!(node.request_count(), 1);
}

#[tokio::test]
async fn attempt_budget_is_exhausted_loudly() {
    let node = ScriptedNode::start(vec![
        Reply::Respond(ResponseEnvelope::ack(Status::Busy)),
        Reply::Respond(ResponseEnvelope::ack(Status::Busy)),
        Reply::Respond(ResponseEnvelope::ack(Status::Busy)),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);
    client.set_max_attempts(3).unwrap();

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let err = transaction.execute(&client).await.unwrap_err();

    match err {
        Error::MaxAttemptsExceeded { attempts, last_error } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last_error, Error::Precheck { status: Status::Busy, .. }));
        }
        other => panic!("expected MaxAttemptsExceeded, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Transaction expiry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_id_is_regenerated_and_resubmitted() {
    let node = ScriptedNode::start(vec![
        Reply::Respond(ResponseEnvelope::ack(Status::TransactionExpired)),
        ok_ack(),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let original_id = transaction.transaction_id().unwrap();
    let response = transaction.execute(&client).await.unwrap();

    assert_ne!(response.transaction_id, original_id);
    let requests = node.requests();
    assert_eq!(requests.len(), 2);

    // The resubmitted copy carries a fresh id but the same payer and body.
    let first: TransferTransaction = transaction_from_payload(&requests[0].payload);
    let second: TransferTransaction = transaction_from_payload(&requests[1].payload);
    let (first_id, second_id) =
        (first.transaction_id().unwrap(), second.transaction_id().unwrap());
    assert_ne!(first_id, second_id);
    assert_eq!(first_id.account_id, second_id.account_id);
    assert_eq!(second_id, response.transaction_id);
}

#[tokio::test]
async fn expiry_without_regeneration_fails() {
    let node =
        ScriptedNode::start(vec![Reply::Respond(ResponseEnvelope::ack(Status::TransactionExpired))])
            .await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    transaction.set_regenerate_transaction_id(false);
    let err = transaction.execute(&client).await.unwrap_err();

    assert!(matches!(err, Error::Precheck { status: Status::TransactionExpired, .. }));
    assert_eq!(node.request_count(), 1);
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_message_is_chunked_in_order() {
    // Three chunks, each followed by its receipt poll.
    let node = ScriptedNode::start(vec![
        ok_ack(),
        receipt_reply(Status::Success),
        ok_ack(),
        receipt_reply(Status::Success),
        ok_ack(),
        receipt_reply(Status::Success),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);

    let mut submit = TopicMessageSubmitTransaction::new();
    submit
        .set_topic_id(TopicId::new(777))
        .unwrap()
        .set_message(vec![0xA5u8; 12 * 1024])
        .unwrap()
        .set_chunk_size(4096)
        .unwrap()
        .set_node_account_ids(vec![AccountId::new(3)])
        .unwrap();

    let responses = submit.execute_all(&client).await.unwrap();
    assert_eq!(responses.len(), 3);

    let requests = node.requests();
    assert_eq!(requests.len(), 6);
    let submissions: Vec<_> =
        requests.iter().filter(|r| r.kind == RequestKind::Transaction).collect();
    assert_eq!(submissions.len(), 3);

    // Every chunk carries its 4 KiB slice under its own id, all from the
    // same payer, in submission order.
    let mut seen_ids = Vec::new();
    for (index, request) in submissions.iter().enumerate() {
        let chunk: TopicMessageSubmitTransaction = transaction_from_payload(&request.payload);
        assert_eq!(chunk.message().len(), 4096);
        let id = chunk.transaction_id().unwrap();
        assert_eq!(id, responses[index].transaction_id);
        assert_eq!(id.account_id, AccountId::new(1800));
        seen_ids.push(id);
    }
    seen_ids.dedup();
    assert_eq!(seen_ids.len(), 3);
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Splits an encoded query payload into (mode, payment, variant tag).
fn decode_query_header(payload: &[u8]) -> (u8, Option<Vec<u8>>, u8) {
    let mut r = WireReader::new(payload);
    let mode = r.read_u8("mode").unwrap();
    let payment = r.read_option("payment", |r| r.read_bytes("payment")).unwrap();
    let tag = r.read_u8("tag").unwrap();
    (mode, payment, tag)
}

#[tokio::test]
async fn paid_query_probes_cost_then_pays_it() {
    let answer = FileContents { file_id: FileId::new(150), contents: b"genesis".to_vec() };
    let node = ScriptedNode::start(vec![
        Reply::Respond(ResponseEnvelope { precheck: Status::Ok, cost: 25_000, body: Vec::new() }),
        Reply::Respond(ResponseEnvelope {
            precheck: Status::Ok,
            cost: 0,
            body: answer.to_wire_bytes(),
        }),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);

    let contents = FileContentsQuery::new()
        .set_file_id(FileId::new(150))
        .set_node_account_ids(vec![AccountId::new(3)])
        .execute(&client)
        .await
        .unwrap();
    assert_eq!(contents, answer);

    // Exactly one probe and one paid answer.
    let requests = node.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.kind == RequestKind::Query));

    let (probe_mode, probe_payment, _) = decode_query_header(&requests[0].payload);
    assert_eq!(probe_mode, 0);
    assert!(probe_payment.is_none());

    let (answer_mode, answer_payment, _) = decode_query_header(&requests[1].payload);
    assert_eq!(answer_mode, 1);
    // The payment is a real signed transfer, addressed to the answering node.
    let payment = TransferTransaction::from_bytes(&answer_payment.unwrap()).unwrap();
    assert_eq!(payment.node_account_ids(), Some(vec![AccountId::new(3)]));
    let amounts: HashMap<AccountId, Hbar> = payment
        .data()
        .hbar_transfers()
        .iter()
        .map(|t| (t.account_id, t.amount))
        .collect();
    assert_eq!(amounts[&AccountId::new(1800)], Hbar::from_tinybars(-25_000));
    assert_eq!(amounts[&AccountId::new(3)], Hbar::from_tinybars(25_000));
}

#[tokio::test]
async fn probed_cost_over_the_cap_is_refused() {
    let two_hbar = Hbar::new(2).unwrap();
    let node = ScriptedNode::start(vec![Reply::Respond(ResponseEnvelope {
        precheck: Status::Ok,
        cost: two_hbar.to_tinybars() as u64,
        body: Vec::new(),
    })])
    .await;
    let client = client_for(&[(&node, 3)]);

    let err = FileContentsQuery::new()
        .set_file_id(FileId::new(150))
        .set_node_account_ids(vec![AccountId::new(3)])
        .execute(&client)
        .await
        .unwrap_err();

    match err {
        Error::MaxQueryPaymentExceeded { cost, max } => {
            assert_eq!(cost, two_hbar);
            assert_eq!(max, Hbar::new(1).unwrap());
        }
        other => panic!("expected MaxQueryPaymentExceeded, got {other:?}"),
    }
    // The cap is checked client-side; no paid request ever goes out.
    assert_eq!(node.request_count(), 1);
}

#[tokio::test]
async fn explicit_payment_skips_the_probe() {
    let answer = FileContents { file_id: FileId::new(150), contents: vec![1, 2, 3] };
    let node = ScriptedNode::start(vec![Reply::Respond(ResponseEnvelope {
        precheck: Status::Ok,
        cost: 0,
        body: answer.to_wire_bytes(),
    })])
    .await;
    let client = client_for(&[(&node, 3)]);

    let contents = FileContentsQuery::new()
        .set_file_id(FileId::new(150))
        .set_payment_amount(Hbar::from_tinybars(40_000))
        .set_node_account_ids(vec![AccountId::new(3)])
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(contents, answer);
    assert_eq!(node.request_count(), 1);
    let (mode, payment, _) = decode_query_header(&node.requests()[0].payload);
    assert_eq!(mode, 1);
    assert!(payment.is_some());
}

// ---------------------------------------------------------------------------
// Receipt polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn receipt_is_polled_until_it_exists() {
    let node = ScriptedNode::start(vec![
        ok_ack(),
        // Consensus hasn't caught up yet: poll again.
        receipt_reply(Status::Unknown),
        receipt_reply(Status::Success),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let response = transaction.execute(&client).await.unwrap();
    let receipt = response.get_receipt(&client).await.unwrap();

    assert_eq!(receipt.status, Status::Success);
    assert_eq!(receipt.transaction_id, Some(response.transaction_id));
    assert_eq!(node.request_count(), 3);
}

#[tokio::test]
async fn failed_receipt_status_is_an_error() {
    let node = ScriptedNode::start(vec![
        ok_ack(),
        receipt_reply(Status::InsufficientPayerBalance),
    ])
    .await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let response = transaction.execute(&client).await.unwrap();
    let err = response.get_receipt(&client).await.unwrap_err();

    match err {
        Error::ReceiptStatus { status, transaction_id } => {
            assert_eq!(status, Status::InsufficientPayerBalance);
            assert_eq!(transaction_id, Some(response.transaction_id));
        }
        other => panic!("expected ReceiptStatus, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Address-book swap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn removed_nodes_lose_their_channels() {
    let keeper = ScriptedNode::start(vec![]).await;
    let doomed = ScriptedNode::start(vec![]).await;
    let client = client_for(&[(&keeper, 3), (&doomed, 4)]);

    // Open a live channel to the node about to be removed.
    let mut transaction = transfer_for(&client, vec![AccountId::new(4)]);
    transaction.execute(&client).await.unwrap();
    assert_eq!(doomed.request_count(), 1);

    let mut survivors = HashMap::new();
    survivors.insert(keeper.address(), AccountId::new(3));
    client.set_network(survivors).await.unwrap();
    assert_eq!(client.network().node_ids(), vec![AccountId::new(3)]);

    // The removed node's channel is torn down...
    tokio::time::timeout(Duration::from_secs(2), async {
        while doomed.disconnects() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("removed node never saw its channel close");

    assert_eq!(doomed.disconnects(), 1);

    // ...and the survivor keeps serving.
    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    let response = transaction.execute(&client).await.unwrap();
    assert_eq!(response.node_account_id, AccountId::new(3));
    assert_eq!(doomed.request_count(), 1);
}

#[tokio::test]
async fn close_cancels_and_is_idempotent() {
    let node = ScriptedNode::start(vec![]).await;
    let client = client_for(&[(&node, 3)]);

    let mut transaction = transfer_for(&client, vec![AccountId::new(3)]);
    transaction.execute(&client).await.unwrap();

    client.close().await;
    client.close().await;

    // Everything after close is refused without touching the network.
    let mut late = transfer_for(&client, vec![AccountId::new(3)]);
    let err = late.execute(&client).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(node.request_count(), 1);
}
