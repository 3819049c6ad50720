// Wire codec benchmarks.
//
// Covers envelope encode/decode, full transaction serialization round trips
// at several fan-out sizes, chunked-body freezing, and RLP parsing of an
// EIP-1559 envelope.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use meridian_sdk::ethereum::RlpItem;
use meridian_sdk::wire::{RequestEnvelope, RequestKind, ResponseEnvelope, Service, WireDecode, WireEncode};
use meridian_sdk::{
    AccountId, Hbar, PrivateKey, TopicId, TopicMessageSubmitTransaction, TransactionId,
    TransferTransaction,
};

/// A frozen, signed transfer fanned out to `nodes` nodes.
fn frozen_transfer(nodes: u64) -> TransferTransaction {
    let key = PrivateKey::generate_ed25519();
    let node_ids: Vec<AccountId> = (3..3 + nodes).map(AccountId::new).collect();
    let mut transaction = TransferTransaction::new();
    transaction
        .hbar_transfer(AccountId::new(1800), Hbar::from_tinybars(-50_000))
        .unwrap()
        .hbar_transfer(AccountId::new(2000), Hbar::from_tinybars(50_000))
        .unwrap()
        .set_transaction_id(TransactionId::generate(AccountId::new(1800)))
        .unwrap()
        .set_node_account_ids(node_ids)
        .unwrap()
        .freeze()
        .unwrap();
    transaction.sign(key).unwrap();
    transaction
}

fn bench_envelope_round_trip(c: &mut Criterion) {
    let request = RequestEnvelope {
        service: Service::Crypto,
        kind: RequestKind::Transaction,
        payload: vec![0xA5; 512],
    };
    let request_bytes = request.to_wire_bytes();
    let response = ResponseEnvelope {
        precheck: meridian_sdk::Status::Ok,
        cost: 25_000,
        body: vec![0x5A; 256],
    };
    let response_bytes = response.to_wire_bytes();

    c.bench_function("envelope/request_encode", |b| {
        b.iter(|| request.to_wire_bytes());
    });
    c.bench_function("envelope/request_decode", |b| {
        b.iter(|| RequestEnvelope::from_wire_bytes(&request_bytes).unwrap());
    });
    c.bench_function("envelope/response_decode", |b| {
        b.iter(|| ResponseEnvelope::from_wire_bytes(&response_bytes).unwrap());
    });
}

fn bench_transaction_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/round_trip");
    for nodes in [1u64, 4, 7] {
        let transaction = frozen_transfer(nodes);
        let bytes = transaction.to_bytes().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("to_bytes", nodes), &transaction, |b, t| {
            b.iter(|| t.to_bytes().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("from_bytes", nodes), &bytes, |b, bytes| {
            b.iter(|| TransferTransaction::from_bytes(bytes).unwrap());
        });
    }
    group.finish();
}

fn bench_chunked_freeze(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/chunked_freeze");
    for kib in [4usize, 64, 256] {
        let message = vec![0xC3u8; kib * 1024];
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(kib), &message, |b, message| {
            b.iter(|| {
                let mut submit = TopicMessageSubmitTransaction::new();
                submit
                    .set_topic_id(TopicId::new(777))
                    .unwrap()
                    .set_message(message.clone())
                    .unwrap()
                    .set_max_chunks(100)
                    .unwrap()
                    .set_transaction_id(TransactionId::generate(AccountId::new(1800)))
                    .unwrap()
                    .set_node_account_ids(vec![AccountId::new(3)])
                    .unwrap()
                    .freeze()
                    .unwrap();
                submit.to_bytes().unwrap()
            });
        });
    }
    group.finish();
}

fn bench_rlp_decode(c: &mut Criterion) {
    // A plausible EIP-1559 payload: 12 fields, signature-sized trailers.
    let fields = vec![
        RlpItem::Bytes(vec![0x01]),                 // chain id
        RlpItem::Bytes(vec![0x07]),                 // nonce
        RlpItem::Bytes(vec![0x3B, 0x9A, 0xCA, 0x00]), // max priority fee
        RlpItem::Bytes(vec![0x77, 0x35, 0x94, 0x00]), // max fee
        RlpItem::Bytes(vec![0x52, 0x08]),           // gas limit
        RlpItem::Bytes(vec![0xEE; 20]),             // to
        RlpItem::Bytes(vec![]),                     // value
        RlpItem::Bytes(vec![0xAB; 68]),             // call data
        RlpItem::List(vec![]),                      // access list
        RlpItem::Bytes(vec![0x01]),                 // y parity
        RlpItem::Bytes(vec![0xA1; 32]),             // r
        RlpItem::Bytes(vec![0xB2; 32]),             // s
    ];
    let mut payload = vec![0x02];
    payload.extend(RlpItem::List(fields).to_vec());

    c.bench_function("ethereum/eip1559_parse", |b| {
        b.iter(|| meridian_sdk::EthereumData::from_bytes(&payload).unwrap());
    });
}

criterion_group!(
    benches,
    bench_envelope_round_trip,
    bench_transaction_round_trip,
    bench_chunked_freeze,
    bench_rlp_decode
);
criterion_main!(benches);
