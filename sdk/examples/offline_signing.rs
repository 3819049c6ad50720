//! Offline signing walkthrough.
//!
//! Builds and freezes a transfer on an air-gapped machine, carries the
//! bytes across the gap, signs them on the key-holding machine, and
//! reassembles a submittable transaction — all without a network
//! connection or a client.
//!
//! Run with `cargo run --example offline_signing`.

use meridian_sdk::{
    AccountId, Hbar, PrivateKey, Result, TransactionId, TransferTransaction,
};

fn main() -> Result<()> {
    // --- machine A: build and freeze, no keys present ---

    let payer = AccountId::new(1800);
    let mut transfer = TransferTransaction::new();
    transfer
        .hbar_transfer(payer, Hbar::new(-10)?)?
        .hbar_transfer(AccountId::new(2000), Hbar::new(10)?)?
        .set_transaction_memo("offline signing demo")?
        .set_transaction_id(TransactionId::generate(payer))?
        .set_node_account_ids(vec![AccountId::new(3)])?
        .freeze()?;

    let unsigned = transfer.to_bytes()?;
    println!("frozen, unsigned: {} bytes", unsigned.len());

    // --- machine B: the only place the key exists ---

    let key = PrivateKey::generate_ed25519();
    let mut to_sign = TransferTransaction::from_bytes(&unsigned)?;
    to_sign.sign(key.clone())?;
    let signed = to_sign.to_bytes()?;
    println!("signed: {} bytes", signed.len());

    // --- back on machine A: verify what came back ---

    let submittable = TransferTransaction::from_bytes(&signed)?;
    let signatures = submittable.signatures()?;
    let node_sigs = &signatures[&AccountId::new(3)];
    assert_eq!(node_sigs.len(), 1);
    assert_eq!(node_sigs[0].public_key, key.public_key());

    println!("transaction hash: {}", hex::encode(submittable.transaction_hash()?));
    if let Some(id) = submittable.transaction_id() {
        println!("transaction id:   {id}");
    }

    Ok(())
}
