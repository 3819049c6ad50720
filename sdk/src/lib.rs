//! # Meridian SDK
//!
//! The client library for the Meridian ledger: build a transaction, sign it,
//! hand it to a [`Client`], get a receipt back. Everything between those
//! steps — node selection, retry with exponential backoff, payload chunking,
//! query payments — is the SDK's problem, not yours.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the lifecycle of a request:
//!
//! - **client** — The [`Client`]: operator identity, execution policy, and
//!   the front door to everything below.
//! - **transaction** — One generic `Transaction<D>` plus a data struct per
//!   variant. Freeze, fan-out, chunking, signatures, serialization.
//! - **query** — Two-phase queries: ask the cost, attach a payment, ask again.
//! - **execute** — The retry engine. Classifies failures, rotates nodes,
//!   backs off, gives up loudly.
//! - **network** — The node pool: address book, health tracking, framed
//!   (optionally TLS) channels.
//! - **wire** — The binary protocol: codec primitives and request/response
//!   envelopes.
//! - **crypto** — Ed25519 and ECDSA(secp256k1) keys, the [`Signer`] seam,
//!   and the operator identity.
//! - **ids** — Entity ids, transaction ids, timestamps, and the checksum
//!   scheme that catches wrong-ledger mistakes.
//! - **ethereum** — RLP parsing for the three Ethereum envelopes the ledger
//!   executes natively.
//! - **hbar** — The native currency. Integer arithmetic only.
//!
//! ## A complete round trip
//!
//! ```no_run
//! use meridian_sdk::{AccountId, Client, Hbar, Operator, PrivateKey, TransferTransaction};
//!
//! # async fn demo() -> meridian_sdk::Result<()> {
//! let client = Client::for_testnet()?;
//! client.set_operator(Operator::new(AccountId::new(2), PrivateKey::generate_ed25519()));
//!
//! let mut transfer = TransferTransaction::new();
//! transfer
//!     .hbar_transfer(AccountId::new(2), Hbar::new(-1)?)?
//!     .hbar_transfer(AccountId::new(1001), Hbar::new(1)?)?;
//! let receipt = transfer.execute(&client).await?.get_receipt(&client).await?;
//! println!("status: {:?}", receipt.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ethereum;
pub mod execute;
pub mod hbar;
pub mod ids;
pub mod network;
pub mod query;
pub mod transaction;
pub mod wire;

pub use client::Client;
pub use crypto::{Key, KeyError, KeyList, Operator, PrivateKey, PublicKey, Signer};
pub use error::{CodecError, Error, Result};
pub use ethereum::{EthereumData, RlpError};
pub use hbar::{Hbar, HbarUnit};
pub use ids::{
    AccountId, ContractId, EvmAddress, FileId, LedgerId, ScheduleId, Timestamp, TokenId, TopicId,
    TransactionId,
};
pub use network::{NodeAddress, NodeAddressBook};
pub use query::{
    AccountBalance, AccountBalanceQuery, AccountInfo, AccountInfoQuery, FileContents,
    FileContentsQuery, NetworkVersionInfo, NetworkVersionInfoQuery, Query, TransactionReceiptQuery,
    TransactionRecordQuery,
};
pub use transaction::{
    AccountAllowanceDeleteTransaction, AccountCreateTransaction, AccountDeleteTransaction,
    AnyTransaction, BatchTransaction, ContractExecuteTransaction, EthereumTransaction,
    ExchangeRate, FileAppendTransaction, FileCreateTransaction, FreezeTransaction, FreezeType,
    ScheduleCreateTransaction, TokenFreezeTransaction, TokenUnfreezeTransaction,
    TopicCreateTransaction, TopicMessageSubmitTransaction, Transaction, TransactionReceipt,
    TransactionRecord, TransactionResponse, TransferTransaction,
};
pub use wire::Status;
