//! # Identifiers
//!
//! Everything the ledger names: entities (the dotted `(shard, realm, num)`
//! triple in its six typed flavors), transaction ids, ledger ids, EVM
//! aliases, and the checksum scheme that ties entity ids to one ledger.

pub mod checksum;
pub mod entity_id;
pub mod evm_address;
pub mod ledger_id;
pub mod timestamp;
pub mod transaction_id;

pub use checksum::Checksum;
pub use entity_id::{AccountId, ContractId, FileId, ScheduleId, TokenId, TopicId};
pub use evm_address::EvmAddress;
pub use ledger_id::LedgerId;
pub use timestamp::Timestamp;
pub use transaction_id::TransactionId;
