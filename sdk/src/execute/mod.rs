//! # Execution Engine
//!
//! The single retry/rotation loop behind every `execute()` on a transaction
//! or query, plus the classification tables and cancellation plumbing it
//! runs on.

pub mod cancel;
pub mod classify;
pub mod engine;

pub use cancel::{CancelSource, CancelToken};
pub use classify::{classify_precheck, classify_receipt_poll, RetryDecision};
pub use engine::{execute, Execute, ExecuteParams};
