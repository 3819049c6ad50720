//! Response classification: the retry grammar of the execution engine.
//!
//! The engine is deliberately ignorant of status semantics. Everything it
//! needs to know about an outcome is one of five words: succeed, retry here,
//! move on, give up because the caller is wrong, or regenerate and retry.
//! The tables in this module are that translation, in one place, so the
//! policy is auditable at a glance.

use crate::wire::Status;

/// What the engine should do with a classified response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Terminal success; map the response and return it.
    Success,
    /// Transient node-local condition: back off and resubmit to the
    /// same node.
    RetrySameNode(Status),
    /// The node is misbehaving or overloaded beyond a quick retry:
    /// quarantine it and move to the next.
    RotateNode(Status),
    /// The caller's request is invalid; no amount of retrying helps.
    RequestError(Status),
    /// The transaction id's validity window closed in flight. Retryable
    /// only by regenerating the id, which is a policy decision.
    Expired,
}

/// Classification for transaction submissions and ordinary (non-polling)
/// queries: the pre-check contract.
///
/// Transport failures never reach this table — the engine rotates on those
/// unconditionally.
pub fn classify_precheck(status: Status) -> RetryDecision {
    match status {
        Status::Ok | Status::Success => RetryDecision::Success,

        // The node is alive but temporarily unable; its neighbors are
        // unlikely to do better, so stay and back off.
        Status::Busy
        | Status::PlatformNotActive
        | Status::PlatformTransactionNotCreated => RetryDecision::RetrySameNode(status),

        Status::TransactionExpired => RetryDecision::Expired,

        // Everything else means the request itself is unacceptable.
        other => RetryDecision::RequestError(other),
    }
}

/// Classification for receipt/record polling.
///
/// A receipt that does not exist *yet* is the normal case immediately after
/// submission, so "not found" and "unknown" are retries here, not errors.
pub fn classify_receipt_poll(status: Status) -> RetryDecision {
    match status {
        Status::Ok | Status::Success => RetryDecision::Success,

        Status::Unknown
        | Status::ReceiptNotFound
        | Status::RecordNotFound
        | Status::Busy
        | Status::PlatformNotActive => RetryDecision::RetrySameNode(status),

        Status::TransactionExpired => RetryDecision::Expired,

        other => RetryDecision::RequestError(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_and_success_are_terminal() {
        assert_eq!(classify_precheck(Status::Ok), RetryDecision::Success);
        assert_eq!(classify_precheck(Status::Success), RetryDecision::Success);
    }

    #[test]
    fn transient_overload_retries_in_place() {
        for status in [Status::Busy, Status::PlatformNotActive] {
            assert_eq!(
                classify_precheck(status),
                RetryDecision::RetrySameNode(status)
            );
        }
    }

    #[test]
    fn validation_failures_are_fatal() {
        for status in [
            Status::InvalidSignature,
            Status::InvalidAccountId,
            Status::DuplicateTransaction,
            Status::InsufficientTxFee,
            Status::MemoTooLong,
        ] {
            assert_eq!(
                classify_precheck(status),
                RetryDecision::RequestError(status)
            );
        }
    }

    #[test]
    fn expiry_is_its_own_decision() {
        assert_eq!(
            classify_precheck(Status::TransactionExpired),
            RetryDecision::Expired
        );
    }

    #[test]
    fn receipt_polling_retries_not_found() {
        for status in [Status::Unknown, Status::ReceiptNotFound, Status::RecordNotFound] {
            assert_eq!(
                classify_receipt_poll(status),
                RetryDecision::RetrySameNode(status)
            );
            // The generic table would have failed these.
            assert_eq!(classify_precheck(status), RetryDecision::RequestError(status));
        }
    }

    #[test]
    fn unrecognized_codes_fail_closed() {
        let status = Status::Unrecognized(40_404);
        assert_eq!(classify_precheck(status), RetryDecision::RequestError(status));
        assert_eq!(
            classify_receipt_poll(status),
            RetryDecision::RequestError(status)
        );
    }
}
