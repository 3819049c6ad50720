//! Cooperative cancellation for in-flight executions.
//!
//! A [`CancelSource`] lives on the client; every execution clones a
//! [`CancelToken`] and races it against its submits and sleeps. Cancelling
//! unblocks everything immediately — no attempt finishes "for free" after
//! the caller has given up.

use tokio::sync::watch;

/// The cancelling end. Dropping the source does NOT cancel; only an explicit
/// [`CancelSource::cancel`] does.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    /// A fresh, un-cancelled source.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        CancelSource { tx }
    }

    /// A token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken { rx: self.tx.subscribe() }
    }

    /// Flips the flag; every outstanding and future token observes it.
    pub fn cancel(&self) {
        // send_replace never fails; it works with zero receivers too.
        self.tx.send_replace(true);
    }

    /// Whether cancel was called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The observing end, cheap to clone into every execution.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never fire. For executions without a client-level
    /// cancel scope (tests, offline helpers).
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Leak the sender so the channel stays open; a closed channel is
        // indistinguishable from "never cancelled" in `cancelled()` anyway,
        // but keeping it alive avoids the resubscribe-error path entirely.
        std::mem::forget(tx);
        CancelToken { rx }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when (and only when) cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Source dropped without cancelling: never resolve.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_unblocks_waiters() {
        let source = CancelSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());

        let waiter = tokio::spawn(async move { token.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        source.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should unblock")
            .unwrap();
    }

    #[tokio::test]
    async fn token_observes_cancel_before_subscribe_point() {
        let source = CancelSource::new();
        source.cancel();
        let token = source.token();
        assert!(token.is_cancelled());
        // Must resolve immediately.
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already cancelled");
    }

    #[tokio::test]
    async fn never_token_never_fires() {
        let token = CancelToken::never();
        let result =
            tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(result.is_err(), "never-token must not resolve");
    }
}
