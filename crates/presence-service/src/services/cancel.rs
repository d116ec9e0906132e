//! Cooperative cancellation for timers and worker tasks

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// One-shot cancellation flag that tasks can both poll and await.
///
/// Once cancelled it stays cancelled.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    notify: Notify,
    // Held by `cancel` and `run_unless_cancelled`
    section: Mutex<()>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that starts out cancelled
    #[must_use]
    pub fn cancelled_token() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    /// Cancel the token, waking every waiter.
    ///
    /// Returns `true` only for the call that performed the transition.
    /// Blocks while a [`Self::run_unless_cancelled`] section is running, so
    /// once this returns no such section can have a side effect.
    pub fn cancel(&self) -> bool {
        let first = {
            let _section = self.section.lock();
            !self.cancelled.swap(true, Ordering::SeqCst)
        };
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run `f` unless the token is cancelled, excluding a concurrent `cancel`.
    ///
    /// `f` must be short and must not block or cancel this token.
    pub fn run_unless_cancelled<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let _section = self.section.lock();
        if self.is_cancelled() {
            return None;
        }
        Some(f())
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_cancel_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_run_unless_cancelled() {
        let token = CancelToken::new();
        assert_eq!(token.run_unless_cancelled(|| 7), Some(7));

        token.cancel();
        assert_eq!(token.run_unless_cancelled(|| 7), None);
    }

    #[test]
    fn test_cancel_waits_for_running_section() {
        use std::sync::atomic::AtomicBool;
        use std::sync::mpsc;

        let token = Arc::new(CancelToken::new());
        let finished = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = mpsc::channel();

        let worker = std::thread::spawn({
            let token = token.clone();
            let finished = finished.clone();
            move || {
                token.run_unless_cancelled(|| {
                    entered_tx.send(()).unwrap();
                    std::thread::sleep(Duration::from_millis(50));
                    finished.store(true, Ordering::SeqCst);
                })
            }
        });

        entered_rx.recv().unwrap();
        assert!(token.cancel());

        // The section that had already started ran to completion first
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(worker.join().unwrap(), Some(()));
        assert_eq!(token.run_unless_cancelled(|| ()), None);
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancelToken::cancelled_token();
        token.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wakes_waiter() {
        let token = Arc::new(CancelToken::new());
        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        token.cancel();
        waiter.await.unwrap();
    }
}
