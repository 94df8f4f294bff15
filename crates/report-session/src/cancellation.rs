//! Cancellation token for generation attempts.
//!
//! Every generation attempt gets its own [`CancellationToken`]. The scheduler
//! keeps one clone and the tick callback another; the callback checks the
//! token before touching session state.
//!
//! # Example
//!
//! ```
//! use report_session::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let for_ticker = token.clone();
//!
//! assert!(!for_ticker.is_cancelled());
//! token.cancel();
//! assert!(for_ticker.is_cancelled());
//! ```
//!
//! Tokens are never reset. A superseded attempt keeps its cancelled token
//! forever, so a late tick from it cannot act.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A token that can be used to signal cancellation of a generation attempt.
///
/// Clones share state: cancelling any clone cancels all of them.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

// The async driver moves clones into spawned tasks.
static_assertions::assert_impl_all!(CancellationToken: Send, Sync);

impl CancellationToken {
    /// Creates a new, non-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// Idempotent. Returns `true` if this call performed the transition.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    /// Check if cancellation has been requested on this token or any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_cancel() {
        let token = CancellationToken::new();
        assert!(token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancellationToken::new();
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        token2.cancel();

        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
    }

    #[test]
    fn test_independent_tokens_do_not_interfere() {
        let old = CancellationToken::new();
        let new = CancellationToken::new();
        old.cancel();
        assert!(!new.is_cancelled());
    }

    #[test]
    fn test_cancellation_across_threads() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            token_clone.is_cancelled()
        });

        token.cancel();

        let was_cancelled = handle.join().expect("Thread should not panic");
        assert!(was_cancelled, "Cancellation should be visible across threads");
    }
}
