//! Async driver: runs the progress timer for a [`ReportSession`].
//!
//! [`SessionDriver`] shares the session behind a `parking_lot::Mutex` with a
//! single spawned ticker task. The ticker wakes on a `tokio::time::interval`,
//! locks the session for exactly one [`ReportSession::tick`], and exits as
//! soon as the outcome is final.
//!
//! ```text
//!   start_generation ──► session.start_generation() ──► spawn ticker(attempt)
//!                              │ cancels old token         │
//!                              ▼                           ▼
//!                        old ticker aborted        interval ─► session.tick(attempt)
//!                                                              └─ stop on Completed/Cancelled/Stale
//! ```
//!
//! The session ignores ticks for anything but the current, uncancelled
//! attempt, so a ticker that outlives its attempt cannot change state.
//!
//! Dropping the driver (or calling [`SessionDriver::shutdown`]) stops the
//! ticker and cancels the attempt in flight.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::error::{Result, SessionError};
use crate::history::ReportRecord;
use crate::progress::{AttemptId, GenerationState};
use crate::session::{ReportSession, TickOutcome};
use crate::view::SessionSnapshot;

struct Ticker {
    attempt: AttemptId,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn stop(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Owns a session and the timer that advances its generation progress.
///
/// Must be used from within a tokio runtime.
pub struct SessionDriver {
    session: Arc<Mutex<ReportSession>>,
    ticker: Mutex<Option<Ticker>>,
}

impl SessionDriver {
    pub fn new(session: ReportSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            ticker: Mutex::new(None),
        }
    }

    /// Shared handle to the underlying session.
    pub fn shared(&self) -> Arc<Mutex<ReportSession>> {
        self.session.clone()
    }

    pub fn state(&self) -> GenerationState {
        self.session.lock().state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session.lock())
    }

    /// Whether a ticker task is currently running.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub fn select_report_template(&self, template_id: &str) -> Result<()> {
        self.session.lock().select_report_template(template_id)?;
        self.stop_stale_ticker();
        Ok(())
    }

    pub fn set_filter_value(&self, filter_id: &str, value: impl Into<String>) -> Result<()> {
        self.session.lock().set_filter_value(filter_id, value)?;
        self.stop_stale_ticker();
        Ok(())
    }

    /// Starts a generation and schedules its ticks.
    ///
    /// A generation already running is superseded and its ticker stopped.
    pub fn start_generation(&self) -> Result<AttemptId> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::Internal(format!("no tokio runtime: {e}")))?;

        let (attempt, period) = {
            let mut session = self.session.lock();
            let attempt = session.start_generation()?;
            (attempt, session.config().tick_interval())
        };

        let handle = runtime.spawn(run_ticker(
            self.session.clone(),
            attempt.id,
            attempt.token.clone(),
            period,
        ));

        let previous = self.ticker.lock().replace(Ticker {
            attempt: attempt.id,
            token: attempt.token,
            handle,
        });
        if let Some(previous) = previous {
            debug!(attempt = %previous.attempt, "Stopping superseded ticker");
            previous.stop();
        }

        Ok(attempt.id)
    }

    /// Cancels the running generation and stops its ticker.
    pub fn cancel_generation(&self) -> bool {
        let cancelled = self.session.lock().cancel_generation();
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.stop();
        }
        cancelled
    }

    pub fn delete_report(&self, id: &str) -> bool {
        self.session.lock().delete_report(id)
    }

    /// Active reports, cloned out of the session.
    pub fn list_active_reports(&self) -> Vec<ReportRecord> {
        self.session
            .lock()
            .list_active_reports()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Stops the ticker and cancels any attempt in flight.
    pub fn shutdown(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.stop();
        }
        self.session.lock().teardown();
    }

    /// Stops the ticker if the session no longer considers its attempt current.
    fn stop_stale_ticker(&self) {
        let current = self.session.lock().current_attempt();
        let mut ticker = self.ticker.lock();
        if ticker.as_ref().is_some_and(|t| Some(t.attempt) != current) {
            if let Some(stale) = ticker.take() {
                debug!(attempt = %stale.attempt, "Stopping ticker for superseded attempt");
                stale.stop();
            }
        }
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_ticker(
    session: Arc<Mutex<ReportSession>>,
    attempt: AttemptId,
    token: CancellationToken,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let outcome = session.lock().tick(attempt);
        match outcome {
            TickOutcome::Advanced(_) => continue,
            TickOutcome::Completed(_) => break,
            TickOutcome::Cancelled => {
                debug!(attempt = %attempt, "Ticker observed cancellation");
                break;
            }
            TickOutcome::Stale => {
                if token.is_cancelled() {
                    debug!(attempt = %attempt, "Ticker stopped for superseded attempt");
                } else {
                    warn!(attempt = %attempt, "Ticker outlived its attempt");
                }
                break;
            }
        }
    }
}
