//! The report session state machine.
//!
//! [`ReportSession`] owns the selected template, the filter values, the
//! generation lifecycle and the report history. It is a plain value with
//! `&mut self` mutators and does no scheduling of its own: something has to
//! call [`ReportSession::tick`] for the current attempt at a fixed interval.
//! [`SessionDriver`](crate::SessionDriver) does that with a tokio timer; tests
//! and the examples below do it by hand.
//!
//! # Attempts
//!
//! Each successful [`start_generation`](ReportSession::start_generation)
//! creates a new attempt with its own [`CancellationToken`]. A tick only acts
//! if it names the current attempt and that attempt's token is not cancelled.
//! Starting again, cancelling, editing a filter or switching template all
//! cancel the current token first, so a late tick from an old attempt is
//! always [`TickOutcome::Stale`].
//!
//! # Example
//!
//! ```
//! use report_session::{ReportSession, GenerationStatus, TickOutcome};
//!
//! let mut session = ReportSession::builder().build()?;
//! session.select_report_template("inventory")?;
//! session.set_filter_value("warehouse", "Main")?;
//! session.set_filter_value("stockStatus", "Low Stock")?;
//!
//! let attempt = session.start_generation()?;
//! let mut outcome = session.tick(attempt.id);
//! while matches!(outcome, TickOutcome::Advanced(_)) {
//!     outcome = session.tick(attempt.id);
//! }
//!
//! assert_eq!(session.state().status, GenerationStatus::Completed);
//! assert_eq!(session.list_active_reports().len(), 1);
//! # Ok::<(), report_session::SessionError>(())
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cancellation::CancellationToken;
use crate::catalog::{self, ReportTemplate};
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{Result, ResultExt, SessionError};
use crate::filters::FilterValues;
use crate::history::{ReportHistory, ReportRecord, download_reference, mint_record_id};
use crate::progress::{
    AttemptId, ClosureProgressReporter, GenerationState, ProgressReporter, ProgressUpdate,
};

/// Handle to a started generation attempt.
///
/// The token is a clone of the session's own; cancelling it makes the next
/// tick of this attempt finish as [`TickOutcome::Cancelled`].
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: AttemptId,
    pub token: CancellationToken,
}

/// Result of one [`ReportSession::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress moved to the given percentage.
    Advanced(u8),
    /// Progress hit 100; the new record's id is attached.
    Completed(String),
    /// The attempt's token was cancelled; state is now `cancelled`.
    Cancelled,
    /// The tick belongs to an attempt that is no longer current.
    Stale,
}

impl TickOutcome {
    /// Returns `true` when the ticker for this attempt should stop.
    pub fn is_final(&self) -> bool {
        !matches!(self, TickOutcome::Advanced(_))
    }
}

struct ActiveAttempt {
    id: AttemptId,
    token: CancellationToken,
}

/// Report generator session.
///
/// Use [`ReportSession::builder()`] to create one.
pub struct ReportSession {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    selected: Option<&'static ReportTemplate>,
    filters: FilterValues,
    state: GenerationState,
    active: Option<ActiveAttempt>,
    last_attempt: u64,
    record_seq: u64,
    history: ReportHistory,
}

// The async driver moves the session behind a mutex shared with a spawned task.
static_assertions::assert_impl_all!(ReportSession: Send);

impl ReportSession {
    /// Create a new session builder.
    pub fn builder() -> ReportSessionBuilder {
        ReportSessionBuilder::default()
    }

    /// All templates the user can pick from.
    pub fn templates(&self) -> &'static [ReportTemplate] {
        catalog::templates()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn selected_template(&self) -> Option<&'static ReportTemplate> {
        self.selected
    }

    pub fn filter_values(&self) -> &FilterValues {
        &self.filters
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// The attempt currently generating, if any.
    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Full history including expired records, newest first.
    pub fn history(&self) -> &ReportHistory {
        &self.history
    }

    pub fn find_report(&self, id: &str) -> Option<&ReportRecord> {
        self.history.get(id)
    }

    /// Current time according to the session clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Filter editing
    // ------------------------------------------------------------------

    /// Selects a template, clearing all filter values and resetting the
    /// lifecycle to `idle`.
    ///
    /// Unknown ids are rejected and leave the session untouched.
    pub fn select_report_template(&mut self, template_id: &str) -> Result<&'static ReportTemplate> {
        let template = catalog::find_template(template_id)
            .ok_or_else(|| SessionError::UnknownTemplate(template_id.to_string()))?;

        self.supersede("Report template changed");
        self.selected = Some(template);
        self.filters.clear();
        self.state = GenerationState::idle();

        info!(template = %template.id, "Selected report template");
        Ok(template)
    }

    /// Sets one filter value and resets the lifecycle to `idle`.
    ///
    /// The value itself is not validated; an empty string counts as set.
    pub fn set_filter_value(&mut self, filter_id: &str, value: impl Into<String>) -> Result<()> {
        let template = self.selected.ok_or(SessionError::NoTemplateSelected)?;
        if !template.has_filter(filter_id) {
            return Err(SessionError::UnknownFilter {
                template: template.id.clone(),
                filter: filter_id.to_string(),
            });
        }

        self.filters.set(filter_id, value);
        self.supersede("Filters changed");
        self.state = GenerationState::idle();

        debug!(filter = filter_id, "Filter value set");
        Ok(())
    }

    /// Filter ids of the selected template that still have no value.
    pub fn missing_filters(&self) -> Vec<String> {
        self.selected
            .map(|t| self.filters.missing_for(t))
            .unwrap_or_default()
    }

    /// Whether a generate request would be accepted right now.
    pub fn can_generate(&self) -> bool {
        self.selected
            .is_some_and(|t| self.filters.is_complete_for(t))
    }

    // ------------------------------------------------------------------
    // Generation lifecycle
    // ------------------------------------------------------------------

    /// Starts a new generation attempt.
    ///
    /// Any attempt still in flight is cancelled first and can no longer
    /// complete or touch the history.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoTemplateSelected`] if no template is selected
    /// - [`SessionError::IncompleteFilters`] if any filter has no value
    pub fn start_generation(&mut self) -> Result<Attempt> {
        let template = self.selected.ok_or(SessionError::NoTemplateSelected)?;
        let missing = self.filters.missing_for(template);
        if !missing.is_empty() {
            return Err(SessionError::IncompleteFilters { missing });
        }

        self.last_attempt += 1;
        let id = AttemptId(self.last_attempt);
        self.supersede(&format!("Superseded by attempt {id}"));

        let token = CancellationToken::new();
        self.active = Some(ActiveAttempt {
            id,
            token: token.clone(),
        });
        self.state = GenerationState::generating(0);

        info!(attempt = %id, template = %template.id, "Generation started");
        self.report_progress(ProgressUpdate::started(id, &template.name));

        Ok(Attempt { id, token })
    }

    /// Advances the given attempt by one step.
    ///
    /// Acts only if `attempt` is the current attempt. A cancelled token is
    /// honoured here before any state is touched.
    pub fn tick(&mut self, attempt: AttemptId) -> TickOutcome {
        let Some(active) = self.active.as_ref().filter(|a| a.id == attempt) else {
            debug!(attempt = %attempt, "Ignoring tick for stale attempt");
            return TickOutcome::Stale;
        };

        if active.token.is_cancelled() {
            self.active = None;
            self.state = GenerationState::cancelled();
            info!(attempt = %attempt, "Generation cancelled");
            self.report_progress(ProgressUpdate::cancelled(attempt, "Generation cancelled"));
            return TickOutcome::Cancelled;
        }

        let progress = self
            .state
            .progress
            .saturating_add(self.config.progress_step)
            .min(100);

        if progress < 100 {
            self.state = GenerationState::generating(progress);
            self.report_progress(ProgressUpdate::advanced(attempt, progress));
            return TickOutcome::Advanced(progress);
        }

        let record_id = self.complete(attempt);
        TickOutcome::Completed(record_id)
    }

    /// Cancels the attempt in flight.
    ///
    /// Returns `false` if nothing was generating.
    pub fn cancel_generation(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        active.token.cancel();
        self.state = GenerationState::cancelled();
        info!(attempt = %active.id, "Generation cancelled by user");
        self.report_progress(ProgressUpdate::cancelled(active.id, "Cancelled by user"));
        true
    }

    /// Stops any attempt in flight; it ends as cancelled.
    ///
    /// Called when the consumer goes away; also run on drop. A no-op when
    /// nothing is generating.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            self.state = GenerationState::cancelled();
            debug!(attempt = %active.id, "Session torn down with generation in flight");
            self.report_progress(ProgressUpdate::cancelled(active.id, "Session shut down"));
        }
    }

    fn complete(&mut self, attempt: AttemptId) -> String {
        self.active = None;

        let generated_at = self.clock.now();
        self.record_seq += 1;
        let id = mint_record_id(generated_at, self.record_seq);

        // `start_generation` guarantees a template while an attempt is active
        let (template_id, report_type) = self
            .selected
            .map(|t| (t.id.clone(), t.name.clone()))
            .unwrap_or_default();

        let record = ReportRecord {
            download_url: download_reference(&self.config, &id),
            id: id.clone(),
            template_id,
            report_type,
            filters: self.filters.clone(),
            generated_at,
            expires_at: generated_at + self.config.retention(),
        };

        self.history.prepend(record);
        self.state = GenerationState::completed();

        info!(attempt = %attempt, record = %id, "Report generated");
        self.report_progress(ProgressUpdate::completed(attempt, id.clone()));
        id
    }

    /// Cancels the current attempt's token without setting a terminal state.
    fn supersede(&mut self, reason: &str) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            debug!(attempt = %active.id, reason, "Attempt superseded");
            self.report_progress(ProgressUpdate::cancelled(active.id, reason));
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Removes a report from history. Returns `false` if the id was unknown.
    pub fn delete_report(&mut self, id: &str) -> bool {
        let removed = self.history.remove(id).is_some();
        if removed {
            info!(record = id, "Report deleted");
        }
        removed
    }

    /// Reports that have not yet expired, newest first.
    pub fn list_active_reports(&self) -> Vec<&ReportRecord> {
        self.history.active(self.clock.now())
    }
}

impl Drop for ReportSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Builder for [`ReportSession`].
#[derive(Default)]
pub struct ReportSessionBuilder {
    config: Option<SessionConfig>,
    clock: Option<Arc<dyn Clock>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl ReportSessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom time source (defaults to [`SystemClock`]).
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Receive progress updates through a closure.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter(Arc::new(ClosureProgressReporter::new(callback)))
    }

    /// Build the session, validating the configuration.
    pub fn build(self) -> Result<ReportSession> {
        let config = self.config.unwrap_or_default();
        config.validate().context("Building report session")?;

        Ok(ReportSession {
            config,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            progress_reporter: self.progress_reporter,
            selected: None,
            filters: FilterValues::new(),
            state: GenerationState::idle(),
            active: None,
            last_attempt: 0,
            record_seq: 0,
            history: ReportHistory::new(),
        })
    }
}
