//! Generation lifecycle state and progress reporting.
//!
//! This module defines [`GenerationStatus`] (the four lifecycle states),
//! [`GenerationState`] (status plus percentage), the [`ProgressUpdate`] event
//! and the [`ProgressReporter`] trait used to observe a session.
//!
//! # Example
//!
//! ```
//! use report_session::{ReportSession, ProgressUpdate};
//!
//! let session = ReportSession::builder()
//!     .on_progress(|update: ProgressUpdate| {
//!         println!("[{}] {}% - {}", update.status.as_str(), update.progress, update.message);
//!     })
//!     .build()
//!     .expect("default config is valid");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the current generation attempt.
///
/// ```text
/// idle ──start──► generating ──progress=100──► completed
///                     │
///                     └──cancel──► cancelled
/// ```
///
/// Any filter edit or template change returns the session to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Nothing running; waiting for a generate request.
    #[default]
    Idle,
    /// A timer is advancing progress.
    Generating,
    /// Progress reached 100 and a report was recorded.
    Completed,
    /// The attempt was stopped before completion.
    Cancelled,
}

impl GenerationStatus {
    /// Returns the lowercase identifier used in JSON and logs.
    ///
    /// ```
    /// use report_session::GenerationStatus;
    ///
    /// assert_eq!(GenerationStatus::Generating.as_str(), "generating");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns a human-readable name for the status.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Generating => "Generating",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Returns `true` for `Completed` and `Cancelled`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus progress percentage (0 - 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationState {
    pub status: GenerationStatus,
    pub progress: u8,
}

impl GenerationState {
    pub(crate) fn idle() -> Self {
        Self::default()
    }

    pub(crate) fn generating(progress: u8) -> Self {
        Self {
            status: GenerationStatus::Generating,
            progress: progress.min(100),
        }
    }

    pub(crate) fn completed() -> Self {
        Self {
            status: GenerationStatus::Completed,
            progress: 100,
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self {
            status: GenerationStatus::Cancelled,
            progress: 0,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.status == GenerationStatus::Generating
    }
}

/// Identifier of one generation attempt within a session.
///
/// Attempt ids increase monotonically; the first attempt is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event sent to a [`ProgressReporter`] whenever an attempt changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub attempt: AttemptId,
    pub status: GenerationStatus,
    pub progress: u8,
    pub message: String,
    /// Id of the record created by a completed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl ProgressUpdate {
    pub fn started(attempt: AttemptId, template_name: &str) -> Self {
        Self {
            attempt,
            status: GenerationStatus::Generating,
            progress: 0,
            message: format!("Generating {template_name}..."),
            record_id: None,
        }
    }

    pub fn advanced(attempt: AttemptId, progress: u8) -> Self {
        Self {
            attempt,
            status: GenerationStatus::Generating,
            progress,
            message: format!("Generating... {progress}%"),
            record_id: None,
        }
    }

    pub fn completed(attempt: AttemptId, record_id: impl Into<String>) -> Self {
        Self {
            attempt,
            status: GenerationStatus::Completed,
            progress: 100,
            message: "Report generated".to_string(),
            record_id: Some(record_id.into()),
        }
    }

    pub fn cancelled(attempt: AttemptId, reason: impl Into<String>) -> Self {
        Self {
            attempt,
            status: GenerationStatus::Cancelled,
            progress: 0,
            message: reason.into(),
            record_id: None,
        }
    }
}

/// Trait for receiving progress updates from a session.
///
/// Implementations must be `Send + Sync`: with the async driver, updates are
/// delivered from the ticker task. Called while the session is locked, so
/// implementations must not call back into the driver.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}
