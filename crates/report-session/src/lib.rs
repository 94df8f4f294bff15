//! Report Generator Session
//!
//! In-memory state for a "generate a report" screen: pick a report template,
//! fill its filters, run a simulated generation with a progress bar, and keep
//! a history of generated reports that expire after a retention window.
//!
//! # Overview
//!
//! - **Catalog**: a fixed set of [`ReportTemplate`]s, each with its
//!   [`FilterSpec`]s
//! - **Filter editing**: [`FilterValues`] for the selected template; any edit
//!   resets the lifecycle to idle
//! - **Generation lifecycle**: `idle → generating → completed | cancelled`,
//!   advanced one tick at a time, with per-attempt [`CancellationToken`]s so a
//!   superseded or cancelled attempt can never complete
//! - **History**: newest-first [`ReportRecord`]s, filtered by expiration for
//!   display, removed only by explicit deletion
//! - **Async driver**: [`SessionDriver`] runs the progress timer on tokio
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use report_session::{ReportSession, SessionConfig, SessionDriver};
//!
//! let session = ReportSession::builder()
//!     .config(SessionConfig::from_env()?)
//!     .on_progress(|update| println!("{}% {}", update.progress, update.message))
//!     .build()?;
//!
//! let driver = SessionDriver::new(session);
//! driver.select_report_template("sales")?;
//! driver.set_filter_value("dateRange", "2024-01")?;
//! driver.set_filter_value("region", "North")?;
//! driver.set_filter_value("productCategory", "Electronics")?;
//! driver.start_generation()?;
//!
//! // ... ten ticks later
//! for report in driver.snapshot().active_reports {
//!     println!("{} [{}] expires {}", report.report_type, report.filters, report.expires_at);
//! }
//! ```
//!
//! # Manual ticking
//!
//! [`ReportSession`] does no scheduling itself, which keeps it deterministic:
//!
//! ```
//! use report_session::{ReportSession, TickOutcome};
//!
//! let mut session = ReportSession::builder().build()?;
//! session.select_report_template("customer")?;
//! session.set_filter_value("dateRange", "2024-Q1")?;
//! session.set_filter_value("customerSegment", "Retail")?;
//! session.set_filter_value("minPurchase", "100")?;
//!
//! let attempt = session.start_generation()?;
//! for _ in 0..3 {
//!     session.tick(attempt.id);
//! }
//! assert_eq!(session.state().progress, 30);
//!
//! session.cancel_generation();
//! assert_eq!(session.tick(attempt.id), TickOutcome::Stale);
//! assert!(session.history().is_empty());
//! # Ok::<(), report_session::SessionError>(())
//! ```

pub mod cancellation;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod filters;
pub mod history;
pub mod progress;
pub mod session;
pub mod view;

// Re-exports for convenient access
pub use cancellation::CancellationToken;
pub use catalog::{FilterKind, FilterSpec, ReportTemplate, find_template, templates};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigValidationError, SessionConfig, SessionConfigBuilder};
pub use driver::SessionDriver;
pub use error::{Result as SessionResult, ResultExt, SessionError};
pub use filters::FilterValues;
pub use history::{ReportHistory, ReportRecord};
pub use progress::{
    AttemptId, ClosureProgressReporter, GenerationState, GenerationStatus, ProgressReporter,
    ProgressUpdate,
};
pub use session::{Attempt, ReportSession, ReportSessionBuilder, TickOutcome};
pub use view::{ReportRecordView, SessionSnapshot, StatusView, format_timestamp};
