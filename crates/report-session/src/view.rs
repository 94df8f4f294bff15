//! Read-only views for a presentation layer.
//!
//! Everything here is derived from a [`ReportSession`] on demand and carries
//! display-ready strings, so a renderer never has to format timestamps or
//! filters itself.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::filters::FilterValues;
use crate::history::ReportRecord;
use crate::progress::{GenerationState, GenerationStatus};
use crate::session::ReportSession;

/// Timestamp format used in record views.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Formats a timestamp for display.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Lifecycle status with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub status: GenerationStatus,
    pub progress: u8,
    pub label: String,
}

impl From<GenerationState> for StatusView {
    fn from(state: GenerationState) -> Self {
        let label = match state.status {
            GenerationStatus::Generating => format!("Generating... {}%", state.progress),
            other => other.display_name().to_string(),
        };
        Self {
            status: state.status,
            progress: state.progress,
            label,
        }
    }
}

/// One row of the generated-reports list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecordView {
    /// Passed back to `delete_report`.
    pub id: String,
    pub report_type: String,
    /// `key: value` pairs joined by `", "`.
    pub filters: String,
    pub generated_at: String,
    pub expires_at: String,
    pub download_url: String,
}

impl From<&ReportRecord> for ReportRecordView {
    fn from(record: &ReportRecord) -> Self {
        Self {
            id: record.id.clone(),
            report_type: record.report_type.clone(),
            filters: record.filters.display(),
            generated_at: format_timestamp(record.generated_at),
            expires_at: format_timestamp(record.expires_at),
            download_url: record.download_url.clone(),
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub filters: FilterValues,
    pub status: StatusView,
    pub can_generate: bool,
    pub missing_filters: Vec<String>,
    pub active_reports: Vec<ReportRecordView>,
}

impl SessionSnapshot {
    pub fn capture(session: &ReportSession) -> Self {
        let template = session.selected_template();
        Self {
            template_id: template.map(|t| t.id.clone()),
            template_name: template.map(|t| t.name.clone()),
            filters: session.filter_values().clone(),
            status: session.state().into(),
            can_generate: session.can_generate(),
            missing_filters: session.missing_filters(),
            active_reports: session
                .list_active_reports()
                .into_iter()
                .map(ReportRecordView::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    #[test]
    fn test_status_labels() {
        assert_eq!(StatusView::from(GenerationState::default()).label, "Idle");
        assert_eq!(
            StatusView::from(GenerationState {
                status: GenerationStatus::Generating,
                progress: 30,
            })
            .label,
            "Generating... 30%"
        );
        assert_eq!(
            StatusView::from(GenerationState {
                status: GenerationStatus::Completed,
                progress: 100,
            })
            .label,
            "Completed"
        );
        assert_eq!(
            StatusView::from(GenerationState {
                status: GenerationStatus::Cancelled,
                progress: 0,
            })
            .label,
            "Cancelled"
        );
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 2, 28, 9, 5, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-02-28 09:05 UTC");
    }

    #[test]
    fn test_snapshot_of_completed_session() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut session = ReportSession::builder()
            .clock(ManualClock::new(start))
            .build()
            .unwrap();
        session.select_report_template("sales").unwrap();
        session.set_filter_value("dateRange", "2024-01").unwrap();
        session.set_filter_value("region", "North").unwrap();

        let snapshot = SessionSnapshot::capture(&session);
        assert_eq!(snapshot.template_name.as_deref(), Some("Sales Report"));
        assert!(!snapshot.can_generate);
        assert_eq!(snapshot.missing_filters, ["productCategory"]);

        session.set_filter_value("productCategory", "Electronics").unwrap();
        let attempt = session.start_generation().unwrap();
        while !session.tick(attempt.id).is_final() {}

        let snapshot = SessionSnapshot::capture(&session);
        assert_eq!(snapshot.status.label, "Completed");
        assert_eq!(snapshot.active_reports.len(), 1);

        let row = &snapshot.active_reports[0];
        assert_eq!(row.report_type, "Sales Report");
        assert_eq!(
            row.filters,
            "dateRange: 2024-01, region: North, productCategory: Electronics"
        );
        assert_eq!(row.generated_at, "2024-01-01 08:00 UTC");
        assert_eq!(row.expires_at, "2024-01-29 08:00 UTC");

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"]["status"], "completed");
        assert_eq!(json["filters"]["region"], "North");
    }
}
