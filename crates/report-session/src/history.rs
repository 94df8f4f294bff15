//! Generated report records and the session's history of them.
//!
//! History is newest first. Records are never pruned automatically; expired
//! records are hidden by [`ReportHistory::active`] and stay stored until the
//! user deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::filters::FilterValues;

/// An immutable snapshot of one completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Unique id, derived from the creation time and a session sequence.
    pub id: String,
    /// Template id the report was generated from.
    pub template_id: String,
    /// Display name of the report type, e.g. "Sales Report".
    pub report_type: String,
    /// Filter values at the moment generation completed.
    pub filters: FilterValues,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Opaque reference the presentation layer resolves to the artifact.
    pub download_url: String,
}

impl ReportRecord {
    /// Returns `true` while `now` is strictly before the expiration time.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Builds a record id of the form `rpt_<unix-millis>_<seq>`.
pub(crate) fn mint_record_id(generated_at: DateTime<Utc>, seq: u64) -> String {
    format!("rpt_{}_{}", generated_at.timestamp_millis(), seq)
}

/// Builds the download reference for a record id.
pub(crate) fn download_reference(config: &SessionConfig, record_id: &str) -> String {
    format!(
        "{}/{}.{}",
        config.download_base.trim_end_matches('/'),
        record_id,
        config.download_format
    )
}

/// Ordered sequence of records, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportHistory {
    records: Vec<ReportRecord>,
}

impl ReportHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record at the front.
    pub fn prepend(&mut self, record: ReportRecord) {
        self.records.insert(0, record);
    }

    /// Removes the record with `id`, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<ReportRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&ReportRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records still active at `now`, newest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<&ReportRecord> {
        self.records.iter().filter(|r| r.is_active_at(now)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(id: &str, generated_at: DateTime<Utc>) -> ReportRecord {
        ReportRecord {
            id: id.to_string(),
            template_id: "sales".to_string(),
            report_type: "Sales Report".to_string(),
            filters: FilterValues::new(),
            generated_at,
            expires_at: generated_at + Duration::days(28),
            download_url: format!("reports://generated/{id}.pdf"),
        }
    }

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_prepend_keeps_newest_first() {
        let mut history = ReportHistory::new();
        history.prepend(record("a", jan(1)));
        history.prepend(record("b", jan(2)));

        let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut history = ReportHistory::new();
        history.prepend(record("a", jan(1)));
        history.prepend(record("b", jan(2)));

        assert_eq!(history.remove("a").map(|r| r.id), Some("a".to_string()));
        assert!(history.remove("a").is_none());
        assert!(history.remove("missing").is_none());
        assert_eq!(history.len(), 1);
        assert!(history.get("b").is_some());
    }

    #[test]
    fn test_active_excludes_expired_and_boundary() {
        let mut history = ReportHistory::new();
        history.prepend(record("old", jan(1)));
        history.prepend(record("mid", jan(5)));
        history.prepend(record("new", jan(10)));

        // "old" expires exactly at jan(1) + 28 days
        let now = jan(1) + Duration::days(28);
        let active: Vec<&str> = history.active(now).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(active, ["new", "mid"]);

        let just_before = now - Duration::milliseconds(1);
        assert_eq!(history.active(just_before).len(), 3);

        // filtering never removes anything
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_mint_record_id() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(mint_record_id(at, 7), "rpt_1700000000123_7");
    }

    #[test]
    fn test_download_reference_trims_trailing_slash() {
        let config = SessionConfig::builder()
            .download_base("https://files.example.com/")
            .download_format("csv")
            .build()
            .unwrap();
        assert_eq!(
            download_reference(&config, "rpt_1_1"),
            "https://files.example.com/rpt_1_1.csv"
        );
    }
}
