//! Rendering of update records
//!
//! A render turns an ordered slice of records into one [`RenderedRow`] per
//! record and hands the whole list to an [`UpdatesView`], which replaces
//! whatever it showed before.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::models::UpdateRecord;

/// Timestamp format used for rows (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One visible row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    /// Local-time formatted timestamp, empty when the record has none
    pub timestamp: String,
    pub user_name: String,
    /// Site label without brackets
    pub site: Option<String>,
    pub text: String,
}

impl RenderedRow {
    /// Build the row for one record
    pub fn from_record(record: &UpdateRecord) -> Self {
        Self {
            timestamp: record
                .created_at
                .map(format_timestamp)
                .unwrap_or_default(),
            user_name: record.user_name().to_string(),
            site: record.site().map(str::to_string),
            text: record.text().to_string(),
        }
    }

    /// ` [site]` suffix shown after the author, empty without a site
    pub fn site_label(&self) -> String {
        self.site
            .as_ref()
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default()
    }

    /// Single-line form: `{timestamp} – {user}{ [site]}: {text}`
    pub fn line(&self) -> String {
        format!(
            "{} – {}{}: {}",
            self.timestamp,
            self.user_name,
            self.site_label(),
            self.text
        )
    }
}

/// Format a server timestamp in the local time zone
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Render records into rows, preserving order
pub fn render_rows(records: &[UpdateRecord]) -> Vec<RenderedRow> {
    records.iter().map(RenderedRow::from_record).collect()
}

/// Surface that displays the rendered list
pub trait UpdatesView {
    /// Drop every visible row and show `rows` instead
    fn replace_rows(&mut self, rows: Vec<RenderedRow>);
}

/// In-memory list of rendered rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    rows: Vec<RenderedRow>,
    renders: usize,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently visible rows
    pub fn rows(&self) -> &[RenderedRow] {
        &self.rows
    }

    /// Visible rows as single lines
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(RenderedRow::line).collect()
    }

    /// Number of times the list was rebuilt
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl UpdatesView for ListView {
    fn replace_rows(&mut self, rows: Vec<RenderedRow>) {
        self.rows = rows;
        self.renders += 1;
    }
}
