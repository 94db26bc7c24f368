//! Data models for tagup
//!
//! `UpdateRecord` is a row as read from the remote table. Every field is
//! optional so that legacy or foreign rows still decode; missing fields are
//! treated as absent. `NewUpdate` is the validated shape this client writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A daily tag-up update as stored in the remote table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateRecord {
    /// Server-assigned identifier (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// When the row was inserted on the server
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Author display name
    #[serde(default)]
    pub user_name: Option<String>,
    /// Optional short label (location or project)
    #[serde(default)]
    pub site: Option<String>,
    /// Update body
    #[serde(default, rename = "update")]
    pub text: Option<String>,
}

impl UpdateRecord {
    /// Author name, empty when absent
    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("")
    }

    /// Site label, `None` when absent or blank
    pub fn site(&self) -> Option<&str> {
        self.site.as_deref().filter(|s| !s.is_empty())
    }

    /// Update body, empty when absent
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// A new update to insert
///
/// Only built through [`crate::form::validate`], so `user_name` and `text`
/// are trimmed and non-empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewUpdate {
    pub user_name: String,
    /// Serialized as `null` when absent, never as an empty string
    pub site: Option<String>,
    #[serde(rename = "update")]
    pub text: String,
}

/// Accept anything for `created_at`, keeping only values that parse
///
/// Supabase returns `timestamptz` as RFC 3339, but foreign rows may carry
/// `null`, a bare timestamp without offset, or garbage.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let Some(serde_json::Value::String(raw)) = value else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    Ok(
        chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc()),
    )
}
