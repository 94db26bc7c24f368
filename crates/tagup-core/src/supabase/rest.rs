//! PostgREST calls
//!
//! Reads are `GET /rest/v1/{table}?select=*&...`, inserts are
//! `POST /rest/v1/{table}` with `Prefer: return=minimal`. Both send the anon
//! key as `apikey` and as a bearer token.

use serde::Deserialize;
use tracing::debug;

use super::Settings;
use crate::error::{StoreError, StoreResult};
use crate::models::{NewUpdate, UpdateRecord};
use crate::store::{Direction, Query};

/// Error body returned by PostgREST
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Build the table endpoint
pub(crate) fn table_url(settings: &Settings, table: &str) -> String {
    format!("{}/rest/v1/{}", settings.url, table)
}

/// Build query string pairs for a select
pub(crate) fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];

    for (column, value) in &query.filters {
        pairs.push((column.clone(), format!("eq.{}", value)));
    }

    if let Some((column, direction)) = &query.order {
        let dir = match direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{}", column, dir)));
    }

    pairs
}

fn authorized(request: reqwest::RequestBuilder, settings: &Settings) -> reqwest::RequestBuilder {
    request
        .header("apikey", &settings.anon_key)
        .bearer_auth(&settings.anon_key)
}

/// Read rows from a table
pub(crate) async fn select(
    http: &reqwest::Client,
    settings: &Settings,
    table: &str,
    query: &Query,
) -> StoreResult<Vec<UpdateRecord>> {
    let url = table_url(settings, table);
    debug!("Selecting from {}", table);

    let response = authorized(http.get(&url), settings)
        .query(&query_pairs(query))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    let rows: Vec<UpdateRecord> = serde_json::from_str(&body)?;
    debug!("Fetched {} rows from {}", rows.len(), table);
    Ok(rows)
}

/// Insert one row into a table
pub(crate) async fn insert(
    http: &reqwest::Client,
    settings: &Settings,
    table: &str,
    update: &NewUpdate,
) -> StoreResult<()> {
    let url = table_url(settings, table);
    debug!("Inserting into {}", table);

    let response = authorized(http.post(&url), settings)
        .header("Prefer", "return=minimal")
        .json(update)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(status.as_u16(), &body));
    }

    Ok(())
}

/// Turn an error response into a `StoreError::Api`
pub(crate) fn api_error(status: u16, body: &str) -> StoreError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();

    let mut message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
        message = format!("{} ({})", message, details);
    }
    if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
        message = format!("{}. Hint: {}", message, hint);
    }

    StoreError::Api {
        status,
        message,
        code: parsed.code,
    }
}
