//! Supabase client
//!
//! Implements the store traits against a hosted Supabase project:
//!
//! - `rest`: PostgREST reads and inserts (`/rest/v1/{table}`)
//! - `realtime`: Phoenix channel subscription to `postgres_changes`
//!   (`/realtime/v1/websocket`)
//!
//! ## Usage
//!
//! ```ignore
//! let client = SupabaseClient::new(Some(url), Some(anon_key));
//! let rows = client.select("daily_updates", &Query::newest_first()).await?;
//! let subscription = client.subscribe(ChangeFilter::all("public", "daily_updates"));
//! ```

mod message;
mod realtime;
mod rest;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewUpdate, UpdateRecord};
use crate::store::{ChangeFeed, ChangeFilter, Query, RemoteStore, Subscription};

pub use message::{PhoenixMessage, PostgresChange};
pub use realtime::{spawn_realtime_task, RealtimeConfig};

/// Connection settings for one Supabase project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub anon_key: String,
}

impl Settings {
    /// Build settings, `None` if either value is missing or blank
    pub fn new(url: Option<&str>, anon_key: Option<&str>) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let anon_key = anon_key.map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    /// Realtime WebSocket endpoint
    pub fn realtime_url(&self) -> StoreResult<String> {
        let ws_base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(StoreError::InvalidUrl {
                url: self.url.clone(),
                details: "expected an http:// or https:// URL".to_string(),
            });
        };

        Ok(format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.anon_key
        ))
    }
}

/// Shared handle to a Supabase project
///
/// Always constructible. Without settings every store call fails with
/// [`StoreError::NotConfigured`] and subscriptions never yield events.
pub struct SupabaseClient {
    settings: Option<Settings>,
    http: reqwest::Client,
}

impl SupabaseClient {
    /// Create a client from raw configuration values
    pub fn new(url: Option<&str>, anon_key: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tagup/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            settings: Settings::new(url, anon_key),
            http,
        }
    }

    /// Whether URL and anon key are both present
    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    /// Connection settings, if configured
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    fn require_settings(&self) -> StoreResult<&Settings> {
        self.settings.as_ref().ok_or(StoreError::NotConfigured)
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    fn is_usable(&self) -> bool {
        self.is_configured()
    }

    async fn insert(&self, table: &str, update: &NewUpdate) -> StoreResult<()> {
        let settings = self.require_settings()?;
        rest::insert(&self.http, settings, table, update).await
    }

    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<UpdateRecord>> {
        let settings = self.require_settings()?;
        rest::select(&self.http, settings, table, query).await
    }
}

impl ChangeFeed for SupabaseClient {
    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        let Some(settings) = &self.settings else {
            return Subscription::inert();
        };

        let url = match settings.realtime_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Realtime disabled: {}", e);
                return Subscription::inert();
            }
        };

        spawn_realtime_task(RealtimeConfig {
            url,
            access_token: settings.anon_key.clone(),
            filter,
            heartbeat_interval: Duration::from_secs(25),
            ..RealtimeConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_require_both_values() {
        assert!(Settings::new(None, Some("key")).is_none());
        assert!(Settings::new(Some("https://x.supabase.co"), None).is_none());
        assert!(Settings::new(Some(""), Some("key")).is_none());
        assert!(Settings::new(Some("https://x.supabase.co"), Some("  ")).is_none());

        let settings = Settings::new(Some("https://x.supabase.co/"), Some("key")).unwrap();
        assert_eq!(settings.url, "https://x.supabase.co");
    }

    #[test]
    fn test_realtime_url() {
        let settings = Settings::new(Some("https://x.supabase.co"), Some("key")).unwrap();
        assert_eq!(
            settings.realtime_url().unwrap(),
            "wss://x.supabase.co/realtime/v1/websocket?apikey=key&vsn=1.0.0"
        );

        let local = Settings::new(Some("http://localhost:54321"), Some("key")).unwrap();
        assert!(local.realtime_url().unwrap().starts_with("ws://localhost:54321/"));

        let bad = Settings::new(Some("localhost"), Some("key")).unwrap();
        assert!(matches!(
            bad.realtime_url(),
            Err(StoreError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_network() {
        let client = SupabaseClient::new(None, None);
        assert!(!client.is_configured());
        assert!(!client.is_usable());

        let result = client.select("daily_updates", &Query::newest_first()).await;
        assert!(matches!(result, Err(StoreError::NotConfigured)));

        let update = NewUpdate {
            user_name: "Ann".to_string(),
            site: None,
            text: "hi".to_string(),
        };
        let result = client.insert("daily_updates", &update).await;
        assert!(matches!(result, Err(StoreError::NotConfigured)));

        let mut subscription = client.subscribe(ChangeFilter::all("public", "daily_updates"));
        assert!(subscription.recv().await.is_none());
    }
}
