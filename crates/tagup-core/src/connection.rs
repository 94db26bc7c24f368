//! Connection provider
//!
//! Builds the one store handle the process shares. Construction never
//! fails: with incomplete configuration the handle is still returned, a
//! warning is logged, and every call through it fails with
//! `StoreError::NotConfigured`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::supabase::SupabaseClient;

/// Build the shared Supabase handle from configuration
pub fn connect(config: &Config) -> Arc<SupabaseClient> {
    let client = SupabaseClient::new(
        config.supabase_url.as_deref(),
        config.supabase_anon.as_deref(),
    );

    match client.settings() {
        Some(settings) => info!("Using Supabase project at {}", settings.url),
        None => warn!(
            "Supabase URL or anon key not configured. Live data features will not work."
        ),
    }

    Arc::new(client)
}
