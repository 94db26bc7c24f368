//! Command handlers

pub mod config;
pub mod list;
pub mod post;
pub mod watch;

use anyhow::{bail, Result};
use tagup_core::{StoreError, SupabaseClient};

/// Fail early with setup instructions when the handle has no credentials
fn require_configured(client: &SupabaseClient) -> Result<()> {
    if client.is_configured() {
        return Ok(());
    }

    let err = StoreError::NotConfigured;
    match err.recovery_suggestion() {
        Some(hint) => bail!("{}\n{}", err, hint),
        None => bail!("{}", err),
    }
}
