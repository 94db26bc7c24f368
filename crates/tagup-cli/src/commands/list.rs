//! List command handler

use anyhow::{bail, Result};

use tagup_core::{connection, Config, Controller, ListView};

use crate::output::Output;

/// Fetch the current snapshot once and print it
pub async fn list(config: &Config, output: &Output) -> Result<()> {
    let client = connection::connect(config);
    super::require_configured(&client)?;

    let mut controller = Controller::new(client, Some(ListView::new()), config.table.as_str());
    if !controller.load().await {
        bail!("Failed to fetch updates from '{}'", config.table);
    }

    let rows = controller.view().map(ListView::rows).unwrap_or_default();
    output.print_rows(rows);

    Ok(())
}
