//! Watch command handler

use anyhow::Result;
use chrono::Local;
use tracing::info;

use tagup_core::{connection, Config, Controller, ListView, SupabaseClient};

use crate::output::Output;

/// Print the list, then print it again after every change notification
pub async fn watch(config: &Config, output: &Output) -> Result<()> {
    let client = connection::connect(config);
    super::require_configured(&client)?;

    let mut controller =
        Controller::new(client.clone(), Some(ListView::new()), config.table.as_str());

    if controller.load().await {
        print_snapshot(&controller, output);
    }

    if !config.realtime_enabled {
        output.message("Realtime is disabled (realtime_enabled = false); not watching.");
        return Ok(());
    }

    let mut subscription = controller.subscribe(client.as_ref(), &config.schema);
    output.message("Watching for changes. Press Ctrl-C to stop.");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    break;
                };
                if controller.handle_event(event).await {
                    print_snapshot(&controller, output);
                }
            }
            _ = &mut ctrl_c => {
                info!("Stopping watch");
                subscription.shutdown().await;
                break;
            }
        }
    }

    Ok(())
}

fn print_snapshot(controller: &Controller<SupabaseClient, ListView>, output: &Output) {
    let Some(view) = controller.view() else {
        return;
    };

    if !output.is_json() && !output.is_quiet() {
        println!("── {} ──", Local::now().format("%H:%M:%S"));
    }
    output.print_rows(view.rows());
}
