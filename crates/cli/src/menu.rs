//! Interactive session menu.
//!
//! One flat loop: render the instance summary, prompt for an action,
//! dispatch, confirm another round. Handlers that fail report their error
//! and drop back to the menu instead of aborting the session.

use anyhow::Result;
use colored::Colorize;
use lambda::{CancelToken, Instance, InstanceApi};

use crate::commands::{LaunchCommand, SshConfigCommand, TerminateCommand};
use crate::ui;

/// Fixed action rows, in render order.
const ACTIONS: [&str; 5] = [
    "[Refresh]",
    "Launch a new instance",
    "Terminate instances",
    "Manage SSH config",
    "Exit",
];

/// Cursor starts on Launch, the common case.
const DEFAULT_ACTION: usize = 1;

/// Run the session loop until the user leaves.
///
/// Leaving means picking Exit, backing out of the action prompt, declining
/// another round, or a Ctrl-C observed on the cancellation token.
///
/// # Errors
/// Fails when the terminal cannot be driven.
pub async fn run(api: &dyn InstanceApi, cancel: &CancelToken) -> Result<()> {
    loop {
        render_summary(api).await;

        let Some(action) = ui::choose("What would you like to do?", &ACTIONS, DEFAULT_ACTION)?
        else {
            break;
        };

        let outcome = match action {
            0 => continue,
            1 => LaunchCommand::interactive().run(api, cancel).await,
            2 => TerminateCommand::interactive().run(api).await,
            3 => SshConfigCommand::interactive().run(api).await,
            _ => break,
        };

        if let Err(err) = outcome {
            ui::print_error(&format!("{err:#}"));
        }

        // A Ctrl-C that interrupted a handler ends the whole session; the
        // token stays cancelled, so later acquisitions could never run.
        if cancel.is_cancelled() {
            break;
        }

        println!();
        if !ui::confirm("Another action?", true)? {
            break;
        }
    }

    println!("{}", "Goodbye!".bright_black());
    Ok(())
}

/// One-line-per-instance summary above the action prompt. The menu stays
/// usable when the listing is down.
async fn render_summary(api: &dyn InstanceApi) {
    ui::print_section("Lambda Cloud instances");

    match api.list_instances().await {
        Ok(instances) if instances.is_empty() => ui::print_info("No running instances"),
        Ok(instances) => {
            for instance in &instances {
                print_summary_line(instance);
            }
        }
        Err(err) => ui::print_warning(&format!("Could not fetch instances: {err}")),
    }
    println!();
}

fn print_summary_line(instance: &Instance) {
    let ty = instance
        .instance_type
        .as_ref()
        .map_or("unknown type", |t| t.name.as_str());
    let name = instance.name.as_deref().unwrap_or("unnamed");
    let region = instance.region.as_ref().map_or("-", |r| r.name.as_str());
    println!(
        "  {} {:<20} {ty:<26} {name:<20} {region:<12} {}",
        "▸".cyan(),
        instance.id,
        ui::status_badge(instance.status)
    );
}
