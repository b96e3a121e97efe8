use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use lambda::{Instance, InstanceApi};

use crate::ui;

/// List running instances
#[derive(Args)]
pub struct ListCommand {}

impl ListCommand {
    /// # Errors
    /// Fails when the instance listing cannot be fetched.
    pub async fn run(&self, api: &dyn InstanceApi) -> Result<()> {
        let spinner = ui::spinner("Fetching instances...");
        let fetched = api.list_instances().await;
        spinner.finish_and_clear();
        let instances = fetched.context("fetching instances")?;

        ui::print_section("Running Instances");
        print_instances(&instances);
        Ok(())
    }
}

/// Render instance detail blocks. Shared with the interactive menu.
pub fn print_instances(instances: &[Instance]) {
    if instances.is_empty() {
        ui::print_info("No running instances");
        return;
    }

    for instance in instances {
        let name = instance.name.as_deref().unwrap_or("unnamed");
        println!(
            "{} {}",
            name.bold(),
            format!("({})", instance.id).bright_black()
        );
        ui::print_kv("Status", &ui::status_badge(instance.status));
        if let Some(ty) = &instance.instance_type {
            ui::print_kv("Type", &ty.description);
            ui::print_kv("Cost", &ui::format_price(ty.price_cents_per_hour));
        }
        if let Some(region) = &instance.region {
            ui::print_kv(
                "Region",
                &format!("{} ({})", region.description, region.name),
            );
        }
        ui::print_kv("Public IP", instance.ip.as_deref().unwrap_or("n/a"));
        ui::print_kv(
            "Private IP",
            instance.private_ip.as_deref().unwrap_or("n/a"),
        );
        if !instance.ssh_key_names.is_empty() {
            ui::print_kv("SSH keys", &instance.ssh_key_names.join(", "));
        }
        if let Some(url) = &instance.jupyter_url {
            ui::print_kv("Jupyter", url);
        }
        println!();
    }
}
