use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use lambda::{Catalog, InstanceApi};

use crate::ui;

/// Availability filter for the catalog listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ShowFilter {
    /// Every instance type.
    #[default]
    All,
    /// Only types with capacity right now.
    Available,
    /// Only types without capacity anywhere.
    Unavailable,
}

/// List instance types and where they have capacity
#[derive(Args)]
pub struct TypesCommand {
    /// Case-insensitive substring filter on the type name (e.g. "h100")
    #[arg(long, value_name = "SUBSTR")]
    filter: Option<String>,

    /// Which types to show
    #[arg(long, value_enum, default_value_t = ShowFilter::All)]
    show: ShowFilter,
}

impl TypesCommand {
    /// # Errors
    /// Fails when the catalog cannot be fetched.
    pub async fn run(&self, api: &dyn InstanceApi) -> Result<()> {
        let spinner = ui::spinner("Fetching instance types...");
        let fetched = api.instance_types().await;
        spinner.finish_and_clear();
        let catalog = Catalog::new(fetched.context("fetching instance types")?);

        ui::print_section(match self.show {
            ShowFilter::All => "Instance Types",
            ShowFilter::Available => "Available Instance Types",
            ShowFilter::Unavailable => "Unavailable Instance Types",
        });

        let mut available = 0usize;
        let mut unavailable = 0usize;
        let mut shown = 0usize;

        for (name, entry) in catalog.iter() {
            if let Some(filter) = &self.filter {
                if !name.to_lowercase().contains(&filter.to_lowercase()) {
                    continue;
                }
            }

            let has_capacity = entry.is_available();
            if has_capacity {
                available += 1;
            } else {
                unavailable += 1;
            }
            match self.show {
                ShowFilter::Available if !has_capacity => continue,
                ShowFilter::Unavailable if has_capacity => continue,
                _ => {}
            }
            shown += 1;

            println!("{}", name.bold());
            let ty = &entry.instance_type;
            ui::print_kv("Description", &ty.description);
            if let Some(gpu) = &ty.gpu_description {
                ui::print_kv("GPU", gpu);
            }
            if let Some(specs) = &ty.specs {
                ui::print_kv(
                    "Specs",
                    &format!(
                        "{} GPUs, {} vCPUs, {} GiB RAM, {} GiB storage",
                        specs.gpus, specs.vcpus, specs.memory_gib, specs.storage_gib
                    ),
                );
            }
            ui::print_kv("Cost", &ui::format_price(ty.price_cents_per_hour));
            if has_capacity {
                let regions: Vec<&str> = entry
                    .regions_with_capacity_available
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect();
                ui::print_kv(
                    "Capacity",
                    &format!("{}", format!("available in {}", regions.join(", ")).green()),
                );
            } else {
                ui::print_kv("Capacity", &format!("{}", "none in any region".red()));
            }
            println!();
        }

        match self.show {
            ShowFilter::All => ui::print_info(&format!(
                "{available} of {} instance types have capacity right now",
                available + unavailable
            )),
            _ => ui::print_info(&format!(
                "Showing {shown} of {} types ({available} available, {unavailable} unavailable)",
                available + unavailable
            )),
        }

        Ok(())
    }
}
