use anyhow::{bail, Context, Result};
use clap::Args;
use lambda::{Instance, InstanceApi};

use crate::select::{DialoguerPrompt, SelectItem, SelectMenu, Selection};
use crate::ui;

/// Terminate instances
#[derive(Args)]
pub struct TerminateCommand {
    /// Instance IDs to terminate (interactive picker when omitted)
    #[arg(value_name = "ID", conflicts_with = "all")]
    instance_ids: Vec<String>,

    /// Terminate every running instance
    #[arg(long)]
    all: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

/// One row in the interactive termination picker.
#[derive(Clone, Copy)]
enum TerminateChoice<'a> {
    One(&'a Instance),
    All(usize),
}

impl SelectItem for TerminateChoice<'_> {
    fn label(&self) -> String {
        match self {
            Self::One(instance) => {
                let ty = instance
                    .instance_type
                    .as_ref()
                    .map_or("unknown type", |t| t.name.as_str());
                let name = instance.name.as_deref().unwrap_or("unnamed");
                let region = instance.region.as_ref().map_or("-", |r| r.name.as_str());
                format!("{:<20} {ty:<26} {name:<20} {region}", instance.id)
            }
            Self::All(count) => format!("Terminate ALL {count} instances"),
        }
    }
}

impl TerminateCommand {
    /// Command the interactive menu dispatches.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            instance_ids: Vec::new(),
            all: false,
            yes: false,
        }
    }

    /// # Errors
    /// Fails on API errors or when a requested ID is not running.
    pub async fn run(&self, api: &dyn InstanceApi) -> Result<()> {
        let spinner = ui::spinner("Fetching instances...");
        let fetched = api.list_instances().await;
        spinner.finish_and_clear();
        let instances = fetched.context("fetching instances")?;

        if instances.is_empty() {
            ui::print_info("No running instances to terminate");
            return Ok(());
        }

        let targets: Vec<&Instance> = if self.all {
            instances.iter().collect()
        } else if !self.instance_ids.is_empty() {
            let unknown = unknown_ids(&self.instance_ids, &instances);
            if !unknown.is_empty() {
                bail!(
                    "not valid or not running: {}; nothing was terminated",
                    unknown.join(", ")
                );
            }
            instances
                .iter()
                .filter(|inst| self.instance_ids.contains(&inst.id))
                .collect()
        } else {
            match self.pick_targets(&instances)? {
                Some(targets) => targets,
                None => {
                    ui::print_warning("Termination cancelled");
                    return Ok(());
                }
            }
        };

        ui::print_section("Instances to terminate");
        for instance in &targets {
            let name = instance.name.as_deref().unwrap_or("unnamed");
            let ty = instance
                .instance_type
                .as_ref()
                .map_or("unknown type", |t| t.name.as_str());
            let region = instance.region.as_ref().map_or("-", |r| r.name.as_str());
            ui::print_list_item(&format!("{} - {name} ({ty}, {region})", instance.id));
        }
        if targets.len() > 1 && targets.len() == instances.len() {
            ui::print_warning(&format!(
                "This will terminate ALL {} instances",
                targets.len()
            ));
        }

        if !self.yes
            && !ui::confirm(
                &format!("Terminate {} instance(s)?", targets.len()),
                false,
            )?
        {
            ui::print_warning("Termination cancelled");
            return Ok(());
        }

        let ids: Vec<String> = targets.iter().map(|inst| inst.id.clone()).collect();
        let spinner = ui::spinner("Terminating instances...");
        let result = api.terminate(&ids).await;
        spinner.finish_and_clear();

        // The confirmed list is authoritative; a missing ID is reported,
        // never silently re-requested.
        let confirmed = result.context("terminating instances")?;
        if confirmed.is_empty() {
            ui::print_warning("The platform confirmed no terminations");
            return Ok(());
        }
        if confirmed.len() < ids.len() {
            ui::print_warning(&format!(
                "The platform confirmed {} of {} requested terminations",
                confirmed.len(),
                ids.len()
            ));
        }

        ui::print_success(&format!(
            "Termination confirmed for {} instance(s):",
            confirmed.len()
        ));
        for instance in &confirmed {
            ui::print_list_item(&instance.id);
        }
        Ok(())
    }

    /// Interactive picker. `None` means the user backed out.
    fn pick_targets<'a>(&self, instances: &'a [Instance]) -> Result<Option<Vec<&'a Instance>>> {
        let mut choices: Vec<TerminateChoice<'a>> =
            instances.iter().map(TerminateChoice::One).collect();
        if instances.len() > 1 {
            choices.push(TerminateChoice::All(instances.len()));
        }

        let menu = SelectMenu::new(&choices, "Select an instance to terminate");
        match menu.run(&mut DialoguerPrompt)? {
            Selection::Chosen(idx) => match choices[idx] {
                TerminateChoice::One(instance) => Ok(Some(vec![instance])),
                TerminateChoice::All(_) => Ok(Some(instances.iter().collect())),
            },
            Selection::Cancelled | Selection::Empty => Ok(None),
        }
    }
}

/// Requested IDs that are not in the live listing.
fn unknown_ids<'a>(requested: &'a [String], instances: &[Instance]) -> Vec<&'a str> {
    requested
        .iter()
        .filter(|id| !instances.iter().any(|inst| inst.id == **id))
        .map(String::as_str)
        .collect()
}
