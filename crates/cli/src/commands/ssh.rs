use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use lambda::{Instance, InstanceApi};

use crate::select::{DialoguerPrompt, SelectItem, SelectMenu, Selection};
use crate::ssh_config::SshConfigManager;
use crate::ui;

/// Manage ~/.ssh/config entries for instances
#[derive(Args)]
pub struct SshConfigCommand {
    #[command(subcommand)]
    action: Option<SshConfigAction>,
}

#[derive(Subcommand)]
enum SshConfigAction {
    /// Add a host entry for a running instance
    Add {
        /// Instance ID (interactive picker when omitted)
        #[arg(long, value_name = "ID")]
        instance: Option<String>,

        /// Host alias (prompted with a generated default when omitted)
        #[arg(long, value_name = "ALIAS")]
        alias: Option<String>,
    },

    /// Remove every managed host entry
    Remove {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List managed host entries
    List,
}

/// One row in the instance picker.
struct InstanceRow<'a>(&'a Instance);

impl SelectItem for InstanceRow<'_> {
    fn label(&self) -> String {
        let inst = self.0;
        let ty = inst
            .instance_type
            .as_ref()
            .map_or("unknown type", |t| t.name.as_str());
        let name = inst.name.as_deref().unwrap_or("unnamed");
        let ip = inst.ip.as_deref().unwrap_or("no IP");
        format!("{:<20} {ty:<26} {name:<20} {ip}", inst.id)
    }
}

/// One row in the bare `ssh-config` submenu.
#[derive(Clone, Copy)]
enum SshMenuChoice {
    Add,
    Remove,
    List,
}

impl SelectItem for SshMenuChoice {
    fn label(&self) -> String {
        match self {
            Self::Add => "Add an entry for a running instance".to_string(),
            Self::Remove => "Remove all managed entries".to_string(),
            Self::List => "List managed entries".to_string(),
        }
    }
}

impl SshConfigCommand {
    /// Command the interactive menu dispatches: submenu mode.
    #[must_use]
    pub fn interactive() -> Self {
        Self { action: None }
    }

    /// # Errors
    /// Fails on API errors or when the config file cannot be edited.
    pub async fn run(&self, api: &dyn InstanceApi) -> Result<()> {
        match &self.action {
            Some(SshConfigAction::Add { instance, alias }) => {
                add_entry(api, instance.as_deref(), alias.as_deref()).await
            }
            Some(SshConfigAction::Remove { yes }) => remove_entries(*yes),
            Some(SshConfigAction::List) => list_entries(),
            None => run_submenu(api).await,
        }
    }
}

async fn run_submenu(api: &dyn InstanceApi) -> Result<()> {
    let choices = [SshMenuChoice::Add, SshMenuChoice::Remove, SshMenuChoice::List];
    let menu = SelectMenu::new(&choices, "SSH config");

    match menu.run(&mut DialoguerPrompt)? {
        Selection::Chosen(idx) => match choices[idx] {
            SshMenuChoice::Add => add_entry(api, None, None).await,
            SshMenuChoice::Remove => remove_entries(false),
            SshMenuChoice::List => list_entries(),
        },
        Selection::Cancelled | Selection::Empty => Ok(()),
    }
}

async fn add_entry(
    api: &dyn InstanceApi,
    instance_id: Option<&str>,
    alias: Option<&str>,
) -> Result<()> {
    let spinner = ui::spinner("Fetching instances...");
    let fetched = api.list_instances().await;
    spinner.finish_and_clear();
    let instances = fetched.context("fetching instances")?;

    if instances.is_empty() {
        ui::print_info("No running instances to add an entry for");
        return Ok(());
    }

    let instance = match instance_id {
        Some(id) => instances
            .iter()
            .find(|inst| inst.id == id)
            .ok_or_else(|| anyhow::anyhow!("instance '{id}' is not running"))?,
        None => {
            let rows: Vec<InstanceRow> = instances.iter().map(InstanceRow).collect();
            let menu = SelectMenu::new(&rows, "Select an instance");
            match menu.run(&mut DialoguerPrompt)? {
                Selection::Chosen(idx) => rows[idx].0,
                Selection::Cancelled | Selection::Empty => {
                    ui::print_warning("Cancelled");
                    return Ok(());
                }
            }
        }
    };

    let Some(ip) = instance.ip.as_deref() else {
        bail!("instance {} has no IP address yet", instance.id);
    };

    let alias = match alias {
        Some(alias) => alias.to_string(),
        None => {
            let prompt = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("SSH alias")
                .default(SshConfigManager::default_alias(&instance.id))
                .interact_text();
            match prompt {
                Ok(alias) => alias,
                Err(dialoguer::Error::IO(err))
                    if err.kind() == std::io::ErrorKind::Interrupted =>
                {
                    ui::print_warning("Cancelled");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    let manager = SshConfigManager::new()?;
    manager.add(&instance.id, &alias, ip)?;
    ui::print_success(&format!("Added '{alias}' for {}", instance.id));
    ui::print_info(&format!("Connect with: ssh {alias}"));
    Ok(())
}

fn remove_entries(yes: bool) -> Result<()> {
    let manager = SshConfigManager::new()?;
    let entries = manager.entries()?;
    if entries.is_empty() {
        ui::print_info("No managed SSH config entries");
        return Ok(());
    }

    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    if !yes
        && !ui::confirm(
            &format!("Remove {} managed SSH config {noun}?", entries.len()),
            false,
        )?
    {
        ui::print_warning("Cancelled");
        return Ok(());
    }

    let removed = manager.remove_all()?;
    let noun = if removed == 1 { "entry" } else { "entries" };
    ui::print_success(&format!("Removed {removed} {noun}"));
    Ok(())
}

fn list_entries() -> Result<()> {
    let manager = SshConfigManager::new()?;
    let entries = manager.entries()?;
    if entries.is_empty() {
        ui::print_info("No managed SSH config entries");
        return Ok(());
    }

    ui::print_section("Managed SSH config entries");
    for entry in &entries {
        ui::print_list_item(&format!(
            "{}: {} (instance {})",
            entry.alias, entry.host_name, entry.instance_id
        ));
    }
    Ok(())
}
