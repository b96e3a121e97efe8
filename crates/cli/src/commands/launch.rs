use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use lambda::{
    acquire, AcquireOutcome, AcquireRequest, CancelToken, Catalog, InstanceApi,
    InstanceTypeEntry, SshKey, DEFAULT_RETRY_INTERVAL,
};

use crate::select::{DialoguerPrompt, SelectItem, SelectMenu, Selection};
use crate::ui;

/// Launch an instance, waiting for capacity if asked
#[derive(Args)]
pub struct LaunchCommand {
    /// Instance type to launch (interactive picker when omitted)
    #[arg(value_name = "TYPE")]
    instance_type: Option<String>,

    /// SSH key name to install (must be registered in the account)
    #[arg(long, value_name = "NAME")]
    ssh_key: Option<String>,

    /// Region to prefer when several have capacity
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Name for the launched instance(s)
    #[arg(long, value_name = "NAME")]
    name: Option<String>,

    /// Number of instances to launch
    #[arg(long, short = 'q', default_value_t = 1)]
    quantity: u32,

    /// Filesystem to attach (repeatable)
    #[arg(long = "filesystem", value_name = "NAME")]
    filesystems: Vec<String>,

    /// Keep polling until capacity appears
    #[arg(long)]
    wait: bool,

    /// Seconds between polling attempts
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_RETRY_INTERVAL.as_secs())]
    retry_interval: u64,

    /// Give up after this many attempts (unbounded when omitted)
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Include unavailable types in the interactive picker up front
    #[arg(long)]
    show_all: bool,
}

/// One catalog row in the interactive type picker.
struct TypeChoice<'a> {
    name: &'a str,
    entry: &'a InstanceTypeEntry,
}

impl SelectItem for TypeChoice<'_> {
    fn label(&self) -> String {
        let ty = &self.entry.instance_type;
        let specs = ty.specs.as_ref().map_or_else(
            || format!("{:>26}", ""),
            |s| {
                format!(
                    "{:>2} GPU {:>4} vCPU {:>5} GiB",
                    s.gpus, s.vcpus, s.memory_gib
                )
            },
        );
        let capacity = if self.entry.is_available() {
            format!(
                "available ({})",
                self.entry.regions_with_capacity_available.len()
            )
        } else {
            "no capacity".to_string()
        };
        format!(
            "{:<26} {specs} {:>11} {capacity}",
            self.name,
            ui::format_price(ty.price_cents_per_hour)
        )
    }

    fn sort_key(&self) -> String {
        self.name.to_string()
    }

    fn available(&self) -> bool {
        self.entry.is_available()
    }
}

impl SelectItem for SshKey {
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl LaunchCommand {
    /// Command the interactive menu dispatches: no preset type, interactive
    /// pickers, default polling knobs.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            instance_type: None,
            ssh_key: None,
            region: None,
            name: None,
            quantity: 1,
            filesystems: Vec::new(),
            wait: false,
            retry_interval: DEFAULT_RETRY_INTERVAL.as_secs(),
            max_retries: None,
            show_all: false,
        }
    }

    /// # Errors
    /// Fails on API errors, an unknown type or SSH key, or when no capacity
    /// was acquired within the retry budget.
    pub async fn run(&self, api: &dyn InstanceApi, cancel: &CancelToken) -> Result<()> {
        if self.quantity == 0 {
            bail!("--quantity must be at least 1");
        }

        let (instance_type, wait) = match &self.instance_type {
            Some(name) => (name.clone(), self.wait),
            None => {
                let Some((name, available)) = self.pick_instance_type(api).await? else {
                    ui::print_warning("Cancelled");
                    return Ok(());
                };
                ui::print_success(&format!("Selected {name}"));
                if !available && !self.wait {
                    ui::print_warning("No capacity right now; switching to wait mode");
                }
                (name, self.wait || !available)
            }
        };

        let Some(ssh_key) = self.resolve_ssh_key(api).await? else {
            ui::print_warning("Cancelled");
            return Ok(());
        };

        let request = AcquireRequest {
            instance_type: instance_type.clone(),
            quantity: self.quantity,
            ssh_key_names: vec![ssh_key],
            file_system_names: self.filesystems.clone(),
            name: self.name.clone(),
            preferred_region: self.region.clone(),
            retry_interval: Duration::from_secs(self.retry_interval),
            max_attempts: if wait { self.max_retries } else { Some(1) },
        };

        if wait {
            let budget = self
                .max_retries
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
            ui::print_info(&format!(
                "Polling for '{instance_type}' capacity every {}s (budget: {budget}), started {}. Press Ctrl-C to stop",
                self.retry_interval,
                Local::now().format("%H:%M:%S"),
            ));
        } else {
            ui::print_info(&format!("Checking capacity for '{instance_type}'..."));
        }

        match acquire(api, &request, cancel)
            .await
            .context("acquiring capacity")?
        {
            AcquireOutcome::Launched {
                region,
                instance_ids,
                attempts,
                elapsed,
            } => {
                ui::print_success(&format!(
                    "Launched {} instance(s) in {} after {attempts} attempt(s) ({})",
                    instance_ids.len(),
                    region.name,
                    ui::format_duration(elapsed),
                ));
                for id in &instance_ids {
                    ui::print_list_item(id);
                }
                ui::print_info("Run 'lambda list' to see instance details once they boot");
                Ok(())
            }
            AcquireOutcome::TypeNotFound { .. } => {
                bail!("instance type '{instance_type}' does not exist")
            }
            // A refused launch is not a capacity miss; surface the API's
            // reason instead of the no-capacity hint.
            AcquireOutcome::Exhausted {
                attempts,
                last_launch_error: Some(reason),
                ..
            } => {
                bail!("launch failed after {attempts} attempt(s): {reason}")
            }
            AcquireOutcome::Exhausted { .. } if !wait => {
                ui::print_warning(&format!(
                    "No capacity for '{instance_type}' in any region right now"
                ));
                ui::print_info("Tip: use --wait to keep retrying until capacity appears");
                bail!("no capacity available for '{instance_type}'")
            }
            AcquireOutcome::Exhausted {
                attempts, elapsed, ..
            } => {
                bail!(
                    "gave up after {attempts} attempt(s) over {}",
                    ui::format_duration(elapsed)
                )
            }
            AcquireOutcome::Cancelled { attempts } => {
                ui::print_warning(&format!("Cancelled after {attempts} attempt(s)"));
                Ok(())
            }
        }
    }

    /// Interactive type picker. `None` means the user backed out.
    async fn pick_instance_type(&self, api: &dyn InstanceApi) -> Result<Option<(String, bool)>> {
        let spinner = ui::spinner("Fetching instance types...");
        let fetched = api.instance_types().await;
        spinner.finish_and_clear();
        let catalog = Catalog::new(fetched.context("fetching instance types")?);

        let choices: Vec<TypeChoice> = catalog
            .iter()
            .map(|(name, entry)| TypeChoice { name, entry })
            .collect();

        let menu = SelectMenu::new(&choices, "Select an instance type")
            .with_toggle("unavailable types", self.show_all);

        match menu.run(&mut DialoguerPrompt)? {
            Selection::Chosen(idx) => {
                let choice = &choices[idx];
                Ok(Some((choice.name.to_string(), choice.entry.is_available())))
            }
            Selection::Cancelled => Ok(None),
            Selection::Empty => bail!("the instance-type catalog is empty"),
        }
    }

    /// Resolve the SSH key to launch with. `None` means the user backed out
    /// of the picker.
    async fn resolve_ssh_key(&self, api: &dyn InstanceApi) -> Result<Option<String>> {
        let spinner = ui::spinner("Fetching SSH keys...");
        let fetched = api.ssh_keys().await;
        spinner.finish_and_clear();
        let keys = fetched.context("fetching SSH keys")?;

        if let Some(want) = &self.ssh_key {
            if keys.iter().any(|key| key.name == *want) {
                return Ok(Some(want.clone()));
            }
            let names: Vec<&str> = keys.iter().map(|key| key.name.as_str()).collect();
            bail!(
                "SSH key '{want}' not found; registered keys: {}",
                if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(", ")
                }
            );
        }

        if keys.is_empty() {
            bail!("no SSH keys registered; add one at https://cloud.lambda.ai/ssh-keys");
        }
        if keys.len() == 1 {
            ui::print_info(&format!("Using SSH key '{}'", keys[0].name));
            return Ok(Some(keys[0].name.clone()));
        }

        let menu = SelectMenu::new(&keys, "Select an SSH key");
        match menu.run(&mut DialoguerPrompt)? {
            Selection::Chosen(idx) => Ok(Some(keys[idx].name.clone())),
            Selection::Cancelled => Ok(None),
            Selection::Empty => bail!("no SSH keys registered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lambda::api::models::InstanceTypesData;
    use lambda::{ApiError, Instance, LaunchRequest};

    use super::*;

    /// Scripted [`InstanceApi`] for exercising `run` without a terminal.
    #[derive(Default)]
    struct ScriptedApi {
        catalogs: Mutex<VecDeque<Result<InstanceTypesData, ApiError>>>,
        launches: Mutex<VecDeque<Result<Vec<String>, ApiError>>>,
        keys: Vec<SshKey>,
    }

    #[async_trait]
    impl InstanceApi for ScriptedApi {
        async fn instance_types(&self) -> Result<InstanceTypesData, ApiError> {
            self.catalogs
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted catalog fetch")
        }

        async fn list_instances(&self) -> Result<Vec<Instance>, ApiError> {
            Ok(Vec::new())
        }

        async fn launch(&self, _req: &LaunchRequest) -> Result<Vec<String>, ApiError> {
            self.launches
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted launch")
        }

        async fn terminate(&self, _instance_ids: &[String]) -> Result<Vec<Instance>, ApiError> {
            Ok(Vec::new())
        }

        async fn ssh_keys(&self) -> Result<Vec<SshKey>, ApiError> {
            Ok(self.keys.clone())
        }
    }

    fn catalog_with_capacity(available: bool) -> InstanceTypesData {
        let regions = if available {
            serde_json::json!([{"name": "us-east-1", "description": "Virginia, USA"}])
        } else {
            serde_json::json!([])
        };
        serde_json::from_value(serde_json::json!({
            "gpu_1x_h100_pcie": {
                "instance_type": {
                    "name": "gpu_1x_h100_pcie",
                    "description": "1x H100 (80 GB PCIe)",
                    "gpu_description": "H100 (80 GB PCIe)",
                    "price_cents_per_hour": 249,
                    "specs": {"gpus": 1, "vcpus": 26, "memory_gib": 200, "storage_gib": 1000}
                },
                "regions_with_capacity_available": regions
            }
        }))
        .unwrap()
    }

    fn ssh_key(name: &str) -> SshKey {
        serde_json::from_value(serde_json::json!({"id": "key-1", "name": name})).unwrap()
    }

    fn one_shot() -> LaunchCommand {
        LaunchCommand {
            instance_type: Some("gpu_1x_h100_pcie".to_string()),
            ssh_key: Some("work".to_string()),
            region: None,
            name: None,
            quantity: 1,
            filesystems: Vec::new(),
            wait: false,
            retry_interval: 0,
            max_retries: None,
            show_all: false,
        }
    }

    #[tokio::test]
    async fn test_one_shot_launch_rejection_reports_the_refusal() {
        let api = ScriptedApi {
            keys: vec![ssh_key("work")],
            ..ScriptedApi::default()
        };
        api.catalogs
            .lock()
            .unwrap()
            .push_back(Ok(catalog_with_capacity(true)));
        api.launches.lock().unwrap().push_back(Err(ApiError::Api {
            status: 400,
            message: "Instance quota exceeded".to_string(),
            suggestion: Some("Contact support to raise your quota".to_string()),
        }));

        let err = one_shot()
            .run(&api, &CancelToken::new())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Instance quota exceeded"), "{message}");
        assert!(
            message.contains("Contact support to raise your quota"),
            "{message}"
        );
        assert!(!message.contains("no capacity"), "{message}");
    }

    #[tokio::test]
    async fn test_one_shot_without_capacity_points_at_wait() {
        let api = ScriptedApi {
            keys: vec![ssh_key("work")],
            ..ScriptedApi::default()
        };
        api.catalogs
            .lock()
            .unwrap()
            .push_back(Ok(catalog_with_capacity(false)));

        let err = one_shot()
            .run(&api, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no capacity available"));
    }
}
