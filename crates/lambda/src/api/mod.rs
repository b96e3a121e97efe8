//! Lambda Cloud API access.

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::error::ApiError;
use models::{Instance, InstanceTypesData, LaunchRequest, SshKey};

pub use client::LambdaClient;

/// The Lambda Cloud operations the rest of the crate is built on.
///
/// [`LambdaClient`] is the production implementation; tests substitute
/// scripted fakes.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// Fetch the instance-type catalog with current per-region capacity.
    async fn instance_types(&self) -> Result<InstanceTypesData, ApiError>;

    /// List instances on the account.
    async fn list_instances(&self) -> Result<Vec<Instance>, ApiError>;

    /// Launch instances. Returns the IDs the platform actually started,
    /// which may be fewer than requested.
    async fn launch(&self, req: &LaunchRequest) -> Result<Vec<String>, ApiError>;

    /// Terminate instances. Returns the instances the platform confirmed;
    /// callers must treat that list, not the request, as the result.
    async fn terminate(&self, instance_ids: &[String]) -> Result<Vec<Instance>, ApiError>;

    /// List registered SSH keys.
    async fn ssh_keys(&self) -> Result<Vec<SshKey>, ApiError>;
}
