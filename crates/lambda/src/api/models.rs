//! Lambda Cloud API v1 wire models.
//!
//! Field names mirror the JSON payloads exactly. Everything above this layer
//! works with these types rather than raw `serde_json` values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Response envelopes
// ============================================================================

/// Response wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Response payload.
    pub data: T,
}

/// Error envelope returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    /// Error payload.
    pub error: ApiErrorBody,
}

/// Structured error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Suggested remediation, when the API provides one.
    pub suggestion: Option<String>,
}

// ============================================================================
// Regions and instance types
// ============================================================================

/// A datacenter region.
#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    /// Region name (e.g., `us-east-1`).
    pub name: String,
    /// Human-readable location.
    pub description: String,
}

impl PartialEq for Region {
    /// Regions are identified by name; descriptions are display-only.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Region {}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Hardware specs for an instance type.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceTypeSpecs {
    /// Number of GPUs.
    pub gpus: u32,
    /// Number of virtual CPUs.
    pub vcpus: u32,
    /// RAM in GiB.
    pub memory_gib: u32,
    /// Storage in GiB.
    pub storage_gib: u32,
}

/// An instance type (hardware configuration).
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceType {
    /// Type name (e.g., `gpu_1x_h100_pcie`).
    pub name: String,
    /// Full description.
    pub description: String,
    /// GPU description (e.g., `H100 (80 GB PCIe)`).
    pub gpu_description: Option<String>,
    /// Hourly price in US cents.
    pub price_cents_per_hour: u64,
    /// Hardware specs.
    pub specs: Option<InstanceTypeSpecs>,
}

/// One catalog entry: an instance type plus the regions where it currently
/// has free capacity.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceTypeEntry {
    /// The instance type.
    pub instance_type: InstanceType,
    /// Regions with capacity right now. Order is the API's own.
    #[serde(default)]
    pub regions_with_capacity_available: Vec<Region>,
}

impl InstanceTypeEntry {
    /// Whether any region currently has capacity for this type.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.regions_with_capacity_available.is_empty()
    }
}

/// The `GET /instance-types` payload, keyed by type name.
///
/// A `BTreeMap` so listings render in a stable order; per-entry region lists
/// keep the API's order untouched.
pub type InstanceTypesData = BTreeMap<String, InstanceTypeEntry>;

// ============================================================================
// Instances
// ============================================================================

/// Instance lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Provisioning; not yet reachable.
    Booting,
    /// Running and reachable.
    Active,
    /// Flagged unhealthy by the platform.
    Unhealthy,
    /// Shutting down.
    Terminating,
    /// Gone.
    Terminated,
    /// Unrecognized status value.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Booting => write!(f, "booting"),
            Self::Active => write!(f, "active"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Terminating => write!(f, "terminating"),
            Self::Terminated => write!(f, "terminated"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A launched instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    /// Unique instance identifier.
    pub id: String,
    /// User-assigned name.
    #[serde(default)]
    pub name: Option<String>,
    /// Current status.
    pub status: InstanceStatus,
    /// Public IP, once assigned.
    #[serde(default)]
    pub ip: Option<String>,
    /// Private IP, once assigned.
    #[serde(default)]
    pub private_ip: Option<String>,
    /// Hostname, once assigned.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Jupyter URL, when the image ships one.
    #[serde(default)]
    pub jupyter_url: Option<String>,
    /// SSH keys installed on the instance.
    #[serde(default)]
    pub ssh_key_names: Vec<String>,
    /// Attached filesystems.
    #[serde(default)]
    pub file_system_names: Vec<String>,
    /// Region the instance runs in.
    pub region: Option<Region>,
    /// Hardware configuration.
    pub instance_type: Option<InstanceType>,
}

// ============================================================================
// Operations
// ============================================================================

/// Request body for `POST /instance-operations/launch`.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchRequest {
    /// Region to launch in.
    pub region_name: String,
    /// Instance type to launch.
    pub instance_type_name: String,
    /// SSH keys to install. The API rejects an empty list.
    pub ssh_key_names: Vec<String>,
    /// Filesystems to attach. Always sent, empty when unused.
    pub file_system_names: Vec<String>,
    /// Number of instances.
    pub quantity: u32,
    /// Name for the instance(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response payload for launch.
#[derive(Debug, Deserialize)]
pub struct LaunchData {
    /// IDs of the instances the platform actually started.
    pub instance_ids: Vec<String>,
}

/// Request body for `POST /instance-operations/terminate`.
#[derive(Debug, Clone, Serialize)]
pub struct TerminateRequest {
    /// Instances to terminate.
    pub instance_ids: Vec<String>,
}

/// Response payload for terminate.
#[derive(Debug, Deserialize)]
pub struct TerminateData {
    /// Instances the platform confirmed terminating. May be a subset of the
    /// request.
    pub terminated_instances: Vec<Instance>,
}

// ============================================================================
// SSH keys
// ============================================================================

/// A registered SSH key.
#[derive(Debug, Clone, Deserialize)]
pub struct SshKey {
    /// Key ID.
    pub id: String,
    /// Key name.
    pub name: String,
    /// Public key material.
    #[serde(default)]
    pub public_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_status_display() {
        assert_eq!(InstanceStatus::Booting.to_string(), "booting");
        assert_eq!(InstanceStatus::Active.to_string(), "active");
        assert_eq!(InstanceStatus::Terminating.to_string(), "terminating");
    }

    #[test]
    fn test_unknown_status_deserializes_to_unknown() {
        let status: InstanceStatus = serde_json::from_str("\"preempted\"").unwrap();
        assert_eq!(status, InstanceStatus::Unknown);
    }

    #[test]
    fn test_region_equality_ignores_description() {
        let a: Region =
            serde_json::from_str(r#"{"name": "us-east-1", "description": "Virginia, USA"}"#)
                .unwrap();
        let b: Region =
            serde_json::from_str(r#"{"name": "us-east-1", "description": "renamed"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_launch_request_includes_empty_filesystems_and_omits_name() {
        let req = LaunchRequest {
            region_name: "us-east-1".to_string(),
            instance_type_name: "gpu_1x_h100_pcie".to_string(),
            ssh_key_names: vec!["work".to_string()],
            file_system_names: Vec::new(),
            quantity: 1,
            name: None,
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["file_system_names"], serde_json::json!([]));
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_instance_tolerates_missing_optional_fields() {
        let instance: Instance = serde_json::from_str(
            r#"{"id": "inst-1", "status": "booting"}"#,
        )
        .unwrap();
        assert_eq!(instance.id, "inst-1");
        assert_eq!(instance.status, InstanceStatus::Booting);
        assert!(instance.ip.is_none());
        assert!(instance.ssh_key_names.is_empty());
    }
}
