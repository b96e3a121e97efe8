//! Instance-type catalog snapshots and region resolution.

use thiserror::Error;

use crate::api::models::{InstanceTypeEntry, InstanceTypesData, Region};

/// Why a launch region could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The catalog has no such instance type.
    #[error("Unknown instance type: {0}")]
    TypeNotFound(String),

    /// The type exists but no region currently has capacity.
    #[error("No capacity available for instance type: {0}")]
    NoCapacity(String),
}

/// An immutable snapshot of the instance-type catalog.
///
/// Each poll cycle fetches a fresh snapshot; a snapshot is never patched in
/// place. Entries iterate in name order, while each entry's region list keeps
/// the order the API returned.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: InstanceTypesData,
}

impl Catalog {
    /// Wrap a fetched instance-types payload.
    #[must_use]
    pub fn new(entries: InstanceTypesData) -> Self {
        Self { entries }
    }

    /// Look up a catalog entry by type name.
    #[must_use]
    pub fn get(&self, instance_type: &str) -> Option<&InstanceTypeEntry> {
        self.entries.get(instance_type)
    }

    /// Regions with free capacity for the type, in the API's order.
    /// `None` when the type is not in the catalog at all.
    #[must_use]
    pub fn regions_with_capacity(&self, instance_type: &str) -> Option<&[Region]> {
        self.entries
            .get(instance_type)
            .map(|entry| entry.regions_with_capacity_available.as_slice())
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstanceTypeEntry)> {
        self.entries.iter()
    }

    /// Resolve the region to launch `instance_type` in.
    ///
    /// The preferred region wins when it currently has capacity. Otherwise
    /// the first region the API listed is used; no re-ranking.
    ///
    /// # Errors
    /// [`ResolveError::TypeNotFound`] when the type is not in the catalog,
    /// [`ResolveError::NoCapacity`] when no region has capacity for it.
    pub fn resolve_region(
        &self,
        instance_type: &str,
        preferred: Option<&str>,
    ) -> Result<Region, ResolveError> {
        let entry = self
            .entries
            .get(instance_type)
            .ok_or_else(|| ResolveError::TypeNotFound(instance_type.to_string()))?;

        let regions = &entry.regions_with_capacity_available;
        if regions.is_empty() {
            return Err(ResolveError::NoCapacity(instance_type.to_string()));
        }

        if let Some(name) = preferred {
            if let Some(region) = regions.iter().find(|r| r.name == name) {
                return Ok(region.clone());
            }
        }

        Ok(regions[0].clone())
    }
}
