//! Capacity acquisition: poll the catalog until a region opens up, then
//! launch.
//!
//! GPU capacity on Lambda Cloud comes and goes by the minute. The loop here
//! probes a fresh catalog snapshot each cycle, launches the moment a region
//! shows capacity, and otherwise waits out a fixed interval, up to an
//! optional attempt budget. Cancellation is checked before every probe,
//! between probe and launch, and continuously during the wait.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::models::{LaunchRequest, Region};
use crate::api::InstanceApi;
use crate::cancel::CancelToken;
use crate::catalog::{Catalog, ResolveError};
use crate::error::ApiError;

/// Default delay between attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// What to acquire and how persistently to try.
#[derive(Debug, Clone)]
pub struct AcquireRequest {
    /// Instance type to launch.
    pub instance_type: String,
    /// Number of instances.
    pub quantity: u32,
    /// SSH keys to install. Must not be empty.
    pub ssh_key_names: Vec<String>,
    /// Filesystems to attach.
    pub file_system_names: Vec<String>,
    /// Name for the launched instance(s).
    pub name: Option<String>,
    /// Region to prefer when several have capacity.
    pub preferred_region: Option<String>,
    /// Delay between attempts. Zero means probe back-to-back.
    pub retry_interval: Duration,
    /// Attempt budget. `None` keeps polling until capacity appears or the
    /// run is cancelled.
    pub max_attempts: Option<u32>,
}

impl AcquireRequest {
    /// Request one instance of `instance_type` with default polling knobs.
    #[must_use]
    pub fn new(instance_type: impl Into<String>, ssh_key_names: Vec<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            quantity: 1,
            ssh_key_names,
            file_system_names: Vec::new(),
            name: None,
            preferred_region: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: None,
        }
    }

    /// Launch body for one attempt against `region`.
    fn launch_request(&self, region: &Region) -> LaunchRequest {
        LaunchRequest {
            region_name: region.name.clone(),
            instance_type_name: self.instance_type.clone(),
            ssh_key_names: self.ssh_key_names.clone(),
            file_system_names: self.file_system_names.clone(),
            quantity: self.quantity,
            name: self.name.clone(),
        }
    }
}

/// Terminal result of an acquisition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Capacity was found and the platform accepted the launch.
    Launched {
        /// Region launched in.
        region: Region,
        /// IDs the platform started. May be fewer than requested; the list
        /// is authoritative.
        instance_ids: Vec<String>,
        /// Attempts used, counting the successful one.
        attempts: u32,
        /// Wall-clock time from first probe to accepted launch.
        elapsed: Duration,
    },
    /// The instance type is not in the catalog. Polling longer cannot fix
    /// this, so it terminates the run on the spot.
    TypeNotFound {
        /// Attempts used.
        attempts: u32,
    },
    /// The attempt budget ran out without a successful launch.
    Exhausted {
        /// Attempts used.
        attempts: u32,
        /// Wall-clock time spent.
        elapsed: Duration,
        /// Message of the most recent launch rejection. `None` when every
        /// attempt ended with no capacity, so callers can tell a refused
        /// launch from a type that never had a free region.
        last_launch_error: Option<String>,
    },
    /// Cancellation was requested.
    Cancelled {
        /// Attempts completed before the cancellation was observed.
        attempts: u32,
    },
}

/// Run the acquisition loop until a terminal outcome.
///
/// Every cycle fetches a fresh catalog snapshot; a failed fetch is a hard
/// error, not an unavailability signal, and aborts the run. A failed launch
/// is retryable (capacity can evaporate between probe and launch) and
/// consumes the same attempt budget as a no-capacity probe.
///
/// # Errors
/// Returns the underlying [`ApiError`] when a catalog fetch fails, or
/// [`ApiError::Config`] when the request is malformed.
pub async fn acquire<A>(
    api: &A,
    req: &AcquireRequest,
    cancel: &CancelToken,
) -> Result<AcquireOutcome, ApiError>
where
    A: InstanceApi + ?Sized,
{
    if req.ssh_key_names.is_empty() {
        return Err(ApiError::Config(
            "at least one SSH key is required to launch".to_string(),
        ));
    }
    if req.quantity == 0 {
        return Err(ApiError::Config("quantity must be at least 1".to_string()));
    }

    let start = Instant::now();
    let mut attempt: u32 = 0;
    let mut last_launch_error: Option<String> = None;

    loop {
        if cancel.is_cancelled() {
            info!(attempts = attempt, "Acquisition cancelled");
            return Ok(AcquireOutcome::Cancelled { attempts: attempt });
        }

        attempt += 1;
        debug!(
            attempt,
            instance_type = %req.instance_type,
            elapsed_secs = start.elapsed().as_secs(),
            "Probing for capacity"
        );

        let catalog = Catalog::new(api.instance_types().await?);

        match catalog.resolve_region(&req.instance_type, req.preferred_region.as_deref()) {
            Ok(region) => {
                if cancel.is_cancelled() {
                    info!(attempts = attempt, "Acquisition cancelled");
                    return Ok(AcquireOutcome::Cancelled { attempts: attempt });
                }

                info!(attempt, region = %region.name, "Capacity available, launching");
                match api.launch(&req.launch_request(&region)).await {
                    Ok(instance_ids) => {
                        let elapsed = start.elapsed();
                        info!(
                            attempt,
                            count = instance_ids.len(),
                            elapsed_secs = elapsed.as_secs(),
                            "Launch accepted"
                        );
                        return Ok(AcquireOutcome::Launched {
                            region,
                            instance_ids,
                            attempts: attempt,
                            elapsed,
                        });
                    }
                    Err(err) => {
                        // Capacity can be gone again by the time the launch
                        // lands; treat this like a missed probe.
                        warn!(attempt, error = %err, "Launch failed, will retry");
                        last_launch_error = Some(err.to_string());
                    }
                }
            }
            Err(ResolveError::TypeNotFound(name)) => {
                warn!(attempt, instance_type = %name, "Instance type not in catalog");
                return Ok(AcquireOutcome::TypeNotFound { attempts: attempt });
            }
            Err(ResolveError::NoCapacity(_)) => {
                info!(
                    attempt,
                    elapsed_secs = start.elapsed().as_secs(),
                    "No capacity yet"
                );
            }
        }

        // Budget check sits after the attempt and before any sleep, so a
        // final failed attempt never pays for a wait it will not use.
        if let Some(max) = req.max_attempts {
            if attempt >= max {
                let elapsed = start.elapsed();
                info!(
                    attempts = attempt,
                    elapsed_secs = elapsed.as_secs(),
                    "Attempt budget exhausted"
                );
                return Ok(AcquireOutcome::Exhausted {
                    attempts: attempt,
                    elapsed,
                    last_launch_error,
                });
            }
        }

        debug!(
            wait_secs = req.retry_interval.as_secs(),
            "Waiting before next attempt"
        );
        if !cancel.wait(req.retry_interval).await {
            info!(attempts = attempt, "Acquisition cancelled");
            return Ok(AcquireOutcome::Cancelled { attempts: attempt });
        }
    }
}
