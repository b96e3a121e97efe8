//! Lambda Cloud API client and GPU capacity acquisition engine.
//!
//! GPU instance types on Lambda Cloud are scarce: a type is often sold out
//! in every region, with capacity appearing and vanishing within minutes.
//! This crate wraps the Lambda Cloud v1 API and adds an acquisition loop
//! that keeps probing the catalog until a region opens up, then launches
//! there.
//!
//! ## Acquisition cycle
//!
//! ```text
//!            ┌──────────────────┐
//!   start ──▶│ fetch fresh      │ fetch error = hard stop
//!       ▲    │ catalog snapshot │
//!       │    └────────┬─────────┘
//!       │    type missing ──────────▶ TypeNotFound
//!       │             │
//!       │    capacity ── none ──▶ budget spent? ──▶ Exhausted
//!       │             │                 │
//!       │             ▼                 ▼
//!       │    ┌──────────────────┐   wait interval
//!       │    │ launch in region │       │
//!       │    └────────┬─────────┘       │
//!       │      launch error ────────────┤
//!       │             │                 │
//!       │             ▼                 │
//!       │          Launched             │
//!       └───────────────────────────────┘
//! ```
//!
//! Cancellation (Ctrl-C in the CLI) is observed at every checkpoint and
//! during waits, producing the `Cancelled` outcome.
//!
//! ## Example
//!
//! ```ignore
//! use lambda::{acquire, AcquireRequest, CancelToken, LambdaClient};
//!
//! let client = LambdaClient::new(api_key)?;
//! let cancel = CancelToken::new();
//!
//! let mut request = AcquireRequest::new("gpu_1x_h100_pcie", vec!["work".to_string()]);
//! request.max_attempts = Some(120);
//!
//! match acquire(&client, &request, &cancel).await? {
//!     lambda::AcquireOutcome::Launched { instance_ids, .. } => println!("{instance_ids:?}"),
//!     other => eprintln!("{other:?}"),
//! }
//! ```

pub mod acquire;
pub mod api;
pub mod cancel;
pub mod catalog;
pub mod error;

pub use acquire::{acquire, AcquireOutcome, AcquireRequest, DEFAULT_RETRY_INTERVAL};
pub use api::models::{
    Instance, InstanceStatus, InstanceType, InstanceTypeEntry, LaunchRequest, Region, SshKey,
};
pub use api::{InstanceApi, LambdaClient};
pub use cancel::CancelToken;
pub use catalog::{Catalog, ResolveError};
pub use error::ApiError;
