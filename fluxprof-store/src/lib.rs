#![warn(missing_docs)]
//! FluxProf Store - Profile Persistence
//!
//! Turns raw profiles into stored artifacts:
//! - Finalization attaches the job/revision header a profile needs to be
//!   traceable (and extractable back into a `Job`)
//! - Names are derived deterministically from profile content
//! - Profiles land in the pending-jobs directory, optionally registered
//!   straight into the permanent per-origin index

mod header;
mod pending;

pub use header::{extract_job_from_profile, finalize_profile, profile_name};
pub use pending::PendingStore;

use thiserror::Error;

/// Storage-layer failure.
///
/// I/O failures here are not contained by the execution core; they
/// propagate and abort the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Profile could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored profile is missing the header this store writes
    #[error("malformed profile: {0}")]
    MalformedProfile(String),
}
