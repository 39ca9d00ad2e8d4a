//! Error types.
//!
//! - [`DeviceError`] is what backends return from enumeration and device I/O.
//! - [`AdapterError`] classifies failures the adapter observed. None of these ever leave
//!   `initialize`/`poll`/`dispatch_events`; they are logged and kept for diagnostics.
//! - [`ConfigError`] covers loading and validating [`AdapterConfig`](crate::config::AdapterConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`DeviceBackend`](crate::device::DeviceBackend) or
/// [`InputDevice`](crate::device::InputDevice).
///
/// The adapter only distinguishes success from failure; the variants exist for logs.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    #[error("failed to create device {instance_id}: {reason}")]
    Create { instance_id: String, reason: String },

    #[error("failed to set data format: {0}")]
    DataFormat(String),

    #[error("failed to set cooperative level: {0}")]
    CooperativeLevel(String),

    #[error("failed to acquire device: {0}")]
    Acquire(String),

    #[error("device is not acquired")]
    NotAcquired,

    #[error("device input lost")]
    InputLost,

    #[error("device poll failed: {0}")]
    Poll(String),

    #[error("failed to read device state: {0}")]
    ReadState(String),

    #[error("malformed input report: {0}")]
    Report(String),
}

/// Adapter-level failure taxonomy.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The enumeration call itself failed. The adapter ends `NotReady`.
    #[error("device enumeration failed: {0}")]
    EnumerationFailure(#[source] DeviceError),

    /// One open/configure/acquire step failed for a candidate. The candidate is abandoned.
    #[error("could not open candidate {name:?}: {source}")]
    CandidateOpenFailure { name: String, source: DeviceError },

    /// The read failed twice (initial attempt plus one re-acquire and retry).
    #[error("device read failed after re-acquire: {0}")]
    PollFailure(#[source] DeviceError),

    /// Discovery finished without an acquired device. Terminal for the run.
    #[error("no compatible input device found")]
    NoDeviceFound,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
