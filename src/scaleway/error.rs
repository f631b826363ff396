//! Error types for the Scaleway backend.

use crate::backend::BackendError;
use crate::config::ConfigError;
use scaleway_rs::ScalewayError;
use thiserror::Error;

/// Errors raised by the Scaleway backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScalewayBackendError {
    /// Raised when the high-level configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a request is missing a required field.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Raised when the requested image label cannot be resolved.
    #[error("image '{label}' (arch {arch}) not found in zone {zone}")]
    ImageNotFound {
        /// Image label passed by the caller.
        label: String,
        /// Architecture requested by the caller.
        arch: String,
        /// Zone used for the lookup.
        zone: String,
    },
    /// Raised when the server type is not available in the selected zone.
    #[error("instance type '{instance_type}' not available in zone {zone}")]
    InstanceTypeUnavailable {
        /// Requested commercial type.
        instance_type: String,
        /// Target zone.
        zone: String,
    },
    /// Raised when a network range cannot be expressed as a subnet.
    #[error("network {network}: invalid address range {netmask} starting at {start_ip}")]
    InvalidRange {
        /// Network name.
        network: String,
        /// Declared netmask.
        netmask: String,
        /// Declared first address.
        start_ip: String,
    },
    /// Raised when an asynchronous operation exceeds the timeout.
    #[error("timeout waiting for {action} on instance {instance_id}")]
    Timeout {
        /// Action being waited on.
        action: String,
        /// Provider instance identifier.
        instance_id: String,
    },
    /// Raised when teardown leaves a server visible in the API.
    #[error("instance {instance_id} still present after teardown")]
    ResidualResource {
        /// Provider instance identifier.
        instance_id: String,
    },
    /// Raised when the instance state does not allow a power action.
    #[error("instance {instance_id} in state {state} does not allow {action}")]
    ActionNotAllowed {
        /// Provider instance identifier.
        instance_id: String,
        /// Current state reported by the provider.
        state: String,
        /// Requested action.
        action: String,
    },
    /// Raised when the instance vanished before an action could run.
    #[error("instance {instance_id} not found in zone {zone}")]
    InstanceNotFound {
        /// Provider instance identifier.
        instance_id: String,
        /// Zone where lookup was attempted.
        zone: String,
    },
    /// Raised when a private network cannot be created.
    #[error("failed to create private network {name} in region {region}: {message}")]
    NetworkCreateFailed {
        /// Network name requested.
        name: String,
        /// Region where creation was attempted.
        region: String,
        /// Error message from the provider.
        message: String,
    },
    /// Raised when an instance cannot be attached to a private network.
    #[error("failed to attach instance {instance_id} to network {network_id}: {message}")]
    AttachFailed {
        /// Network identifier.
        network_id: String,
        /// Instance identifier.
        instance_id: String,
        /// Error message from the provider.
        message: String,
    },
    /// Wrapper for provider level failures.
    #[error("provider error: {message}")]
    Provider {
        /// Message returned by the provider SDK or API.
        message: String,
    },
}

impl From<ScalewayError> for ScalewayBackendError {
    fn from(value: ScalewayError) -> Self {
        Self::Provider {
            message: value.to_string(),
        }
    }
}

impl From<BackendError> for ScalewayBackendError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Validation(field) => Self::Validation(field),
        }
    }
}

impl From<ConfigError> for ScalewayBackendError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
