//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Scaleway specific configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SCW")]
pub struct ScalewayConfig {
    /// Access key assigned to the Scaleway application. Not needed for API
    /// calls; kept so one credentials file serves both `scw` and `achim`.
    pub access_key: Option<String>,
    /// Secret key used for authentication. This value is required.
    pub secret_key: String,
    /// Organisation identifier used by some Scaleway endpoints.
    pub default_organization_id: Option<String>,
    /// Project identifier owning every provisioned resource.
    pub default_project_id: String,
    /// Availability zone for instances. Defaults to `fr-par-1`.
    #[ortho_config(default = "fr-par-1".to_owned())]
    pub default_zone: String,
    /// CPU architecture used to select image variants.
    #[ortho_config(default = "x86_64".to_owned())]
    pub default_architecture: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

const CONFIG_SECTION: &str = "scaleway";

impl ScalewayConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [{CONFIG_SECTION}] in achim.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("achim")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the region hosting the configured zone (`fr-par-1` becomes
    /// `fr-par`). Regional APIs such as VPC and IPAM are addressed by region.
    #[must_use]
    pub fn region(&self) -> &str {
        let zone = self.default_zone.trim();
        match zone.rsplit_once('-') {
            Some((region, suffix))
                if !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit()) =>
            {
                region
            }
            _ => zone,
        }
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.secret_key,
            &FieldMetadata::new("Scaleway API secret key", "SCW_SECRET_KEY", "secret_key"),
        )?;
        Self::require_field(
            &self.default_project_id,
            &FieldMetadata::new(
                "Scaleway project ID",
                "SCW_DEFAULT_PROJECT_ID",
                "default_project_id",
            ),
        )?;
        Self::require_field(
            &self.default_zone,
            &FieldMetadata::new("availability zone", "SCW_DEFAULT_ZONE", "default_zone"),
        )?;
        Self::require_field(
            &self.default_architecture,
            &FieldMetadata::new(
                "CPU architecture",
                "SCW_DEFAULT_ARCHITECTURE",
                "default_architecture",
            ),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
