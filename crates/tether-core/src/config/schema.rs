//! Configuration schema for tether.toml

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cloud::az::DEFAULT_AZ_PROGRAM;
use crate::deploy::DEFAULT_DEPLOYMENT_PREFIX;
use crate::orchestration::{DEFAULT_REGION, RunOptions};
use crate::poll::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, PollPolicy};
use crate::registration::DEFAULT_PROVIDER_NAMESPACE;
use crate::template::DEFAULT_TENANT_PARAMETER;

/// Root configuration structure for tether.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Deployment region
    #[serde(default = "default_region")]
    pub region: String,

    /// Resource provider that must be registered before deploying
    #[serde(default = "default_provider_namespace")]
    pub provider_namespace: String,

    /// Prefix of generated deployment names
    #[serde(default = "default_deployment_prefix")]
    pub deployment_prefix: String,

    /// Directory for result exports (current directory if unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub template: TemplateSettings,

    #[serde(default)]
    pub registration: RegistrationSettings,

    #[serde(default)]
    pub az: AzSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSettings {
    /// Template path or http(s) URL
    #[serde(default)]
    pub source: Option<String>,

    /// ARM parameters file
    #[serde(default)]
    pub parameters: Option<PathBuf>,

    /// Template parameter receiving the managing tenant id in simulation
    #[serde(default = "default_tenant_parameter")]
    pub tenant_parameter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AzSettings {
    /// Azure CLI executable
    #[serde(default = "default_az_program")]
    pub program: PathBuf,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_provider_namespace() -> String {
    DEFAULT_PROVIDER_NAMESPACE.to_string()
}

fn default_deployment_prefix() -> String {
    DEFAULT_DEPLOYMENT_PREFIX.to_string()
}

fn default_tenant_parameter() -> String {
    DEFAULT_TENANT_PARAMETER.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_POLL_TIMEOUT.as_secs()
}

fn default_az_program() -> PathBuf {
    PathBuf::from(DEFAULT_AZ_PROGRAM)
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            provider_namespace: default_provider_namespace(),
            deployment_prefix: default_deployment_prefix(),
            output_dir: None,
            template: TemplateSettings::default(),
            registration: RegistrationSettings::default(),
            az: AzSettings::default(),
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            source: None,
            parameters: None,
            tenant_parameter: default_tenant_parameter(),
        }
    }
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AzSettings {
    fn default() -> Self {
        Self {
            program: default_az_program(),
        }
    }
}

impl TetherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll policy for provider registration waits.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_secs(self.registration.poll_interval_secs),
            Duration::from_secs(self.registration.timeout_secs),
        )
    }

    /// Run options seeded from this configuration.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            region: self.region.clone(),
            provider_namespace: self.provider_namespace.clone(),
            deployment_prefix: self.deployment_prefix.clone(),
            ..RunOptions::default()
        }
    }
}
