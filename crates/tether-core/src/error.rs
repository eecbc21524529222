//! Error types for run-level failures.
//!
//! Per-target failures never surface here: they are captured as
//! [`crate::report::ResultRecord`]s. Only errors that stop a run before any
//! target is entered are typed.

use std::path::PathBuf;

use thiserror::Error;

/// A failure that aborts the whole run before any target is processed.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The deployment template could not be loaded or parsed
    #[error("deployment template unavailable from {location}: {message}")]
    TemplateUnavailable { location: String, message: String },

    /// The parameter file could not be loaded or parsed
    #[error("parameter file unavailable at {path}: {message}")]
    ParametersUnavailable { path: PathBuf, message: String },

    /// Simulation needs the managing tenant id and none could be resolved
    #[error("managing tenant id could not be resolved: {message}")]
    TenantUnresolved { message: String },

    /// Subscription listing returned nothing
    #[error("no subscriptions are available under the current credentials")]
    NoTargetsAvailable,

    /// Selection produced an empty set
    #[error("no subscriptions were selected")]
    NoTargetsSelected,

    /// The caller asked for subscriptions that are not accessible
    #[error("subscriptions not accessible under the current credentials: {}", ids.join(", "))]
    UnknownTargets { ids: Vec<String> },
}

/// The run finished but its results could not be exported.
#[derive(Error, Debug)]
#[error("failed to export results to {path}: {message}")]
pub struct ExportError {
    pub path: PathBuf,
    pub message: String,
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
