//! Shared core types used across the poller, executor and recorder.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One subscription the onboarding template is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Opaque subscription identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
}

impl Target {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Registration state of a resource provider within one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderRegistrationState {
    Unregistered,
    Registering,
    Registered,
    /// Polling gave up before the provider reached `Registered`.
    TimedOut,
}

impl ProviderRegistrationState {
    /// Parse the state string reported by the platform.
    ///
    /// Only `Registered` and `Registering` are meaningful to the poller; every
    /// other value (`NotRegistered`, `Unregistering`, ...) is treated as unregistered.
    pub fn from_platform(value: &str) -> Self {
        match value.trim() {
            s if s.eq_ignore_ascii_case("registered") => Self::Registered,
            s if s.eq_ignore_ascii_case("registering") => Self::Registering,
            _ => Self::Unregistered,
        }
    }
}

/// Classified result of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Simulated,
    Succeeded,
    Failed,
    Unknown,
}

impl Outcome {
    /// Classify a provisioning state string reported by a deployment submission.
    pub fn classify(provisioning_state: &str) -> Self {
        match provisioning_state.trim() {
            s if s.eq_ignore_ascii_case("succeeded") => Self::Succeeded,
            s if s.eq_ignore_ascii_case("failed") || s.eq_ignore_ascii_case("canceled") => {
                Self::Failed
            }
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulated => "Simulated",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    Success,
    Failed,
}

impl OverallStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}
