//! Deployment request construction.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Default prefix for generated deployment names.
pub const DEFAULT_DEPLOYMENT_PREFIX: &str = "lighthouse";

/// Number of subscription id characters embedded in a deployment name.
const TARGET_ID_PREFIX_LEN: usize = 8;

/// One subscription-scope deployment, built fresh per target.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    pub name: String,
    pub location: String,
    pub template: Value,
    pub parameters: Option<Value>,
}

impl DeploymentRequest {
    pub fn new(name: impl Into<String>, location: impl Into<String>, template: Value) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            template,
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Option<Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Build a deployment name that does not collide across reruns.
///
/// `{prefix}-{first 8 chars of target id}-{yyyyMMddHHmmss}`.
pub fn deployment_name(prefix: &str, target_id: &str, now: DateTime<Utc>) -> String {
    let id_prefix: String = target_id.chars().take(TARGET_ID_PREFIX_LEN).collect();
    format!("{}-{}-{}", prefix, id_prefix, now.format("%Y%m%d%H%M%S"))
}
