//! Execution context for collaborator calls.

use crate::types::Target;

/// The subscription a collaborator call is scoped to.
///
/// Produced by [`crate::cloud::ContextSelector::select`] and passed explicitly
/// into every provider and deployment call, so nothing depends on a hidden
/// process-wide "current subscription".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    subscription_id: String,
    subscription_name: String,
}

impl ExecutionContext {
    pub fn new(subscription_id: impl Into<String>, subscription_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            subscription_name: subscription_name.into(),
        }
    }

    /// Context for a target whose selection needs no further lookup.
    pub fn for_target(target: &Target) -> Self {
        Self::new(target.id.clone(), target.name.clone())
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn subscription_name(&self) -> &str {
        &self.subscription_name
    }
}
