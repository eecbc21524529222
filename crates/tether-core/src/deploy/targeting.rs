//! Subscription targeting policy for selective onboarding.

use crate::error::SetupError;
use crate::types::Target;

/// Policy for determining which subscriptions to onboard.
#[derive(Debug, Clone, Default)]
pub struct TargetingPolicy {
    /// Whitelist: only onboard these subscriptions (if Some)
    targets: Option<Vec<String>>,
    /// Blacklist: skip these subscriptions (if Some, and targets is None)
    ignore_targets: Option<Vec<String>>,
}

impl TargetingPolicy {
    pub fn new(targets: Option<Vec<String>>, ignore_targets: Option<Vec<String>>) -> Self {
        Self {
            targets,
            ignore_targets,
        }
    }

    /// Check if onboarding should proceed for the given subscription.
    pub fn should_deploy_to(&self, subscription_id: &str) -> bool {
        if let Some(ref whitelist) = self.targets {
            return whitelist
                .iter()
                .any(|t| t.eq_ignore_ascii_case(subscription_id));
        }
        if let Some(ref blacklist) = self.ignore_targets {
            return !blacklist
                .iter()
                .any(|t| t.eq_ignore_ascii_case(subscription_id));
        }
        true
    }

    /// Select targets from the candidate set, preserving candidate order.
    ///
    /// Whitelisted ids that are not among the candidates are an error.
    pub fn select(&self, candidates: &[Target]) -> Result<Vec<Target>, SetupError> {
        if let Some(ref whitelist) = self.targets {
            let missing: Vec<String> = whitelist
                .iter()
                .filter(|id| !candidates.iter().any(|c| c.id.eq_ignore_ascii_case(id)))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(SetupError::UnknownTargets { ids: missing });
            }
        }

        let selected: Vec<Target> = candidates
            .iter()
            .filter(|c| self.should_deploy_to(&c.id))
            .cloned()
            .collect();
        if selected.is_empty() {
            return Err(SetupError::NoTargetsSelected);
        }
        Ok(selected)
    }
}
