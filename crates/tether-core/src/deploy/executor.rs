//! Submit one deployment and normalize its outcome.

use tracing::{debug, warn};

use crate::cloud::{DeploymentSubmitter, SubmissionMode};
use crate::context::ExecutionContext;
use crate::deploy::DeploymentRequest;
use crate::types::{Outcome, Target};

/// Provisioning state recorded for every simulated deployment.
pub const WHAT_IF_STATE: &str = "WhatIf";

/// Message recorded for every simulated deployment.
pub const WHAT_IF_MESSAGE: &str = "No changes applied (WhatIf).";

/// Normalized result of one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub outcome: Outcome,
    pub provisioning_state: Option<String>,
    pub message: String,
}

impl DeploymentOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            provisioning_state: None,
            message: message.into(),
        }
    }

    fn simulated() -> Self {
        Self {
            outcome: Outcome::Simulated,
            provisioning_state: Some(WHAT_IF_STATE.to_string()),
            message: WHAT_IF_MESSAGE.to_string(),
        }
    }
}

/// Submits deployments through a [`DeploymentSubmitter`].
///
/// Submission errors never escape: they become a `Failed` outcome carrying the
/// error text.
pub struct DeploymentExecutor<'a> {
    submitter: &'a dyn DeploymentSubmitter,
}

impl<'a> DeploymentExecutor<'a> {
    pub fn new(submitter: &'a dyn DeploymentSubmitter) -> Self {
        Self { submitter }
    }

    /// Deploy `request` to `target`, whose context must already be active.
    pub fn deploy(
        &self,
        ctx: &ExecutionContext,
        target: &Target,
        request: &DeploymentRequest,
        simulate: bool,
    ) -> DeploymentOutcome {
        let mode = if simulate {
            SubmissionMode::WhatIf
        } else {
            SubmissionMode::Apply
        };
        debug!(subscription = %target.id, deployment = %request.name, ?mode, "submitting deployment");

        let submitted = match self.submitter.submit(ctx, request, mode) {
            Ok(submitted) => submitted,
            Err(err) => {
                warn!(subscription = %target.id, error = %err, "deployment submission failed");
                return DeploymentOutcome::failed(format!("{:#}", err));
            }
        };

        if simulate {
            return DeploymentOutcome::simulated();
        }

        let state = submitted.provisioning_state;
        match Outcome::classify(&state) {
            Outcome::Succeeded => DeploymentOutcome {
                outcome: Outcome::Succeeded,
                provisioning_state: Some(state),
                message: "Deployment succeeded.".to_string(),
            },
            Outcome::Failed => DeploymentOutcome {
                message: format!("Deployment finished with provisioning state '{}'.", state),
                outcome: Outcome::Failed,
                provisioning_state: Some(state),
            },
            // A synchronous submission that has not reached a terminal state is a failure.
            Outcome::Unknown | Outcome::Simulated => DeploymentOutcome {
                message: if state.is_empty() {
                    "Deployment reported no provisioning state.".to_string()
                } else {
                    format!("Deployment ended in non-terminal state '{}'.", state)
                },
                outcome: Outcome::Failed,
                provisioning_state: (!state.is_empty()).then_some(state),
            },
        }
    }
}
