//! Collaborator seams for the cloud platform.
//!
//! The run controller only talks to the platform through these traits. The
//! [`az::AzCli`] adapter implements all of them on top of the Azure CLI; tests
//! supply in-memory fakes.

pub mod az;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::deploy::DeploymentRequest;
use crate::types::{ProviderRegistrationState, Target};

pub use az::AzCli;

/// Lists the subscriptions accessible under the current credentials.
pub trait SubscriptionDirectory {
    fn list_subscriptions(&self) -> anyhow::Result<Vec<Target>>;
}

/// Activates a subscription as the context for subsequent calls.
///
/// Fails when the subscription is not accessible.
pub trait ContextSelector {
    fn select(&self, target: &Target) -> anyhow::Result<ExecutionContext>;
}

/// Reads and triggers resource provider registration.
pub trait ProviderRegistry {
    fn registration_state(
        &self,
        ctx: &ExecutionContext,
        namespace: &str,
    ) -> anyhow::Result<ProviderRegistrationState>;

    /// Fire-and-forget trigger; convergence is observed through `registration_state`.
    fn register(&self, ctx: &ExecutionContext, namespace: &str) -> anyhow::Result<()>;
}

/// Whether a submission may change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    Apply,
    /// Non-mutating preview.
    WhatIf,
}

/// What the platform reported for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub provisioning_state: String,
    pub raw: Value,
}

/// Submits subscription-scope deployments.
pub trait DeploymentSubmitter {
    fn submit(
        &self,
        ctx: &ExecutionContext,
        request: &DeploymentRequest,
        mode: SubmissionMode,
    ) -> anyhow::Result<SubmissionResult>;
}

/// Discovers the tenant id of the signed-in (managing) account.
pub trait TenantResolver {
    fn tenant_id(&self) -> anyhow::Result<Option<String>>;
}

/// Everything a full onboarding run needs from the platform.
pub trait CloudSession:
    SubscriptionDirectory + ContextSelector + ProviderRegistry + DeploymentSubmitter + TenantResolver
{
}

impl<T> CloudSession for T where
    T: SubscriptionDirectory
        + ContextSelector
        + ProviderRegistry
        + DeploymentSubmitter
        + TenantResolver
{
}
