//! Sequential onboarding run across selected subscriptions.
//!
//! Targets are processed one at a time: each is activated, its provider
//! registration is ensured, then the deployment is submitted. Every target that
//! is entered yields exactly one [`ResultRecord`]; a failure under
//! `continue_on_error = false` stops the run before the next target.

use tracing::{debug, info, info_span, warn};

use crate::cloud::{ContextSelector, DeploymentSubmitter, ProviderRegistry};
use crate::context::ExecutionContext;
use crate::deploy::{
    DEFAULT_DEPLOYMENT_PREFIX, DeploymentExecutor, DeploymentOutcome, DeploymentRequest,
    deployment_name,
};
use crate::poll::{Clock, PollPolicy};
use crate::registration::{DEFAULT_PROVIDER_NAMESPACE, ProviderRegistrationPoller};
use crate::report::{RecordFields, ResultRecord, RunSummary, record, summarize};
use crate::template::PreparedTemplate;
use crate::types::{Outcome, Target};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "eastus";

/// Message recorded when the provider never reached `Registered`.
pub const REGISTRATION_FAILED_MESSAGE: &str = "Provider registration failed or timed out.";

/// Per-run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub region: String,
    pub continue_on_error: bool,
    pub simulate: bool,
    pub provider_namespace: String,
    pub deployment_prefix: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            continue_on_error: false,
            simulate: false,
            provider_namespace: DEFAULT_PROVIDER_NAMESPACE.to_string(),
            deployment_prefix: DEFAULT_DEPLOYMENT_PREFIX.to_string(),
        }
    }
}

/// Lifecycle of one target within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Registering,
    Deploying,
    Resolved(Outcome),
}

impl TargetState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: TargetState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Registering) => true,
            // Context activation failures resolve before registration starts.
            (Self::Pending, Self::Resolved(Outcome::Failed)) => true,
            (Self::Registering, Self::Deploying) => true,
            (Self::Registering, Self::Resolved(Outcome::Failed)) => true,
            (Self::Deploying, Self::Resolved(outcome)) => outcome != Outcome::Unknown,
            _ => false,
        }
    }
}

/// Receives live progress while a run is in flight.
pub trait RunObserver {
    fn target_started(&self, _index: usize, _total: usize, _target: &Target) {}

    fn target_finished(&self, _target: &Target, _record: &ResultRecord) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Drives the per-target state machine and applies the failure policy.
pub struct RunController<'a> {
    selector: &'a dyn ContextSelector,
    registry: &'a dyn ProviderRegistry,
    submitter: &'a dyn DeploymentSubmitter,
    clock: &'a dyn Clock,
    observer: &'a dyn RunObserver,
    poll_policy: PollPolicy,
}

impl<'a> RunController<'a> {
    pub fn new(
        selector: &'a dyn ContextSelector,
        registry: &'a dyn ProviderRegistry,
        submitter: &'a dyn DeploymentSubmitter,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            selector,
            registry,
            submitter,
            clock,
            observer: &NoopObserver,
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Process `targets` in order and summarize every target that was entered.
    pub fn run(
        &self,
        targets: &[Target],
        template: &PreparedTemplate,
        options: &RunOptions,
    ) -> RunSummary {
        info!(
            targets = targets.len(),
            region = %options.region,
            simulate = options.simulate,
            continue_on_error = options.continue_on_error,
            "starting onboarding run"
        );

        let mut records = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            self.observer.target_started(index, targets.len(), target);

            let record = {
                let span = info_span!("target", subscription = %target.id);
                let _enter = span.enter();
                self.process_target(target, template, options)
            };
            self.observer.target_finished(target, &record);

            let failed = record.outcome == Outcome::Failed;
            records.push(record);

            if failed && !options.continue_on_error {
                let skipped = targets.len() - index - 1;
                warn!(
                    subscription = %target.id,
                    skipped, "stopping run after failure"
                );
                break;
            }
        }

        let summary = summarize(records);
        info!(
            status = %summary.status,
            processed = summary.len(),
            "onboarding run finished"
        );
        summary
    }

    fn process_target(
        &self,
        target: &Target,
        template: &PreparedTemplate,
        options: &RunOptions,
    ) -> ResultRecord {
        let mut progress = TargetProgress::new(target);

        let ctx = match self.selector.select(target) {
            Ok(ctx) => ctx,
            Err(err) => {
                warn!(error = %format!("{:#}", err), "subscription could not be selected");
                return progress.resolve(
                    DeploymentOutcome::failed(format!("{:#}", err)),
                    None,
                    template,
                    self.clock,
                );
            }
        };

        debug!(name = ctx.subscription_name(), "subscription context active");

        progress.advance(TargetState::Registering);
        let poller = ProviderRegistrationPoller::new(self.registry, self.clock)
            .with_policy(self.poll_policy);
        match poller.ensure_registered(&ctx, &options.provider_namespace, options.simulate) {
            Ok(true) => {}
            Ok(false) => {
                return progress.resolve(
                    DeploymentOutcome::failed(REGISTRATION_FAILED_MESSAGE),
                    None,
                    template,
                    self.clock,
                );
            }
            Err(err) => {
                warn!(error = %format!("{:#}", err), "provider registration failed");
                return progress.resolve(
                    DeploymentOutcome::failed(format!(
                        "{} {:#}",
                        REGISTRATION_FAILED_MESSAGE, err
                    )),
                    None,
                    template,
                    self.clock,
                );
            }
        }

        progress.advance(TargetState::Deploying);
        let request = self.build_request(target, template, options);
        let outcome = self.deploy(&ctx, target, &request, options.simulate);
        progress.resolve(outcome, Some(request.name), template, self.clock)
    }

    fn build_request(
        &self,
        target: &Target,
        template: &PreparedTemplate,
        options: &RunOptions,
    ) -> DeploymentRequest {
        let name = deployment_name(&options.deployment_prefix, &target.id, self.clock.now());
        DeploymentRequest::new(name, options.region.clone(), template.payload.clone())
            .with_parameters(template.parameters.clone())
    }

    fn deploy(
        &self,
        ctx: &ExecutionContext,
        target: &Target,
        request: &DeploymentRequest,
        simulate: bool,
    ) -> DeploymentOutcome {
        DeploymentExecutor::new(self.submitter).deploy(ctx, target, request, simulate)
    }
}

/// Tracks one target through its states and enforces legal transitions.
struct TargetProgress<'t> {
    target: &'t Target,
    state: TargetState,
}

impl<'t> TargetProgress<'t> {
    fn new(target: &'t Target) -> Self {
        Self {
            target,
            state: TargetState::Pending,
        }
    }

    fn advance(&mut self, next: TargetState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "target transition");
        self.state = next;
    }

    fn resolve(
        mut self,
        outcome: DeploymentOutcome,
        deployment_name: Option<String>,
        template: &PreparedTemplate,
        clock: &dyn Clock,
    ) -> ResultRecord {
        self.advance(TargetState::Resolved(outcome.outcome));
        match outcome.outcome {
            Outcome::Failed => warn!(message = %outcome.message, "target failed"),
            other => info!(outcome = %other, "target finished"),
        }

        record(
            self.target,
            outcome,
            RecordFields {
                timestamp: Some(clock.now()),
                deployment_name,
                capability_owner_id: template.capability_owner_id.clone(),
            },
        )
    }
}
