//! Resource provider registration with a bounded wait.

use tracing::{debug, info, warn};

use crate::cloud::ProviderRegistry;
use crate::context::ExecutionContext;
use crate::poll::{Clock, PollOutcome, PollPolicy, deadline_after, poll_until_deadline};
use crate::types::ProviderRegistrationState;

/// Provider that must be registered before a delegation can be deployed.
pub const DEFAULT_PROVIDER_NAMESPACE: &str = "Microsoft.ManagedServices";

/// Ensures a resource provider is registered in the active subscription.
///
/// State is always re-read; nothing is cached across subscriptions.
pub struct ProviderRegistrationPoller<'a> {
    registry: &'a dyn ProviderRegistry,
    clock: &'a dyn Clock,
    policy: PollPolicy,
}

impl<'a> ProviderRegistrationPoller<'a> {
    pub fn new(registry: &'a dyn ProviderRegistry, clock: &'a dyn Clock) -> Self {
        Self {
            registry,
            clock,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns `true` once `namespace` is registered, `false` on timeout.
    pub fn ensure_registered(
        &self,
        ctx: &ExecutionContext,
        namespace: &str,
        simulate: bool,
    ) -> anyhow::Result<bool> {
        let state = self.ensure(ctx, namespace, simulate)?;
        Ok(state == ProviderRegistrationState::Registered)
    }

    /// Like [`Self::ensure_registered`], returning the final state.
    ///
    /// In simulation an unregistered provider is reported as `Registered`
    /// without any registration call. The wait is bounded by the policy
    /// timeout measured from this call, so a slow `register` eats into it.
    pub fn ensure(
        &self,
        ctx: &ExecutionContext,
        namespace: &str,
        simulate: bool,
    ) -> anyhow::Result<ProviderRegistrationState> {
        let deadline = deadline_after(self.clock, self.policy.timeout)?;
        let current = self.registry.registration_state(ctx, namespace)?;
        debug!(
            subscription = ctx.subscription_id(),
            namespace,
            state = ?current,
            "provider registration state"
        );
        if current == ProviderRegistrationState::Registered {
            return Ok(ProviderRegistrationState::Registered);
        }
        if simulate {
            info!(
                subscription = ctx.subscription_id(),
                namespace, "simulation: skipping provider registration"
            );
            return Ok(ProviderRegistrationState::Registered);
        }

        info!(
            subscription = ctx.subscription_id(),
            namespace, "registering resource provider"
        );
        self.registry.register(ctx, namespace)?;

        let outcome = poll_until_deadline(self.clock, deadline, &self.policy, |attempt| {
            let state = self.registry.registration_state(ctx, namespace)?;
            debug!(
                subscription = ctx.subscription_id(),
                namespace,
                attempt,
                state = ?state,
                "polled provider registration"
            );
            Ok((state == ProviderRegistrationState::Registered).then_some(state))
        })?;

        match outcome {
            PollOutcome::Ready(state) => Ok(state),
            PollOutcome::TimedOut { attempts } => {
                warn!(
                    subscription = ctx.subscription_id(),
                    namespace, attempts, "provider registration timed out"
                );
                Ok(ProviderRegistrationState::TimedOut)
            }
        }
    }
}
