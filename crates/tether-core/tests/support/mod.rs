//! In-memory collaborators for driving the core without a cloud.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use tether_core::cloud::{
    ContextSelector, DeploymentSubmitter, ProviderRegistry, SubmissionMode, SubmissionResult,
    SubscriptionDirectory, TenantResolver,
};
use tether_core::context::ExecutionContext;
use tether_core::deploy::DeploymentRequest;
use tether_core::poll::Clock;
use tether_core::template::{PreparedTemplate, Template, TemplateSource};
use tether_core::types::{ProviderRegistrationState, Target};

/// Clock that only moves when slept on.
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<u32>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(0),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }

    pub fn sleeps(&self) -> u32 {
        *self.sleeps.lock().unwrap()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.sleeps.lock().unwrap() += 1;
        self.advance(duration);
    }
}

/// Scripted platform with call recording.
#[derive(Default)]
pub struct FakeCloud {
    pub subscriptions: Vec<Target>,
    /// Subscriptions whose selection fails
    pub inaccessible: HashSet<String>,
    /// Initial provider state per subscription (Registered if absent)
    pub provider_states: HashMap<String, ProviderRegistrationState>,
    /// States returned by polls after `register`, per subscription; last one repeats
    pub poll_script: Mutex<HashMap<String, VecDeque<ProviderRegistrationState>>>,
    /// Subscriptions whose state read fails
    pub state_read_failures: HashSet<String>,
    /// Subscriptions whose submission returns an error
    pub submit_failures: HashSet<String>,
    /// Provisioning state per subscription (Succeeded if absent)
    pub provisioning_states: HashMap<String, String>,
    pub tenant: Option<String>,
    pub tenant_fails: bool,

    pub selected: Mutex<Vec<String>>,
    pub state_reads: Mutex<Vec<String>>,
    pub registrations: Mutex<Vec<String>>,
    pub submissions: Mutex<Vec<(String, SubmissionMode, DeploymentRequest)>>,
}

impl FakeCloud {
    pub fn with_subscriptions(ids: &[&str]) -> Self {
        Self {
            subscriptions: ids
                .iter()
                .map(|id| Target::new(*id, format!("Subscription {}", id)))
                .collect(),
            tenant: Some("managing-tenant".to_string()),
            ..Self::default()
        }
    }

    pub fn targets(&self) -> Vec<Target> {
        self.subscriptions.clone()
    }

    pub fn script_polls(&self, id: &str, states: &[ProviderRegistrationState]) {
        self.poll_script
            .lock()
            .unwrap()
            .insert(id.to_string(), states.iter().copied().collect());
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    pub fn state_read_count(&self) -> usize {
        self.state_reads.lock().unwrap().len()
    }

    pub fn submissions_in(&self, mode: SubmissionMode) -> usize {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m, _)| *m == mode)
            .count()
    }

    pub fn deployment_names(&self) -> Vec<String> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, request)| request.name.clone())
            .collect()
    }
}

impl SubscriptionDirectory for FakeCloud {
    fn list_subscriptions(&self) -> anyhow::Result<Vec<Target>> {
        Ok(self.subscriptions.clone())
    }
}

impl ContextSelector for FakeCloud {
    fn select(&self, target: &Target) -> anyhow::Result<ExecutionContext> {
        self.selected.lock().unwrap().push(target.id.clone());
        if self.inaccessible.contains(&target.id) {
            anyhow::bail!("subscription {} is not accessible", target.id);
        }
        Ok(ExecutionContext::for_target(target))
    }
}

impl ProviderRegistry for FakeCloud {
    fn registration_state(
        &self,
        ctx: &ExecutionContext,
        _namespace: &str,
    ) -> anyhow::Result<ProviderRegistrationState> {
        let id = ctx.subscription_id().to_string();
        self.state_reads.lock().unwrap().push(id.clone());
        if self.state_read_failures.contains(&id) {
            anyhow::bail!("state read refused for {}", id);
        }

        let registered = self.registrations.lock().unwrap().contains(&id);
        if registered {
            let mut scripts = self.poll_script.lock().unwrap();
            if let Some(script) = scripts.get_mut(&id) {
                let state = if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().copied()
                };
                return Ok(state.unwrap_or(ProviderRegistrationState::Registered));
            }
            return Ok(ProviderRegistrationState::Registered);
        }

        Ok(self
            .provider_states
            .get(&id)
            .copied()
            .unwrap_or(ProviderRegistrationState::Registered))
    }

    fn register(&self, ctx: &ExecutionContext, _namespace: &str) -> anyhow::Result<()> {
        self.registrations
            .lock()
            .unwrap()
            .push(ctx.subscription_id().to_string());
        Ok(())
    }
}

impl DeploymentSubmitter for FakeCloud {
    fn submit(
        &self,
        ctx: &ExecutionContext,
        request: &DeploymentRequest,
        mode: SubmissionMode,
    ) -> anyhow::Result<SubmissionResult> {
        let id = ctx.subscription_id().to_string();
        self.submissions
            .lock()
            .unwrap()
            .push((id.clone(), mode, request.clone()));
        if self.submit_failures.contains(&id) {
            anyhow::bail!("InvalidTemplate: deployment rejected for {}", id);
        }
        let provisioning_state = match mode {
            SubmissionMode::WhatIf => "Succeeded".to_string(),
            SubmissionMode::Apply => self
                .provisioning_states
                .get(&id)
                .cloned()
                .unwrap_or_else(|| "Succeeded".to_string()),
        };
        Ok(SubmissionResult {
            provisioning_state: provisioning_state.clone(),
            raw: json!({ "properties": { "provisioningState": provisioning_state } }),
        })
    }
}

impl TenantResolver for FakeCloud {
    fn tenant_id(&self) -> anyhow::Result<Option<String>> {
        if self.tenant_fails {
            anyhow::bail!("not signed in");
        }
        Ok(self.tenant.clone())
    }
}

/// Template source backed by a value.
pub struct StaticTemplate {
    pub template: Option<Template>,
}

impl StaticTemplate {
    pub fn new(payload: Value) -> Self {
        Self {
            template: Some(Template::new(payload)),
        }
    }

    pub fn missing() -> Self {
        Self { template: None }
    }
}

impl TemplateSource for StaticTemplate {
    fn location(&self) -> String {
        "memory://template".to_string()
    }

    fn load(&self) -> anyhow::Result<Template> {
        self.template
            .clone()
            .ok_or_else(|| anyhow::anyhow!("template not found"))
    }
}

pub fn delegation_template() -> Value {
    json!({
        "$schema": "https://schema.management.azure.com/schemas/2019-08-01/subscriptionDeploymentTemplate.json#",
        "contentVersion": "1.0.0.0",
        "parameters": {
            "managedByTenantId": { "type": "string", "defaultValue": "owner-tenant" }
        },
        "resources": []
    })
}

pub fn prepared_template() -> PreparedTemplate {
    PreparedTemplate::from_template(Template::new(delegation_template()), "managedByTenantId")
}
