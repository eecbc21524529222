//! Azure CLI adapter.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{
    ContextSelector, DeploymentSubmitter, ProviderRegistry, SubmissionMode, SubmissionResult,
    SubscriptionDirectory, TenantResolver,
};
use crate::context::ExecutionContext;
use crate::deploy::DeploymentRequest;
use crate::types::{ProviderRegistrationState, Target};

/// Default program name.
pub const DEFAULT_AZ_PROGRAM: &str = "az";

/// Drives the platform through the `az` command-line tool.
#[derive(Debug, Clone)]
pub struct AzCli {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    id: String,
    name: String,
    #[serde(default)]
    state: Option<String>,
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new(DEFAULT_AZ_PROGRAM)
    }
}

impl AzCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `az` with the given arguments and return its stdout.
    fn run<I, S>(&self, args: I) -> anyhow::Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args);
        debug!(command = ?command, "invoking az");

        let output = command
            .output()
            .with_context(|| format!("Failed to invoke {}", self.program.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_json<I, S>(&self, args: I) -> anyhow::Result<Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = self.run(args)?;
        if stdout.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&stdout).context("Failed to parse az JSON output")
    }
}

impl SubscriptionDirectory for AzCli {
    fn list_subscriptions(&self) -> anyhow::Result<Vec<Target>> {
        let value = self.run_json(["account", "list", "--all", "--output", "json"])?;
        let entries: Vec<AccountEntry> =
            serde_json::from_value(value).context("Unexpected az account list output")?;

        Ok(entries
            .into_iter()
            .filter(|entry| {
                entry
                    .state
                    .as_deref()
                    .map(|state| state.eq_ignore_ascii_case("enabled"))
                    .unwrap_or(true)
            })
            .map(|entry| Target::new(entry.id, entry.name))
            .collect())
    }
}

impl ContextSelector for AzCli {
    fn select(&self, target: &Target) -> anyhow::Result<ExecutionContext> {
        self.run(["account", "set", "--subscription", target.id.as_str()])
            .with_context(|| format!("Failed to select subscription {}", target.id))?;
        Ok(ExecutionContext::for_target(target))
    }
}

impl ProviderRegistry for AzCli {
    fn registration_state(
        &self,
        ctx: &ExecutionContext,
        namespace: &str,
    ) -> anyhow::Result<ProviderRegistrationState> {
        let stdout = self
            .run([
                "provider",
                "show",
                "--namespace",
                namespace,
                "--subscription",
                ctx.subscription_id(),
                "--query",
                "registrationState",
                "--output",
                "tsv",
            ])
            .with_context(|| format!("Failed to read registration state of {}", namespace))?;
        Ok(ProviderRegistrationState::from_platform(&stdout))
    }

    fn register(&self, ctx: &ExecutionContext, namespace: &str) -> anyhow::Result<()> {
        self.run([
            "provider",
            "register",
            "--namespace",
            namespace,
            "--subscription",
            ctx.subscription_id(),
        ])
        .with_context(|| format!("Failed to register {}", namespace))?;
        Ok(())
    }
}

impl DeploymentSubmitter for AzCli {
    fn submit(
        &self,
        ctx: &ExecutionContext,
        request: &DeploymentRequest,
        mode: SubmissionMode,
    ) -> anyhow::Result<SubmissionResult> {
        let template_file = write_json_temp(&request.template)?;
        let parameters_file = match &request.parameters {
            Some(parameters) => Some(write_json_temp(&parameter_document(parameters))?),
            None => None,
        };

        let verb = match mode {
            SubmissionMode::Apply => "create",
            SubmissionMode::WhatIf => "what-if",
        };
        let mut args: Vec<String> = vec![
            "deployment".into(),
            "sub".into(),
            verb.into(),
            "--name".into(),
            request.name.clone(),
            "--location".into(),
            request.location.clone(),
            "--subscription".into(),
            ctx.subscription_id().to_string(),
            "--template-file".into(),
            template_file.path().display().to_string(),
        ];
        if let Some(file) = &parameters_file {
            args.push("--parameters".into());
            args.push(format!("@{}", file.path().display()));
        }
        if mode == SubmissionMode::WhatIf {
            args.push("--no-pretty-print".into());
        }
        args.push("--output".into());
        args.push("json".into());

        let raw = self.run_json(&args)?;
        let provisioning_state = match mode {
            SubmissionMode::Apply => raw
                .pointer("/properties/provisioningState")
                .and_then(Value::as_str),
            SubmissionMode::WhatIf => raw.get("status").and_then(Value::as_str),
        }
        .unwrap_or_default()
        .to_string();

        Ok(SubmissionResult {
            provisioning_state,
            raw,
        })
    }
}

impl TenantResolver for AzCli {
    fn tenant_id(&self) -> anyhow::Result<Option<String>> {
        let stdout = self.run(["account", "show", "--query", "tenantId", "--output", "tsv"])?;
        let tenant = stdout.trim();
        Ok((!tenant.is_empty()).then(|| tenant.to_string()))
    }
}

/// Wrap a parameter bag in an ARM parameters document.
fn parameter_document(parameters: &Value) -> Value {
    serde_json::json!({
        "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentParameters.json#",
        "contentVersion": "1.0.0.0",
        "parameters": parameters,
    })
}

fn write_json_temp(value: &Value) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("tether-")
        .suffix(".json")
        .tempfile()
        .context("Failed to create temporary file")?;
    serde_json::to_writer(&mut file, value).context("Failed to write temporary JSON")?;
    file.flush().context("Failed to flush temporary JSON")?;
    Ok(file)
}
