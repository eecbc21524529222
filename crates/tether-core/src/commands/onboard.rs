//! Onboard command implementation.
//!
//! Performs run-level setup (template loading, subscription listing, target
//! selection, template preparation), runs the controller across the selected
//! subscriptions and writes the result export.

use std::path::PathBuf;

use tracing::info;

use crate::cloud::CloudSession;
use crate::config::TetherConfig;
use crate::deploy::TargetingPolicy;
use crate::error::{ExportError, SetupError};
use crate::orchestration::{NoopObserver, RunController, RunObserver, RunOptions};
use crate::poll::{Clock, PollPolicy};
use crate::report::{RunSummary, default_output_path, write_csv};
use crate::template::{DEFAULT_TENANT_PARAMETER, PreparedTemplate, TemplateSource};
use crate::types::Target;

/// Which subscriptions to onboard.
#[derive(Debug, Clone, Default)]
pub enum TargetSelection {
    /// Every accessible subscription
    #[default]
    All,
    /// Include/exclude lists applied to the accessible subscriptions
    Policy(TargetingPolicy),
    /// Exactly these subscription ids, in this order
    Explicit(Vec<String>),
}

/// Options for the onboard command
#[derive(Debug, Clone)]
pub struct OnboardOptions {
    /// Per-run controller settings
    pub run: RunOptions,
    /// Where to write the result export (timestamped file if None)
    pub output_path: Option<PathBuf>,
    /// Subscriptions to onboard
    pub selection: TargetSelection,
    /// Template parameter receiving the managing tenant id
    pub tenant_parameter: String,
    /// Provider registration wait
    pub poll_policy: PollPolicy,
}

impl Default for OnboardOptions {
    fn default() -> Self {
        Self {
            run: RunOptions::default(),
            output_path: None,
            selection: TargetSelection::All,
            tenant_parameter: DEFAULT_TENANT_PARAMETER.to_string(),
            poll_policy: PollPolicy::default(),
        }
    }
}

impl OnboardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed options from a loaded configuration file.
    pub fn from_config(config: &TetherConfig) -> Self {
        Self {
            run: config.run_options(),
            tenant_parameter: config.template.tenant_parameter.clone(),
            poll_policy: config.poll_policy(),
            ..Self::default()
        }
    }

    /// Set the deployment region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.run.region = region.into();
        self
    }

    /// Keep going after a failed subscription
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.run.continue_on_error = continue_on_error;
        self
    }

    /// Preview only; nothing is changed
    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.run.simulate = simulate;
        self
    }

    /// Set the result export path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the subscription selection
    pub fn with_selection(mut self, selection: TargetSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Set the provider registration wait
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }
}

/// Result of an onboarding run.
#[derive(Debug, Clone)]
pub struct OnboardReport {
    pub summary: RunSummary,
    pub output_path: PathBuf,
}

/// Onboard command - applies one template to many subscriptions.
pub struct OnboardCommand<'a, S: CloudSession> {
    session: &'a S,
    templates: &'a dyn TemplateSource,
    clock: &'a dyn Clock,
    observer: &'a dyn RunObserver,
}

impl<'a, S: CloudSession> OnboardCommand<'a, S> {
    pub fn new(session: &'a S, templates: &'a dyn TemplateSource, clock: &'a dyn Clock) -> Self {
        Self {
            session,
            templates,
            clock,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Subscriptions accessible under the current credentials.
    pub fn candidates(&self) -> anyhow::Result<Vec<Target>> {
        let candidates = self.session.list_subscriptions()?;
        if candidates.is_empty() {
            return Err(SetupError::NoTargetsAvailable.into());
        }
        Ok(candidates)
    }

    /// Execute the onboard command.
    ///
    /// Setup errors abort before any subscription is entered and produce no
    /// summary. Per-subscription failures are captured in the summary.
    pub fn execute(&self, options: &OnboardOptions) -> anyhow::Result<OnboardReport> {
        let template = self
            .templates
            .load()
            .map_err(|err| match err.downcast::<SetupError>() {
                Ok(setup) => setup,
                Err(err) => SetupError::TemplateUnavailable {
                    location: self.templates.location(),
                    message: format!("{:#}", err),
                },
            })?;

        let targets = select_targets(&self.candidates()?, &options.selection)?;
        info!(
            selected = targets.len(),
            template = %self.templates.location(),
            "subscriptions selected"
        );

        let prepared = PreparedTemplate::prepare(
            template,
            options.run.simulate,
            self.session,
            &options.tenant_parameter,
        )?;

        let output_path = options
            .output_path
            .clone()
            .unwrap_or_else(|| default_output_path(self.clock.now()));

        let controller = RunController::new(self.session, self.session, self.session, self.clock)
            .with_observer(self.observer)
            .with_poll_policy(options.poll_policy);
        let summary = controller.run(&targets, &prepared, &options.run);

        write_csv(&summary, &output_path).map_err(|err| ExportError {
            path: output_path.clone(),
            message: format!("{:#}", err),
        })?;
        info!(path = %output_path.display(), "results exported");

        Ok(OnboardReport {
            summary,
            output_path,
        })
    }
}

/// Resolve the selection against the accessible subscriptions.
pub fn select_targets(
    candidates: &[Target],
    selection: &TargetSelection,
) -> Result<Vec<Target>, SetupError> {
    match selection {
        TargetSelection::All => Ok(candidates.to_vec()),
        TargetSelection::Policy(policy) => policy.select(candidates),
        TargetSelection::Explicit(ids) => {
            if ids.is_empty() {
                return Err(SetupError::NoTargetsSelected);
            }
            let mut selected = Vec::with_capacity(ids.len());
            let mut missing = Vec::new();
            for id in ids {
                match candidates.iter().find(|c| c.id.eq_ignore_ascii_case(id)) {
                    Some(target) if !selected.contains(target) => selected.push(target.clone()),
                    Some(_) => {}
                    None => missing.push(id.clone()),
                }
            }
            if !missing.is_empty() {
                return Err(SetupError::UnknownTargets { ids: missing });
            }
            Ok(selected)
        }
    }
}
